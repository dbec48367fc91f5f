//! ConsentGate: the first interactive suspension point.
//!
//! Shows the user the exact file set and its resource cost, and blocks until
//! they accept or cancel. A granted [`Consent`] is bound to the content
//! addresses it was shown for; the authorizer refuses a consent whose
//! address set differs from the files it is asked to sign, so a stale
//! consent can never be replayed against a different file set.
//!
//! Cancellation here ends the pipeline before any signing or network work.

use async_trait::async_trait;
use billproto::{CostEstimate, MediaFile};
use chrono::{DateTime, Utc};
use mediacas::ContentAddress;
use std::collections::BTreeSet;
use std::sync::Arc;

/// The user's answer at the consent step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsentDecision {
    Accepted,
    Cancelled,
}

/// How the file set and cost estimate are presented for a decision.
///
/// UIs implement this against their widget toolkit; headless callers use
/// [`AutoAcceptPrompt`]; tests script it.
#[async_trait]
pub trait ConsentPrompt: Send + Sync {
    async fn request(&self, files: &[MediaFile], estimate: &CostEstimate) -> ConsentDecision;
}

/// A prompt that accepts everything. For headless and scripted use where
/// consent is established out of band.
pub struct AutoAcceptPrompt;

#[async_trait]
impl ConsentPrompt for AutoAcceptPrompt {
    async fn request(&self, _files: &[MediaFile], _estimate: &CostEstimate) -> ConsentDecision {
        ConsentDecision::Accepted
    }
}

/// Evidence that the user accepted a specific file set.
///
/// Only the gate can construct one, which makes "consent happened first" a
/// type-level guarantee for the authorizer.
#[derive(Debug, Clone)]
pub struct Consent {
    addresses: BTreeSet<ContentAddress>,
    granted_at: DateTime<Utc>,
}

impl Consent {
    pub(crate) fn new(addresses: BTreeSet<ContentAddress>) -> Self {
        Self {
            addresses,
            granted_at: Utc::now(),
        }
    }

    /// Whether this consent was granted for exactly the given address set.
    /// Identity is by content address, not by reference or file name.
    pub fn covers_exactly(&self, addresses: &BTreeSet<ContentAddress>) -> bool {
        &self.addresses == addresses
    }

    pub fn granted_at(&self) -> DateTime<Utc> {
        self.granted_at
    }

    pub fn addresses(&self) -> &BTreeSet<ContentAddress> {
        &self.addresses
    }
}

/// Presents the file set through the injected prompt and converts an accept
/// into an address-bound [`Consent`].
pub struct ConsentGate {
    prompt: Arc<dyn ConsentPrompt>,
    estimate_bytes_per_sec: u64,
}

impl ConsentGate {
    pub fn new(prompt: Arc<dyn ConsentPrompt>, estimate_bytes_per_sec: u64) -> Self {
        Self {
            prompt,
            estimate_bytes_per_sec,
        }
    }

    /// Ask for consent to publish `files`. Returns `None` on cancel.
    pub async fn request(&self, files: &[MediaFile]) -> Option<Consent> {
        let estimate = CostEstimate::for_files(files, self.estimate_bytes_per_sec);
        tracing::info!(
            consent.files = estimate.file_count,
            consent.total_bytes = estimate.total_bytes,
            consent.estimated_seconds = estimate.estimated_seconds,
            "requesting user consent"
        );

        match self.prompt.request(files, &estimate).await {
            ConsentDecision::Accepted => {
                let addresses = files.iter().map(|f| f.metadata().address).collect();
                Some(Consent::new(addresses))
            }
            ConsentDecision::Cancelled => {
                tracing::info!("user cancelled at the consent step");
                None
            }
        }
    }
}
