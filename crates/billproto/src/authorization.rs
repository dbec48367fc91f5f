//! Batch authorization: one signed credential covering a set of content
//! addresses.
//!
//! The request payload enumerates every covered address in sorted order plus
//! an explicit expiry, so the interactive signer displays exactly what is
//! being approved and the resulting credential is bound to exactly that set.

use chrono::{DateTime, Duration, Utc};
use mediacas::ContentAddress;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// The payload handed to the interactive signer. Built once per batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthorizationRequest {
    /// Covered content addresses, sorted and deduplicated.
    pub covered: Vec<ContentAddress>,

    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,

    /// Human-readable summary for the signer UI (file count and names).
    pub summary: String,
}

impl AuthorizationRequest {
    /// Build a request covering `addresses`, expiring `ttl` after `issued_at`.
    pub fn new(
        addresses: impl IntoIterator<Item = ContentAddress>,
        issued_at: DateTime<Utc>,
        ttl: Duration,
        summary: impl Into<String>,
    ) -> Self {
        let set: BTreeSet<ContentAddress> = addresses.into_iter().collect();
        Self {
            covered: set.into_iter().collect(),
            issued_at,
            expires_at: issued_at + ttl,
            summary: summary.into(),
        }
    }

    /// Canonical byte payload for signing. Stable for a given request:
    /// addresses are sorted and field order is fixed by the struct.
    pub fn canonical_payload(&self) -> Vec<u8> {
        serde_json::to_vec(self).expect("authorization request serializes")
    }
}

/// A detached signature over an [`AuthorizationRequest`] payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signature {
    /// Signature scheme identifier (e.g. "ed25519").
    pub scheme: String,
    /// Hex-encoded signature bytes.
    pub signature_hex: String,
    /// Hex-encoded public key of the signer.
    pub public_key_hex: String,
}

/// The issued credential: the covered-address set, validity window, and the
/// user's signature. Read-only once issued; share via `Arc` across workers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchAuthorization {
    covered: BTreeSet<ContentAddress>,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub signature: Signature,
}

impl BatchAuthorization {
    /// Bind a signature to the request it was produced for.
    pub fn issue(request: &AuthorizationRequest, signature: Signature) -> Self {
        Self {
            covered: request.covered.iter().cloned().collect(),
            issued_at: request.issued_at,
            expires_at: request.expires_at,
            signature,
        }
    }

    /// Whether this credential covers the given address.
    pub fn covers(&self, address: &ContentAddress) -> bool {
        self.covered.contains(address)
    }

    /// The exact covered-address set.
    pub fn covered(&self) -> &BTreeSet<ContentAddress> {
        &self.covered
    }

    /// Whether the credential has expired as of `now`.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}
