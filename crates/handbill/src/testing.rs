//! Test doubles for the pipeline's external boundaries.
//!
//! These are real implementations of the boundary traits, usable from unit
//! tests, integration tests, and embedders' own test suites. [`MemoryTarget`]
//! behaves like a strict storage server: it verifies credential coverage,
//! expiry, and content-address integrity before accepting a blob.

use crate::consent::{ConsentDecision, ConsentPrompt};
use crate::signer::{InteractiveSigner, LocalKeySigner};
use crate::target::{BlobReceipt, StorageTarget};
use async_trait::async_trait;
use billproto::{
    AuthorizationRequest, BatchAuthorization, CostEstimate, MediaFile, Signature, SignerError,
    TargetError,
};
use bytes::Bytes;
use chrono::{Duration, Utc};
use mediacas::ContentAddress;
use std::collections::{BTreeSet, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// Issue a valid batch authorization over `files` without going through the
/// consent gate. Signed with a fixed-seed ed25519 key.
pub fn issue_test_auth(files: &[MediaFile], ttl_minutes: i64) -> BatchAuthorization {
    use ed25519_dalek::Signer as _;

    let addresses: BTreeSet<ContentAddress> =
        files.iter().map(|f| f.metadata().address).collect();
    let request = AuthorizationRequest::new(
        addresses,
        Utc::now(),
        Duration::minutes(ttl_minutes),
        format!("{} files (test)", files.len()),
    );
    let key = ed25519_dalek::SigningKey::from_bytes(&[0xab; 32]);
    let signature = Signature {
        scheme: "ed25519".to_string(),
        signature_hex: hex::encode(key.sign(&request.canonical_payload()).to_bytes()),
        public_key_hex: hex::encode(key.verifying_key().to_bytes()),
    };
    BatchAuthorization::issue(&request, signature)
}

/// An in-memory storage target that enforces what a real server would:
/// credential coverage, credential expiry, and that the blob's bytes match
/// the claimed address.
pub struct MemoryTarget {
    name: String,
    stored: Mutex<HashMap<String, Bytes>>,
    failing: Mutex<BTreeSet<ContentAddress>>,
    attempts: AtomicUsize,
}

impl MemoryTarget {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            stored: Mutex::new(HashMap::new()),
            failing: Mutex::new(BTreeSet::new()),
            attempts: AtomicUsize::new(0),
        }
    }

    /// Make puts for this address fail with a network error until
    /// [`clear_failures`](Self::clear_failures) is called.
    pub fn fail_address(&self, address: &ContentAddress) {
        self.failing.lock().unwrap().insert(address.clone());
    }

    pub fn clear_failures(&self) {
        self.failing.lock().unwrap().clear();
    }

    /// Number of `put_blob` calls received (including failed ones).
    pub fn put_count(&self) -> usize {
        self.attempts.load(Ordering::Relaxed)
    }

    /// Whether a blob is stored under this address.
    pub fn contains(&self, address: &ContentAddress) -> bool {
        self.stored
            .lock()
            .unwrap()
            .contains_key(address.digest_hex())
    }
}

#[async_trait]
impl StorageTarget for MemoryTarget {
    fn name(&self) -> &str {
        &self.name
    }

    async fn put_blob(
        &self,
        address: &ContentAddress,
        bytes: Bytes,
        auth: &BatchAuthorization,
    ) -> Result<BlobReceipt, TargetError> {
        self.attempts.fetch_add(1, Ordering::Relaxed);

        if self.failing.lock().unwrap().contains(address) {
            return Err(TargetError::Network {
                message: "injected failure".to_string(),
            });
        }
        if !auth.covers(address) {
            return Err(TargetError::NotCovered);
        }
        if auth.is_expired(Utc::now()) {
            return Err(TargetError::Rejected {
                message: "credential expired".to_string(),
            });
        }
        if ContentAddress::from_data(&bytes) != *address {
            return Err(TargetError::Rejected {
                message: "content does not match address".to_string(),
            });
        }

        self.stored
            .lock()
            .unwrap()
            .insert(address.digest_hex().to_string(), bytes);
        Ok(BlobReceipt {
            url: format!("memory://{}/{}", self.name, address.digest_hex()),
        })
    }
}

/// A real signer that counts how many times it is invoked. The single-sign
/// invariant is asserted against this counter.
pub struct CountingSigner {
    inner: LocalKeySigner,
    calls: AtomicUsize,
}

impl CountingSigner {
    pub fn new(seed: [u8; 32]) -> Self {
        Self {
            inner: LocalKeySigner::from_seed(seed),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl InteractiveSigner for CountingSigner {
    async fn sign(&self, request: &AuthorizationRequest) -> Result<Signature, SignerError> {
        self.calls.fetch_add(1, Ordering::Relaxed);
        self.inner.sign(request).await
    }
}

/// The user declines at the signing step itself (distinct from consent
/// cancellation).
pub struct RejectingSigner;

#[async_trait]
impl InteractiveSigner for RejectingSigner {
    async fn sign(&self, _request: &AuthorizationRequest) -> Result<Signature, SignerError> {
        Err(SignerError::Rejected)
    }
}

/// No signer is registered.
pub struct UnavailableSigner;

#[async_trait]
impl InteractiveSigner for UnavailableSigner {
    async fn sign(&self, _request: &AuthorizationRequest) -> Result<Signature, SignerError> {
        Err(SignerError::Unavailable)
    }
}

/// A prompt that always cancels.
pub struct CancelPrompt;

#[async_trait]
impl ConsentPrompt for CancelPrompt {
    async fn request(&self, _files: &[MediaFile], _estimate: &CostEstimate) -> ConsentDecision {
        ConsentDecision::Cancelled
    }
}
