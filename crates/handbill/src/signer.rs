//! The interactive signer boundary.
//!
//! A human approves exactly one signing operation per batch through whatever
//! implements [`InteractiveSigner`]. [`LocalKeySigner`] is the shipped
//! implementation: an in-process ed25519 key for agents and tests that hold
//! their own key material. Wallet- or extension-backed signers live outside
//! this crate behind the same trait.

use async_trait::async_trait;
use billproto::{AuthorizationRequest, Signature, SignerError};
use ed25519_dalek::{Signer as _, SigningKey};

/// Produces one signature over an authorization request.
///
/// Implementations may suspend indefinitely while waiting on the user; the
/// pipeline blocks on this call and never issues a second one for the same
/// batch.
#[async_trait]
pub trait InteractiveSigner: Send + Sync {
    async fn sign(&self, request: &AuthorizationRequest) -> Result<Signature, SignerError>;
}

/// An ed25519 signer holding its key in process.
pub struct LocalKeySigner {
    key: SigningKey,
}

impl LocalKeySigner {
    /// Build from a 32-byte seed.
    pub fn from_seed(seed: [u8; 32]) -> Self {
        Self {
            key: SigningKey::from_bytes(&seed),
        }
    }

    /// Hex-encoded public key.
    pub fn public_key_hex(&self) -> String {
        hex::encode(self.key.verifying_key().to_bytes())
    }
}

#[async_trait]
impl InteractiveSigner for LocalKeySigner {
    async fn sign(&self, request: &AuthorizationRequest) -> Result<Signature, SignerError> {
        let payload = request.canonical_payload();
        let signature = self.key.sign(&payload);
        Ok(Signature {
            scheme: "ed25519".to_string(),
            signature_hex: hex::encode(signature.to_bytes()),
            public_key_hex: self.public_key_hex(),
        })
    }
}
