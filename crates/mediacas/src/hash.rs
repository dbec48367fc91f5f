//! ContentAddress: a SHA-256 content digest with an explicit algorithm tag.
//!
//! Storage servers in this protocol family address blobs by the SHA-256 of
//! their bytes, rendered as 64 lowercase hex chars. The algorithm travels
//! with the digest so addresses stay self-describing if another digest is
//! ever admitted.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Digest algorithm used for a content address.
///
/// SHA-256 is the only algorithm shipped; the enum exists so the field is
/// explicit on the wire rather than implied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum HashAlgorithm {
    Sha256,
}

impl HashAlgorithm {
    /// Hex digest length for this algorithm.
    pub fn hex_len(&self) -> usize {
        match self {
            HashAlgorithm::Sha256 => 64,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            HashAlgorithm::Sha256 => "sha-256",
        }
    }
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A content address: hex-encoded digest plus algorithm.
///
/// Two files with identical bytes produce identical addresses. The digest
/// string is always lowercase hex.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ContentAddress {
    digest: String,
    algorithm: HashAlgorithm,
}

/// Errors that can occur when working with content addresses.
#[derive(Debug, Error)]
pub enum HashError {
    #[error("invalid digest length: expected {expected} hex chars, got {got}")]
    InvalidLength { expected: usize, got: usize },

    #[error("invalid hex character in digest")]
    InvalidHex,
}

impl ContentAddress {
    /// Hash data and return its content address.
    pub fn from_data(data: &[u8]) -> Self {
        let digest = Sha256::digest(data);
        Self {
            digest: hex::encode(digest),
            algorithm: HashAlgorithm::Sha256,
        }
    }

    /// Create from an existing hex digest string (validates format).
    pub fn from_hex_checked(s: &str, algorithm: HashAlgorithm) -> Result<Self, HashError> {
        if s.len() != algorithm.hex_len() {
            return Err(HashError::InvalidLength {
                expected: algorithm.hex_len(),
                got: s.len(),
            });
        }
        if !s.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(HashError::InvalidHex);
        }
        Ok(Self {
            digest: s.to_lowercase(),
            algorithm,
        })
    }

    /// The hex digest as a string slice.
    pub fn digest_hex(&self) -> &str {
        &self.digest
    }

    /// The digest algorithm.
    pub fn algorithm(&self) -> HashAlgorithm {
        self.algorithm
    }

    /// Consume and return the inner digest string.
    pub fn into_digest(self) -> String {
        self.digest
    }
}

impl fmt::Display for ContentAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.digest)
    }
}

impl FromStr for ContentAddress {
    type Err = HashError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex_checked(s, HashAlgorithm::Sha256)
    }
}

impl AsRef<str> for ContentAddress {
    fn as_ref(&self) -> &str {
        &self.digest
    }
}

/// Incremental hasher for content too large to hold resident.
///
/// Feed chunks with [`update`](Self::update), then [`finalize`](Self::finalize)
/// to get the address. Produces the same address as
/// [`ContentAddress::from_data`] over the concatenated chunks.
#[derive(Debug, Default)]
pub struct StreamingHasher {
    inner: Sha256,
    bytes_seen: u64,
}

impl StreamingHasher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a chunk of content.
    pub fn update(&mut self, chunk: &[u8]) {
        self.inner.update(chunk);
        self.bytes_seen += chunk.len() as u64;
    }

    /// Total bytes fed so far.
    pub fn bytes_seen(&self) -> u64 {
        self.bytes_seen
    }

    /// Finish and return the content address.
    pub fn finalize(self) -> ContentAddress {
        ContentAddress {
            digest: hex::encode(self.inner.finalize()),
            algorithm: HashAlgorithm::Sha256,
        }
    }
}
