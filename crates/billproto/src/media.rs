//! Candidate media files and the consent-time cost estimate.

use bytes::Bytes;
use mediacas::{AttachmentMetadata, ContentHasher};
use serde::{Deserialize, Serialize};

/// A file the user wants to attach, before any validation or upload.
///
/// Owned by the caller until the hasher consumes it. `Bytes` makes clones
/// cheap so the coordinator can hand the payload to upload workers without
/// copying.
#[derive(Debug, Clone, PartialEq)]
pub struct MediaFile {
    pub bytes: Bytes,
    pub declared_mime: String,
    pub file_name: String,
}

impl MediaFile {
    pub fn new(
        bytes: impl Into<Bytes>,
        declared_mime: impl Into<String>,
        file_name: impl Into<String>,
    ) -> Self {
        Self {
            bytes: bytes.into(),
            declared_mime: declared_mime.into(),
            file_name: file_name.into(),
        }
    }

    pub fn size_bytes(&self) -> u64 {
        self.bytes.len() as u64
    }

    /// Derive content metadata for this file. Deterministic for identical
    /// bytes; callers cache the result rather than re-hashing downstream.
    pub fn metadata(&self) -> AttachmentMetadata {
        ContentHasher::from_bytes(&self.bytes, &self.declared_mime, &self.file_name)
    }
}

/// What the user is shown at the consent step: the resource cost of the
/// batch they are about to authorize.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostEstimate {
    pub file_count: usize,
    pub total_bytes: u64,
    /// Size-derived transfer estimate; advisory only.
    pub estimated_seconds: f64,
}

impl CostEstimate {
    /// Estimate from a file set and an assumed transfer rate.
    pub fn for_files(files: &[MediaFile], bytes_per_second: u64) -> Self {
        let total_bytes: u64 = files.iter().map(|f| f.size_bytes()).sum();
        let estimated_seconds = if bytes_per_second == 0 {
            0.0
        } else {
            total_bytes as f64 / bytes_per_second as f64
        };
        Self {
            file_count: files.len(),
            total_bytes,
            estimated_seconds,
        }
    }
}
