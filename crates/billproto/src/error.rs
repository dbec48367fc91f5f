//! Error taxonomy for the publishing pipeline.
//!
//! Grouped by propagation behavior:
//! - validation findings ([`RejectReason`]) are reported per file and the
//!   pipeline continues with the accepted subset;
//! - authorization failures ([`AuthorizeError`]) end the current attempt;
//! - upload failures ([`UploadErrorKind`]) mark one (file, target) attempt
//!   and never fail the batch by themselves;
//! - reconciliation conflicts ([`ReconcileError`]) fail the whole edit.
//!   Silently dropping attachments is never an acceptable fallback.

use crate::attachment::AttachmentId;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Why the validator rejected a file. A single file can accumulate several.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum RejectReason {
    #[error("batch exceeds the {limit}-file limit")]
    TooManyFiles { limit: usize },

    #[error("file is {size_bytes} bytes, over the {limit_bytes}-byte per-file limit")]
    FileTooLarge { size_bytes: u64, limit_bytes: u64 },

    #[error("batch total {total_bytes} bytes exceeds the {limit_bytes}-byte aggregate limit")]
    AggregateTooLarge { total_bytes: u64, limit_bytes: u64 },

    #[error("MIME type {mime} is not allowed")]
    UnsupportedType { mime: String },
}

/// Why the interactive signer could not produce a signature.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum SignerError {
    #[error("no interactive signer is available")]
    Unavailable,

    #[error("the user rejected the signing request")]
    Rejected,
}

/// Terminal failures of a batch-authorization attempt. The caller restarts
/// from consent; the authorizer never retries signing on its own.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum AuthorizeError {
    #[error("no interactive signer is available")]
    SignerUnavailable,

    #[error("the user rejected the signing request")]
    SignerRejected,

    #[error("nothing to authorize: the accepted file set is empty")]
    EmptyFileSet,

    #[error("consent was granted for a different file set")]
    ConsentMismatch,
}

impl From<SignerError> for AuthorizeError {
    fn from(err: SignerError) -> Self {
        match err {
            SignerError::Unavailable => AuthorizeError::SignerUnavailable,
            SignerError::Rejected => AuthorizeError::SignerRejected,
        }
    }
}

/// Failure reported by a storage target for one put attempt.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum TargetError {
    #[error("target rejected the blob: {message}")]
    Rejected { message: String },

    #[error("credential does not cover the blob address")]
    NotCovered,

    #[error("network error talking to target: {message}")]
    Network { message: String },
}

/// Per-(file, target) upload failure. Non-fatal to the batch; recorded in
/// the outcome list.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum UploadErrorKind {
    #[error("file address is not covered by the batch authorization")]
    AuthorizationMismatch,

    #[error("batch authorization expired before this upload started")]
    AuthorizationExpired,

    #[error("upload was cancelled before it started")]
    Cancelled,

    #[error("target {target} rejected the upload: {message}")]
    TargetRejected { target: String, message: String },

    #[error("network failure uploading to {target}: {message}")]
    Network { target: String, message: String },
}

impl UploadErrorKind {
    pub fn from_target(target: &str, err: TargetError) -> Self {
        match err {
            TargetError::NotCovered => UploadErrorKind::AuthorizationMismatch,
            TargetError::Rejected { message } => UploadErrorKind::TargetRejected {
                target: target.to_string(),
                message,
            },
            TargetError::Network { message } => UploadErrorKind::Network {
                target: target.to_string(),
                message,
            },
        }
    }
}

/// Reconciliation failure: the edit plan references attachments the existing
/// set does not contain, meaning the edit was computed from stale data.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum ReconcileError {
    #[error("edit plan references unknown attachment ids (stale edit session): {}",
        unknown.iter().map(|id| id.as_str()).collect::<Vec<_>>().join(", "))]
    Conflict { unknown: Vec<AttachmentId> },
}
