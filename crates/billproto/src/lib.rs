//! billproto - Domain types for the Handbill publishing pipeline
//!
//! This crate defines the values that flow between pipeline stages: candidate
//! files, the batch authorization credential, published attachments, edit
//! plans, content revisions, upload outcomes, progress events, and the error
//! taxonomy.
//!
//! ## Design
//!
//! Pipeline state moves by value between components; there is no ambient
//! mutable state. The one shared value, [`BatchAuthorization`], is read-only
//! after issue and safe to hand to concurrent upload workers behind an `Arc`.
//!
//! Errors are grouped by how they propagate:
//! - [`RejectReason`] — per-file validation findings, recovered locally
//! - [`AuthorizeError`] — terminal for the current attempt
//! - [`UploadErrorKind`] — per-file, non-fatal to the batch
//! - [`ReconcileError`] — fatal to the edit submission

pub mod attachment;
pub mod authorization;
pub mod error;
pub mod media;
pub mod outcome;
pub mod plan;
pub mod progress;
pub mod revision;

// Re-exports for convenience
pub use attachment::{AttachmentId, PublishedAttachment};
pub use authorization::{AuthorizationRequest, BatchAuthorization, Signature};
pub use error::{
    AuthorizeError, ReconcileError, RejectReason, SignerError, TargetError, UploadErrorKind,
};
pub use media::{CostEstimate, MediaFile};
pub use outcome::{UploadOutcome, UploadReport};
pub use plan::AttachmentEditPlan;
pub use progress::{ProgressEvent, ProgressStep};
pub use revision::{ContentRevision, RevisionId, StableId};
