//! handbill - batch-authorized media publishing for content-addressed storage
//!
//! Handbill attaches media files to user-authored content and publishes them
//! to one or more content-addressed storage servers, requiring exactly one
//! interactive signing operation per batch regardless of file count.
//!
//! ## Pipeline
//!
//! ```text
//! MediaValidator -> ConsentGate -> BatchAuthorizer -> UploadCoordinator
//!                                                          |
//!                                     AttachmentReconciler <-
//! ```
//!
//! - [`validate`] checks every candidate file against the configured policy
//!   in one pass and reports every violation, so the UI can show all
//!   problems at once.
//! - [`ConsentGate`] shows the user the exact file set and its cost, and is
//!   the only component that can unlock the authorizer.
//! - [`BatchAuthorizer`] invokes the interactive signer exactly once,
//!   producing a credential bound to the exact covered-address set with an
//!   explicit expiry.
//! - [`UploadCoordinator`] fans uploads out across (file, target) pairs with
//!   bounded concurrency, checking credential coverage and expiry locally
//!   before every network call. Partial failure is reported, never masked.
//! - [`reconcile`] merges an existing attachment set with explicit additions
//!   and removals. An attachment absent from both the kept and removed lists
//!   is kept: absence is never evidence of removal.
//!
//! [`Pipeline`] wires the stages together; each stage is also usable on its
//! own with injected [`InteractiveSigner`] / [`StorageTarget`] /
//! [`ConsentPrompt`] implementations.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use billconf::HandbillConfig;
//! use billproto::MediaFile;
//! use handbill::{AutoAcceptPrompt, LocalKeySigner, NullObserver, Pipeline};
//!
//! # async fn run() -> Result<(), handbill::PipelineError> {
//! let pipeline = Pipeline::new(
//!     HandbillConfig::default(),
//!     Arc::new(LocalKeySigner::from_seed([7u8; 32])),
//!     Arc::new(AutoAcceptPrompt),
//!     vec![/* storage targets */],
//!     Arc::new(NullObserver),
//! );
//! let report = pipeline
//!     .publish(vec![MediaFile::new(&b"bytes"[..], "image/png", "a.png")])
//!     .await?;
//! println!("{}", report.upload.summary());
//! # Ok(())
//! # }
//! ```

pub mod authorize;
pub mod consent;
pub mod pipeline;
pub mod progress;
pub mod reconcile;
pub mod signer;
pub mod target;
pub mod testing;
pub mod upload;
pub mod validate;

// Re-exports for convenience
pub use authorize::BatchAuthorizer;
pub use consent::{AutoAcceptPrompt, Consent, ConsentDecision, ConsentGate, ConsentPrompt};
pub use pipeline::{Pipeline, PipelineError, PublishReport};
pub use progress::{ChannelObserver, NullObserver, ProgressObserver};
pub use reconcile::reconcile;
pub use signer::{InteractiveSigner, LocalKeySigner};
pub use target::{BlobReceipt, HttpStorageTarget, StorageTarget};
pub use upload::UploadCoordinator;
pub use validate::{validate, RejectedFile, Validated};
