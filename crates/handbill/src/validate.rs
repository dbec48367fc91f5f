//! MediaValidator: policy checks before any signing or network work.
//!
//! Pure function, no I/O. Evaluates *all* files in one pass and returns the
//! complete rejection list so the caller can report every problem at once
//! rather than failing on the first.

use billconf::MediaPolicy;
use billproto::{MediaFile, RejectReason};
use mediacas::effective_mime;

/// A file the policy rejected, with every reason that applied.
#[derive(Debug, Clone)]
pub struct RejectedFile {
    pub file: MediaFile,
    pub reasons: Vec<RejectReason>,
}

/// The validator's split of a candidate set.
#[derive(Debug, Clone, Default)]
pub struct Validated {
    pub accepted: Vec<MediaFile>,
    pub rejected: Vec<RejectedFile>,
}

/// Check an ordered candidate set against the policy.
///
/// Rules, applied per file:
/// - files past the `max_files` count of otherwise-acceptable files;
/// - per-file size over `max_file_bytes`;
/// - MIME type outside `allowed_types`;
/// - aggregate size: a file whose size would push the running total of
///   accepted bytes over `max_total_bytes`.
///
/// A file violating both the per-file and the aggregate limit reports both
/// reasons. Rejected files do not consume aggregate budget or count slots,
/// so one oversized file never cascades into rejecting its neighbors.
pub fn validate(files: &[MediaFile], policy: &MediaPolicy) -> Validated {
    let mut accepted = Vec::new();
    let mut rejected = Vec::new();
    let mut accepted_bytes: u64 = 0;

    for file in files {
        let mut reasons = Vec::new();
        let size = file.size_bytes();
        let mime = effective_mime(&file.declared_mime, &file.file_name);

        if accepted.len() >= policy.max_files {
            reasons.push(RejectReason::TooManyFiles {
                limit: policy.max_files,
            });
        }
        if size > policy.max_file_bytes {
            reasons.push(RejectReason::FileTooLarge {
                size_bytes: size,
                limit_bytes: policy.max_file_bytes,
            });
        }
        if !policy.allows(&mime) {
            reasons.push(RejectReason::UnsupportedType { mime });
        }
        if accepted_bytes + size > policy.max_total_bytes {
            reasons.push(RejectReason::AggregateTooLarge {
                total_bytes: accepted_bytes + size,
                limit_bytes: policy.max_total_bytes,
            });
        }

        if reasons.is_empty() {
            accepted_bytes += size;
            accepted.push(file.clone());
        } else {
            rejected.push(RejectedFile {
                file: file.clone(),
                reasons,
            });
        }
    }

    if !rejected.is_empty() {
        tracing::warn!(
            validate.accepted = accepted.len(),
            validate.rejected = rejected.len(),
            "some files failed validation"
        );
    }

    Validated { accepted, rejected }
}
