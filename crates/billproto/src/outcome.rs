//! Upload outcomes: one record per (file, target) attempt, plus the batch
//! report the caller presents to the user.

use crate::attachment::PublishedAttachment;
use crate::error::UploadErrorKind;
use mediacas::ContentAddress;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// The result of one (file, target) upload attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadOutcome {
    pub file_name: String,
    pub address: ContentAddress,
    pub target: String,
    pub success: bool,

    /// Set on the attempt that produced the canonical publication for a file
    /// (the first successful target). Mirror successes leave this `None`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub published: Option<PublishedAttachment>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<UploadErrorKind>,
}

impl UploadOutcome {
    pub fn success(
        file_name: impl Into<String>,
        address: ContentAddress,
        target: impl Into<String>,
        published: Option<PublishedAttachment>,
    ) -> Self {
        Self {
            file_name: file_name.into(),
            address,
            target: target.into(),
            success: true,
            published,
            error: None,
        }
    }

    pub fn failure(
        file_name: impl Into<String>,
        address: ContentAddress,
        target: impl Into<String>,
        error: UploadErrorKind,
    ) -> Self {
        Self {
            file_name: file_name.into(),
            address,
            target: target.into(),
            success: false,
            published: None,
            error: Some(error),
        }
    }
}

/// Aggregate view over a batch's outcomes.
///
/// A file counts as published when at least one target accepted it. Partial
/// failure is reported as "N of M", never masked as full success.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadReport {
    pub outcomes: Vec<UploadOutcome>,
    pub total_files: usize,
}

impl UploadReport {
    pub fn new(outcomes: Vec<UploadOutcome>, total_files: usize) -> Self {
        Self {
            outcomes,
            total_files,
        }
    }

    /// Addresses with at least one successful target.
    pub fn published_addresses(&self) -> BTreeSet<&ContentAddress> {
        self.outcomes
            .iter()
            .filter(|o| o.success)
            .map(|o| &o.address)
            .collect()
    }

    /// Number of files with at least one successful target.
    pub fn files_succeeded(&self) -> usize {
        self.published_addresses().len()
    }

    /// The published attachments, in upload order.
    pub fn published_attachments(&self) -> Vec<PublishedAttachment> {
        self.outcomes
            .iter()
            .filter_map(|o| o.published.clone())
            .collect()
    }

    /// Outcomes for files that failed on every target. Input to the retry hook.
    pub fn failed_outcomes(&self) -> Vec<&UploadOutcome> {
        let published = self.published_addresses();
        self.outcomes
            .iter()
            .filter(|o| !o.success && !published.contains(&o.address))
            .collect()
    }

    pub fn all_succeeded(&self) -> bool {
        self.files_succeeded() == self.total_files
    }

    /// User-facing one-liner.
    pub fn summary(&self) -> String {
        format!(
            "{} of {} files uploaded",
            self.files_succeeded(),
            self.total_files
        )
    }
}
