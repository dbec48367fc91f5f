//! Progress events for upload observers.
//!
//! Advisory, fire-and-forget records. Events for one file arrive in causal
//! order (started before completed/failed); nothing is guaranteed across
//! files.

use serde::{Deserialize, Serialize};

/// What just happened to the current file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProgressStep {
    Started,
    BytesAcked,
    Completed,
    Failed,
}

/// One progress record, emitted after every meaningful state change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressEvent {
    pub step: ProgressStep,
    pub file_index: usize,
    pub file_name: String,
    pub total_files: usize,
    /// Fraction complete for this file, in `[0, 1]`.
    pub per_file_fraction: f64,
    /// Fraction complete for the whole batch, in `[0, 1]`.
    pub overall_fraction: f64,
}

impl ProgressEvent {
    pub fn new(
        step: ProgressStep,
        file_index: usize,
        file_name: impl Into<String>,
        total_files: usize,
        per_file_fraction: f64,
        completed_files: usize,
    ) -> Self {
        let overall = if total_files == 0 {
            1.0
        } else {
            (completed_files as f64 + per_file_fraction.clamp(0.0, 1.0)) / total_files as f64
        };
        Self {
            step,
            file_index,
            file_name: file_name.into(),
            total_files,
            per_file_fraction: per_file_fraction.clamp(0.0, 1.0),
            overall_fraction: overall.clamp(0.0, 1.0),
        }
    }
}
