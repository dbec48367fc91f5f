//! The attachment edit plan: an explicit record of what the user did.
//!
//! `kept` and `removed` only ever record *explicit* user actions. An existing
//! attachment missing from both sets was simply untouched; the reconciler
//! treats it as kept. Absence is never evidence of removal.

use crate::attachment::AttachmentId;
use crate::media::MediaFile;
use std::collections::BTreeSet;

/// What one edit submission does to the attachment set.
#[derive(Debug, Clone, Default)]
pub struct AttachmentEditPlan {
    /// Ids the user explicitly kept (may be empty even when keeping all).
    pub kept: BTreeSet<AttachmentId>,
    /// Ids the user explicitly removed.
    pub removed: BTreeSet<AttachmentId>,
    /// New files to upload and append.
    pub added: Vec<MediaFile>,
}

impl AttachmentEditPlan {
    pub fn new(
        kept: impl IntoIterator<Item = AttachmentId>,
        removed: impl IntoIterator<Item = AttachmentId>,
        added: Vec<MediaFile>,
    ) -> Self {
        Self {
            kept: kept.into_iter().collect(),
            removed: removed.into_iter().collect(),
            added,
        }
    }

    /// A plan that only removes.
    pub fn removals(removed: impl IntoIterator<Item = AttachmentId>) -> Self {
        Self {
            removed: removed.into_iter().collect(),
            ..Default::default()
        }
    }

    /// A plan that only adds files.
    pub fn additions(added: Vec<MediaFile>) -> Self {
        Self {
            added,
            ..Default::default()
        }
    }

    /// True when the edit touches no attachments (e.g. a title-only edit).
    pub fn is_noop(&self) -> bool {
        self.removed.is_empty() && self.added.is_empty()
    }
}
