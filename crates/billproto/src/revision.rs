//! Content revisions and the stable/volatile identifier split.
//!
//! `StableId` is minted at first publish and never changes across edits;
//! every user-facing or bookmarkable reference is built from it. `RevisionId`
//! is reminted on every successful publish. Conflating the two is how
//! published references break, so the types keep them apart.

use crate::attachment::PublishedAttachment;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Identifier of the logical content, constant across edits.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StableId(String);

impl StableId {
    /// Mint a fresh stable id. Called once, at first publish.
    pub fn mint() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StableId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for StableId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Identifier of one published revision; changes on every publish.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RevisionId(String);

impl RevisionId {
    pub fn mint() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RevisionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One published revision of a piece of content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentRevision {
    pub stable_id: StableId,
    pub revision_id: RevisionId,
    pub attachments: Vec<PublishedAttachment>,
}

impl ContentRevision {
    /// First publish: mints both identifiers.
    pub fn first_publish(attachments: Vec<PublishedAttachment>) -> Self {
        Self {
            stable_id: StableId::mint(),
            revision_id: RevisionId::mint(),
            attachments,
        }
    }

    /// Subsequent publish: same stable id, fresh revision id.
    pub fn next(&self, attachments: Vec<PublishedAttachment>) -> Self {
        Self {
            stable_id: self.stable_id.clone(),
            revision_id: RevisionId::mint(),
            attachments,
        }
    }

    /// Reference suitable for bookmarks and links. Built from the stable id
    /// only; revision ids must never leak into references.
    pub fn reference(&self) -> String {
        format!("handbill:{}", self.stable_id)
    }
}
