//! Published attachments: what exists after a successful upload.
//!
//! A `PublishedAttachment` is immutable once created. Edits never mutate one;
//! they include or exclude it from the next revision's attachment list.

use chrono::{DateTime, Utc};
use mediacas::AttachmentMetadata;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a published attachment.
///
/// Thin wrapper for type safety; just text on the wire.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AttachmentId(String);

impl AttachmentId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for AttachmentId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for AttachmentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for AttachmentId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for AttachmentId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// An attachment stored on at least one target, ready to reference from a
/// content revision.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PublishedAttachment {
    pub id: AttachmentId,
    pub metadata: AttachmentMetadata,

    /// Canonical URL: the first target that accepted the blob.
    pub url: String,

    /// URLs of additional targets that also accepted the blob.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub mirrors: Vec<String>,

    pub stored_at: DateTime<Utc>,
    pub is_primary: bool,
    pub display_order: u32,
}

impl PublishedAttachment {
    pub fn new(metadata: AttachmentMetadata, url: impl Into<String>, stored_at: DateTime<Utc>) -> Self {
        Self {
            id: AttachmentId::new(),
            metadata,
            url: url.into(),
            mirrors: Vec::new(),
            stored_at,
            is_primary: false,
            display_order: 0,
        }
    }

    /// Builder: record a redundant target URL.
    pub fn with_mirror(mut self, url: impl Into<String>) -> Self {
        self.mirrors.push(url.into());
        self
    }

    /// Builder: set display order.
    pub fn with_display_order(mut self, order: u32) -> Self {
        self.display_order = order;
        self
    }

    /// Copy with the primary flag set as given. Used only when building a new
    /// revision's list; the original value is never mutated in place.
    pub fn as_primary(mut self, primary: bool) -> Self {
        self.is_primary = primary;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mediacas::ContentHasher;

    fn sample() -> PublishedAttachment {
        let meta = ContentHasher::from_bytes(b"attachment bytes", "image/png", "a.png");
        PublishedAttachment::new(meta, "https://media.example/abc", Utc::now())
    }

    #[test]
    fn test_ids_are_unique() {
        assert_ne!(sample().id, sample().id);
    }

    #[test]
    fn test_builders() {
        let att = sample()
            .with_mirror("https://mirror.example/abc")
            .with_display_order(3)
            .as_primary(true);
        assert_eq!(att.mirrors.len(), 1);
        assert_eq!(att.display_order, 3);
        assert!(att.is_primary);
    }

    #[test]
    fn test_serde_roundtrip() {
        let att = sample();
        let json = serde_json::to_string(&att).unwrap();
        let restored: PublishedAttachment = serde_json::from_str(&json).unwrap();
        assert_eq!(att, restored);
    }
}
