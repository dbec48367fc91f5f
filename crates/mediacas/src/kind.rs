//! MediaKind: closed classification of attachment media.
//!
//! Resolved exactly once from the effective MIME type when a file is hashed.
//! Downstream components match on the enum and never re-inspect MIME strings.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The three media classes Handbill publishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Image,
    Audio,
    Video,
}

impl MediaKind {
    /// Classify a MIME type. Returns `None` for anything outside the three
    /// supported top-level types; validation rejects those files upstream.
    pub fn from_mime(mime: &str) -> Option<Self> {
        let top = mime.split('/').next().unwrap_or("");
        match top.to_ascii_lowercase().as_str() {
            "image" => Some(MediaKind::Image),
            "audio" => Some(MediaKind::Audio),
            "video" => Some(MediaKind::Video),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MediaKind::Image => "image",
            MediaKind::Audio => "audio",
            MediaKind::Video => "video",
        }
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Resolve the MIME type to record for a file.
///
/// The declared type wins when present; a blank or missing declaration falls
/// back to a filename-extension guess, then to `application/octet-stream`.
pub fn effective_mime(declared: &str, file_name: &str) -> String {
    let declared = declared.trim();
    if !declared.is_empty() {
        return declared.to_ascii_lowercase();
    }
    mime_guess::from_path(file_name)
        .first_raw()
        .unwrap_or("application/octet-stream")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_mime_image() {
        assert_eq!(MediaKind::from_mime("image/png"), Some(MediaKind::Image));
        assert_eq!(MediaKind::from_mime("IMAGE/JPEG"), Some(MediaKind::Image));
    }

    #[test]
    fn test_from_mime_audio_and_video() {
        assert_eq!(MediaKind::from_mime("audio/wav"), Some(MediaKind::Audio));
        assert_eq!(MediaKind::from_mime("video/mp4"), Some(MediaKind::Video));
    }

    #[test]
    fn test_from_mime_rejects_other_types() {
        assert_eq!(MediaKind::from_mime("application/pdf"), None);
        assert_eq!(MediaKind::from_mime("text/plain"), None);
        assert_eq!(MediaKind::from_mime(""), None);
    }

    #[test]
    fn test_effective_mime_prefers_declared() {
        assert_eq!(effective_mime("image/png", "photo.jpg"), "image/png");
    }

    #[test]
    fn test_effective_mime_falls_back_to_extension() {
        assert_eq!(effective_mime("", "photo.png"), "image/png");
        assert_eq!(effective_mime("  ", "clip.mp4"), "video/mp4");
    }

    #[test]
    fn test_effective_mime_unknown_extension() {
        assert_eq!(effective_mime("", "mystery.blob"), "application/octet-stream");
    }

    #[test]
    fn test_effective_mime_lowercases_declared() {
        assert_eq!(effective_mime("Image/PNG", "x.png"), "image/png");
    }
}
