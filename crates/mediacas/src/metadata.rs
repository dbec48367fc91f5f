//! AttachmentMetadata: everything the pipeline records about a file's content.
//!
//! Derived exactly once per file by [`ContentHasher`], never mutated after.
//! Dimension and duration extraction is deliberately shallow: it reads fixed
//! container headers (PNG/GIF/JPEG dimensions, WAV duration) and reports
//! `None` for anything else rather than pulling in media decoders.

use crate::hash::{ContentAddress, StreamingHasher};
use crate::kind::{effective_mime, MediaKind};
use serde::{Deserialize, Serialize};
use std::io::Read;
use thiserror::Error;

/// Chunk size for streaming reads. Keeps peak memory bounded for large video
/// files while staying big enough that syscall overhead is negligible.
const READ_CHUNK_BYTES: usize = 64 * 1024;

/// Errors from deriving attachment metadata.
#[derive(Debug, Error)]
pub enum HasherError {
    #[error("failed to read source for {file_name}")]
    UnreadableFile {
        file_name: String,
        #[source]
        source: std::io::Error,
    },
}

/// Content-derived metadata for one attachment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttachmentMetadata {
    /// The content address identifying these bytes.
    pub address: ContentAddress,

    /// Effective MIME type (declared, or guessed from the filename).
    pub mime_type: String,

    /// Size of the content in bytes.
    pub size_bytes: u64,

    /// Media classification, resolved once here.
    pub kind: Option<MediaKind>,

    /// Pixel dimensions (width, height) for images with readable headers.
    pub dimensions: Option<(u32, u32)>,

    /// Duration in seconds for audio with readable headers.
    pub duration_seconds: Option<f64>,
}

/// Derives [`AttachmentMetadata`] from file content.
///
/// Both entry points produce identical metadata for identical bytes; the
/// reader variant exists so large files never need to be fully resident.
pub struct ContentHasher;

impl ContentHasher {
    /// Derive metadata from bytes already in memory.
    pub fn from_bytes(data: &[u8], declared_mime: &str, file_name: &str) -> AttachmentMetadata {
        let mime_type = effective_mime(declared_mime, file_name);
        let kind = MediaKind::from_mime(&mime_type);
        AttachmentMetadata {
            address: ContentAddress::from_data(data),
            mime_type,
            size_bytes: data.len() as u64,
            kind,
            dimensions: sniff_dimensions(data),
            duration_seconds: sniff_wav_duration(data),
        }
    }

    /// Derive metadata by streaming from a reader.
    ///
    /// Hashes chunk-by-chunk; only the first chunk is retained for header
    /// sniffing. Fails with [`HasherError::UnreadableFile`] if the source
    /// cannot be fully read.
    pub fn from_reader<R: Read>(
        mut reader: R,
        declared_mime: &str,
        file_name: &str,
    ) -> Result<AttachmentMetadata, HasherError> {
        let mut hasher = StreamingHasher::new();
        let mut head: Vec<u8> = Vec::new();
        let mut buf = vec![0u8; READ_CHUNK_BYTES];

        loop {
            let n = reader
                .read(&mut buf)
                .map_err(|source| HasherError::UnreadableFile {
                    file_name: file_name.to_string(),
                    source,
                })?;
            if n == 0 {
                break;
            }
            hasher.update(&buf[..n]);
            if head.len() < READ_CHUNK_BYTES {
                let want = READ_CHUNK_BYTES - head.len();
                head.extend_from_slice(&buf[..n.min(want)]);
            }
        }

        let mime_type = effective_mime(declared_mime, file_name);
        let kind = MediaKind::from_mime(&mime_type);
        let size_bytes = hasher.bytes_seen();
        Ok(AttachmentMetadata {
            address: hasher.finalize(),
            mime_type,
            size_bytes,
            kind,
            dimensions: sniff_dimensions(&head),
            duration_seconds: sniff_wav_duration(&head),
        })
    }
}

/// Read image dimensions from container headers. PNG, GIF, and baseline /
/// progressive JPEG are covered; anything else returns `None`.
fn sniff_dimensions(data: &[u8]) -> Option<(u32, u32)> {
    png_dimensions(data)
        .or_else(|| gif_dimensions(data))
        .or_else(|| jpeg_dimensions(data))
}

fn png_dimensions(data: &[u8]) -> Option<(u32, u32)> {
    const SIGNATURE: [u8; 8] = [0x89, b'P', b'N', b'G', b'\r', b'\n', 0x1a, b'\n'];
    if data.len() < 24 || data[..8] != SIGNATURE || &data[12..16] != b"IHDR" {
        return None;
    }
    let width = u32::from_be_bytes(data[16..20].try_into().ok()?);
    let height = u32::from_be_bytes(data[20..24].try_into().ok()?);
    Some((width, height))
}

fn gif_dimensions(data: &[u8]) -> Option<(u32, u32)> {
    if data.len() < 10 || (!data.starts_with(b"GIF87a") && !data.starts_with(b"GIF89a")) {
        return None;
    }
    let width = u16::from_le_bytes(data[6..8].try_into().ok()?) as u32;
    let height = u16::from_le_bytes(data[8..10].try_into().ok()?) as u32;
    Some((width, height))
}

fn jpeg_dimensions(data: &[u8]) -> Option<(u32, u32)> {
    if data.len() < 4 || data[0] != 0xff || data[1] != 0xd8 {
        return None;
    }
    let mut i = 2;
    while i + 4 <= data.len() {
        if data[i] != 0xff {
            return None;
        }
        let marker = data[i + 1];
        // Standalone markers carry no length
        if (0xd0..=0xd9).contains(&marker) {
            i += 2;
            continue;
        }
        let len = u16::from_be_bytes(data[i + 2..i + 4].try_into().ok()?) as usize;
        // SOF0-SOF15 minus DHT/JPG/DAC hold frame dimensions
        let is_sof = (0xc0..=0xcf).contains(&marker)
            && marker != 0xc4
            && marker != 0xc8
            && marker != 0xcc;
        if is_sof {
            if i + 9 > data.len() {
                return None;
            }
            let height = u16::from_be_bytes(data[i + 5..i + 7].try_into().ok()?) as u32;
            let width = u16::from_be_bytes(data[i + 7..i + 9].try_into().ok()?) as u32;
            return Some((width, height));
        }
        i += 2 + len;
    }
    None
}

/// Duration of a PCM WAV file from its RIFF chunks, or `None`.
fn sniff_wav_duration(data: &[u8]) -> Option<f64> {
    if data.len() < 12 || &data[..4] != b"RIFF" || &data[8..12] != b"WAVE" {
        return None;
    }
    let mut byte_rate: Option<u32> = None;
    let mut data_len: Option<u32> = None;
    let mut i = 12;
    while i + 8 <= data.len() {
        let chunk_id = &data[i..i + 4];
        let chunk_len = u32::from_le_bytes(data[i + 4..i + 8].try_into().ok()?) as usize;
        if chunk_id == b"fmt " && i + 20 <= data.len() {
            byte_rate = Some(u32::from_le_bytes(data[i + 16..i + 20].try_into().ok()?));
        } else if chunk_id == b"data" {
            data_len = Some(chunk_len as u32);
        }
        if byte_rate.is_some() && data_len.is_some() {
            break;
        }
        // Chunks are word-aligned
        i += 8 + chunk_len + (chunk_len & 1);
    }
    match (byte_rate, data_len) {
        (Some(rate), Some(len)) if rate > 0 => Some(len as f64 / rate as f64),
        _ => None,
    }
}
