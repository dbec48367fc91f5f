//! Content addressing and media metadata for Handbill.
//!
//! A leaf crate shared by every part of the pipeline:
//! - **handbill** (orchestration): hashes candidate files before signing
//! - **storage targets**: verify blob addresses against credentials
//! - **callers**: compare attachment identities across revisions
//!
//! # Quick Start
//!
//! ```rust
//! use mediacas::{ContentAddress, ContentHasher};
//!
//! // Address some bytes directly
//! let addr = ContentAddress::from_data(b"Hello, World!");
//! println!("sha-256 address: {}", addr);
//!
//! // Or derive full attachment metadata in one pass
//! let meta = ContentHasher::from_bytes(b"Hello, World!", "image/png", "hello.png");
//! assert_eq!(meta.address, addr);
//! ```
//!
//! # Determinism
//!
//! Addresses are pure functions of content bytes. Identical bytes always
//! produce identical addresses, across calls and across processes; this is
//! the invariant everything downstream (batch authorization, upload
//! verification, reconciliation identity) leans on.

pub mod hash;
pub mod kind;
pub mod metadata;

// Re-exports for convenience
pub use hash::{ContentAddress, HashAlgorithm, HashError, StreamingHasher};
pub use kind::{effective_mime, MediaKind};
pub use metadata::{AttachmentMetadata, ContentHasher};
