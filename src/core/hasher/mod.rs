//! # Hasher Module
//!
//! Two kinds of content digests back the two detection tiers:
//!
//! - **Strong hash** (`content`) - streaming xxh3-128 over the raw bytes.
//!   Byte-identical files and nothing else collide in practice. Used inside
//!   size-collision groups by the exact-duplicate detector.
//! - **Perceptual fingerprint** (`perceptual`) - 64-bit gradient hash of
//!   the decoded image. Survives re-compression, so it catches the
//!   "original HEIC plus exported JPEG" pairs the strong hash cannot.
//!
//! Both are expensive relative to a directory scan, which is why the
//! detectors filter candidates before either one runs and the
//! [`MetadataCache`] memoizes results.
//!
//! [`MetadataCache`]: crate::core::metadata::MetadataCache

mod content;
mod perceptual;

pub use content::{hash_file, ContentHash};
pub use perceptual::{fingerprint_file, Fingerprint};
