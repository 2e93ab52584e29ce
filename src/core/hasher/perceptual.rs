//! Perceptual fingerprinting via gradient hashing.

use crate::error::HashError;
use image_hasher::{HashAlg, HasherConfig};
use std::path::Path;

/// Hash size in both dimensions; 8x8 gradients give a 64-bit fingerprint.
const HASH_SIZE: u32 = 8;

/// A perceptual fingerprint of an image's visual content
///
/// Two fingerprints are compared by Hamming distance over their bits;
/// visually identical images land within a few bits of each other even
/// when their byte encodings differ completely.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fingerprint {
    bytes: Vec<u8>,
}

impl Fingerprint {
    /// Reconstruct a fingerprint from raw bytes
    pub fn from_bytes(bytes: &[u8]) -> Self {
        Self {
            bytes: bytes.to_vec(),
        }
    }

    /// The raw fingerprint bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Hamming distance to another fingerprint
    ///
    /// Counts differing bits; lower means more similar.
    pub fn distance(&self, other: &Fingerprint) -> u32 {
        self.bytes
            .iter()
            .zip(other.bytes.iter())
            .map(|(a, b)| (a ^ b).count_ones())
            .sum()
    }
}

/// Compute the perceptual fingerprint of an image file.
///
/// Decoding failures are reported as [`HashError`] so the caller can
/// exclude the file from duplicate consideration; they never abort the run.
pub fn fingerprint_file(path: &Path) -> Result<Fingerprint, HashError> {
    let image = image::open(path).map_err(|e| match e {
        image::ImageError::IoError(source) => HashError::Unreadable {
            path: path.to_path_buf(),
            source,
        },
        other => HashError::Decode {
            path: path.to_path_buf(),
            reason: other.to_string(),
        },
    })?;

    let hasher = HasherConfig::new()
        .hash_alg(HashAlg::Gradient)
        .hash_size(HASH_SIZE, HASH_SIZE)
        .to_hasher();

    Ok(Fingerprint {
        bytes: hasher.hash_image(&image).as_bytes().to_vec(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageBuffer, Rgb};
    use tempfile::TempDir;

    fn gradient_image() -> ImageBuffer<Rgb<u8>, Vec<u8>> {
        ImageBuffer::from_fn(64, 64, |x, y| Rgb([(x * 4) as u8, (y * 4) as u8, 128]))
    }

    #[test]
    fn distance_to_self_is_zero() {
        let print = Fingerprint::from_bytes(&[0xFF, 0x00, 0xAA, 0x55]);
        assert_eq!(print.distance(&print), 0);
    }

    #[test]
    fn distance_counts_differing_bits() {
        let a = Fingerprint::from_bytes(&[0b1111_1111]);
        let b = Fingerprint::from_bytes(&[0b0000_0000]);
        assert_eq!(a.distance(&b), 8);
    }

    #[test]
    fn distance_is_symmetric() {
        let a = Fingerprint::from_bytes(&[0xF0, 0x0F]);
        let b = Fingerprint::from_bytes(&[0x0F, 0xF0]);
        assert_eq!(a.distance(&b), b.distance(&a));
    }

    #[test]
    fn same_image_in_two_encodings_matches() {
        let dir = TempDir::new().unwrap();
        let png_path = dir.path().join("photo.png");
        let jpg_path = dir.path().join("photo.jpg");

        let img = gradient_image();
        img.save(&png_path).unwrap();
        img.save(&jpg_path).unwrap();

        let png_print = fingerprint_file(&png_path).unwrap();
        let jpg_print = fingerprint_file(&jpg_path).unwrap();

        assert!(png_print.distance(&jpg_print) <= 4);
    }

    #[test]
    fn missing_file_is_unreadable() {
        let result = fingerprint_file(Path::new("/nonexistent/photo.jpg"));
        assert!(matches!(result, Err(HashError::Unreadable { .. })));
    }

    #[test]
    fn garbage_file_is_a_decode_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("broken.jpg");
        std::fs::write(&path, b"this is not a valid image file").unwrap();

        let result = fingerprint_file(&path);
        assert!(matches!(result, Err(HashError::Decode { .. })));
    }
}
