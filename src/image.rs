//! Program image loading.
//!
//! An image is a raw binary file copied verbatim into memory at address 0.
//! There is no header; anything past the size of memory is ignored.

use crate::cpu::MEMORY_SIZE;
use std::path::Path;
use thiserror::Error;

/// A loaded program image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgramImage {
    /// Bytes to place in memory, at most [`MEMORY_SIZE`].
    pub bytes: Vec<u8>,
    /// Length of the source before truncation.
    pub source_len: usize,
}

impl ProgramImage {
    /// Build an image from raw bytes, truncating to the size of memory.
    pub fn from_bytes(mut bytes: Vec<u8>) -> Self {
        let source_len = bytes.len();
        bytes.truncate(MEMORY_SIZE);
        Self { bytes, source_len }
    }

    /// Whether the source was longer than memory.
    pub fn is_truncated(&self) -> bool {
        self.source_len > self.bytes.len()
    }
}

/// Load a program image from disk.
pub fn load_image<P: AsRef<Path>>(path: P) -> Result<ProgramImage, ImageError> {
    let path = path.as_ref();
    let bytes = std::fs::read(path).map_err(|source| ImageError::Io {
        path: path.display().to_string(),
        source,
    })?;

    let image = ProgramImage::from_bytes(bytes);
    log::debug!("{} ({}B)", path.display(), image.source_len);
    if image.is_truncated() {
        log::warn!(
            "{} is {} bytes; only the first {} are loaded",
            path.display(),
            image.source_len,
            MEMORY_SIZE
        );
    }

    Ok(image)
}

/// Errors that can occur while loading an image.
#[derive(Debug, Error)]
pub enum ImageError {
    #[error("{path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_bytes_short() {
        let image = ProgramImage::from_bytes(vec![0x30, 0x05]);

        assert_eq!(image.bytes.len(), 2);
        assert!(!image.is_truncated());
    }

    #[test]
    fn test_from_bytes_truncates() {
        let image = ProgramImage::from_bytes(vec![1; 200]);

        assert_eq!(image.bytes.len(), MEMORY_SIZE);
        assert_eq!(image.source_len, 200);
        assert!(image.is_truncated());
    }

    #[test]
    fn test_load_image_from_disk() {
        let path = std::env::temp_dir().join(format!("nibble-image-{}.bin", std::process::id()));
        std::fs::write(&path, [0x30, 0x05, 0xF0, 0x00]).unwrap();

        let image = load_image(&path).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(image.bytes, vec![0x30, 0x05, 0xF0, 0x00]);
    }

    #[test]
    fn test_load_missing_file() {
        let err = load_image("/nonexistent/nibble/program.bin").unwrap_err();

        assert!(err.to_string().starts_with("/nonexistent/nibble/program.bin: "));
    }
}
