//! Upload checks for menu photos.
//!
//! Runs before any request is sent: the bytes must look like an image
//! (format sniffed from magic bytes, not the file extension) and fit the
//! backend's size limit.

use std::path::Path;

use crate::error::ScanError;

/// Largest upload the backend accepts.
pub const MAX_IMAGE_BYTES: usize = 10 * 1024 * 1024;

pub const NOT_AN_IMAGE: &str = "The selected file is not an image.";
pub const IMAGE_TOO_LARGE: &str = "The image is larger than 10 MB.";

/// A validated menu photo ready for upload.
#[derive(Debug, Clone)]
pub struct MenuImage {
    pub bytes: Vec<u8>,
    pub mime_type: &'static str,
    pub file_name: String,
}

impl MenuImage {
    pub fn from_bytes(bytes: Vec<u8>, file_name: impl Into<String>) -> Result<Self, ScanError> {
        if bytes.len() > MAX_IMAGE_BYTES {
            log::warn!("[IMAGE] Rejected upload: {} bytes", bytes.len());
            return Err(ScanError::InvalidImage(IMAGE_TOO_LARGE.to_string()));
        }
        let format = image::guess_format(&bytes).map_err(|e| {
            log::warn!("[IMAGE] Unrecognized image data: {}", e);
            ScanError::InvalidImage(NOT_AN_IMAGE.to_string())
        })?;
        let mime_type = format.to_mime_type();
        log::info!("[IMAGE] {:?} ({}), {} bytes", format, mime_type, bytes.len());
        Ok(Self {
            bytes,
            mime_type,
            file_name: file_name.into(),
        })
    }

    /// Read and validate a file from disk.
    pub fn open(path: &Path) -> Result<Self, ScanError> {
        let bytes = std::fs::read(path).map_err(|e| {
            ScanError::InvalidImage(format!("Could not read {}: {}", path.display(), e))
        })?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "menu".to_string());
        Self::from_bytes(bytes, file_name)
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}
