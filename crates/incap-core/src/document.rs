//! Invoice file handles.

use std::path::Path;

use bytes::Bytes;
use tracing::debug;

use crate::Result;

/// MIME type used when the file type cannot be determined.
pub const FALLBACK_MIME_TYPE: &str = "application/octet-stream";

/// A selected invoice document: its bytes, file name and MIME type.
///
/// Cloning is cheap; the bytes are shared, not copied.
#[derive(Debug, Clone, PartialEq)]
pub struct InvoiceFile {
    name: String,
    mime_type: String,
    bytes: Bytes,
}

impl InvoiceFile {
    /// Create a file handle from in-memory data.
    pub fn new(
        name: impl Into<String>,
        mime_type: impl Into<String>,
        bytes: impl Into<Bytes>,
    ) -> Self {
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
            bytes: bytes.into(),
        }
    }

    /// Read a file from disk, guessing its MIME type from the extension.
    pub fn from_path(path: &Path) -> Result<Self> {
        let data = std::fs::read(path)?;
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("invoice")
            .to_string();
        let mime_type = mime_guess::from_path(path)
            .first_raw()
            .unwrap_or(FALLBACK_MIME_TYPE)
            .to_string();

        debug!("Loaded {} ({}, {} bytes)", name, mime_type, data.len());

        Ok(Self::new(name, mime_type, data))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    /// Shared view of the file contents.
    pub fn bytes(&self) -> &Bytes {
        &self.bytes
    }

    /// Size in bytes.
    pub fn size(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_image(&self) -> bool {
        self.mime_type.starts_with("image/")
    }

    pub fn is_pdf(&self) -> bool {
        self.mime_type == "application/pdf"
    }
}
