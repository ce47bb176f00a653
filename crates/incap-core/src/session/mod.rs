//! Upload session state and its controller.

mod controller;

pub use controller::{Applied, CompletedExtraction, ExtractionTicket, UploadController};

use std::fmt;

use crate::document::InvoiceFile;
use crate::models::invoice::ExtractionResult;
use crate::preview::Preview;

/// Lifecycle status of an upload session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum UploadStatus {
    /// Nothing in flight; a file may or may not be selected.
    #[default]
    Idle,
    /// A request for the selected file is in flight.
    Uploading,
    /// The last request returned a result.
    Success,
    /// The last request failed.
    Error,
}

impl fmt::Display for UploadStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UploadStatus::Idle => write!(f, "idle"),
            UploadStatus::Uploading => write!(f, "uploading"),
            UploadStatus::Success => write!(f, "success"),
            UploadStatus::Error => write!(f, "error"),
        }
    }
}

/// State of one upload-to-result cycle.
///
/// Only [`UploadController`] mutates a session.
#[derive(Debug, Default)]
pub struct UploadSession {
    file: Option<InvoiceFile>,
    preview: Option<Preview>,
    status: UploadStatus,
    error: Option<String>,
    result: Option<ExtractionResult>,
    generation: u64,
}

impl UploadSession {
    pub fn file(&self) -> Option<&InvoiceFile> {
        self.file.as_ref()
    }

    pub fn preview(&self) -> Option<&Preview> {
        self.preview.as_ref()
    }

    pub fn status(&self) -> UploadStatus {
        self.status
    }

    /// Message of the last failure, if any.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn result(&self) -> Option<&ExtractionResult> {
        self.result.as_ref()
    }

    /// Counter bumped on every file selection and reset.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_uploading(&self) -> bool {
        self.status == UploadStatus::Uploading
    }
}
