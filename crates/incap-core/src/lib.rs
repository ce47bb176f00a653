//! Core library for invoice capture.
//!
//! This crate provides:
//! - The upload session and its lifecycle controller
//! - An HTTP client for the invoice extraction webhook
//! - Invoice data models matching the extraction service's JSON schema
//! - File handles, preview resources, and configuration

pub mod client;
pub mod document;
pub mod error;
pub mod models;
pub mod preview;
pub mod session;

pub use client::{ExtractOptions, ExtractionClient, HttpExtractionClient};
pub use document::InvoiceFile;
pub use error::{CaptureError, Result};
pub use models::config::{CaptureConfig, ServiceConfig, UploadPolicy};
pub use models::invoice::{ExtractionResult, InvoiceData, InvoiceItem};
pub use preview::{MemoryPreviewStore, Preview, PreviewKind, PreviewStore};
pub use session::{Applied, UploadController, UploadSession, UploadStatus};
