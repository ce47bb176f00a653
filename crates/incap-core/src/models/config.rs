//! Configuration structures for the capture front end.

use serde::{Deserialize, Serialize};

use crate::document::InvoiceFile;

/// Environment variable overriding the extraction service address.
pub const BASE_URL_ENV: &str = "INCAP_API_BASE_URL";

/// Address used when nothing else is configured.
pub const DEFAULT_BASE_URL: &str = "http://localhost:5678";

/// Main configuration for incap.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    /// Extraction service configuration.
    pub service: ServiceConfig,

    /// Advisory upload policy.
    pub upload: UploadPolicy,
}

/// Where and how to reach the extraction service.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Base URL of the extraction service.
    pub base_url: String,

    /// Ask the service to run OCR before structuring.
    pub use_ocr_first: bool,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            use_ocr_first: true,
        }
    }
}

/// Size and type hints shown to the user before upload.
///
/// Violations produce warnings only; they never block selection or submission.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UploadPolicy {
    /// Largest file size, in bytes, the service is expected to accept.
    pub max_file_size: u64,

    /// Accepted MIME types. A trailing `/*` matches a whole family.
    pub accepted_types: Vec<String>,
}

impl Default for UploadPolicy {
    fn default() -> Self {
        Self {
            max_file_size: 10 * 1024 * 1024,
            accepted_types: vec!["image/*".to_string(), "application/pdf".to_string()],
        }
    }
}

impl UploadPolicy {
    /// Check a file against the policy and return any warnings.
    pub fn check(&self, file: &InvoiceFile) -> Vec<String> {
        let mut warnings = Vec::new();

        if file.size() as u64 > self.max_file_size {
            warnings.push(format!(
                "{} is {:.1} MB, larger than the {:.1} MB limit",
                file.name(),
                file.size() as f64 / (1024.0 * 1024.0),
                self.max_file_size as f64 / (1024.0 * 1024.0)
            ));
        }

        if !self.accepts(file.mime_type()) {
            warnings.push(format!(
                "{} has type {}, expected one of: {}",
                file.name(),
                file.mime_type(),
                self.accepted_types.join(", ")
            ));
        }

        warnings
    }

    fn accepts(&self, mime_type: &str) -> bool {
        self.accepted_types.iter().any(|accepted| {
            match accepted.strip_suffix("/*") {
                Some(family) => mime_type
                    .split_once('/')
                    .is_some_and(|(prefix, _)| prefix.eq_ignore_ascii_case(family)),
                None => accepted.eq_ignore_ascii_case(mime_type),
            }
        })
    }
}

impl CaptureConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &std::path::Path) -> Result<Self, std::io::Error> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content).map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())
        })
    }

    /// Apply the base URL override from the environment, if set.
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(base_url) = std::env::var(BASE_URL_ENV) {
            if !base_url.trim().is_empty() {
                self.service.base_url = base_url;
            }
        }
        self
    }
}
