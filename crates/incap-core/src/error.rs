//! Error types for the incap-core library.

use thiserror::Error;

/// Main error type for the incap library.
#[derive(Error, Debug)]
pub enum CaptureError {
    /// A precondition of the upload controller was not met.
    #[error("{0}")]
    Validation(String),

    /// The extraction service answered with a non-success status.
    ///
    /// The message is the response body when the service sent one.
    #[error("{message}")]
    Request { status: u16, message: String },

    /// The response body is not a valid extraction result.
    #[error("failed to parse extraction response: {0}")]
    Parse(#[from] serde_json::Error),

    /// The request could not be sent or completed.
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// An extraction request is already in flight for this session.
    #[error("an extraction request is already in progress")]
    Busy,

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

impl CaptureError {
    /// Build a request error from a status code and the raw response body.
    pub fn from_response(status: u16, body: &str) -> Self {
        let message = if body.trim().is_empty() {
            format!("request failed with status {}", status)
        } else {
            body.to_string()
        };
        CaptureError::Request { status, message }
    }

    /// Error raised when submitting without a selected file.
    pub fn no_file_selected() -> Self {
        CaptureError::Validation(
            "no file selected: please select an invoice first".to_string(),
        )
    }
}

/// Result type for the incap library.
pub type Result<T> = std::result::Result<T, CaptureError>;
