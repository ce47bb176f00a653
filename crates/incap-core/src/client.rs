//! Extraction service client.

use async_trait::async_trait;
use reqwest::Client;
use reqwest::multipart::{Form, Part};
use tracing::{debug, info};

use crate::document::InvoiceFile;
use crate::error::CaptureError;
use crate::models::invoice::ExtractionResult;
use crate::Result;

/// Path of the extraction webhook, relative to the service base URL.
pub const EXTRACTION_PATH: &str = "/webhook/invoice-ocr-mistral";

/// Options sent along with the file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtractOptions {
    /// Ask the service to run OCR before structuring.
    pub use_ocr_first: bool,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self { use_ocr_first: true }
    }
}

/// Trait for extraction service clients.
///
/// One call is one attempt: implementations do not retry and do not time out.
#[async_trait]
pub trait ExtractionClient: Send + Sync {
    /// Submit a file and return the service's extraction result.
    async fn extract(
        &self,
        file: &InvoiceFile,
        options: ExtractOptions,
    ) -> Result<ExtractionResult>;
}

/// HTTP client for the extraction webhook.
#[derive(Clone, Debug)]
pub struct HttpExtractionClient {
    client: Client,
    base_url: String,
}

impl HttpExtractionClient {
    pub fn new(base_url: &str) -> Result<Self> {
        let client = Client::builder().build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Full URL of the extraction webhook.
    pub fn endpoint(&self) -> String {
        format!("{}{}", self.base_url, EXTRACTION_PATH)
    }

    fn build_form(file: &InvoiceFile, options: ExtractOptions) -> Form {
        let part = || Part::bytes(file.bytes().to_vec()).file_name(file.name().to_string());
        // An unparsable MIME type is sent without a content type.
        let part = part().mime_str(file.mime_type()).unwrap_or_else(|_| part());

        Form::new()
            .part("file", part)
            .text("useOcrFirst", options.use_ocr_first.to_string())
    }
}

#[async_trait]
impl ExtractionClient for HttpExtractionClient {
    async fn extract(
        &self,
        file: &InvoiceFile,
        options: ExtractOptions,
    ) -> Result<ExtractionResult> {
        let url = self.endpoint();
        info!("Uploading {} ({} bytes) to {}", file.name(), file.size(), url);

        let response = self
            .client
            .post(&url)
            .multipart(Self::build_form(file, options))
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await;

        if !status.is_success() {
            let body = body.unwrap_or_default();
            debug!("Extraction failed with status {}", status);
            return Err(CaptureError::from_response(status.as_u16(), &body));
        }

        let body = body?;
        let result: ExtractionResult = serde_json::from_str(&body)?;
        debug!(
            "Extraction returned success={} with {} items",
            result.success,
            result.item_count()
        );

        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;
    use pretty_assertions::assert_eq;

    const RESULT_BODY: &str = r#"{
        "success": true,
        "message": "Extraction complete",
        "timestamp": "2024-10-15T12:30:00.000Z",
        "data": {
            "invoiceNumber": "INV-2024-001",
            "totalAmount": 124.78,
            "currency": "USD",
            "items": [
                {"description": "Paper reams", "quantity": 10, "unitPrice": 4.5, "totalPrice": 45}
            ]
        }
    }"#;

    fn sample_file() -> InvoiceFile {
        InvoiceFile::new("invoice.jpg", "image/jpeg", b"fake-jpeg-bytes".to_vec())
    }

    #[test]
    fn test_endpoint_trims_trailing_slash() {
        let client = HttpExtractionClient::new("http://localhost:5678/").unwrap();
        assert_eq!(client.base_url(), "http://localhost:5678");
        assert_eq!(
            client.endpoint(),
            "http://localhost:5678/webhook/invoice-ocr-mistral"
        );
    }

    #[tokio::test]
    async fn test_extract_success() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", EXTRACTION_PATH)
            .match_header("content-type", Matcher::Regex("^multipart/form-data".to_string()))
            .match_body(Matcher::AllOf(vec![
                Matcher::Regex(r#"name="file"; filename="invoice.jpg""#.to_string()),
                Matcher::Regex("fake-jpeg-bytes".to_string()),
                Matcher::Regex("name=\"useOcrFirst\"\r\n\r\ntrue".to_string()),
            ]))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(RESULT_BODY)
            .create_async()
            .await;

        let client = HttpExtractionClient::new(&server.url()).unwrap();
        let result = client
            .extract(&sample_file(), ExtractOptions::default())
            .await
            .unwrap();

        mock.assert_async().await;
        let data = result.data().unwrap();
        assert_eq!(data.invoice_number.as_deref(), Some("INV-2024-001"));
        assert_eq!(data.total_amount.as_ref().and_then(|v| v.as_f64()), Some(124.78));
        assert_eq!(data.items.len(), 1);
    }

    #[tokio::test]
    async fn test_extract_sends_ocr_flag_false() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", EXTRACTION_PATH)
            .match_body(Matcher::Regex("name=\"useOcrFirst\"\r\n\r\nfalse".to_string()))
            .with_status(200)
            .with_body(RESULT_BODY)
            .create_async()
            .await;

        let client = HttpExtractionClient::new(&server.url()).unwrap();
        client
            .extract(&sample_file(), ExtractOptions { use_ocr_first: false })
            .await
            .unwrap();

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_error_status_uses_body() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", EXTRACTION_PATH)
            .with_status(500)
            .with_body("internal error")
            .create_async()
            .await;

        let client = HttpExtractionClient::new(&server.url()).unwrap();
        let err = client
            .extract(&sample_file(), ExtractOptions::default())
            .await
            .unwrap_err();

        assert!(matches!(err, CaptureError::Request { status: 500, .. }));
        assert_eq!(err.to_string(), "internal error");
    }

    #[tokio::test]
    async fn test_error_status_without_body() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", EXTRACTION_PATH)
            .with_status(404)
            .create_async()
            .await;

        let client = HttpExtractionClient::new(&server.url()).unwrap();
        let err = client
            .extract(&sample_file(), ExtractOptions::default())
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "request failed with status 404");
    }

    #[tokio::test]
    async fn test_unparsable_body() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", EXTRACTION_PATH)
            .with_status(200)
            .with_body("<html>gateway says hi</html>")
            .create_async()
            .await;

        let client = HttpExtractionClient::new(&server.url()).unwrap();
        let err = client
            .extract(&sample_file(), ExtractOptions::default())
            .await
            .unwrap_err();

        assert!(matches!(err, CaptureError::Parse(_)));
    }

    #[tokio::test]
    async fn test_wrong_shape_is_parse_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", EXTRACTION_PATH)
            .with_status(200)
            .with_body(r#"{"ok": true}"#)
            .create_async()
            .await;

        let client = HttpExtractionClient::new(&server.url()).unwrap();
        let err = client
            .extract(&sample_file(), ExtractOptions::default())
            .await
            .unwrap_err();

        assert!(matches!(err, CaptureError::Parse(_)));
    }

    #[tokio::test]
    async fn test_unreachable_service() {
        let client = HttpExtractionClient::new("http://127.0.0.1:1").unwrap();
        let err = client
            .extract(&sample_file(), ExtractOptions::default())
            .await
            .unwrap_err();

        assert!(matches!(err, CaptureError::Network(_)));
    }
}
