//! Invoice data models matching the extraction service's JSON schema.
//!
//! Every field returned by the service is nullable and passes through
//! untouched: nothing here validates or normalizes extracted values.
//! Numbers are kept as [`serde_json::Number`] so any JSON number survives
//! a decode and re-encode unchanged.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Number;

/// Free-form metadata attached to an extraction result.
pub type Metadata = serde_json::Map<String, serde_json::Value>;

/// A key that may be absent, present as `null`, or present with a value.
///
/// `None` is an absent key and `Some(None)` an explicit `null`. Both are
/// re-encoded the way they arrived.
pub type Nullable<T> = Option<Option<T>>;

/// Response document returned by the extraction service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractionResult {
    /// Whether the service considers the extraction successful.
    pub success: bool,

    /// Human-readable status message.
    pub message: String,

    /// ISO-8601 timestamp, kept exactly as sent.
    pub timestamp: String,

    /// Structured invoice fields.
    #[serde(
        default,
        deserialize_with = "present",
        skip_serializing_if = "Option::is_none"
    )]
    pub data: Nullable<InvoiceData>,

    /// Arbitrary key-value pairs describing the processing run.
    #[serde(
        default,
        deserialize_with = "present",
        skip_serializing_if = "Option::is_none"
    )]
    pub metadata: Nullable<Metadata>,

    /// Error text reported by the service.
    #[serde(
        default,
        deserialize_with = "present",
        skip_serializing_if = "Option::is_none"
    )]
    pub error: Nullable<String>,
}

impl ExtractionResult {
    /// Extracted invoice fields, if the service sent any.
    pub fn data(&self) -> Option<&InvoiceData> {
        self.data.as_ref().and_then(Option::as_ref)
    }

    pub fn metadata(&self) -> Option<&Metadata> {
        self.metadata.as_ref().and_then(Option::as_ref)
    }

    /// Error text reported by the service, if any.
    pub fn error(&self) -> Option<&str> {
        self.error.as_ref().and_then(|e| e.as_deref())
    }

    /// Parse the timestamp as a UTC instant.
    pub fn timestamp_utc(&self) -> Option<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(&self.timestamp)
            .ok()
            .map(|dt| dt.with_timezone(&Utc))
    }

    /// Number of extracted line items.
    pub fn item_count(&self) -> usize {
        self.data().map_or(0, |d| d.items.len())
    }
}

/// Flat record of the fields extracted from one invoice.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct InvoiceData {
    pub invoice_number: Option<String>,
    pub invoice_date: Option<String>,
    pub due_date: Option<String>,

    pub vendor_name: Option<String>,
    pub vendor_address: Option<String>,
    pub vendor_tax_id: Option<String>,

    pub customer_name: Option<String>,
    pub customer_address: Option<String>,

    /// Line items in document order.
    #[serde(deserialize_with = "null_as_empty")]
    pub items: Vec<InvoiceItem>,

    pub subtotal: Option<Number>,
    pub tax_rate: Option<Number>,
    pub tax_amount: Option<Number>,
    pub total_amount: Option<Number>,
    pub currency: Option<String>,

    pub payment_method: Option<String>,
    pub payment_terms: Option<String>,
    pub notes: Option<String>,
}

impl InvoiceData {
    /// Total amount followed by the currency code, e.g. `124.78 USD`.
    pub fn total_with_currency(&self) -> Option<String> {
        let total = self.total_amount.as_ref()?;
        Some(match &self.currency {
            Some(currency) => format!("{} {}", total, currency),
            None => total.to_string(),
        })
    }
}

/// A single line item on the invoice.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct InvoiceItem {
    pub description: Option<String>,
    pub quantity: Option<Number>,
    pub unit_price: Option<Number>,
    pub total_price: Option<Number>,

    /// Per-line tax rate, when the invoice states one.
    #[serde(deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub tax_rate: Nullable<Number>,
}

impl InvoiceItem {
    pub fn tax_rate(&self) -> Option<&Number> {
        self.tax_rate.as_ref().and_then(Option::as_ref)
    }
}

/// Mark a key as present; `null` becomes `Some(None)`.
fn present<'de, D, T>(deserializer: D) -> Result<Nullable<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}
