//! Extract command - upload one invoice and show the extracted data.

use std::fs;
use std::path::PathBuf;
use std::time::Instant;

use clap::Args;
use console::style;
use tracing::{debug, info};

use serde_json::Number;

use incap_core::document::InvoiceFile;
use incap_core::models::invoice::ExtractionResult;
use incap_core::preview::PreviewKind;
use incap_core::session::UploadStatus;

use super::{build_controller, load_config, submit_with_spinner};

/// Arguments for the extract command.
#[derive(Args)]
pub struct ExtractArgs {
    /// Input file (PDF or image)
    #[arg(required = true)]
    input: PathBuf,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    format: OutputFormat,

    /// Extraction service base URL (overrides config and environment)
    #[arg(long)]
    base_url: Option<String>,

    /// Ask the service to skip its OCR step
    #[arg(long)]
    no_ocr_first: bool,

    /// Pretty-print JSON output
    #[arg(long)]
    pretty: bool,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    /// Raw extraction result as JSON
    Json,
    /// Line items as CSV
    Csv,
    /// Plain text summary
    Text,
}

impl OutputFormat {
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Json => "json",
            OutputFormat::Csv => "csv",
            OutputFormat::Text => "txt",
        }
    }
}

pub async fn run(args: ExtractArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();
    let config = load_config(config_path, args.base_url.as_deref())?;

    if !args.input.exists() {
        anyhow::bail!("Input file not found: {}", args.input.display());
    }

    let (mut controller, client) = build_controller(&config, args.no_ocr_first)?;
    info!("Using extraction service at {}", client.base_url());

    let file = InvoiceFile::from_path(&args.input)?;
    for warning in controller.select_file(file) {
        eprintln!("{} {}", style("⚠").yellow(), warning);
    }

    if let Some(preview) = controller.session().preview() {
        let kind = match preview.kind {
            PreviewKind::Image => "image",
            PreviewKind::Document => "document",
        };
        eprintln!(
            "{} {} ({}, {})",
            style("ℹ").blue(),
            preview.name,
            kind,
            preview.size_kb()
        );
    }

    let status = submit_with_spinner(&mut controller, &client).await?;

    match status {
        Some(UploadStatus::Success) => {
            let Some(result) = controller.session().result() else {
                anyhow::bail!("Extraction finished without a result");
            };
            let output = format_result(result, args.format, args.pretty)?;

            if let Some(output_path) = &args.output {
                fs::write(output_path, &output)?;
                eprintln!(
                    "{} Output written to {}",
                    style("✓").green(),
                    output_path.display()
                );
            } else {
                println!("{}", output);
            }
        }
        Some(UploadStatus::Error) => {
            let message = controller.session().error().unwrap_or("unknown error");
            anyhow::bail!("Extraction failed: {}", message);
        }
        Some(other) => {
            anyhow::bail!("Extraction ended in unexpected state: {}", other);
        }
        None => {
            eprintln!("{} Cancelled", style("✗").red());
        }
    }

    controller.reset();
    debug!("Total time: {:?}", start.elapsed());

    Ok(())
}

/// Render an extraction result in the requested format.
pub fn format_result(
    result: &ExtractionResult,
    format: OutputFormat,
    pretty: bool,
) -> anyhow::Result<String> {
    match format {
        OutputFormat::Json if pretty => Ok(serde_json::to_string_pretty(result)?),
        OutputFormat::Json => Ok(serde_json::to_string(result)?),
        OutputFormat::Csv => format_csv(result),
        OutputFormat::Text => Ok(format_text(result)),
    }
}

fn format_csv(result: &ExtractionResult) -> anyhow::Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);

    wtr.write_record(["description", "quantity", "unit_price", "total_price", "tax_rate"])?;

    let items = result.data().map(|d| d.items.as_slice()).unwrap_or_default();
    for item in items {
        wtr.write_record([
            item.description.clone().unwrap_or_default(),
            number_cell(item.quantity.as_ref()),
            number_cell(item.unit_price.as_ref()),
            number_cell(item.total_price.as_ref()),
            number_cell(item.tax_rate()),
        ])?;
    }

    let data = String::from_utf8(wtr.into_inner()?)?;
    Ok(data)
}

/// Render an optional number as a CSV cell, empty when missing.
pub fn number_cell(value: Option<&Number>) -> String {
    value.map(Number::to_string).unwrap_or_default()
}

fn format_text(result: &ExtractionResult) -> String {
    const NA: &str = "N/A";
    let mut output = String::new();

    if result.success {
        output.push_str("Invoice processed successfully\n");
    } else {
        output.push_str("Extraction service reported a failure\n");
    }
    if !result.message.is_empty() {
        output.push_str(&format!("{}\n", result.message));
    }
    if let Some(error) = result.error() {
        output.push_str(&format!("Error: {}\n", error));
    }
    output.push('\n');

    if let Some(data) = result.data() {
        output.push_str(&format!(
            "Invoice Number: {}\n",
            data.invoice_number.as_deref().unwrap_or(NA)
        ));
        output.push_str(&format!(
            "Date:           {}\n",
            data.invoice_date.as_deref().unwrap_or(NA)
        ));
        output.push_str(&format!(
            "Vendor:         {}\n",
            data.vendor_name.as_deref().unwrap_or(NA)
        ));
        output.push_str(&format!(
            "Total Amount:   {}\n",
            data.total_with_currency().as_deref().unwrap_or(NA)
        ));
        output.push_str(&format!("Items:          {} items\n", data.items.len()));
    } else {
        output.push_str("No invoice data returned\n");
    }

    if let Some(processed_at) = result.timestamp_utc() {
        output.push_str(&format!(
            "\nProcessed at {}\n",
            processed_at.format("%Y-%m-%d %H:%M:%S UTC")
        ));
    }

    output
}
