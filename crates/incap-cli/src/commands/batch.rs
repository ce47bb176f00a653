//! Batch command - upload several invoices one after another.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::Args;
use console::style;
use glob::glob;
use tracing::{debug, error, warn};

use incap_core::document::InvoiceFile;
use incap_core::models::invoice::ExtractionResult;
use incap_core::session::UploadStatus;

use super::extract::{OutputFormat, format_result, number_cell};
use super::{build_controller, load_config, submit_with_spinner};

/// Arguments for the batch command.
#[derive(Args)]
pub struct BatchArgs {
    /// Input files or glob pattern
    #[arg(required = true)]
    input: String,

    /// Output directory (default: print to stdout)
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Output format for each file
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,

    /// Also generate a summary CSV
    #[arg(long)]
    summary: bool,

    /// Continue on error
    #[arg(long)]
    continue_on_error: bool,

    /// Extraction service base URL (overrides config and environment)
    #[arg(long)]
    base_url: Option<String>,

    /// Ask the service to skip its OCR step
    #[arg(long)]
    no_ocr_first: bool,
}

/// Outcome of uploading a single file.
struct FileOutcome {
    path: PathBuf,
    result: Option<ExtractionResult>,
    error: Option<String>,
}

pub async fn run(args: BatchArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();
    let config = load_config(config_path, args.base_url.as_deref())?;

    let files: Vec<PathBuf> = glob(&args.input)?
        .filter_map(|r| r.ok())
        .filter(|p| is_supported(p))
        .collect();

    if files.is_empty() {
        anyhow::bail!("No matching files found for pattern: {}", args.input);
    }

    eprintln!(
        "{} Found {} files to process",
        style("ℹ").blue(),
        files.len()
    );

    if let Some(ref output_dir) = args.output_dir {
        fs::create_dir_all(output_dir)?;
    }

    let (mut controller, client) = build_controller(&config, args.no_ocr_first)?;
    let mut outcomes = Vec::with_capacity(files.len());

    for path in files {
        let file = match InvoiceFile::from_path(&path) {
            Ok(file) => file,
            Err(e) if args.continue_on_error => {
                warn!("Failed to read {}: {}", path.display(), e);
                outcomes.push(FileOutcome {
                    path,
                    result: None,
                    error: Some(e.to_string()),
                });
                continue;
            }
            Err(e) => return Err(e.into()),
        };

        for warning in controller.select_file(file) {
            eprintln!("{} {}", style("⚠").yellow(), warning);
        }

        match submit_with_spinner(&mut controller, &client).await? {
            Some(UploadStatus::Success) => {
                let result = controller.session().result().cloned();
                eprintln!("{} {}", style("✓").green(), path.display());
                outcomes.push(FileOutcome {
                    path,
                    result,
                    error: None,
                });
            }
            Some(_) => {
                let message = controller
                    .session()
                    .error()
                    .unwrap_or("unknown error")
                    .to_string();
                if !args.continue_on_error {
                    error!("Failed to process {}: {}", path.display(), message);
                    anyhow::bail!("Processing failed: {}", message);
                }
                eprintln!("{} {}: {}", style("✗").red(), path.display(), message);
                outcomes.push(FileOutcome {
                    path,
                    result: None,
                    error: Some(message),
                });
            }
            None => {
                eprintln!("{} Cancelled", style("✗").red());
                break;
            }
        }

        controller.reset();
    }

    for outcome in &outcomes {
        let Some(result) = &outcome.result else {
            continue;
        };
        let content = format_result(result, args.format, false)?;

        match &args.output_dir {
            Some(output_dir) => {
                let path = output_path(output_dir, &outcome.path, args.format);
                fs::write(&path, content)?;
                debug!("Wrote output to {}", path.display());
            }
            None => println!("{}", content),
        }
    }

    if args.summary {
        let summary_path = args
            .output_dir
            .as_ref()
            .map(|d| d.join("summary.csv"))
            .unwrap_or_else(|| PathBuf::from("summary.csv"));

        write_summary(&summary_path, &outcomes)?;
        eprintln!(
            "{} Summary written to {}",
            style("✓").green(),
            summary_path.display()
        );
    }

    let succeeded = outcomes.iter().filter(|o| o.result.is_some()).count();
    let failed = outcomes.len() - succeeded;

    eprintln!();
    eprintln!(
        "{} Processed {} files in {:?}",
        style("✓").green(),
        outcomes.len(),
        start.elapsed()
    );
    eprintln!("  Successful: {}", style(succeeded).green());
    if failed > 0 {
        eprintln!("  Failed:     {}", style(failed).red());
        anyhow::bail!("{} of {} files failed", failed, outcomes.len());
    }

    Ok(())
}

/// Output file for one input. The full input name is kept so that
/// `scan.jpg` and `scan.pdf` do not overwrite each other.
fn output_path(output_dir: &Path, input: &Path, format: OutputFormat) -> PathBuf {
    let input_name = input
        .file_name()
        .map(|s| s.to_string_lossy())
        .unwrap_or_else(|| "invoice".into());
    output_dir.join(format!("{}.{}", input_name, format.extension()))
}

fn is_supported(path: &Path) -> bool {
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
    matches!(
        ext.to_lowercase().as_str(),
        "pdf" | "png" | "jpg" | "jpeg" | "tif" | "tiff" | "webp" | "heic"
    )
}

fn write_summary(path: &Path, outcomes: &[FileOutcome]) -> anyhow::Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;

    wtr.write_record([
        "file",
        "status",
        "invoice_number",
        "vendor_name",
        "total_amount",
        "currency",
        "items",
        "error",
    ])?;

    for outcome in outcomes {
        let data = outcome.result.as_ref().and_then(ExtractionResult::data);
        wtr.write_record([
            outcome.path.display().to_string(),
            if outcome.result.is_some() { "success" } else { "error" }.to_string(),
            data.and_then(|d| d.invoice_number.clone()).unwrap_or_default(),
            data.and_then(|d| d.vendor_name.clone()).unwrap_or_default(),
            number_cell(data.and_then(|d| d.total_amount.as_ref())),
            data.and_then(|d| d.currency.clone()).unwrap_or_default(),
            data.map(|d| d.items.len().to_string()).unwrap_or_default(),
            outcome.error.clone().unwrap_or_default(),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}
