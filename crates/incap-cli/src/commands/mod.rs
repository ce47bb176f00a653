//! CLI subcommands.

pub mod batch;
pub mod config;
pub mod extract;

use std::path::{Path, PathBuf};
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use tracing::debug;

use incap_core::client::{ExtractOptions, HttpExtractionClient};
use incap_core::models::config::CaptureConfig;
use incap_core::preview::MemoryPreviewStore;
use incap_core::session::{Applied, UploadController, UploadStatus};

pub type Controller = UploadController<HttpExtractionClient, MemoryPreviewStore>;

/// Default location of the configuration file.
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("incap")
        .join("config.json")
}

/// Load configuration: file (explicit or default location), then the
/// environment override, then the command-line base URL.
pub fn load_config(
    config_path: Option<&str>,
    base_url: Option<&str>,
) -> anyhow::Result<CaptureConfig> {
    let config = match config_path {
        Some(path) => CaptureConfig::from_file(Path::new(path))?,
        None => {
            let default_path = default_config_path();
            if default_path.exists() {
                debug!("Using config file {}", default_path.display());
                CaptureConfig::from_file(&default_path)?
            } else {
                CaptureConfig::default()
            }
        }
    };

    let mut config = config.with_env_overrides();
    if let Some(base_url) = base_url {
        config.service.base_url = base_url.to_string();
    }

    Ok(config)
}

/// Build a controller and a second handle on its client for running tickets.
pub fn build_controller(
    config: &CaptureConfig,
    no_ocr_first: bool,
) -> anyhow::Result<(Controller, HttpExtractionClient)> {
    let client = HttpExtractionClient::new(&config.service.base_url)?;
    let options = ExtractOptions {
        use_ocr_first: config.service.use_ocr_first && !no_ocr_first,
    };

    let controller = UploadController::new(client.clone(), MemoryPreviewStore::new())
        .with_options(options)
        .with_policy(config.upload.clone());

    Ok((controller, client))
}

/// Submit the selected file while showing a spinner.
///
/// Ctrl-C resets the session; the pending response is then discarded and
/// `None` is returned.
pub async fn submit_with_spinner(
    controller: &mut Controller,
    client: &HttpExtractionClient,
) -> anyhow::Result<Option<UploadStatus>> {
    let ticket = controller.begin_submit()?;

    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner().template("{spinner:.green} [{elapsed_precise}] {msg}")?,
    );
    pb.set_message(format!("Processing {}: extracting data...", ticket.file().name()));
    pb.enable_steady_tick(Duration::from_millis(100));

    let completed = tokio::select! {
        completed = ticket.run(client) => completed,
        _ = tokio::signal::ctrl_c() => {
            controller.reset();
            pb.finish_and_clear();
            return Ok(None);
        }
    };

    pb.finish_and_clear();

    Ok(match controller.complete(completed) {
        Applied::Current(status) => Some(status),
        Applied::Stale => None,
    })
}
