// SPDX-License-Identifier: MIT
//
// Notelift — batch digitizer for handwritten notebook photos.
//
// Entry point. Initialises logging, resolves configuration from file and
// command line, runs the batch pipeline, and writes the output documents.

mod batch;

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use notelift_core::types::OutputFormat;
use notelift_core::{AppConfig, Result};
use notelift_document::export::writer_for;
use notelift_document::NoopRecognizer;
use tracing::{error, info};

use batch::{run_batch, SharedRecognizer};

/// Digitize photos of notebook spreads into text documents.
#[derive(Debug, Parser)]
#[command(name = "notelift", version, about)]
struct Cli {
    /// Directory of source photos.
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Directory for output documents.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Number of pages expected per photo.
    #[arg(short, long)]
    pages: Option<usize>,

    /// Maximum number of photos processed concurrently.
    #[arg(short, long)]
    workers: Option<usize>,

    /// Output formats (markdown, text, pdf); repeatable.
    #[arg(short, long, value_name = "FORMAT")]
    format: Vec<OutputFormat>,

    /// JSON configuration file; command-line flags override it.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

impl Cli {
    /// Merge command-line overrides onto the loaded configuration.
    fn resolve(self) -> Result<AppConfig> {
        let mut config = AppConfig::load_or_default(self.config.as_deref())?;
        if let Some(input) = self.input {
            config.input_dir = input;
        }
        if let Some(output) = self.output {
            config.output_dir = output;
        }
        if let Some(pages) = self.pages {
            config.segment.expected_pages = pages;
        }
        if let Some(workers) = self.workers {
            config.max_workers = workers;
        }
        if !self.format.is_empty() {
            config.formats = self.format;
        }
        config.validate()?;
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(%err, "run failed");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = cli.resolve()?;
    info!(
        input = %config.input_dir.display(),
        output = %config.output_dir.display(),
        expected_pages = config.segment.expected_pages,
        workers = config.max_workers,
        "Notelift starting"
    );

    let recognizer = build_recognizer()?;
    let outcome = run_batch(&config, recognizer).await?;

    std::fs::create_dir_all(&config.output_dir)?;
    for format in &config.formats {
        let path = config
            .output_dir
            .join(format!("{}.{}", config.output_stem, format.extension()));
        writer_for(*format).write_to_file(&config.output_stem, &outcome.pages, &path)?;
    }

    info!(
        processed = outcome.processed,
        skipped = outcome.skipped,
        pages = outcome.pages.len(),
        formats = config.formats.len(),
        "Notelift finished"
    );
    Ok(())
}

/// OCR-backed recognizer when compiled in and models are cached, otherwise
/// the no-op recognizer that yields image-only output.
#[cfg(feature = "ocr")]
fn build_recognizer() -> Result<SharedRecognizer> {
    use notelift_document::recognize::ocr;

    if ocr::models_available() {
        Ok(Arc::new(ocr::OcrRecognizer::with_defaults()?))
    } else {
        tracing::warn!("OCR models not found, pages will carry no text");
        Ok(Arc::new(NoopRecognizer))
    }
}

#[cfg(not(feature = "ocr"))]
fn build_recognizer() -> Result<SharedRecognizer> {
    tracing::warn!("built without the ocr feature, pages will carry no text");
    Ok(Arc::new(NoopRecognizer))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_overrides_take_precedence() {
        let cli = Cli {
            input: Some(PathBuf::from("/photos")),
            output: None,
            pages: Some(2),
            workers: Some(8),
            format: vec![OutputFormat::Pdf],
            config: None,
        };
        let config = cli.resolve().unwrap();
        assert_eq!(config.input_dir, PathBuf::from("/photos"));
        assert_eq!(config.segment.expected_pages, 2);
        assert_eq!(config.max_workers, 8);
        assert_eq!(config.formats, vec![OutputFormat::Pdf]);
        // Untouched fields keep their defaults.
        assert_eq!(config.output_stem, "notes");
    }

    #[test]
    fn zero_pages_override_is_rejected() {
        let cli = Cli {
            input: None,
            output: None,
            pages: Some(0),
            workers: None,
            format: Vec::new(),
            config: None,
        };
        assert!(cli.resolve().is_err());
    }

    #[test]
    fn config_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notelift.json");
        let mut config = AppConfig::default();
        config.segment.expected_pages = 4;
        std::fs::write(&path, serde_json::to_string(&config).unwrap()).unwrap();

        let cli = Cli {
            input: None,
            output: None,
            pages: None,
            workers: None,
            format: Vec::new(),
            config: Some(path),
        };
        let resolved = cli.resolve().unwrap();
        assert_eq!(resolved.segment.expected_pages, 4);
    }
}
