// SPDX-License-Identifier: MIT
//
// OCR-backed page recognition via the `ocrs` crate, a pure-Rust engine
// running neural network models through `rten`.
//
// Only available with the `ocr` feature:
//
// ```toml
// notelift-document = { path = "crates/notelift-document", features = ["ocr"] }
// ```
//
// The engine needs two model files, `text-detection.rten` and
// `text-recognition.rten`, cached under `$XDG_CACHE_HOME/ocrs` (typically
// `~/.cache/ocrs`). Running the `ocrs-cli` tool once downloads them.

use std::path::{Path, PathBuf};

use image::DynamicImage;
use notelift_core::{NoteliftError, Result};
use ocrs::{ImageSource, OcrEngine, OcrEngineParams};
use rten::Model;
use tracing::{debug, info, instrument, warn};

use super::PageRecognizer;

const DETECTION_MODEL_FILENAME: &str = "text-detection.rten";
const RECOGNITION_MODEL_FILENAME: &str = "text-recognition.rten";

/// Default model cache directory: `$XDG_CACHE_HOME/ocrs`, falling back to
/// `~/.cache/ocrs`.
fn default_model_dir() -> PathBuf {
    if let Ok(xdg) = std::env::var("XDG_CACHE_HOME") {
        PathBuf::from(xdg).join("ocrs")
    } else if let Ok(home) = std::env::var("HOME") {
        PathBuf::from(home).join(".cache").join("ocrs")
    } else {
        PathBuf::from("ocrs-models")
    }
}

/// Locations of the detection and recognition model files.
#[derive(Debug, Clone)]
pub struct OcrConfig {
    pub detection_model_path: PathBuf,
    pub recognition_model_path: PathBuf,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self::from_dir(default_model_dir())
    }
}

impl OcrConfig {
    /// Point at a directory expected to contain `text-detection.rten` and
    /// `text-recognition.rten`.
    pub fn from_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self {
            detection_model_path: dir.join(DETECTION_MODEL_FILENAME),
            recognition_model_path: dir.join(RECOGNITION_MODEL_FILENAME),
        }
    }

    /// Verify that both model files exist.
    pub fn validate(&self) -> Result<()> {
        for path in [&self.detection_model_path, &self.recognition_model_path] {
            if !path.exists() {
                return Err(NoteliftError::OcrError(format!(
                    "OCR model not found at {}; run `ocrs-cli` once to download models",
                    path.display()
                )));
            }
        }
        Ok(())
    }
}

/// Check whether OCR model files exist in the default cache location.
pub fn models_available() -> bool {
    let config = OcrConfig::default();
    config.detection_model_path.exists() && config.recognition_model_path.exists()
}

/// Page recognizer backed by the `ocrs` engine.
///
/// Construction loads the models, which is the expensive step; build one
/// recognizer per batch and reuse it for every page.
pub struct OcrRecognizer {
    engine: OcrEngine,
}

impl OcrRecognizer {
    /// Load models from the paths in `config` and initialise the engine.
    ///
    /// Note that `ocrs` and `rten` must be compiled in release mode; debug
    /// builds are orders of magnitude slower.
    #[instrument(skip_all, fields(
        detection = %config.detection_model_path.display(),
        recognition = %config.recognition_model_path.display(),
    ))]
    pub fn new(config: OcrConfig) -> Result<Self> {
        config.validate()?;

        info!("loading OCR models");
        let detection_model = Model::load_file(&config.detection_model_path).map_err(|err| {
            NoteliftError::OcrError(format!(
                "failed to load detection model from {}: {err}",
                config.detection_model_path.display()
            ))
        })?;
        let recognition_model =
            Model::load_file(&config.recognition_model_path).map_err(|err| {
                NoteliftError::OcrError(format!(
                    "failed to load recognition model from {}: {err}",
                    config.recognition_model_path.display()
                ))
            })?;

        let engine = OcrEngine::new(OcrEngineParams {
            detection_model: Some(detection_model),
            recognition_model: Some(recognition_model),
            ..Default::default()
        })
        .map_err(|err| NoteliftError::OcrError(format!("failed to initialise OCR engine: {err}")))?;

        info!("OCR engine ready");
        Ok(Self { engine })
    }

    /// Load models from the default cache directory.
    pub fn with_defaults() -> Result<Self> {
        Self::new(OcrConfig::default())
    }

    /// Extract text from one page image, with lines separated by newlines.
    fn recognize_inner(&self, image: &DynamicImage) -> Result<String> {
        let rgb = image.to_rgb8();
        let (width, height) = rgb.dimensions();

        let source = ImageSource::from_bytes(rgb.as_raw(), (width, height)).map_err(|err| {
            NoteliftError::OcrError(format!(
                "failed to create image source ({width}x{height}): {err}"
            ))
        })?;
        let input = self
            .engine
            .prepare_input(source)
            .map_err(|err| NoteliftError::OcrError(format!("OCR preprocessing failed: {err}")))?;

        let text = self
            .engine
            .get_text(&input)
            .map_err(|err| NoteliftError::OcrError(format!("OCR recognition failed: {err}")))?;

        debug!(
            line_count = text.lines().count(),
            char_count = text.len(),
            "OCR recognition complete"
        );
        Ok(text)
    }
}

impl PageRecognizer for OcrRecognizer {
    /// Total recognition: any engine failure is logged and yields the
    /// empty string so the batch continues with the remaining pages.
    #[instrument(skip_all, fields(width = image.width(), height = image.height()))]
    fn recognize(&self, image: &DynamicImage) -> String {
        match self.recognize_inner(image) {
            Ok(text) => text,
            Err(err) => {
                warn!(%err, "OCR failed for page, treating as empty");
                String::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_from_dir_uses_well_known_filenames() {
        let config = OcrConfig::from_dir("/tmp/models");
        assert_eq!(
            config.detection_model_path,
            PathBuf::from("/tmp/models/text-detection.rten")
        );
        assert_eq!(
            config.recognition_model_path,
            PathBuf::from("/tmp/models/text-recognition.rten")
        );
    }

    #[test]
    fn validate_rejects_missing_models() {
        let config = OcrConfig::from_dir("/nonexistent/ocr-models");
        assert!(config.validate().is_err());
    }
}
