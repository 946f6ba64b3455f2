// SPDX-License-Identifier: MIT
//
// Configuration for the segmentation core and the batch application.
//
// All configuration is explicit: a `SegmentConfig` value is passed into every
// call of the segmentation core, and the application loads an `AppConfig` once
// at startup. There is no process-global mutable state.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{NoteliftError, Result};
use crate::types::OutputFormat;

/// Tuning parameters for the page segmentation and rectification core.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SegmentConfig {
    /// Number of pages expected per source photo.
    ///
    /// The pipeline guarantees exactly this many page images on every return
    /// path, including the density-split fallback.
    pub expected_pages: usize,
    /// Minimum candidate area as a fraction of the source image area.
    pub min_area_ratio: f32,
    /// Minimum normalized aspect ratio, computed as max(w, h) / min(w, h).
    pub min_aspect: f32,
    /// Maximum normalized aspect ratio.
    pub max_aspect: f32,
    /// Margin in pixels added around a detected box before cropping.
    pub page_margin: u32,
    /// Images whose smaller side is below this are upscaled isotropically
    /// during preprocessing so the smaller side equals this value.
    pub min_dimension: u32,
}

impl Default for SegmentConfig {
    fn default() -> Self {
        Self {
            expected_pages: 3,
            min_area_ratio: 0.15,
            min_aspect: 0.3,
            max_aspect: 2.0,
            page_margin: 10,
            min_dimension: 1000,
        }
    }
}

/// Application settings for the batch digitizer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Directory scanned for source photos.
    pub input_dir: PathBuf,
    /// Directory where output documents are written.
    pub output_dir: PathBuf,
    /// File extensions (lower-case, without dot) treated as source photos.
    pub image_extensions: Vec<String>,
    /// Maximum number of files processed concurrently.
    pub max_workers: usize,
    /// Base name of the output documents (extension added per format).
    pub output_stem: String,
    /// Output formats to write.
    pub formats: Vec<OutputFormat>,
    /// Segmentation tuning, embedded so one file configures the whole run.
    #[serde(default)]
    pub segment: SegmentConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            input_dir: PathBuf::from("input"),
            output_dir: PathBuf::from("output"),
            image_extensions: vec!["jpg".into(), "jpeg".into(), "png".into()],
            max_workers: 4,
            output_stem: "notes".into(),
            formats: vec![OutputFormat::Markdown],
            segment: SegmentConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        let config: Self = serde_json::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from `path` if given, otherwise fall back to defaults.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(p) => Self::load(p),
            None => Ok(Self::default()),
        }
    }

    /// Reject configurations that cannot produce a meaningful run.
    pub fn validate(&self) -> Result<()> {
        if self.segment.expected_pages == 0 {
            return Err(NoteliftError::Config(
                "expected_pages must be at least 1".into(),
            ));
        }
        if self.max_workers == 0 {
            return Err(NoteliftError::Config("max_workers must be at least 1".into()));
        }
        if !(self.segment.min_area_ratio > 0.0 && self.segment.min_area_ratio < 1.0) {
            return Err(NoteliftError::Config(
                "min_area_ratio must be in (0, 1)".into(),
            ));
        }
        if self.segment.min_aspect > self.segment.max_aspect {
            return Err(NoteliftError::Config(
                "min_aspect must not exceed max_aspect".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.segment.expected_pages, 3);
    }

    #[test]
    fn zero_expected_pages_rejected() {
        let mut config = AppConfig::default();
        config.segment.expected_pages = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn inverted_aspect_bounds_rejected() {
        let mut config = AppConfig::default();
        config.segment.min_aspect = 3.0;
        config.segment.max_aspect = 1.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn roundtrips_through_json() {
        let config = AppConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let back: AppConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back.segment.min_dimension, config.segment.min_dimension);
        assert_eq!(back.formats, config.formats);
    }
}
