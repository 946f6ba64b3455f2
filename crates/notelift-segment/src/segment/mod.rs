// SPDX-License-Identifier: MIT
//
// Page detection pipeline: a boundary-finding primary strategy with a
// density-split fallback, behind a single entry point that always returns
// the expected number of pages.

pub mod density;
pub mod edge;
pub mod rectify;

use image::DynamicImage;
use notelift_core::{NoteliftError, Result, SegmentConfig};
use thiserror::Error;
use tracing::{info, instrument, warn};

use crate::preprocess::normalize;
use crate::region::{PageRegion, PageSet, order_regions};

/// Why a segmentation strategy produced no usable page set. Carried as a
/// value so callers can fall back rather than abort.
#[derive(Debug, Error)]
pub enum DetectionFailure {
    /// No straight-line structure was found at all.
    #[error("no candidate boundary lines detected")]
    NoLines,
    /// Candidate regions survived filtering, but not the right number.
    #[error("found {found} page regions, expected {expected}")]
    WrongCount { found: usize, expected: usize },
}

/// A way of carving a photo into page regions. Strategies are pure over
/// their inputs; failure is a reported value, not a panic.
pub trait SegmentStrategy {
    /// Short name for logs.
    fn name(&self) -> &'static str;

    /// Produce exactly `config.expected_pages` regions, or say why not.
    fn segment(
        &self,
        image: &DynamicImage,
        config: &SegmentConfig,
    ) -> std::result::Result<Vec<PageRegion>, DetectionFailure>;
}

/// Detect and rectify the pages of a notebook photo.
///
/// The image is normalized, handed to the edge/contour detector, and on
/// any detection failure cut by the density splitter instead. The result
/// always holds exactly `config.expected_pages` regions in left-to-right
/// order; only an image with a zero dimension is an error.
#[instrument(skip_all, fields(width = image.width(), height = image.height()))]
pub fn detect_pages(image: &DynamicImage, config: &SegmentConfig) -> Result<PageSet> {
    if image.width() == 0 || image.height() == 0 {
        return Err(NoteliftError::InvalidImage(format!(
            "image has zero dimension ({}x{})",
            image.width(),
            image.height()
        )));
    }

    let normalized = normalize(image, config);

    let detector = edge::EdgeContourDetector;
    let regions = match detector.segment(&normalized, config) {
        Ok(regions) => {
            info!(strategy = detector.name(), pages = regions.len(), "pages detected");
            regions
        }
        Err(failure) => {
            warn!(strategy = detector.name(), %failure, "falling back to density split");
            let regions = density::TextDensitySplitter.split(&normalized, config);
            info!(strategy = "density-split", pages = regions.len(), "pages detected");
            regions
        }
    };

    Ok(order_regions(regions))
}
