// SPDX-License-Identifier: MIT
//
// Primary segmentation strategy — edge, line, and contour analysis.
//
// Page boundaries in a notebook photo are long straight edges. The detector
// builds an edge map, keeps only the straight-line structure via the Hough
// transform, closes it morphologically, and reads page candidates off the
// external contours of the resulting line mask.

use image::{DynamicImage, GrayImage, Luma};
use imageproc::contours::{BorderType, find_contours};
use imageproc::distance_transform::Norm;
use imageproc::edges::canny;
use imageproc::filter::gaussian_blur_f32;
use imageproc::geometry::min_area_rect;
use imageproc::hough::{LineDetectionOptions, PolarLine, detect_lines};
use imageproc::morphology::{dilate, erode};
use notelift_core::SegmentConfig;
use tracing::{debug, instrument};

use crate::region::PageRegion;
use crate::segment::rectify::{RotatedRect, rectify};
use crate::segment::{DetectionFailure, SegmentStrategy};

/// Gaussian blur sigma applied before edge extraction.
const BLUR_SIGMA: f32 = 2.0;

/// Canny hysteresis thresholds.
const CANNY_LOW: f32 = 50.0;
const CANNY_HIGH: f32 = 150.0;

/// Radius within which an edge pixel counts as support for a Hough line.
const LINE_SUPPORT_RADIUS: i64 = 2;

/// Structuring element sizes for closing the line mask. Dilation exceeds
/// erosion so true boundaries thicken while speckle washes out.
const DILATE_K: u8 = 2;
const ERODE_K: u8 = 1;

/// Edge/contour page detector. Stateless; safe to share across threads.
pub struct EdgeContourDetector;

impl SegmentStrategy for EdgeContourDetector {
    fn name(&self) -> &'static str {
        "edge-contour"
    }

    #[instrument(skip_all, fields(width = image.width(), height = image.height()))]
    fn segment(
        &self,
        image: &DynamicImage,
        config: &SegmentConfig,
    ) -> Result<Vec<PageRegion>, DetectionFailure> {
        let (width, height) = (image.width(), image.height());

        // 1. Grayscale, global equalization, blur.
        let gray = image.to_luma8();
        let equalized = imageproc::contrast::equalize_histogram(&gray);
        let blurred = gaussian_blur_f32(&equalized, BLUR_SIGMA);

        // 2. Edge map.
        let edges = canny(&blurred, CANNY_LOW, CANNY_HIGH);

        // 3. Straight-line structure. The vote threshold scales with the
        // smaller image side so shorter page edges still register.
        let vote_threshold = ((width.min(height) as f32 * 0.3) as u32).max(40);
        let lines = detect_lines(
            &edges,
            LineDetectionOptions {
                vote_threshold,
                suppression_radius: 8,
            },
        );
        debug!(line_count = lines.len(), vote_threshold, "Hough lines detected");
        if lines.is_empty() {
            return Err(DetectionFailure::NoLines);
        }

        // Rasterize only the supported portions of each line: the infinite
        // polar lines become finite segments wherever the edge map backs
        // them up.
        let mask = line_support_mask(&edges, &lines);

        // 4. Close gaps, drop speckle.
        let closed = erode(&dilate(&mask, Norm::LInf, DILATE_K), Norm::LInf, ERODE_K);

        // 5–6. External contours, filtered by area and aspect.
        let contours = find_contours::<i32>(&closed);
        let image_area = (width * height) as f32;
        let min_area = config.min_area_ratio * image_area;

        let mut regions = Vec::new();
        for contour in contours {
            if contour.border_type != BorderType::Outer || contour.points.len() < 4 {
                continue;
            }

            let corners = min_area_rect(&contour.points);
            let rect = RotatedRect::from_corners([
                (corners[0].x as f32, corners[0].y as f32),
                (corners[1].x as f32, corners[1].y as f32),
                (corners[2].x as f32, corners[2].y as f32),
                (corners[3].x as f32, corners[3].y as f32),
            ]);

            if rect.area() < min_area {
                continue;
            }
            let aspect = rect.normalized_aspect();
            if aspect < config.min_aspect || aspect > config.max_aspect {
                continue;
            }

            // 7. Rectify; skip degenerate candidates without failing the pass.
            let boxed = rect.expanded(config.page_margin as f32);
            match rectify(image, &boxed) {
                Some(page) => {
                    // 8. Sort key: centroid x in source coordinates.
                    regions.push(PageRegion {
                        image: page,
                        centroid_x: rect.center.0,
                    });
                }
                None => {
                    debug!(?rect.center, "degenerate candidate excluded");
                }
            }
        }

        // Strict equality — any other count is a detection failure and the
        // fallback strategy takes over.
        if regions.len() == config.expected_pages {
            Ok(regions)
        } else {
            Err(DetectionFailure::WrongCount {
                found: regions.len(),
                expected: config.expected_pages,
            })
        }
    }
}

/// Draw the portions of each polar line that run along actual edges.
///
/// Walks each line in one-pixel steps across the image and marks a mask
/// pixel wherever the Canny edge map has a set pixel within
/// `LINE_SUPPORT_RADIUS`.
fn line_support_mask(edges: &GrayImage, lines: &[PolarLine]) -> GrayImage {
    let (width, height) = edges.dimensions();
    let mut mask = GrayImage::new(width, height);
    let diagonal = ((width * width + height * height) as f32).sqrt();

    for line in lines {
        let theta = (line.angle_in_degrees as f32).to_radians();
        let (sin, cos) = theta.sin_cos();
        // Closest point to the origin; the line runs perpendicular to
        // (cos, sin).
        let base = (line.r * cos, line.r * sin);

        let mut t = -diagonal;
        while t <= diagonal {
            let x = (base.0 - t * sin).round() as i64;
            let y = (base.1 + t * cos).round() as i64;
            t += 1.0;

            if x < 0 || y < 0 || x >= width as i64 || y >= height as i64 {
                continue;
            }
            if has_edge_support(edges, x, y) {
                mask.put_pixel(x as u32, y as u32, Luma([255u8]));
            }
        }
    }

    mask
}

/// True if any edge pixel lies within `LINE_SUPPORT_RADIUS` of (x, y).
fn has_edge_support(edges: &GrayImage, x: i64, y: i64) -> bool {
    let (width, height) = edges.dimensions();
    for dy in -LINE_SUPPORT_RADIUS..=LINE_SUPPORT_RADIUS {
        for dx in -LINE_SUPPORT_RADIUS..=LINE_SUPPORT_RADIUS {
            let nx = x + dx;
            let ny = y + dy;
            if nx < 0 || ny < 0 || nx >= width as i64 || ny >= height as i64 {
                continue;
            }
            if edges.get_pixel(nx as u32, ny as u32)[0] > 0 {
                return true;
            }
        }
    }
    false
}
