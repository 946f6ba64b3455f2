// SPDX-License-Identifier: MIT
//
// Fallback segmentation — vertical splits guided by ink density.
//
// When boundary detection fails, the photo still holds the expected number
// of pages side by side. This splitter binarizes the ink, projects it onto
// the x axis, and cuts at the valleys of the smoothed density profile; if
// the profile does not yield enough valleys it cuts into equal-width
// strips. It always produces exactly the expected number of regions.

use image::{DynamicImage, GrayImage};
use notelift_core::SegmentConfig;
use tracing::{debug, instrument};

use crate::region::PageRegion;

/// Window for local-mean thresholding, in pixels each side of the center.
const BLOCK_RADIUS: u32 = 15;

/// Offset below the local mean a pixel must fall to count as ink.
const MEAN_OFFSET: f64 = 10.0;

/// Density splitter. Total over all inputs with positive dimensions.
pub struct TextDensitySplitter;

impl TextDensitySplitter {
    /// Split `image` into exactly `config.expected_pages` vertical strips.
    ///
    /// Unlike the boundary detector this cannot fail: a profile without
    /// usable valleys degrades to equal-width strips.
    #[instrument(skip_all, fields(width = image.width(), height = image.height()))]
    pub fn split(&self, image: &DynamicImage, config: &SegmentConfig) -> Vec<PageRegion> {
        let width = image.width();
        let pages = config.expected_pages;

        let ink = binarize_ink(&image.to_luma8());
        let profile = moving_average(&column_density(&ink), (width / 20).max(1) as usize);
        let valleys = find_valleys(&profile, (width / 20).max(1) as usize);
        debug!(valley_count = valleys.len(), pages, "density profile analyzed");

        let cuts = if valleys.len() == pages.saturating_sub(1) {
            valleys
        } else {
            equal_cuts(width, pages)
        };

        crop_at(image, &cuts)
    }
}

/// Binarize with a local mean threshold: a pixel is ink when it falls more
/// than `MEAN_OFFSET` below the average of its neighborhood. The mean is
/// read off an integral image so the cost is independent of the radius.
fn binarize_ink(gray: &GrayImage) -> GrayImage {
    let (width, height) = gray.dimensions();
    let mut out = GrayImage::new(width, height);
    if width == 0 || height == 0 {
        return out;
    }

    // (width+1) x (height+1) summed-area table.
    let w1 = (width + 1) as usize;
    let mut integral = vec![0u64; w1 * (height + 1) as usize];
    for y in 0..height as usize {
        let mut row_sum = 0u64;
        for x in 0..width as usize {
            row_sum += gray.get_pixel(x as u32, y as u32)[0] as u64;
            integral[(y + 1) * w1 + x + 1] = integral[y * w1 + x + 1] + row_sum;
        }
    }

    for y in 0..height as usize {
        for x in 0..width as usize {
            let x0 = x.saturating_sub(BLOCK_RADIUS as usize);
            let y0 = y.saturating_sub(BLOCK_RADIUS as usize);
            let x1 = (x + BLOCK_RADIUS as usize + 1).min(width as usize);
            let y1 = (y + BLOCK_RADIUS as usize + 1).min(height as usize);
            let count = ((x1 - x0) * (y1 - y0)) as f64;

            let sum = integral[y1 * w1 + x1] + integral[y0 * w1 + x0]
                - integral[y0 * w1 + x1]
                - integral[y1 * w1 + x0];
            let mean = sum as f64 / count;

            let value = gray.get_pixel(x as u32, y as u32)[0] as f64;
            if value < mean - MEAN_OFFSET {
                out.put_pixel(x as u32, y as u32, image::Luma([255u8]));
            }
        }
    }
    out
}

/// Fraction of ink pixels per column.
fn column_density(ink: &GrayImage) -> Vec<f32> {
    let (width, height) = ink.dimensions();
    if height == 0 {
        return vec![0.0; width as usize];
    }
    (0..width)
        .map(|x| {
            let set = (0..height).filter(|&y| ink.get_pixel(x, y)[0] > 0).count();
            set as f32 / height as f32
        })
        .collect()
}

/// Centered moving average with edge clamping.
fn moving_average(values: &[f32], window: usize) -> Vec<f32> {
    let half = window / 2;
    (0..values.len())
        .map(|i| {
            let lo = i.saturating_sub(half);
            let hi = (i + half + 1).min(values.len());
            values[lo..hi].iter().sum::<f32>() / (hi - lo) as f32
        })
        .collect()
}

/// Local minima of `profile` below its mean, with near-duplicates within
/// `min_gap` suppressed in favor of the deeper valley. Returned sorted.
fn find_valleys(profile: &[f32], min_gap: usize) -> Vec<u32> {
    if profile.len() < 3 {
        return Vec::new();
    }
    let mean = profile.iter().sum::<f32>() / profile.len() as f32;

    let mut candidates: Vec<usize> = Vec::new();
    for i in 1..profile.len() - 1 {
        if profile[i] < profile[i - 1] && profile[i] <= profile[i + 1] && profile[i] < mean {
            candidates.push(i);
        }
    }

    // Suppress clusters: within min_gap of a kept valley, keep the deeper.
    let mut kept: Vec<usize> = Vec::new();
    for &c in &candidates {
        match kept.last().copied() {
            Some(last) if c - last < min_gap => {
                if profile[c] < profile[last] {
                    let end = kept.len() - 1;
                    kept[end] = c;
                }
            }
            _ => kept.push(c),
        }
    }
    kept.into_iter().map(|i| i as u32).collect()
}

/// Cut positions for `pages` equal-width strips, placed proportionally so
/// the strips cover the full width exactly; the integer remainder spreads
/// over the later strips. Monotone for any width, including widths below
/// the page count.
fn equal_cuts(width: u32, pages: usize) -> Vec<u32> {
    let pages = pages.max(1) as u64;
    (1..pages)
        .map(|i| (i * width as u64 / pages) as u32)
        .collect()
}

/// Crop vertical strips delimited by `cuts`, left to right. One strip per
/// bound pair, even when a pair is degenerate: the region count must match
/// the cut count regardless of the image width.
fn crop_at(image: &DynamicImage, cuts: &[u32]) -> Vec<PageRegion> {
    let (width, height) = (image.width(), image.height());
    let mut bounds = Vec::with_capacity(cuts.len() + 2);
    bounds.push(0);
    bounds.extend_from_slice(cuts);
    bounds.push(width);

    bounds
        .windows(2)
        .map(|pair| {
            let (x0, x1) = (pair[0], pair[1]);
            PageRegion {
                image: image.crop_imm(x0, 0, x1 - x0, height),
                centroid_x: (x0 + x1) as f32 / 2.0,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, Luma, Rgb, RgbImage};

    fn config(pages: usize) -> SegmentConfig {
        SegmentConfig {
            expected_pages: pages,
            ..SegmentConfig::default()
        }
    }

    /// A blank image carries no ink, so the split is equal-width and the
    /// strip widths sum back to the original width.
    #[test]
    fn blank_image_splits_equally() {
        let image = DynamicImage::ImageLuma8(GrayImage::from_pixel(661, 100, Luma([255u8])));
        let regions = TextDensitySplitter.split(&image, &config(3));

        assert_eq!(regions.len(), 3);
        let widths: Vec<u32> = regions.iter().map(|r| r.image.width()).collect();
        assert_eq!(widths, vec![220, 220, 221]);
        assert_eq!(widths.iter().sum::<u32>(), 661);
    }

    /// Ink concentrated in three bands separated by clean gutters yields
    /// cuts inside the gutters, not at the equal-width positions.
    #[test]
    fn ink_valleys_guide_the_cuts() {
        let mut canvas = RgbImage::from_pixel(600, 200, Rgb([255u8, 255, 255]));
        // Three text bands with dark strokes, gutters at 180..220 and 380..420.
        for &(x0, x1) in &[(20u32, 180u32), (220, 380), (420, 600)] {
            for y in (20..180).step_by(8) {
                for x in x0..x1 {
                    canvas.put_pixel(x, y, Rgb([0u8, 0, 0]));
                }
            }
        }
        let image = DynamicImage::ImageRgb8(canvas);
        let regions = TextDensitySplitter.split(&image, &config(3));

        assert_eq!(regions.len(), 3);
        let w0 = regions[0].image.width();
        let w1 = w0 + regions[1].image.width();
        assert!((170..=230).contains(&w0), "first cut at {w0}");
        assert!((370..=430).contains(&w1), "second cut at {w1}");
    }

    /// The splitter is total: any positive page count produces that many
    /// regions covering the full width.
    #[test]
    fn always_produces_expected_count() {
        let image = DynamicImage::ImageLuma8(GrayImage::from_pixel(50, 40, Luma([200u8])));
        for pages in 1..=5 {
            let regions = TextDensitySplitter.split(&image, &config(pages));
            assert_eq!(regions.len(), pages);
            let total: u32 = regions.iter().map(|r| r.image.width()).sum();
            assert_eq!(total, 50);
        }
    }

    /// An image narrower than the page count still yields exactly the
    /// expected number of regions; the surplus strips are zero-width.
    #[test]
    fn narrow_image_still_yields_expected_count() {
        let image = DynamicImage::ImageLuma8(GrayImage::from_pixel(2, 10, Luma([128u8])));
        let regions = TextDensitySplitter.split(&image, &config(3));

        assert_eq!(regions.len(), 3);
        let widths: Vec<u32> = regions.iter().map(|r| r.image.width()).collect();
        assert_eq!(widths.iter().sum::<u32>(), 2);
    }

    #[test]
    fn binarize_marks_dark_on_light() {
        let mut canvas = GrayImage::from_pixel(64, 64, Luma([220u8]));
        canvas.put_pixel(32, 32, Luma([10u8]));
        let ink = binarize_ink(&canvas);
        assert!(ink.get_pixel(32, 32)[0] > 0);
        assert_eq!(ink.get_pixel(5, 5)[0], 0);
    }

    #[test]
    fn moving_average_smooths_a_spike() {
        let values = vec![0.0, 0.0, 1.0, 0.0, 0.0];
        let smoothed = moving_average(&values, 3);
        assert!(smoothed[2] < 1.0);
        assert!(smoothed[1] > 0.0 && smoothed[3] > 0.0);
    }

    #[test]
    fn close_valleys_keep_the_deeper() {
        // Mean ~0.47; minima at 2 (0.1) and 4 (0.05), two apart.
        let profile = vec![0.9, 0.5, 0.1, 0.2, 0.05, 0.5, 0.9];
        let valleys = find_valleys(&profile, 5);
        assert_eq!(valleys, vec![4]);
    }
}
