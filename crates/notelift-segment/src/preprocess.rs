// SPDX-License-Identifier: MIT
//
// Image preprocessing — size normalization and local contrast enhancement.
//
// Used twice per source photo: once before segmentation, and once per
// detected page before recognition. The contract is total: whatever happens
// internally, the caller always gets a usable image back.

use image::{DynamicImage, Rgb, RgbImage};
use notelift_core::SegmentConfig;
use tracing::{debug, instrument};

/// Tile grid used for adaptive histogram equalization (8x8 tiles).
const CLAHE_GRID: u32 = 8;

/// Histogram clip factor relative to a uniform bin fill.
const CLAHE_CLIP_FACTOR: f32 = 3.0;

/// Normalize an image for detection or recognition.
///
/// Steps, in order:
/// 1. convert to canonical RGB8;
/// 2. if the smaller side is below `config.min_dimension`, upscale
///    isotropically with Lanczos3 so the smaller side equals it;
/// 3. adaptive histogram equalization applied to the luminance channel only,
///    with colour recomposed by per-pixel luminance rescaling.
///
/// Resizing happens before enhancement so the equalization tiles operate at
/// the target resolution.
///
/// Never fails: degenerate inputs are returned unchanged rather than
/// aborting the pipeline.
#[instrument(skip(image), fields(width = image.width(), height = image.height()))]
pub fn normalize(image: &DynamicImage, config: &SegmentConfig) -> DynamicImage {
    let (width, height) = (image.width(), image.height());
    if width == 0 || height == 0 {
        return image.clone();
    }

    let mut rgb = image.to_rgb8();

    let min_side = width.min(height);
    if min_side < config.min_dimension {
        let scale = config.min_dimension as f32 / min_side as f32;
        let new_w = ((width as f32 * scale).round() as u32).max(1);
        let new_h = ((height as f32 * scale).round() as u32).max(1);
        debug!(new_w, new_h, "upscaling below-minimum image");
        rgb = image::imageops::resize(&rgb, new_w, new_h, image::imageops::FilterType::Lanczos3);
    }

    let enhanced = equalize_luminance_adaptive(&rgb, CLAHE_GRID, CLAHE_CLIP_FACTOR);
    DynamicImage::ImageRgb8(enhanced)
}

/// Contrast-limited adaptive histogram equalization on the luminance channel.
///
/// The image is divided into a `grid` x `grid` tile mesh. Each tile gets a
/// clipped, equalized luminance lookup table; per-pixel output is the
/// bilinear blend of the four surrounding tile tables, which avoids visible
/// tile seams. Colour is recomposed by scaling each RGB channel by the ratio
/// of new to old luminance.
fn equalize_luminance_adaptive(rgb: &RgbImage, grid: u32, clip_factor: f32) -> RgbImage {
    let (width, height) = rgb.dimensions();

    // Tile dimensions, rounded up so the mesh covers the whole image.
    let tile_w = width.div_ceil(grid).max(1);
    let tile_h = height.div_ceil(grid).max(1);
    let tiles_x = width.div_ceil(tile_w);
    let tiles_y = height.div_ceil(tile_h);

    let luma: Vec<u8> = rgb.pixels().map(|p| luminance(p)).collect();

    // One equalization LUT per tile.
    let mut luts: Vec<[u8; 256]> = Vec::with_capacity((tiles_x * tiles_y) as usize);
    for ty in 0..tiles_y {
        for tx in 0..tiles_x {
            let x0 = tx * tile_w;
            let y0 = ty * tile_h;
            let x1 = (x0 + tile_w).min(width);
            let y1 = (y0 + tile_h).min(height);
            luts.push(tile_lut(&luma, width, x0, y0, x1, y1, clip_factor));
        }
    }

    let lut_at = |tx: u32, ty: u32| -> &[u8; 256] {
        let tx = tx.min(tiles_x - 1);
        let ty = ty.min(tiles_y - 1);
        &luts[(ty * tiles_x + tx) as usize]
    };

    let mut out = RgbImage::new(width, height);
    for y in 0..height {
        for x in 0..width {
            let old_l = luma[(y * width + x) as usize];

            // Position relative to tile centres, for bilinear LUT blending.
            let fx = (x as f32 - tile_w as f32 / 2.0) / tile_w as f32;
            let fy = (y as f32 - tile_h as f32 / 2.0) / tile_h as f32;
            let tx0 = fx.floor().max(0.0) as u32;
            let ty0 = fy.floor().max(0.0) as u32;
            let wx = (fx - fx.floor()).clamp(0.0, 1.0);
            let wy = (fy - fy.floor()).clamp(0.0, 1.0);
            // Pixels left/above the first tile centre use weight 0 toward the
            // (clamped) neighbour, so the border tiles dominate there.
            let wx = if fx < 0.0 { 0.0 } else { wx };
            let wy = if fy < 0.0 { 0.0 } else { wy };

            let l00 = lut_at(tx0, ty0)[old_l as usize] as f32;
            let l10 = lut_at(tx0 + 1, ty0)[old_l as usize] as f32;
            let l01 = lut_at(tx0, ty0 + 1)[old_l as usize] as f32;
            let l11 = lut_at(tx0 + 1, ty0 + 1)[old_l as usize] as f32;

            let top = l00 * (1.0 - wx) + l10 * wx;
            let bottom = l01 * (1.0 - wx) + l11 * wx;
            let new_l = top * (1.0 - wy) + bottom * wy;

            // Recompose colour: scale channels by the luminance ratio.
            let ratio = (new_l + 1.0) / (old_l as f32 + 1.0);
            let src = rgb.get_pixel(x, y);
            let scale = |c: u8| -> u8 { (c as f32 * ratio).clamp(0.0, 255.0) as u8 };
            out.put_pixel(x, y, Rgb([scale(src[0]), scale(src[1]), scale(src[2])]));
        }
    }

    out
}

/// Build the clipped, equalized lookup table for one tile.
fn tile_lut(
    luma: &[u8],
    width: u32,
    x0: u32,
    y0: u32,
    x1: u32,
    y1: u32,
    clip_factor: f32,
) -> [u8; 256] {
    let mut histogram = [0u32; 256];
    for y in y0..y1 {
        for x in x0..x1 {
            histogram[luma[(y * width + x) as usize] as usize] += 1;
        }
    }

    let pixel_count = ((x1 - x0) * (y1 - y0)).max(1);

    // Clip the histogram and redistribute the excess uniformly.
    let clip_limit = ((clip_factor * pixel_count as f32 / 256.0).ceil() as u32).max(1);
    let mut excess: u32 = 0;
    for bin in histogram.iter_mut() {
        if *bin > clip_limit {
            excess += *bin - clip_limit;
            *bin = clip_limit;
        }
    }
    let bonus = excess / 256;
    for bin in histogram.iter_mut() {
        *bin += bonus;
    }

    // Cumulative distribution -> lookup table.
    let total: u32 = histogram.iter().sum();
    let mut lut = [0u8; 256];
    let mut cumulative: u32 = 0;
    for (value, bin) in histogram.iter().enumerate() {
        cumulative += *bin;
        lut[value] = ((cumulative as f32 / total as f32) * 255.0).round() as u8;
    }
    lut
}

/// Rec. 601 luminance of an RGB pixel.
fn luminance(p: &Rgb<u8>) -> u8 {
    let l = 0.299 * p[0] as f32 + 0.587 * p[1] as f32 + 0.114 * p[2] as f32;
    l.round().clamp(0.0, 255.0) as u8
}
