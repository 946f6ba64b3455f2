// SPDX-License-Identifier: MIT
//
// Page regions and reading-order sorting.

use image::DynamicImage;

/// One rectified page image plus its ordering key.
///
/// Created by either segmentation strategy and never mutated afterwards; the
/// caller owns it through recognition and discards it when done.
#[derive(Debug, Clone)]
pub struct PageRegion {
    /// The rectified page pixels.
    pub image: DynamicImage,
    /// Horizontal centroid of the region in source-image coordinates.
    /// Drives left-to-right reading order.
    pub centroid_x: f32,
}

/// An ordered set of page regions. After the pipeline completes it always
/// holds exactly the configured number of pages, sorted ascending by
/// `centroid_x`.
pub type PageSet = Vec<PageRegion>;

/// Impose left-to-right reading order on detected regions.
///
/// Stable sort: regions with equal centroids keep their detection order.
pub fn order_regions(mut regions: Vec<PageRegion>) -> PageSet {
    regions.sort_by(|a, b| a.centroid_x.total_cmp(&b.centroid_x));
    regions
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, GrayImage, Luma};

    fn region(centroid_x: f32, shade: u8) -> PageRegion {
        PageRegion {
            image: DynamicImage::ImageLuma8(GrayImage::from_pixel(4, 4, Luma([shade]))),
            centroid_x,
        }
    }

    #[test]
    fn sorts_by_centroid_ascending() {
        let ordered = order_regions(vec![region(300.0, 0), region(10.0, 1), region(150.0, 2)]);
        let xs: Vec<f32> = ordered.iter().map(|r| r.centroid_x).collect();
        assert_eq!(xs, vec![10.0, 150.0, 300.0]);
    }

    #[test]
    fn equal_centroids_keep_detection_order() {
        let ordered = order_regions(vec![region(50.0, 1), region(50.0, 2), region(50.0, 3)]);
        let shades: Vec<u8> = ordered
            .iter()
            .map(|r| r.image.to_luma8().get_pixel(0, 0)[0])
            .collect();
        assert_eq!(shades, vec![1, 2, 3]);
    }
}
