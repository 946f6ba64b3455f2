// SPDX-License-Identifier: MIT
//
// Perspective rectification — warps an arbitrarily rotated quadrilateral
// page region to an upright rectangle.

use image::{DynamicImage, Rgb, RgbImage};
use imageproc::geometric_transformations::{Interpolation, Projection, warp_into};

/// A rotated rectangle: center, extents, rotation, and its four corners in
/// canonical top-left / top-right / bottom-right / bottom-left order.
///
/// Derived from a contour's minimum-area rectangle. The canonical corner
/// order is the same for every region of one image, so reading order
/// survives rectification.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RotatedRect {
    /// Center point in source-image coordinates.
    pub center: (f32, f32),
    /// Extent along the top edge (top-left -> top-right).
    pub width: f32,
    /// Extent along the left edge (top-left -> bottom-left).
    pub height: f32,
    /// Rotation of the top edge against the x axis, in radians.
    pub angle: f32,
    corners: [(f32, f32); 4],
}

impl RotatedRect {
    /// Build a rotated rectangle from four corner points in any order.
    pub fn from_corners(points: [(f32, f32); 4]) -> Self {
        let corners = order_corners(points);
        let [tl, tr, br, bl] = corners;

        let width = (distance(tl, tr) + distance(bl, br)) / 2.0;
        let height = (distance(tl, bl) + distance(tr, br)) / 2.0;
        let angle = (tr.1 - tl.1).atan2(tr.0 - tl.0);
        let center = (
            (tl.0 + tr.0 + br.0 + bl.0) / 4.0,
            (tl.1 + tr.1 + br.1 + bl.1) / 4.0,
        );

        Self {
            center,
            width,
            height,
            angle,
            corners,
        }
    }

    /// Corner points in canonical order.
    pub fn corners(&self) -> [(f32, f32); 4] {
        self.corners
    }

    /// Enclosed area.
    pub fn area(&self) -> f32 {
        self.width * self.height
    }

    /// Aspect ratio normalized to `>= 1`: max(w, h) / min(w, h).
    ///
    /// Returns infinity for a degenerate (zero-extent) rectangle so that any
    /// finite aspect filter rejects it.
    pub fn normalized_aspect(&self) -> f32 {
        let long = self.width.max(self.height);
        let short = self.width.min(self.height);
        if short <= f32::EPSILON {
            f32::INFINITY
        } else {
            long / short
        }
    }

    /// Grow the rectangle by `margin` pixels on every side, keeping center
    /// and rotation. Used to add breathing room around a detected page
    /// boundary before cropping.
    pub fn expanded(&self, margin: f32) -> Self {
        let width = self.width + 2.0 * margin;
        let height = self.height + 2.0 * margin;

        let (sin, cos) = self.angle.sin_cos();
        let half_w = width / 2.0;
        let half_h = height / 2.0;
        // Unit vectors along the top and left edges.
        let u = (cos, sin);
        let v = (-sin, cos);
        let (cx, cy) = self.center;

        let corner = |sw: f32, sh: f32| -> (f32, f32) {
            (
                cx + sw * half_w * u.0 + sh * half_h * v.0,
                cy + sw * half_w * u.1 + sh * half_h * v.1,
            )
        };

        Self {
            center: self.center,
            width,
            height,
            angle: self.angle,
            corners: [
                corner(-1.0, -1.0),
                corner(1.0, -1.0),
                corner(1.0, 1.0),
                corner(-1.0, 1.0),
            ],
        }
    }
}

/// Order four corner points canonically: top-left, top-right, bottom-right,
/// bottom-left.
///
/// Top-left minimises x + y and bottom-right maximises it; top-right
/// maximises x - y and bottom-left minimises it. This holds for rectangles
/// rotated less than 45 degrees, which covers photographed notebook pages.
fn order_corners(points: [(f32, f32); 4]) -> [(f32, f32); 4] {
    let by_sum = |p: &(f32, f32)| p.0 + p.1;
    let by_diff = |p: &(f32, f32)| p.0 - p.1;

    let tl = points
        .iter()
        .copied()
        .min_by(|a, b| by_sum(a).total_cmp(&by_sum(b)))
        .unwrap_or(points[0]);
    let br = points
        .iter()
        .copied()
        .max_by(|a, b| by_sum(a).total_cmp(&by_sum(b)))
        .unwrap_or(points[0]);
    let tr = points
        .iter()
        .copied()
        .max_by(|a, b| by_diff(a).total_cmp(&by_diff(b)))
        .unwrap_or(points[0]);
    let bl = points
        .iter()
        .copied()
        .min_by(|a, b| by_diff(a).total_cmp(&by_diff(b)))
        .unwrap_or(points[0]);

    [tl, tr, br, bl]
}

fn distance(a: (f32, f32), b: (f32, f32)) -> f32 {
    ((a.0 - b.0).powi(2) + (a.1 - b.1).powi(2)).sqrt()
}

/// Warp the quadrilateral described by `rect` to an upright rectangle.
///
/// Pure function of its inputs. The output buffer dimensions are the
/// rectangle's (width, height) rounded to integer pixels, so a portrait
/// rectangle yields a portrait page and a landscape one a landscape page.
///
/// Returns `None` for a degenerate rectangle (zero-sized target) or a
/// non-invertible corner correspondence; callers exclude such candidates
/// rather than failing the detection pass.
pub fn rectify(image: &DynamicImage, rect: &RotatedRect) -> Option<DynamicImage> {
    let out_w = rect.width.round() as i64;
    let out_h = rect.height.round() as i64;
    if out_w < 1 || out_h < 1 {
        return None;
    }
    let (out_w, out_h) = (out_w as u32, out_h as u32);

    let [tl, tr, br, bl] = rect.corners();
    let src = [tl, tr, br, bl];
    let dst = [
        (0.0, 0.0),
        (out_w as f32, 0.0),
        (out_w as f32, out_h as f32),
        (0.0, out_h as f32),
    ];

    let projection = Projection::from_control_points(src, dst)?;

    let input = image.to_rgb8();
    let mut output = RgbImage::new(out_w, out_h);
    warp_into(
        &input,
        &projection,
        Interpolation::Bilinear,
        Rgb([255u8, 255, 255]),
        &mut output,
    );

    Some(DynamicImage::ImageRgb8(output))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, Rgb, RgbImage};

    #[test]
    fn orders_axis_aligned_corners() {
        let rect = RotatedRect::from_corners([
            (100.0, 50.0),
            (10.0, 50.0),
            (10.0, 20.0),
            (100.0, 20.0),
        ]);
        let [tl, tr, br, bl] = rect.corners();
        assert_eq!(tl, (10.0, 20.0));
        assert_eq!(tr, (100.0, 20.0));
        assert_eq!(br, (100.0, 50.0));
        assert_eq!(bl, (10.0, 50.0));
        assert!((rect.width - 90.0).abs() < 1e-3);
        assert!((rect.height - 30.0).abs() < 1e-3);
    }

    #[test]
    fn normalized_aspect_is_at_least_one() {
        let portrait =
            RotatedRect::from_corners([(0.0, 0.0), (70.0, 0.0), (70.0, 100.0), (0.0, 100.0)]);
        let landscape =
            RotatedRect::from_corners([(0.0, 0.0), (100.0, 0.0), (100.0, 70.0), (0.0, 70.0)]);
        assert!((portrait.normalized_aspect() - 100.0 / 70.0).abs() < 1e-3);
        assert!((landscape.normalized_aspect() - 100.0 / 70.0).abs() < 1e-3);
    }

    #[test]
    fn degenerate_rect_has_infinite_aspect() {
        let line = RotatedRect::from_corners([(0.0, 0.0), (50.0, 0.0), (50.0, 0.0), (0.0, 0.0)]);
        assert!(line.normalized_aspect().is_infinite());
    }

    #[test]
    fn expansion_grows_extents_and_keeps_center() {
        let rect =
            RotatedRect::from_corners([(10.0, 10.0), (110.0, 10.0), (110.0, 60.0), (10.0, 60.0)]);
        let grown = rect.expanded(5.0);
        assert!((grown.width - 110.0).abs() < 1e-3);
        assert!((grown.height - 60.0).abs() < 1e-3);
        assert_eq!(grown.center, rect.center);
        let [tl, ..] = grown.corners();
        assert!((tl.0 - 5.0).abs() < 1e-3);
        assert!((tl.1 - 5.0).abs() < 1e-3);
    }

    #[test]
    fn rectified_dimensions_match_rounded_extents() {
        let image = DynamicImage::ImageRgb8(RgbImage::from_pixel(300, 300, Rgb([200, 200, 200])));

        // A rectangle rotated by ~20 degrees around (150, 150).
        let (sin, cos) = 20f32.to_radians().sin_cos();
        let rotate = |x: f32, y: f32| -> (f32, f32) {
            (
                150.0 + x * cos - y * sin,
                150.0 + x * sin + y * cos,
            )
        };
        let rect = RotatedRect::from_corners([
            rotate(-60.3, -40.2),
            rotate(60.3, -40.2),
            rotate(60.3, 40.2),
            rotate(-60.3, 40.2),
        ]);

        let page = rectify(&image, &rect).expect("projection should exist");
        assert_eq!(page.width(), rect.width.round() as u32);
        assert_eq!(page.height(), rect.height.round() as u32);
    }

    #[test]
    fn degenerate_rect_is_rejected() {
        let image = DynamicImage::ImageRgb8(RgbImage::from_pixel(50, 50, Rgb([0, 0, 0])));
        let rect = RotatedRect::from_corners([
            (10.0, 10.0),
            (40.0, 10.0),
            (40.0, 10.0),
            (10.0, 10.0),
        ]);
        assert!(rectify(&image, &rect).is_none());
    }

    #[test]
    fn rectification_recovers_rotated_content() {
        // Dark page on white background, rotated; after rectification the
        // page interior must be dark at the output center.
        let mut img = RgbImage::from_pixel(300, 300, Rgb([255, 255, 255]));
        let (sin, cos) = 15f32.to_radians().sin_cos();
        for y in 0..300 {
            for x in 0..300 {
                // Inverse-rotate into page space.
                let dx = x as f32 - 150.0;
                let dy = y as f32 - 150.0;
                let px = dx * cos + dy * sin;
                let py = -dx * sin + dy * cos;
                if px.abs() < 50.0 && py.abs() < 70.0 {
                    img.put_pixel(x, y, Rgb([40, 40, 40]));
                }
            }
        }
        let image = DynamicImage::ImageRgb8(img);

        let rotate = |x: f32, y: f32| -> (f32, f32) {
            (150.0 + x * cos - y * sin, 150.0 + x * sin + y * cos)
        };
        let rect = RotatedRect::from_corners([
            rotate(-50.0, -70.0),
            rotate(50.0, -70.0),
            rotate(50.0, 70.0),
            rotate(-50.0, 70.0),
        ]);

        let page = rectify(&image, &rect).expect("projection should exist");
        assert_eq!((page.width(), page.height()), (100, 140));
        let center = page.to_rgb8().get_pixel(50, 70)[0];
        assert!(center < 100, "page interior should be dark, got {center}");
    }
}
