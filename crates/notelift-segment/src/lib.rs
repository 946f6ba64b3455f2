// SPDX-License-Identifier: MIT
//
// notelift-segment — page segmentation and rectification for the Notelift
// notebook digitizer.
//
// A composite photo of several notebook pages goes in; exactly
// `expected_pages` rectified, left-to-right ordered page images come out.
// Detection runs in two stages: an edge/contour strategy that finds page
// boundaries geometrically and warps them upright, and a total ink-density
// fallback that splits the photo on column-density valleys (or into equal
// strips) whenever the primary strategy does not produce the expected count.
//
// The whole crate is synchronous, CPU-bound, and free of shared mutable
// state; callers may invoke it concurrently on different images.

pub mod preprocess;
pub mod region;
pub mod segment;

pub use preprocess::normalize;
pub use region::{PageRegion, PageSet, order_regions};
pub use segment::density::TextDensitySplitter;
pub use segment::edge::EdgeContourDetector;
pub use segment::rectify::{RotatedRect, rectify};
pub use segment::{DetectionFailure, SegmentStrategy, detect_pages};
