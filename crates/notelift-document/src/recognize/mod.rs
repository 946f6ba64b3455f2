// SPDX-License-Identifier: MIT
//
// Page text recognition contract.
//
// Recognition is total over page images: an engine that fails returns the
// empty string after logging, and the pipeline carries on with the pages
// it has. Downstream stages treat an empty result as "no text on this
// page".

use image::DynamicImage;

#[cfg(feature = "ocr")]
pub mod ocr;

/// Extracts text from a single rectified page image.
///
/// Implementations must not fail: any internal error is logged and mapped
/// to an empty string.
pub trait PageRecognizer {
    fn recognize(&self, image: &DynamicImage) -> String;
}

/// Recognizer that returns no text for every page. Used when OCR is not
/// compiled in or its models are unavailable; the pipeline still produces
/// its image-only outputs.
pub struct NoopRecognizer;

impl PageRecognizer for NoopRecognizer {
    fn recognize(&self, _image: &DynamicImage) -> String {
        String::new()
    }
}
