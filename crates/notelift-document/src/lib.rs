// SPDX-License-Identifier: MIT
//
// notelift-document — Text recognition and output generation for Notelift.
//
// Provides the page recognition contract (with an optional ocrs-backed
// engine), the text cleanup contract, and writers that render recognized
// pages to markdown, plain text, and PDF.

pub mod cleanup;
pub mod export;
pub mod recognize;

pub use cleanup::{PassthroughCleaner, TextCleaner, WhitespaceCleaner};
pub use export::{markdown::MarkdownWriter, pdf::PdfWriter, text::TextWriter};
pub use recognize::{NoopRecognizer, PageRecognizer};

#[cfg(feature = "ocr")]
pub use recognize::ocr::{OcrConfig, OcrRecognizer};
