// SPDX-License-Identifier: MIT
//
// Output writers — render recognized pages to markdown, plain text, or PDF.

pub mod markdown;
pub mod pdf;
pub mod text;

use std::path::Path;

use notelift_core::types::{OutputFormat, PageText};
use notelift_core::Result;
use tracing::info;

/// Renders a titled sequence of recognized pages into one output document.
pub trait DocumentWriter {
    /// Render to the format's byte representation.
    fn render(&self, title: &str, pages: &[PageText]) -> Result<Vec<u8>>;

    /// Render and write to `path`.
    fn write_to_file(&self, title: &str, pages: &[PageText], path: &Path) -> Result<()> {
        let bytes = self.render(title, pages)?;
        std::fs::write(path, &bytes)?;
        info!(path = %path.display(), bytes = bytes.len(), "wrote output document");
        Ok(())
    }
}

/// Writer for the given output format.
pub fn writer_for(format: OutputFormat) -> Box<dyn DocumentWriter> {
    match format {
        OutputFormat::Markdown => Box::new(markdown::MarkdownWriter),
        OutputFormat::Text => Box::new(text::TextWriter),
        OutputFormat::Pdf => Box::new(pdf::PdfWriter::a4()),
    }
}
