// SPDX-License-Identifier: MIT
//
// Markdown output — a titled document with one section per page.

use chrono::Local;
use notelift_core::types::PageText;
use notelift_core::Result;
use tracing::instrument;

use super::DocumentWriter;

/// Renders pages as a markdown document: a top-level title, a generation
/// timestamp, and one `##` section per page labelled with its source file
/// and position.
pub struct MarkdownWriter;

impl DocumentWriter for MarkdownWriter {
    #[instrument(skip_all, fields(pages = pages.len()))]
    fn render(&self, title: &str, pages: &[PageText]) -> Result<Vec<u8>> {
        let mut out = String::new();
        out.push_str(&format!("# {title}\n\n"));
        out.push_str(&format!(
            "_Digitized {}_\n\n",
            Local::now().format("%Y-%m-%d %H:%M")
        ));

        for page in pages {
            out.push_str(&format!("## {}\n\n", page.label()));
            let text = page.text.trim_end();
            if text.is_empty() {
                out.push_str("_(no text recognized)_\n\n");
            } else {
                out.push_str(text);
                out.push_str("\n\n");
            }
        }

        Ok(out.into_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(source: &str, page: usize, text: &str) -> PageText {
        PageText {
            source: source.into(),
            page,
            total: 3,
            text: text.into(),
        }
    }

    #[test]
    fn renders_title_and_sections() {
        let pages = vec![page("notes-01", 1, "first page"), page("notes-01", 2, "second page")];
        let bytes = MarkdownWriter.render("My Notebook", &pages).unwrap();
        let doc = String::from_utf8(bytes).unwrap();

        assert!(doc.starts_with("# My Notebook\n"));
        assert!(doc.contains("## notes-01 (Page 1/3)"));
        assert!(doc.contains("## notes-01 (Page 2/3)"));
        assert!(doc.contains("first page"));
    }

    #[test]
    fn empty_page_text_becomes_placeholder() {
        let bytes = MarkdownWriter.render("T", &[page("a", 1, "")]).unwrap();
        let doc = String::from_utf8(bytes).unwrap();
        assert!(doc.contains("_(no text recognized)_"));
    }

    #[test]
    fn write_to_file_creates_the_document() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.md");
        MarkdownWriter
            .write_to_file("T", &[page("a", 1, "body")], &path)
            .unwrap();
        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.contains("body"));
    }
}
