// SPDX-License-Identifier: MIT
//
// Plain-text output — banner-delimited page sections.

use notelift_core::types::PageText;
use notelift_core::Result;
use tracing::instrument;

use super::DocumentWriter;

const BANNER: &str = "========================================";

/// Renders pages as plain text, each section introduced by a banner line
/// carrying the page label.
pub struct TextWriter;

impl DocumentWriter for TextWriter {
    #[instrument(skip_all, fields(pages = pages.len()))]
    fn render(&self, title: &str, pages: &[PageText]) -> Result<Vec<u8>> {
        let mut out = String::new();
        out.push_str(title);
        out.push('\n');
        out.push_str(BANNER);
        out.push('\n');

        for page in pages {
            out.push('\n');
            out.push_str(&page.label());
            out.push('\n');
            out.push_str(BANNER);
            out.push('\n');
            let text = page.text.trim_end();
            if !text.is_empty() {
                out.push_str(text);
                out.push('\n');
            }
        }

        Ok(out.into_bytes())
    }
}
