// SPDX-License-Identifier: MIT
//
// Text cleanup contract.
//
// Cleanup refines OCR output without changing its meaning. The contract is
// conservative: a cleaner that cannot improve the text must return the
// input unchanged, never empty it or invent content. Network-backed
// cleaners live outside this repository and plug in through the trait.

use tracing::instrument;

/// Improves recognized text. Total: failure means returning the input.
pub trait TextCleaner {
    fn enhance(&self, text: &str) -> String;
}

/// Cleaner that returns the text verbatim. Stands in wherever no external
/// cleanup service is wired up.
pub struct PassthroughCleaner;

impl TextCleaner for PassthroughCleaner {
    fn enhance(&self, text: &str) -> String {
        text.to_owned()
    }
}

/// Built-in cleaner: trims trailing whitespace per line and collapses runs
/// of blank lines, leaving the words themselves untouched.
pub struct WhitespaceCleaner;

impl TextCleaner for WhitespaceCleaner {
    #[instrument(skip_all, fields(chars = text.len()))]
    fn enhance(&self, text: &str) -> String {
        let mut out = String::with_capacity(text.len());
        let mut blank_run = 0usize;
        for line in text.lines() {
            let trimmed = line.trim_end();
            if trimmed.is_empty() {
                blank_run += 1;
                if blank_run > 1 {
                    continue;
                }
            } else {
                blank_run = 0;
            }
            out.push_str(trimmed);
            out.push('\n');
        }
        // Preserve inputs without a trailing newline.
        if !text.ends_with('\n') && out.ends_with('\n') {
            out.pop();
        }
        out
    }
}
