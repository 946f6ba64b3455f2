// SPDX-License-Identifier: MIT
//
// Core domain types shared between the segmentation core, the collaborator
// crate, and the batch application.

use serde::{Deserialize, Serialize};

/// Output document formats supported by the export writers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Markdown,
    Text,
    Pdf,
}

impl OutputFormat {
    /// File extension used when writing this format.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Markdown => "md",
            Self::Text => "txt",
            Self::Pdf => "pdf",
        }
    }
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "markdown" | "md" => Ok(Self::Markdown),
            "text" | "txt" => Ok(Self::Text),
            "pdf" => Ok(Self::Pdf),
            other => Err(format!("unknown output format: {other}")),
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Markdown => f.write_str("markdown"),
            Self::Text => f.write_str("text"),
            Self::Pdf => f.write_str("pdf"),
        }
    }
}

/// Recognized (and cleaned) text for one page of one source photo.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageText {
    /// Stem of the source file this page came from.
    pub source: String,
    /// 1-based page index within the source photo.
    pub page: usize,
    /// Total pages detected in the source photo.
    pub total: usize,
    /// Cleaned text content.
    pub text: String,
}

impl PageText {
    /// Human-readable label, e.g. `"lecture-07 (Page 2/3)"`.
    pub fn label(&self) -> String {
        format!("{} (Page {}/{})", self.source, self.page, self.total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn format_from_str_accepts_aliases() {
        assert_eq!(OutputFormat::from_str("md").unwrap(), OutputFormat::Markdown);
        assert_eq!(OutputFormat::from_str("TXT").unwrap(), OutputFormat::Text);
        assert_eq!(OutputFormat::from_str("pdf").unwrap(), OutputFormat::Pdf);
        assert!(OutputFormat::from_str("docx").is_err());
    }

    #[test]
    fn page_text_label() {
        let page = PageText {
            source: "lecture-07".into(),
            page: 2,
            total: 3,
            text: String::new(),
        };
        assert_eq!(page.label(), "lecture-07 (Page 2/3)");
    }
}
