// SPDX-License-Identifier: MIT
//
// Unified error types for Notelift.
//
// Only genuinely fatal conditions live here. Recoverable conditions inside the
// segmentation core (a failed primary detection pass, a degenerate candidate
// rectangle) are ordinary values handled locally, never errors.

use thiserror::Error;

/// Top-level error type for all Notelift operations.
#[derive(Debug, Error)]
pub enum NoteliftError {
    // -- Per-file fatal errors --
    #[error("invalid input image: {0}")]
    InvalidImage(String),

    #[error("image processing failed: {0}")]
    ImageError(String),

    // -- Collaborator errors --
    #[error("OCR failed: {0}")]
    OcrError(String),

    #[error("text cleanup failed: {0}")]
    CleanupError(String),

    #[error("document export failed: {0}")]
    ExportError(String),

    // -- Configuration --
    #[error("invalid configuration: {0}")]
    Config(String),

    // -- I/O and serialization --
    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, NoteliftError>;
