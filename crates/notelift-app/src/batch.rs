// SPDX-License-Identifier: MIT
//
// Batch processing: scan the input directory, run the segmentation and
// recognition pipeline over each photo on a bounded worker pool, and
// aggregate the recognized pages in input order.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use notelift_core::types::PageText;
use notelift_core::{AppConfig, NoteliftError, Result, SegmentConfig};
use notelift_document::{PageRecognizer, TextCleaner, WhitespaceCleaner};
use notelift_segment::detect_pages;
use tokio::sync::Semaphore;
use tracing::{info, instrument, warn};

/// Recognizer shared across worker tasks.
pub type SharedRecognizer = Arc<dyn PageRecognizer + Send + Sync>;

/// Summary of one batch run.
#[derive(Debug, Default)]
pub struct BatchOutcome {
    /// Files that went through the full pipeline.
    pub processed: usize,
    /// Files skipped with a logged reason.
    pub skipped: usize,
    /// Recognized pages, in input-file order and page order within a file.
    pub pages: Vec<PageText>,
}

/// List source photos under `dir` with one of the configured extensions,
/// sorted by file name for a stable processing order.
pub fn scan_input_dir(dir: &Path, extensions: &[String]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if !path.is_file() {
            continue;
        }
        let matches = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| {
                let ext = ext.to_ascii_lowercase();
                extensions.iter().any(|want| want == &ext)
            })
            .unwrap_or(false);
        if matches {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Process every photo in the configured input directory.
///
/// Files run concurrently up to `max_workers`, each on a blocking thread
/// since the pipeline is CPU-bound. A file that fails is logged and
/// counted as skipped; the batch always runs to completion.
#[instrument(skip_all, fields(input = %config.input_dir.display()))]
pub async fn run_batch(config: &AppConfig, recognizer: SharedRecognizer) -> Result<BatchOutcome> {
    let files = scan_input_dir(&config.input_dir, &config.image_extensions)?;
    info!(file_count = files.len(), "starting batch");

    let semaphore = Arc::new(Semaphore::new(config.max_workers));
    let mut handles = Vec::with_capacity(files.len());

    for path in files {
        let semaphore = Arc::clone(&semaphore);
        let recognizer = Arc::clone(&recognizer);
        let segment = config.segment.clone();

        handles.push(tokio::spawn(async move {
            // The semaphore is never closed; acquire only fails at shutdown.
            let _permit = semaphore.acquire_owned().await.ok();
            let result = tokio::task::spawn_blocking({
                let path = path.clone();
                move || process_file(&path, &segment, recognizer.as_ref())
            })
            .await;
            (path, result)
        }));
    }

    let mut outcome = BatchOutcome::default();
    for handle in handles {
        let (path, result) = handle
            .await
            .map_err(|err| NoteliftError::ImageError(format!("worker task failed: {err}")))?;
        match result {
            Ok(Ok(pages)) => {
                outcome.processed += 1;
                outcome.pages.extend(pages);
            }
            Ok(Err(err)) => {
                warn!(path = %path.display(), %err, "skipping file");
                outcome.skipped += 1;
            }
            Err(err) => {
                warn!(path = %path.display(), %err, "pipeline panicked, skipping file");
                outcome.skipped += 1;
            }
        }
    }

    info!(
        processed = outcome.processed,
        skipped = outcome.skipped,
        pages = outcome.pages.len(),
        "batch complete"
    );
    Ok(outcome)
}

/// Full pipeline for one photo: decode, segment into pages, recognize and
/// clean the text of each page. Pages without recognized text are dropped.
#[instrument(skip_all, fields(path = %path.display()))]
fn process_file(
    path: &Path,
    segment: &SegmentConfig,
    recognizer: &dyn PageRecognizer,
) -> Result<Vec<PageText>> {
    let image = image::open(path)
        .map_err(|err| NoteliftError::ImageError(format!("failed to decode {}: {err}", path.display())))?;

    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("untitled")
        .to_owned();

    let regions = detect_pages(&image, segment)?;
    let total = regions.len();
    let cleaner = WhitespaceCleaner;

    let mut pages = Vec::with_capacity(total);
    for (index, region) in regions.iter().enumerate() {
        let raw = recognizer.recognize(&region.image);
        if raw.trim().is_empty() {
            info!(page = index + 1, "no text recognized, dropping page");
            continue;
        }
        pages.push(PageText {
            source: stem.clone(),
            page: index + 1,
            total,
            text: cleaner.enhance(&raw),
        });
    }
    info!(pages = pages.len(), total, "file processed");
    Ok(pages)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, GrayImage, Luma};

    struct FixedRecognizer(&'static str);

    impl PageRecognizer for FixedRecognizer {
        fn recognize(&self, _image: &DynamicImage) -> String {
            self.0.to_owned()
        }
    }

    fn write_photo(path: &Path, width: u32, height: u32) {
        let img = GrayImage::from_pixel(width, height, Luma([200u8]));
        img.save(path).unwrap();
    }

    fn test_config(input: &Path) -> AppConfig {
        AppConfig {
            input_dir: input.to_path_buf(),
            segment: SegmentConfig {
                min_dimension: 0,
                ..SegmentConfig::default()
            },
            ..AppConfig::default()
        }
    }

    #[test]
    fn scan_filters_and_sorts() {
        let dir = tempfile::tempdir().unwrap();
        write_photo(&dir.path().join("b.png"), 8, 8);
        write_photo(&dir.path().join("a.png"), 8, 8);
        std::fs::write(dir.path().join("notes.txt"), "not an image").unwrap();

        let files = scan_input_dir(dir.path(), &["png".into()]).unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a.png", "b.png"]);
    }

    #[test]
    fn scan_matches_extensions_case_insensitively() {
        let dir = tempfile::tempdir().unwrap();
        write_photo(&dir.path().join("photo.PNG"), 8, 8);
        let files = scan_input_dir(dir.path(), &["png".into()]).unwrap();
        assert_eq!(files.len(), 1);
    }

    #[tokio::test]
    async fn batch_processes_files_and_counts_pages() {
        let dir = tempfile::tempdir().unwrap();
        write_photo(&dir.path().join("notes-01.png"), 300, 120);
        write_photo(&dir.path().join("notes-02.png"), 300, 120);

        let config = test_config(dir.path());
        let recognizer: SharedRecognizer = Arc::new(FixedRecognizer("some text"));
        let outcome = run_batch(&config, recognizer).await.unwrap();

        assert_eq!(outcome.processed, 2);
        assert_eq!(outcome.skipped, 0);
        // Three pages per photo, all with text.
        assert_eq!(outcome.pages.len(), 6);
        assert_eq!(outcome.pages[0].source, "notes-01");
        assert_eq!(outcome.pages[3].source, "notes-02");
        assert_eq!(outcome.pages[0].total, 3);
    }

    #[tokio::test]
    async fn undecodable_file_is_skipped_not_fatal() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("broken.png"), b"not a png").unwrap();
        write_photo(&dir.path().join("good.png"), 300, 120);

        let config = test_config(dir.path());
        let recognizer: SharedRecognizer = Arc::new(FixedRecognizer("text"));
        let outcome = run_batch(&config, recognizer).await.unwrap();

        assert_eq!(outcome.processed, 1);
        assert_eq!(outcome.skipped, 1);
    }

    #[tokio::test]
    async fn pages_without_text_are_dropped() {
        let dir = tempfile::tempdir().unwrap();
        write_photo(&dir.path().join("blank.png"), 300, 120);

        let config = test_config(dir.path());
        let recognizer: SharedRecognizer = Arc::new(FixedRecognizer(""));
        let outcome = run_batch(&config, recognizer).await.unwrap();

        assert_eq!(outcome.processed, 1);
        assert!(outcome.pages.is_empty());
    }
}
