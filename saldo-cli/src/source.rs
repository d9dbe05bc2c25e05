//! Page-text sources: `pdftotext -layout` for PDFs, form-feed split for text dumps.

use saldo_ingest::{IngestError, PageText, TextSource};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

/// Text already extracted (one page per form feed).
pub struct PlainTextFile {
    path: PathBuf,
}

impl PlainTextFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl TextSource for PlainTextFile {
    fn extract(&self) -> Result<Vec<PageText>, IngestError> {
        let text = fs::read_to_string(&self.path).map_err(|e| extraction_error(&self.path, e))?;
        Ok(PageText::split_pages(&text))
    }
}

/// PDF statement run through poppler's `pdftotext -layout`.
pub struct PdfToText {
    path: PathBuf,
}

impl PdfToText {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl TextSource for PdfToText {
    fn extract(&self) -> Result<Vec<PageText>, IngestError> {
        let bin = which::which("pdftotext")
            .map_err(|_| extraction_error(&self.path, "pdftotext not installed (poppler-utils)"))?;

        let output = Command::new(bin)
            .arg("-layout")
            .arg(&self.path)
            .arg("-")
            .output()
            .map_err(|e| extraction_error(&self.path, e))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(extraction_error(
                &self.path,
                format!("pdftotext failed ({}): {}", output.status, stderr.trim()),
            ));
        }

        let text = String::from_utf8_lossy(&output.stdout);
        tracing::debug!(path = %self.path.display(), bytes = text.len(), "pdftotext output");
        Ok(PageText::split_pages(&text))
    }
}

fn extraction_error(
    path: &Path,
    source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
) -> IngestError {
    IngestError::Extraction {
        origin: path.display().to_string(),
        source: source.into(),
    }
}

pub fn source_for(path: &Path) -> Box<dyn TextSource> {
    let is_pdf = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("pdf"));
    if is_pdf {
        Box::new(PdfToText::new(path))
    } else {
        Box::new(PlainTextFile::new(path))
    }
}
