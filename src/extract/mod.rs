//! Document text extraction and OCR adapters.
//!
//! Extraction is the only fatal step of a run: if the document text cannot be
//! read at all, the caller gets an error. Everything downstream degrades per
//! page instead.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use tracing::info;

use crate::config::ExtractionConfig;
use crate::model::{Document, DocumentMetadata};
use crate::util::sha256_file;

mod normalize;
mod pdftotext;
#[cfg(test)]
mod tests;

pub use normalize::{NormalizationStats, normalize_pages};
pub use pdftotext::{PdftotextExtractor, TesseractOcr, parse_outline_items};

pub trait TextExtractor {
    fn name(&self) -> &'static str;

    fn extract(&self, path: &Path) -> Result<Document>;
}

/// Renders and recognizes a single page. Slow and best-effort.
pub trait OcrEngine {
    fn available(&self) -> bool;

    fn ocr_page(&self, source: &Path, page_number: usize) -> Result<String>;
}

/// Reads `.txt`/`.md` input; form feeds separate pages.
#[derive(Debug, Default, Clone, Copy)]
pub struct PlainTextExtractor;

impl TextExtractor for PlainTextExtractor {
    fn name(&self) -> &'static str {
        "plain_text"
    }

    fn extract(&self, path: &Path) -> Result<Document> {
        let raw = fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
        let text = String::from_utf8_lossy(&raw);
        let pages = split_form_feed_pages(&text);

        let metadata = DocumentMetadata {
            source: path.display().to_string(),
            sha256: sha256_file(path)?,
            extractor: self.name().to_string(),
            page_count: pages.len(),
        };

        info!(path = %path.display(), pages = pages.len(), "extracted plain text document");
        Ok(Document::from_pages(metadata, pages))
    }
}

pub fn split_form_feed_pages(raw: &str) -> Vec<String> {
    let mut pages: Vec<String> = raw
        .split('\u{000C}')
        .map(|chunk| chunk.replace('\u{0000}', ""))
        .collect();

    while let Some(last_page) = pages.last() {
        if pages.len() > 1 && last_page.trim().is_empty() {
            pages.pop();
            continue;
        }
        break;
    }

    pages
}

pub fn extractor_for(path: &Path, config: &ExtractionConfig) -> Box<dyn TextExtractor> {
    let is_pdf = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("pdf"))
        .unwrap_or(false);

    if is_pdf {
        Box::new(PdftotextExtractor::new(config.max_pages))
    } else {
        Box::new(PlainTextExtractor)
    }
}

pub fn ocr_for(path: &Path, config: &ExtractionConfig) -> Option<TesseractOcr> {
    let is_pdf = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("pdf"))
        .unwrap_or(false);

    is_pdf.then(|| TesseractOcr::new(&config.ocr_lang))
}
