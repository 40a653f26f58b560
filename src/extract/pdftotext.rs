use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::OnceLock;

use anyhow::{Context, Result, bail};
use chrono::Utc;
use regex::Regex;
use tracing::{info, warn};

use super::{OcrEngine, TextExtractor, normalize_pages, split_form_feed_pages};
use crate::model::{Document, DocumentMetadata, TocEntry, TocSource};
use crate::util::{command_available, normalize_whitespace, sha256_file};

/// Poppler text-layer extractor with native outline support.
#[derive(Debug, Clone, Default)]
pub struct PdftotextExtractor {
    max_pages: Option<usize>,
}

impl PdftotextExtractor {
    pub fn new(max_pages: Option<usize>) -> Self {
        Self { max_pages }
    }

    fn extract_pages(&self, pdf_path: &Path) -> Result<Vec<String>> {
        let mut command = Command::new("pdftotext");
        command.arg("-enc").arg("UTF-8").arg("-f").arg("1");
        if let Some(max_pages) = self.max_pages {
            command.arg("-l").arg(max_pages.to_string());
        }
        command.arg(pdf_path).arg("-");

        let output = command
            .output()
            .with_context(|| format!("failed to execute pdftotext for {}", pdf_path.display()))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            bail!(
                "pdftotext returned non-zero exit status for {}: {}",
                pdf_path.display(),
                stderr.trim()
            );
        }

        Ok(split_form_feed_pages(&String::from_utf8_lossy(
            &output.stdout,
        )))
    }

    fn extract_bookmarks(&self, pdf_path: &Path) -> Result<Vec<TocEntry>> {
        let output = Command::new("pdftohtml")
            .arg("-xml")
            .arg("-i")
            .arg("-f")
            .arg("1")
            .arg("-l")
            .arg("1")
            .arg(pdf_path)
            .arg("-stdout")
            .output()
            .with_context(|| format!("failed to execute pdftohtml for {}", pdf_path.display()))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            bail!(
                "pdftohtml returned non-zero exit status for {}: {}",
                pdf_path.display(),
                stderr.trim()
            );
        }

        parse_outline_items(&String::from_utf8_lossy(&output.stdout))
    }
}

impl TextExtractor for PdftotextExtractor {
    fn name(&self) -> &'static str {
        "pdftotext"
    }

    fn extract(&self, path: &Path) -> Result<Document> {
        let mut pages = self.extract_pages(path)?;
        let stats = normalize_pages(&mut pages);

        let bookmarks = match self.extract_bookmarks(path) {
            Ok(entries) => Some(entries),
            Err(error) => {
                warn!(path = %path.display(), error = %error, "native outline unavailable");
                None
            }
        };

        let metadata = DocumentMetadata {
            source: path.display().to_string(),
            sha256: sha256_file(path)?,
            extractor: self.name().to_string(),
            page_count: pages.len(),
        };

        info!(
            path = %path.display(),
            pages = pages.len(),
            bookmarks = bookmarks.as_ref().map(Vec::len).unwrap_or(0),
            header_lines_removed = stats.header_lines_removed,
            footer_lines_removed = stats.footer_lines_removed,
            dehyphenation_merges = stats.dehyphenation_merges,
            "extracted pdf text layer"
        );

        Ok(Document::from_pages(metadata, pages).with_native_toc(bookmarks))
    }
}

/// Parses `<item page="N">label</item>` entries of a pdftohtml XML outline.
pub fn parse_outline_items(xml: &str) -> Result<Vec<TocEntry>> {
    let item_regex = Regex::new(r#"<item page="(\d+)">(.*?)</item>"#)
        .context("failed to compile outline item regex")?;

    let mut entries = Vec::<TocEntry>::new();
    for captures in item_regex.captures_iter(xml) {
        let page = captures
            .get(1)
            .and_then(|value| value.as_str().parse::<usize>().ok());
        let raw_label = captures.get(2).map(|value| value.as_str()).unwrap_or("");
        let title = normalize_outline_label(raw_label);
        if title.is_empty() {
            continue;
        }

        entries.push(TocEntry {
            title,
            page,
            source: TocSource::Bookmark,
        });
    }

    Ok(entries)
}

fn normalize_outline_label(raw_label: &str) -> String {
    let decoded = raw_label
        .replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace('\u{00a0}', " ");
    normalize_whitespace(&decoded)
}

/// `pdftoppm` + `tesseract` page OCR.
#[derive(Debug)]
pub struct TesseractOcr {
    lang: String,
    available: OnceLock<bool>,
}

impl TesseractOcr {
    pub fn new(lang: &str) -> Self {
        Self {
            lang: lang.to_string(),
            available: OnceLock::new(),
        }
    }
}

impl OcrEngine for TesseractOcr {
    fn available(&self) -> bool {
        *self
            .available
            .get_or_init(|| command_available("pdftoppm") && command_available("tesseract"))
    }

    fn ocr_page(&self, pdf_path: &Path, page_number: usize) -> Result<String> {
        let image = render_page(pdf_path, page_number)?;
        let recognized = self.recognize(&image);
        let _ = fs::remove_file(&image);
        recognized.with_context(|| format!("OCR failed for {} page {page_number}", pdf_path.display()))
    }
}

impl TesseractOcr {
    fn recognize(&self, image: &Path) -> Result<String> {
        let stdout = run_tool(
            Command::new("tesseract")
                .arg(image)
                .arg("stdout")
                .arg("-l")
                .arg(&self.lang),
            "tesseract",
        )?;
        Ok(stdout.replace('\u{0000}', "").trim().to_string())
    }
}

/// Rasterizes one page to a PNG under the temp dir and returns its path.
fn render_page(pdf_path: &Path, page_number: usize) -> Result<PathBuf> {
    let prefix = scratch_prefix(pdf_path, page_number);
    let page = page_number.to_string();
    run_tool(
        Command::new("pdftoppm")
            .args(["-f", page.as_str(), "-l", page.as_str(), "-singlefile", "-png"])
            .arg(pdf_path)
            .arg(&prefix),
        "pdftoppm",
    )?;

    // pdftoppm appends the extension to the prefix it was given.
    let image = prefix.with_extension("png");
    if !image.exists() {
        bail!("pdftoppm wrote no image for page {page_number}");
    }
    Ok(image)
}

/// Unique per process, page and instant so concurrent runs never share a file.
fn scratch_prefix(pdf_path: &Path, page_number: usize) -> PathBuf {
    let stem = pdf_path
        .file_stem()
        .map(|stem| stem.to_string_lossy())
        .unwrap_or_default()
        .chars()
        .map(|character| if character.is_ascii_alphanumeric() { character } else { '_' })
        .collect::<String>();
    let stamp = Utc::now().timestamp_nanos_opt().unwrap_or_default();
    std::env::temp_dir().join(format!(
        "greenscan_ocr_{stem}_{}_{page_number}_{stamp}",
        std::process::id()
    ))
}

/// Runs a tool to completion and returns its stdout, failing on a non-zero exit.
fn run_tool(command: &mut Command, tool: &str) -> Result<String> {
    let output = command
        .output()
        .with_context(|| format!("failed to execute {tool}"))?;
    if !output.status.success() {
        bail!(
            "{tool} exited with {}: {}",
            output.status,
            String::from_utf8_lossy(&output.stderr).trim()
        );
    }
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}
