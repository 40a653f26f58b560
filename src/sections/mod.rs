//! Locates the parts of a report most likely to state its reporting basis.
//!
//! Order of attempts: native bookmarks or a heuristic TOC matched against
//! the section vocabulary, then a per-page vocabulary scan, then a
//! paragraph-level keyword scan, and finally the leading paragraphs. Sparse
//! pages are OCR'd first when an engine is available.

use std::collections::HashSet;
use std::path::Path;

use anyhow::{Context, Result};
use regex::Regex;
use serde::Serialize;
use tracing::{info, warn};

use crate::config::ExtractionConfig;
use crate::extract::OcrEngine;
use crate::model::{Degradation, Document, TocEntry, TocSource};

mod ocr;
mod page_labels;
mod paragraphs;
#[cfg(test)]
mod tests;
mod toc;
mod vocabulary;

pub use page_labels::{PageLabeler, PageMap};
pub use toc::TocScanner;
pub use vocabulary::{ESG_KEYWORDS, SECTION_VOCABULARY, Vocabulary};

/// A TOC-located section never spans more pages than this.
const MAX_SECTION_PAGES: usize = 3;
const MAX_TITLE_CHARS: usize = 80;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Relevance {
    High,
    Medium,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchReason {
    Bookmark,
    TocDotLeader,
    TocNumberedHeading,
    PageKeywordScan,
    ParagraphKeyword,
    /// Nothing matched; the opening paragraphs stand in for a summary.
    LeadingParagraphs,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "unit", rename_all = "snake_case")]
pub enum SectionSpan {
    /// Inclusive 1-based page range.
    Pages { first: usize, last: usize },
    /// Byte range into the page-joined document text.
    Chars { start: usize, end: usize },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Section {
    pub title: String,
    pub span: SectionSpan,
    pub relevance: Relevance,
    pub reason: MatchReason,
    pub matched_term: Option<String>,
    pub text: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct Prioritization {
    pub sections: Vec<Section>,
    /// Pages after OCR substitution, in physical order.
    #[serde(skip)]
    pub pages: Vec<String>,
    pub toc_entries: usize,
    /// Physical minus printed page number, when pages carry printed numbers.
    pub printed_page_offset: Option<isize>,
    pub ocr_pages_replaced: Vec<usize>,
    pub degradations: Vec<Degradation>,
}

impl Prioritization {
    /// Section texts separated by blank lines, in output order.
    pub fn joined_text(&self) -> String {
        self.sections
            .iter()
            .map(|section| section.text.as_str())
            .collect::<Vec<&str>>()
            .join("\n\n")
    }

    /// Whole document text with OCR substitutions applied.
    pub fn full_text(&self) -> String {
        self.pages.join("\n")
    }
}

pub struct SectionPrioritizer<'a> {
    config: &'a ExtractionConfig,
    ocr: Option<&'a dyn OcrEngine>,
    vocabulary: Vocabulary,
    toc_scanner: TocScanner,
    page_labeler: PageLabeler,
    paragraph_break: Regex,
}

impl<'a> SectionPrioritizer<'a> {
    pub fn new(config: &'a ExtractionConfig) -> Result<Self> {
        Ok(Self {
            config,
            ocr: None,
            vocabulary: Vocabulary::new()?,
            toc_scanner: TocScanner::new()?,
            page_labeler: PageLabeler::new()?,
            paragraph_break: Regex::new(r"\n[ \t\r]*\n")
                .context("failed to compile paragraph break regex")?,
        })
    }

    pub fn with_ocr(mut self, ocr: &'a dyn OcrEngine) -> Self {
        self.ocr = Some(ocr);
        self
    }

    pub fn prioritize(&self, document: &Document) -> Prioritization {
        let mut result = Prioritization {
            pages: document
                .pages
                .clone()
                .unwrap_or_else(|| vec![document.text.clone()]),
            ..Prioritization::default()
        };

        result.ocr_pages_replaced = ocr::apply_ocr_fallback(
            &mut result.pages,
            Path::new(&document.metadata.source),
            self.config,
            self.ocr,
            &mut result.degradations,
        );
        self.record_empty_pages(&mut result);

        // Bookmarks already point at physical pages; only printed TOC numbers need mapping.
        let toc_entries = match document.native_toc.as_ref() {
            Some(entries) if !entries.is_empty() => entries.clone(),
            _ => {
                let page_map = self.page_labeler.map(&result.pages);
                result.printed_page_offset = page_map.offset();
                self.toc_scanner
                    .scan(&result.pages, self.config.toc_scan_pages, &page_map)
            }
        };
        result.toc_entries = toc_entries.len();

        let mut sections = self.sections_from_toc(&toc_entries, &result.pages);
        if sections.is_empty() {
            sections = self.sections_from_page_scan(&result.pages);
        }
        if sections.is_empty() {
            sections = paragraphs::select_paragraphs(
                &result.full_text(),
                &self.paragraph_break,
                &self.vocabulary,
            );
        }
        result.sections = sections;

        info!(
            source = %document.metadata.source,
            pages = result.pages.len(),
            toc_entries = result.toc_entries,
            printed_page_offset = ?result.printed_page_offset,
            sections = result.sections.len(),
            strategy = result
                .sections
                .first()
                .map(|section| reason_label(section.reason))
                .unwrap_or("none"),
            "prioritized sections"
        );

        result
    }

    fn record_empty_pages(&self, result: &mut Prioritization) {
        if result.pages.len() <= 1 {
            return;
        }

        let empty_pages = result
            .pages
            .iter()
            .enumerate()
            .filter(|(_, page)| page.trim().is_empty())
            .map(|(index, _)| index + 1)
            .collect::<Vec<usize>>();
        if empty_pages.is_empty() {
            return;
        }

        warn!(pages = ?empty_pages, "skipping pages without extractable text");
        result
            .degradations
            .extend(empty_pages.into_iter().map(|page| Degradation::ExtractionFailure {
                page: Some(page),
                reason: "page has no extractable text".to_string(),
            }));
    }

    fn sections_from_toc(&self, entries: &[TocEntry], pages: &[String]) -> Vec<Section> {
        let page_count = pages.len();
        let mut located = entries
            .iter()
            .filter_map(|entry| {
                entry
                    .page
                    .filter(|page| (1..=page_count).contains(page))
                    .map(|page| (page, entry))
            })
            .collect::<Vec<(usize, &TocEntry)>>();
        located.sort_by_key(|(page, _)| *page);

        let mut seen = HashSet::<(usize, usize)>::new();
        let mut sections = Vec::<Section>::new();

        for (position, (first, entry)) in located.iter().enumerate() {
            let first = *first;
            let Some(term) = self.vocabulary.section_term(&entry.title) else {
                continue;
            };

            let next_page = located[position + 1..]
                .iter()
                .map(|(page, _)| *page)
                .find(|page| *page > first);
            let last = next_page
                .map(|page| page - 1)
                .unwrap_or(page_count)
                .min(first + MAX_SECTION_PAGES - 1)
                .max(first);

            if !seen.insert((first, last)) {
                continue;
            }

            let text = pages[first - 1..last]
                .iter()
                .map(|page| page.trim())
                .filter(|page| !page.is_empty())
                .collect::<Vec<&str>>()
                .join("\n");
            if text.is_empty() {
                continue;
            }

            let (relevance, reason) = match entry.source {
                TocSource::Bookmark => (Relevance::High, MatchReason::Bookmark),
                TocSource::DotLeader => (Relevance::High, MatchReason::TocDotLeader),
                TocSource::NumberedHeading => (Relevance::Medium, MatchReason::TocNumberedHeading),
            };

            sections.push(Section {
                title: entry.title.clone(),
                span: SectionSpan::Pages { first, last },
                relevance,
                reason,
                matched_term: Some(term),
                text,
            });
        }

        sections
    }

    fn sections_from_page_scan(&self, pages: &[String]) -> Vec<Section> {
        pages
            .iter()
            .enumerate()
            .filter(|(_, page)| !page.trim().is_empty())
            .filter_map(|(index, page)| {
                let term = self.vocabulary.section_term(page)?;
                let text = page.trim();
                Some(Section {
                    title: heading_title(text),
                    span: SectionSpan::Pages {
                        first: index + 1,
                        last: index + 1,
                    },
                    relevance: Relevance::Medium,
                    reason: MatchReason::PageKeywordScan,
                    matched_term: Some(term),
                    text: text.to_string(),
                })
            })
            .collect()
    }
}

/// First non-empty line, shortened for display.
fn heading_title(text: &str) -> String {
    let line = text
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .unwrap_or_default();
    line.chars().take(MAX_TITLE_CHARS).collect()
}

pub fn reason_label(reason: MatchReason) -> &'static str {
    match reason {
        MatchReason::Bookmark => "bookmark",
        MatchReason::TocDotLeader => "toc_dot_leader",
        MatchReason::TocNumberedHeading => "toc_numbered_heading",
        MatchReason::PageKeywordScan => "page_keyword_scan",
        MatchReason::ParagraphKeyword => "paragraph_keyword",
        MatchReason::LeadingParagraphs => "leading_paragraphs",
    }
}
