use std::collections::HashMap;

use anyhow::anyhow;

use super::*;
use crate::config::OcrMode;
use crate::model::DocumentMetadata;

struct FakeOcr {
    available: bool,
    pages: HashMap<usize, Result<String, String>>,
}

impl FakeOcr {
    fn new(pages: &[(usize, Result<&str, &str>)]) -> Self {
        Self {
            available: true,
            pages: pages
                .iter()
                .map(|(page, outcome)| {
                    let outcome = (*outcome).map(str::to_string).map_err(str::to_string);
                    (*page, outcome)
                })
                .collect(),
        }
    }
}

impl OcrEngine for FakeOcr {
    fn available(&self) -> bool {
        self.available
    }

    fn ocr_page(&self, _source: &Path, page_number: usize) -> Result<String> {
        match self.pages.get(&page_number) {
            Some(Ok(text)) => Ok(text.clone()),
            Some(Err(reason)) => Err(anyhow!(reason.clone())),
            None => Ok(String::new()),
        }
    }
}

fn document(pages: &[&str]) -> Document {
    let metadata = DocumentMetadata {
        source: "report.pdf".to_string(),
        sha256: String::new(),
        extractor: "test".to_string(),
        page_count: 0,
    };
    Document::from_pages(metadata, pages.iter().map(|page| page.to_string()).collect())
}

fn no_ocr() -> ExtractionConfig {
    ExtractionConfig {
        ocr_mode: OcrMode::Off,
        ..ExtractionConfig::default()
    }
}

fn auto_ocr(min_chars: usize) -> ExtractionConfig {
    ExtractionConfig {
        ocr_mode: OcrMode::Auto,
        ocr_min_text_chars: min_chars,
        ..ExtractionConfig::default()
    }
}

#[test]
fn dot_leader_toc_selects_methodology_pages() {
    let doc = document(&[
        "Contents\nOur Company ........ 2\nReporting Methodology ........ 3\nPerformance Data . . . . 4",
        "Our Company\nWe make things.",
        "Reporting Methodology\nThis report is prepared in accordance with the GRI Standards.",
        "Performance Data\nNumbers.",
    ]);
    let config = no_ocr();

    let result = SectionPrioritizer::new(&config).unwrap().prioritize(&doc);

    assert_eq!(result.toc_entries, 3);
    assert_eq!(result.sections.len(), 1);
    let section = &result.sections[0];
    assert_eq!(section.span, SectionSpan::Pages { first: 3, last: 3 });
    assert_eq!(section.relevance, Relevance::High);
    assert_eq!(section.reason, MatchReason::TocDotLeader);
    assert_eq!(section.matched_term.as_deref(), Some("reporting methodology"));
    assert!(section.text.contains("GRI Standards"));
}

#[test]
fn printed_toc_numbers_map_past_unnumbered_front_pages() {
    let doc = document(&[
        "Acme Corp\nSustainability Report 2024",
        "Contents\nOur Company ........ 1\nReporting Methodology ........ 2\nPerformance Data ........ 3",
        "Our Company\nWe make things.\n1",
        "Reporting Methodology\nThis report is prepared in accordance with the GRI Standards.\n2",
        "Performance Data\nNumbers.\n3",
    ]);
    let config = no_ocr();

    let result = SectionPrioritizer::new(&config).unwrap().prioritize(&doc);

    assert_eq!(result.printed_page_offset, Some(2));
    assert_eq!(result.sections.len(), 1);
    let section = &result.sections[0];
    assert_eq!(section.title, "Reporting Methodology");
    assert_eq!(section.span, SectionSpan::Pages { first: 4, last: 4 });
    assert!(section.text.starts_with("Reporting Methodology"));
    assert!(section.text.contains("GRI Standards"));
}

#[test]
fn page_labels_come_from_footer_or_header_lines() {
    let labeler = PageLabeler::new().unwrap();

    assert_eq!(labeler.detect("Governance\nBoard oversight.\n\nPage 14\n"), Some(14));
    assert_eq!(labeler.detect("7\nStrategy\nScenario analysis covers 2030."), Some(7));
    assert_eq!(labeler.detect("Emissions fell by 4%.\nScope 3 is estimated."), None);
    assert_eq!(labeler.detect("Page 0"), None);
}

#[test]
fn page_offset_follows_the_majority_of_labels() {
    let labeler = PageLabeler::new().unwrap();
    let pages = ["Cover", "Contents", "Intro\n1", "Body\n2", "Data table\n2024", "Notes\n4"]
        .iter()
        .map(|page| page.to_string())
        .collect::<Vec<String>>();

    let map = labeler.map(&pages);

    assert_eq!(map.offset(), Some(2));
    assert_eq!(map.physical_page(3), Some(5));
    assert_eq!(PageMap::identity().physical_page(9), Some(9));
    assert_eq!(labeler.map(&["Intro\n3".to_string()]).physical_page(1), None);
}

#[test]
fn native_bookmarks_win_and_page_range_is_capped() {
    let doc = document(&["Cover", "About this Report", "Scope", "Boundary", "More", "End"])
        .with_native_toc(Some(vec![TocEntry {
            title: "About this Report".to_string(),
            page: Some(2),
            source: TocSource::Bookmark,
        }]));
    let config = no_ocr();

    let result = SectionPrioritizer::new(&config).unwrap().prioritize(&doc);

    assert_eq!(result.sections.len(), 1);
    assert_eq!(result.sections[0].span, SectionSpan::Pages { first: 2, last: 4 });
    assert_eq!(result.sections[0].reason, MatchReason::Bookmark);
    assert_eq!(result.sections[0].text, "About this Report\nScope\nBoundary");
}

#[test]
fn bookmark_pointing_past_document_end_is_ignored() {
    let doc = document(&["Intro", "Body"]).with_native_toc(Some(vec![TocEntry {
        title: "Assurance".to_string(),
        page: Some(9),
        source: TocSource::Bookmark,
    }]));
    let config = no_ocr();

    let result = SectionPrioritizer::new(&config).unwrap().prioritize(&doc);

    assert!(
        result
            .sections
            .iter()
            .all(|section| section.reason != MatchReason::Bookmark)
    );
}

#[test]
fn numbered_heading_with_trailing_page_is_medium_relevance() {
    let doc = document(&[
        "1 Introduction\nText.\n2 Governance and Assurance 3",
        "Introduction body.",
        "Board oversight of climate risk.",
    ]);
    let config = no_ocr();

    let result = SectionPrioritizer::new(&config).unwrap().prioritize(&doc);

    assert_eq!(result.sections.len(), 1);
    let section = &result.sections[0];
    assert_eq!(section.title, "Governance and Assurance");
    assert_eq!(section.span, SectionSpan::Pages { first: 3, last: 3 });
    assert_eq!(section.relevance, Relevance::Medium);
    assert_eq!(section.reason, MatchReason::TocNumberedHeading);
}

#[test]
fn toc_scanner_ignores_numbered_sentences() {
    let scanner = TocScanner::new().unwrap();
    let pages = vec![
        "Governance .... 12\n2.1 Reporting approach 7\nThe company reported 3 incidents.\n12 months of progress were made in 2024."
            .to_string(),
    ];

    let entries = scanner.scan(&pages, 10, &PageMap::identity());

    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].title, "Governance");
    assert_eq!(entries[0].page, Some(12));
    assert_eq!(entries[0].source, TocSource::DotLeader);
    assert_eq!(entries[1].title, "Reporting approach");
    assert_eq!(entries[1].page, Some(7));
    assert_eq!(entries[1].source, TocSource::NumberedHeading);
}

#[test]
fn page_scan_runs_when_no_toc_entry_matches() {
    let doc = document(&[
        "Welcome to our report.",
        "Our approach to materiality is described here.",
        "Financial statements.",
    ]);
    let config = no_ocr();

    let result = SectionPrioritizer::new(&config).unwrap().prioritize(&doc);

    assert_eq!(result.sections.len(), 1);
    assert_eq!(result.sections[0].span, SectionSpan::Pages { first: 2, last: 2 });
    assert_eq!(result.sections[0].reason, MatchReason::PageKeywordScan);
    assert_eq!(result.sections[0].relevance, Relevance::Medium);
}

#[test]
fn paragraph_fallback_keeps_keyword_paragraphs_once() {
    let text = "Welcome letter from the CEO.\n\nWe track our greenhouse gas emissions closely.\n\nThe weather was nice.\n\nWe track our  greenhouse gas\nemissions closely.";
    let doc = document(&[text]);
    let config = no_ocr();

    let result = SectionPrioritizer::new(&config).unwrap().prioritize(&doc);
    let full_text = result.full_text();

    assert_eq!(result.sections.len(), 1);
    let section = &result.sections[0];
    assert_eq!(section.reason, MatchReason::ParagraphKeyword);
    let SectionSpan::Chars { start, end } = section.span else {
        panic!("expected a character span");
    };
    assert_eq!(&full_text[start..end], section.text);
    assert_eq!(section.text, "We track our greenhouse gas emissions closely.");
}

#[test]
fn framework_full_name_alone_marks_paragraph_relevant() {
    let doc = document(&["Hello.\n\nWe follow the Task Force on Climate-related Financial Disclosures."]);
    let config = no_ocr();

    let result = SectionPrioritizer::new(&config).unwrap().prioritize(&doc);

    assert_eq!(result.sections.len(), 1);
    assert!(result.sections[0].text.starts_with("We follow"));
}

#[test]
fn leading_paragraphs_are_the_last_resort() {
    let text = (1..=7)
        .map(|index| format!("Paragraph {index} about our agriculture business."))
        .collect::<Vec<String>>()
        .join("\n\n");
    let doc = document(&[&text]);
    let config = no_ocr();

    let result = SectionPrioritizer::new(&config).unwrap().prioritize(&doc);

    assert_eq!(result.sections.len(), 5);
    assert!(
        result
            .sections
            .iter()
            .all(|section| section.reason == MatchReason::LeadingParagraphs)
    );
    assert!(result.sections[0].text.starts_with("Paragraph 1"));
}

#[test]
fn empty_document_yields_no_sections() {
    let doc = document(&[""]);
    let config = no_ocr();

    let result = SectionPrioritizer::new(&config).unwrap().prioritize(&doc);

    assert!(result.sections.is_empty());
    assert!(result.degradations.is_empty());
    assert_eq!(result.joined_text(), "");
}

#[test]
fn ocr_replaces_sparse_page_with_longer_text() {
    let doc = document(&[
        "",
        "A long enough page of extracted text about nothing in particular.",
    ]);
    let config = auto_ocr(20);
    let ocr = FakeOcr::new(&[(1, Ok("Independent assurance statement for the reporting year."))]);

    let result = SectionPrioritizer::new(&config)
        .unwrap()
        .with_ocr(&ocr)
        .prioritize(&doc);

    assert_eq!(result.ocr_pages_replaced, vec![1]);
    assert!(result.pages[0].starts_with("Independent assurance"));
    assert!(result.degradations.is_empty());
    assert_eq!(result.sections.len(), 1);
    assert_eq!(result.sections[0].matched_term.as_deref(), Some("independent assurance"));
}

#[test]
fn ocr_failure_keeps_page_and_records_degradation() {
    let doc = document(&["", "Body text on the second page of this report."]);
    let config = auto_ocr(20);
    let ocr = FakeOcr::new(&[(1, Err("render failed"))]);

    let result = SectionPrioritizer::new(&config)
        .unwrap()
        .with_ocr(&ocr)
        .prioritize(&doc);

    assert!(result.ocr_pages_replaced.is_empty());
    assert!(result.degradations.contains(&Degradation::OcrFailure {
        page: 1,
        reason: "render failed".to_string(),
    }));
    assert!(result.degradations.iter().any(|degradation| matches!(
        degradation,
        Degradation::ExtractionFailure { page: Some(1), .. }
    )));
}

#[test]
fn shorter_ocr_output_never_replaces_extracted_text() {
    let doc = document(&["Short governance page."]);
    let config = auto_ocr(100);
    let ocr = FakeOcr::new(&[(1, Ok("gov"))]);

    let result = SectionPrioritizer::new(&config)
        .unwrap()
        .with_ocr(&ocr)
        .prioritize(&doc);

    assert!(result.ocr_pages_replaced.is_empty());
    assert_eq!(result.pages[0], "Short governance page.");
}

#[test]
fn unavailable_ocr_engine_degrades_every_candidate_page() {
    let doc = document(&["", "x"]);
    let config = auto_ocr(5);
    let mut ocr = FakeOcr::new(&[]);
    ocr.available = false;

    let result = SectionPrioritizer::new(&config)
        .unwrap()
        .with_ocr(&ocr)
        .prioritize(&doc);

    let ocr_failures = result
        .degradations
        .iter()
        .filter(|degradation| matches!(degradation, Degradation::OcrFailure { .. }))
        .count();
    assert_eq!(ocr_failures, 2);
}
