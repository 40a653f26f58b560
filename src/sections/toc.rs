use std::collections::HashSet;

use anyhow::{Context, Result};
use regex::Regex;

use super::page_labels::PageMap;
use crate::model::{TocEntry, TocSource};
use crate::util::normalize_whitespace;

const MAX_HEADING_CHARS: usize = 80;
const MAX_HEADING_WORDS: usize = 10;

/// Heuristic table-of-contents reader for documents without bookmarks.
#[derive(Debug, Clone)]
pub struct TocScanner {
    dot_leader: Regex,
    numbered_heading: Regex,
}

impl TocScanner {
    pub fn new() -> Result<Self> {
        Ok(Self {
            dot_leader: Regex::new(
                r"^\s*(?P<title>.*?[^.\s…])\s*(?:(?:\.\s*){3,}|…+\s*)(?P<page>\d{1,4})\s*$",
            )
            .context("failed to compile dot-leader regex")?,
            numbered_heading: Regex::new(
                r"^\s*(?P<num>\d{1,2}(?:\.\d{1,2})*)\.?\s+(?P<title>[A-Za-z].{2,}?)(?:\s+(?P<page>\d{1,4}))?\s*$",
            )
            .context("failed to compile numbered-heading regex")?,
        })
    }

    /// Scans the first `scan_pages` pages; entries come back in reading order
    /// with printed page numbers already mapped to physical pages.
    pub fn scan(&self, pages: &[String], scan_pages: usize, page_map: &PageMap) -> Vec<TocEntry> {
        let mut entries = Vec::<TocEntry>::new();
        let mut seen = HashSet::<(String, Option<usize>)>::new();

        for (page_index, page) in pages.iter().take(scan_pages).enumerate() {
            for line in page.lines() {
                let Some(entry) = self.parse_line(line, page_index + 1, page_map) else {
                    continue;
                };
                if seen.insert((entry.title.to_lowercase(), entry.page)) {
                    entries.push(entry);
                }
            }
        }

        entries
    }

    fn parse_line(&self, line: &str, found_on_page: usize, page_map: &PageMap) -> Option<TocEntry> {
        if let Some(captures) = self.dot_leader.captures(line) {
            let title = normalize_whitespace(captures.name("title")?.as_str());
            let page = captures.name("page")?.as_str().parse::<usize>().ok()?;
            if !looks_like_heading(&title) {
                return None;
            }
            return Some(TocEntry {
                title,
                page: page_map.physical_page(page),
                source: TocSource::DotLeader,
            });
        }

        let captures = self.numbered_heading.captures(line)?;
        let title = normalize_whitespace(captures.name("title")?.as_str());
        if !looks_like_heading(&title) || title.ends_with(['.', ',', ';', ':']) {
            return None;
        }
        // A heading without a trailing number sits on the page it names.
        let page = match captures.name("page") {
            Some(value) => page_map.physical_page(value.as_str().parse::<usize>().ok()?),
            None => Some(found_on_page),
        };

        Some(TocEntry {
            title,
            page,
            source: TocSource::NumberedHeading,
        })
    }
}

fn looks_like_heading(title: &str) -> bool {
    title.chars().any(char::is_alphabetic)
        && title.chars().count() <= MAX_HEADING_CHARS
        && title.split_whitespace().count() <= MAX_HEADING_WORDS
}
