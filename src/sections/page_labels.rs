//! Printed page numbers versus physical page positions.
//!
//! A contents page lists the numbers printed on the pages, which lag the
//! physical position whenever a cover or contents page goes unnumbered.

use std::collections::HashMap;

use anyhow::{Context, Result};
use regex::Regex;

/// Lines inspected at the bottom and top of each page for a printed number.
const FOOTER_LINES: usize = 5;
const HEADER_LINES: usize = 2;

#[derive(Debug, Clone)]
pub struct PageLabeler {
    page_prefixed: Regex,
    bare_number: Regex,
}

impl PageLabeler {
    pub fn new() -> Result<Self> {
        Ok(Self {
            page_prefixed: Regex::new(r"(?i)^page\s+([0-9]{1,4})$")
                .context("failed to compile page label regex")?,
            bare_number: Regex::new(r"^([0-9]{1,4})$")
                .context("failed to compile bare page number regex")?,
        })
    }

    /// The numeric label printed in a page's footer or header, if any.
    pub fn detect(&self, page: &str) -> Option<usize> {
        let lines = page
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .collect::<Vec<&str>>();

        lines
            .iter()
            .rev()
            .take(FOOTER_LINES)
            .chain(lines.iter().take(HEADER_LINES))
            .find_map(|line| {
                let captures = self
                    .page_prefixed
                    .captures(line)
                    .or_else(|| self.bare_number.captures(line))?;
                captures
                    .get(1)?
                    .as_str()
                    .parse::<usize>()
                    .ok()
                    .filter(|label| *label > 0)
            })
    }

    /// Settles on the physical-minus-printed offset most labelled pages agree on.
    pub fn map(&self, pages: &[String]) -> PageMap {
        let mut votes = HashMap::<isize, usize>::new();
        for (index, page) in pages.iter().enumerate() {
            if let Some(label) = self.detect(page) {
                *votes.entry((index + 1) as isize - label as isize).or_insert(0) += 1;
            }
        }

        let offset = votes
            .into_iter()
            .max_by(|(left_offset, left_votes), (right_offset, right_votes)| {
                left_votes
                    .cmp(right_votes)
                    .then(right_offset.abs().cmp(&left_offset.abs()))
                    .then(right_offset.cmp(left_offset))
            })
            .map(|(offset, _)| offset);

        PageMap { offset }
    }
}

/// Translates printed page numbers to 1-based physical pages.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PageMap {
    offset: Option<isize>,
}

impl PageMap {
    /// No printed labels seen: printed and physical numbers are taken as equal.
    pub fn identity() -> Self {
        Self::default()
    }

    pub fn offset(&self) -> Option<isize> {
        self.offset
    }

    pub fn physical_page(&self, printed: usize) -> Option<usize> {
        let Some(offset) = self.offset else {
            return Some(printed);
        };
        let physical = printed as isize + offset;
        (physical >= 1).then_some(physical as usize)
    }
}
