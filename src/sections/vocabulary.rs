use anyhow::{Context, Result};
use regex::Regex;

use crate::frameworks::FrameworkId;
use crate::util::normalize_whitespace;

/// Headings of report sections that usually state the reporting basis.
pub const SECTION_VOCABULARY: &[&str] = &[
    "about this report",
    "about the report",
    "reporting methodology",
    "methodology",
    "basis of preparation",
    "basis of reporting",
    "reporting approach",
    "sustainability reporting approach",
    "reporting frameworks",
    "reporting standards",
    "reporting scope",
    "reporting boundary",
    "framework alignment",
    "esg standards",
    "gri index",
    "gri content index",
    "tcfd index",
    "sasb index",
    "content index",
    "independent assurance",
    "assurance",
    "verification",
    "governance",
    "materiality",
];

pub const ESG_KEYWORDS: &[&str] = &[
    "esg",
    "sustainability",
    "climate",
    "emissions",
    "greenhouse gas",
    "ghg",
    "scope 1",
    "scope 2",
    "scope 3",
    "net zero",
    "net-zero",
    "carbon",
    "decarbonization",
    "gri",
    "tcfd",
    "sasb",
    "cdp",
    "csrd",
    "esrs",
    "issb",
    "ifrs s1",
    "ifrs s2",
    "iso 14001",
    "iso 14064",
];

const EXTRA_FULL_NAMES: &[&str] = &[
    "European Sustainability Reporting Standards",
    "International Sustainability Standards Board",
];

/// Word-bounded, case-insensitive term sets used by the section scans.
#[derive(Debug, Clone)]
pub struct Vocabulary {
    sections: Regex,
    keywords: Regex,
    full_names: Regex,
}

impl Vocabulary {
    pub fn new() -> Result<Self> {
        let full_names = FrameworkId::ALL
            .iter()
            .map(|framework| framework.full_name())
            .chain(EXTRA_FULL_NAMES.iter().copied())
            .collect::<Vec<&str>>();

        Ok(Self {
            sections: term_regex(SECTION_VOCABULARY).context("failed to compile section vocabulary")?,
            keywords: term_regex(ESG_KEYWORDS).context("failed to compile esg keyword list")?,
            full_names: term_regex(&full_names).context("failed to compile framework names")?,
        })
    }

    /// First section-vocabulary term in `text`, lower-cased.
    pub fn section_term(&self, text: &str) -> Option<String> {
        self.sections
            .find(text)
            .map(|found| normalize_whitespace(found.as_str()).to_lowercase())
    }

    pub fn mentions_keyword(&self, text: &str) -> bool {
        self.keywords.is_match(text)
    }

    pub fn mentions_full_name(&self, text: &str) -> bool {
        self.full_names.is_match(text)
    }
}

// Longest alternatives first so "gri content index" wins over "content index".
fn term_regex(terms: &[&str]) -> Result<Regex> {
    let mut sorted = terms.to_vec();
    sorted.sort_by_key(|term| std::cmp::Reverse(term.len()));
    let alternatives = sorted
        .iter()
        .map(|term| regex::escape(term).replace(' ', r"\s+"))
        .collect::<Vec<String>>()
        .join("|");
    Regex::new(&format!(r"(?i)\b(?:{alternatives})\b")).map_err(Into::into)
}
