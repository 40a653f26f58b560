use std::collections::HashSet;

use regex::Regex;

use super::vocabulary::Vocabulary;
use super::{MatchReason, Relevance, Section, SectionSpan, heading_title};
use crate::util::normalize_whitespace;

const LEADING_PARAGRAPHS: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) struct Paragraph<'a> {
    pub start: usize,
    pub end: usize,
    pub text: &'a str,
}

/// Blank-line separated paragraphs with their byte spans; empty ones dropped.
pub(super) fn split_paragraphs<'a>(text: &'a str, paragraph_break: &Regex) -> Vec<Paragraph<'a>> {
    let mut paragraphs = Vec::<Paragraph<'a>>::new();
    let mut cursor = 0usize;

    let mut push = |start: usize, end: usize| {
        let raw = &text[start..end];
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return;
        }
        let leading = raw.len() - raw.trim_start().len();
        let start = start + leading;
        paragraphs.push(Paragraph {
            start,
            end: start + trimmed.len(),
            text: trimmed,
        });
    };

    for separator in paragraph_break.find_iter(text) {
        push(cursor, separator.start());
        cursor = separator.end();
    }
    push(cursor, text.len());

    paragraphs
}

pub(super) fn select_paragraphs(
    text: &str,
    paragraph_break: &Regex,
    vocabulary: &Vocabulary,
) -> Vec<Section> {
    let paragraphs = split_paragraphs(text, paragraph_break);
    let mut seen = HashSet::<String>::new();
    let mut sections = Vec::<Section>::new();

    for paragraph in &paragraphs {
        let section_term = vocabulary.section_term(paragraph.text);
        let relevant = section_term.is_some()
            || vocabulary.mentions_keyword(paragraph.text)
            || vocabulary.mentions_full_name(paragraph.text);
        if !relevant || !seen.insert(normalize_whitespace(paragraph.text)) {
            continue;
        }
        sections.push(paragraph_section(
            paragraph,
            MatchReason::ParagraphKeyword,
            section_term,
        ));
    }

    if !sections.is_empty() {
        return sections;
    }

    paragraphs
        .iter()
        .filter(|paragraph| seen.insert(normalize_whitespace(paragraph.text)))
        .take(LEADING_PARAGRAPHS)
        .map(|paragraph| paragraph_section(paragraph, MatchReason::LeadingParagraphs, None))
        .collect()
}

fn paragraph_section(
    paragraph: &Paragraph<'_>,
    reason: MatchReason,
    matched_term: Option<String>,
) -> Section {
    Section {
        title: heading_title(paragraph.text),
        span: SectionSpan::Chars {
            start: paragraph.start,
            end: paragraph.end,
        },
        relevance: Relevance::Medium,
        reason,
        matched_term,
        text: paragraph.text.to_string(),
    }
}
