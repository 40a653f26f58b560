use std::collections::{HashMap, HashSet};

use serde::Serialize;

use crate::util::normalize_whitespace;

#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct NormalizationStats {
    pub header_lines_removed: usize,
    pub footer_lines_removed: usize,
    pub noise_lines_removed: usize,
    pub dehyphenation_merges: usize,
}

/// A first or last line must recur on this many pages to count as running.
const MIN_EDGE_REPEATS: usize = 3;
const MAX_EDGE_CHARS: usize = 120;

/// Strips running headers/footers and page furniture, then rejoins words
/// hyphenated across line breaks. Page count and order are preserved.
pub fn normalize_pages(pages: &mut [String]) -> NormalizationStats {
    let running = RunningLines::collect(pages);
    let mut stats = NormalizationStats::default();

    for page in pages.iter_mut() {
        let mut lines = page
            .lines()
            .filter(|line| !line_is_noise(line))
            .map(str::to_string)
            .collect::<Vec<String>>();
        stats.noise_lines_removed += page.lines().count() - lines.len();

        if running.strip_edge(&mut lines, Edge::Top) {
            stats.header_lines_removed += 1;
        }
        if running.strip_edge(&mut lines, Edge::Bottom) {
            stats.footer_lines_removed += 1;
        }

        let (merged, merges) = merge_hyphenated_lines(lines);
        stats.dehyphenation_merges += merges;
        *page = merged.join("\n");
    }

    stats
}

#[derive(Debug, Clone, Copy)]
enum Edge {
    Top,
    Bottom,
}

/// Header and footer lines that repeat across pages, keyed case- and
/// whitespace-insensitively.
#[derive(Debug, Default)]
struct RunningLines {
    headers: HashSet<String>,
    footers: HashSet<String>,
}

impl RunningLines {
    fn collect(pages: &[String]) -> Self {
        let mut header_counts = HashMap::<String, usize>::new();
        let mut footer_counts = HashMap::<String, usize>::new();

        for page in pages {
            let mut content = page.lines().filter(|line| !line.trim().is_empty());
            if let Some(key) = content.next().and_then(edge_key) {
                *header_counts.entry(key).or_default() += 1;
            }
            if let Some(key) = page
                .lines()
                .rev()
                .find(|line| !line.trim().is_empty())
                .and_then(edge_key)
            {
                *footer_counts.entry(key).or_default() += 1;
            }
        }

        let repeated = |counts: HashMap<String, usize>| {
            counts
                .into_iter()
                .filter(|(_, count)| *count >= MIN_EDGE_REPEATS)
                .map(|(key, _)| key)
                .collect::<HashSet<String>>()
        };

        Self {
            headers: repeated(header_counts),
            footers: repeated(footer_counts),
        }
    }

    /// Drops the outermost non-blank line at `edge` when it is a running line.
    fn strip_edge(&self, lines: &mut Vec<String>, edge: Edge) -> bool {
        let is_content = |line: &String| !line.trim().is_empty();
        let (position, known) = match edge {
            Edge::Top => (lines.iter().position(is_content), &self.headers),
            Edge::Bottom => (lines.iter().rposition(is_content), &self.footers),
        };

        let Some(index) = position else {
            return false;
        };
        if !edge_key(&lines[index]).is_some_and(|key| known.contains(&key)) {
            return false;
        }
        lines.remove(index);
        true
    }
}

fn edge_key(line: &str) -> Option<String> {
    let key = normalize_whitespace(line).to_lowercase();
    (!key.is_empty() && key.chars().count() <= MAX_EDGE_CHARS).then_some(key)
}

fn line_is_noise(line: &str) -> bool {
    let lower = line.trim().to_ascii_lowercase();
    let Some(rest) = lower.strip_prefix("page ") else {
        return false;
    };
    let parts = rest.split_whitespace().collect::<Vec<&str>>();
    matches!(parts.as_slice(), [current, "of", total]
        if current.chars().all(|ch| ch.is_ascii_digit())
            && total.chars().all(|ch| ch.is_ascii_digit()))
}

fn merge_hyphenated_lines(lines: Vec<String>) -> (Vec<String>, usize) {
    let mut merged = Vec::<String>::with_capacity(lines.len());
    let mut merges = 0usize;
    let mut iter = lines.into_iter().peekable();

    while let Some(current) = iter.next() {
        let joinable = iter
            .peek()
            .map(|next| should_merge_hyphenated_pair(&current, next))
            .unwrap_or(false);
        if joinable {
            if let Some(next) = iter.next() {
                let right = next.trim_start();
                let left = if keeps_hyphen(right) {
                    current.trim_end()
                } else {
                    current.trim_end().trim_end_matches('-')
                };
                merged.push(format!("{left}{right}"));
                merges += 1;
                continue;
            }
        }
        merged.push(current);
    }

    (merged, merges)
}

// Compounds that must survive a line-wrap join ("climate-related").
const COMPOUND_SUFFIXES: &[&str] = &["related", "based", "term", "looking", "party", "wide"];

fn keeps_hyphen(next: &str) -> bool {
    let word = next
        .split(|character: char| !character.is_alphabetic())
        .next()
        .unwrap_or_default()
        .to_lowercase();
    COMPOUND_SUFFIXES.contains(&word.as_str())
}

fn should_merge_hyphenated_pair(current: &str, next: &str) -> bool {
    let left = current.trim_end();
    if !left.ends_with('-') {
        return false;
    }

    let starts_with_lowercase = next
        .trim_start()
        .chars()
        .next()
        .map(|character| character.is_lowercase())
        .unwrap_or(false);
    if !starts_with_lowercase {
        return false;
    }

    left.trim_end_matches('-')
        .chars()
        .last()
        .map(|character| character.is_alphabetic())
        .unwrap_or(false)
}
