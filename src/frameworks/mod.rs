//! Framework mention detection and evidence scoring.
//!
//! Every pattern is matched word-bounded and case-insensitive. Each
//! occurrence is judged by the sentence around it: the tier indicators found
//! there feed the per-framework counts, and confidence and role are derived
//! from those counts alone.

use std::collections::BTreeSet;

use anyhow::{Context, Result};
use regex::Regex;
use serde::Serialize;
use tracing::debug;

use crate::util::{normalize_whitespace, step_back_chars, step_forward_chars};

mod patterns;
mod scoring;
#[cfg(test)]
mod tests;

pub use patterns::{
    FrameworkId, FrameworkPattern, PatternKind, TierIndicators, framework_indicators,
    framework_patterns, shared_indicators,
};
use patterns::disclosure_ref_pattern;
pub use scoring::{
    EvidenceCounts, FrameworkRole, PRIMARY_ROLE_MIN_EVIDENCE, REPEATED_PRIMARY_CEILING,
    SINGLE_PRIMARY_CEILING, confidence, role,
};

/// Characters kept on each side of a match for the context window.
pub const CONTEXT_CHARS: usize = 200;

const SENTENCE_TERMINALS: [char; 3] = ['.', '!', '?'];

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TierHits {
    pub primary: Vec<String>,
    pub secondary: Vec<String>,
    pub compliance: Vec<String>,
}

impl TierHits {
    pub fn counts(&self) -> EvidenceCounts {
        EvidenceCounts {
            primary: self.primary.len() as u32,
            secondary: self.secondary.len() as u32,
            compliance: self.compliance.len() as u32,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Occurrence {
    pub framework: FrameworkId,
    pub pattern: String,
    pub kind: PatternKind,
    /// Byte span of the match in the scanned text.
    pub start: usize,
    pub end: usize,
    pub sentence: String,
    pub tiers: TierHits,
}

#[derive(Debug, Clone, Serialize)]
pub struct FrameworkAssessment {
    pub framework: FrameworkId,
    pub full_name: String,
    pub confidence: u8,
    pub role: FrameworkRole,
    pub total_occurrences: usize,
    pub relevant_occurrences: usize,
    pub relevance_ratio: f64,
    pub evidence: EvidenceCounts,
    pub strength: u32,
    pub disclosure_refs: Vec<String>,
    pub occurrences: Vec<Occurrence>,
}

/// Assessments ordered by confidence, highest first.
#[derive(Debug, Clone, Default, Serialize)]
pub struct DetectionReport {
    pub assessments: Vec<FrameworkAssessment>,
}

impl DetectionReport {
    pub fn is_empty(&self) -> bool {
        self.assessments.is_empty()
    }

    pub fn get(&self, framework: FrameworkId) -> Option<&FrameworkAssessment> {
        self.assessments
            .iter()
            .find(|assessment| assessment.framework == framework)
    }

    pub fn with_role(&self, role: FrameworkRole) -> impl Iterator<Item = &FrameworkAssessment> {
        self.assessments
            .iter()
            .filter(move |assessment| assessment.role == role)
    }

    pub fn total_occurrences(&self) -> usize {
        self.assessments
            .iter()
            .map(|assessment| assessment.total_occurrences)
            .sum()
    }
}

struct FrameworkMatcher {
    framework: FrameworkId,
    patterns: Vec<(Regex, &'static str, PatternKind)>,
    disclosure_ref: Option<(&'static str, Regex)>,
    shared: TierIndicators,
    specific: TierIndicators,
}

pub struct FrameworkClassifier {
    matchers: Vec<FrameworkMatcher>,
}

impl FrameworkClassifier {
    pub fn new() -> Result<Self> {
        Self::with_patterns(framework_patterns())
    }

    pub fn with_patterns(table: Vec<FrameworkPattern>) -> Result<Self> {
        let mut matchers = Vec::<FrameworkMatcher>::with_capacity(table.len());
        for row in table {
            let mut patterns = Vec::with_capacity(row.patterns.len());
            for (pattern, kind) in row.patterns {
                if pattern.trim().is_empty() {
                    continue;
                }
                let regex = Regex::new(&format!(
                    r"(?i)\b{}\b",
                    regex::escape(pattern).replace(' ', r"\s+")
                ))
                .with_context(|| format!("failed to compile pattern for {}: {pattern}", row.framework))?;
                patterns.push((regex, pattern, kind));
            }

            let disclosure_ref = match disclosure_ref_pattern(row.framework) {
                Some((label, expression)) => Some((
                    label,
                    Regex::new(expression).with_context(|| {
                        format!("failed to compile disclosure regex for {}", row.framework)
                    })?,
                )),
                None => None,
            };

            matchers.push(FrameworkMatcher {
                framework: row.framework,
                patterns,
                disclosure_ref,
                shared: shared_indicators(),
                specific: framework_indicators(row.framework),
            });
        }

        Ok(Self { matchers })
    }

    pub fn classify(&self, text: &str) -> DetectionReport {
        let mut assessments = self
            .matchers
            .iter()
            .filter_map(|matcher| {
                let occurrences = matcher.occurrences(text);
                if occurrences.is_empty() {
                    return None;
                }
                Some(matcher.assess(occurrences))
            })
            .collect::<Vec<FrameworkAssessment>>();

        assessments.sort_by(|left, right| {
            right
                .confidence
                .cmp(&left.confidence)
                .then(left.framework.cmp(&right.framework))
        });

        debug!(
            frameworks = assessments.len(),
            text_bytes = text.len(),
            "classified framework evidence"
        );
        DetectionReport { assessments }
    }
}

impl FrameworkMatcher {
    fn occurrences(&self, text: &str) -> Vec<Occurrence> {
        let mut matches = self
            .patterns
            .iter()
            .flat_map(|(regex, pattern, kind)| {
                regex
                    .find_iter(text)
                    .map(move |found| (found.start(), found.end(), *pattern, *kind))
            })
            .collect::<Vec<(usize, usize, &'static str, PatternKind)>>();

        // Earliest start first, longest match first among equal starts.
        matches.sort_by(|left, right| left.0.cmp(&right.0).then(right.1.cmp(&left.1)));

        let mut occurrences = Vec::<Occurrence>::new();
        let mut covered_until = 0usize;
        for (start, end, pattern, kind) in matches {
            if start < covered_until {
                continue;
            }
            covered_until = end;

            let sentence = enclosing_sentence(text, start, end);
            let tiers = self.tier_hits(&sentence);
            occurrences.push(Occurrence {
                framework: self.framework,
                pattern: pattern.to_string(),
                kind,
                start,
                end,
                sentence,
                tiers,
            });
        }

        occurrences
    }

    fn tier_hits(&self, sentence: &str) -> TierHits {
        let lowered = sentence.to_lowercase();
        let hits = |shared: &[&str], specific: &[&str]| {
            let mut found = Vec::<String>::new();
            for indicator in shared.iter().chain(specific.iter()) {
                if lowered.contains(indicator) && !found.iter().any(|seen| seen == indicator) {
                    found.push(indicator.to_string());
                }
            }
            found
        };

        TierHits {
            primary: hits(self.shared.primary, self.specific.primary),
            secondary: hits(self.shared.secondary, self.specific.secondary),
            compliance: hits(self.shared.compliance, self.specific.compliance),
        }
    }

    fn assess(&self, occurrences: Vec<Occurrence>) -> FrameworkAssessment {
        let mut evidence = EvidenceCounts::default();
        let mut relevant_occurrences = 0usize;
        let mut disclosure_refs = BTreeSet::<String>::new();

        for occurrence in &occurrences {
            let counts = occurrence.tiers.counts();
            if !counts.is_empty() {
                relevant_occurrences += 1;
            }
            evidence.add(counts);

            if let Some((label, regex)) = &self.disclosure_ref {
                for captures in regex.captures_iter(&occurrence.sentence) {
                    if let Some(number) = captures.get(1) {
                        disclosure_refs.insert(format!("{label} {}", number.as_str().to_uppercase()));
                    }
                }
            }
        }

        let total_occurrences = occurrences.len();
        let relevance_ratio = if total_occurrences == 0 {
            0.0
        } else {
            relevant_occurrences as f64 / total_occurrences as f64
        };

        FrameworkAssessment {
            framework: self.framework,
            full_name: self.framework.full_name().to_string(),
            confidence: confidence(total_occurrences, relevant_occurrences, evidence),
            role: role(evidence),
            total_occurrences,
            relevant_occurrences,
            relevance_ratio,
            evidence,
            strength: evidence.strength(),
            disclosure_refs: disclosure_refs.into_iter().collect(),
            occurrences,
        }
    }
}

/// Sentence around `start..end`, bounded by a `CONTEXT_CHARS` window on each
/// side. A terminal only ends a sentence when whitespace or the end of the
/// text follows it, so "ISO 14001.2015" stays intact.
pub fn enclosing_sentence(text: &str, start: usize, end: usize) -> String {
    let window_start = step_back_chars(text, start, CONTEXT_CHARS);
    let window_end = step_forward_chars(text, end, CONTEXT_CHARS);

    let mut sentence_start = window_start;
    let mut following: Option<char> = None;
    for (offset, character) in text[window_start..start].char_indices().rev() {
        if SENTENCE_TERMINALS.contains(&character) && following.is_some_and(char::is_whitespace) {
            sentence_start = window_start + offset + character.len_utf8();
            break;
        }
        following = Some(character);
    }

    let mut sentence_end = window_end;
    let mut after = text[end..window_end].char_indices().peekable();
    while let Some((offset, character)) = after.next() {
        if !SENTENCE_TERMINALS.contains(&character) {
            continue;
        }
        let terminal_end = end + offset + character.len_utf8();
        let breaks = match after.peek() {
            Some((_, next)) => next.is_whitespace(),
            None => terminal_end == text.len(),
        };
        if breaks {
            sentence_end = terminal_end;
            break;
        }
    }

    normalize_whitespace(&text[sentence_start..sentence_end])
}
