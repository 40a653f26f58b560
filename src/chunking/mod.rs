//! Budget-aware text splitting.
//!
//! All budgets are in characters (derived from a token budget through one
//! fixed ratio). `start`/`end` are byte offsets that always sit on char
//! boundaries; `char_start`/`char_end` are the same span counted in characters.

use serde::Serialize;
use tracing::{debug, warn};

use crate::config::ChunkerConfig;
use crate::model::Degradation;
use crate::util::{step_back_chars, step_forward_chars};

#[cfg(test)]
mod tests;

const SENTENCE_TERMINALS: [char; 3] = ['.', '!', '?'];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChunkBoundary {
    /// Cut right after a sentence terminal inside the lookback window.
    Sentence,
    /// No terminal in reach; cut at the raw budget boundary.
    Hard,
    /// Chunk runs to the end of the source text.
    End,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Chunk {
    pub index: usize,
    pub start: usize,
    pub end: usize,
    pub char_start: usize,
    pub char_end: usize,
    pub text: String,
    pub approx_tokens: usize,
    pub boundary: ChunkBoundary,
}

impl Chunk {
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct SplitOutcome {
    pub chunks: Vec<Chunk>,
    /// Set when the chunk cap stopped the split before the end of the text.
    pub truncated: bool,
    pub degradations: Vec<Degradation>,
}

impl SplitOutcome {
    /// End offset of the last kept chunk; the prefix `..covered_end()` is
    /// what the chunks actually cover.
    pub fn covered_end(&self) -> usize {
        self.chunks.last().map(|chunk| chunk.end).unwrap_or(0)
    }
}

#[derive(Debug, Clone)]
pub struct ChunkSplitter {
    config: ChunkerConfig,
}

impl ChunkSplitter {
    pub fn new(config: ChunkerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ChunkerConfig {
        &self.config
    }

    pub fn split(&self, text: &str) -> SplitOutcome {
        let mut outcome = SplitOutcome::default();
        if text.is_empty() {
            return outcome;
        }

        let char_budget = self.config.char_budget();
        let max_chunks = self.config.max_chunks.max(1);

        if text.chars().count() <= char_budget {
            outcome
                .chunks
                .push(self.make_chunk(text, 0, 0, text.len(), ChunkBoundary::End));
            return outcome;
        }

        let mut start = 0usize;
        loop {
            if outcome.chunks.len() == max_chunks {
                outcome.truncated = true;
                debug!(
                    max_chunks,
                    remaining_bytes = text.len() - start,
                    "chunk cap reached"
                );
                break;
            }

            let index = outcome.chunks.len();
            let window_end = step_forward_chars(text, start, char_budget);
            if window_end >= text.len() {
                outcome
                    .chunks
                    .push(self.make_chunk(text, index, start, text.len(), ChunkBoundary::End));
                break;
            }

            // A cut must land past the previous chunk's end, or the chunk would
            // add no text of its own.
            let floor = outcome.chunks.last().map(|chunk| chunk.end).unwrap_or(start);
            let (cut, boundary) = match self.sentence_cut(text, floor, window_end) {
                Some(cut) => (cut, ChunkBoundary::Sentence),
                None => {
                    warn!(
                        chunk_index = index,
                        char_budget,
                        lookback_chars = self.config.lookback_chars,
                        "no sentence boundary within lookback; hard cut"
                    );
                    outcome.degradations.push(Degradation::SplitBudgetExceeded {
                        chunk_index: index,
                        char_budget,
                    });
                    (window_end, ChunkBoundary::Hard)
                }
            };

            outcome
                .chunks
                .push(self.make_chunk(text, index, start, cut, boundary));

            // Advance or stop: overlap may never pull the next start back to
            // (or before) the current one.
            let overlapped = step_back_chars(text, cut, self.config.overlap_chars);
            start = if overlapped > start { overlapped } else { cut };
        }

        outcome
    }

    /// Byte offset just past the last terminal in the lookback window, never
    /// searching before `min_floor`.
    fn sentence_cut(&self, text: &str, min_floor: usize, window_end: usize) -> Option<usize> {
        let floor = step_back_chars(text, window_end, self.config.lookback_chars).max(min_floor);
        text[floor..window_end]
            .char_indices()
            .rev()
            .find(|(_, character)| SENTENCE_TERMINALS.contains(character))
            .map(|(offset, character)| floor + offset + character.len_utf8())
    }

    fn make_chunk(
        &self,
        text: &str,
        index: usize,
        start: usize,
        end: usize,
        boundary: ChunkBoundary,
    ) -> Chunk {
        let slice = &text[start..end];
        let char_start = text[..start].chars().count();
        let char_len = slice.chars().count();
        Chunk {
            index,
            start,
            end,
            char_start,
            char_end: char_start + char_len,
            text: slice.to_string(),
            approx_tokens: self.config.estimate_tokens(char_len),
            boundary,
        }
    }
}
