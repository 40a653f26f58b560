//! Folds ordered chunk results into one annotated report.
//!
//! Results are concatenated as-is. Claims repeated across overlapping chunks
//! are not merged.

use serde::Serialize;

use crate::router::{ChunkOutcome, ChunkResult};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AggregatedReport {
    pub text: String,
    pub chunk_count: usize,
    pub completed_chunks: usize,
    pub failed_chunks: Vec<usize>,
}

/// `char_start`/`char_end` are character offsets, not bytes.
pub fn chunk_header(position: usize, total: usize, char_start: usize, char_end: usize) -> String {
    format!(
        "=== Chunk {}/{} (chars {}-{}) ===",
        position + 1,
        total,
        char_start,
        char_end
    )
}

pub fn failure_placeholder(position: usize, stage: &str, reason: &str) -> String {
    format!(
        "[analysis unavailable: chunk {} failed at stage {}: {}]",
        position + 1,
        stage,
        reason
    )
}

/// `results` must already be in chunk order; every slot appears in the
/// output, failed ones as an explicit placeholder.
pub fn aggregate(results: &[ChunkResult]) -> AggregatedReport {
    let total = results.len();
    let mut blocks = Vec::<String>::with_capacity(total);
    let mut failed_chunks = Vec::<usize>::new();

    for (position, result) in results.iter().enumerate() {
        let header = chunk_header(position, total, result.char_start, result.char_end);
        let body = match &result.outcome {
            ChunkOutcome::Completed { text } => text.trim().to_string(),
            ChunkOutcome::Failed { stage, reason } => {
                failed_chunks.push(result.chunk_index);
                failure_placeholder(position, stage, reason)
            }
        };
        blocks.push(format!("{header}\n{body}"));
    }

    AggregatedReport {
        text: blocks.join("\n\n"),
        chunk_count: total,
        completed_chunks: total - failed_chunks.len(),
        failed_chunks,
    }
}
