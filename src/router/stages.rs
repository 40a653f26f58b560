use std::thread;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::AnalysisRoute;
use crate::analysis::{AnalysisError, AnalysisRequest, ChunkAnalyzer, StageOutput};
use crate::chunking::Chunk;
use crate::config::RetryPolicy;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TcfdPillar {
    Governance,
    Strategy,
    RiskManagement,
    MetricsAndTargets,
}

impl TcfdPillar {
    pub const ALL: [TcfdPillar; 4] = [
        TcfdPillar::Governance,
        TcfdPillar::Strategy,
        TcfdPillar::RiskManagement,
        TcfdPillar::MetricsAndTargets,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Governance => "governance",
            Self::Strategy => "strategy",
            Self::RiskManagement => "risk_management",
            Self::MetricsAndTargets => "metrics_and_targets",
        }
    }

    /// Recommended disclosures covered by the pillar.
    pub fn recommendations(self) -> &'static [&'static str] {
        match self {
            Self::Governance => &["tcfd_1", "tcfd_2"],
            Self::Strategy => &["tcfd_3", "tcfd_4", "tcfd_5"],
            Self::RiskManagement => &["tcfd_6", "tcfd_7", "tcfd_8"],
            Self::MetricsAndTargets => &["tcfd_9", "tcfd_10", "tcfd_11"],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    ClaimsExtraction,
    PillarReview(TcfdPillar),
    /// Comprehensive review across all pillars of the route framework.
    FrameworkReview,
    ClaimsValidation,
}

impl Stage {
    pub fn label(&self) -> String {
        match self {
            Self::ClaimsExtraction => "claims_extraction".to_string(),
            Self::PillarReview(pillar) => format!("pillar_review:{}", pillar.as_str()),
            Self::FrameworkReview => "framework_review".to_string(),
            Self::ClaimsValidation => "claims_validation".to_string(),
        }
    }
}

pub fn stages_for(route: AnalysisRoute) -> Vec<Stage> {
    match route {
        AnalysisRoute::Standard => vec![Stage::ClaimsExtraction, Stage::ClaimsValidation],
        AnalysisRoute::SpecializedPrimary => TcfdPillar::ALL
            .into_iter()
            .map(Stage::PillarReview)
            .chain(std::iter::once(Stage::ClaimsValidation))
            .collect(),
        AnalysisRoute::SpecializedSecondary => vec![
            Stage::ClaimsExtraction,
            Stage::FrameworkReview,
            Stage::ClaimsValidation,
        ],
    }
}

/// Exactly one success text; a failure names the stage that broke the chunk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ChunkOutcome {
    Completed { text: String },
    Failed { stage: String, reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChunkResult {
    pub chunk_index: usize,
    /// Byte span of the chunk in the analysed text.
    pub start: usize,
    pub end: usize,
    pub char_start: usize,
    pub char_end: usize,
    pub outcome: ChunkOutcome,
    pub stage_outputs: Vec<StageOutput>,
    pub attempts: u32,
    pub elapsed_ms: u64,
}

impl ChunkResult {
    pub fn is_failure(&self) -> bool {
        matches!(self.outcome, ChunkOutcome::Failed { .. })
    }
}

/// Runs every stage of `route` over one chunk; the last stage's text is the
/// chunk result.
pub fn run_chunk(
    analyzer: &dyn ChunkAnalyzer,
    route: AnalysisRoute,
    chunk: &Chunk,
    chunk_count: usize,
    retry: &RetryPolicy,
) -> ChunkResult {
    let started = Instant::now();
    let mut stage_outputs = Vec::<StageOutput>::new();
    let mut attempts = 0u32;
    let mut outcome = None;

    for stage in stages_for(route) {
        let request = AnalysisRequest {
            route,
            stage,
            chunk_index: chunk.index,
            chunk_count,
            chunk_text: &chunk.text,
            prior_outputs: &stage_outputs,
        };

        match call_with_retry(analyzer, &request, retry, &mut attempts) {
            Ok(text) => stage_outputs.push(StageOutput { stage, text }),
            Err(error) => {
                warn!(
                    chunk_index = chunk.index,
                    stage = %stage.label(),
                    error = %error,
                    "chunk analysis failed"
                );
                outcome = Some(ChunkOutcome::Failed {
                    stage: stage.label(),
                    reason: error.to_string(),
                });
                break;
            }
        }
    }

    let outcome = outcome.unwrap_or_else(|| ChunkOutcome::Completed {
        text: stage_outputs
            .last()
            .map(|output| output.text.clone())
            .unwrap_or_default(),
    });

    let elapsed_ms = started.elapsed().as_millis() as u64;
    debug!(chunk_index = chunk.index, attempts, elapsed_ms, "chunk finished");

    ChunkResult {
        chunk_index: chunk.index,
        start: chunk.start,
        end: chunk.end,
        char_start: chunk.char_start,
        char_end: chunk.char_end,
        outcome,
        stage_outputs,
        attempts,
        elapsed_ms,
    }
}

fn call_with_retry(
    analyzer: &dyn ChunkAnalyzer,
    request: &AnalysisRequest<'_>,
    retry: &RetryPolicy,
    attempts: &mut u32,
) -> Result<String, AnalysisError> {
    let mut retries_left = retry.retries();
    loop {
        *attempts += 1;
        match analyzer.analyze(request) {
            Ok(text) => return Ok(text),
            Err(error) if retries_left > 0 => {
                retries_left -= 1;
                warn!(
                    chunk_index = request.chunk_index,
                    stage = %request.stage.label(),
                    error = %error,
                    backoff_ms = retry.backoff_ms,
                    "analysis call failed; retrying"
                );
                thread::sleep(retry.backoff());
            }
            Err(error) => return Err(error),
        }
    }
}
