//! Document-level routing and chunk fan-out.
//!
//! `AnalysisRouter` moves strictly forward through
//! `Init -> FrameworksAssessed -> RouteChosen -> ChunksDispatched -> Aggregated`.
//! The framework assessment is held by the router and handed to route
//! selection explicitly; the route never changes once chosen.

use anyhow::{Result, bail};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::aggregate::{AggregatedReport, aggregate};
use crate::analysis::ChunkAnalyzer;
use crate::chunking::{ChunkSplitter, SplitOutcome};
use crate::config::{ChunkerConfig, EngineConfig, RouteConfig};
use crate::frameworks::{DetectionReport, FrameworkClassifier, FrameworkId, FrameworkRole};
use crate::model::Degradation;

mod dispatch;
mod stages;

pub use dispatch::fan_out;
pub use stages::{ChunkOutcome, ChunkResult, Stage, TcfdPillar, run_chunk, stages_for};

/// The framework whose presence selects a specialized route.
pub const ROUTE_FRAMEWORK: FrameworkId = FrameworkId::Tcfd;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AnalysisRoute {
    Standard,
    SpecializedPrimary,
    SpecializedSecondary,
}

impl AnalysisRoute {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Standard => "standard",
            Self::SpecializedPrimary => "specialized-primary",
            Self::SpecializedSecondary => "specialized-secondary",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RouterState {
    Init,
    FrameworksAssessed,
    RouteChosen,
    ChunksDispatched,
    Aggregated,
}

impl RouterState {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Init => "init",
            Self::FrameworksAssessed => "frameworks_assessed",
            Self::RouteChosen => "route_chosen",
            Self::ChunksDispatched => "chunks_dispatched",
            Self::Aggregated => "aggregated",
        }
    }
}

/// Pure route rule over an explicit assessment set.
pub fn choose_route(report: &DetectionReport, config: &RouteConfig) -> AnalysisRoute {
    let Some(assessment) = report.get(ROUTE_FRAMEWORK) else {
        return AnalysisRoute::Standard;
    };

    let by_role = assessment.role == FrameworkRole::Primary;
    let by_confidence = assessment.confidence >= config.min_confidence;
    let by_mentions = config
        .min_mentions
        .is_some_and(|minimum| assessment.total_occurrences >= minimum);

    if by_role || by_confidence || by_mentions {
        AnalysisRoute::SpecializedPrimary
    } else {
        AnalysisRoute::SpecializedSecondary
    }
}

/// Splits `detection_text` with the detection budget and classifies the
/// covered prefix once, so overlap is never counted twice.
pub fn detect_frameworks(
    classifier: &FrameworkClassifier,
    detection: &ChunkerConfig,
    detection_text: &str,
) -> (DetectionReport, SplitOutcome) {
    let split = ChunkSplitter::new(detection.clone()).split(detection_text);
    let report = classifier.classify(&detection_text[..split.covered_end()]);
    (report, split)
}

/// What the router produced for one document.
#[derive(Debug, Clone, Serialize)]
pub struct RouterOutput {
    pub detection: DetectionReport,
    pub detection_chunks: usize,
    pub route: AnalysisRoute,
    pub analysis_chunks: usize,
    pub analysis_truncated: bool,
    pub chunk_results: Vec<ChunkResult>,
    pub aggregated: AggregatedReport,
    pub degradations: Vec<Degradation>,
}

pub struct AnalysisRouter<'a> {
    config: &'a EngineConfig,
    analyzer: &'a dyn ChunkAnalyzer,
    state: RouterState,
    detection: Option<DetectionReport>,
    detection_chunks: usize,
    route: Option<AnalysisRoute>,
    split: Option<SplitOutcome>,
    chunk_results: Vec<ChunkResult>,
    degradations: Vec<Degradation>,
}

impl<'a> AnalysisRouter<'a> {
    pub fn new(config: &'a EngineConfig, analyzer: &'a dyn ChunkAnalyzer) -> Self {
        Self {
            config,
            analyzer,
            state: RouterState::Init,
            detection: None,
            detection_chunks: 0,
            route: None,
            split: None,
            chunk_results: Vec::new(),
            degradations: Vec::new(),
        }
    }

    pub fn state(&self) -> RouterState {
        self.state
    }

    pub fn route(&self) -> Option<AnalysisRoute> {
        self.route
    }

    /// Classifies the detection text once, over the prefix the detection
    /// chunks cover.
    pub fn assess_frameworks(
        &mut self,
        classifier: &FrameworkClassifier,
        detection_text: &str,
    ) -> Result<&DetectionReport> {
        self.advance(RouterState::Init, RouterState::FrameworksAssessed)?;

        let (report, split) = detect_frameworks(classifier, &self.config.detection, detection_text);
        self.detection_chunks = split.chunks.len();
        self.degradations.extend(split.degradations);

        if report.is_empty() {
            info!("no framework evidence in detection text");
            self.degradations.push(Degradation::NoFrameworkEvidence);
        }

        info!(
            detection_chunks = self.detection_chunks,
            detection_truncated = split.truncated,
            frameworks = report.assessments.len(),
            "assessed frameworks"
        );
        Ok(self.detection.insert(report))
    }

    pub fn choose_route(&mut self) -> Result<AnalysisRoute> {
        self.advance(RouterState::FrameworksAssessed, RouterState::RouteChosen)?;

        let Some(detection) = self.detection.as_ref() else {
            bail!("framework assessment missing at route selection");
        };
        let route = choose_route(detection, &self.config.route);

        let focus = detection.get(ROUTE_FRAMEWORK);
        info!(
            route = route.as_str(),
            framework = ROUTE_FRAMEWORK.as_str(),
            confidence = focus.map(|assessment| assessment.confidence).unwrap_or(0),
            role = focus.map(|assessment| assessment.role.as_str()).unwrap_or("absent"),
            mentions = focus.map(|assessment| assessment.total_occurrences).unwrap_or(0),
            "route chosen"
        );
        self.route = Some(route);
        Ok(route)
    }

    /// Splits the full document with the analysis budget and runs every
    /// chunk through the route's stages on the worker pool.
    pub fn dispatch(&mut self, document_text: &str) -> Result<&[ChunkResult]> {
        self.advance(RouterState::RouteChosen, RouterState::ChunksDispatched)?;

        let Some(route) = self.route else {
            bail!("route missing at dispatch");
        };

        let config = self.config;
        let split = ChunkSplitter::new(config.analysis.clone()).split(document_text);
        self.degradations.extend(split.degradations.iter().cloned());
        if split.truncated {
            warn!(
                max_chunks = config.analysis.max_chunks,
                covered_bytes = split.covered_end(),
                total_bytes = document_text.len(),
                "analysis chunk cap reached; document tail not analyzed"
            );
        }

        let chunk_count = split.chunks.len();
        let analyzer = self.analyzer;
        let retry = &config.dispatch.retry;
        info!(
            route = route.as_str(),
            chunks = chunk_count,
            workers = config.dispatch.workers,
            analyzer = analyzer.name(),
            "dispatching chunks"
        );

        let results = fan_out(&split.chunks, config.dispatch.workers, |_, chunk| {
            run_chunk(analyzer, route, chunk, chunk_count, retry)
        })?;

        for result in &results {
            if let ChunkOutcome::Failed { stage, reason } = &result.outcome {
                self.degradations.push(Degradation::ChunkAnalysisFailure {
                    chunk_index: result.chunk_index,
                    stage: stage.clone(),
                    reason: reason.clone(),
                });
            }
        }

        self.split = Some(split);
        self.chunk_results = results;
        Ok(&self.chunk_results)
    }

    pub fn aggregate(mut self) -> Result<RouterOutput> {
        self.advance(RouterState::ChunksDispatched, RouterState::Aggregated)?;

        let (Some(detection), Some(route), Some(split)) =
            (self.detection.take(), self.route, self.split.take())
        else {
            bail!("router reached aggregation without assessment, route, or chunks");
        };

        let aggregated = aggregate(&self.chunk_results);
        info!(
            chunks = aggregated.chunk_count,
            completed = aggregated.completed_chunks,
            failed = aggregated.failed_chunks.len(),
            "aggregated chunk results"
        );

        Ok(RouterOutput {
            detection,
            detection_chunks: self.detection_chunks,
            route,
            analysis_chunks: split.chunks.len(),
            analysis_truncated: split.truncated,
            chunk_results: self.chunk_results,
            aggregated,
            degradations: self.degradations,
        })
    }

    /// All four transitions in order.
    pub fn run(
        mut self,
        classifier: &FrameworkClassifier,
        detection_text: &str,
        document_text: &str,
    ) -> Result<RouterOutput> {
        self.assess_frameworks(classifier, detection_text)?;
        self.choose_route()?;
        self.dispatch(document_text)?;
        self.aggregate()
    }

    fn advance(&mut self, expected: RouterState, next: RouterState) -> Result<()> {
        if self.state != expected {
            bail!(
                "router cannot move to {} from {} (expected {})",
                next.as_str(),
                self.state.as_str(),
                expected.as_str()
            );
        }
        self.state = next;
        Ok(())
    }
}
