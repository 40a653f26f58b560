//! Per-document pipeline: prioritize, detect, route, dispatch, aggregate.

use anyhow::Result;
use chrono::Utc;
use serde::Serialize;
use tracing::info;

use crate::analysis::ChunkAnalyzer;
use crate::config::EngineConfig;
use crate::extract::OcrEngine;
use crate::frameworks::{DetectionReport, FrameworkClassifier};
use crate::model::{Degradation, Document, DocumentMetadata};
use crate::router::{AnalysisRoute, AnalysisRouter, ChunkResult, choose_route, detect_frameworks};
use crate::sections::{Prioritization, SectionPrioritizer};
use crate::util::{now_utc_string, utc_compact_string};

/// Framework verdict without chunk analysis.
#[derive(Debug, Clone, Serialize)]
pub struct DetectionSummary {
    pub document: DocumentMetadata,
    pub prioritization: Prioritization,
    pub detection: DetectionReport,
    pub detection_chunks: usize,
    pub route: AnalysisRoute,
    pub degradations: Vec<Degradation>,
}

/// Everything a caller needs to render or persist one analysis run.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineReport {
    pub run_id: String,
    pub generated_at: String,
    pub document: DocumentMetadata,
    pub config: EngineConfig,
    pub analyzer: String,
    pub prioritization: Prioritization,
    pub detection: DetectionReport,
    pub detection_chunks: usize,
    pub route: AnalysisRoute,
    pub analysis_chunks: usize,
    pub analysis_truncated: bool,
    pub chunk_results: Vec<ChunkResult>,
    pub failed_chunks: Vec<usize>,
    pub report_text: String,
    pub degradations: Vec<Degradation>,
}

pub struct Engine<'a> {
    config: &'a EngineConfig,
    ocr: Option<&'a dyn OcrEngine>,
    classifier: FrameworkClassifier,
}

impl<'a> Engine<'a> {
    pub fn new(config: &'a EngineConfig) -> Result<Self> {
        Ok(Self {
            config,
            ocr: None,
            classifier: FrameworkClassifier::new()?,
        })
    }

    pub fn with_ocr(mut self, ocr: Option<&'a dyn OcrEngine>) -> Self {
        self.ocr = ocr;
        self
    }

    pub fn prioritize(&self, document: &Document) -> Result<Prioritization> {
        let mut prioritizer = SectionPrioritizer::new(&self.config.extraction)?;
        if let Some(ocr) = self.ocr {
            prioritizer = prioritizer.with_ocr(ocr);
        }
        Ok(prioritizer.prioritize(document))
    }

    pub fn detect(&self, document: &Document) -> Result<DetectionSummary> {
        let prioritization = self.prioritize(document)?;
        let (detection, split) = detect_frameworks(
            &self.classifier,
            &self.config.detection,
            &prioritization.joined_text(),
        );
        let route = choose_route(&detection, &self.config.route);

        let mut degradations = prioritization.degradations.clone();
        degradations.extend(split.degradations);
        if detection.is_empty() {
            degradations.push(Degradation::NoFrameworkEvidence);
        }

        Ok(DetectionSummary {
            document: document.metadata.clone(),
            prioritization,
            detection,
            detection_chunks: split.chunks.len(),
            route,
            degradations,
        })
    }

    pub fn analyze(&self, document: &Document, analyzer: &dyn ChunkAnalyzer) -> Result<PipelineReport> {
        let started = Utc::now();
        let run_id = format!("run-{}", utc_compact_string(started));
        info!(run_id = %run_id, source = %document.metadata.source, "analysis started");

        let prioritization = self.prioritize(document)?;
        let output = AnalysisRouter::new(self.config, analyzer).run(
            &self.classifier,
            &prioritization.joined_text(),
            &prioritization.full_text(),
        )?;

        let mut degradations = prioritization.degradations.clone();
        degradations.extend(output.degradations);

        info!(
            run_id = %run_id,
            route = output.route.as_str(),
            chunks = output.analysis_chunks,
            failed_chunks = output.aggregated.failed_chunks.len(),
            degradations = degradations.len(),
            "analysis finished"
        );

        Ok(PipelineReport {
            run_id,
            generated_at: now_utc_string(),
            document: document.metadata.clone(),
            config: self.config.clone(),
            analyzer: analyzer.name().to_string(),
            prioritization,
            detection: output.detection,
            detection_chunks: output.detection_chunks,
            route: output.route,
            analysis_chunks: output.analysis_chunks,
            analysis_truncated: output.analysis_truncated,
            chunk_results: output.chunk_results,
            failed_chunks: output.aggregated.failed_chunks,
            report_text: output.aggregated.text,
            degradations,
        })
    }
}
