use std::io::{self, Write};

use anyhow::{Context, Result};
use tracing::{info, warn};

use greenscan::engine::{DetectionSummary, Engine};

use crate::cli::DetectArgs;
use crate::commands::shared::{load_config, load_input};

pub fn run(args: DetectArgs) -> Result<()> {
    let config = load_config(&args.input)?;
    let loaded = load_input(&args.input, config)?;
    let engine = Engine::new(&loaded.config)?.with_ocr(loaded.ocr());

    let summary = engine.detect(&loaded.document)?;
    for degradation in &summary.degradations {
        warn!(kind = degradation.as_str(), detail = ?degradation, "degraded during detection");
    }
    info!(
        frameworks = summary.detection.assessments.len(),
        mentions = summary.detection.total_occurrences(),
        detection_chunks = summary.detection_chunks,
        route = summary.route.as_str(),
        "detection finished"
    );

    if args.json {
        let mut output = io::BufWriter::new(io::stdout().lock());
        serde_json::to_writer_pretty(&mut output, &summary)
            .context("failed to serialize detection json output")?;
        writeln!(output)?;
        output.flush()?;
        return Ok(());
    }

    write_text_summary(&summary)
}

fn write_text_summary(summary: &DetectionSummary) -> Result<()> {
    let mut output = io::BufWriter::new(io::stdout().lock());

    writeln!(output, "Document: {}", summary.document.source)?;
    writeln!(
        output,
        "Route: {} (sections={} detection_chunks={})",
        summary.route.as_str(),
        summary.prioritization.sections.len(),
        summary.detection_chunks,
    )?;
    writeln!(output, "Frameworks: {}", summary.detection.assessments.len())?;

    for assessment in &summary.detection.assessments {
        writeln!(
            output,
            "{} ({}) confidence={} role={} mentions={} relevant={} strength={}",
            assessment.framework,
            assessment.full_name,
            assessment.confidence,
            assessment.role.as_str(),
            assessment.total_occurrences,
            assessment.relevant_occurrences,
            assessment.strength,
        )?;
        writeln!(
            output,
            "\tevidence: primary={} secondary={} compliance={}",
            assessment.evidence.primary, assessment.evidence.secondary, assessment.evidence.compliance,
        )?;
        if !assessment.disclosure_refs.is_empty() {
            writeln!(output, "\tdisclosures: {}", assessment.disclosure_refs.join(", "))?;
        }
    }

    if !summary.degradations.is_empty() {
        let kinds = summary
            .degradations
            .iter()
            .map(|degradation| degradation.as_str())
            .collect::<Vec<_>>();
        writeln!(output, "Degradations: {}", kinds.join(","))?;
    }

    output.flush()?;
    Ok(())
}
