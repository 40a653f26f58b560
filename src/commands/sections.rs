use std::io::{self, Write};

use anyhow::{Context, Result};
use tracing::{info, warn};

use greenscan::engine::Engine;
use greenscan::sections::{Prioritization, Relevance, SectionSpan, reason_label};

use crate::cli::SectionsArgs;
use crate::commands::shared::{load_config, load_input};

pub fn run(args: SectionsArgs) -> Result<()> {
    let config = load_config(&args.input)?;
    let loaded = load_input(&args.input, config)?;
    let engine = Engine::new(&loaded.config)?.with_ocr(loaded.ocr());

    let prioritization = engine.prioritize(&loaded.document)?;
    for degradation in &prioritization.degradations {
        warn!(kind = degradation.as_str(), detail = ?degradation, "degraded while prioritizing");
    }
    info!(
        sections = prioritization.sections.len(),
        toc_entries = prioritization.toc_entries,
        ocr_pages_replaced = prioritization.ocr_pages_replaced.len(),
        "sections prioritized"
    );

    if args.json {
        let mut output = io::BufWriter::new(io::stdout().lock());
        serde_json::to_writer_pretty(&mut output, &prioritization)
            .context("failed to serialize sections json output")?;
        writeln!(output)?;
        output.flush()?;
        return Ok(());
    }

    write_text_sections(&prioritization)
}

fn write_text_sections(prioritization: &Prioritization) -> Result<()> {
    let mut output = io::BufWriter::new(io::stdout().lock());

    writeln!(
        output,
        "Sections: {} (toc_entries={} printed_page_offset={} ocr_pages_replaced={} degradations={})",
        prioritization.sections.len(),
        prioritization.toc_entries,
        prioritization
            .printed_page_offset
            .map(|offset| offset.to_string())
            .unwrap_or_else(|| "none".to_string()),
        prioritization.ocr_pages_replaced.len(),
        prioritization.degradations.len(),
    )?;

    for (index, section) in prioritization.sections.iter().enumerate() {
        let relevance = match section.relevance {
            Relevance::High => "high",
            Relevance::Medium => "medium",
        };
        let span = match section.span {
            SectionSpan::Pages { first, last } => format!("pages {first}-{last}"),
            SectionSpan::Chars { start, end } => format!("chars {start}-{end}"),
        };
        writeln!(
            output,
            "{}. {} [{}] relevance={} reason={}",
            index + 1,
            section.title,
            span,
            relevance,
            reason_label(section.reason),
        )?;
        if let Some(term) = &section.matched_term {
            writeln!(output, "\tmatched_term: {term}")?;
        }
        writeln!(output, "\tchars: {}", section.text.chars().count())?;
    }

    output.flush()?;
    Ok(())
}
