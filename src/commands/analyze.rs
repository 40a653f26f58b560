use std::time::Duration;

use anyhow::Result;
use tracing::{info, warn};

use greenscan::analysis::{ChunkAnalyzer, CommandAnalyzer, DryRunAnalyzer};
use greenscan::config::EngineConfig;
use greenscan::engine::Engine;
use greenscan::util::{ensure_directory, write_json_pretty, write_text};

use crate::cli::AnalyzeArgs;
use crate::commands::shared::{load_config, load_input};

pub fn run(args: AnalyzeArgs) -> Result<()> {
    let mut config = load_config(&args.input)?;
    apply_dispatch_overrides(&args, &mut config);
    ensure_directory(&args.output_dir)?;

    let loaded = load_input(&args.input, config)?;
    let analyzer = build_analyzer(&args)?;
    let engine = Engine::new(&loaded.config)?.with_ocr(loaded.ocr());

    let report = engine.analyze(&loaded.document, analyzer.as_ref())?;
    for degradation in &report.degradations {
        warn!(kind = degradation.as_str(), detail = ?degradation, "degraded during analysis");
    }

    let json_path = args.output_dir.join(format!("report_{}.json", report.run_id));
    let text_path = args.output_dir.join(format!("report_{}.txt", report.run_id));
    write_json_pretty(&json_path, &report)?;
    write_text(&text_path, &report.report_text)?;

    info!(
        run_id = %report.run_id,
        route = report.route.as_str(),
        analyzer = %report.analyzer,
        chunks = report.analysis_chunks,
        failed_chunks = report.failed_chunks.len(),
        truncated = report.analysis_truncated,
        report_json = %json_path.display(),
        report_text = %text_path.display(),
        "analysis report written"
    );

    Ok(())
}

fn apply_dispatch_overrides(args: &AnalyzeArgs, config: &mut EngineConfig) {
    if let Some(workers) = args.workers {
        config.dispatch.workers = workers;
    }
    if let Some(retries) = args.retries {
        if retries > 1 {
            warn!(requested = retries, "at most one retry per stage call; clamping");
        }
        config.dispatch.retry.max_retries = retries.min(1);
    }
    if let Some(backoff_ms) = args.backoff_ms {
        config.dispatch.retry.backoff_ms = backoff_ms;
    }
}

fn build_analyzer(args: &AnalyzeArgs) -> Result<Box<dyn ChunkAnalyzer>> {
    let Some(program) = &args.analyzer_cmd else {
        info!("no analyzer command configured; using dry-run analyzer");
        return Ok(Box::new(DryRunAnalyzer::new()?));
    };

    let timeout = args.analyzer_timeout_secs.map(Duration::from_secs);
    info!(
        program = %program.display(),
        args = args.analyzer_args.len(),
        timeout_secs = args.analyzer_timeout_secs.unwrap_or(0),
        "using command analyzer"
    );
    Ok(Box::new(
        CommandAnalyzer::new(program.clone(), args.analyzer_args.clone()).with_timeout(timeout),
    ))
}
