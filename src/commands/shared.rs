use anyhow::{Context, Result, bail};
use tracing::info;

use greenscan::config::EngineConfig;
use greenscan::extract::{OcrEngine, TesseractOcr, extractor_for, ocr_for};
use greenscan::model::Document;

use crate::cli::InputArgs;

pub struct LoadedInput {
    pub config: EngineConfig,
    pub document: Document,
    ocr: Option<TesseractOcr>,
}

impl LoadedInput {
    pub fn ocr(&self) -> Option<&dyn OcrEngine> {
        self.ocr.as_ref().map(|ocr| ocr as &dyn OcrEngine)
    }
}

/// Defaults, then the `--config` file, then explicit flags.
pub fn load_config(args: &InputArgs) -> Result<EngineConfig> {
    let mut config = match &args.config {
        Some(path) => EngineConfig::load(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => EngineConfig::default(),
    };

    if let Some(mode) = args.ocr_mode {
        config.extraction.ocr_mode = mode;
    }
    if let Some(lang) = &args.ocr_lang {
        config.extraction.ocr_lang = lang.clone();
    }
    if let Some(min_chars) = args.ocr_min_text_chars {
        config.extraction.ocr_min_text_chars = min_chars;
    }
    if args.max_pages.is_some() {
        config.extraction.max_pages = args.max_pages;
    }

    Ok(config)
}

pub fn load_input(args: &InputArgs, config: EngineConfig) -> Result<LoadedInput> {
    let path = &args.input;
    if !path.is_file() {
        bail!("input document not found: {}", path.display());
    }

    let extractor = extractor_for(path, &config.extraction);
    let document = extractor
        .extract(path)
        .with_context(|| format!("failed to extract text from {}", path.display()))?;
    let ocr = ocr_for(path, &config.extraction);

    info!(
        input = %path.display(),
        extractor = extractor.name(),
        pages = document.page_count(),
        ocr_mode = config.extraction.ocr_mode.as_str(),
        "document loaded"
    );

    Ok(LoadedInput {
        config,
        document,
        ocr,
    })
}
