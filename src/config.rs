use std::fs;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Single characters-per-token approximation used by every chunking call site.
pub const DEFAULT_CHARS_PER_TOKEN: f64 = 4.0;

pub const DEFAULT_OCR_MIN_TEXT_CHARS: usize = 120;
pub const DEFAULT_TOC_SCAN_PAGES: usize = 10;

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum OcrMode {
    Off,
    #[default]
    Auto,
    Force,
}

impl OcrMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Off => "off",
            Self::Auto => "auto",
            Self::Force => "force",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    pub ocr_mode: OcrMode,
    pub ocr_lang: String,
    /// Pages with fewer non-whitespace characters are treated as image-only.
    pub ocr_min_text_chars: usize,
    pub toc_scan_pages: usize,
    pub max_pages: Option<usize>,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            ocr_mode: OcrMode::Auto,
            ocr_lang: "eng".to_string(),
            ocr_min_text_chars: DEFAULT_OCR_MIN_TEXT_CHARS,
            toc_scan_pages: DEFAULT_TOC_SCAN_PAGES,
            max_pages: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkerConfig {
    pub token_budget: usize,
    pub chars_per_token: f64,
    pub overlap_chars: usize,
    pub max_chunks: usize,
    /// How far back from the window end a sentence terminal is searched for.
    pub lookback_chars: usize,
}

impl ChunkerConfig {
    pub fn detection() -> Self {
        Self {
            token_budget: 2_000,
            chars_per_token: DEFAULT_CHARS_PER_TOKEN,
            overlap_chars: 200,
            max_chunks: 10,
            lookback_chars: 300,
        }
    }

    pub fn analysis() -> Self {
        Self {
            token_budget: 6_000,
            chars_per_token: DEFAULT_CHARS_PER_TOKEN,
            overlap_chars: 500,
            max_chunks: 20,
            lookback_chars: 500,
        }
    }

    pub fn char_budget(&self) -> usize {
        let ratio = if self.chars_per_token.is_finite() && self.chars_per_token > 0.0 {
            self.chars_per_token
        } else {
            DEFAULT_CHARS_PER_TOKEN
        };
        ((self.token_budget as f64) * ratio).floor().max(1.0) as usize
    }

    pub fn estimate_tokens(&self, char_count: usize) -> usize {
        let ratio = if self.chars_per_token.is_finite() && self.chars_per_token > 0.0 {
            self.chars_per_token
        } else {
            DEFAULT_CHARS_PER_TOKEN
        };
        ((char_count as f64) / ratio).ceil() as usize
    }
}

impl Default for ChunkerConfig {
    fn default() -> Self {
        Self::analysis()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RouteConfig {
    pub min_confidence: u8,
    /// `None` disables the raw-mention trigger.
    pub min_mentions: Option<usize>,
}

impl Default for RouteConfig {
    fn default() -> Self {
        Self {
            min_confidence: 70,
            min_mentions: Some(2),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Clamped to at most one retry per call.
    pub max_retries: u8,
    pub backoff_ms: u64,
}

impl RetryPolicy {
    pub fn retries(&self) -> u8 {
        self.max_retries.min(1)
    }

    pub fn backoff(&self) -> Duration {
        Duration::from_millis(self.backoff_ms)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 1,
            backoff_ms: 500,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatchConfig {
    pub workers: usize,
    pub retry: RetryPolicy,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            workers: 4,
            retry: RetryPolicy::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub extraction: ExtractionConfig,
    pub detection: ChunkerConfig,
    pub analysis: ChunkerConfig,
    pub route: RouteConfig,
    pub dispatch: DispatchConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            extraction: ExtractionConfig::default(),
            detection: ChunkerConfig::detection(),
            analysis: ChunkerConfig::analysis(),
            route: RouteConfig::default(),
            dispatch: DispatchConfig::default(),
        }
    }
}

impl EngineConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
        let config: EngineConfig = serde_json::from_slice(&raw)
            .with_context(|| format!("failed to parse {}", path.display()))?;
        Ok(config)
    }
}
