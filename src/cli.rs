use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use greenscan::config::OcrMode;

#[derive(Parser, Debug)]
#[command(
    name = "greenscan",
    version,
    about = "Framework-disclosure detection and chunked analysis for sustainability reports"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    Sections(SectionsArgs),
    Detect(DetectArgs),
    Analyze(AnalyzeArgs),
}

/// Flags shared by every command. Unset flags leave the config file value alone.
#[derive(Args, Debug, Clone)]
pub struct InputArgs {
    #[arg(long)]
    pub input: PathBuf,

    #[arg(long)]
    pub config: Option<PathBuf>,

    #[arg(long, value_enum)]
    pub ocr_mode: Option<OcrMode>,

    #[arg(long)]
    pub ocr_lang: Option<String>,

    #[arg(long)]
    pub ocr_min_text_chars: Option<usize>,

    #[arg(long)]
    pub max_pages: Option<usize>,
}

#[derive(Args, Debug, Clone)]
pub struct SectionsArgs {
    #[command(flatten)]
    pub input: InputArgs,

    #[arg(long, default_value_t = false)]
    pub json: bool,
}

#[derive(Args, Debug, Clone)]
pub struct DetectArgs {
    #[command(flatten)]
    pub input: InputArgs,

    #[arg(long, default_value_t = false)]
    pub json: bool,
}

#[derive(Args, Debug, Clone)]
pub struct AnalyzeArgs {
    #[command(flatten)]
    pub input: InputArgs,

    #[arg(long, default_value = ".cache/greenscan")]
    pub output_dir: PathBuf,

    /// Program run once per stage call; without it the offline dry-run analyzer is used.
    #[arg(long)]
    pub analyzer_cmd: Option<PathBuf>,

    #[arg(long = "analyzer-arg", allow_hyphen_values = true)]
    pub analyzer_args: Vec<String>,

    #[arg(long)]
    pub analyzer_timeout_secs: Option<u64>,

    #[arg(long)]
    pub workers: Option<usize>,

    #[arg(long)]
    pub retries: Option<u8>,

    #[arg(long)]
    pub backoff_ms: Option<u64>,
}
