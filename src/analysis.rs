//! The per-chunk analysis collaborator.
//!
//! The engine only sees the returned text or an error; what the analyzer does
//! with a request (model calls, prompts, scoring) stays behind the trait.

use std::io::{self, ErrorKind, Read, Write};
use std::path::PathBuf;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use anyhow::Result;
use serde::Serialize;
use thiserror::Error;

use crate::frameworks::FrameworkClassifier;
use crate::router::{AnalysisRoute, Stage};

const POLL_INTERVAL: Duration = Duration::from_millis(25);

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AnalysisError {
    #[error("analysis failed: {0}")]
    Failed(String),
    #[error("analysis timed out after {0:?}")]
    TimedOut(Duration),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StageOutput {
    pub stage: Stage,
    pub text: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct AnalysisRequest<'a> {
    pub route: AnalysisRoute,
    pub stage: Stage,
    pub chunk_index: usize,
    pub chunk_count: usize,
    pub chunk_text: &'a str,
    /// Outputs of the earlier stages for the same chunk, in order.
    pub prior_outputs: &'a [StageOutput],
}

pub trait ChunkAnalyzer: Send + Sync {
    fn name(&self) -> &str;

    fn analyze(&self, request: &AnalysisRequest<'_>) -> Result<String, AnalysisError>;
}

/// Runs an external program per call: request JSON on stdin, result text on
/// stdout. A non-zero exit or empty output is a failure.
#[derive(Debug, Clone)]
pub struct CommandAnalyzer {
    program: PathBuf,
    args: Vec<String>,
    timeout: Option<Duration>,
}

impl CommandAnalyzer {
    pub fn new(program: impl Into<PathBuf>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
            timeout: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    fn spawn(&self, request: &AnalysisRequest<'_>) -> Result<Child, AnalysisError> {
        Command::new(&self.program)
            .args(&self.args)
            .env("GREENSCAN_ROUTE", request.route.as_str())
            .env("GREENSCAN_STAGE", request.stage.label())
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|error| {
                AnalysisError::Failed(format!(
                    "failed to start {}: {error}",
                    self.program.display()
                ))
            })
    }

    fn wait(&self, child: &mut Child) -> Result<ExitStatus, AnalysisError> {
        let Some(limit) = self.timeout else {
            return child
                .wait()
                .map_err(|error| AnalysisError::Failed(format!("failed to wait for analyzer: {error}")));
        };

        let started = Instant::now();
        loop {
            match child.try_wait() {
                Ok(Some(status)) => return Ok(status),
                Ok(None) if started.elapsed() >= limit => {
                    let _ = child.kill();
                    let _ = child.wait();
                    return Err(AnalysisError::TimedOut(limit));
                }
                Ok(None) => thread::sleep(POLL_INTERVAL),
                Err(error) => {
                    return Err(AnalysisError::Failed(format!(
                        "failed to poll analyzer: {error}"
                    )));
                }
            }
        }
    }
}

impl ChunkAnalyzer for CommandAnalyzer {
    fn name(&self) -> &str {
        "command"
    }

    fn analyze(&self, request: &AnalysisRequest<'_>) -> Result<String, AnalysisError> {
        let payload = serde_json::to_vec(request)
            .map_err(|error| AnalysisError::Failed(format!("failed to encode request: {error}")))?;

        let mut child = self.spawn(request)?;
        let stdin = child.stdin.take();
        let stdout = child.stdout.take();
        let stderr = child.stderr.take();

        // All three pipes are serviced off-thread so the deadline in `wait`
        // also covers an analyzer that never drains its stdin.
        let stdin_writer = thread::spawn(move || write_pipe(stdin, &payload));
        let stdout_reader = thread::spawn(move || read_pipe(stdout));
        let stderr_reader = thread::spawn(move || read_pipe(stderr));

        let status = self.wait(&mut child)?;
        let written = stdin_writer.join().unwrap_or(Ok(()));
        let stdout = stdout_reader.join().unwrap_or_default();
        let stderr = stderr_reader.join().unwrap_or_default();

        if !status.success() {
            return Err(AnalysisError::Failed(format!(
                "analyzer exited with {status}: {}",
                stderr.trim()
            )));
        }

        // An analyzer may answer without reading the whole request.
        match written {
            Err(error) if error.kind() != ErrorKind::BrokenPipe => {
                return Err(AnalysisError::Failed(format!(
                    "failed to write request to analyzer: {error}"
                )));
            }
            _ => {}
        }

        let text = stdout.trim();
        if text.is_empty() {
            return Err(AnalysisError::Failed("analyzer produced no output".to_string()));
        }
        Ok(text.to_string())
    }
}

fn write_pipe(pipe: Option<impl Write>, payload: &[u8]) -> io::Result<()> {
    let Some(mut pipe) = pipe else {
        return Ok(());
    };
    pipe.write_all(payload)?;
    pipe.flush()
}

fn read_pipe(pipe: Option<impl Read>) -> String {
    let mut buffer = Vec::<u8>::new();
    if let Some(mut pipe) = pipe {
        let _ = pipe.read_to_end(&mut buffer);
    }
    String::from_utf8_lossy(&buffer).into_owned()
}

/// Offline analyzer producing a deterministic per-stage digest of the chunk.
pub struct DryRunAnalyzer {
    classifier: FrameworkClassifier,
}

impl DryRunAnalyzer {
    pub fn new() -> Result<Self> {
        Ok(Self {
            classifier: FrameworkClassifier::new()?,
        })
    }
}

impl ChunkAnalyzer for DryRunAnalyzer {
    fn name(&self) -> &str {
        "dry_run"
    }

    fn analyze(&self, request: &AnalysisRequest<'_>) -> Result<String, AnalysisError> {
        let sentences = request
            .chunk_text
            .split(['.', '!', '?'])
            .filter(|sentence| !sentence.trim().is_empty())
            .count();

        let mentions = self
            .classifier
            .classify(request.chunk_text)
            .assessments
            .iter()
            .map(|assessment| format!("{} x{}", assessment.framework, assessment.total_occurrences))
            .collect::<Vec<String>>();
        let mentions = if mentions.is_empty() {
            "none".to_string()
        } else {
            mentions.join(", ")
        };

        Ok(format!(
            "[{}] route={} chunk={}/{} chars={} sentences={} prior_stages={} framework_mentions={}",
            request.stage.label(),
            request.route.as_str(),
            request.chunk_index + 1,
            request.chunk_count,
            request.chunk_text.chars().count(),
            sentences,
            request.prior_outputs.len(),
            mentions
        ))
    }
}
