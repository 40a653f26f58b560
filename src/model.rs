use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentMetadata {
    pub source: String,
    pub sha256: String,
    pub extractor: String,
    pub page_count: usize,
}

/// Extracted content of one input file. Immutable once built.
#[derive(Debug, Clone)]
pub struct Document {
    pub metadata: DocumentMetadata,
    pub text: String,
    /// Physical page order; an unreadable page is an empty string.
    pub pages: Option<Vec<String>>,
    pub native_toc: Option<Vec<TocEntry>>,
}

impl Document {
    pub fn from_pages(metadata: DocumentMetadata, pages: Vec<String>) -> Self {
        let text = pages.join("\n");
        Self {
            metadata: DocumentMetadata {
                page_count: pages.len(),
                ..metadata
            },
            text,
            pages: Some(pages),
            native_toc: None,
        }
    }

    pub fn with_native_toc(mut self, toc: Option<Vec<TocEntry>>) -> Self {
        self.native_toc = toc.filter(|entries| !entries.is_empty());
        self
    }

    pub fn page_count(&self) -> usize {
        self.pages.as_ref().map(Vec::len).unwrap_or(0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TocSource {
    Bookmark,
    DotLeader,
    NumberedHeading,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TocEntry {
    pub title: String,
    /// 1-based page the entry points to (or was found on).
    pub page: Option<usize>,
    pub source: TocSource,
}

/// A failure local to one page, chunk, or framework that did not abort the run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Degradation {
    ExtractionFailure { page: Option<usize>, reason: String },
    OcrFailure { page: usize, reason: String },
    SplitBudgetExceeded { chunk_index: usize, char_budget: usize },
    ChunkAnalysisFailure { chunk_index: usize, stage: String, reason: String },
    NoFrameworkEvidence,
}

impl Degradation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ExtractionFailure { .. } => "extraction_failure",
            Self::OcrFailure { .. } => "ocr_failure",
            Self::SplitBudgetExceeded { .. } => "split_budget_exceeded",
            Self::ChunkAnalysisFailure { .. } => "chunk_analysis_failure",
            Self::NoFrameworkEvidence => "no_framework_evidence",
        }
    }
}
