//! Chunk summarization
//!
//! The external service sits behind the [`Summarizer`] trait. A
//! [`SummarizationSession`] drives it for one run: transient failures degrade
//! a single chunk to "unavailable", a permanent failure is reported once and
//! switches summarization off for the rest of the run.

use std::thread;
use std::time::Duration;
use thiserror::Error;

pub mod openai;

pub use openai::OpenAiSummarizer;

use crate::domain::{ChunkSummary, FileSummary, TextChunk};

/// Where a chunk sits, passed along with its text.
#[derive(Debug, Clone, Copy)]
pub struct SummaryContext<'a> {
    pub project: &'a str,
    pub filename: &'a str,
    pub chunk_index: usize,
    pub total_chunks: usize,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SummarizeError {
    /// Timeouts, rate limits, server errors: worth retrying later
    #[error("transient summarizer failure: {0}")]
    Transient(String),

    /// Bad credentials or a rejected request: retrying will not help
    #[error("summarizer unavailable: {0}")]
    Permanent(String),
}

impl SummarizeError {
    pub fn is_permanent(&self) -> bool {
        matches!(self, SummarizeError::Permanent(_))
    }
}

/// Capability to turn one chunk into a short summary.
pub trait Summarizer {
    fn summarize(
        &self,
        chunk: &TextChunk,
        context: &SummaryContext<'_>,
    ) -> Result<String, SummarizeError>;
}

/// Why a file was not summarized.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// A permanent failure switched summarization off
    Disabled,
    /// The per-run file cap was reached
    FileLimit,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileOutcome {
    Summarized(FileSummary),
    Skipped(SkipReason),
}

/// Per-run driver around a [`Summarizer`].
pub struct SummarizationSession<'a> {
    summarizer: &'a dyn Summarizer,
    project: String,
    delay: Duration,
    max_files: usize,
    files_started: usize,
    requests_sent: usize,
    disabled: Option<String>,
    limit_logged: bool,
}

impl<'a> SummarizationSession<'a> {
    pub fn new(summarizer: &'a dyn Summarizer, project: impl Into<String>) -> Self {
        Self {
            summarizer,
            project: project.into(),
            delay: Duration::ZERO,
            max_files: usize::MAX,
            files_started: 0,
            requests_sent: 0,
            disabled: None,
            limit_logged: false,
        }
    }

    /// Pause between consecutive requests.
    pub fn request_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn max_files(mut self, max_files: usize) -> Self {
        self.max_files = max_files;
        self
    }

    /// The permanent-failure diagnostic, if summarization was switched off.
    pub fn disabled_reason(&self) -> Option<&str> {
        self.disabled.as_deref()
    }

    pub fn files_started(&self) -> usize {
        self.files_started
    }

    /// Whether another file would be sent to the summarizer.
    pub fn is_available(&self) -> bool {
        self.disabled.is_none() && self.files_started < self.max_files
    }

    /// Summarize every chunk of one file, in order and independently.
    pub fn summarize_file(&mut self, filename: &str, chunks: &[TextChunk]) -> FileOutcome {
        if self.disabled.is_some() {
            return FileOutcome::Skipped(SkipReason::Disabled);
        }
        if self.files_started >= self.max_files {
            if !self.limit_logged {
                tracing::warn!(
                    max_files = self.max_files,
                    "file summary limit reached; remaining large files are truncated"
                );
                self.limit_logged = true;
            }
            return FileOutcome::Skipped(SkipReason::FileLimit);
        }
        self.files_started += 1;

        let total_chunks = chunks.len();
        let mut parts = Vec::with_capacity(total_chunks);
        for chunk in chunks {
            if self.requests_sent > 0 && !self.delay.is_zero() {
                thread::sleep(self.delay);
            }
            self.requests_sent += 1;

            let context = SummaryContext {
                project: &self.project,
                filename,
                chunk_index: chunk.index,
                total_chunks,
            };
            let text = match self.summarizer.summarize(chunk, &context) {
                Ok(text) => Some(text),
                Err(SummarizeError::Transient(reason)) => {
                    tracing::warn!(
                        file = filename,
                        chunk = chunk.index + 1,
                        total = total_chunks,
                        %reason,
                        "chunk summary unavailable"
                    );
                    None
                }
                Err(SummarizeError::Permanent(reason)) => {
                    tracing::error!(%reason, "summarization disabled for the rest of this run");
                    self.disabled = Some(reason);
                    return FileOutcome::Skipped(SkipReason::Disabled);
                }
            };
            parts.push(ChunkSummary { chunk_id: chunk.id.clone(), index: chunk.index, text });
        }

        FileOutcome::Summarized(FileSummary { parts })
    }
}
