//! Core domain types and models
//!
//! Defines the traversal snapshot (`PathEntry`), chunking and summary types,
//! context entries, run statistics and the layered `Config`.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Kind of a filesystem entry as seen during traversal (symlinks are not followed).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    File,
    Directory,
    Symlink,
}

/// Snapshot of one filesystem entry taken at traversal time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathEntry {
    /// Absolute path to the entry
    pub path: PathBuf,

    /// Path relative to the traversal root, `/`-separated
    pub relative_path: String,

    pub kind: EntryKind,

    /// Size in bytes (0 for directories)
    pub size_bytes: u64,
}

/// Result of sniffing a file's leading bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileClass {
    Text,
    Binary,
    /// The file could not be opened or read; carries the I/O error text.
    Unreadable(String),
}

impl FileClass {
    pub fn label(&self) -> &'static str {
        match self {
            FileClass::Text => "text",
            FileClass::Binary => "binary",
            FileClass::Unreadable(_) => "unreadable",
        }
    }
}

impl fmt::Display for FileClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A contiguous slice of one file's text, bounded by the token budget.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextChunk {
    /// Stable ID derived from path, line span and content
    pub id: String,

    /// Relative path to source file
    pub path: String,

    /// Position of this chunk within its file (0-based)
    pub index: usize,

    /// Starting line number (1-indexed)
    pub start_line: usize,

    /// Ending line number (inclusive)
    pub end_line: usize,

    pub content: String,

    pub token_estimate: usize,
}

/// Summary outcome for a single chunk. `text` is `None` when the summarizer
/// could not produce one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkSummary {
    pub chunk_id: String,
    pub index: usize,
    pub text: Option<String>,
}

/// Chunk summaries of one file, in chunk order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileSummary {
    pub parts: Vec<ChunkSummary>,
}

impl FileSummary {
    pub fn total_chunks(&self) -> usize {
        self.parts.len()
    }

    pub fn summarized_chunks(&self) -> usize {
        self.parts.iter().filter(|p| p.text.is_some()).count()
    }

    /// Join the chunk summaries in order, substituting a placeholder for any
    /// chunk whose summary is unavailable.
    pub fn assemble(&self) -> String {
        let total = self.parts.len();
        let single = total == 1;
        self.parts
            .iter()
            .map(|part| match (&part.text, single) {
                (Some(text), true) => text.trim().to_string(),
                (Some(text), false) => {
                    format!("[part {}/{}] {}", part.index + 1, total, text.trim())
                }
                (None, _) => format!(
                    "[summary unavailable for chunk {}/{}]",
                    part.index + 1,
                    total
                ),
            })
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

/// What the context document shows for a file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContextBody {
    /// Full file content
    Verbatim(String),
    /// Summaries of a chunked file
    Summary(FileSummary),
    /// First chunk of a large file that was not summarized
    Truncated { head: String, omitted_chunks: usize },
    /// Nothing shown; the reason is rendered instead
    Omitted(String),
}

/// One entry of the context document.
#[derive(Debug, Clone)]
pub struct ContextEntry {
    pub relative_path: String,
    pub class: FileClass,
    pub size_bytes: u64,
    pub body: ContextBody,
}

/// Statistics from one collection run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunStats {
    /// Files listed in the context document
    pub files_listed: usize,

    pub files_text: usize,

    pub files_binary: usize,

    pub files_unreadable: usize,

    /// Text files listed without content because of `max_file_bytes`
    #[serde(default)]
    pub files_oversized: usize,

    /// Large files shown as their first chunk only
    #[serde(default)]
    pub files_truncated: usize,

    #[serde(default)]
    pub files_summarized: usize,

    #[serde(default)]
    pub chunks_created: usize,

    #[serde(default)]
    pub chunks_summarized: usize,

    /// Chunks whose summary is replaced by a placeholder
    #[serde(default)]
    pub chunks_unavailable: usize,

    /// Total bytes of files listed
    pub total_bytes: u64,

    /// Estimated tokens of the rendered context document
    #[serde(default)]
    pub total_tokens_estimated: usize,

    /// Directories and files emitted by the tree renderer
    #[serde(default)]
    pub tree_directories: usize,

    #[serde(default)]
    pub tree_files: usize,

    /// Entries the collector could not inspect (walk errors)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub skipped_entries: Vec<String>,

    /// Diagnostic from a permanent summarizer failure, reported once
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summarizer_disabled: Option<String>,
}

/// Settings for the external summarization service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryConfig {
    #[serde(default = "default_model")]
    pub model: String,

    /// Base URL of an OpenAI-compatible API
    #[serde(default = "default_api_base")]
    pub api_base: String,

    /// Name of the environment variable holding the API key
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    /// Maximum number of files summarized per run
    #[serde(default = "default_max_files")]
    pub max_files: usize,

    /// Pause between consecutive requests
    #[serde(default = "default_request_delay_ms")]
    pub request_delay_ms: u64,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    #[serde(default = "default_max_response_tokens")]
    pub max_response_tokens: u32,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for SummaryConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
            api_base: default_api_base(),
            api_key_env: default_api_key_env(),
            max_files: default_max_files(),
            request_delay_ms: default_request_delay_ms(),
            temperature: default_temperature(),
            max_response_tokens: default_max_response_tokens(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Main configuration for tree-context
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Traversal root (defaults to the current directory)
    #[serde(default)]
    pub root: Option<PathBuf>,

    /// Gitignore-style patterns appended after the built-in defaults
    #[serde(default, alias = "exclude")]
    pub exclude_patterns: Vec<String>,

    /// Merge the built-in exclusion set ahead of user patterns
    #[serde(default = "default_true")]
    pub default_excludes: bool,

    /// Load `.gitignore` files and `.git/info/exclude` into the rule set
    #[serde(default = "default_true")]
    pub respect_gitignore: bool,

    #[serde(default = "default_tree_output")]
    pub tree_output: PathBuf,

    #[serde(default = "default_context_output")]
    pub context_output: PathBuf,

    /// Max depth for the rendered tree (unbounded when unset)
    #[serde(default)]
    pub tree_depth: Option<usize>,

    #[serde(default = "default_max_chunk_tokens")]
    pub max_chunk_tokens: usize,

    /// Text files at or above this size are chunked
    #[serde(default = "default_summarize_threshold_bytes")]
    pub summarize_threshold_bytes: u64,

    /// Files above this size are listed but never read
    #[serde(default = "default_max_file_bytes")]
    pub max_file_bytes: u64,

    /// Send large files to the summarization service
    #[serde(default)]
    pub summarize: bool,

    #[serde(default)]
    pub summary: SummaryConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            root: None,
            exclude_patterns: Vec::new(),
            default_excludes: true,
            respect_gitignore: true,
            tree_output: default_tree_output(),
            context_output: default_context_output(),
            tree_depth: None,
            max_chunk_tokens: default_max_chunk_tokens(),
            summarize_threshold_bytes: default_summarize_threshold_bytes(),
            max_file_bytes: default_max_file_bytes(),
            summarize: false,
            summary: SummaryConfig::default(),
        }
    }
}

// Default value functions for serde
fn default_true() -> bool {
    true
}

fn default_tree_output() -> PathBuf {
    PathBuf::from("directory_tree.txt")
}

fn default_context_output() -> PathBuf {
    PathBuf::from("llmcontext.txt")
}

fn default_max_chunk_tokens() -> usize {
    2000
}

fn default_summarize_threshold_bytes() -> u64 {
    16_384
}

fn default_max_file_bytes() -> u64 {
    50 * 1024 * 1024 // 50 MB
}

fn default_model() -> String {
    "gpt-3.5-turbo".to_string()
}

fn default_api_base() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_api_key_env() -> String {
    "OPENAI_API_KEY".to_string()
}

fn default_max_files() -> usize {
    100
}

fn default_request_delay_ms() -> u64 {
    1000
}

fn default_temperature() -> f32 {
    0.3
}

fn default_max_response_tokens() -> u32 {
    250
}

fn default_timeout_secs() -> u64 {
    60
}

#[cfg(test)]
mod tests {
    use super::*;

    fn part(index: usize, text: Option<&str>) -> ChunkSummary {
        ChunkSummary {
            chunk_id: format!("c{index}"),
            index,
            text: text.map(str::to_string),
        }
    }

    #[test]
    fn assemble_keeps_order_and_marks_missing_chunks() {
        let summary = FileSummary {
            parts: vec![part(0, Some("one")), part(1, None), part(2, Some(" three\n"))],
        };
        assert_eq!(
            summary.assemble(),
            "[part 1/3] one\n\n[summary unavailable for chunk 2/3]\n\n[part 3/3] three"
        );
        assert_eq!(summary.summarized_chunks(), 2);
    }

    #[test]
    fn single_chunk_summary_has_no_part_prefix() {
        let summary = FileSummary { parts: vec![part(0, Some("only"))] };
        assert_eq!(summary.assemble(), "only");
    }

    #[test]
    fn config_defaults_match_serde_defaults() {
        let parsed: Config = serde_json::from_str("{}").expect("empty config parses");
        assert_eq!(parsed, Config::default());
        assert_eq!(parsed.max_chunk_tokens, 2000);
        assert!(parsed.default_excludes);
        assert!(!parsed.summarize);
        assert_eq!(parsed.summary.api_key_env, "OPENAI_API_KEY");
    }
}
