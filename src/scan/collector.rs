//! Context collection: walk the root, classify files, chunk and summarize
//! large text files.

use std::path::Path;

use indicatif::ProgressBar;
use walkdir::{DirEntry, WalkDir};

use super::{compare_siblings, validate_root, ContextError};
use crate::chunk::chunk_content;
use crate::domain::{
    Config, ContextBody, ContextEntry, EntryKind, FileClass, PathEntry, RunStats, TextChunk,
};
use crate::filter::{IgnoreRuleSet, IgnoreScope};
use crate::summarize::{FileOutcome, SummarizationSession};
use crate::utils::{classify_file, format_with_commas, read_file_safe, relative_path};

/// Entries of the context document, in traversal order, plus statistics.
#[derive(Debug, Clone, Default)]
pub struct Collection {
    pub entries: Vec<ContextEntry>,
    pub stats: RunStats,
}

pub struct ContextCollector<'a> {
    rules: &'a IgnoreRuleSet,
    max_chunk_tokens: usize,
    summarize_threshold_bytes: u64,
    max_file_bytes: u64,
    progress: ProgressBar,
}

impl<'a> ContextCollector<'a> {
    pub fn new(rules: &'a IgnoreRuleSet) -> Self {
        let defaults = Config::default();
        Self {
            rules,
            max_chunk_tokens: defaults.max_chunk_tokens,
            summarize_threshold_bytes: defaults.summarize_threshold_bytes,
            max_file_bytes: defaults.max_file_bytes,
            progress: ProgressBar::hidden(),
        }
    }

    pub fn from_config(rules: &'a IgnoreRuleSet, config: &Config) -> Self {
        Self::new(rules)
            .max_chunk_tokens(config.max_chunk_tokens)
            .summarize_threshold_bytes(config.summarize_threshold_bytes)
            .max_file_bytes(config.max_file_bytes)
    }

    pub fn max_chunk_tokens(mut self, tokens: usize) -> Self {
        self.max_chunk_tokens = tokens;
        self
    }

    pub fn summarize_threshold_bytes(mut self, bytes: u64) -> Self {
        self.summarize_threshold_bytes = bytes;
        self
    }

    pub fn max_file_bytes(mut self, bytes: u64) -> Self {
        self.max_file_bytes = bytes;
        self
    }

    /// Progress indicator ticked once per file.
    pub fn progress(mut self, progress: ProgressBar) -> Self {
        self.progress = progress;
        self
    }

    /// Walk `root` and build the context entries. Without a session, large
    /// files are truncated to their first chunk.
    pub fn collect(
        &self,
        root: &Path,
        mut session: Option<&mut SummarizationSession<'_>>,
    ) -> Result<Collection, ContextError> {
        validate_root(root)?;
        let mut collection = Collection::default();
        let mut scope = IgnoreScope::new(self.rules, root);

        let walker = WalkDir::new(root)
            .min_depth(1)
            .follow_links(false)
            .sort_by(|a, b| {
                compare_siblings(
                    a.file_type().is_dir(),
                    &a.file_name().to_string_lossy(),
                    b.file_type().is_dir(),
                    &b.file_name().to_string_lossy(),
                )
            })
            .into_iter()
            .filter_entry(|entry| !is_excluded(root, &mut scope, entry));

        for item in walker {
            let entry = match item {
                Ok(entry) => entry,
                Err(err) => {
                    let location = err
                        .path()
                        .and_then(|p| relative_path(root, p))
                        .unwrap_or_else(|| ".".to_string());
                    tracing::warn!(path = %location, error = %err, "skipping unreadable entry");
                    collection.stats.skipped_entries.push(format!("{location}: {err}"));
                    continue;
                }
            };

            let Some(rel) = relative_path(root, entry.path()) else {
                continue;
            };
            match entry_kind(&entry) {
                EntryKind::Directory => continue,
                EntryKind::Symlink => {
                    tracing::debug!(path = %rel, "not following symlink");
                    continue;
                }
                EntryKind::File => {}
            }

            self.progress.set_message(rel.clone());
            let item = match entry.metadata() {
                Ok(meta) => {
                    let snapshot = PathEntry {
                        path: entry.path().to_path_buf(),
                        relative_path: rel,
                        kind: EntryKind::File,
                        size_bytes: meta.len(),
                    };
                    self.collect_file(snapshot, session.as_deref_mut(), &mut collection.stats)
                }
                Err(err) => {
                    tracing::debug!(path = %rel, error = %err, "cannot stat file");
                    collection.stats.files_unreadable += 1;
                    let reason = err.to_string();
                    ContextEntry {
                        relative_path: rel,
                        class: FileClass::Unreadable(reason.clone()),
                        size_bytes: 0,
                        body: ContextBody::Omitted(reason),
                    }
                }
            };
            collection.stats.files_listed += 1;
            collection.stats.total_bytes += item.size_bytes;
            collection.entries.push(item);
            self.progress.inc(1);
        }

        self.progress.finish_and_clear();
        if let Some(session) = session {
            collection.stats.summarizer_disabled = session.disabled_reason().map(str::to_string);
        }
        Ok(collection)
    }

    fn collect_file(
        &self,
        entry: PathEntry,
        session: Option<&mut SummarizationSession<'_>>,
        stats: &mut RunStats,
    ) -> ContextEntry {
        let PathEntry { path, relative_path, size_bytes, .. } = entry;
        let class = classify_file(&path);
        let body = match &class {
            FileClass::Binary => {
                stats.files_binary += 1;
                ContextBody::Omitted("binary file".to_string())
            }
            FileClass::Unreadable(reason) => {
                stats.files_unreadable += 1;
                ContextBody::Omitted(reason.clone())
            }
            FileClass::Text if size_bytes > self.max_file_bytes => {
                stats.files_text += 1;
                stats.files_oversized += 1;
                ContextBody::Omitted(format!(
                    "larger than {} bytes, not read",
                    format_with_commas(self.max_file_bytes)
                ))
            }
            FileClass::Text => match read_file_safe(&path) {
                Ok((content, _encoding)) => {
                    stats.files_text += 1;
                    self.text_body(&relative_path, content, size_bytes, session, stats)
                }
                Err(err) => {
                    tracing::warn!(path = %relative_path, error = %err, "cannot read text file");
                    stats.files_unreadable += 1;
                    let reason = err.to_string();
                    return ContextEntry {
                        relative_path,
                        class: FileClass::Unreadable(reason.clone()),
                        size_bytes,
                        body: ContextBody::Omitted(reason),
                    };
                }
            },
        };

        ContextEntry { relative_path, class, size_bytes, body }
    }

    fn text_body(
        &self,
        relative_path: &str,
        content: String,
        size_bytes: u64,
        session: Option<&mut SummarizationSession<'_>>,
        stats: &mut RunStats,
    ) -> ContextBody {
        if size_bytes < self.summarize_threshold_bytes {
            return ContextBody::Verbatim(content);
        }

        let chunks = chunk_content(relative_path, &content, self.max_chunk_tokens);
        stats.chunks_created += chunks.len();

        if let Some(session) = session {
            if session.is_available() {
                let outcome = session.summarize_file(relative_path, &chunks);
                if let FileOutcome::Summarized(summary) = outcome {
                    let summarized = summary.summarized_chunks();
                    stats.files_summarized += 1;
                    stats.chunks_summarized += summarized;
                    stats.chunks_unavailable += summary.total_chunks() - summarized;
                    return ContextBody::Summary(summary);
                }
            }
        }

        truncate_to_first_chunk(content, chunks, stats)
    }
}

/// Exclusion check run by the walker before it yields (or descends into) an
/// entry; the parent's ignore files are loaded first.
fn is_excluded(root: &Path, scope: &mut IgnoreScope<'_>, entry: &DirEntry) -> bool {
    let Some(rel) = relative_path(root, entry.path()) else {
        return false;
    };
    let parent = rel.rsplit_once('/').map_or("", |(parent, _)| parent);
    scope.enter(parent);
    scope.is_excluded(&rel, entry.file_type().is_dir())
}

fn entry_kind(entry: &DirEntry) -> EntryKind {
    let file_type = entry.file_type();
    if file_type.is_symlink() {
        EntryKind::Symlink
    } else if file_type.is_dir() {
        EntryKind::Directory
    } else {
        EntryKind::File
    }
}

fn truncate_to_first_chunk(
    content: String,
    chunks: Vec<TextChunk>,
    stats: &mut RunStats,
) -> ContextBody {
    if chunks.len() <= 1 {
        return ContextBody::Verbatim(content);
    }
    stats.files_truncated += 1;
    let omitted_chunks = chunks.len() - 1;
    let head = chunks.into_iter().next().map(|c| c.content).unwrap_or_default();
    ContextBody::Truncated { head, omitted_chunks }
}
