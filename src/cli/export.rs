//! Export command implementation

use anyhow::{Context, Result};
use chrono::Local;
use clap::Args;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use super::utils::parse_csv;
use crate::config::{load_config, merge_cli_with_config, CliOverrides};
use crate::domain::{Config, RunStats};
use crate::filter::build_rule_set;
use crate::render::render_context_document;
use crate::scan::{generate_tree, validate_root, ContextCollector};
use crate::summarize::{OpenAiSummarizer, SummarizationSession, Summarizer};
use crate::utils::{estimate_tokens, format_with_commas};

#[derive(Args)]
pub struct ExportArgs {
    /// Directory to export (defaults to the current directory)
    #[arg(short, long, value_name = "PATH")]
    pub path: Option<PathBuf>,

    /// Path to config file (tree-context.toml or .tree-context.yml)
    #[arg(short = 'c', long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Exclude paths matching these gitignore-style patterns (comma-separated)
    #[arg(short = 'e', long, value_name = "PATTERNS")]
    pub exclude: Option<String>,

    /// Do not apply the built-in exclusions (.git/, node_modules/, ...)
    #[arg(long)]
    pub no_default_excludes: bool,

    /// Ignore .gitignore files and .git/info/exclude
    #[arg(long)]
    pub no_gitignore: bool,

    /// Where to write the directory tree
    #[arg(long, value_name = "FILE")]
    pub tree_output: Option<PathBuf>,

    /// Where to write the context document
    #[arg(long, value_name = "FILE")]
    pub context_output: Option<PathBuf>,

    /// Only write the directory tree
    #[arg(long)]
    pub no_context: bool,

    /// Do not expand directories deeper than this in the tree
    #[arg(long, value_name = "DEPTH")]
    pub tree_depth: Option<usize>,

    /// Token budget per chunk of a large file
    #[arg(long, value_name = "TOKENS")]
    pub max_chunk_tokens: Option<usize>,

    /// Files at or above this size are chunked and summarized (or truncated)
    #[arg(long, value_name = "BYTES")]
    pub summarize_threshold: Option<u64>,

    /// Text files larger than this are listed without content
    #[arg(long, value_name = "BYTES")]
    pub max_file_bytes: Option<u64>,

    /// Summarize large files through the configured model
    #[arg(long, conflicts_with = "no_summarize")]
    pub summarize: bool,

    /// Never call the summarizer, even if the config enables it
    #[arg(long)]
    pub no_summarize: bool,

    /// Model used for summaries
    #[arg(long, value_name = "MODEL")]
    pub model: Option<String>,

    /// Base URL of an OpenAI-compatible API
    #[arg(long, value_name = "URL")]
    pub api_base: Option<String>,

    /// Summarize at most this many files per run
    #[arg(long, value_name = "N")]
    pub max_files: Option<usize>,

    /// Pause between summarization requests
    #[arg(long, value_name = "MS")]
    pub request_delay_ms: Option<u64>,

    /// Omit the generation timestamp for reproducible output
    #[arg(long)]
    pub no_timestamp: bool,

    /// Also write run statistics as JSON to this file
    #[arg(long, value_name = "FILE")]
    pub report: Option<PathBuf>,
}

pub fn run(args: ExportArgs) -> Result<()> {
    let start_time = Instant::now();

    let cwd = std::env::current_dir()?;
    let config_anchor = match args.path.as_ref() {
        Some(path) if path.is_dir() => path.canonicalize().unwrap_or_else(|_| cwd.clone()),
        _ => cwd.clone(),
    };
    let file_config = load_config(&config_anchor, args.config.as_deref())?;

    let summarize = if args.no_summarize {
        Some(false)
    } else if args.summarize {
        Some(true)
    } else {
        None
    };
    let cli_overrides = CliOverrides {
        root: args.path.clone(),
        exclude_patterns: parse_csv(&args.exclude).unwrap_or_default(),
        default_excludes: args.no_default_excludes.then_some(false),
        respect_gitignore: args.no_gitignore.then_some(false),
        tree_output: args.tree_output.clone(),
        context_output: args.context_output.clone(),
        tree_depth: args.tree_depth,
        max_chunk_tokens: args.max_chunk_tokens,
        summarize_threshold_bytes: args.summarize_threshold,
        max_file_bytes: args.max_file_bytes,
        summarize,
        model: args.model.clone(),
        api_base: args.api_base.clone(),
        max_files: args.max_files,
        request_delay_ms: args.request_delay_ms,
    };
    let merged = merge_cli_with_config(file_config, cli_overrides);

    let root = merged.root.clone().unwrap_or_else(|| cwd.clone());
    validate_root(&root)?;
    let root = root
        .canonicalize()
        .with_context(|| format!("Cannot resolve root directory {}", root.display()))?;
    tracing::debug!(root = %root.display(), "exporting");

    let mut outputs: Vec<&Path> = vec![merged.tree_output.as_path()];
    if !args.no_context {
        outputs.push(merged.context_output.as_path());
    }
    if let Some(report) = &args.report {
        outputs.push(report.as_path());
    }
    let rules = build_rule_set(&root, &merged, &outputs);
    tracing::debug!(rules = rules.len(), "exclusion rules loaded");

    let tree = generate_tree(&root, &rules, merged.tree_depth)?;
    write_output(&merged.tree_output, &tree.text)?;

    let mut stats = RunStats {
        tree_directories: tree.directories,
        tree_files: tree.files,
        ..RunStats::default()
    };
    let mut output_files = vec![merged.tree_output.display().to_string()];

    if !args.no_context {
        let project = project_name(&root);
        let summarizer = if merged.summarize {
            Some(
                OpenAiSummarizer::from_config(&merged.summary)
                    .context("Failed to initialize the summarizer")?,
            )
        } else {
            None
        };
        if let Some(summarizer) = &summarizer {
            tracing::debug!(
                endpoint = summarizer.endpoint(),
                model = %merged.summary.model,
                "summarization enabled"
            );
            if !summarizer.has_api_key() {
                tracing::debug!(
                    env = %merged.summary.api_key_env,
                    "no API key found; summarization will be disabled on first use"
                );
            }
        }
        let mut session = summarizer.as_ref().map(|s| {
            SummarizationSession::new(s as &dyn Summarizer, project.clone())
                .request_delay(Duration::from_millis(merged.summary.request_delay_ms))
                .max_files(merged.summary.max_files)
        });

        let collector = ContextCollector::from_config(&rules, &merged).progress(progress_bar());
        let collection = collector.collect(&root, session.as_mut())?;

        let timestamp = (!args.no_timestamp).then(Local::now);
        let document = render_context_document(&project, &collection.entries, timestamp);
        write_output(&merged.context_output, &document)?;
        output_files.push(merged.context_output.display().to_string());

        stats = RunStats {
            tree_directories: stats.tree_directories,
            tree_files: stats.tree_files,
            total_tokens_estimated: estimate_tokens(&document),
            ..collection.stats
        };
    }

    if let Some(report) = &args.report {
        let json = serde_json::to_string_pretty(&stats).context("Failed to serialize statistics")?;
        write_output(report, &format!("{json}\n"))?;
        output_files.push(report.display().to_string());
    }

    print_statistics(&root, &merged, &stats, !args.no_context, &output_files, start_time.elapsed());
    Ok(())
}

fn write_output(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory {}", parent.display()))?;
    }
    fs::write(path, content).with_context(|| format!("Failed to write {}", path.display()))
}

fn project_name(root: &Path) -> String {
    root.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| root.display().to_string())
}

/// Spinner on stderr when it is a terminal, hidden otherwise.
fn progress_bar() -> ProgressBar {
    if !console::Term::stderr().is_term() {
        return ProgressBar::hidden();
    }
    let bar = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner} {pos} files {wide_msg}") {
        bar.set_style(style);
    }
    bar.enable_steady_tick(Duration::from_millis(120));
    bar
}

fn print_statistics(
    root: &Path,
    config: &Config,
    stats: &RunStats,
    context_written: bool,
    output_files: &[String],
    elapsed: Duration,
) {
    println!();
    println!("{}", style("Export complete!").green().bold());
    println!();
    println!("Statistics:");
    println!("  Root:            {}", root.display());
    println!(
        "  Tree:            {} directories, {} files",
        stats.tree_directories, stats.tree_files
    );

    if !context_written {
        println!("  Processing time: {:.2}s", elapsed.as_secs_f64());
        print_outputs(output_files);
        return;
    }

    println!("  Files listed:    {}", stats.files_listed);
    println!("    text:          {}", stats.files_text);
    if stats.files_binary > 0 {
        println!("    binary:        {}", stats.files_binary);
    }
    if stats.files_unreadable > 0 {
        println!("    unreadable:    {}", stats.files_unreadable);
    }
    if stats.files_oversized > 0 {
        println!("    oversized:     {}", stats.files_oversized);
    }
    if stats.files_summarized > 0 {
        println!("  Files summarized: {}", stats.files_summarized);
        println!(
            "  Chunks summarized: {}/{}",
            stats.chunks_summarized,
            stats.chunks_summarized + stats.chunks_unavailable
        );
    }
    if stats.files_truncated > 0 {
        println!("  Files truncated: {}", stats.files_truncated);
    }
    println!("  Chunks created:  {}", stats.chunks_created);
    println!("  Total bytes:     {}", format_with_commas(stats.total_bytes));
    println!("  Total tokens:    ~{}", format_with_commas(stats.total_tokens_estimated as u64));
    if config.summarize {
        let state = if stats.summarizer_disabled.is_some() {
            style("disabled after a permanent error").red().to_string()
        } else {
            config.summary.model.clone()
        };
        println!("  Summarizer:      {state}");
    }
    println!("  Processing time: {:.2}s", elapsed.as_secs_f64());

    if !stats.skipped_entries.is_empty() {
        println!();
        println!(
            "{}",
            style(format!("Skipped {} unreadable entr(ies):", stats.skipped_entries.len()))
                .yellow()
        );
        for entry in stats.skipped_entries.iter().take(5) {
            println!("  {entry}");
        }
        if stats.skipped_entries.len() > 5 {
            println!("  ... and {} more", stats.skipped_entries.len() - 5);
        }
    }

    print_outputs(output_files);
}

fn print_outputs(output_files: &[String]) {
    println!();
    println!("Output files:");
    for out in output_files {
        println!("  {out}");
    }
}
