//! Tree command: print the directory tree without writing any files

use anyhow::{Context, Result};
use clap::Args;
use std::path::PathBuf;

use crate::config::{load_config, merge_cli_with_config, CliOverrides};
use crate::filter::build_rule_set;
use crate::scan::{generate_tree, validate_root};

use super::utils::parse_csv;

#[derive(Args)]
pub struct TreeArgs {
    /// Directory to render (defaults to the current directory)
    #[arg(value_name = "PATH")]
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

    /// Do not expand directories deeper than this
    #[arg(short = 'd', long, value_name = "DEPTH")]
    pub depth: Option<usize>,
}

pub fn run(args: TreeArgs) -> Result<()> {
    let cwd = std::env::current_dir()?;
    let root = args.path.clone().unwrap_or(cwd);
    validate_root(&root)?;
    let root = root
        .canonicalize()
        .with_context(|| format!("Cannot resolve root directory {}", root.display()))?;

    let file_config = load_config(&root, args.config.as_deref())?;
    let overrides = CliOverrides {
        root: Some(root.clone()),
        exclude_patterns: parse_csv(&args.exclude).unwrap_or_default(),
        default_excludes: args.no_default_excludes.then_some(false),
        respect_gitignore: args.no_gitignore.then_some(false),
        tree_depth: args.depth,
        ..CliOverrides::default()
    };
    let config = merge_cli_with_config(file_config, overrides);

    let rules = build_rule_set(&root, &config, &[]);
    let render = generate_tree(&root, &rules, config.tree_depth)?;
    print!("{}", render.text);
    Ok(())
}
