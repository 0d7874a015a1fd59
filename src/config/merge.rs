//! CLI argument merging with config

use crate::domain::Config;
use std::path::PathBuf;

#[derive(Debug, Default, Clone)]
pub struct CliOverrides {
    pub root: Option<PathBuf>,
    /// Appended to the configured patterns, never replacing them
    pub exclude_patterns: Vec<String>,
    pub default_excludes: Option<bool>,
    pub respect_gitignore: Option<bool>,
    pub tree_output: Option<PathBuf>,
    pub context_output: Option<PathBuf>,
    pub tree_depth: Option<usize>,
    pub max_chunk_tokens: Option<usize>,
    pub summarize_threshold_bytes: Option<u64>,
    pub max_file_bytes: Option<u64>,
    pub summarize: Option<bool>,
    pub model: Option<String>,
    pub api_base: Option<String>,
    pub max_files: Option<usize>,
    pub request_delay_ms: Option<u64>,
}

pub fn merge_cli_with_config(mut base_config: Config, cli: CliOverrides) -> Config {
    if let Some(root) = cli.root {
        base_config.root = Some(root);
    }

    base_config.exclude_patterns.extend(cli.exclude_patterns);
    if let Some(default_excludes) = cli.default_excludes {
        base_config.default_excludes = default_excludes;
    }
    if let Some(respect_gitignore) = cli.respect_gitignore {
        base_config.respect_gitignore = respect_gitignore;
    }

    if let Some(tree_output) = cli.tree_output {
        base_config.tree_output = tree_output;
    }
    if let Some(context_output) = cli.context_output {
        base_config.context_output = context_output;
    }
    if let Some(tree_depth) = cli.tree_depth {
        base_config.tree_depth = Some(tree_depth);
    }

    if let Some(max_chunk_tokens) = cli.max_chunk_tokens {
        base_config.max_chunk_tokens = max_chunk_tokens;
    }
    if let Some(threshold) = cli.summarize_threshold_bytes {
        base_config.summarize_threshold_bytes = threshold;
    }
    if let Some(max_file_bytes) = cli.max_file_bytes {
        base_config.max_file_bytes = max_file_bytes;
    }

    if let Some(summarize) = cli.summarize {
        base_config.summarize = summarize;
    }
    if let Some(model) = cli.model {
        base_config.summary.model = model;
    }
    if let Some(api_base) = cli.api_base {
        base_config.summary.api_base = api_base;
    }
    if let Some(max_files) = cli.max_files {
        base_config.summary.max_files = max_files;
    }
    if let Some(request_delay_ms) = cli.request_delay_ms {
        base_config.summary.request_delay_ms = request_delay_ms;
    }

    base_config
}

#[cfg(test)]
mod tests {
    use super::{merge_cli_with_config, CliOverrides};
    use crate::domain::Config;
    use std::path::PathBuf;

    #[test]
    fn cli_overrides_replace_base_values() {
        let base = Config {
            root: Some(PathBuf::from("/tmp/repo")),
            max_chunk_tokens: 100,
            exclude_patterns: vec!["*.log".to_string()],
            ..Config::default()
        };

        let cli = CliOverrides {
            root: Some(PathBuf::from("/srv/other")),
            exclude_patterns: vec!["!keep.log".to_string()],
            max_chunk_tokens: Some(4096),
            summarize: Some(true),
            model: Some("gpt-4o-mini".to_string()),
            respect_gitignore: Some(false),
            ..CliOverrides::default()
        };

        let merged = merge_cli_with_config(base, cli);
        assert_eq!(merged.root.as_deref(), Some(std::path::Path::new("/srv/other")));
        assert_eq!(merged.max_chunk_tokens, 4096);
        assert_eq!(merged.exclude_patterns, vec!["*.log", "!keep.log"]);
        assert!(merged.summarize);
        assert!(!merged.respect_gitignore);
        assert_eq!(merged.summary.model, "gpt-4o-mini");
    }

    #[test]
    fn empty_overrides_keep_base() {
        let base = Config { tree_depth: Some(3), ..Config::default() };
        let merged = merge_cli_with_config(base.clone(), CliOverrides::default());
        assert_eq!(merged, base);
    }
}
