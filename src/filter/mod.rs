//! Gitignore-style exclusion rules
//!
//! Rules are evaluated in order and the last matching rule wins. A path whose
//! ancestor directory is excluded stays excluded no matter what later
//! negations say, which is what lets the walkers prune excluded directories
//! without opening them.
//!
//! A rule set has two layers. Ignore-file rules (built-in defaults,
//! `.git/info/exclude`, the root `.gitignore`) sit below the `.gitignore`
//! files of subdirectories, which [`IgnoreScope`] loads during descent.
//! Override rules (configured patterns, output files) sit above both.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

pub mod rule;
pub mod scope;

pub use rule::IgnoreRule;
pub use scope::IgnoreScope;

use crate::domain::Config;
use crate::utils::relative_path;

/// Built-in exclusions merged ahead of user patterns.
pub const DEFAULT_EXCLUDES: &[&str] = &[
    // Version control
    ".git/",
    ".svn/",
    ".hg/",
    ".bzr/",
    // Dependencies and virtual environments
    "node_modules/",
    "bower_components/",
    ".venv/",
    "venv/",
    ".tox/",
    ".nox/",
    ".eggs/",
    "*.egg-info/",
    // Byte-compiled artifacts and caches
    "__pycache__/",
    "*.pyc",
    "*.pyo",
    ".cache/",
    ".pytest_cache/",
    ".mypy_cache/",
    ".ruff_cache/",
    // Build outputs
    "target/",
    "dist/",
    "build/",
    // IDE/Editor
    ".idea/",
    ".vscode/",
    ".vs/",
    "*.swp",
    "*.swo",
    // Misc
    ".DS_Store",
    "Thumbs.db",
];

/// File name of per-directory ignore files.
pub const GITIGNORE: &str = ".gitignore";

/// Ordered rule list; read-only once built.
#[derive(Debug, Clone, Default)]
pub struct IgnoreRuleSet {
    ignore_file_rules: Vec<IgnoreRule>,
    overrides: Vec<IgnoreRule>,
    nested_gitignore: bool,
}

impl IgnoreRuleSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// A rule set holding only [`DEFAULT_EXCLUDES`].
    pub fn with_defaults() -> Self {
        let mut set = Self::new();
        set.ignore_file_rules
            .extend(DEFAULT_EXCLUDES.iter().copied().filter_map(IgnoreRule::parse));
        set
    }

    /// Parse and append override pattern lines, skipping blanks and comments.
    /// Returns the number of rules added.
    pub fn extend_from_lines<'a, I>(&mut self, lines: I) -> usize
    where
        I: IntoIterator<Item = &'a str>,
    {
        let before = self.overrides.len();
        self.overrides.extend(lines.into_iter().filter_map(IgnoreRule::parse));
        self.overrides.len() - before
    }

    /// Append the rules of a root-level ignore file such as `.gitignore`.
    pub fn load_file(&mut self, path: &Path) -> io::Result<usize> {
        let content = fs::read_to_string(path)?;
        let before = self.ignore_file_rules.len();
        self.ignore_file_rules.extend(content.lines().filter_map(IgnoreRule::parse));
        Ok(self.ignore_file_rules.len() - before)
    }

    /// Load `.gitignore` files of subdirectories while walking.
    pub fn with_nested_gitignore(mut self, enabled: bool) -> Self {
        self.nested_gitignore = enabled;
        self
    }

    pub fn nested_gitignore(&self) -> bool {
        self.nested_gitignore
    }

    /// All rules, lowest precedence first.
    pub fn rules(&self) -> impl Iterator<Item = &IgnoreRule> {
        self.ignore_file_rules.iter().chain(self.overrides.iter())
    }

    pub fn len(&self) -> usize {
        self.ignore_file_rules.len() + self.overrides.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Verdict of the last rule matching this exact path, ignoring ancestors:
    /// `Some(true)` excluded, `Some(false)` re-included, `None` no rule applies.
    fn decide(&self, relative_path: &str, is_dir: bool) -> Option<bool> {
        self.decide_with(&[], relative_path, is_dir)
    }

    /// Verdict of the last matching rule for this exact path, with `nested`
    /// ranked between the ignore-file rules and the overrides.
    pub fn decide_with(
        &self,
        nested: &[IgnoreRule],
        relative_path: &str,
        is_dir: bool,
    ) -> Option<bool> {
        last_match(&self.overrides, relative_path, is_dir)
            .or_else(|| last_match(nested, relative_path, is_dir))
            .or_else(|| last_match(&self.ignore_file_rules, relative_path, is_dir))
    }

    /// Whether `relative_path` is excluded. Ancestor directories are tested
    /// first and an excluded ancestor short-circuits.
    pub fn is_excluded(&self, relative_path: &str, is_dir: bool) -> bool {
        is_excluded_by(|path, dir| self.decide(path, dir), relative_path, is_dir)
    }
}

fn last_match(rules: &[IgnoreRule], relative_path: &str, is_dir: bool) -> Option<bool> {
    rules
        .iter()
        .rev()
        .find(|rule| rule.matches(relative_path, is_dir))
        .map(|rule| !rule.is_negation)
}

pub(crate) fn is_excluded_by<F>(decide: F, relative_path: &str, is_dir: bool) -> bool
where
    F: Fn(&str, bool) -> Option<bool>,
{
    let relative_path = relative_path.trim_matches('/');
    if relative_path.is_empty() {
        return false;
    }
    for (idx, _) in relative_path.match_indices('/') {
        if decide(&relative_path[..idx], true) == Some(true) {
            return true;
        }
    }
    decide(relative_path, is_dir) == Some(true)
}

/// Assemble the rule set for a traversal: defaults, `.git/info/exclude` and
/// the root `.gitignore` (subdirectory `.gitignore` files follow during the
/// walk), then configured patterns and anchored exclusions for output files
/// that live inside the root.
pub fn build_rule_set(root: &Path, config: &Config, outputs: &[&Path]) -> IgnoreRuleSet {
    let mut set =
        if config.default_excludes { IgnoreRuleSet::with_defaults() } else { IgnoreRuleSet::new() };

    if config.respect_gitignore {
        for ignore_file in [root.join(".git").join("info").join("exclude"), root.join(GITIGNORE)] {
            if !ignore_file.is_file() {
                continue;
            }
            match set.load_file(&ignore_file) {
                Ok(count) => {
                    tracing::debug!(path = %ignore_file.display(), count, "loaded ignore rules")
                }
                Err(err) => tracing::warn!(
                    path = %ignore_file.display(),
                    error = %err,
                    "cannot read ignore file, skipping it"
                ),
            }
        }
        set = set.with_nested_gitignore(true);
    }

    set.extend_from_lines(config.exclude_patterns.iter().map(String::as_str));

    for output in outputs {
        if let Some(rel) = output_relative_to_root(root, output) {
            set.extend_from_lines([format!("/{}", escape_glob(&rel)).as_str()]);
        }
    }

    let literal = set.rules().filter(|rule| rule.is_literal_fallback()).count();
    if literal > 0 {
        tracing::debug!(literal, "patterns matched literally because they are not valid globs");
    }
    set
}

fn output_relative_to_root(root: &Path, output: &Path) -> Option<String> {
    let absolute = if output.is_absolute() {
        output.to_path_buf()
    } else {
        std::env::current_dir().ok()?.join(output)
    };
    relative_path(root, &resolve_existing_prefix(&absolute)?)
}

/// Canonicalize the longest existing prefix of `path` and re-append the
/// missing components, so outputs in not-yet-created directories resolve too.
fn resolve_existing_prefix(path: &Path) -> Option<PathBuf> {
    let mut existing = path;
    let mut missing = Vec::new();
    loop {
        if let Ok(mut resolved) = existing.canonicalize() {
            resolved.extend(missing.iter().rev().copied());
            return Some(resolved);
        }
        missing.push(existing.file_name()?);
        existing = existing.parent()?;
    }
}

fn escape_glob(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '*' | '?' | '[' | ']' | '{' | '}' | '\\' | '!') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn set_of(lines: &[&str]) -> IgnoreRuleSet {
        let mut set = IgnoreRuleSet::new();
        set.extend_from_lines(lines.iter().copied());
        set
    }

    #[test]
    fn negation_after_wildcard_keeps_one_file() {
        let set = set_of(&["*.log", "!keep.log"]);
        assert!(set.is_excluded("debug.log", false));
        assert!(set.is_excluded("nested/trace.log", false));
        assert!(!set.is_excluded("keep.log", false));
        assert!(!set.is_excluded("nested/keep.log", false));
        assert!(!set.is_excluded("notes.txt", false));
    }

    #[test]
    fn last_match_wins() {
        let set = set_of(&["!keep.log", "*.log"]);
        assert!(set.is_excluded("keep.log", false));
    }

    #[test]
    fn negation_cannot_reinclude_inside_excluded_directory() {
        let set = set_of(&["logs/", "!logs/keep.log"]);
        assert!(set.is_excluded("logs", true));
        assert!(set.is_excluded("logs/keep.log", false));
    }

    #[test]
    fn defaults_exclude_vcs_and_dependency_dirs() {
        let set = IgnoreRuleSet::with_defaults();
        assert!(set.is_excluded(".git", true));
        assert!(set.is_excluded(".git/config", false));
        assert!(set.is_excluded("web/node_modules", true));
        assert!(set.is_excluded("pkg/__pycache__/mod.cpython-312.pyc", false));
        assert!(set.is_excluded("mod.pyc", false));
        assert!(!set.is_excluded("src/main.rs", false));
        // A file named like a default directory is not a directory.
        assert!(!set.is_excluded(".git", false));
    }

    #[test]
    fn user_negation_overrides_default_exclusion() {
        let mut set = IgnoreRuleSet::with_defaults();
        set.extend_from_lines(["!build/"]);
        assert!(!set.is_excluded("build", true));
        assert!(!set.is_excluded("build/out.txt", false));
    }

    #[test]
    fn empty_path_is_never_excluded() {
        let set = set_of(&["*"]);
        assert!(!set.is_excluded("", true));
        assert!(set.is_excluded("anything", false));
    }

    #[test]
    fn build_rule_set_layers_sources_in_order() {
        let temp = TempDir::new().expect("temp dir");
        let root = temp.path().canonicalize().expect("canonical root");
        fs::write(root.join(".gitignore"), "# generated\n*.tmp\n").expect("write gitignore");

        let config = Config {
            exclude_patterns: vec!["!keep.tmp".to_string(), "secrets/".to_string()],
            ..Config::default()
        };
        let output = root.join("directory_tree.txt");
        let set = build_rule_set(&root, &config, &[output.as_path()]);

        assert!(set.is_excluded(".git", true));
        assert!(set.is_excluded("scratch.tmp", false));
        assert!(!set.is_excluded("keep.tmp", false));
        assert!(set.is_excluded("secrets", true));
        assert!(set.is_excluded("directory_tree.txt", false));
        assert!(!set.is_excluded("sub/directory_tree.txt", false));
    }

    #[test]
    fn build_rule_set_honors_disabled_sources() {
        let temp = TempDir::new().expect("temp dir");
        let root = temp.path();
        fs::write(root.join(".gitignore"), "*.tmp\n").expect("write gitignore");

        let config = Config {
            default_excludes: false,
            respect_gitignore: false,
            ..Config::default()
        };
        let set = build_rule_set(root, &config, &[]);
        assert!(set.is_empty());
        assert!(!set.is_excluded(".git", true));
        assert!(!set.is_excluded("a.tmp", false));
    }

    #[test]
    fn outputs_outside_root_add_no_rule() {
        let root = TempDir::new().expect("root");
        let elsewhere = TempDir::new().expect("elsewhere");
        let config = Config { default_excludes: false, ..Config::default() };
        let output = elsewhere.path().join("tree.txt");
        let set = build_rule_set(root.path(), &config, &[output.as_path()]);
        assert_eq!(set.len(), 0);
    }

    #[test]
    fn outputs_in_missing_directories_are_still_excluded() {
        let temp = TempDir::new().expect("temp dir");
        let root = temp.path().canonicalize().expect("canonical root");
        let config = Config { default_excludes: false, ..Config::default() };
        let output = root.join("out/nested/tree.txt");
        let set = build_rule_set(&root, &config, &[output.as_path()]);

        assert!(set.is_excluded("out/nested/tree.txt", false));
        assert!(!set.is_excluded("out/nested/other.txt", false));
    }

    #[test]
    fn git_info_exclude_is_loaded_below_user_patterns() {
        let temp = TempDir::new().expect("temp dir");
        let root = temp.path();
        fs::create_dir_all(root.join(".git/info")).expect("mkdir");
        fs::write(root.join(".git/info/exclude"), "*.bak\nlocal/\n").expect("write exclude");

        let config =
            Config { exclude_patterns: vec!["!keep.bak".to_string()], ..Config::default() };
        let set = build_rule_set(root, &config, &[]);
        assert!(set.nested_gitignore());
        assert!(set.is_excluded("old.bak", false));
        assert!(set.is_excluded("local", true));
        assert!(!set.is_excluded("keep.bak", false));
    }

    #[test]
    fn nested_rules_rank_between_layers() {
        let temp = TempDir::new().expect("temp dir");
        let gitignore = temp.path().join(".gitignore");
        fs::write(&gitignore, "*.txt\n").expect("write gitignore");

        let mut set = IgnoreRuleSet::new();
        set.load_file(&gitignore).expect("load");
        set.extend_from_lines(["!pinned.txt"]);
        let nested: Vec<IgnoreRule> = ["!notes.txt", "pinned.txt"]
            .iter()
            .filter_map(|line| IgnoreRule::parse_in(line, "sub"))
            .collect();

        assert_eq!(set.decide_with(&nested, "sub/notes.txt", false), Some(false));
        assert_eq!(set.decide_with(&nested, "sub/pinned.txt", false), Some(false));
        assert_eq!(set.decide_with(&nested, "sub/other.txt", false), Some(true));
    }
}
