//! Per-directory `.gitignore` rules picked up while walking.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use super::{is_excluded_by, IgnoreRule, IgnoreRuleSet, GITIGNORE};

#[derive(Debug)]
struct Frame {
    /// Root-relative directory the frame was loaded for
    dir: String,
    /// Index in `IgnoreScope::nested` where this directory's rules start
    rules_start: usize,
}

/// An [`IgnoreRuleSet`] plus the `.gitignore` rules of the directory being
/// walked and its ancestors. Only directories the walk actually enters are
/// read, so excluded directories are never opened.
#[derive(Debug)]
pub struct IgnoreScope<'a> {
    rules: &'a IgnoreRuleSet,
    root: PathBuf,
    frames: Vec<Frame>,
    nested: Vec<IgnoreRule>,
}

impl<'a> IgnoreScope<'a> {
    pub fn new(rules: &'a IgnoreRuleSet, root: &Path) -> Self {
        Self { rules, root: root.to_path_buf(), frames: Vec::new(), nested: Vec::new() }
    }

    /// Make `dir` (root-relative, `""` for the root) the current directory:
    /// drop rules of directories that are not its ancestors and load the
    /// ignore files of any of its ancestors not loaded yet.
    pub fn enter(&mut self, dir: &str) {
        let dir = dir.trim_matches('/');
        while let Some(frame) = self.frames.last() {
            if is_same_or_ancestor(&frame.dir, dir) {
                break;
            }
            self.nested.truncate(frame.rules_start);
            self.frames.pop();
        }

        if !self.rules.nested_gitignore() || dir.is_empty() {
            return;
        }
        let loaded = self.frames.last().map_or(0, |frame| frame.dir.len());
        let prefixes = dir
            .match_indices('/')
            .map(|(idx, _)| &dir[..idx])
            .chain(std::iter::once(dir))
            .filter(|prefix| prefix.len() > loaded);
        for prefix in prefixes {
            self.push_frame(prefix);
        }
    }

    /// Whether `relative_path` is excluded given the rules in scope.
    pub fn is_excluded(&self, relative_path: &str, is_dir: bool) -> bool {
        if self.nested.is_empty() {
            return self.rules.is_excluded(relative_path, is_dir);
        }
        is_excluded_by(
            |path, dir| self.rules.decide_with(&self.nested, path, dir),
            relative_path,
            is_dir,
        )
    }

    fn push_frame(&mut self, dir: &str) {
        let rules_start = self.nested.len();
        let path = self.root.join(dir).join(GITIGNORE);
        match fs::read_to_string(&path) {
            Ok(content) => {
                let rules = content.lines().filter_map(|line| IgnoreRule::parse_in(line, dir));
                self.nested.extend(rules);
                tracing::debug!(
                    path = %path.display(),
                    count = self.nested.len() - rules_start,
                    "loaded nested ignore rules"
                );
            }
            Err(err) if err.kind() == io::ErrorKind::NotFound => {}
            Err(err) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %err,
                    "cannot read ignore file, skipping it"
                )
            }
        }
        self.frames.push(Frame { dir: dir.to_string(), rules_start });
    }
}

fn is_same_or_ancestor(ancestor: &str, dir: &str) -> bool {
    dir.strip_prefix(ancestor).is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Config;
    use crate::filter::build_rule_set;
    use tempfile::TempDir;

    fn fixture() -> TempDir {
        let temp = TempDir::new().expect("temp dir");
        let root = temp.path();
        fs::create_dir_all(root.join("sub/deep")).expect("mkdir");
        fs::create_dir_all(root.join("other")).expect("mkdir");
        fs::write(root.join("sub/.gitignore"), "secret.txt\n/local.txt\n").expect("write");
        fs::write(root.join("sub/deep/.gitignore"), "!secret.txt\n").expect("write");
        temp
    }

    #[test]
    fn nested_gitignore_applies_to_its_subtree_only() {
        let temp = fixture();
        let rules = build_rule_set(temp.path(), &Config::default(), &[]);
        let mut scope = IgnoreScope::new(&rules, temp.path());

        scope.enter("sub");
        assert!(scope.is_excluded("sub/secret.txt", false));
        assert!(scope.is_excluded("sub/local.txt", false));
        assert!(!scope.is_excluded("sub/ok.txt", false));

        scope.enter("other");
        assert!(!scope.is_excluded("other/secret.txt", false));
    }

    #[test]
    fn deeper_gitignore_wins_and_anchors_locally() {
        let temp = fixture();
        let rules = build_rule_set(temp.path(), &Config::default(), &[]);
        let mut scope = IgnoreScope::new(&rules, temp.path());

        scope.enter("sub/deep");
        assert!(!scope.is_excluded("sub/deep/secret.txt", false));
        assert!(!scope.is_excluded("sub/deep/local.txt", false));

        scope.enter("sub");
        assert!(scope.is_excluded("sub/secret.txt", false));
    }

    #[test]
    fn configured_patterns_outrank_nested_gitignore() {
        let temp = fixture();
        let config =
            Config { exclude_patterns: vec!["!secret.txt".to_string()], ..Config::default() };
        let rules = build_rule_set(temp.path(), &config, &[]);
        let mut scope = IgnoreScope::new(&rules, temp.path());

        scope.enter("sub");
        assert!(!scope.is_excluded("sub/secret.txt", false));
    }

    #[test]
    fn nested_files_ignored_when_gitignore_disabled() {
        let temp = fixture();
        let config = Config { respect_gitignore: false, ..Config::default() };
        let rules = build_rule_set(temp.path(), &config, &[]);
        let mut scope = IgnoreScope::new(&rules, temp.path());

        scope.enter("sub");
        assert!(!scope.is_excluded("sub/secret.txt", false));
    }

    #[test]
    fn ancestor_check() {
        assert!(is_same_or_ancestor("sub", "sub"));
        assert!(is_same_or_ancestor("sub", "sub/deep"));
        assert!(!is_same_or_ancestor("sub", "subway"));
    }
}
