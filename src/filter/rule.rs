//! A single gitignore-style rule.

use globset::{GlobBuilder, GlobMatcher};

/// How a rule's pattern is compared against a path.
#[derive(Debug, Clone)]
enum RuleMatcher {
    Glob(GlobMatcher),
    /// Fallback for patterns that are not valid globs
    Literal(String),
}

/// One parsed pattern line.
#[derive(Debug, Clone)]
pub struct IgnoreRule {
    /// Pattern text as written (after comment/whitespace handling)
    pub source: String,
    pub is_negation: bool,
    pub is_directory_only: bool,
    /// Matched against the whole path below `base` instead of the file name
    pub is_anchored: bool,
    /// Directory (root-relative) whose ignore file declared the rule; empty for
    /// root-level rules. The rule only applies below it.
    pub base: String,
    matcher: RuleMatcher,
}

impl IgnoreRule {
    /// Parse one pattern line. Blank lines and `#` comments yield `None`.
    ///
    /// Patterns that fail to compile as globs are kept as literal string
    /// matches; parsing never fails.
    pub fn parse(line: &str) -> Option<Self> {
        Self::parse_in(line, "")
    }

    /// Parse a line from the ignore file of directory `base`, so anchoring is
    /// relative to that directory.
    pub fn parse_in(line: &str, base: &str) -> Option<Self> {
        let line = line.trim_end();
        if line.is_empty() || line.starts_with('#') {
            return None;
        }

        let source = line.to_string();
        let mut pattern = line;
        let mut is_negation = false;
        if let Some(rest) = pattern.strip_prefix('!') {
            is_negation = true;
            pattern = rest;
        } else if let Some(rest) = pattern.strip_prefix('\\') {
            // `\#` and `\!` escape a leading special character.
            if rest.starts_with('#') || rest.starts_with('!') {
                pattern = rest;
            }
        }

        let mut is_directory_only = false;
        if let Some(rest) = pattern.strip_suffix('/') {
            is_directory_only = true;
            pattern = rest;
        }

        let mut is_anchored = false;
        if let Some(rest) = pattern.strip_prefix('/') {
            is_anchored = true;
            pattern = rest;
        }
        if pattern.contains('/') {
            is_anchored = true;
        }

        if pattern.is_empty() {
            return None;
        }

        let matcher = match GlobBuilder::new(pattern)
            .literal_separator(true)
            .backslash_escape(true)
            .build()
        {
            Ok(glob) => RuleMatcher::Glob(glob.compile_matcher()),
            Err(err) => {
                tracing::debug!(pattern, error = %err, "invalid glob, matching literally");
                RuleMatcher::Literal(pattern.to_string())
            }
        };

        Some(Self {
            source,
            is_negation,
            is_directory_only,
            is_anchored,
            base: base.trim_matches('/').to_string(),
            matcher,
        })
    }

    /// Whether this rule applies to `relative_path` (root-relative, `/`-separated).
    pub fn matches(&self, relative_path: &str, is_dir: bool) -> bool {
        if self.is_directory_only && !is_dir {
            return false;
        }
        let relative_path = if self.base.is_empty() {
            relative_path
        } else {
            match relative_path
                .strip_prefix(self.base.as_str())
                .and_then(|rest| rest.strip_prefix('/'))
            {
                Some(rest) if !rest.is_empty() => rest,
                _ => return false,
            }
        };
        let target = if self.is_anchored {
            relative_path
        } else {
            relative_path.rsplit('/').next().unwrap_or(relative_path)
        };
        match &self.matcher {
            RuleMatcher::Glob(glob) => glob.is_match(target),
            RuleMatcher::Literal(literal) => literal == target,
        }
    }

    pub fn is_literal_fallback(&self) -> bool {
        matches!(self.matcher, RuleMatcher::Literal(_))
    }
}
