//! Unicode box-drawing tree rendering.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use super::{compare_siblings, describe_io_error, validate_root, ContextError};
use crate::filter::{IgnoreRuleSet, IgnoreScope};

const BRANCH: &str = "├── ";
const LAST_BRANCH: &str = "└── ";
const PIPE: &str = "│   ";
const SPACE: &str = "    ";

/// Rendered tree plus the number of directories and files it shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeRender {
    pub text: String,
    pub directories: usize,
    pub files: usize,
}

#[derive(Debug)]
enum ChildKind {
    Dir,
    File,
    Symlink(Option<PathBuf>),
    /// File type could not be determined
    Unknown,
}

#[derive(Debug)]
struct Child {
    name: String,
    path: PathBuf,
    relative_path: String,
    kind: ChildKind,
}

pub struct TreeRenderer<'a> {
    rules: &'a IgnoreRuleSet,
    max_depth: Option<usize>,
}

impl<'a> TreeRenderer<'a> {
    pub fn new(rules: &'a IgnoreRuleSet) -> Self {
        Self { rules, max_depth: None }
    }

    /// Directories deeper than `max_depth` levels below the root are shown
    /// but not expanded. `Some(0)` renders the root line only.
    pub fn max_depth(mut self, max_depth: Option<usize>) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn render(&self, root: &Path) -> Result<TreeRender, ContextError> {
        validate_root(root)?;
        let mut scope = IgnoreScope::new(self.rules, root);
        let children = self
            .list_children(root, "", &mut scope)
            .map_err(|source| ContextError::RootUnreadable { path: root.to_path_buf(), source })?;

        let mut out =
            TreeRender { text: format!("{}/\n", root_name(root)), directories: 0, files: 0 };
        if self.max_depth != Some(0) {
            self.render_children(&children, "", 1, &mut scope, &mut out);
        }
        Ok(out)
    }

    fn render_children(
        &self,
        children: &[Child],
        prefix: &str,
        depth: usize,
        scope: &mut IgnoreScope<'_>,
        out: &mut TreeRender,
    ) {
        for (idx, child) in children.iter().enumerate() {
            let is_last = idx + 1 == children.len();
            let connector = if is_last { LAST_BRANCH } else { BRANCH };
            let line_prefix = format!("{prefix}{connector}");
            let child_prefix = format!("{prefix}{}", if is_last { SPACE } else { PIPE });

            match &child.kind {
                ChildKind::Dir => {
                    out.directories += 1;
                    if self.max_depth.is_some_and(|max| depth >= max) {
                        push_line(out, &line_prefix, &format!("{}/", child.name));
                        continue;
                    }
                    match self.list_children(&child.path, &child.relative_path, scope) {
                        Ok(grandchildren) => {
                            push_line(out, &line_prefix, &format!("{}/", child.name));
                            self.render_children(
                                &grandchildren,
                                &child_prefix,
                                depth + 1,
                                scope,
                                out,
                            );
                        }
                        Err(err) => {
                            tracing::debug!(
                                path = %child.path.display(),
                                error = %err,
                                "cannot list directory"
                            );
                            push_line(
                                out,
                                &line_prefix,
                                &format!(
                                    "{}/ [access error: {}]",
                                    child.name,
                                    describe_io_error(&err)
                                ),
                            );
                        }
                    }
                }
                ChildKind::File => {
                    out.files += 1;
                    push_line(out, &line_prefix, &child.name);
                }
                ChildKind::Symlink(target) => {
                    out.files += 1;
                    let label = match target {
                        Some(target) => format!("{} -> {} [symlink]", child.name, target.display()),
                        None => format!("{} [symlink]", child.name),
                    };
                    push_line(out, &line_prefix, &label);
                }
                ChildKind::Unknown => {
                    out.files += 1;
                    push_line(out, &line_prefix, &format!("{} [unreadable]", child.name));
                }
            }
        }
    }

    /// Sorted, non-excluded entries of `dir`. Excluded directories are
    /// dropped here, so they are never opened.
    fn list_children(
        &self,
        dir: &Path,
        relative_dir: &str,
        scope: &mut IgnoreScope<'_>,
    ) -> io::Result<Vec<Child>> {
        let entries = fs::read_dir(dir)?;
        scope.enter(relative_dir);
        let mut children = Vec::new();
        for entry in entries {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    tracing::warn!(dir = %dir.display(), error = %err, "skipping unreadable entry");
                    continue;
                }
            };
            let name = entry.file_name().to_string_lossy().into_owned();
            let kind = match entry.file_type() {
                Ok(ft) if ft.is_symlink() => {
                    ChildKind::Symlink(fs::read_link(entry.path()).ok())
                }
                Ok(ft) if ft.is_dir() => ChildKind::Dir,
                Ok(_) => ChildKind::File,
                Err(err) => {
                    tracing::debug!(
                        path = %entry.path().display(),
                        error = %err,
                        "cannot stat entry"
                    );
                    ChildKind::Unknown
                }
            };
            let relative_path = if relative_dir.is_empty() {
                name.clone()
            } else {
                format!("{relative_dir}/{name}")
            };
            let is_dir = matches!(kind, ChildKind::Dir);
            if scope.is_excluded(&relative_path, is_dir) {
                continue;
            }
            children.push(Child { name, path: entry.path(), relative_path, kind });
        }
        children.sort_by(|a, b| {
            compare_siblings(
                matches!(a.kind, ChildKind::Dir),
                &a.name,
                matches!(b.kind, ChildKind::Dir),
                &b.name,
            )
        });
        Ok(children)
    }
}

/// Render `root` with the given rules and optional depth limit.
pub fn generate_tree(
    root: &Path,
    rules: &IgnoreRuleSet,
    max_depth: Option<usize>,
) -> Result<TreeRender, ContextError> {
    TreeRenderer::new(rules).max_depth(max_depth).render(root)
}

fn push_line(out: &mut TreeRender, prefix: &str, label: &str) {
    out.text.push_str(prefix);
    out.text.push_str(label);
    out.text.push('\n');
}

fn root_name(root: &Path) -> String {
    root.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| root.display().to_string())
}
