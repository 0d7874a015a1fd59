//! Directory traversal: tree rendering and context collection.
//!
//! Both walkers share the same sibling ordering and prune excluded
//! directories before opening them.

use std::cmp::Ordering;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub mod collector;
pub mod tree;

pub use collector::{Collection, ContextCollector};
pub use tree::{generate_tree, TreeRender, TreeRenderer};

/// Errors that abort a traversal. Per-entry problems never surface here.
#[derive(Debug, Error)]
pub enum ContextError {
    #[error("root path does not exist: {0}")]
    RootNotFound(PathBuf),

    #[error("root path is not a directory: {0}")]
    NotADirectory(PathBuf),

    #[error("cannot read root directory {path}: {source}")]
    RootUnreadable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Check that `root` exists and is a directory.
pub fn validate_root(root: &Path) -> Result<(), ContextError> {
    match root.metadata() {
        Ok(meta) if meta.is_dir() => Ok(()),
        Ok(_) => Err(ContextError::NotADirectory(root.to_path_buf())),
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            Err(ContextError::RootNotFound(root.to_path_buf()))
        }
        Err(source) => Err(ContextError::RootUnreadable { path: root.to_path_buf(), source }),
    }
}

/// Sibling order: directories first, then case-insensitive name, then exact
/// name so the order is total.
pub fn compare_siblings(a_is_dir: bool, a_name: &str, b_is_dir: bool, b_name: &str) -> Ordering {
    b_is_dir
        .cmp(&a_is_dir)
        .then_with(|| a_name.to_lowercase().cmp(&b_name.to_lowercase()))
        .then_with(|| a_name.cmp(b_name))
}

/// Short, stable description of an I/O error for annotations.
pub fn describe_io_error(err: &io::Error) -> String {
    match err.kind() {
        io::ErrorKind::PermissionDenied => "permission denied".to_string(),
        io::ErrorKind::NotFound => "not found".to_string(),
        _ => err.to_string(),
    }
}
