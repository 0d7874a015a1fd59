//! Configuration loading
//!
//! Layers, lowest precedence first: built-in defaults, a config file from the
//! root (or the one passed explicitly), `TREE_CONTEXT_*` environment variables.
//! CLI flags are merged on top by [`merge_cli_with_config`].

use anyhow::{bail, Context, Result};
use figment::providers::{Env, Format, Serialized, Toml, Yaml};
use figment::Figment;
use std::path::{Path, PathBuf};

mod merge;

pub use merge::{merge_cli_with_config, CliOverrides};

use crate::domain::Config;

/// Config file names looked up in the root, in order.
pub const CONFIG_FILE_NAMES: &[&str] =
    &["tree-context.toml", ".tree-context.yml", ".tree-context.yaml"];

/// Prefix for environment overrides; nested keys use `__`
/// (e.g. `TREE_CONTEXT_SUMMARY__MODEL`).
pub const ENV_PREFIX: &str = "TREE_CONTEXT_";

/// Load configuration for a run anchored at `anchor`. An explicit config path
/// must exist.
pub fn load_config(anchor: &Path, explicit: Option<&Path>) -> Result<Config> {
    let file = match explicit {
        Some(path) => {
            if !path.is_file() {
                bail!("Config file not found: {}", path.display());
            }
            Some(path.to_path_buf())
        }
        None => find_config_file(anchor),
    };

    let mut figment = Figment::from(Serialized::defaults(Config::default()));
    if let Some(path) = &file {
        tracing::debug!(path = %path.display(), "loading config file");
        figment = if is_yaml(path) {
            figment.merge(Yaml::file(path))
        } else {
            figment.merge(Toml::file(path))
        };
    }
    figment = figment.merge(Env::prefixed(ENV_PREFIX).split("__"));

    figment.extract().with_context(|| match &file {
        Some(path) => format!("Invalid configuration in {}", path.display()),
        None => "Invalid configuration".to_string(),
    })
}

fn find_config_file(anchor: &Path) -> Option<PathBuf> {
    CONFIG_FILE_NAMES.iter().map(|name| anchor.join(name)).find(|p| p.is_file())
}

fn is_yaml(path: &Path) -> bool {
    matches!(path.extension().and_then(|e| e.to_str()), Some("yml" | "yaml"))
}
