//! CLI command implementations

pub mod cache;
pub mod run;

use std::path::{Path, PathBuf};

use anyhow::Context;
use dynmod_loader::LoaderConfig;
use dynmod_store::DiskStore;

/// Load the explicit config file, or the nearest `dynmod.toml` above `start`,
/// or the defaults when there is none.
pub fn load_config(explicit: Option<&Path>, start: &Path) -> anyhow::Result<LoaderConfig> {
    let path = match explicit {
        Some(path) => Some(path.to_path_buf()),
        None => LoaderConfig::find(start),
    };

    match path {
        Some(path) => {
            tracing::debug!(target: "dynmod::cli", config = %path.display(), "using config file");
            LoaderConfig::from_file(&path)
                .with_context(|| format!("Failed to load config from {}", path.display()))
        }
        None => Ok(LoaderConfig::default()),
    }
}

/// Cache directory: command line, then config, then ~/.dynmod/cache/
pub fn cache_dir(cli: Option<PathBuf>, config: &LoaderConfig) -> anyhow::Result<PathBuf> {
    if let Some(dir) = cli.or_else(|| config.cache.dir.clone()) {
        return Ok(dir);
    }
    DiskStore::default_dir().context("No cache directory configured")
}
