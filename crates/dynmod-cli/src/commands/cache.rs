//! `dynmod cache`: inspect and clear the compilation cache.

use std::path::{Path, PathBuf};

use anyhow::Context;
use dynmod_store::DiskStore;

use super::{cache_dir, load_config};

fn resolve_dir(config: Option<&Path>, cli: Option<PathBuf>) -> anyhow::Result<PathBuf> {
    let cwd = std::env::current_dir().context("Failed to read current directory")?;
    let config = load_config(config, &cwd)?;
    cache_dir(cli, &config)
}

pub fn path(config: Option<&Path>, cli: Option<PathBuf>) -> anyhow::Result<()> {
    println!("{}", resolve_dir(config, cli)?.display());
    Ok(())
}

pub fn clear(config: Option<&Path>, cli: Option<PathBuf>) -> anyhow::Result<()> {
    let dir = resolve_dir(config, cli)?;
    if !dir.exists() {
        println!("No cache directory found.");
        return Ok(());
    }

    let store = DiskStore::open(&dir)?;
    let count = store.len()?;
    store.clear()?;
    println!("Removed {} cached entries from {}", count, dir.display());
    Ok(())
}
