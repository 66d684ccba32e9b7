//! `dynmod run`: load an entry module and print its exports.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use dynmod_loader::{FsProvider, Loader, Value};
use dynmod_store::DiskStore;

use super::{cache_dir, load_config};

pub struct RunArgs {
    pub entry: PathBuf,
    pub config: Option<PathBuf>,
    pub no_cache: bool,
    pub cache_dir: Option<PathBuf>,
    pub engine_version: Option<String>,
    pub stats: bool,
}

pub async fn execute(args: RunArgs) -> anyhow::Result<()> {
    let (loader, exports) = load(&args).await?;

    println!("{}", serde_json::to_string_pretty(&exports.to_json())?);

    if args.stats {
        let stats = loader.compilation_stats();
        eprintln!(
            "modules: {}, cache hits: {}, misses: {}, stored: {}",
            loader.module_ids().len(),
            stats.hits,
            stats.misses,
            stats.stores
        );
    }
    Ok(())
}

/// Build a loader for the entry's project and load the entry.
pub async fn load(args: &RunArgs) -> anyhow::Result<(Loader, Value)> {
    let entry = args
        .entry
        .canonicalize()
        .with_context(|| format!("Entry not found: {}", args.entry.display()))?;
    let root = entry
        .parent()
        .map(PathBuf::from)
        .context("Entry has no parent directory")?;

    let mut config = load_config(args.config.as_deref(), &entry)?;
    if let Some(version) = &args.engine_version {
        config.engine_version = version.clone();
    }

    let provider = FsProvider::new(root)
        .with_extensions(config.resolve.extensions.clone())
        .with_index(config.resolve.index.clone());

    let mut builder = dynmod_script::loader_builder(Arc::new(provider)).config(&config);
    if config.cache.enabled && !args.no_cache {
        let dir = cache_dir(args.cache_dir.clone(), &config)?;
        let store = DiskStore::open(&dir)
            .with_context(|| format!("Failed to open cache at {}", dir.display()))?;
        tracing::debug!(target: "dynmod::cli", cache = %dir.display(), "compilation cache enabled");
        builder = builder.cache_store(Arc::new(store));
    }
    let loader = builder.build();

    let specifier = entry.to_string_lossy().into_owned();
    let exports = loader
        .import(&specifier)
        .await
        .with_context(|| format!("Failed to load {}", args.entry.display()))?;
    Ok((loader, exports))
}
