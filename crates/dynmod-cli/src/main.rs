//! dynmod command-line tool
//!
//! Loads an entry module (and everything it depends on) and prints its
//! exports, and manages the on-disk compilation cache.

mod commands;
mod logging;

use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "dynmod")]
#[command(about = "Dynamic module loader", long_about = None)]
#[command(version)]
struct Cli {
    /// Increase log verbosity (-v debug, -vv trace); DYNMOD_LOG overrides
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load a module and print its exports as JSON
    Run {
        /// Entry module
        entry: PathBuf,
        /// Configuration file (defaults to the nearest dynmod.toml)
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Do not read or write the compilation cache
        #[arg(long)]
        no_cache: bool,
        /// Compilation cache directory
        #[arg(long)]
        cache_dir: Option<PathBuf>,
        /// Override the engine version tag
        #[arg(long)]
        engine_version: Option<String>,
        /// Print loader statistics to stderr
        #[arg(long)]
        stats: bool,
    },

    /// Manage the compilation cache
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },
}

#[derive(Subcommand)]
enum CacheAction {
    /// Print the cache directory
    Path {
        /// Configuration file (defaults to the nearest dynmod.toml)
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Compilation cache directory
        #[arg(long)]
        cache_dir: Option<PathBuf>,
    },
    /// Delete every cached compilation result
    Clear {
        /// Configuration file (defaults to the nearest dynmod.toml)
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Compilation cache directory
        #[arg(long)]
        cache_dir: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    match cli.command {
        Commands::Run {
            entry,
            config,
            no_cache,
            cache_dir,
            engine_version,
            stats,
        } => {
            commands::run::execute(commands::run::RunArgs {
                entry,
                config,
                no_cache,
                cache_dir,
                engine_version,
                stats,
            })
            .await
        }

        Commands::Cache { action } => match action {
            CacheAction::Path { config, cache_dir } => {
                commands::cache::path(config.as_deref(), cache_dir)
            }
            CacheAction::Clear { config, cache_dir } => {
                commands::cache::clear(config.as_deref(), cache_dir)
            }
        },
    }
}
