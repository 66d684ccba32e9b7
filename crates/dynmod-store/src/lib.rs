//! Compilation cache stores
//!
//! [`CacheStore`](dynmod_loader::CacheStore) backends for the dynmod loader:
//! - [`MemoryStore`]: process-local map, lost on exit
//! - [`DiskStore`]: one file per entry under a cache directory (~/.dynmod/cache/ by default)

mod disk;
mod memory;

pub use disk::DiskStore;
pub use memory::MemoryStore;

use thiserror::Error;

/// Errors that can occur during store operations
#[derive(Debug, Error)]
pub enum StoreError {
    /// IO error (file operations)
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Cache directory could not be determined or created
    #[error("Failed to initialize cache directory: {0}")]
    InitError(String),

    /// Key is not a lowercase hex digest
    #[error("Invalid cache key: {0}")]
    InvalidKey(String),
}
