//! Dynmod module loader
//!
//! Loads dynamically-resolved modules (scripts, module scripts, component
//! descriptions) with these guarantees:
//! - **Single flight**: one identity is fetched, transformed and executed at
//!   most once per [`Loader`], however many concurrent requests arrive.
//! - **Failure memoization**: a failed identity fails the same way for the
//!   rest of the session.
//! - **Compilation cache**: transform output is persisted in a
//!   [`CacheStore`] keyed by a digest of engine version, source and path.
//! - **Dependency ordering**: a module executes only after every declared
//!   dependency loaded.
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use dynmod_loader::{Loader, MemoryProvider};
//!
//! let provider = MemoryProvider::new().with_file("/main.js", "exports.answer = 42");
//! let loader = Loader::builder(Arc::new(provider), transformer, engine).build();
//! let exports = loader.import("/main.js").await?;
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

pub mod compile_cache;
pub mod config;
pub mod context;
pub mod deps;
pub mod dispatch;
pub mod error;
pub mod hash;
pub mod identity;
pub mod loader;
pub mod module_cache;
pub mod provider;
pub mod transform;
pub mod value;

#[cfg(test)]
mod testing;

pub use compile_cache::{CacheStats, CacheStore, CompilationCache, PersistControl};
pub use config::{ConfigError, LoaderConfig, CONFIG_FILE, DEFAULT_ENGINE_VERSION};
pub use context::{ExecutionContext, ExportsSlot, ImportAsync, PathInfo, RequireSync, ScriptEngine};
pub use dispatch::{ComponentCompiler, ModuleHandler, ModuleKind, TypeTable};
pub use error::{LoadError, SourceLocation};
pub use identity::{ModuleId, ModulePath};
pub use loader::{Loader, LoaderBuilder};
pub use module_cache::{LoadResult, ModuleState};
pub use provider::{
    Content, FetchedContent, FsProvider, MemoryProvider, ModuleRequest, ResourceDescriptor,
    ResourceProvider,
};
pub use transform::{CompilationArtifact, Transformer};
pub use value::{Exports, Value};
