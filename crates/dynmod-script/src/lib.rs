//! Reference script language for dynmod
//!
//! A small line-oriented language used to drive the loader end to end:
//!
//! ```text
//! use "./config"                  # dependency, loaded before the module runs
//! let config = require "./config"
//! exports.greeting = config.greeting
//! exports.later = import "./lazy" # loaded on demand
//! export name = "demo"            # module scripts (.mjs) only
//! throw "unsupported platform"
//! ```
//!
//! Components (`.toml`) are compiled by [`TomlComponentCompiler`].

pub mod ast;
pub mod component;
pub mod parser;
pub mod runtime;
pub mod token;
mod transformer;

use std::sync::Arc;

use dynmod_loader::{Loader, LoaderBuilder, ResourceProvider};

pub use component::TomlComponentCompiler;
pub use runtime::ScriptRuntime;
pub use transformer::{EnvSource, ScriptTransformer};

/// A loader builder wired with the script transformer, runtime and component compiler
pub fn loader_builder(provider: Arc<dyn ResourceProvider>) -> LoaderBuilder {
    Loader::builder(
        provider,
        Arc::new(ScriptTransformer::new()),
        Arc::new(ScriptRuntime::new()),
    )
    .component_compiler(Arc::new(TomlComponentCompiler::new()))
}
