//! TOML component descriptions
//!
//! A component is a TOML document whose tables become the module's exports.
//! The optional `[imports]` table maps export names to module specifiers;
//! those modules are loaded (relative to the component) before the component
//! resolves, and their exports are placed under the given names.
//!
//! ```toml
//! name = "button"
//! sizes = [1, 2, 3]
//!
//! [imports]
//! theme = "./theme.js"
//! ```

use async_trait::async_trait;
use dynmod_loader::{ComponentCompiler, LoadError, LoadResult, Loader, ModulePath, ModuleRequest, Value};
use futures::future::{self, join_all, FutureExt};
use tracing::trace;

/// Reserved table listing the component's module imports
pub const IMPORTS_TABLE: &str = "imports";

/// Compiles TOML component descriptions.
#[derive(Debug, Clone, Copy, Default)]
pub struct TomlComponentCompiler;

impl TomlComponentCompiler {
    /// Create a compiler
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ComponentCompiler for TomlComponentCompiler {
    async fn compile(&self, source: &str, path: &ModulePath, loader: &Loader) -> LoadResult {
        let mut table: toml::Table = source.parse().map_err(|e: toml::de::Error| {
            component_error(path, e.message().to_string())
        })?;

        let imports = match table.remove(IMPORTS_TABLE) {
            None => Vec::new(),
            Some(toml::Value::Table(imports)) => imports
                .into_iter()
                .map(|(name, spec)| match spec {
                    toml::Value::String(spec) => Ok((name, spec)),
                    other => Err(component_error(
                        path,
                        format!("import '{}' must be a string, found {}", name, other.type_str()),
                    )),
                })
                .collect::<Result<Vec<_>, _>>()?,
            Some(other) => {
                return Err(component_error(
                    path,
                    format!("'{}' must be a table, found {}", IMPORTS_TABLE, other.type_str()),
                ))
            }
        };

        let exports = Value::object();
        if let Value::Object(obj) = &exports {
            for (key, value) in table {
                obj.set(key, from_toml(value));
            }

            // An import of the component itself yields its own exports.
            let mut loads = Vec::with_capacity(imports.len());
            for (_, spec) in &imports {
                let resource = loader.resolve(&ModuleRequest::from_referrer(spec.as_str(), path.clone()))?;
                loads.push(if resource.path == *path {
                    future::ready(Ok::<_, LoadError>(exports.clone())).boxed()
                } else {
                    loader.load_resource(resource)
                });
            }
            let loaded = join_all(loads).await;
            for ((name, _), value) in imports.into_iter().zip(loaded) {
                obj.set(name, value?);
            }
            trace!(target: "dynmod::script", %path, exports = obj.len(), "compiled component");
        }

        Ok(exports)
    }
}

fn component_error(path: &ModulePath, message: String) -> LoadError {
    LoadError::Component {
        path: path.to_string(),
        message: message.trim().to_string(),
    }
}

fn from_toml(value: toml::Value) -> Value {
    match value {
        toml::Value::String(s) => Value::from(s),
        toml::Value::Integer(i) => Value::Number(i as f64),
        toml::Value::Float(f) => Value::Number(f),
        toml::Value::Boolean(b) => Value::Bool(b),
        toml::Value::Datetime(dt) => Value::from(dt.to_string()),
        toml::Value::Array(items) => Value::from(items.into_iter().map(from_toml).collect::<Vec<_>>()),
        toml::Value::Table(table) => {
            let obj = dynmod_loader::Exports::new();
            for (key, value) in table {
                obj.set(key, from_toml(value));
            }
            Value::Object(obj)
        }
    }
}
