//! Execution context builder
//!
//! Executed module code sees exactly four capabilities, injected by
//! construction: its exports slot, a synchronous lookup of already-loaded
//! dependencies, an asynchronous import that triggers a full load, and its own
//! identity/location. Nothing else of the loader is reachable from a
//! [`ScriptEngine`].

use std::sync::Arc;

use async_trait::async_trait;
use futures::future::{self, BoxFuture, FutureExt};
use parking_lot::Mutex;
use tracing::trace;

use crate::error::LoadError;
use crate::identity::{ModuleId, ModulePath};
use crate::loader::Loader;
use crate::module_cache::{LoadResult, ModuleState};
use crate::provider::{ModuleRequest, ResourceDescriptor};
use crate::value::{Exports, Value};

/// Runs transformed code against an [`ExecutionContext`].
#[async_trait]
pub trait ScriptEngine: Send + Sync {
    /// Execute `code`. Exports are communicated through `context.exports()`.
    async fn run(&self, code: &str, context: &ExecutionContext) -> Result<(), LoadError>;
}

/// Identity and location of the executing module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathInfo {
    /// Module cache key
    pub id: ModuleId,
    /// Resolved path
    pub path: ModulePath,
}

impl PathInfo {
    /// Full path of the module (`__filename`)
    pub fn filename(&self) -> &str {
        self.path.as_str()
    }

    /// Directory of the module (`__dirname`)
    pub fn dirname(&self) -> &str {
        self.path.dirname()
    }
}

/// The module's exports slot.
///
/// Starts as an empty object; code may add properties to it or replace the
/// whole value. Its final state is the module's export.
#[derive(Debug, Clone)]
pub struct ExportsSlot(Arc<Mutex<Value>>);

impl ExportsSlot {
    fn new() -> Self {
        Self(Arc::new(Mutex::new(Value::Object(Exports::new()))))
    }

    /// Current exports value
    pub fn get(&self) -> Value {
        self.0.lock().clone()
    }

    /// Current exports object, if the value is still an object
    pub fn object(&self) -> Option<Exports> {
        self.0.lock().as_object().cloned()
    }

    /// Set a property on the exports object.
    ///
    /// If the exports were replaced by a non-object value they are first
    /// reset to a fresh object.
    pub fn set(&self, key: impl Into<String>, value: Value) {
        let mut slot = self.0.lock();
        if slot.as_object().is_none() {
            *slot = Value::object();
        }
        if let Value::Object(obj) = &*slot {
            obj.set(key, value);
        }
    }

    /// Replace the whole exports value
    pub fn replace(&self, value: Value) {
        *self.0.lock() = value;
    }
}

/// Synchronous dependency lookup.
///
/// Only sees modules that already finished loading; it never starts a load.
#[derive(Clone)]
pub struct RequireSync {
    loader: Loader,
    module: PathInfo,
    exports: ExportsSlot,
}

impl RequireSync {
    /// Look up the exports of `specifier`, resolved relative to this module.
    ///
    /// Fails with [`LoadError::NotFound`] if the dependency has not been
    /// loaded yet, and with the retained error if it failed. A specifier that
    /// resolves to this module itself yields its own exports.
    pub fn require(&self, specifier: &str) -> Result<Value, LoadError> {
        let request = ModuleRequest::from_referrer(specifier, self.module.path.clone());
        let resource = self.loader.resolve(&request)?;

        if resource.id == self.module.id {
            return Ok(self.exports.get());
        }

        match self.loader.module_state(&resource.id) {
            Some(ModuleState::Resolved(value)) => Ok(value),
            Some(ModuleState::Failed(err)) => Err(err),
            Some(ModuleState::Pending) | None => Err(LoadError::NotFound {
                specifier: specifier.to_string(),
                referrer: self.module.path.to_string(),
            }),
        }
    }
}

/// Asynchronous dependency import: performs a full load.
#[derive(Clone)]
pub struct ImportAsync {
    loader: Loader,
    module: PathInfo,
    exports: ExportsSlot,
}

impl ImportAsync {
    /// Load `specifier`, resolved relative to this module, and wait for its exports.
    ///
    /// Importing the module itself yields its own exports without waiting.
    pub fn import(&self, specifier: &str) -> BoxFuture<'static, LoadResult> {
        let request = ModuleRequest::from_referrer(specifier, self.module.path.clone());
        match self.loader.resolve(&request) {
            Ok(resource) if resource.id == self.module.id => future::ready(Ok(self.exports.get())).boxed(),
            Ok(resource) => self.loader.load_resource(resource),
            Err(err) => future::ready(Err(err)).boxed(),
        }
    }
}

/// Bindings visible to one executing module. Never shared between modules.
pub struct ExecutionContext {
    exports: ExportsSlot,
    require: RequireSync,
    import: ImportAsync,
    info: PathInfo,
}

impl ExecutionContext {
    /// Build a fresh context for `resource`
    pub fn new(loader: &Loader, resource: &ResourceDescriptor) -> Self {
        let info = PathInfo {
            id: resource.id.clone(),
            path: resource.path.clone(),
        };
        let exports = ExportsSlot::new();
        Self {
            require: RequireSync {
                loader: loader.clone(),
                module: info.clone(),
                exports: exports.clone(),
            },
            import: ImportAsync {
                loader: loader.clone(),
                module: info.clone(),
                exports: exports.clone(),
            },
            exports,
            info,
        }
    }

    /// The module's exports slot
    pub fn exports(&self) -> &ExportsSlot {
        &self.exports
    }

    /// The synchronous lookup capability
    pub fn require_sync(&self) -> &RequireSync {
        &self.require
    }

    /// The asynchronous import capability
    pub fn import_async(&self) -> &ImportAsync {
        &self.import
    }

    /// Identity and location of the module
    pub fn info(&self) -> &PathInfo {
        &self.info
    }

    /// Shorthand for `require_sync().require(specifier)`
    pub fn require(&self, specifier: &str) -> Result<Value, LoadError> {
        self.require.require(specifier)
    }

    /// Shorthand for `import_async().import(specifier)`
    pub fn import(&self, specifier: &str) -> BoxFuture<'static, LoadResult> {
        self.import.import(specifier)
    }
}

/// Execute transformed code for `resource` and return its final exports.
pub async fn execute(
    loader: &Loader,
    engine: &dyn ScriptEngine,
    resource: &ResourceDescriptor,
    code: &str,
) -> LoadResult {
    let context = ExecutionContext::new(loader, resource);
    trace!(target: "dynmod::loader", path = %resource.path, "executing module");
    engine.run(code, &context).await?;
    Ok(context.exports.get())
}
