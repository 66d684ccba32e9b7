//! Module loader
//!
//! A [`Loader`] is one loading session: it owns the module cache and the
//! compilation cache front-end, and wires the collaborators together.
//!
//! Loading an identity for the first time claims it in the module cache
//! before anything suspends, then runs fetch → dispatch → (transform,
//! dependencies, execute). The load body records its own outcome in the
//! cache, so every waiter observes the same settled entry. Failures are
//! retained: a failed identity is not retried within a session.

use std::fmt;
use std::sync::Arc;

use futures::future::{self, BoxFuture, FutureExt};
use tracing::{debug, trace};

use crate::compile_cache::{CacheStats, CacheStore, CompilationCache};
use crate::config::{LoaderConfig, DEFAULT_ENGINE_VERSION};
use crate::context::ScriptEngine;
use crate::dispatch::{ComponentCompiler, Dispatcher, ModuleHandler, TypeTable};
use crate::error::LoadError;
use crate::identity::ModuleId;
use crate::module_cache::{Claim, LoadResult, ModuleCache, ModuleState};
use crate::provider::{ModuleRequest, ResourceDescriptor, ResourceProvider};
use crate::transform::Transformer;
use crate::value::Value;

struct LoaderInner {
    provider: Arc<dyn ResourceProvider>,
    modules: ModuleCache,
    compilation: CompilationCache,
    dispatcher: Dispatcher,
    engine_version: String,
}

/// A loading session. Cheap to clone; clones share all state.
#[derive(Clone)]
pub struct Loader {
    inner: Arc<LoaderInner>,
}

impl fmt::Debug for Loader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Loader")
            .field("engine_version", &self.inner.engine_version)
            .field("modules", &self.inner.modules.len())
            .field("compilation", &self.inner.compilation.stats())
            .finish()
    }
}

impl Loader {
    /// Start building a loader from its required collaborators
    pub fn builder(
        provider: Arc<dyn ResourceProvider>,
        transformer: Arc<dyn Transformer>,
        engine: Arc<dyn ScriptEngine>,
    ) -> LoaderBuilder {
        LoaderBuilder::new(provider, transformer, engine)
    }

    /// Load a top-level specifier
    pub fn import(&self, specifier: &str) -> BoxFuture<'static, LoadResult> {
        self.load(ModuleRequest::root(specifier))
    }

    /// Resolve and load a request.
    ///
    /// Resolution and cache claiming happen before this returns, so two calls
    /// for the same identity share one load even if neither has been polled.
    pub fn load(&self, request: ModuleRequest) -> BoxFuture<'static, LoadResult> {
        match self.resolve(&request) {
            Ok(resource) => self.load_resource(resource),
            Err(err) => future::ready(Err(err)).boxed(),
        }
    }

    /// Load an already-resolved resource through the module cache.
    pub fn load_resource(&self, resource: ResourceDescriptor) -> BoxFuture<'static, LoadResult> {
        let id = resource.id.clone();
        let claim = self.inner.modules.claim(&id, || {
            let this = self.clone();
            async move {
                let outcome = this.produce(&resource).await;
                this.inner.modules.settle(&resource.id, &outcome);
                match &outcome {
                    Ok(_) => debug!(target: "dynmod::loader", id = %resource.id, "module loaded"),
                    Err(err) => debug!(target: "dynmod::loader", id = %resource.id, error = %err, "module failed"),
                }
                outcome
            }
            .boxed()
        });

        match claim {
            Claim::Settled(outcome) => future::ready(outcome).boxed(),
            Claim::InFlight { load, installed } => {
                if installed {
                    debug!(target: "dynmod::loader", %id, "loading module");
                } else {
                    trace!(target: "dynmod::loader", %id, "joining in-flight load");
                }
                load.boxed()
            }
        }
    }

    /// The load body: fetch, then dispatch by type tag.
    async fn produce(&self, resource: &ResourceDescriptor) -> LoadResult {
        let fetched = self.inner.provider.fetch(resource).await?;
        trace!(
            target: "dynmod::loader",
            path = %resource.path,
            type_tag = %fetched.type_tag,
            bytes = fetched.content.len(),
            "fetched module"
        );
        self.inner.dispatcher.handle(self, resource, fetched).await
    }

    /// Resolve a request with the session's provider
    pub fn resolve(&self, request: &ModuleRequest) -> Result<ResourceDescriptor, LoadError> {
        self.inner.provider.resolve(request)
    }

    /// Exports of a module that finished loading
    pub fn cached(&self, id: &ModuleId) -> Option<Value> {
        self.inner.modules.resolved(id)
    }

    /// State of an identity in the module cache
    pub fn module_state(&self, id: &ModuleId) -> Option<ModuleState> {
        self.inner.modules.state(id)
    }

    /// All identities known to this session
    pub fn module_ids(&self) -> Vec<ModuleId> {
        self.inner.modules.ids()
    }

    /// Compilation cache statistics
    pub fn compilation_stats(&self) -> CacheStats {
        self.inner.compilation.stats()
    }

    /// Engine version tag mixed into compilation cache keys
    pub fn engine_version(&self) -> &str {
        &self.inner.engine_version
    }

    pub(crate) fn compilation(&self) -> &CompilationCache {
        &self.inner.compilation
    }
}

/// Builder for [`Loader`].
pub struct LoaderBuilder {
    provider: Arc<dyn ResourceProvider>,
    transformer: Arc<dyn Transformer>,
    engine: Arc<dyn ScriptEngine>,
    store: Option<Arc<dyn CacheStore>>,
    components: Option<Arc<dyn ComponentCompiler>>,
    handler: Option<Arc<dyn ModuleHandler>>,
    types: TypeTable,
    engine_version: String,
    modules: Vec<(ModuleId, Value)>,
}

impl LoaderBuilder {
    /// Create a builder with default settings and no cache store
    pub fn new(
        provider: Arc<dyn ResourceProvider>,
        transformer: Arc<dyn Transformer>,
        engine: Arc<dyn ScriptEngine>,
    ) -> Self {
        Self {
            provider,
            transformer,
            engine,
            store: None,
            components: None,
            handler: None,
            types: TypeTable::default(),
            engine_version: DEFAULT_ENGINE_VERSION.to_string(),
            modules: Vec::new(),
        }
    }

    /// Apply engine version and type tags from a configuration
    pub fn config(mut self, config: &LoaderConfig) -> Self {
        self.engine_version = config.engine_version.clone();
        self.types = config.type_table();
        self
    }

    /// Persist compilation results in `store`
    pub fn cache_store(mut self, store: Arc<dyn CacheStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Handle component descriptions with `compiler`
    pub fn component_compiler(mut self, compiler: Arc<dyn ComponentCompiler>) -> Self {
        self.components = Some(compiler);
        self
    }

    /// Try `handler` before built-in dispatch
    pub fn handler(mut self, handler: Arc<dyn ModuleHandler>) -> Self {
        self.handler = Some(handler);
        self
    }

    /// Replace the type tag table
    pub fn types(mut self, types: TypeTable) -> Self {
        self.types = types;
        self
    }

    /// Override the engine version tag
    pub fn engine_version(mut self, version: impl Into<String>) -> Self {
        self.engine_version = version.into();
        self
    }

    /// Pre-seed a resolved module (e.g. a host-provided library)
    pub fn module(mut self, id: impl Into<ModuleId>, value: Value) -> Self {
        self.modules.push((id.into(), value));
        self
    }

    /// Build the loader
    pub fn build(self) -> Loader {
        let modules = ModuleCache::new();
        for (id, value) in self.modules {
            modules.preload(id, value);
        }

        Loader {
            inner: Arc::new(LoaderInner {
                provider: self.provider,
                modules,
                compilation: CompilationCache::new(self.store),
                dispatcher: Dispatcher {
                    types: self.types,
                    transformer: self.transformer,
                    engine: self.engine,
                    components: self.components,
                    handler: self.handler,
                },
                engine_version: self.engine_version,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::ModuleKind;
    use crate::identity::ModulePath;
    use crate::provider::{Content, MemoryProvider};
    use crate::testing::{fixtures, MapStore, MockEngine, MockTransformer};
    use async_trait::async_trait;
    use std::time::Duration;

    fn session(provider: &Arc<MemoryProvider>) -> (Loader, Arc<MockTransformer>, Arc<MockEngine>) {
        let (transformer, engine) = fixtures();
        let loader = Loader::builder(provider.clone(), transformer.clone(), engine.clone()).build();
        (loader, transformer, engine)
    }

    fn id(path: &str) -> ModuleId {
        ModuleId::from(path)
    }

    #[tokio::test]
    async fn test_concurrent_imports_share_one_load() {
        let provider = Arc::new(MemoryProvider::new().with_file("/a.js", "yield\nset x 1"));
        let (loader, transformer, engine) = session(&provider);

        let (first, second) = tokio::join!(loader.import("/a.js"), loader.import("./a.js"));
        let first = first.unwrap();
        let second = second.unwrap();

        assert!(Value::same(&first, &second));
        assert_eq!(provider.fetch_count(), 1);
        assert_eq!(transformer.calls(), 1);
        assert_eq!(engine.runs(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_single_flight_across_threads() {
        let provider = Arc::new(MemoryProvider::new().with_file("/a.js", "yield\nyield\nset x 1"));
        let (loader, _, engine) = session(&provider);

        let tasks: Vec<_> = (0..16)
            .map(|_| {
                let loader = loader.clone();
                tokio::spawn(async move { loader.import("/a.js").await })
            })
            .collect();

        let mut values = Vec::new();
        for task in tasks {
            values.push(task.await.unwrap().unwrap());
        }

        assert_eq!(provider.fetch_count(), 1);
        assert_eq!(engine.runs(), 1);
        assert!(values.windows(2).all(|pair| Value::same(&pair[0], &pair[1])));
    }

    #[tokio::test]
    async fn test_failure_is_memoized() {
        let provider = Arc::new(MemoryProvider::new().with_file("/bad.js", "fail boom"));
        let (loader, _, engine) = session(&provider);

        let first = loader.import("/bad.js").await.unwrap_err();
        let second = loader.import("/bad.js").await.unwrap_err();

        assert_eq!(first, second);
        assert!(first.to_string().contains("boom"));
        assert_eq!(provider.fetch_count(), 1);
        assert_eq!(engine.runs(), 1);
        assert!(matches!(
            loader.module_state(&id("/bad.js")),
            Some(ModuleState::Failed(LoadError::Execution { .. }))
        ));
    }

    #[tokio::test]
    async fn test_concurrent_waiters_share_one_failure() {
        let provider = Arc::new(MemoryProvider::new().with_file("/bad.js", "yield\nfail boom"));
        let (loader, transformer, engine) = session(&provider);

        let (first, second, third) = tokio::join!(
            loader.import("/bad.js"),
            loader.import("./bad.js"),
            loader.import("/bad.js")
        );
        let first = first.unwrap_err();

        assert_eq!(first, second.unwrap_err());
        assert_eq!(first, third.unwrap_err());
        assert!(matches!(first, LoadError::Execution { .. }));
        assert_eq!(provider.fetch_count(), 1);
        assert_eq!(transformer.calls(), 1);
        assert_eq!(engine.runs(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_failure_shared_across_threads() {
        let provider = Arc::new(MemoryProvider::new().with_file("/bad.js", "yield\nyield\nfail boom"));
        let (loader, _, engine) = session(&provider);

        let tasks: Vec<_> = (0..8)
            .map(|_| {
                let loader = loader.clone();
                tokio::spawn(async move { loader.import("/bad.js").await })
            })
            .collect();

        let mut errors = Vec::new();
        for task in tasks {
            errors.push(task.await.unwrap().unwrap_err());
        }

        assert!(errors.windows(2).all(|pair| pair[0] == pair[1]));
        assert_eq!(provider.fetch_count(), 1);
        assert_eq!(engine.runs(), 1);
    }

    #[tokio::test]
    async fn test_transform_error_is_memoized_with_location() {
        let provider = Arc::new(MemoryProvider::new().with_file("/bad.js", "set x 1\nerror nope"));
        let (loader, transformer, engine) = session(&provider);

        let err = loader.import("/bad.js").await.unwrap_err();
        assert_eq!(err.location().map(|loc| loc.line), Some(2));
        assert!(loader.import("/bad.js").await.is_err());
        assert_eq!(transformer.calls(), 1);
        assert_eq!(engine.runs(), 0);
    }

    #[tokio::test]
    async fn test_dependencies_load_before_execution() {
        let provider = Arc::new(
            MemoryProvider::new()
                .with_file("/main.js", "dep ./dep.js\nrequire d ./dep.js")
                .with_file("/dep.js", "set name dep"),
        );
        let (loader, _, _) = session(&provider);

        let exports = loader.import("/main.js").await.unwrap();
        let dep = exports.get("d").unwrap();
        assert_eq!(dep.get("name").unwrap().as_str(), Some("dep"));
        assert!(Value::same(&dep, &loader.cached(&id("/dep.js")).unwrap()));
    }

    #[tokio::test]
    async fn test_require_without_declaration_is_not_found() {
        let provider = Arc::new(
            MemoryProvider::new()
                .with_file("/main.js", "require d ./dep.js")
                .with_file("/dep.js", "set name dep"),
        );
        let (loader, _, _) = session(&provider);

        let err = loader.import("/main.js").await.unwrap_err();
        assert!(matches!(err, LoadError::NotFound { ref specifier, .. } if specifier == "./dep.js"));
        assert_eq!(provider.fetch_count_for("/dep.js"), 0);
    }

    #[tokio::test]
    async fn test_async_import_loads_and_caches() {
        let provider = Arc::new(
            MemoryProvider::new()
                .with_file("/main.js", "import lazy ./lazy.js\nrequire again ./lazy.js")
                .with_file("/lazy.js", "set ok yes"),
        );
        let (loader, _, _) = session(&provider);

        let exports = loader.import("/main.js").await.unwrap();
        assert!(Value::same(&exports.get("lazy").unwrap(), &exports.get("again").unwrap()));
        assert!(loader.cached(&id("/lazy.js")).is_some());
    }

    #[tokio::test]
    async fn test_shared_dependency_has_one_identity() {
        let provider = Arc::new(
            MemoryProvider::new()
                .with_file(
                    "/main.js",
                    "dep ./a.js\ndep ./b.js\nrequire a ./a.js\nrequire b ./b.js",
                )
                .with_file("/a.js", "dep ./lib/shared.js\nrequire s ./lib/shared.js")
                .with_file("/b.js", "dep ./lib/../lib/shared.js\nrequire s ./lib/shared.js")
                .with_file("/lib/shared.js", "yield\nset v 1"),
        );
        let (loader, _, engine) = session(&provider);

        let main = loader.import("/main.js").await.unwrap();
        let from_a = main.get("a").unwrap().get("s").unwrap();
        let from_b = main.get("b").unwrap().get("s").unwrap();

        assert!(Value::same(&from_a, &from_b));
        assert_eq!(engine.runs_for("/lib/shared.js"), 1);
        assert_eq!(provider.fetch_count_for("/lib/shared.js"), 1);
    }

    #[tokio::test]
    async fn test_self_import_does_not_deadlock() {
        let provider = Arc::new(
            MemoryProvider::new().with_file("/self.js", "dep ./self.js\nset x 1\nimport me ./self.js\nrequire again ./self.js"),
        );
        let (loader, _, _) = session(&provider);

        let exports = tokio::time::timeout(Duration::from_secs(5), loader.import("/self.js"))
            .await
            .expect("self import deadlocked")
            .unwrap();

        assert!(Value::same(&exports, &exports.get("me").unwrap()));
        assert!(Value::same(&exports, &exports.get("again").unwrap()));
        assert_eq!(provider.fetch_count(), 1);
    }

    #[tokio::test]
    async fn test_dependency_failure_fails_dependent() {
        let provider = Arc::new(
            MemoryProvider::new()
                .with_file("/main.js", "dep ./ok.js\ndep ./bad.js\nset x 1")
                .with_file("/ok.js", "set fine 1")
                .with_file("/bad.js", "fail broken"),
        );
        let (loader, _, engine) = session(&provider);

        let err = loader.import("/main.js").await.unwrap_err();
        assert_eq!(err.path(), Some("/bad.js"));
        assert_eq!(engine.runs_for("/main.js"), 0);
        assert!(loader.cached(&id("/ok.js")).is_some());
        assert!(matches!(loader.module_state(&id("/main.js")), Some(ModuleState::Failed(_))));
    }

    #[tokio::test]
    async fn test_unresolvable_dependency_fails_dependent() {
        let provider = Arc::new(MemoryProvider::new().with_file("/main.js", "dep ./missing.js"));
        let (loader, _, _) = session(&provider);

        let err = loader.import("/main.js").await.unwrap_err();
        assert!(matches!(err, LoadError::Resolution { .. }));
    }

    #[tokio::test]
    async fn test_compilation_cache_survives_sessions() {
        let provider = Arc::new(MemoryProvider::new().with_file("/a.js", "set x 1"));
        let store = Arc::new(MapStore::default());

        let (transformer, engine) = fixtures();
        let first = Loader::builder(provider.clone(), transformer.clone(), engine)
            .cache_store(store.clone())
            .build();
        first.import("/a.js").await.unwrap();
        assert_eq!(transformer.calls(), 1);
        assert_eq!(store.len(), 1);

        let (transformer, engine) = fixtures();
        let second = Loader::builder(provider.clone(), transformer.clone(), engine.clone())
            .cache_store(store.clone())
            .build();
        let exports = second.import("/a.js").await.unwrap();
        assert_eq!(exports.get("x").unwrap().as_str(), Some("1"));
        assert_eq!(transformer.calls(), 0);
        assert_eq!(engine.runs(), 1);
        assert_eq!(second.compilation_stats().hits, 1);

        let (transformer, engine) = fixtures();
        let bumped = Loader::builder(provider, transformer.clone(), engine)
            .cache_store(store.clone())
            .engine_version("other/2")
            .build();
        bumped.import("/a.js").await.unwrap();
        assert_eq!(transformer.calls(), 1);
        assert_eq!(store.len(), 2);
    }

    #[tokio::test]
    async fn test_syntax_mode_separates_compilation_keys() {
        let provider = Arc::new(MemoryProvider::new().with_file("/a.js", "set x 1"));
        let store = Arc::new(MapStore::default());

        let (transformer, engine) = fixtures();
        Loader::builder(provider.clone(), transformer.clone(), engine)
            .cache_store(store.clone())
            .types(TypeTable::empty().with(".js", ModuleKind::ModuleScript))
            .build()
            .import("/a.js")
            .await
            .unwrap();
        assert_eq!(transformer.calls(), 1);

        let (transformer, engine) = fixtures();
        let plain = Loader::builder(provider, transformer.clone(), engine)
            .cache_store(store.clone())
            .types(TypeTable::empty().with(".js", ModuleKind::Script))
            .build();
        plain.import("/a.js").await.unwrap();

        assert_eq!(transformer.calls(), 1);
        assert_eq!(plain.compilation_stats().hits, 0);
        assert_eq!(store.len(), 2);
    }

    #[tokio::test]
    async fn test_prevent_persist_skips_store() {
        let provider = Arc::new(MemoryProvider::new().with_file("/a.js", "set x 1"));
        let store = Arc::new(MapStore::default());
        let transformer = Arc::new(MockTransformer::volatile());
        let engine = Arc::new(MockEngine::default());

        let loader = Loader::builder(provider, transformer.clone(), engine)
            .cache_store(store.clone())
            .build();
        loader.import("/a.js").await.unwrap();

        assert_eq!(transformer.calls(), 1);
        assert_eq!(store.len(), 0);
    }

    #[tokio::test]
    async fn test_debug_shows_session_summary() {
        let provider = Arc::new(MemoryProvider::new().with_file("/a.js", "set x 1"));
        let (transformer, engine) = fixtures();
        let loader = Loader::builder(provider, transformer, engine)
            .engine_version("debug/1")
            .build();
        loader.import("/a.js").await.unwrap();

        let text = format!("{:?}", loader);
        assert!(text.starts_with("Loader"));
        assert!(text.contains("debug/1"));
        assert!(text.contains("modules: 1"));
    }

    #[tokio::test]
    async fn test_preseeded_module() {
        let host = Value::object();
        if let Some(obj) = host.as_object() {
            obj.set("name", Value::from("host"));
        }

        let provider = Arc::new(MemoryProvider::new().with_file("/main.js", "dep host\nrequire h host"));
        let (transformer, engine) = fixtures();
        let loader = Loader::builder(provider.clone(), transformer, engine)
            .module("host", host.clone())
            .build();

        let exports = loader.import("/main.js").await.unwrap();
        assert!(Value::same(&exports.get("h").unwrap(), &host));
        assert!(Value::same(&loader.import("host").await.unwrap(), &host));
        assert_eq!(provider.fetch_count_for("host"), 0);
        assert_eq!(loader.module_ids(), vec![id("/main.js"), id("host")]);
    }

    #[tokio::test]
    async fn test_unsupported_types() {
        let provider = Arc::new(
            MemoryProvider::new()
                .with_file("/logo.png", "binary")
                .with_file("/widget.toml", "name = 'w'"),
        );
        let (loader, _, _) = session(&provider);

        let err = loader.import("/logo.png").await.unwrap_err();
        assert!(matches!(err, LoadError::UnsupportedType { ref type_tag, .. } if type_tag == ".png"));

        // no component compiler configured
        let err = loader.import("/widget.toml").await.unwrap_err();
        assert!(matches!(err, LoadError::UnsupportedType { .. }));
    }

    #[tokio::test]
    async fn test_custom_type_table() {
        let provider = Arc::new(MemoryProvider::new().with_file("/a.script", "set x 1"));
        let (transformer, engine) = fixtures();
        let loader = Loader::builder(provider, transformer, engine)
            .types(TypeTable::empty().with(".script", ModuleKind::Script))
            .build();

        assert!(loader.import("/a.script").await.is_ok());
    }

    #[tokio::test]
    async fn test_invalid_utf8_is_content_error() {
        let provider = Arc::new(MemoryProvider::new());
        provider.insert("/a.js", Content::Bytes(vec![0xff, 0xfe]));
        let (loader, _, _) = session(&provider);

        let err = loader.import("/a.js").await.unwrap_err();
        assert!(matches!(err, LoadError::Content { .. }));
    }

    struct TextHandler;

    #[async_trait]
    impl ModuleHandler for TextHandler {
        async fn handle(
            &self,
            type_tag: &str,
            content: &Content,
            path: &ModulePath,
            _loader: &Loader,
        ) -> Result<Option<Value>, LoadError> {
            if type_tag != ".txt" {
                return Ok(None);
            }
            Ok(Some(Value::from(content.as_text(path)?)))
        }
    }

    #[tokio::test]
    async fn test_handler_runs_before_builtins() {
        let provider = Arc::new(
            MemoryProvider::new()
                .with_file("/note.txt", "hello")
                .with_file("/main.js", "dep ./note.txt\nrequire note ./note.txt"),
        );
        let (transformer, engine) = fixtures();
        let loader = Loader::builder(provider, transformer, engine)
            .handler(Arc::new(TextHandler))
            .build();

        let exports = loader.import("/main.js").await.unwrap();
        assert_eq!(exports.get("note").unwrap().as_str(), Some("hello"));
    }

    struct EchoCompiler;

    #[async_trait]
    impl ComponentCompiler for EchoCompiler {
        async fn compile(&self, source: &str, path: &ModulePath, loader: &Loader) -> LoadResult {
            let helper = loader
                .load(ModuleRequest::from_referrer("./helper.js", path.clone()))
                .await?;
            let value = Value::object();
            if let Some(obj) = value.as_object() {
                obj.set("source", Value::from(source));
                obj.set("helper", helper);
            }
            Ok(value)
        }
    }

    #[tokio::test]
    async fn test_component_compiler() {
        let provider = Arc::new(
            MemoryProvider::new()
                .with_file("/ui/widget.toml", "name = 'w'")
                .with_file("/ui/helper.js", "set ok yes"),
        );
        let (transformer, engine) = fixtures();
        let loader = Loader::builder(provider, transformer, engine)
            .component_compiler(Arc::new(EchoCompiler))
            .build();

        let widget = loader.import("/ui/widget.toml").await.unwrap();
        assert_eq!(widget.get("source").unwrap().as_str(), Some("name = 'w'"));
        assert!(Value::same(
            &widget.get("helper").unwrap(),
            &loader.cached(&id("/ui/helper.js")).unwrap()
        ));
    }

    #[tokio::test]
    async fn test_config_applies_engine_version_and_types() {
        let config = LoaderConfig::parse("engine_version = \"cfg/1\"\n[types]\nmodule = [\".js\"]\nscript = []\n").unwrap();
        let provider = Arc::new(MemoryProvider::new().with_file("/a.js", "set x 1"));
        let (transformer, engine) = fixtures();
        let loader = Loader::builder(provider, transformer, engine).config(&config).build();

        assert_eq!(loader.engine_version(), "cfg/1");
        assert!(loader.import("/a.js").await.is_ok());
    }
}
