//! Extension dispatch
//!
//! Chooses how fetched content becomes a module value: a caller-supplied
//! [`ModuleHandler`] first, then built-in handling by type tag (component
//! description, plain script or module script). Anything else is an
//! unsupported type.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;

use crate::context::{self, ScriptEngine};
use crate::deps;
use crate::error::LoadError;
use crate::identity::ModulePath;
use crate::loader::Loader;
use crate::module_cache::LoadResult;
use crate::provider::{Content, FetchedContent, ResourceDescriptor};
use crate::transform::{CompilationArtifact, Transformer};
use crate::value::Value;

/// Built-in handling strategies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModuleKind {
    /// Plain script
    Script,
    /// Script using module syntax
    ModuleScript,
    /// Declarative component description
    Component,
}

/// Type tag → built-in strategy table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeTable {
    kinds: HashMap<String, ModuleKind>,
}

impl TypeTable {
    /// Create an empty table
    pub fn empty() -> Self {
        Self {
            kinds: HashMap::new(),
        }
    }

    /// Map `tag` to `kind`, replacing any previous mapping
    pub fn insert(&mut self, tag: impl Into<String>, kind: ModuleKind) {
        self.kinds.insert(tag.into(), kind);
    }

    /// Builder-style [`insert`](Self::insert)
    pub fn with(mut self, tag: impl Into<String>, kind: ModuleKind) -> Self {
        self.insert(tag, kind);
        self
    }

    /// Strategy for a tag
    pub fn kind_of(&self, tag: &str) -> Option<ModuleKind> {
        self.kinds.get(tag).copied()
    }
}

impl Default for TypeTable {
    fn default() -> Self {
        Self::empty()
            .with(".js", ModuleKind::Script)
            .with(".cjs", ModuleKind::Script)
            .with(".mjs", ModuleKind::ModuleScript)
            .with(".toml", ModuleKind::Component)
    }
}

/// Compiles a declarative component description into a module value.
#[async_trait]
pub trait ComponentCompiler: Send + Sync {
    /// Compile `source`. The loader is available for the component's own dependencies.
    async fn compile(&self, source: &str, path: &ModulePath, loader: &Loader) -> LoadResult;
}

/// Caller-supplied handler tried before the built-ins.
#[async_trait]
pub trait ModuleHandler: Send + Sync {
    /// Produce a module value, or `Ok(None)` to fall through to built-in dispatch.
    async fn handle(
        &self,
        type_tag: &str,
        content: &Content,
        path: &ModulePath,
        loader: &Loader,
    ) -> Result<Option<Value>, LoadError>;
}

/// Dispatch table plus the collaborators each strategy needs.
pub(crate) struct Dispatcher {
    pub(crate) types: TypeTable,
    pub(crate) transformer: Arc<dyn Transformer>,
    pub(crate) engine: Arc<dyn ScriptEngine>,
    pub(crate) components: Option<Arc<dyn ComponentCompiler>>,
    pub(crate) handler: Option<Arc<dyn ModuleHandler>>,
}

impl Dispatcher {
    /// Turn fetched content into a module value.
    pub(crate) async fn handle(
        &self,
        loader: &Loader,
        resource: &ResourceDescriptor,
        fetched: FetchedContent,
    ) -> LoadResult {
        let FetchedContent { content, type_tag } = fetched;

        if let Some(handler) = &self.handler {
            if let Some(value) = handler.handle(&type_tag, &content, &resource.path, loader).await? {
                return Ok(value);
            }
        }

        match self.types.kind_of(&type_tag) {
            Some(ModuleKind::Component) => match &self.components {
                Some(compiler) => {
                    let source = content.as_text(&resource.path)?;
                    compiler.compile(source, &resource.path, loader).await
                }
                None => Err(unsupported(&type_tag, resource)),
            },
            Some(kind) => {
                let source = content.as_text(&resource.path)?;
                self.run_script(loader, resource, source, kind == ModuleKind::ModuleScript)
                    .await
            }
            None => Err(unsupported(&type_tag, resource)),
        }
    }

    /// Transform (through the compilation cache), load dependencies, execute.
    async fn run_script(
        &self,
        loader: &Loader,
        resource: &ResourceDescriptor,
        source: &str,
        module_syntax: bool,
    ) -> LoadResult {
        let transformer = &self.transformer;
        let path = &resource.path;
        let syntax = if module_syntax { "module" } else { "script" };
        let key_parts = [loader.engine_version(), syntax, source, path.as_str()];

        let artifact: CompilationArtifact = loader
            .compilation()
            .get_or_compute(&key_parts, |persist| async move {
                transformer.transform(source, module_syntax, path, &persist)
            })
            .await?;

        deps::load_all(loader, resource, &artifact.dependencies).await?;
        context::execute(loader, self.engine.as_ref(), resource, &artifact.code).await
    }
}

fn unsupported(type_tag: &str, resource: &ResourceDescriptor) -> LoadError {
    LoadError::UnsupportedType {
        type_tag: type_tag.to_string(),
        path: resource.path.to_string(),
    }
}
