//! Script transformer: source text to a serialized program.

use std::collections::HashMap;

use dynmod_loader::{
    CompilationArtifact, LoadError, ModulePath, PersistControl, SourceLocation, Transformer,
};
use tracing::trace;

use crate::parser::parse_module;

/// Where `env "NAME"` expressions read from.
#[derive(Debug, Clone, Default)]
pub enum EnvSource {
    /// The process environment
    #[default]
    Process,
    /// A fixed map
    Fixed(HashMap<String, String>),
}

impl EnvSource {
    fn lookup(&self, name: &str) -> Option<String> {
        match self {
            EnvSource::Process => std::env::var(name).ok(),
            EnvSource::Fixed(vars) => vars.get(name).cloned(),
        }
    }
}

/// Compiles script source into a JSON-encoded [`Program`](crate::ast::Program).
///
/// Programs that inline environment values are not persisted in the
/// compilation cache.
#[derive(Debug, Clone, Default)]
pub struct ScriptTransformer {
    env: EnvSource,
}

impl ScriptTransformer {
    /// Create a transformer reading the process environment
    pub fn new() -> Self {
        Self::default()
    }

    /// Read `env` expressions from `source` instead
    pub fn with_env(mut self, source: EnvSource) -> Self {
        self.env = source;
        self
    }
}

impl Transformer for ScriptTransformer {
    fn transform(
        &self,
        source: &str,
        module_syntax: bool,
        path: &ModulePath,
        persist: &PersistControl,
    ) -> Result<CompilationArtifact, LoadError> {
        let lookup = |name: &str| self.env.lookup(name);
        let parsed = parse_module(source, module_syntax, &lookup).map_err(|e| {
            LoadError::transform(
                path.as_str(),
                e.message,
                Some(SourceLocation::new(e.line, e.column)),
            )
        })?;

        if parsed.volatile {
            persist.prevent_persist();
        }

        let code = serde_json::to_string(&parsed.program)
            .map_err(|e| LoadError::transform(path.as_str(), e.to_string(), None))?;

        trace!(
            target: "dynmod::script",
            %path,
            dependencies = parsed.dependencies.len(),
            statements = parsed.program.statements.len(),
            volatile = parsed.volatile,
            "transformed module"
        );
        Ok(CompilationArtifact::new(parsed.dependencies, code))
    }
}
