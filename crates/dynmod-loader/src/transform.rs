//! Source transformation interface.

use serde::{Deserialize, Serialize};

use crate::compile_cache::PersistControl;
use crate::error::LoadError;
use crate::identity::ModulePath;

/// Output of a transformation: directly executable code plus the raw
/// dependency specifiers it declares, in source order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompilationArtifact {
    /// Raw dependency specifiers, resolved relative to the module's path
    pub dependencies: Vec<String>,
    /// Executable code handed to the script engine
    pub code: String,
}

impl CompilationArtifact {
    /// Create an artifact
    pub fn new(dependencies: Vec<String>, code: impl Into<String>) -> Self {
        Self {
            dependencies,
            code: code.into(),
        }
    }
}

/// Turns module source into executable code and extracts its dependencies.
///
/// Transformation must be deterministic in `(source, path)` for a given engine
/// version: results are cached by content. A transformer whose output depends on
/// anything else must call [`PersistControl::prevent_persist`].
pub trait Transformer: Send + Sync {
    /// Transform `source`; `module_syntax` selects module-script rules over plain-script rules.
    fn transform(
        &self,
        source: &str,
        module_syntax: bool,
        path: &ModulePath,
        persist: &PersistControl,
    ) -> Result<CompilationArtifact, LoadError>;
}
