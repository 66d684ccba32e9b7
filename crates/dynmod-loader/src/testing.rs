//! Test doubles for loader tests.
//!
//! `MockTransformer` treats lines of the form `dep <specifier>` as dependency
//! declarations and `error <message>` as a transform failure; everything else
//! is passed through as code. `MockEngine` runs that code one command per line:
//!
//! ```text
//! set <key> <text>              exports.<key> = "<text>"
//! replace <text>                exports = "<text>"
//! require <key> <specifier>     exports.<key> = require(<specifier>)
//! import <key> <specifier>      exports.<key> = await import(<specifier>)
//! yield                         yield to the scheduler
//! fail <message>                throw
//! ```

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::compile_cache::{CacheStore, PersistControl};
use crate::context::{ExecutionContext, ScriptEngine};
use crate::error::{LoadError, SourceLocation};
use crate::identity::ModulePath;
use crate::transform::{CompilationArtifact, Transformer};
use crate::value::Value;

#[derive(Default)]
pub(crate) struct MockTransformer {
    calls: AtomicUsize,
    volatile: bool,
}

impl MockTransformer {
    /// A transformer that always prevents persisting its output
    pub(crate) fn volatile() -> Self {
        Self {
            calls: AtomicUsize::new(0),
            volatile: true,
        }
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Transformer for MockTransformer {
    fn transform(
        &self,
        source: &str,
        _module_syntax: bool,
        path: &ModulePath,
        persist: &PersistControl,
    ) -> Result<CompilationArtifact, LoadError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.volatile {
            persist.prevent_persist();
        }

        let mut dependencies = Vec::new();
        let mut code = Vec::new();
        for (index, line) in source.lines().enumerate() {
            let line = line.trim();
            if let Some(spec) = line.strip_prefix("dep ") {
                dependencies.push(spec.trim().to_string());
            } else if let Some(message) = line.strip_prefix("error ") {
                return Err(LoadError::transform(
                    path.as_str(),
                    message,
                    Some(SourceLocation::new(index as u32 + 1, 1)),
                ));
            } else if !line.is_empty() {
                code.push(line);
            }
        }
        Ok(CompilationArtifact::new(dependencies, code.join("\n")))
    }
}

#[derive(Default)]
pub(crate) struct MockEngine {
    runs: Mutex<HashMap<String, usize>>,
}

impl MockEngine {
    pub(crate) fn runs(&self) -> usize {
        self.runs.lock().values().sum()
    }

    pub(crate) fn runs_for(&self, path: &str) -> usize {
        self.runs.lock().get(path).copied().unwrap_or(0)
    }
}

#[async_trait]
impl ScriptEngine for MockEngine {
    async fn run(&self, code: &str, context: &ExecutionContext) -> Result<(), LoadError> {
        let path = context.info().filename().to_string();
        *self.runs.lock().entry(path.clone()).or_insert(0) += 1;

        for (index, line) in code.lines().enumerate() {
            let mut words = line.splitn(3, ' ');
            let command = words.next().unwrap_or_default();
            let first = words.next().unwrap_or_default();
            let rest = words.next().unwrap_or_default();

            match command {
                "set" => context.exports().set(first, Value::from(rest)),
                "replace" => context.exports().replace(Value::from(format!("{} {}", first, rest).trim())),
                "require" => context.exports().set(first, context.require(rest)?),
                "import" => {
                    let value = context.import(rest).await?;
                    context.exports().set(first, value);
                }
                "yield" => tokio::task::yield_now().await,
                "fail" => {
                    return Err(LoadError::execution(
                        path.as_str(),
                        format!("{} {}", first, rest).trim(),
                        Some(SourceLocation::new(index as u32 + 1, 1)),
                    ))
                }
                other => {
                    return Err(LoadError::execution(
                        path.as_str(),
                        format!("unknown command '{}'", other),
                        Some(SourceLocation::new(index as u32 + 1, 1)),
                    ))
                }
            }
        }
        Ok(())
    }
}

/// Map-backed cache store shared between sessions
#[derive(Default)]
pub(crate) struct MapStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MapStore {
    pub(crate) fn len(&self) -> usize {
        self.entries.lock().len()
    }
}

#[async_trait]
impl CacheStore for MapStore {
    async fn get(&self, key: &str) -> Option<String> {
        self.entries.lock().get(key).cloned()
    }

    async fn set(&self, key: &str, value: String) {
        self.entries.lock().insert(key.to_string(), value);
    }
}

pub(crate) fn fixtures() -> (Arc<MockTransformer>, Arc<MockEngine>) {
    (Arc::new(MockTransformer::default()), Arc::new(MockEngine::default()))
}
