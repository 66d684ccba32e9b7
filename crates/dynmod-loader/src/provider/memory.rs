//! In-memory resource provider
//!
//! Serves a virtual file map with posix-style paths. Relative specifiers are
//! resolved against the referrer's directory (or `/` for root requests); bare
//! specifiers resolve to themselves so that pre-seeded host modules can be
//! found by name.

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};

use super::{type_tag_for, Content, FetchedContent, ModuleRequest, ResourceDescriptor, ResourceProvider};
use crate::error::LoadError;
use crate::identity::{is_relative, join, ModulePath};

/// Virtual file map provider.
#[derive(Debug, Default)]
pub struct MemoryProvider {
    files: RwLock<HashMap<String, Content>>,
    extensions: Vec<String>,
    fetches: Mutex<HashMap<String, usize>>,
}

impl MemoryProvider {
    /// Create an empty provider
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a text file (builder style)
    pub fn with_file(self, path: &str, text: &str) -> Self {
        self.insert(path, Content::from(text));
        self
    }

    /// Extensions tried, in order, when a relative specifier does not name a file exactly
    pub fn with_extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.extensions = extensions.into_iter().map(Into::into).collect();
        self
    }

    /// Add or replace a file
    pub fn insert(&self, path: &str, content: Content) {
        self.files.write().insert(join("/", path), content);
    }

    /// Total number of fetches served
    pub fn fetch_count(&self) -> usize {
        self.fetches.lock().values().sum()
    }

    /// Number of fetches served for one path
    pub fn fetch_count_for(&self, path: &str) -> usize {
        self.fetches.lock().get(path).copied().unwrap_or(0)
    }

    fn probe(&self, path: &str) -> Option<String> {
        let files = self.files.read();
        if files.contains_key(path) {
            return Some(path.to_string());
        }
        self.extensions
            .iter()
            .map(|ext| format!("{}{}", path, ext))
            .find(|candidate| files.contains_key(candidate))
    }
}

#[async_trait]
impl ResourceProvider for MemoryProvider {
    fn resolve(&self, request: &ModuleRequest) -> Result<ResourceDescriptor, LoadError> {
        let specifier = request.specifier.as_str();
        if !is_relative(specifier) && !specifier.starts_with('/') {
            return Ok(ResourceDescriptor::new(specifier, specifier));
        }

        let base = request
            .referrer
            .as_ref()
            .map(ModulePath::dirname)
            .filter(|dir| !dir.is_empty())
            .unwrap_or("/");
        let candidate = join(base, specifier);

        match self.probe(&candidate) {
            Some(path) => Ok(ResourceDescriptor::new(path.as_str(), path.as_str())),
            None => Err(LoadError::resolution(
                specifier,
                request.referrer_str(),
                format!("no such file: {}", candidate),
            )),
        }
    }

    async fn fetch(&self, resource: &ResourceDescriptor) -> Result<FetchedContent, LoadError> {
        let path = resource.path.as_str();
        *self.fetches.lock().entry(path.to_string()).or_insert(0) += 1;

        let content = self.files.read().get(path).cloned();
        match content {
            Some(content) => Ok(FetchedContent {
                content,
                type_tag: type_tag_for(&resource.path),
            }),
            None => Err(LoadError::resolution(path, None, "no such file")),
        }
    }
}
