//! Resource resolution and content retrieval.
//!
//! A [`ResourceProvider`] maps a [`ModuleRequest`] to a [`ResourceDescriptor`]
//! (synchronously) and fetches the descriptor's content (asynchronously).

mod fs;
mod memory;

pub use fs::{FsProvider, DEFAULT_EXTENSIONS, DEFAULT_INDEX};
pub use memory::MemoryProvider;

use async_trait::async_trait;

use crate::error::LoadError;
use crate::identity::{ModuleId, ModulePath};

/// A request to load a module: a raw specifier plus the module asking for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleRequest {
    /// Specifier as written by the importing module (or the caller)
    pub specifier: String,
    /// Path of the importing module; `None` for a root load
    pub referrer: Option<ModulePath>,
}

impl ModuleRequest {
    /// A top-level request with no referrer
    pub fn root(specifier: impl Into<String>) -> Self {
        Self {
            specifier: specifier.into(),
            referrer: None,
        }
    }

    /// A request issued by the module at `referrer`
    pub fn from_referrer(specifier: impl Into<String>, referrer: ModulePath) -> Self {
        Self {
            specifier: specifier.into(),
            referrer: Some(referrer),
        }
    }

    /// Referrer path as a string, if any
    pub fn referrer_str(&self) -> Option<&str> {
        self.referrer.as_ref().map(ModulePath::as_str)
    }
}

/// A resolved resource: its identity and location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceDescriptor {
    /// Module cache key
    pub id: ModuleId,
    /// Resolved path, used as the referrer for the module's own imports
    pub path: ModulePath,
}

impl ResourceDescriptor {
    /// Create a descriptor
    pub fn new(id: impl Into<ModuleId>, path: impl Into<ModulePath>) -> Self {
        Self {
            id: id.into(),
            path: path.into(),
        }
    }
}

/// Raw resource content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Content {
    /// Text content
    Text(String),
    /// Binary content, decoded on demand
    Bytes(Vec<u8>),
}

impl Content {
    /// Borrow the content as UTF-8 text.
    pub fn as_text(&self, path: &ModulePath) -> Result<&str, LoadError> {
        match self {
            Content::Text(text) => Ok(text),
            Content::Bytes(bytes) => std::str::from_utf8(bytes).map_err(|e| LoadError::Content {
                path: path.to_string(),
                reason: format!("content is not valid UTF-8 text ({})", e),
            }),
        }
    }

    /// Length in bytes
    pub fn len(&self) -> usize {
        match self {
            Content::Text(text) => text.len(),
            Content::Bytes(bytes) => bytes.len(),
        }
    }

    /// Check if the content is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl From<&str> for Content {
    fn from(text: &str) -> Self {
        Content::Text(text.to_string())
    }
}

impl From<String> for Content {
    fn from(text: String) -> Self {
        Content::Text(text)
    }
}

/// Fetched content plus the type tag that selects its handler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedContent {
    /// Raw content
    pub content: Content,
    /// Type tag, conventionally the file extension with its dot (`".js"`)
    pub type_tag: String,
}

impl FetchedContent {
    /// Create fetched content
    pub fn new(content: impl Into<Content>, type_tag: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            type_tag: type_tag.into(),
        }
    }
}

/// Path resolution and raw content retrieval.
///
/// `resolve` must be deterministic for a given request within a session: the
/// module cache relies on it to map equivalent requests onto one identity.
#[async_trait]
pub trait ResourceProvider: Send + Sync {
    /// Resolve a request to a resource descriptor
    fn resolve(&self, request: &ModuleRequest) -> Result<ResourceDescriptor, LoadError>;

    /// Fetch the content of a resolved resource
    async fn fetch(&self, resource: &ResourceDescriptor) -> Result<FetchedContent, LoadError>;
}

/// Type tag derived from a path's extension, or `""` when it has none.
pub fn type_tag_for(path: &ModulePath) -> String {
    path.extension().unwrap_or_default().to_string()
}
