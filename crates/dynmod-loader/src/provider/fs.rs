//! Filesystem resource provider
//!
//! Resolves specifiers to canonical file paths and reads them with tokio.

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use super::{type_tag_for, Content, FetchedContent, ModuleRequest, ResourceDescriptor, ResourceProvider};
use crate::error::LoadError;
use crate::identity::is_relative;

/// Default extensions probed for extension-less specifiers
pub const DEFAULT_EXTENSIONS: &[&str] = &[".mjs", ".js", ".cjs"];

/// Default index file stem for directory specifiers
pub const DEFAULT_INDEX: &str = "index";

/// Filesystem provider rooted at a project directory.
///
/// Resolution order for `./utils` imported from `src/main.js`:
/// 1. `src/utils` if it is a file
/// 2. `src/utils<ext>` for each configured extension
/// 3. `src/utils/index<ext>` for each configured extension
///
/// Identities are canonical absolute paths, so symlinked or `..`-laden
/// specifiers for the same file share one module.
#[derive(Debug, Clone)]
pub struct FsProvider {
    root: PathBuf,
    extensions: Vec<String>,
    index: String,
}

impl FsProvider {
    /// Create a provider with default extensions, rooted at `root`
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            extensions: DEFAULT_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
            index: DEFAULT_INDEX.to_string(),
        }
    }

    /// Create a provider rooted at the current directory
    pub fn current_dir() -> Result<Self, LoadError> {
        let root = std::env::current_dir()
            .map_err(|e| LoadError::resolution(".", None, format!("cannot read current directory: {}", e)))?;
        Ok(Self::new(root))
    }

    /// Replace the probed extensions
    pub fn with_extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.extensions = extensions.into_iter().map(Into::into).collect();
        self
    }

    /// Replace the index file stem
    pub fn with_index(mut self, index: impl Into<String>) -> Self {
        self.index = index.into();
        self
    }

    /// Get the project root
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn base_dir(&self, request: &ModuleRequest) -> PathBuf {
        request
            .referrer
            .as_ref()
            .and_then(|referrer| Path::new(referrer.as_str()).parent().map(Path::to_path_buf))
            .unwrap_or_else(|| self.root.clone())
    }

    fn probe(&self, base: &Path, tried: &mut Vec<PathBuf>) -> Option<PathBuf> {
        tried.push(base.to_path_buf());
        if base.is_file() {
            return Some(base.to_path_buf());
        }

        for ext in &self.extensions {
            let candidate = PathBuf::from(format!("{}{}", base.display(), ext));
            tried.push(candidate.clone());
            if candidate.is_file() {
                return Some(candidate);
            }
        }

        if base.is_dir() {
            for ext in &self.extensions {
                let candidate = base.join(format!("{}{}", self.index, ext));
                tried.push(candidate.clone());
                if candidate.is_file() {
                    return Some(candidate);
                }
            }
        }

        None
    }
}

#[async_trait]
impl ResourceProvider for FsProvider {
    fn resolve(&self, request: &ModuleRequest) -> Result<ResourceDescriptor, LoadError> {
        let specifier = request.specifier.as_str();
        let referrer = request.referrer_str();

        if specifier.starts_with("http://") || specifier.starts_with("https://") {
            return Err(LoadError::resolution(specifier, referrer, "URL imports are not supported"));
        }

        let base = if Path::new(specifier).is_absolute() {
            PathBuf::from(specifier)
        } else if is_relative(specifier) || request.referrer.is_none() {
            self.base_dir(request).join(specifier)
        } else {
            return Err(LoadError::resolution(
                specifier,
                referrer,
                "package imports are not supported",
            ));
        };

        let mut tried = Vec::new();
        let found = self.probe(&base, &mut tried).ok_or_else(|| {
            let tried: Vec<String> = tried.iter().map(|p| p.display().to_string()).collect();
            LoadError::resolution(specifier, referrer, format!("module not found (tried: {})", tried.join(", ")))
        })?;

        let canonical = found.canonicalize().map_err(|e| {
            LoadError::resolution(
                specifier,
                referrer,
                format!("failed to canonicalize {}: {}", found.display(), e),
            )
        })?;
        let path = canonical.to_string_lossy().into_owned();
        Ok(ResourceDescriptor::new(path.as_str(), path.as_str()))
    }

    async fn fetch(&self, resource: &ResourceDescriptor) -> Result<FetchedContent, LoadError> {
        let bytes = tokio::fs::read(resource.path.as_str()).await.map_err(|e| {
            LoadError::resolution(resource.path.as_str(), None, format!("failed to read: {}", e))
        })?;

        let content = match String::from_utf8(bytes) {
            Ok(text) => Content::Text(text),
            Err(e) => Content::Bytes(e.into_bytes()),
        };

        Ok(FetchedContent {
            content,
            type_tag: type_tag_for(&resource.path),
        })
    }
}
