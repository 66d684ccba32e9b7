//! Module identities and resolved paths.

use std::borrow::Borrow;
use std::fmt;
use std::sync::Arc;

/// Canonical key of a resolved module within one loading session.
///
/// Two requests that resolve to the same `ModuleId` share one module cache entry,
/// whatever specifier or referrer they started from.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ModuleId(Arc<str>);

impl ModuleId {
    /// Create a module id
    pub fn new(id: impl Into<Arc<str>>) -> Self {
        Self(id.into())
    }

    /// Get the id as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ModuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for ModuleId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ModuleId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for ModuleId {
    fn from(id: String) -> Self {
        Self::new(id)
    }
}

/// Resolved location of a module, as handed out by a resource provider.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ModulePath(Arc<str>);

impl ModulePath {
    /// Create a module path
    pub fn new(path: impl Into<Arc<str>>) -> Self {
        Self(path.into())
    }

    /// Get the path as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Directory part of the path (everything before the last `/`).
    ///
    /// Returns `""` for a bare name and `"/"` for a file in the root directory.
    pub fn dirname(&self) -> &str {
        match self.0.rfind('/') {
            Some(0) => "/",
            Some(idx) => &self.0[..idx],
            None => "",
        }
    }

    /// Last path segment.
    pub fn file_name(&self) -> &str {
        match self.0.rfind('/') {
            Some(idx) => &self.0[idx + 1..],
            None => &self.0,
        }
    }

    /// Extension of the file name including the leading dot (`".js"`).
    pub fn extension(&self) -> Option<&str> {
        let name = self.file_name();
        match name.rfind('.') {
            Some(0) | None => None,
            Some(idx) => Some(&name[idx..]),
        }
    }
}

impl fmt::Display for ModulePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ModulePath {
    fn from(path: &str) -> Self {
        Self::new(path)
    }
}

impl From<String> for ModulePath {
    fn from(path: String) -> Self {
        Self::new(path)
    }
}

/// Whether a specifier is relative to its referrer (`./x`, `../x`).
pub fn is_relative(specifier: &str) -> bool {
    specifier.starts_with("./") || specifier.starts_with("../") || specifier == "." || specifier == ".."
}

/// Join `specifier` onto `base_dir` and normalize the result.
///
/// Absolute specifiers ignore the base directory.
pub fn join(base_dir: &str, specifier: &str) -> String {
    if specifier.starts_with('/') || base_dir.is_empty() {
        normalize(specifier)
    } else {
        normalize(&format!("{}/{}", base_dir, specifier))
    }
}

/// Collapse `.`/`..` segments and repeated separators in a `/`-separated path.
///
/// `..` never climbs above the root of an absolute path; for relative paths
/// leading `..` segments are kept.
pub fn normalize(path: &str) -> String {
    let absolute = path.starts_with('/');
    let mut segments: Vec<&str> = Vec::new();

    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => match segments.last() {
                Some(&"..") | None if !absolute => segments.push(".."),
                Some(&"..") | None => {}
                Some(_) => {
                    segments.pop();
                }
            },
            other => segments.push(other),
        }
    }

    let joined = segments.join("/");
    if absolute {
        format!("/{}", joined)
    } else if joined.is_empty() {
        ".".to_string()
    } else {
        joined
    }
}
