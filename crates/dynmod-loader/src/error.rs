//! Loader error types.
//!
//! A [`LoadError`] is handed to every task waiting on a module, so it is
//! `Clone` and carries only owned, already-formatted context.

use std::fmt;

use thiserror::Error;

/// A 1-based line/column position inside a module's source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SourceLocation {
    /// Line number (1-based)
    pub line: u32,
    /// Column number (1-based)
    pub column: u32,
}

impl SourceLocation {
    /// Create a new source location
    pub fn new(line: u32, column: u32) -> Self {
        Self { line, column }
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

fn location_suffix(location: &Option<SourceLocation>) -> String {
    match location {
        Some(loc) => format!(":{}", loc),
        None => String::new(),
    }
}

fn referrer_suffix(referrer: &Option<String>) -> String {
    match referrer {
        Some(r) => format!(" from {}", r),
        None => String::new(),
    }
}

/// Errors that can occur while resolving, fetching, transforming or executing a module.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoadError {
    /// The resource could not be located
    #[error("Cannot resolve '{specifier}'{}: {reason}", referrer_suffix(.referrer))]
    Resolution {
        specifier: String,
        referrer: Option<String>,
        reason: String,
    },

    /// Fetched content has the wrong shape (e.g. not valid UTF-8 text)
    #[error("Invalid content in {path}: {reason}")]
    Content { path: String, reason: String },

    /// Source could not be parsed or transformed
    #[error("Transform error in {path}{}: {message}", location_suffix(.location))]
    Transform {
        path: String,
        message: String,
        location: Option<SourceLocation>,
    },

    /// No handler exists for the resource's type tag
    #[error("Unsupported module type '{type_tag}' for {path}")]
    UnsupportedType { type_tag: String, path: String },

    /// The executed module code raised an error
    #[error("Execution error in {path}{}: {message}", location_suffix(.location))]
    Execution {
        path: String,
        message: String,
        location: Option<SourceLocation>,
    },

    /// Synchronous lookup of a dependency that has not been loaded yet
    #[error("Module '{specifier}' required from {referrer} is not loaded")]
    NotFound { specifier: String, referrer: String },

    /// The component compiler rejected a component description
    #[error("Component error in {path}: {message}")]
    Component { path: String, message: String },
}

impl LoadError {
    /// Build a resolution error.
    pub fn resolution(
        specifier: impl Into<String>,
        referrer: Option<&str>,
        reason: impl Into<String>,
    ) -> Self {
        LoadError::Resolution {
            specifier: specifier.into(),
            referrer: referrer.map(str::to_string),
            reason: reason.into(),
        }
    }

    /// Build a transform error.
    pub fn transform(
        path: impl Into<String>,
        message: impl Into<String>,
        location: Option<SourceLocation>,
    ) -> Self {
        LoadError::Transform {
            path: path.into(),
            message: message.into(),
            location,
        }
    }

    /// Build an execution error.
    pub fn execution(
        path: impl Into<String>,
        message: impl Into<String>,
        location: Option<SourceLocation>,
    ) -> Self {
        LoadError::Execution {
            path: path.into(),
            message: message.into(),
            location,
        }
    }

    /// Path of the module the error is attached to, when known.
    pub fn path(&self) -> Option<&str> {
        match self {
            LoadError::Resolution { referrer, .. } => referrer.as_deref(),
            LoadError::Content { path, .. }
            | LoadError::Transform { path, .. }
            | LoadError::UnsupportedType { path, .. }
            | LoadError::Execution { path, .. }
            | LoadError::Component { path, .. } => Some(path),
            LoadError::NotFound { referrer, .. } => Some(referrer),
        }
    }

    /// Source location, for transform and execution errors that carry one.
    pub fn location(&self) -> Option<SourceLocation> {
        match self {
            LoadError::Transform { location, .. } | LoadError::Execution { location, .. } => {
                *location
            }
            _ => None,
        }
    }
}
