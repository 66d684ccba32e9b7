//! Loader configuration (dynmod.toml)
//!
//! ```toml
//! engine_version = "my-engine/3"
//!
//! [types]
//! script = [".js", ".cjs"]
//! module = [".mjs"]
//! component = [".toml"]
//!
//! [resolve]
//! extensions = [".mjs", ".js", ".cjs"]
//! index = "index"
//!
//! [cache]
//! enabled = true
//! dir = ".dynmod-cache"
//! ```

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::dispatch::{ModuleKind, TypeTable};
use crate::provider::{DEFAULT_EXTENSIONS, DEFAULT_INDEX};

/// Configuration file name
pub const CONFIG_FILE: &str = "dynmod.toml";

/// Engine version tag used when none is configured
pub const DEFAULT_ENGINE_VERSION: &str = concat!("dynmod/", env!("CARGO_PKG_VERSION"));

/// Errors that can occur while loading configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read the configuration file
    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),

    /// Failed to parse TOML
    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Semantically invalid configuration
    #[error("Invalid config: {0}")]
    ValidationError(String),
}

/// Loader configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LoaderConfig {
    /// Tag mixed into compilation cache keys; change it to invalidate cached artifacts
    pub engine_version: String,

    /// Type tag → handling strategy
    pub types: TypesConfig,

    /// Filesystem resolution settings
    pub resolve: ResolveConfig,

    /// Compilation cache settings
    pub cache: CacheConfig,
}

/// Type tags per built-in strategy
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TypesConfig {
    /// Plain script tags
    pub script: Vec<String>,
    /// Module script tags
    pub module: Vec<String>,
    /// Component description tags
    pub component: Vec<String>,
}

/// Filesystem resolution settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ResolveConfig {
    /// Extensions probed for extension-less specifiers
    pub extensions: Vec<String>,
    /// Index file stem for directory specifiers
    pub index: String,
}

/// Compilation cache settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CacheConfig {
    /// Whether compilation results are persisted
    pub enabled: bool,
    /// Cache directory; relative paths are taken from the config file's directory
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dir: Option<PathBuf>,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            engine_version: DEFAULT_ENGINE_VERSION.to_string(),
            types: TypesConfig::default(),
            resolve: ResolveConfig::default(),
            cache: CacheConfig::default(),
        }
    }
}

impl Default for TypesConfig {
    fn default() -> Self {
        Self {
            script: vec![".js".to_string(), ".cjs".to_string()],
            module: vec![".mjs".to_string()],
            component: vec![".toml".to_string()],
        }
    }
}

impl Default for ResolveConfig {
    fn default() -> Self {
        Self {
            extensions: DEFAULT_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
            index: DEFAULT_INDEX.to_string(),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            dir: None,
        }
    }
}

impl LoaderConfig {
    /// Parse and validate a configuration from TOML text
    pub fn parse(text: &str) -> Result<Self, ConfigError> {
        let config: LoaderConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a configuration file.
    ///
    /// A relative `cache.dir` is made relative to the file's directory.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        let mut config = Self::parse(&text)?;
        if let (Some(dir), Some(base)) = (&config.cache.dir, path.parent()) {
            if dir.is_relative() {
                config.cache.dir = Some(base.join(dir));
            }
        }
        Ok(config)
    }

    /// Find `dynmod.toml` by walking up from `start` (a file or directory).
    pub fn find(start: &Path) -> Option<PathBuf> {
        let mut dir = if start.is_file() {
            start.parent()?.to_path_buf()
        } else {
            start.to_path_buf()
        };
        loop {
            let candidate = dir.join(CONFIG_FILE);
            if candidate.is_file() {
                return Some(candidate);
            }
            if !dir.pop() {
                return None;
            }
        }
    }

    /// Check the configuration for conflicts
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.engine_version.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "engine_version must not be empty".to_string(),
            ));
        }

        let mut seen: HashMap<&str, &str> = HashMap::new();
        for (kind, tags) in self.kind_groups() {
            for tag in tags {
                if !tag.starts_with('.') {
                    return Err(ConfigError::ValidationError(format!(
                        "type tag '{}' must start with '.'",
                        tag
                    )));
                }
                if let Some(other) = seen.insert(tag, kind) {
                    return Err(ConfigError::ValidationError(format!(
                        "type tag '{}' is listed as both {} and {}",
                        tag, other, kind
                    )));
                }
            }
        }
        Ok(())
    }

    /// Type table built from `[types]`
    pub fn type_table(&self) -> TypeTable {
        let mut table = TypeTable::empty();
        for tag in &self.types.script {
            table.insert(tag.clone(), ModuleKind::Script);
        }
        for tag in &self.types.module {
            table.insert(tag.clone(), ModuleKind::ModuleScript);
        }
        for tag in &self.types.component {
            table.insert(tag.clone(), ModuleKind::Component);
        }
        table
    }

    fn kind_groups(&self) -> [(&'static str, &[String]); 3] {
        [
            ("script", &self.types.script),
            ("module", &self.types.module),
            ("component", &self.types.component),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_defaults_match_type_table() {
        let config = LoaderConfig::default();
        assert_eq!(config.type_table(), TypeTable::default());
        assert!(config.cache.enabled);
        assert!(config.engine_version.starts_with("dynmod/"));
    }

    #[test]
    fn test_parse_partial_config() {
        let config = LoaderConfig::parse(
            r#"
            engine_version = "custom/1"

            [types]
            module = [".mjs", ".js"]
            script = [".cjs"]
            "#,
        )
        .unwrap();

        assert_eq!(config.engine_version, "custom/1");
        assert_eq!(config.type_table().kind_of(".js"), Some(ModuleKind::ModuleScript));
        assert_eq!(config.types.component, vec![".toml".to_string()]);
        assert_eq!(config.resolve.index, "index");
    }

    #[test]
    fn test_duplicate_tag_rejected() {
        let err = LoaderConfig::parse(
            r#"
            [types]
            script = [".js"]
            module = [".js"]
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
        assert!(err.to_string().contains("both script and module"));
    }

    #[test]
    fn test_tag_without_dot_rejected() {
        let err = LoaderConfig::parse("[types]\nscript = [\"js\"]\n").unwrap_err();
        assert!(err.to_string().contains("must start with '.'"));
    }

    #[test]
    fn test_find_and_relative_cache_dir() {
        let temp_dir = TempDir::new().unwrap();
        let nested = temp_dir.path().join("src").join("deep");
        fs::create_dir_all(&nested).unwrap();
        fs::write(
            temp_dir.path().join(CONFIG_FILE),
            "[cache]\ndir = \".cache\"\n",
        )
        .unwrap();
        fs::write(nested.join("main.js"), "").unwrap();

        let found = LoaderConfig::find(&nested.join("main.js")).unwrap();
        assert_eq!(found, temp_dir.path().join(CONFIG_FILE));

        let config = LoaderConfig::from_file(&found).unwrap();
        assert_eq!(config.cache.dir, Some(temp_dir.path().join(".cache")));
    }
}
