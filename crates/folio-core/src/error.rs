//! Error types for the folio core library.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias using `CoreError`.
pub type Result<T> = std::result::Result<T, CoreError>;

/// Core error types for folio.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Configuration loading or validation error.
    #[error("Configuration error: {message}")]
    Config {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Content file could not be read or interpreted.
    #[error("Parse error in {path}: {message}")]
    Parse { path: PathBuf, message: String },

    /// Malformed frontmatter or a missing required field.
    #[error("Frontmatter error in {}:{line}: {message}", path.display())]
    Frontmatter {
        path: PathBuf,
        line: usize,
        message: String,
    },

    /// An `extra` frontmatter key shadows a reserved page field.
    #[error("Reserved key `{key}` in extra frontmatter of {}:{line}", path.display())]
    ReservedKey {
        path: PathBuf,
        line: usize,
        key: String,
    },

    /// Two data sources claim the same key in the data tree.
    #[error("Data conflict on `{key}`: {} and {}", first.display(), second.display())]
    DataConflict {
        key: String,
        first: PathBuf,
        second: PathBuf,
    },

    /// File system I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// TOML parsing error.
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// YAML parsing error.
    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// JSON parsing error.
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// Layered configuration error.
    #[error("Config crate error: {0}")]
    ConfigCrate(#[from] config::ConfigError),
}

impl CoreError {
    /// Create a new configuration error with a message.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            source: None,
        }
    }

    /// Create a new configuration error with source.
    pub fn config_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Config {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a new parse error.
    pub fn parse(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Parse {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a new frontmatter error at a source line.
    pub fn frontmatter(path: impl Into<PathBuf>, line: usize, message: impl Into<String>) -> Self {
        Self::Frontmatter {
            path: path.into(),
            line,
            message: message.into(),
        }
    }

    /// Create a new data conflict error.
    pub fn data_conflict(
        key: impl Into<String>,
        first: impl Into<PathBuf>,
        second: impl Into<PathBuf>,
    ) -> Self {
        Self::DataConflict {
            key: key.into(),
            first: first.into(),
            second: second.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error() {
        let err = CoreError::config("missing field");
        assert!(err.to_string().contains("Configuration error"));
        assert!(err.to_string().contains("missing field"));
    }

    #[test]
    fn test_frontmatter_error_has_location() {
        let err = CoreError::frontmatter("content/post.md", 4, "missing title");
        let msg = err.to_string();
        assert!(msg.contains("content/post.md:4"));
        assert!(msg.contains("missing title"));
    }

    #[test]
    fn test_data_conflict_names_both_files() {
        let err = CoreError::data_conflict("authors", "data/authors.yaml", "data/authors.json");
        let msg = err.to_string();
        assert!(msg.contains("authors.yaml"));
        assert!(msg.contains("authors.json"));
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: CoreError = io_err.into();
        assert!(err.to_string().contains("IO error"));
    }
}
