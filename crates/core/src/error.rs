//! Error types for berth-core

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Errors that can occur in core operations
#[derive(Debug, Error)]
pub enum CoreError {
    /// Missing or malformed field in a manifest
    #[error("schema error in app '{app}': {message}")]
    Schema { app: String, message: String },

    /// Dangling dependency, permission, or sibling-container reference
    #[error("reference error in app '{app}': {message}")]
    Reference { app: String, message: String },

    /// Duplicate id, duplicate port, or duplicate platform-network join
    #[error("conflict in app '{app}': {message}")]
    Conflict { app: String, message: String },

    #[error("IO error at '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl CoreError {
    pub fn schema(app: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Schema {
            app: app.into(),
            message: message.into(),
        }
    }

    pub fn reference(app: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Reference {
            app: app.into(),
            message: message.into(),
        }
    }

    pub fn conflict(app: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Conflict {
            app: app.into(),
            message: message.into(),
        }
    }

    /// Wrap an IO error with the offending path
    pub fn io(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }
}
