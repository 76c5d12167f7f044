use std::path::{Path, PathBuf};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Http(#[from] reqwest::Error),

    /// The identifier does not resolve to a registered provider.
    #[error("no provider named '{name}'")]
    NotFound { name: String },

    #[error("invalid provider file at {path}: {reason}")]
    InvalidManifest { path: PathBuf, reason: String },

    #[error("invalid options for provider '{name}': {source}")]
    InvalidOptions {
        name: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("package installer '{program}' not found in PATH")]
    InstallerNotFound { program: String },

    #[error("failed to install '{package}' (exit code {})", exit_label(.code))]
    InstallFailed { package: String, code: Option<i32> },

    #[error("provider API returned {status}: {body}")]
    Api { status: u16, body: String },

    #[error("{message}")]
    Message { message: String },

    #[error("{context}: {source}")]
    External {
        context: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl Error {
    #[must_use]
    pub fn not_found(name: impl Into<String>) -> Self {
        Self::NotFound { name: name.into() }
    }

    #[must_use]
    pub fn invalid_manifest(path: &Path, reason: impl Into<String>) -> Self {
        Self::InvalidManifest {
            path: path.to_path_buf(),
            reason: reason.into(),
        }
    }

    #[must_use]
    pub fn message(message: impl Into<String>) -> Self {
        Self::Message {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn external(
        context: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::External {
            context: context.into(),
            source: Box::new(source),
        }
    }
}

fn exit_label(code: &Option<i32>) -> String {
    code.map_or_else(|| "none".to_string(), |c| c.to_string())
}

pub type Result<T> = std::result::Result<T, Error>;
