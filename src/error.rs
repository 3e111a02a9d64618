//! Error types for appshell
//!
//! All modules use `AppShellResult<T>` as their return type.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for appshell operations
pub type AppShellResult<T> = Result<T, AppShellError>;

/// All errors that can occur in appshell
#[derive(Error, Debug)]
pub enum AppShellError {
    // Configuration errors
    #[error("Invalid configuration at {path}: {reason}")]
    ConfigInvalid { path: PathBuf, reason: String },

    #[error("Failed to create config directory {path}: {source}")]
    ConfigDirCreate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid controller scope '{scope}': {reason}")]
    ScopeInvalid { scope: String, reason: String },

    // Manifest errors
    #[error("Invalid manifest: {0}")]
    ManifestInvalid(String),

    #[error("Manifest path '{path}' cannot be resolved against scope {scope}")]
    ManifestPath { path: String, scope: String },

    #[error("Duplicate manifest entry: {0}")]
    ManifestDuplicate(String),

    #[error("Version {version} was already installed from a different manifest")]
    VersionNotBumped { version: String },

    // Lifecycle errors
    #[error("Install of {version} failed: {url}: {reason}")]
    InstallFailed {
        version: String,
        url: String,
        reason: String,
    },

    #[error("Controller for {version} cannot {operation} while {phase}")]
    InvalidPhase {
        version: String,
        operation: &'static str,
        phase: String,
    },

    #[error("Version not installed: {0}")]
    VersionNotInstalled(String),

    #[error("Unknown client: {0}")]
    UnknownClient(String),

    // Store errors
    #[error("Bucket store error: {0}")]
    Store(String),

    #[error("Bucket not found: {0}")]
    BucketNotFound(String),

    // Network errors
    #[error("Network request failed: {url}: {reason}")]
    Network { url: String, reason: String },

    #[error("Invalid request: {0}")]
    RequestInvalid(String),

    // IO errors
    #[error("IO error: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    // Serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),

    // General errors
    #[error("{0}")]
    User(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppShellError {
    /// Create an IO error with context
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Create a network error for a URL
    pub fn network(url: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Network {
            url: url.into(),
            reason: reason.into(),
        }
    }

    /// Check if retrying the operation later may succeed
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Network { .. } | Self::InstallFailed { .. })
    }

    /// Get actionable hint for the error
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::InstallFailed { .. } => {
                Some("The previous version keeps serving. Check connectivity and run: appshell update")
            }
            Self::VersionNotBumped { .. } => {
                Some("Change [release].version whenever the asset list or any asset changes")
            }
            Self::VersionNotInstalled(_) => Some("Run: appshell buckets to list installed versions"),
            Self::ScopeInvalid { .. } => {
                Some("Set controller.scope to an absolute http(s) URL, e.g. http://localhost:8080/app/")
            }
            _ => None,
        }
    }
}
