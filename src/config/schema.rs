//! Configuration schema for appshell
//!
//! Configuration is stored at `~/.config/appshell/config.toml`

use crate::controller::ServingPolicy;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// General settings
    pub general: GeneralConfig,

    /// Controller scope and serving policy
    pub controller: ControllerConfig,

    /// Bucket storage
    pub store: StoreConfig,

    /// Outbound HTTP settings
    pub network: NetworkConfig,
}

/// General application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Enable verbose logging
    pub verbose: bool,

    /// Log format: "text" or "json"
    pub log_format: String,

    /// Enable audit logging
    pub audit_log: bool,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            verbose: false,
            log_format: "text".to_string(),
            audit_log: true,
        }
    }
}

/// Controller settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerConfig {
    /// Base URL the controller serves
    pub scope: String,

    /// Serving policy for new releases
    pub policy: ServingPolicy,

    /// Manifest file (the built-in flashcards manifest when unset)
    pub manifest: Option<PathBuf>,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            scope: "http://localhost:8080/".to_string(),
            policy: ServingPolicy::default(),
            manifest: None,
        }
    }
}

/// Bucket storage settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Bucket directory (defaults to `<state_dir>/appshell/buckets`)
    pub dir: Option<PathBuf>,
}

/// HTTP fetcher settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// Per-request timeout in seconds
    pub timeout_secs: u64,

    /// User-Agent header sent with every request
    pub user_agent: String,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            user_agent: format!("appshell/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}
