//! Audit trail for release lifecycle events
//!
//! One JSON object per line in `<state_dir>/appshell/audit.log`. Each record
//! carries a timestamp, the event name (`install.completed`, ...) and the
//! fields of that event. Writing is best-effort: a lifecycle phase never fails
//! because its audit record could not be written.

use crate::config::{schema::Config, ConfigManager};
use crate::manifest::VersionTag;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tracing::warn;
use url::Url;

/// A lifecycle event worth keeping after the process exits
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data")]
pub enum AuditEvent {
    #[serde(rename = "install.completed")]
    InstallCompleted {
        version: VersionTag,
        assets: usize,
        bytes: u64,
        reinstalled: bool,
        changed: Vec<Url>,
    },
    #[serde(rename = "install.failed")]
    InstallFailed { version: VersionTag, error: String },
    #[serde(rename = "activate.completed")]
    ActivateCompleted {
        version: VersionTag,
        deleted: Vec<VersionTag>,
        claimed: usize,
    },
    #[serde(rename = "activate.failed")]
    ActivateFailed { version: VersionTag, error: String },
    /// A stale bucket survived activation and will be retried next time
    #[serde(rename = "bucket.delete_failed")]
    BucketDeleteFailed { version: VersionTag, error: String },
}

impl AuditEvent {
    pub fn name(&self) -> &'static str {
        match self {
            Self::InstallCompleted { .. } => "install.completed",
            Self::InstallFailed { .. } => "install.failed",
            Self::ActivateCompleted { .. } => "activate.completed",
            Self::ActivateFailed { .. } => "activate.failed",
            Self::BucketDeleteFailed { .. } => "bucket.delete_failed",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditRecord {
    pub timestamp: DateTime<Utc>,
    #[serde(flatten)]
    pub event: AuditEvent,
}

/// Appends lifecycle records to a JSON-lines file
#[derive(Debug, Clone)]
pub struct AuditLog {
    enabled: bool,
    path: PathBuf,
}

impl AuditLog {
    /// Audit log at the default location, switched by `general.audit_log`
    pub fn new(config: &Config) -> Self {
        Self {
            enabled: config.general.audit_log,
            path: ConfigManager::audit_log_path(),
        }
    }

    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self {
            enabled: true,
            path: path.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn record(&self, event: AuditEvent) {
        if !self.enabled {
            return;
        }

        let name = event.name();
        let record = AuditRecord {
            timestamp: Utc::now(),
            event,
        };
        let line = match serde_json::to_string(&record) {
            Ok(line) => line + "\n",
            Err(e) => {
                warn!("Dropping {} audit record: {}", name, e);
                return;
            }
        };

        if let Err(e) = self.append(line.as_bytes()).await {
            warn!("Dropping {} audit record, {}: {}", name, self.path.display(), e);
        }
    }

    /// Records in file order; unreadable lines are skipped
    pub async fn read(&self) -> std::io::Result<Vec<AuditRecord>> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(vec![]),
            Err(e) => return Err(e),
        };
        Ok(content
            .lines()
            .filter_map(|line| serde_json::from_str(line).ok())
            .collect())
    }

    async fn append(&self, bytes: &[u8]) -> std::io::Result<()> {
        if let Some(dir) = self.path.parent() {
            tokio::fs::create_dir_all(dir).await?;
        }
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(bytes).await?;
        file.flush().await
    }
}
