//! Serving policies and the values a served fetch carries

use crate::http::Response;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tokio::task::JoinHandle;

/// How an activated controller answers interceptable requests.
/// Fixed for the lifetime of a Version Tag.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ServingPolicy {
    /// Answer from the bucket when present, otherwise from the network
    CacheFirst,
    /// Answer from the bucket when present while refreshing it from the network
    #[default]
    StaleWhileRevalidate,
}

impl fmt::Display for ServingPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CacheFirst => f.write_str("cache-first"),
            Self::StaleWhileRevalidate => f.write_str("stale-while-revalidate"),
        }
    }
}

impl FromStr for ServingPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cache-first" => Ok(Self::CacheFirst),
            "stale-while-revalidate" | "swr" => Ok(Self::StaleWhileRevalidate),
            other => Err(format!(
                "unknown policy '{}'. Valid policies: cache-first, stale-while-revalidate",
                other
            )),
        }
    }
}

/// Where a served response came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ServedFrom {
    /// Stored bucket entry
    Cache,
    /// Network, after the policy consulted the bucket
    Network,
    /// Not interceptable (non-GET or cross-origin); bucket never consulted
    Passthrough,
}

impl fmt::Display for ServedFrom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cache => f.write_str("cache"),
            Self::Network => f.write_str("network"),
            Self::Passthrough => f.write_str("passthrough"),
        }
    }
}

/// Result of a background bucket refresh
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RevalidationOutcome {
    /// Fresh response written to the bucket
    Stored,
    /// Network answered with a non-success status; bucket untouched
    NotStored { status: u16 },
    /// Network or store failure; the stale entry stands
    Failed(String),
}

/// Handle to a background refresh. Dropping it detaches the task; the
/// refresh still runs to completion.
#[derive(Debug)]
pub struct Revalidation {
    handle: JoinHandle<RevalidationOutcome>,
}

impl Revalidation {
    pub(crate) fn new(handle: JoinHandle<RevalidationOutcome>) -> Self {
        Self { handle }
    }

    /// Wait for the refresh to finish
    pub async fn settled(self) -> RevalidationOutcome {
        self.handle
            .await
            .unwrap_or_else(|e| RevalidationOutcome::Failed(format!("task aborted: {}", e)))
    }
}

/// A response handed back to the page
#[derive(Debug)]
pub struct Served {
    pub response: Response,
    pub source: ServedFrom,
    pub revalidation: Option<Revalidation>,
}

impl Served {
    pub(crate) fn new(response: Response, source: ServedFrom) -> Self {
        Self {
            response,
            source,
            revalidation: None,
        }
    }

    pub(crate) fn revalidating(mut self, revalidation: Revalidation) -> Self {
        self.revalidation = Some(revalidation);
        self
    }

    /// Wait for any background refresh, returning its outcome
    pub async fn settle(&mut self) -> Option<RevalidationOutcome> {
        match self.revalidation.take() {
            Some(revalidation) => Some(revalidation.settled().await),
            None => None,
        }
    }
}
