//! Bucket storage
//!
//! A bucket holds the stored responses for exactly one Version Tag. The
//! controller is the only writer; all mutation goes through either
//! `commit_bucket` (install populates a whole bucket at once) or `put`
//! (a single entry refreshed by revalidation).
//!
//! # Guarantees
//!
//! | Operation | Guarantee |
//! |-----------|-----------|
//! | `commit_bucket` | All entries become visible together or none do |
//! | `put` | Single-entry atomic write, last writer wins, never recreates a deleted bucket |
//! | `delete_bucket` | Bucket disappears as a unit |

pub mod disk;
pub mod memory;

pub use disk::DiskStore;
pub use memory::MemoryStore;

use crate::controller::ServingPolicy;
use crate::error::AppShellResult;
use crate::http::{RequestKey, Response};
use crate::manifest::{AssetManifest, VersionTag};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use url::Url;

/// Metadata recorded when a bucket is populated
///
/// Carries the resolved manifest and the serving policy so a controller can
/// be rebuilt for an installed bucket after a restart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BucketMeta {
    /// Release this bucket belongs to
    pub version: VersionTag,
    /// Fingerprint of the manifest that populated it
    pub fingerprint: String,
    /// Policy this release is served with
    pub policy: ServingPolicy,
    /// Controller scope the manifest was resolved against
    pub scope: Url,
    /// Resolved manifest URLs, in install order
    pub assets: Vec<Url>,
    /// When the bucket was (last) populated
    pub created_at: DateTime<Utc>,
}

impl BucketMeta {
    pub fn new(manifest: &AssetManifest, policy: ServingPolicy) -> Self {
        Self {
            version: manifest.version().clone(),
            fingerprint: manifest.fingerprint(),
            policy,
            scope: manifest.scope().clone(),
            assets: manifest.urls().to_vec(),
            created_at: Utc::now(),
        }
    }

    /// Rebuild the manifest this bucket was populated from
    pub fn manifest(&self) -> AppShellResult<AssetManifest> {
        let paths: Vec<String> = self.assets.iter().map(|u| u.to_string()).collect();
        AssetManifest::new(self.version.clone(), &self.scope, &paths)
    }
}

/// Persistent key-value store of buckets keyed by Version Tag
#[async_trait]
pub trait BucketStore: Send + Sync {
    /// All bucket tags currently present, sorted
    async fn bucket_tags(&self) -> AppShellResult<Vec<VersionTag>>;

    /// Metadata of a bucket, if it exists
    async fn bucket_meta(&self, tag: &VersionTag) -> AppShellResult<Option<BucketMeta>>;

    /// Atomically create (or replace) a bucket with the given entries
    async fn commit_bucket(
        &self,
        meta: BucketMeta,
        entries: Vec<(RequestKey, Response)>,
    ) -> AppShellResult<()>;

    /// Look up a stored response
    async fn get(&self, tag: &VersionTag, key: &RequestKey) -> AppShellResult<Option<Response>>;

    /// Store a single response into an existing bucket
    async fn put(&self, tag: &VersionTag, key: &RequestKey, response: &Response)
        -> AppShellResult<()>;

    /// Keys stored in a bucket, sorted
    async fn entry_keys(&self, tag: &VersionTag) -> AppShellResult<Vec<RequestKey>>;

    /// Delete a bucket. Returns false if it did not exist.
    async fn delete_bucket(&self, tag: &VersionTag) -> AppShellResult<bool>;

    /// The Version Tag recorded as current
    async fn active_tag(&self) -> AppShellResult<Option<VersionTag>>;

    /// Record the current Version Tag
    async fn set_active_tag(&self, tag: Option<&VersionTag>) -> AppShellResult<()>;
}
