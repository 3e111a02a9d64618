//! In-process bucket store

use super::{BucketMeta, BucketStore};
use crate::error::{AppShellError, AppShellResult};
use crate::http::{RequestKey, Response};
use crate::manifest::VersionTag;
use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use tokio::sync::RwLock;

#[derive(Debug, Clone)]
struct Bucket {
    meta: BucketMeta,
    entries: HashMap<RequestKey, Response>,
}

/// Bucket store backed by in-memory maps
#[derive(Debug, Default)]
pub struct MemoryStore {
    buckets: RwLock<BTreeMap<VersionTag, Bucket>>,
    active: RwLock<Option<VersionTag>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl BucketStore for MemoryStore {
    async fn bucket_tags(&self) -> AppShellResult<Vec<VersionTag>> {
        Ok(self.buckets.read().await.keys().cloned().collect())
    }

    async fn bucket_meta(&self, tag: &VersionTag) -> AppShellResult<Option<BucketMeta>> {
        Ok(self.buckets.read().await.get(tag).map(|b| b.meta.clone()))
    }

    async fn commit_bucket(
        &self,
        meta: BucketMeta,
        entries: Vec<(RequestKey, Response)>,
    ) -> AppShellResult<()> {
        let bucket = Bucket {
            meta,
            entries: entries.into_iter().collect(),
        };
        let mut buckets = self.buckets.write().await;
        buckets.insert(bucket.meta.version.clone(), bucket);
        Ok(())
    }

    async fn get(&self, tag: &VersionTag, key: &RequestKey) -> AppShellResult<Option<Response>> {
        Ok(self
            .buckets
            .read()
            .await
            .get(tag)
            .and_then(|b| b.entries.get(key).cloned()))
    }

    async fn put(
        &self,
        tag: &VersionTag,
        key: &RequestKey,
        response: &Response,
    ) -> AppShellResult<()> {
        let mut buckets = self.buckets.write().await;
        let bucket = buckets
            .get_mut(tag)
            .ok_or_else(|| AppShellError::BucketNotFound(tag.to_string()))?;
        bucket.entries.insert(key.clone(), response.clone());
        Ok(())
    }

    async fn entry_keys(&self, tag: &VersionTag) -> AppShellResult<Vec<RequestKey>> {
        let buckets = self.buckets.read().await;
        let bucket = buckets
            .get(tag)
            .ok_or_else(|| AppShellError::BucketNotFound(tag.to_string()))?;
        let mut keys: Vec<RequestKey> = bucket.entries.keys().cloned().collect();
        keys.sort();
        Ok(keys)
    }

    async fn delete_bucket(&self, tag: &VersionTag) -> AppShellResult<bool> {
        Ok(self.buckets.write().await.remove(tag).is_some())
    }

    async fn active_tag(&self) -> AppShellResult<Option<VersionTag>> {
        Ok(self.active.read().await.clone())
    }

    async fn set_active_tag(&self, tag: Option<&VersionTag>) -> AppShellResult<()> {
        *self.active.write().await = tag.cloned();
        Ok(())
    }
}
