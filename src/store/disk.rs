//! On-disk bucket store
//!
//! Layout under the store root:
//!
//! ```text
//! active.json                            current Version Tag
//! buckets/<tag>/bucket.json              BucketMeta
//! buckets/<tag>/entries/<sha256>.entry   JSON header line, '\n', raw body
//! buckets/.staging-<uuid>/               bucket being populated
//! buckets/.trash-<uuid>/                 bucket being removed
//! ```
//!
//! Tags only ever name directories under `buckets/`, so a tag can never
//! shadow a file the store keeps for itself. Whole-bucket changes are made
//! with a directory rename so readers never see a half-written bucket.
//! Hidden directories are never reported as buckets.

use super::{BucketMeta, BucketStore};
use crate::error::{AppShellError, AppShellResult};
use crate::http::{RequestKey, Response};
use crate::manifest::VersionTag;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, warn};
use uuid::Uuid;

const META_FILE: &str = "bucket.json";
const ACTIVE_FILE: &str = "active.json";
const BUCKETS_DIR: &str = "buckets";
const ENTRIES_DIR: &str = "entries";
const ENTRY_EXT: &str = "entry";

/// Header line of an entry file
#[derive(Debug, Serialize, Deserialize)]
struct EntryHeader {
    key: RequestKey,
    status: u16,
    headers: Vec<(String, String)>,
    stored_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ActiveRecord {
    version: VersionTag,
    activated_at: DateTime<Utc>,
}

/// Bucket store persisted as one directory per bucket
#[derive(Debug, Clone)]
pub struct DiskStore {
    root: PathBuf,
}

impl DiskStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Open the store, creating the root directory if needed
    pub async fn open(root: impl Into<PathBuf>) -> AppShellResult<Self> {
        let store = Self::new(root);
        store.ensure_layout().await?;
        Ok(store)
    }

    async fn ensure_layout(&self) -> AppShellResult<()> {
        let buckets = self.buckets_root();
        fs::create_dir_all(&buckets)
            .await
            .map_err(|e| AppShellError::io(format!("creating store {}", buckets.display()), e))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn buckets_root(&self) -> PathBuf {
        self.root.join(BUCKETS_DIR)
    }

    fn bucket_dir(&self, tag: &VersionTag) -> PathBuf {
        self.buckets_root().join(tag.as_str())
    }

    /// Staging and trash dirs sit beside the buckets so renames stay on one filesystem
    fn hidden_dir(&self, prefix: &str) -> PathBuf {
        self.buckets_root().join(format!(".{}-{}", prefix, Uuid::new_v4()))
    }

    fn entry_path(bucket: &Path, key: &RequestKey) -> PathBuf {
        bucket
            .join(ENTRIES_DIR)
            .join(format!("{}.{}", key.digest(), ENTRY_EXT))
    }

    fn encode_entry(key: &RequestKey, response: &Response) -> AppShellResult<Vec<u8>> {
        let header = EntryHeader {
            key: key.clone(),
            status: response.status,
            headers: response.headers.clone(),
            stored_at: Utc::now(),
        };
        let mut bytes = serde_json::to_vec(&header)?;
        bytes.push(b'\n');
        bytes.extend_from_slice(&response.body);
        Ok(bytes)
    }

    fn decode_entry(bytes: &[u8]) -> AppShellResult<(EntryHeader, Response)> {
        let split = bytes
            .iter()
            .position(|b| *b == b'\n')
            .ok_or_else(|| AppShellError::Store("entry file has no header line".to_string()))?;
        let header: EntryHeader = serde_json::from_slice(&bytes[..split])?;
        let response = Response {
            status: header.status,
            headers: header.headers.clone(),
            body: bytes[split + 1..].to_vec(),
        };
        Ok((header, response))
    }

    /// Write a file via a temp name + rename so readers see old or new, never partial
    async fn write_atomic(path: &Path, bytes: &[u8]) -> AppShellResult<()> {
        let tmp = path.with_extension(format!("tmp-{}", Uuid::new_v4()));
        fs::write(&tmp, bytes)
            .await
            .map_err(|e| AppShellError::io(format!("writing {}", tmp.display()), e))?;
        if let Err(e) = fs::rename(&tmp, path).await {
            let _ = fs::remove_file(&tmp).await;
            return Err(AppShellError::io(format!("renaming into {}", path.display()), e));
        }
        Ok(())
    }

    async fn populate(
        dir: &Path,
        meta: &BucketMeta,
        entries: &[(RequestKey, Response)],
    ) -> AppShellResult<()> {
        fs::create_dir_all(dir.join(ENTRIES_DIR))
            .await
            .map_err(|e| AppShellError::io(format!("creating {}", dir.display()), e))?;

        for (key, response) in entries {
            let bytes = Self::encode_entry(key, response)?;
            let path = Self::entry_path(dir, key);
            fs::write(&path, bytes)
                .await
                .map_err(|e| AppShellError::io(format!("writing {}", path.display()), e))?;
        }

        let meta_json = serde_json::to_vec_pretty(meta)?;
        fs::write(dir.join(META_FILE), meta_json)
            .await
            .map_err(|e| AppShellError::io(format!("writing {} metadata", dir.display()), e))?;
        Ok(())
    }

    async fn remove_quietly(dir: &Path) {
        if let Err(e) = fs::remove_dir_all(dir).await {
            warn!("Failed to remove {}: {}", dir.display(), e);
        }
    }
}

#[async_trait]
impl BucketStore for DiskStore {
    async fn bucket_tags(&self) -> AppShellResult<Vec<VersionTag>> {
        let buckets = self.buckets_root();
        if !buckets.exists() {
            return Ok(vec![]);
        }

        let mut tags = vec![];
        let mut entries = fs::read_dir(&buckets)
            .await
            .map_err(|e| AppShellError::io("reading store directory", e))?;

        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| AppShellError::io("reading store entry", e))?
        {
            let path = entry.path();
            if !path.is_dir() || !path.join(META_FILE).exists() {
                continue;
            }
            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            if name.starts_with('.') {
                continue;
            }
            match VersionTag::new(name) {
                Ok(tag) => tags.push(tag),
                Err(_) => debug!("Ignoring foreign directory in store: {}", name),
            }
        }

        tags.sort();
        Ok(tags)
    }

    async fn bucket_meta(&self, tag: &VersionTag) -> AppShellResult<Option<BucketMeta>> {
        let path = self.bucket_dir(tag).join(META_FILE);
        if !path.exists() {
            return Ok(None);
        }

        let content = fs::read(&path)
            .await
            .map_err(|e| AppShellError::io(format!("reading {}", path.display()), e))?;
        Ok(Some(serde_json::from_slice(&content)?))
    }

    async fn commit_bucket(
        &self,
        meta: BucketMeta,
        entries: Vec<(RequestKey, Response)>,
    ) -> AppShellResult<()> {
        self.ensure_layout().await?;

        let staging = self.hidden_dir("staging");
        if let Err(e) = Self::populate(&staging, &meta, &entries).await {
            Self::remove_quietly(&staging).await;
            return Err(e);
        }

        let target = self.bucket_dir(&meta.version);
        let trash = if target.exists() {
            let trash = self.hidden_dir("trash");
            if let Err(e) = fs::rename(&target, &trash).await {
                Self::remove_quietly(&staging).await;
                return Err(AppShellError::io(
                    format!("retiring previous bucket {}", meta.version),
                    e,
                ));
            }
            Some(trash)
        } else {
            None
        };

        if let Err(e) = fs::rename(&staging, &target).await {
            // Put the previous bucket back so the old contents keep serving
            if let Some(ref trash) = trash {
                let _ = fs::rename(trash, &target).await;
            }
            Self::remove_quietly(&staging).await;
            return Err(AppShellError::io(
                format!("promoting bucket {}", meta.version),
                e,
            ));
        }

        if let Some(trash) = trash {
            Self::remove_quietly(&trash).await;
        }

        debug!(
            "Committed bucket {} ({} entries)",
            meta.version,
            entries.len()
        );
        Ok(())
    }

    async fn get(&self, tag: &VersionTag, key: &RequestKey) -> AppShellResult<Option<Response>> {
        let path = Self::entry_path(&self.bucket_dir(tag), key);
        let bytes = match fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(AppShellError::io(format!("reading {}", path.display()), e)),
        };

        let (header, response) = Self::decode_entry(&bytes)?;
        if &header.key != key {
            warn!("Digest collision in bucket {}: {} vs {}", tag, header.key, key);
            return Ok(None);
        }
        Ok(Some(response))
    }

    async fn put(
        &self,
        tag: &VersionTag,
        key: &RequestKey,
        response: &Response,
    ) -> AppShellResult<()> {
        let bucket = self.bucket_dir(tag);
        if !bucket.join(META_FILE).exists() {
            return Err(AppShellError::BucketNotFound(tag.to_string()));
        }

        let bytes = Self::encode_entry(key, response)?;
        Self::write_atomic(&Self::entry_path(&bucket, key), &bytes).await
    }

    async fn entry_keys(&self, tag: &VersionTag) -> AppShellResult<Vec<RequestKey>> {
        let bucket = self.bucket_dir(tag);
        if !bucket.join(META_FILE).exists() {
            return Err(AppShellError::BucketNotFound(tag.to_string()));
        }

        let mut keys = vec![];
        let mut entries = fs::read_dir(bucket.join(ENTRIES_DIR))
            .await
            .map_err(|e| AppShellError::io(format!("reading bucket {}", tag), e))?;

        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| AppShellError::io(format!("reading bucket {} entry", tag), e))?
        {
            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == ENTRY_EXT) {
                let bytes = fs::read(&path)
                    .await
                    .map_err(|e| AppShellError::io(format!("reading {}", path.display()), e))?;
                let (header, _) = Self::decode_entry(&bytes)?;
                keys.push(header.key);
            }
        }

        keys.sort();
        Ok(keys)
    }

    async fn delete_bucket(&self, tag: &VersionTag) -> AppShellResult<bool> {
        let bucket = self.bucket_dir(tag);
        if !bucket.exists() {
            return Ok(false);
        }

        let trash = self.hidden_dir("trash");
        fs::rename(&bucket, &trash)
            .await
            .map_err(|e| AppShellError::io(format!("retiring bucket {}", tag), e))?;
        fs::remove_dir_all(&trash)
            .await
            .map_err(|e| AppShellError::io(format!("removing bucket {}", tag), e))?;
        Ok(true)
    }

    async fn active_tag(&self) -> AppShellResult<Option<VersionTag>> {
        let path = self.root.join(ACTIVE_FILE);
        if !path.exists() {
            return Ok(None);
        }

        let content = fs::read(&path)
            .await
            .map_err(|e| AppShellError::io(format!("reading {}", path.display()), e))?;
        let record: ActiveRecord = serde_json::from_slice(&content)?;
        Ok(Some(record.version))
    }

    async fn set_active_tag(&self, tag: Option<&VersionTag>) -> AppShellResult<()> {
        let path = self.root.join(ACTIVE_FILE);
        match tag {
            Some(tag) => {
                let record = ActiveRecord {
                    version: tag.clone(),
                    activated_at: Utc::now(),
                };
                Self::write_atomic(&path, &serde_json::to_vec_pretty(&record)?).await
            }
            None => match fs::remove_file(&path).await {
                Ok(()) => Ok(()),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
                Err(e) => Err(AppShellError::io(format!("removing {}", path.display()), e)),
            },
        }
    }
}
