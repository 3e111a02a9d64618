//! Cache controller
//!
//! One controller is bound to one release: a Version Tag, its manifest and a
//! serving policy. It owns that release's bucket and walks it through the
//! lifecycle:
//!
//! | Phase | Trigger | Effect |
//! |-------|---------|--------|
//! | Install | new release | fetch every manifest URL, commit the bucket atomically |
//! | Activate | release takes over | delete every other bucket, record as current |
//! | Fetch | every page request | answer per policy, refresh the bucket as a side effect |
//!
//! Failures stay inside the phase that produced them: a failed install
//! leaves the previous release serving, a failed bucket deletion is reported
//! and skipped, a failed revalidation leaves the stale entry in place.

pub mod lifecycle;
pub mod policy;

pub use lifecycle::Phase;
pub use policy::{Revalidation, RevalidationOutcome, ServedFrom, Served, ServingPolicy};

use crate::error::{AppShellError, AppShellResult};
use crate::http::{Request, RequestKey, Response};
use crate::manifest::{AssetManifest, VersionTag};
use crate::network::Network;
use crate::store::{BucketMeta, BucketStore};
use futures_util::future::try_join_all;
use serde::Serialize;
use std::sync::{Arc, Mutex};
use tokio::sync::oneshot;
use tracing::{debug, info, warn};
use url::Url;

/// Summary of a successful install
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InstallReport {
    pub version: VersionTag,
    /// Number of manifest assets stored
    pub assets: usize,
    /// Total body bytes stored
    pub bytes: u64,
    /// Whether a bucket for this version already existed
    pub reinstalled: bool,
    /// Assets whose bytes differ from the previous install of the same version
    pub changed: Vec<Url>,
}

/// Summary of an activation
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ActivationReport {
    pub version: Option<VersionTag>,
    /// Stale buckets removed
    pub deleted: Vec<VersionTag>,
    /// Stale buckets that could not be removed, with the reason
    pub failed: Vec<(VersionTag, String)>,
}

/// Lifecycle and request handling for one release
pub struct CacheController {
    manifest: AssetManifest,
    policy: ServingPolicy,
    store: Arc<dyn BucketStore>,
    network: Arc<dyn Network>,
    phase: Mutex<Phase>,
}

impl CacheController {
    /// Create a controller for a release that has not been installed yet
    pub fn new(
        manifest: AssetManifest,
        policy: ServingPolicy,
        store: Arc<dyn BucketStore>,
        network: Arc<dyn Network>,
    ) -> Self {
        Self::with_phase(manifest, policy, store, network, Phase::Parsed)
    }

    /// Rebuild a controller for a bucket that is already installed.
    /// `activated` resumes a release that was current before a restart.
    pub fn from_bucket(
        meta: &BucketMeta,
        activated: bool,
        store: Arc<dyn BucketStore>,
        network: Arc<dyn Network>,
    ) -> AppShellResult<Self> {
        let phase = if activated {
            Phase::Activated
        } else {
            Phase::Installed
        };
        Ok(Self::with_phase(
            meta.manifest()?,
            meta.policy,
            store,
            network,
            phase,
        ))
    }

    fn with_phase(
        manifest: AssetManifest,
        policy: ServingPolicy,
        store: Arc<dyn BucketStore>,
        network: Arc<dyn Network>,
        phase: Phase,
    ) -> Self {
        Self {
            manifest,
            policy,
            store,
            network,
            phase: Mutex::new(phase),
        }
    }

    pub fn version(&self) -> &VersionTag {
        self.manifest.version()
    }

    pub fn manifest(&self) -> &AssetManifest {
        &self.manifest
    }

    pub fn policy(&self) -> ServingPolicy {
        self.policy
    }

    pub fn phase(&self) -> Phase {
        *self.phase.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn transition(&self, from: &[Phase], to: Phase, operation: &'static str) -> AppShellResult<()> {
        let mut phase = self.phase.lock().unwrap_or_else(|e| e.into_inner());
        if !from.contains(&*phase) || !phase.can_transition_to(to) {
            return Err(AppShellError::InvalidPhase {
                version: self.version().to_string(),
                operation,
                phase: phase.to_string(),
            });
        }
        debug!("{}: {} -> {}", self.version(), *phase, to);
        *phase = to;
        Ok(())
    }

    fn set_phase(&self, to: Phase) {
        *self.phase.lock().unwrap_or_else(|e| e.into_inner()) = to;
    }

    /// Mark this controller as replaced; it stops answering fetches
    pub fn retire(&self) {
        self.set_phase(Phase::Redundant);
    }

    /// Fetch and store every manifest asset
    pub async fn install(&self) -> AppShellResult<InstallReport> {
        self.install_observed(&|_| {}).await
    }

    /// Install, calling `on_asset` as each asset arrives
    pub async fn install_observed(
        &self,
        on_asset: &(dyn Fn(&Url) + Send + Sync),
    ) -> AppShellResult<InstallReport> {
        self.transition(&[Phase::Parsed], Phase::Installing, "install")?;

        match self.populate(on_asset).await {
            Ok(report) => {
                self.set_phase(Phase::Installed);
                info!(
                    "Installed {} ({} assets, {} bytes)",
                    report.version, report.assets, report.bytes
                );
                Ok(report)
            }
            Err(e) => {
                self.set_phase(Phase::Redundant);
                warn!("Install of {} failed: {}", self.version(), e);
                Err(e)
            }
        }
    }

    async fn populate(
        &self,
        on_asset: &(dyn Fn(&Url) + Send + Sync),
    ) -> AppShellResult<InstallReport> {
        let version = self.version().clone();
        let meta = BucketMeta::new(&self.manifest, self.policy);

        let existing = self.store.bucket_meta(&version).await?;
        if let Some(ref previous) = existing {
            if previous.fingerprint != meta.fingerprint || previous.policy != meta.policy {
                return Err(AppShellError::VersionNotBumped {
                    version: version.to_string(),
                });
            }
        }

        let fetches = self.manifest.requests().map(|request| {
            let version = &version;
            async move {
                let response = self.network.fetch(&request).await.map_err(|e| {
                    let reason = match e {
                        AppShellError::Network { reason, .. } => reason,
                        other => other.to_string(),
                    };
                    AppShellError::InstallFailed {
                        version: version.to_string(),
                        url: request.url.to_string(),
                        reason,
                    }
                })?;

                if !response.is_success() {
                    return Err(AppShellError::InstallFailed {
                        version: version.to_string(),
                        url: request.url.to_string(),
                        reason: format!("status {}", response.status),
                    });
                }

                on_asset(&request.url);
                Ok::<_, AppShellError>((request, response))
            }
        });
        let fetched = try_join_all(fetches).await?;

        let mut changed = Vec::new();
        if existing.is_some() {
            for (request, response) in &fetched {
                if let Ok(Some(stored)) = self.store.get(&version, &request.key()).await {
                    if stored.body_digest() != response.body_digest() {
                        warn!(
                            "{} changed without a version bump; bump [release].version",
                            request.url
                        );
                        changed.push(request.url.clone());
                    }
                }
            }
        }

        let bytes = fetched.iter().map(|(_, r)| r.body.len() as u64).sum();
        let entries: Vec<(RequestKey, Response)> = fetched
            .into_iter()
            .map(|(request, response)| (request.key(), response))
            .collect();
        let assets = entries.len();

        self.store.commit_bucket(meta, entries).await?;

        Ok(InstallReport {
            version,
            assets,
            bytes,
            reinstalled: existing.is_some(),
            changed,
        })
    }

    /// Delete every other bucket and record this release as current
    pub async fn activate(&self) -> AppShellResult<ActivationReport> {
        self.transition(&[Phase::Installed], Phase::Activating, "activate")?;

        match self.purge_and_promote().await {
            Ok(report) => {
                self.set_phase(Phase::Activated);
                info!(
                    "Activated {} (removed {} stale bucket(s))",
                    self.version(),
                    report.deleted.len()
                );
                Ok(report)
            }
            Err(e) => {
                self.set_phase(Phase::Installed);
                warn!("Activation of {} failed: {}", self.version(), e);
                Err(e)
            }
        }
    }

    async fn purge_and_promote(&self) -> AppShellResult<ActivationReport> {
        let current = self.version();
        if self.store.bucket_meta(current).await?.is_none() {
            return Err(AppShellError::VersionNotInstalled(current.to_string()));
        }

        let mut report = ActivationReport {
            version: Some(current.clone()),
            ..Default::default()
        };

        let tags = match self.store.bucket_tags().await {
            Ok(tags) => tags,
            Err(e) => {
                warn!("Could not enumerate buckets, skipping cleanup: {}", e);
                vec![]
            }
        };

        for tag in tags.into_iter().filter(|t| t != current) {
            match self.store.delete_bucket(&tag).await {
                Ok(_) => {
                    debug!("Deleted stale bucket {}", tag);
                    report.deleted.push(tag);
                }
                Err(e) => {
                    warn!("Failed to delete stale bucket {}: {}", tag, e);
                    report.failed.push((tag, e.to_string()));
                }
            }
        }

        self.store.set_active_tag(Some(current)).await?;
        Ok(report)
    }

    /// Answer a page request according to the serving policy
    pub async fn handle_fetch(&self, request: Request) -> AppShellResult<Served> {
        let phase = self.phase();
        if !phase.is_serving() {
            return Err(AppShellError::InvalidPhase {
                version: self.version().to_string(),
                operation: "serve requests",
                phase: phase.to_string(),
            });
        }

        if !request.is_interceptable(self.manifest.scope()) {
            debug!("Passthrough {} {}", request.method, request.url);
            let response = self.network.fetch(&request).await?;
            return Ok(Served::new(response, ServedFrom::Passthrough));
        }

        match self.policy {
            ServingPolicy::CacheFirst => self.cache_first(request).await,
            ServingPolicy::StaleWhileRevalidate => self.stale_while_revalidate(request).await,
        }
    }

    /// Store read that treats store failures as a miss
    async fn lookup(&self, key: &RequestKey) -> Option<Response> {
        match self.store.get(self.version(), key).await {
            Ok(found) => found,
            Err(e) => {
                warn!("Bucket {} read failed for {}: {}", self.version(), key, e);
                None
            }
        }
    }

    async fn cache_first(&self, request: Request) -> AppShellResult<Served> {
        let key = request.key();
        if let Some(cached) = self.lookup(&key).await {
            return Ok(Served::new(cached, ServedFrom::Cache));
        }

        let response = self.network.fetch(&request).await?;

        // Only manifest assets belong in the bucket; repair a missing one
        if response.is_success() && self.manifest.contains_key(&key) {
            if let Err(e) = self.store.put(self.version(), &key, &response).await {
                warn!("Could not restore {} into {}: {}", key, self.version(), e);
            }
        }

        Ok(Served::new(response, ServedFrom::Network))
    }

    async fn stale_while_revalidate(&self, request: Request) -> AppShellResult<Served> {
        let key = request.key();
        // Read before the refresh is issued so a hit always reflects the
        // bucket as it was when the request arrived
        let cached = self.lookup(&key).await;

        let (tx, rx) = oneshot::channel();
        let store = Arc::clone(&self.store);
        let network = Arc::clone(&self.network);
        let version = self.version().clone();
        let task_key = key.clone();

        let handle = tokio::spawn(async move {
            match network.fetch(&request).await {
                Ok(response) => {
                    let _ = tx.send(Ok(response.clone()));
                    if !response.is_success() {
                        return RevalidationOutcome::NotStored {
                            status: response.status,
                        };
                    }
                    match store.put(&version, &task_key, &response).await {
                        Ok(()) => RevalidationOutcome::Stored,
                        Err(e) => {
                            debug!("Revalidation of {} not stored: {}", task_key, e);
                            RevalidationOutcome::Failed(e.to_string())
                        }
                    }
                }
                Err(e) => {
                    debug!("Revalidation of {} failed: {}", task_key, e);
                    let reason = e.to_string();
                    let _ = tx.send(Err(e));
                    RevalidationOutcome::Failed(reason)
                }
            }
        });
        let revalidation = Revalidation::new(handle);

        if let Some(cached) = cached {
            return Ok(Served::new(cached, ServedFrom::Cache).revalidating(revalidation));
        }

        match rx.await {
            Ok(Ok(response)) => {
                Ok(Served::new(response, ServedFrom::Network).revalidating(revalidation))
            }
            Ok(Err(e)) => Err(e),
            Err(_) => Err(AppShellError::Internal(format!(
                "revalidation task for {} ended without a result",
                key
            ))),
        }
    }
}
