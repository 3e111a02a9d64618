//! Hosting-side registration
//!
//! A `Registration` is what the hosting page talks to. It holds the scope,
//! the bucket store and the network, keeps track of open page sessions
//! (clients), and decides which controller is current. Pages never touch the
//! bucket store; they only register, fetch, and trigger updates.
//!
//! Updates follow the skip-waiting flow: a new release is installed, then
//! immediately activated, then every open client is claimed, so a reload is
//! enough to pick up the new release. The current controller is swapped only
//! after activation has purged the old buckets.

use crate::audit::{AuditEvent, AuditLog};
use crate::controller::{
    ActivationReport, CacheController, InstallReport, Served, ServedFrom, ServingPolicy,
};
use crate::error::{AppShellError, AppShellResult};
use crate::http::Request;
use crate::manifest::{AssetManifest, VersionTag};
use crate::network::Network;
use crate::store::BucketStore;
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex};
use tokio::sync::{Mutex as AsyncMutex, RwLock};
use tracing::{debug, info, warn};
use url::Url;
use uuid::Uuid;

/// Identity of an open page session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct ClientId(Uuid);

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Result of activating a release and claiming open clients
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Promotion {
    pub activation: ActivationReport,
    /// Clients that switched to the new controller
    pub claimed: usize,
}

/// Result of an install followed by activation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UpdateReport {
    pub install: InstallReport,
    pub promotion: Promotion,
}

/// Registration of the controller at one scope
pub struct Registration {
    scope: Url,
    store: Arc<dyn BucketStore>,
    network: Arc<dyn Network>,
    active: RwLock<Option<Arc<CacheController>>>,
    waiting: AsyncMutex<Option<Arc<CacheController>>>,
    clients: Mutex<HashMap<ClientId, Option<VersionTag>>>,
    audit: Option<AuditLog>,
}

impl Registration {
    pub fn new(scope: Url, store: Arc<dyn BucketStore>, network: Arc<dyn Network>) -> Self {
        Self {
            scope,
            store,
            network,
            active: RwLock::new(None),
            waiting: AsyncMutex::new(None),
            clients: Mutex::new(HashMap::new()),
            audit: None,
        }
    }

    /// Record lifecycle events to an audit log
    pub fn with_audit(mut self, audit: AuditLog) -> Self {
        self.audit = Some(audit);
        self
    }

    pub fn scope(&self) -> &Url {
        &self.scope
    }

    pub fn store(&self) -> &Arc<dyn BucketStore> {
        &self.store
    }

    async fn audit(&self, event: AuditEvent) {
        if let Some(ref audit) = self.audit {
            audit.record(event).await;
        }
    }

    /// Resume the release recorded as current in the store
    pub async fn restore(&self) -> AppShellResult<Option<VersionTag>> {
        let Some(tag) = self.store.active_tag().await? else {
            debug!("No active version recorded");
            return Ok(None);
        };

        let Some(meta) = self.store.bucket_meta(&tag).await? else {
            warn!("Active version {} has no bucket; ignoring", tag);
            return Ok(None);
        };

        let controller = CacheController::from_bucket(
            &meta,
            true,
            Arc::clone(&self.store),
            Arc::clone(&self.network),
        )?;
        *self.active.write().await = Some(Arc::new(controller));
        debug!("Restored active version {}", tag);
        Ok(Some(tag))
    }

    pub async fn active_version(&self) -> Option<VersionTag> {
        self.active
            .read()
            .await
            .as_ref()
            .map(|c| c.version().clone())
    }

    pub async fn active_policy(&self) -> Option<ServingPolicy> {
        self.active.read().await.as_ref().map(|c| c.policy())
    }

    pub async fn waiting_version(&self) -> Option<VersionTag> {
        self.waiting
            .lock()
            .await
            .as_ref()
            .map(|c| c.version().clone())
    }

    /// Open a page session. It is controlled by the current release, if any.
    pub async fn register_client(&self) -> ClientId {
        let id = ClientId(Uuid::new_v4());
        // Held until the client is recorded so a promotion cannot claim in between
        let active = self.active.read().await;
        let controller = active.as_ref().map(|c| c.version().clone());
        debug!("Client {} registered (controller: {:?})", id, controller);
        self.clients
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(id, controller);
        drop(active);
        id
    }

    /// Close a page session
    pub fn unregister_client(&self, id: ClientId) -> bool {
        self.clients
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(&id)
            .is_some()
    }

    /// The release controlling a client, `None` when uncontrolled
    pub fn controller_of(&self, id: ClientId) -> AppShellResult<Option<VersionTag>> {
        self.clients
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(&id)
            .cloned()
            .ok_or_else(|| AppShellError::UnknownClient(id.to_string()))
    }

    pub fn client_count(&self) -> usize {
        self.clients.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    fn claim(&self, version: &VersionTag) -> usize {
        let mut clients = self.clients.lock().unwrap_or_else(|e| e.into_inner());
        let mut claimed = 0;
        for controller in clients.values_mut() {
            if controller.as_ref() != Some(version) {
                *controller = Some(version.clone());
                claimed += 1;
            }
        }
        claimed
    }

    /// Install a release without activating it
    pub async fn install(
        &self,
        manifest: AssetManifest,
        policy: ServingPolicy,
    ) -> AppShellResult<InstallReport> {
        self.install_observed(manifest, policy, &|_| {}).await
    }

    /// Install a release, calling `on_asset` as each asset arrives
    pub async fn install_observed(
        &self,
        manifest: AssetManifest,
        policy: ServingPolicy,
        on_asset: &(dyn Fn(&Url) + Send + Sync),
    ) -> AppShellResult<InstallReport> {
        if manifest.scope() != &self.scope {
            return Err(AppShellError::ScopeInvalid {
                scope: manifest.scope().to_string(),
                reason: format!("manifest resolved outside registration scope {}", self.scope),
            });
        }

        let controller = Arc::new(CacheController::new(
            manifest,
            policy,
            Arc::clone(&self.store),
            Arc::clone(&self.network),
        ));

        match controller.install_observed(on_asset).await {
            Ok(report) => {
                self.audit(AuditEvent::InstallCompleted {
                    version: report.version.clone(),
                    assets: report.assets,
                    bytes: report.bytes,
                    reinstalled: report.reinstalled,
                    changed: report.changed.clone(),
                })
                .await;

                let mut waiting = self.waiting.lock().await;
                if let Some(previous) = waiting.replace(controller) {
                    previous.retire();
                }
                Ok(report)
            }
            Err(e) => {
                self.audit(AuditEvent::InstallFailed {
                    version: controller.version().clone(),
                    error: e.to_string(),
                })
                .await;
                Err(e)
            }
        }
    }

    /// Activate the waiting release
    pub async fn activate(&self) -> AppShellResult<Promotion> {
        let controller = self
            .waiting
            .lock()
            .await
            .take()
            .ok_or_else(|| AppShellError::VersionNotInstalled("no waiting version".to_string()))?;
        self.promote(controller).await
    }

    /// Activate a release that is already installed in the store
    pub async fn activate_installed(&self, tag: &VersionTag) -> AppShellResult<Promotion> {
        let meta = self
            .store
            .bucket_meta(tag)
            .await?
            .ok_or_else(|| AppShellError::VersionNotInstalled(tag.to_string()))?;

        let controller = Arc::new(CacheController::from_bucket(
            &meta,
            false,
            Arc::clone(&self.store),
            Arc::clone(&self.network),
        )?);

        let mut waiting = self.waiting.lock().await;
        if waiting.as_ref().is_some_and(|w| w.version() == tag) {
            if let Some(superseded) = waiting.take() {
                superseded.retire();
            }
        }
        drop(waiting);

        self.promote(controller).await
    }

    /// Install then activate immediately
    pub async fn update(
        &self,
        manifest: AssetManifest,
        policy: ServingPolicy,
    ) -> AppShellResult<UpdateReport> {
        self.update_observed(manifest, policy, &|_| {}).await
    }

    pub async fn update_observed(
        &self,
        manifest: AssetManifest,
        policy: ServingPolicy,
        on_asset: &(dyn Fn(&Url) + Send + Sync),
    ) -> AppShellResult<UpdateReport> {
        let install = self.install_observed(manifest, policy, on_asset).await?;
        let promotion = self.activate().await?;
        Ok(UpdateReport { install, promotion })
    }

    async fn promote(&self, controller: Arc<CacheController>) -> AppShellResult<Promotion> {
        // Held until clients are claimed so no fetch is routed to a
        // half-activated release
        let mut active = self.active.write().await;

        let activation = match controller.activate().await {
            Ok(report) => report,
            Err(e) => {
                self.audit(AuditEvent::ActivateFailed {
                    version: controller.version().clone(),
                    error: e.to_string(),
                })
                .await;
                return Err(e);
            }
        };

        for (tag, reason) in &activation.failed {
            self.audit(AuditEvent::BucketDeleteFailed {
                version: tag.clone(),
                error: reason.clone(),
            })
            .await;
        }

        let version = controller.version().clone();
        if let Some(previous) = active.replace(controller) {
            if previous.version() != &version {
                previous.retire();
            }
        }
        let claimed = self.claim(&version);
        drop(active);

        info!("{} is now current; claimed {} client(s)", version, claimed);
        self.audit(AuditEvent::ActivateCompleted {
            version: version.clone(),
            deleted: activation.deleted.clone(),
            claimed,
        })
        .await;

        Ok(Promotion {
            activation,
            claimed,
        })
    }

    /// Route a client's request through the controller that controls it
    pub async fn fetch(&self, client: ClientId, request: Request) -> AppShellResult<Served> {
        let controlled_by = self.controller_of(client)?;
        let active = self.active.read().await.clone();

        match (controlled_by, active) {
            (Some(version), Some(controller)) if controller.version() == &version => {
                controller.handle_fetch(request).await
            }
            _ => {
                debug!("Uncontrolled client {}: {} {}", client, request.method, request.url);
                let response = self.network.fetch(&request).await?;
                Ok(Served::new(response, ServedFrom::Passthrough))
            }
        }
    }
}
