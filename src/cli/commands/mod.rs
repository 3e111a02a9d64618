//! CLI command implementations

pub mod activate;
pub mod buckets;
pub mod config;
pub mod fetch;
pub mod install;
pub mod manifest;
pub mod status;

pub use activate::execute as activate;
pub use buckets::execute as buckets;
pub use config::execute as config;
pub use fetch::execute as fetch;
pub use install::{install, update};
pub use manifest::execute as manifest;
pub use status::execute as status;

use crate::audit::AuditLog;
use crate::config::Config;
use crate::error::AppShellResult;
use crate::manifest::{AssetManifest, ManifestFile};
use crate::network::{HttpNetwork, Network, ScriptedNetwork};
use crate::registration::Registration;
use crate::store::DiskStore;
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

/// Network used by commands; `offline` swaps in an unreachable origin
pub(crate) fn network_for(config: &Config, offline: bool) -> Arc<dyn Network> {
    if offline {
        let network = ScriptedNetwork::new();
        network.set_offline(true);
        Arc::new(network)
    } else {
        Arc::new(HttpNetwork::new(
            config.network_timeout(),
            config.network.user_agent.clone(),
        ))
    }
}

/// Open the on-disk registration and resume the current release
pub(crate) async fn open_registration(
    config: &Config,
    network: Arc<dyn Network>,
) -> AppShellResult<Registration> {
    let scope = config.scope()?;
    let store = DiskStore::open(config.store_dir()).await?;
    debug!(
        "Bucket store at {} ({} network)",
        store.root().display(),
        network.name()
    );

    let registration = Registration::new(scope, Arc::new(store), network)
        .with_audit(AuditLog::new(config));
    registration.restore().await?;
    Ok(registration)
}

/// Load the manifest named on the command line, in config, or the built-in one
pub(crate) async fn load_manifest(
    config: &Config,
    path: Option<&Path>,
) -> AppShellResult<AssetManifest> {
    let file = match path.or(config.controller.manifest.as_deref()) {
        Some(path) => {
            debug!("Loading manifest from {}", path.display());
            ManifestFile::from_file(path).await?
        }
        None => ManifestFile::builtin()?,
    };
    file.resolve(&config.scope()?)
}

/// Human-readable byte count
pub(crate) fn format_bytes(bytes: u64) -> String {
    const KIB: u64 = 1024;
    const MIB: u64 = 1024 * KIB;
    if bytes >= MIB {
        format!("{:.1} MiB", bytes as f64 / MIB as f64)
    } else if bytes >= KIB {
        format!("{:.1} KiB", bytes as f64 / KIB as f64)
    } else {
        format!("{} B", bytes)
    }
}
