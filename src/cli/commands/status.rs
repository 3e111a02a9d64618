//! Status command - scope, policy and installed releases

use super::buckets::collect;
use super::load_manifest;
use crate::audit::AuditLog;
use crate::config::Config;
use crate::error::AppShellResult;
use crate::store::{BucketStore, DiskStore};
use console::{style, Emoji};

static CHECK: Emoji<'_, '_> = Emoji("✓ ", "[OK] ");
static CROSS: Emoji<'_, '_> = Emoji("✗ ", "[FAIL] ");
static WARN: Emoji<'_, '_> = Emoji("⚠ ", "[WARN] ");

/// Execute the status command
pub async fn execute(config: &Config) -> AppShellResult<()> {
    println!("{}", style("appshell status").bold().cyan());
    println!();

    println!("{}", style("Controller:").bold());
    let scope = match config.scope() {
        Ok(scope) => {
            println!("  {} Scope: {}", CHECK, scope);
            scope
        }
        Err(e) => {
            println!("  {} {} - {}", CROSS, style("Invalid scope").red(), e);
            return Ok(());
        }
    };
    println!("  {} Policy: {}", CHECK, config.controller.policy);

    // What `appshell update` would install
    match load_manifest(config, None).await {
        Ok(manifest) => println!(
            "  {} Manifest: {} ({} assets)",
            CHECK,
            manifest.version(),
            manifest.len()
        ),
        Err(e) => println!("  {} {} - {}", CROSS, style("Manifest").red(), e),
    }

    println!();
    println!("{}", style("Buckets:").bold());
    let dir = config.store_dir();
    println!("  {} Store: {}", CHECK, dir.display());

    let store = DiskStore::open(&dir).await?;
    let rows = collect(&store).await?;
    let active = store.active_tag().await?;

    match active {
        Some(ref tag) => println!("  {} Current: {}", CHECK, style(tag).green()),
        None => println!(
            "  {} {} - Run: appshell update",
            WARN,
            style("No current release").yellow()
        ),
    }

    for row in rows.iter().filter(|r| !r.active) {
        println!(
            "  {} Stale bucket {} - removed on next activation",
            WARN,
            style(&row.version).yellow()
        );
    }

    if let Some(ref tag) = active {
        if !rows.iter().any(|r| &r.version == tag) {
            println!(
                "  {} {} {} has no bucket",
                CROSS,
                style("Current release").red(),
                tag
            );
        }
    }

    if config.general.audit_log {
        let audit = AuditLog::new(config);
        match audit.read().await {
            Ok(records) => match records.last() {
                Some(last) => println!(
                    "  {} Last event: {} at {}",
                    CHECK,
                    last.event.name(),
                    last.timestamp.format("%Y-%m-%d %H:%M:%S UTC")
                ),
                None => println!("  {} No lifecycle events recorded", CHECK),
            },
            Err(e) => println!(
                "  {} {} {} - {}",
                WARN,
                style("Audit log unreadable:").yellow(),
                audit.path().display(),
                e
            ),
        }
    }

    println!();
    println!("  Serving under {}", style(scope).dim());
    Ok(())
}
