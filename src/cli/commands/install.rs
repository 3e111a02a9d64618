//! Install and update commands

use super::{format_bytes, load_manifest, network_for, open_registration};
use crate::cli::args::ReleaseArgs;
use crate::config::Config;
use crate::controller::InstallReport;
use crate::error::AppShellResult;
use crate::registration::Promotion;
use crate::ui::{self, display_path, InstallProgress, UiContext};
use url::Url;

/// Install a release into a new bucket; the current release keeps serving
pub async fn install(args: ReleaseArgs, config: &Config) -> AppShellResult<()> {
    let ctx = UiContext::detect();
    let manifest = load_manifest(config, args.manifest.as_deref()).await?;
    let policy = args.policy.unwrap_or(config.controller.policy);
    let registration = open_registration(config, network_for(config, false)).await?;

    ui::intro(&ctx, &format!("Install {}", manifest.version()));

    let version = manifest.version().clone();
    let scope = manifest.scope().clone();
    let progress = InstallProgress::new(&ctx, version.as_str(), &scope, manifest.len());
    let result = registration
        .install_observed(manifest, policy, &|url| progress.on_asset(url))
        .await;
    progress.finish();

    let report = result?;
    print_install(&ctx, &scope, &report);

    ui::outro_success(
        &ctx,
        &format!("Installed {}. Run: appshell activate {}", version, version),
    );
    Ok(())
}

/// Install a release and make it current right away
pub async fn update(args: ReleaseArgs, config: &Config) -> AppShellResult<()> {
    let ctx = UiContext::detect();
    let manifest = load_manifest(config, args.manifest.as_deref()).await?;
    let policy = args.policy.unwrap_or(config.controller.policy);
    let registration = open_registration(config, network_for(config, false)).await?;

    let previous = registration.active_version().await;
    ui::intro(&ctx, &format!("Update to {}", manifest.version()));
    if let Some(ref previous) = previous {
        ui::step_info(&ctx, &format!("Current release: {}", previous));
    }

    let version = manifest.version().clone();
    let scope = manifest.scope().clone();
    let progress = InstallProgress::new(&ctx, version.as_str(), &scope, manifest.len());
    let result = registration
        .update_observed(manifest, policy, &|url| progress.on_asset(url))
        .await;
    progress.finish();

    let report = result?;
    print_install(&ctx, &scope, &report.install);
    print_promotion(&ctx, &report.promotion);

    ui::outro_success(&ctx, &format!("{} is now current ({})", version, policy));
    Ok(())
}

fn print_install(ctx: &UiContext, scope: &Url, report: &InstallReport) {
    ui::step_ok_detail(
        ctx,
        &format!("Stored {} assets", report.assets),
        &format_bytes(report.bytes),
    );

    if report.reinstalled {
        ui::step_info(ctx, &format!("{} was already installed; bucket replaced", report.version));
    }
    for url in &report.changed {
        ui::step_warn_hint(
            ctx,
            &format!("{} changed without a version bump", display_path(scope, url)),
            "Clients that already cached it keep the old bytes",
        );
    }
}

pub(crate) fn print_promotion(ctx: &UiContext, promotion: &Promotion) {
    for tag in &promotion.activation.deleted {
        ui::step_ok(ctx, &format!("Removed bucket {}", tag));
    }
    for (tag, reason) in &promotion.activation.failed {
        ui::step_warn_hint(
            ctx,
            &format!("Could not remove bucket {}", tag),
            reason,
        );
    }
    if promotion.claimed > 0 {
        ui::step_info(ctx, &format!("Claimed {} client(s)", promotion.claimed));
    }
}
