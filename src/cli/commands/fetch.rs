//! Fetch command - serve one request the way an open page would

use super::{format_bytes, network_for, open_registration};
use crate::cli::args::FetchArgs;
use crate::config::Config;
use crate::controller::{RevalidationOutcome, ServedFrom};
use crate::error::{AppShellError, AppShellResult};
use crate::http::Request;
use crate::ui::{self, UiContext};
use tokio::fs;

/// Execute the fetch command
pub async fn execute(args: FetchArgs, config: &Config) -> AppShellResult<()> {
    let ctx = UiContext::detect();
    let registration = open_registration(config, network_for(config, args.offline)).await?;

    // Relative paths resolve under the scope; absolute URLs replace it
    let url = registration.scope().join(&args.url)?;
    let request = Request::new(args.method, url);

    let client = registration.register_client().await;
    if registration.controller_of(client)?.is_none() {
        ui::step_warn_hint(
            &ctx,
            "No current release; the request goes to the network",
            "Run: appshell update",
        );
    }

    let mut served = registration.fetch(client, request).await?;
    let response = &served.response;

    let source_ok = matches!(served.source, ServedFrom::Cache);
    ui::key_value(&ctx, "Status", &response.status.to_string());
    ui::key_value_status(&ctx, "Source", &served.source.to_string(), source_ok);
    ui::key_value(&ctx, "Size", &format_bytes(response.body.len() as u64));
    if let Some(content_type) = response.header("content-type") {
        ui::key_value(&ctx, "Content-Type", content_type);
    }

    if let Some(ref path) = args.output {
        fs::write(path, &response.body)
            .await
            .map_err(|e| AppShellError::io(format!("writing {}", path.display()), e))?;
        ui::step_ok_detail(&ctx, "Body written", &path.display().to_string());
    }

    // The process is about to exit; let the background refresh land first
    match served.settle().await {
        Some(RevalidationOutcome::Stored) => ui::step_info(&ctx, "Bucket entry refreshed"),
        Some(RevalidationOutcome::NotStored { status }) => {
            ui::step_warn(&ctx, &format!("Refresh returned {}; stale entry kept", status))
        }
        Some(RevalidationOutcome::Failed(reason)) => {
            ui::step_warn_hint(&ctx, "Refresh failed; stale entry kept", &reason)
        }
        None => {}
    }

    Ok(())
}
