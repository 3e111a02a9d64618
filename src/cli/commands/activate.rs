//! Activate command - make an installed release current

use super::install::print_promotion;
use super::{network_for, open_registration};
use crate::cli::args::ActivateArgs;
use crate::config::Config;
use crate::error::AppShellResult;
use crate::manifest::VersionTag;
use crate::ui::{self, TaskSpinner, UiContext};

/// Execute the activate command
pub async fn execute(args: ActivateArgs, config: &Config) -> AppShellResult<()> {
    let ctx = UiContext::detect();
    let tag = VersionTag::new(args.version)?;
    let registration = open_registration(config, network_for(config, false)).await?;

    let mut spinner = TaskSpinner::new(&ctx);
    spinner.start(&format!("Activating {}...", tag));

    let promotion = match registration.activate_installed(&tag).await {
        Ok(promotion) => {
            spinner.stop(&format!("{} is now current", tag));
            promotion
        }
        Err(e) => {
            spinner.stop_error(&format!("Could not activate {}", tag));
            return Err(e);
        }
    };

    print_promotion(&ctx, &promotion);
    if !promotion.activation.failed.is_empty() {
        ui::remark(&ctx, "Stale buckets are retried on the next activation");
    }
    Ok(())
}
