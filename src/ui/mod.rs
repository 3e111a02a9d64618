//! Terminal output for the operator CLI
//!
//! Uses `cliclack` framing, spinners and prompts in an interactive terminal,
//! and plain `[OK]` / `[WARN]` lines in CI or when piped.
//!
//! # Example
//!
//! ```rust,ignore
//! use appshell::ui::{self, UiContext, InstallProgress};
//!
//! let ctx = UiContext::detect();
//! ui::intro(&ctx, "Update to flashcards-v34-idb");
//!
//! let progress = InstallProgress::new(&ctx, "flashcards-v34-idb", &scope, 13);
//! registration.update_observed(manifest, policy, &|url| progress.on_asset(url)).await?;
//! progress.finish();
//!
//! ui::outro_success(&ctx, "flashcards-v34-idb is now current");
//! ```

mod context;
mod output;
mod progress;
mod prompts;

pub use context::UiContext;
pub use output::{
    intro, key_value, key_value_status, outro_success, remark, section, step_info, step_ok,
    step_ok_detail, step_warn, step_warn_hint,
};
pub use progress::{display_path, InstallProgress, TaskSpinner};
pub use prompts::confirm;
