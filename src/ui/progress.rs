//! Progress indicators with CI fallback

use super::context::UiContext;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use url::Url;

/// A task spinner with CI fallback
pub struct TaskSpinner {
    spinner: Option<cliclack::ProgressBar>,
    interactive: bool,
}

impl TaskSpinner {
    /// Create a new spinner (shows on `start` in interactive mode)
    pub fn new(ctx: &UiContext) -> Self {
        Self {
            spinner: None,
            interactive: ctx.use_fancy_output(),
        }
    }

    /// Start the spinner with a message
    pub fn start(&mut self, message: &str) {
        if self.interactive {
            let spinner = cliclack::spinner();
            spinner.start(message);
            self.spinner = Some(spinner);
        } else {
            println!("{} {}", style("...").dim(), message);
        }
    }

    /// Stop with success message
    pub fn stop(&mut self, message: &str) {
        if let Some(spinner) = self.spinner.take() {
            spinner.stop(message);
        } else if self.interactive {
            println!("{} {}", style("✓").green(), message);
        } else {
            println!("{} {}", style("[OK]").green(), message);
        }
    }

    /// Stop with error message
    pub fn stop_error(&mut self, message: &str) {
        if let Some(spinner) = self.spinner.take() {
            spinner.error(message);
        } else if self.interactive {
            println!("{} {}", style("✗").red(), message);
        } else {
            println!("{} {}", style("[FAIL]").red(), message);
        }
    }
}

/// Progress bar for a release install.
///
/// Advances once per stored asset. Shows an indicatif bar in interactive
/// mode, one line per asset in CI.
pub struct InstallProgress {
    bar: Option<ProgressBar>,
    scope: Url,
}

impl InstallProgress {
    pub fn new(ctx: &UiContext, version: &str, scope: &Url, total: usize) -> Self {
        let bar = if ctx.use_fancy_output() {
            let bar = ProgressBar::new(total as u64);
            let template = ProgressStyle::default_bar().template(
                "  {spinner:.cyan} Installing {prefix}  {bar:20.cyan/dim} {pos}/{len} {msg:.dim}  {elapsed:.dim}",
            );
            if let Ok(template) = template {
                bar.set_style(
                    template
                        .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏ ")
                        .progress_chars("━╸─"),
                );
            }
            bar.set_prefix(version.to_string());
            bar.enable_steady_tick(std::time::Duration::from_millis(120));
            Some(bar)
        } else {
            println!("Installing {} ({} assets)...", version, total);
            None
        };
        Self {
            bar,
            scope: scope.clone(),
        }
    }

    /// Record one stored asset
    pub fn on_asset(&self, url: &Url) {
        let display = display_path(&self.scope, url);
        if let Some(ref bar) = self.bar {
            bar.inc(1);
            bar.set_message(display);
        } else {
            println!("  {}", display);
        }
    }

    /// Finish and clear the progress bar
    pub fn finish(&self) {
        if let Some(ref bar) = self.bar {
            bar.disable_steady_tick();
            bar.finish_and_clear();
        }
    }
}

/// Shorten a URL to its path relative to the scope, when it has one
pub fn display_path(scope: &Url, url: &Url) -> String {
    match scope.make_relative(url) {
        Some(rel) if rel.is_empty() => "./".to_string(),
        Some(rel) if !rel.starts_with("../") => rel,
        _ => url.to_string(),
    }
}
