//! Line-oriented CLI output
//!
//! Every step helper prints through `emit`, which picks the `cliclack` log style
//! in a terminal and a bracketed marker (`[OK]`, `[WARN]`, `[INFO]`) otherwise,
//! so piped output of `install`, `activate` and `fetch` stays greppable.

use super::context::UiContext;
use console::{style, Style};

/// Outcome marker for a single output line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    Ok,
    Warn,
    Info,
    Remark,
}

impl Mark {
    fn plain_prefix(self) -> Option<(&'static str, Style)> {
        match self {
            Mark::Ok => Some(("[OK]", Style::new().green())),
            Mark::Warn => Some(("[WARN]", Style::new().yellow())),
            Mark::Info => Some(("[INFO]", Style::new().cyan())),
            Mark::Remark => None,
        }
    }
}

fn emit(ctx: &UiContext, mark: Mark, message: String) {
    if ctx.use_fancy_output() {
        let _ = match mark {
            Mark::Ok => cliclack::log::success(message),
            Mark::Warn => cliclack::log::warning(message),
            Mark::Info => cliclack::log::info(message),
            Mark::Remark => cliclack::log::remark(message),
        };
        return;
    }

    match mark.plain_prefix() {
        Some((label, color)) => println!("  {} {}", color.apply_to(label), message),
        None => println!("  {}", style(message).dim()),
    }
}

/// Message and detail joined by `sep`, the detail dimmed in a terminal
fn with_detail(ctx: &UiContext, message: &str, detail: &str, sep: &str) -> String {
    if ctx.use_fancy_output() {
        format!("{}{}{}", message, sep, style(detail).dim())
    } else {
        format!("{}{}{}", message, sep, detail)
    }
}

/// Opening line of a lifecycle command, e.g. "Update to flashcards-v34-idb"
pub fn intro(ctx: &UiContext, title: &str) {
    let title = style(title).cyan().bold();
    if ctx.use_fancy_output() {
        let _ = cliclack::intro(title);
    } else {
        println!("{}\n", title);
    }
}

/// Closing line once a release is installed or current
pub fn outro_success(ctx: &UiContext, message: &str) {
    if ctx.use_fancy_output() {
        let _ = cliclack::outro(style(message).green().bold());
    } else {
        println!("\n{} {}", style("[OK]").green(), message);
    }
}

pub fn section(ctx: &UiContext, title: &str) {
    println!();
    if ctx.use_fancy_output() {
        let _ = cliclack::log::info(style(title).bold());
    } else {
        println!("{}", style(title).bold());
    }
}

pub fn step_ok(ctx: &UiContext, message: &str) {
    emit(ctx, Mark::Ok, message.to_string());
}

pub fn step_ok_detail(ctx: &UiContext, message: &str, detail: &str) {
    emit(ctx, Mark::Ok, with_detail(ctx, message, &format!("({})", detail), " "));
}

pub fn step_warn(ctx: &UiContext, message: &str) {
    emit(ctx, Mark::Warn, message.to_string());
}

/// Warning followed by the reason or the next command to run
pub fn step_warn_hint(ctx: &UiContext, message: &str, hint: &str) {
    emit(ctx, Mark::Warn, with_detail(ctx, message, hint, " - "));
}

pub fn step_info(ctx: &UiContext, message: &str) {
    emit(ctx, Mark::Info, message.to_string());
}

pub fn remark(ctx: &UiContext, message: &str) {
    emit(ctx, Mark::Remark, message.to_string());
}

/// `key: value` row, as used for fetch results and manifest details
pub fn key_value(ctx: &UiContext, key: &str, value: &str) {
    key_value_styled(ctx, key, value, Style::new());
}

/// Row whose value is green when `ok` (served from the bucket), yellow otherwise
pub fn key_value_status(ctx: &UiContext, key: &str, value: &str, ok: bool) {
    let value_style = if ok {
        Style::new().green()
    } else {
        Style::new().yellow()
    };
    key_value_styled(ctx, key, value, value_style);
}

fn key_value_styled(ctx: &UiContext, key: &str, value: &str, value_style: Style) {
    if ctx.use_fancy_output() {
        println!("  {}: {}", style(key).dim(), value_style.apply_to(value));
    } else {
        println!("  {}: {}", key, value);
    }
}
