//! Manifest command - print the resolved asset manifest

use super::load_manifest;
use crate::cli::args::{ManifestArgs, OutputFormat};
use crate::config::Config;
use crate::error::AppShellResult;
use crate::ui::{self, display_path, UiContext};

/// Execute the manifest command
pub async fn execute(args: ManifestArgs, config: &Config) -> AppShellResult<()> {
    let manifest = load_manifest(config, args.manifest.as_deref()).await?;

    match args.format {
        OutputFormat::Json => {
            let json = serde_json::json!({
                "version": manifest.version(),
                "scope": manifest.scope(),
                "fingerprint": manifest.fingerprint(),
                "assets": manifest.urls(),
            });
            println!("{}", serde_json::to_string_pretty(&json)?);
        }
        OutputFormat::Plain => {
            for url in manifest.urls() {
                println!("{}", url);
            }
        }
        OutputFormat::Table => {
            let ctx = UiContext::detect();
            ui::section(&ctx, &format!("Release {}", manifest.version()));
            ui::key_value(&ctx, "Scope", manifest.scope().as_str());
            ui::key_value(&ctx, "Fingerprint", &manifest.fingerprint());
            ui::key_value(&ctx, "Assets", &manifest.len().to_string());
            println!();
            for url in manifest.urls() {
                println!("  {}", display_path(manifest.scope(), url));
            }
        }
    }

    Ok(())
}
