//! Config command - show or edit configuration

use crate::cli::args::{ConfigAction, ConfigArgs};
use crate::config::{Config, ConfigManager};
use crate::controller::ServingPolicy;
use crate::error::{AppShellError, AppShellResult};
use crate::manifest::parse_scope;
use crate::ui::{self, UiContext};
use std::path::PathBuf;

const VALID_KEYS: &[&str] = &[
    "general.verbose",
    "general.log_format",
    "general.audit_log",
    "controller.scope",
    "controller.policy",
    "controller.manifest",
    "store.dir",
    "network.timeout_secs",
    "network.user_agent",
];

/// Execute the config command
pub async fn execute(args: ConfigArgs, manager: &ConfigManager) -> AppShellResult<()> {
    match args.action {
        None | Some(ConfigAction::Show) => show_config(&manager.load().await?)?,
        Some(ConfigAction::Path) => println!("{}", manager.path().display()),
        Some(ConfigAction::Init { force }) => {
            init_config(&UiContext::detect().with_auto_yes(force), manager).await?
        }
        Some(ConfigAction::Set { key, value }) => {
            let mut config = manager.load().await?;
            set_value(&mut config, &key, &value)?;
            manager.save(&config).await?;
            ui::step_ok(&UiContext::detect(), &format!("Set {} = {}", key, value));
        }
    }

    Ok(())
}

fn show_config(config: &Config) -> AppShellResult<()> {
    println!("{}", toml::to_string_pretty(config)?);
    Ok(())
}

async fn init_config(ctx: &UiContext, manager: &ConfigManager) -> AppShellResult<()> {
    let path = manager.path();

    if path.exists() {
        let overwrite = ui::confirm(
            ctx,
            &format!("Overwrite existing config at {}?", path.display()),
            false,
        )
        .await?;
        if !overwrite {
            ui::step_warn_hint(
                ctx,
                &format!("Config already exists at {}", path.display()),
                "Use --force to overwrite",
            );
            return Ok(());
        }
    }

    manager.save(&Config::default()).await?;
    ui::step_ok_detail(
        ctx,
        "Configuration initialized",
        &path.display().to_string(),
    );

    Ok(())
}

/// Apply a dot-separated key to the config
fn set_value(config: &mut Config, key: &str, value: &str) -> AppShellResult<()> {
    let parts: Vec<&str> = key.split('.').collect();

    match parts.as_slice() {
        ["general", "verbose"] => config.general.verbose = parse_bool(value)?,
        ["general", "log_format"] => match value {
            "text" | "json" => config.general.log_format = value.to_string(),
            _ => {
                return Err(AppShellError::User(format!(
                    "Invalid log format: {}. Use text or json",
                    value
                )))
            }
        },
        ["general", "audit_log"] => config.general.audit_log = parse_bool(value)?,

        ["controller", "scope"] => {
            parse_scope(value)?;
            config.controller.scope = value.to_string();
        }
        ["controller", "policy"] => {
            config.controller.policy = value
                .parse::<ServingPolicy>()
                .map_err(AppShellError::User)?
        }
        ["controller", "manifest"] => config.controller.manifest = optional_path(value),

        ["store", "dir"] => config.store.dir = optional_path(value),

        ["network", "timeout_secs"] => {
            config.network.timeout_secs = value.parse().map_err(|_| {
                AppShellError::User(format!("Invalid number: {}", value))
            })?
        }
        ["network", "user_agent"] => config.network.user_agent = value.to_string(),

        _ => {
            return Err(AppShellError::User(format!(
                "Unknown config key: {}. Valid keys: {}",
                key,
                VALID_KEYS.join(", ")
            )))
        }
    }

    Ok(())
}

/// Empty string clears an optional path
fn optional_path(value: &str) -> Option<PathBuf> {
    (!value.is_empty()).then(|| PathBuf::from(value))
}

fn parse_bool(value: &str) -> AppShellResult<bool> {
    match value.to_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        _ => Err(AppShellError::User(format!(
            "Invalid boolean value: {}. Use true/false",
            value
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn set_known_keys() {
        let mut config = Config::default();
        set_value(&mut config, "controller.policy", "cache-first").unwrap();
        set_value(&mut config, "controller.scope", "https://cards.example.com/").unwrap();
        set_value(&mut config, "network.timeout_secs", "5").unwrap();
        set_value(&mut config, "general.audit_log", "no").unwrap();

        assert_eq!(config.controller.policy, ServingPolicy::CacheFirst);
        assert_eq!(config.controller.scope, "https://cards.example.com/");
        assert_eq!(config.network.timeout_secs, 5);
        assert!(!config.general.audit_log);
    }

    #[test]
    fn set_rejects_bad_values() {
        let mut config = Config::default();
        assert!(set_value(&mut config, "controller.policy", "network-only").is_err());
        assert!(set_value(&mut config, "controller.scope", "ftp://x/").is_err());
        assert!(set_value(&mut config, "general.log_format", "xml").is_err());
        assert!(set_value(&mut config, "vm.name", "x").is_err());
    }

    #[test]
    fn empty_path_clears() {
        let mut config = Config::default();
        set_value(&mut config, "store.dir", "/tmp/b").unwrap();
        assert_eq!(config.store.dir, Some(PathBuf::from("/tmp/b")));
        set_value(&mut config, "store.dir", "").unwrap();
        assert!(config.store.dir.is_none());
    }

    #[tokio::test]
    async fn init_keeps_existing_without_force() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        tokio::fs::write(&path, "[controller]\npolicy = \"cache-first\"\n")
            .await
            .unwrap();
        let manager = ConfigManager::with_path(path.clone());

        init_config(&UiContext::non_interactive(), &manager)
            .await
            .unwrap();
        let loaded = manager.load().await.unwrap();
        assert_eq!(loaded.controller.policy, ServingPolicy::CacheFirst);

        init_config(&UiContext::non_interactive().with_auto_yes(true), &manager)
            .await
            .unwrap();
        let loaded = manager.load().await.unwrap();
        assert_eq!(loaded.controller.policy, ServingPolicy::StaleWhileRevalidate);
    }
}
