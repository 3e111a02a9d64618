//! CLI argument definitions using clap derive

use crate::controller::ServingPolicy;
use crate::http::Method;
use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// appshell - offline app-shell cache and update controller
///
/// Installs versioned releases of a web app's static assets into local
/// buckets and serves requests from them, cache-first or
/// stale-while-revalidate.
#[derive(Parser, Debug)]
#[command(name = "appshell")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Configuration file path
    #[arg(short, long, global = true, env = "APPSHELL_CONFIG")]
    pub config: Option<PathBuf>,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Install a release without activating it
    Install(ReleaseArgs),

    /// Install a release and make it current
    Update(ReleaseArgs),

    /// Make an installed release current and remove the others
    Activate(ActivateArgs),

    /// Serve one request through the current release
    Fetch(FetchArgs),

    /// Show scope, policy and installed releases
    Status,

    /// List installed buckets
    Buckets(BucketsArgs),

    /// Print the resolved asset manifest
    Manifest(ManifestArgs),

    /// Show or edit configuration
    Config(ConfigArgs),
}

/// Arguments for install and update
#[derive(Parser, Debug)]
pub struct ReleaseArgs {
    /// Manifest file (defaults to controller.manifest, then the built-in one)
    #[arg(short, long)]
    pub manifest: Option<PathBuf>,

    /// Serving policy for this release (defaults to controller.policy)
    #[arg(short, long)]
    pub policy: Option<ServingPolicy>,
}

/// Arguments for the activate command
#[derive(Parser, Debug)]
pub struct ActivateArgs {
    /// Version tag of an installed bucket
    #[arg(id = "release_version", value_name = "VERSION")]
    pub version: String,
}

/// Arguments for the fetch command
#[derive(Parser, Debug)]
pub struct FetchArgs {
    /// Absolute URL, or a path relative to the controller scope
    pub url: String,

    /// HTTP method
    #[arg(short = 'X', long, default_value = "GET")]
    pub method: Method,

    /// Treat the network as unreachable
    #[arg(long)]
    pub offline: bool,

    /// Write the response body to a file
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

/// Arguments for the buckets command
#[derive(Parser, Debug)]
pub struct BucketsArgs {
    /// Output format
    #[arg(short, long, default_value = "table")]
    pub format: OutputFormat,
}

/// Arguments for the manifest command
#[derive(Parser, Debug)]
pub struct ManifestArgs {
    /// Manifest file (defaults to controller.manifest, then the built-in one)
    #[arg(short, long)]
    pub manifest: Option<PathBuf>,

    /// Output format
    #[arg(short, long, default_value = "table")]
    pub format: OutputFormat,
}

/// Arguments for the config command
#[derive(Parser, Debug)]
pub struct ConfigArgs {
    /// Subcommand for config
    #[command(subcommand)]
    pub action: Option<ConfigAction>,
}

/// Config subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Show configuration file path
    Path,

    /// Initialize default configuration
    Init {
        /// Overwrite existing configuration
        #[arg(short, long)]
        force: bool,
    },

    /// Set a configuration value
    Set {
        /// Configuration key (e.g., controller.scope)
        key: String,
        /// Value to set
        value: String,
    },
}

/// Output format for listings
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable table
    Table,
    /// JSON output
    Json,
    /// Simple text (one per line)
    Plain,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_parses_update_with_policy() {
        let cli = Cli::parse_from(["appshell", "update", "--policy", "cache-first"]);
        match cli.command {
            Commands::Update(args) => {
                assert_eq!(args.policy, Some(ServingPolicy::CacheFirst));
                assert!(args.manifest.is_none());
            }
            _ => panic!("expected Update command"),
        }
    }

    #[test]
    fn cli_parses_policy_alias() {
        let cli = Cli::parse_from(["appshell", "install", "-p", "swr"]);
        match cli.command {
            Commands::Install(args) => {
                assert_eq!(args.policy, Some(ServingPolicy::StaleWhileRevalidate));
            }
            _ => panic!("expected Install command"),
        }
    }

    #[test]
    fn cli_parses_activate() {
        let cli = Cli::parse_from(["appshell", "activate", "flashcards-v34-idb"]);
        match cli.command {
            Commands::Activate(args) => assert_eq!(args.version, "flashcards-v34-idb"),
            _ => panic!("expected Activate command"),
        }
    }

    #[test]
    fn cli_parses_fetch() {
        let cli = Cli::parse_from(["appshell", "fetch", "index.html", "-X", "post", "--offline"]);
        match cli.command {
            Commands::Fetch(args) => {
                assert_eq!(args.url, "index.html");
                assert_eq!(args.method, Method::Post);
                assert!(args.offline);
                assert!(args.output.is_none());
            }
            _ => panic!("expected Fetch command"),
        }
    }

    #[test]
    fn cli_fetch_defaults_to_get() {
        let cli = Cli::parse_from(["appshell", "fetch", "./"]);
        match cli.command {
            Commands::Fetch(args) => assert_eq!(args.method, Method::Get),
            _ => panic!("expected Fetch command"),
        }
    }

    #[test]
    fn cli_parses_status() {
        let cli = Cli::parse_from(["appshell", "status"]);
        assert!(matches!(cli.command, Commands::Status));
    }

    #[test]
    fn cli_parses_buckets_json() {
        let cli = Cli::parse_from(["appshell", "buckets", "--format", "json"]);
        match cli.command {
            Commands::Buckets(args) => assert!(matches!(args.format, OutputFormat::Json)),
            _ => panic!("expected Buckets command"),
        }
    }

    #[test]
    fn cli_parses_config_init_force() {
        let cli = Cli::parse_from(["appshell", "config", "init", "--force"]);
        match cli.command {
            Commands::Config(ConfigArgs {
                action: Some(ConfigAction::Init { force }),
            }) => assert!(force),
            _ => panic!("expected Config Init command"),
        }
    }

    #[test]
    fn cli_verbose_counts() {
        let cli = Cli::parse_from(["appshell", "-vv", "status"]);
        assert_eq!(cli.verbose, 2);
    }

    #[test]
    fn cli_rejects_unknown_policy() {
        assert!(Cli::try_parse_from(["appshell", "update", "--policy", "network-only"]).is_err());
    }
}
