//! Buckets command - list installed releases

use crate::cli::args::{BucketsArgs, OutputFormat};
use crate::config::Config;
use crate::controller::ServingPolicy;
use crate::error::AppShellResult;
use crate::manifest::VersionTag;
use crate::store::{BucketStore, DiskStore};
use crate::ui::{self, UiContext};
use chrono::{DateTime, Utc};
use console::style;
use serde::Serialize;

/// One installed bucket, as listed
#[derive(Debug, Clone, Serialize)]
pub struct BucketRow {
    pub version: VersionTag,
    pub active: bool,
    pub policy: ServingPolicy,
    pub entries: usize,
    pub created_at: DateTime<Utc>,
}

/// Collect every bucket in the store with its entry count
pub(crate) async fn collect(store: &dyn BucketStore) -> AppShellResult<Vec<BucketRow>> {
    let active = store.active_tag().await?;
    let mut rows = Vec::new();

    for tag in store.bucket_tags().await? {
        let Some(meta) = store.bucket_meta(&tag).await? else {
            continue;
        };
        let entries = store.entry_keys(&tag).await?.len();
        rows.push(BucketRow {
            active: active.as_ref() == Some(&tag),
            version: tag,
            policy: meta.policy,
            entries,
            created_at: meta.created_at,
        });
    }

    Ok(rows)
}

/// Execute the buckets command
pub async fn execute(args: BucketsArgs, config: &Config) -> AppShellResult<()> {
    let store = DiskStore::open(config.store_dir()).await?;
    let rows = collect(&store).await?;

    if rows.is_empty() {
        match args.format {
            OutputFormat::Json => println!("[]"),
            OutputFormat::Plain => {}
            OutputFormat::Table => {
                let ctx = UiContext::detect();
                ui::step_info(&ctx, "No buckets installed");
            }
        }
        return Ok(());
    }

    match args.format {
        OutputFormat::Table => print_table(&rows),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&rows)?),
        OutputFormat::Plain => {
            for row in &rows {
                println!("{}", row.version);
            }
        }
    }

    Ok(())
}

fn print_table(rows: &[BucketRow]) {
    println!(
        "{:<28} {:<10} {:<24} {:<8} {:<16}",
        style("VERSION").bold(),
        style("STATE").bold(),
        style("POLICY").bold(),
        style("ENTRIES").bold(),
        style("INSTALLED").bold()
    );
    println!("{}", "-".repeat(90));

    for row in rows {
        let state = if row.active {
            style("current").green()
        } else {
            style("stale").dim()
        };
        println!(
            "{:<28} {:<10} {:<24} {:<8} {:<16}",
            row.version.as_str(),
            state,
            row.policy.to_string(),
            row.entries,
            row.created_at.format("%Y-%m-%d %H:%M")
        );
    }

    println!();
    println!("{} bucket(s)", rows.len());
}
