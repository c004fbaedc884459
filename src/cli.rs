//! CLI command definitions using clap.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

/// roomsync - room membership follows directory groups
#[derive(Parser, Debug)]
#[command(name = "roomsync")]
#[command(version)]
#[command(about = "Keep collaboration room membership in step with directory groups")]
#[command(
    long_about = "roomsync reads a CSV mapping of directory groups to rooms and adds or removes room members until every mapped room holds exactly its group's members."
)]
pub struct Cli {
    /// TOML configuration file
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Reconcile every mapped room against its group
    Sync(SyncArgs),
}

#[derive(clap::Args, Debug, Clone, Default)]
pub struct SyncArgs {
    /// CSV file with `group` and `room` columns
    #[arg(short, long)]
    pub mapping: Option<PathBuf>,

    /// Bearer token (defaults to ROOMSYNC_TOKEN or WEBEX_ACCESS_TOKEN)
    #[arg(long)]
    pub token: Option<String>,

    /// API root, e.g. https://webexapis.com/v1
    #[arg(long)]
    pub base_url: Option<String>,

    /// Compute and print the changes without applying them
    #[arg(long, default_value_t = false)]
    pub dry_run: bool,

    /// Repeat the sync every N seconds until Ctrl+C
    #[arg(long, value_name = "SECS")]
    pub interval: Option<u64>,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// Maximum member listings fetched at once
    #[arg(long, value_name = "N")]
    pub max_concurrent: Option<usize>,
}

#[derive(ValueEnum, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}
