//! Application configuration.
//!
//! Settings resolve in this order, first match wins: command-line flag,
//! environment variable, `--config` file, built-in default. The bearer token
//! is only ever taken from the command line or the environment.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, bail};
use roomsync_directory::{BearerToken, DirectoryConfig};
use roomsync_reconciler::ReconcilerConfig;
use serde::{Deserialize, Serialize};

use crate::cli::{OutputFormat, SyncArgs};

/// Contents of the `--config` TOML file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    #[serde(default)]
    pub directory: DirectoryConfig,
    #[serde(default)]
    pub sync: SyncSection,
}

/// The `[sync]` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SyncSection {
    /// Mapping CSV, relative to the working directory.
    #[serde(default)]
    pub mapping: Option<PathBuf>,
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent: usize,
    /// Seconds between runs; absent means run once.
    #[serde(default)]
    pub interval_secs: Option<u64>,
}

impl Default for SyncSection {
    fn default() -> Self {
        Self {
            mapping: None,
            max_concurrent: default_max_concurrent(),
            interval_secs: None,
        }
    }
}

fn default_max_concurrent() -> usize {
    ReconcilerConfig::default().max_concurrent_fetches
}

impl AppConfig {
    /// Load the config file, or defaults when no path is given.
    ///
    /// # Errors
    ///
    /// Fails when the file cannot be read or is not valid TOML for this
    /// schema.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::parse(&text).with_context(|| format!("Invalid config file {}", path.display()))
    }

    /// Parse config file contents.
    ///
    /// # Errors
    ///
    /// Fails on invalid TOML or unknown keys.
    pub fn parse(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Combine the file with the environment and the `sync` flags.
    ///
    /// # Errors
    ///
    /// Fails when no mapping file or token is available, or when a setting is
    /// out of range.
    pub fn resolve(self, mut args: SyncArgs) -> Result<SyncSettings> {
        let token = match args.token.take() {
            Some(token) => BearerToken::new(token),
            None => BearerToken::from_env(),
        }
        .context("No usable bearer token")?;
        self.resolve_with_token(args, token)
    }

    /// Like [`AppConfig::resolve`] with the token already known.
    ///
    /// # Errors
    ///
    /// Fails when no mapping file is available or a setting is out of range.
    pub fn resolve_with_token(self, args: SyncArgs, token: BearerToken) -> Result<SyncSettings> {
        let Self { directory, sync } = self;

        let mut directory = directory.merge_env();
        if let Some(base_url) = args.base_url {
            directory.base_url = base_url;
        }
        directory.validate().context("Invalid directory settings")?;

        let Some(mapping) = args.mapping.or(sync.mapping) else {
            bail!("No mapping file: pass --mapping or set [sync] mapping in the config file");
        };

        let reconciler = ReconcilerConfig {
            max_concurrent_fetches: args.max_concurrent.unwrap_or(sync.max_concurrent),
        };
        reconciler.validate().context("Invalid sync settings")?;

        let interval = match args.interval.or(sync.interval_secs) {
            Some(0) => bail!("--interval must be at least one second"),
            Some(secs) => Some(Duration::from_secs(secs)),
            None => None,
        };

        Ok(SyncSettings {
            directory,
            token,
            reconciler,
            mapping,
            interval,
            dry_run: args.dry_run,
            format: args.format,
        })
    }
}

/// Everything one `sync` invocation needs.
#[derive(Debug, Clone)]
pub struct SyncSettings {
    pub directory: DirectoryConfig,
    pub token: BearerToken,
    pub reconciler: ReconcilerConfig,
    pub mapping: PathBuf,
    pub interval: Option<Duration>,
    pub dry_run: bool,
    pub format: OutputFormat,
}
