//! cli
//!
//! Command-line interface layer for cloudgraph.
//!
//! # Responsibilities
//!
//! - Parse command-line arguments and global flags
//! - Resolve configuration into a [`Context`]
//! - Delegate to command handlers
//!
//! # Architecture
//!
//! The CLI layer is thin. Handlers load graphs and history through
//! [`crate::sync`] and format what the [`crate::graph`] layer returns.
//! The CLI never writes to the store.

pub mod args;
pub mod commands;

pub use args::{Cli, Command};

use std::path::PathBuf;

use anyhow::{Context as _, Result};

use crate::core::config::Config;
use crate::core::paths::StorePaths;

/// Resolved settings shared by every command.
#[derive(Debug)]
pub struct Context {
    pub config: Config,
    pub json: bool,
}

impl Context {
    /// Build the context from global flags.
    ///
    /// `--config` replaces discovery, `--home` overrides the configured root.
    pub fn from_flags(config_path: Option<PathBuf>, home: Option<PathBuf>, json: bool) -> Result<Self> {
        let mut config = match config_path {
            Some(path) => Config::load_from(&path)
                .with_context(|| format!("Failed to load config {}", path.display()))?,
            None => Config::load().context("Failed to load config")?,
        };
        if let Some(home) = home {
            config.global.home = Some(home);
        }
        Ok(Self { config, json })
    }

    /// Layout of the store this invocation reads.
    pub fn paths(&self) -> Result<StorePaths> {
        let settings = self
            .config
            .sync_settings()
            .context("Failed to resolve store location")?;
        Ok(settings.paths)
    }
}

/// Run the CLI application.
///
/// This is the main entry point called from `main.rs` once logging is set
/// up.
pub fn run(cli: Cli) -> Result<()> {
    let ctx = Context::from_flags(cli.config, cli.home, cli.json)?;
    commands::dispatch(cli.command, &ctx)
}
