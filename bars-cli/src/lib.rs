//! # Fraction Bars CLI
//!
//! Host for `bars-core` outside the browser. Replays recorded pointer,
//! keyboard and command scripts against a session persisted on disk, and
//! inspects or resets saved sessions.
//!
//! ## Components
//!
//! - `CliArgs` - Command-line arguments parsed with clap
//! - `CliConfig` - Resolved data directory and session
//! - [`script`] - Replay script format and runner
//! - [`replay`], [`show`], [`reset`] - The subcommands

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]

pub mod script;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use bars_core::narration::describe;
use bars_core::persistence::load_snapshot;
use bars_core::{
    spawn_autosave, AppState, AutosaveConfig, FileStorage, InputController, StateManager, Storage,
};
use clap::{Parser, Subcommand};

/// Default session name.
pub const DEFAULT_SESSION: &str = bars_core::store::DEFAULT_SESSION;

/// Command-line arguments for fraction-bars.
#[derive(Debug, Clone, Parser)]
#[command(name = "fraction-bars")]
#[command(about = "Replay and inspect fraction bars sessions")]
#[command(version)]
pub struct CliArgs {
    /// Directory holding saved sessions
    #[arg(long, env = "FRACTION_BARS_DATA_DIR", default_value = "fraction-bars-data")]
    pub data_dir: PathBuf,

    /// Session to operate on
    #[arg(long, env = "FRACTION_BARS_SESSION", default_value = DEFAULT_SESSION)]
    pub session: String,

    /// What to do
    #[command(subcommand)]
    pub command: CliCommand,
}

/// Subcommands.
#[derive(Debug, Clone, Subcommand)]
pub enum CliCommand {
    /// Apply a replay script to the session and save the result
    Replay {
        /// Path to a JSON replay script
        script: PathBuf,
        /// Print the resulting state as JSON
        #[arg(long)]
        print: bool,
    },
    /// Describe the bars in the saved session
    Show,
    /// Delete the saved session
    Reset,
}

/// Resolved configuration.
#[derive(Debug, Clone)]
pub struct CliConfig {
    /// Directory holding saved sessions.
    pub data_dir: PathBuf,
    /// Session name.
    pub session: String,
}

impl From<&CliArgs> for CliConfig {
    fn from(args: &CliArgs) -> Self {
        Self {
            data_dir: args.data_dir.clone(),
            session: args.session.clone(),
        }
    }
}

impl CliConfig {
    /// File storage for the configured session.
    ///
    /// # Errors
    ///
    /// Returns an error if the data directory cannot be created.
    pub fn storage(&self) -> anyhow::Result<FileStorage> {
        FileStorage::new(&self.data_dir, &self.session).with_context(|| {
            format!(
                "Failed to open data directory {}",
                self.data_dir.display()
            )
        })
    }
}

/// Load the session into a fresh manager.
async fn open_session(storage: &FileStorage) -> anyhow::Result<StateManager> {
    let mut manager = StateManager::new();
    match load_snapshot(storage)
        .await
        .with_context(|| format!("Failed to load {}", storage.path().display()))?
    {
        Some(state) => manager.restore(state),
        None => tracing::info!(path = %storage.path().display(), "Starting new session"),
    }
    Ok(manager)
}

/// Replay `script` against the session and save the result.
///
/// Returns the final state.
///
/// # Errors
///
/// Returns an error if the session cannot be loaded, the script cannot be
/// read or parsed, or a scripted command is malformed.
pub async fn replay(config: &CliConfig, script: &Path) -> anyhow::Result<Arc<AppState>> {
    let storage = Arc::new(config.storage()?);
    let mut manager = open_session(&storage).await?;

    let source = std::fs::read_to_string(script)
        .with_context(|| format!("Failed to read script {}", script.display()))?;
    let steps = script::parse_script(&source)
        .with_context(|| format!("Invalid script {}", script.display()))?;

    let autosave = spawn_autosave(
        Arc::clone(&storage) as Arc<dyn Storage>,
        Arc::clone(manager.state()),
        AutosaveConfig::default(),
    );
    manager.subscribe(autosave.subscriber());

    let mut input = InputController::new();
    let outcome = script::run_script(&mut manager, &mut input, &steps);
    // Whatever was applied before a failing step is still saved.
    autosave.shutdown().await;
    let summary = outcome.context("Replay stopped")?;

    tracing::info!(
        steps = summary.steps,
        intents = summary.intents,
        keys = summary.keys_handled,
        bars = manager.state().bars.len(),
        "Replay finished"
    );
    Ok(Arc::clone(manager.state()))
}

/// One line per bar, as a screen reader would announce it.
///
/// # Errors
///
/// Returns an error if the session cannot be loaded.
pub async fn show(config: &CliConfig) -> anyhow::Result<Vec<String>> {
    let storage = config.storage()?;
    let manager = open_session(&storage).await?;
    let state = manager.state();
    Ok(state
        .bars
        .iter()
        .enumerate()
        .map(|(i, bar)| {
            format!(
                "{}. {} ({} x {} at {}, {})",
                i + 1,
                describe(bar),
                bar.width,
                bar.height,
                bar.x,
                bar.y
            )
        })
        .collect())
}

/// Delete the saved session. Returns `false` if nothing was saved.
///
/// # Errors
///
/// Returns an error if the file exists but cannot be removed.
pub fn reset(config: &CliConfig) -> anyhow::Result<bool> {
    let storage = config.storage()?;
    let removed = storage
        .delete()
        .with_context(|| format!("Failed to delete {}", storage.path().display()))?;
    Ok(removed)
}
