//! tunedupe - duplicate finder and quarantine tool for music libraries
//!
//! Finds byte-identical files by SHA-256 content hash, keeps the copy with
//! the cleanest filename in each duplicate set and moves every other copy
//! to the same relative path under a quarantine directory. Files are never
//! renamed and never overwritten.
//!
//! Pipeline: [`scanner`] (or [`inventory`]) → [`duplicates`] grouping and
//! resolution → [`actions`] relocation, orchestrated by [`engine`] and
//! rendered by [`report`].

pub mod actions;
pub mod cli;
pub mod config;
pub mod duplicates;
pub mod engine;
pub mod error;
pub mod inventory;
pub mod logging;
pub mod progress;
pub mod report;
pub mod scanner;
pub mod signal;

use std::io::IsTerminal;
use std::sync::Arc;

use anyhow::Context;

use crate::cli::Cli;
use crate::config::Config;
use crate::engine::{Engine, EngineConfig, InventorySource};
use crate::error::ExitCode;
use crate::progress::Progress;
use crate::scanner::FileFilter;

/// Run the application for parsed CLI arguments.
///
/// # Errors
///
/// Configuration problems and fatal run errors. The caller maps them to an
/// exit code with [`ExitCode::for_error`].
pub fn run_app(cli: Cli) -> anyhow::Result<ExitCode> {
    logging::init_logging(cli.verbose, cli.quiet);

    let config = Config::load(cli.config.as_deref())?;

    let filter = if cli.extensions.is_empty() {
        config.filter()
    } else {
        FileFilter::new(&cli.extensions)
    };
    let quarantine = cli
        .quarantine
        .clone()
        .unwrap_or_else(|| cli.root.join(&config.quarantine_dir_name));
    let io_threads = cli.io_threads.map_or(config.io_threads, usize::from);

    let mut engine_config = EngineConfig::new(&cli.root, &quarantine, cli.mode)
        .with_filter(filter)
        .with_limit(cli.limit)
        .with_io_threads(io_threads)
        .with_inventory(cli.inventory.as_deref().map(InventorySource::from_arg));

    match signal::install_handler() {
        Ok(handler) => engine_config = engine_config.with_shutdown_flag(handler.flag()),
        Err(e) => log::warn!("{}; Ctrl+C will abort immediately", e),
    }

    let hide_progress = cli.quiet || cli.no_progress || !std::io::stderr().is_terminal();
    if !hide_progress {
        engine_config = engine_config.with_progress_callback(Arc::new(Progress::new(false)));
    }

    let stdout = std::io::stdout();
    let summary = Engine::new(engine_config)
        .run(stdout.lock(), cli.summary_format)
        .with_context(|| format!("{} run on {} failed", cli.mode, cli.root.display()))?;

    let code = if summary.interrupted {
        ExitCode::Interrupted
    } else if summary.has_failures() {
        ExitCode::PartialSuccess
    } else {
        ExitCode::Success
    };
    log::debug!("Exiting with {}", code.code_prefix());
    Ok(code)
}
