mod bootstrap;
mod config;
mod error;
mod field;
mod graphics;
mod hue;
mod math;
mod page;
mod particle;
mod reveal;
mod scheduler;
mod screen;
mod state;
mod storage;
mod terminal;
mod theme;
mod tilt;

use anyhow::Context;
use clap::Parser;
use config::Args;
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use storage::{FileStore, MemoryStore};

/// Logs go to a file since the terminal is being drawn on
fn init_logging(path: &Path) -> anyhow::Result<()> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("cannot open log file {}", path.display()))?;
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Pipe(Box::new(file)))
        .init();
    Ok(())
}

fn default_log_path() -> PathBuf {
    std::env::temp_dir().join("tunnel3d.log")
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let log_path = args.log_file.clone().unwrap_or_else(default_log_path);
    init_logging(&log_path)?;
    log::info!("tunnel3d {} starting", env!("CARGO_PKG_VERSION"));

    // Preferences persist to disk when the file can be read
    let store_path = args.store.clone().unwrap_or_else(FileStore::default_path);
    match FileStore::open(store_path.clone()) {
        Ok(store) => {
            log::info!("preferences at {}", store.path().display());
            terminal::run(&args, store)
        }
        Err(err) => {
            log::warn!(
                "preferences at {} unavailable ({}), keeping them in memory",
                store_path.display(),
                err
            );
            terminal::run(&args, MemoryStore::default())
        }
    }
    .context("terminal session failed")
}
