mod auth;
mod cli;
mod config;
mod error;
mod gitlab;
mod query;
mod status;
mod tui;

use std::fs::File;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use cli::Cli;
use log::info;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.log_file.as_deref())?;

    info!("Starting mrlens - merge request dashboard");
    cli.execute().await?;

    Ok(())
}

/// Route logs to a file: the TUI owns the terminal, so stderr would tear
/// the display. Level comes from `RUST_LOG` as usual.
fn init_logging(path: Option<&Path>) -> Result<()> {
    let path = match path {
        Some(path) => path.to_owned(),
        None => default_log_path(),
    };

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create log dir: {}", parent.display()))?;
    }

    let file = File::create(&path)
        .with_context(|| format!("Failed to create log file: {}", path.display()))?;

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Pipe(Box::new(file)))
        .init();

    Ok(())
}

fn default_log_path() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("mrlens")
        .join("mrlens.log")
}
