use anyhow::Result;
use clap::Parser;
use log::info;
use std::path::PathBuf;

use crate::config::ConfigStore;
use crate::tui::{self, app::App};

#[derive(Parser)]
#[command(name = "mrlens")]
#[command(author, version, about = "Terminal dashboard for GitLab merge requests", long_about = None)]
pub struct Cli {
    /// Path to the configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// GitLab instance base URL
    #[arg(short, long, env = "GITLAB_URL")]
    pub url: Option<String>,

    /// Write logs to this file instead of the default cache location
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

impl Cli {
    pub async fn execute(&self) -> Result<()> {
        let mut store = ConfigStore::open(self.config.as_deref())?;

        if let Some(url) = &self.url {
            store.settings.base_url = url.clone();
        }

        info!("Using config file: {}", store.path().display());

        let app = App::new(store)?;
        tui::run(app).await?;

        Ok(())
    }
}
