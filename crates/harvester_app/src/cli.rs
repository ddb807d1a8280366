use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

use crate::config::{AppConfig, RenderEngine};

/// Harvest FAQ entries from a listing page and its detail pages.
#[derive(Debug, Parser)]
#[command(name = "harvester", version)]
pub struct Cli {
    /// RON configuration file. Built-in defaults are used when it is missing.
    #[arg(long, global = true, default_value = "harvester.ron")]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Scan the listing, fetch every detail page and write the JSON file.
    Harvest(HarvestArgs),
    /// Print the effective configuration as RON.
    Config(HarvestArgs),
}

/// Overrides applied on top of the configuration file.
#[derive(Debug, Clone, Default, clap::Args)]
pub struct HarvestArgs {
    /// Listing page to scan.
    #[arg(long)]
    pub listing_url: Option<String>,

    /// Maximum number of records to harvest.
    #[arg(long)]
    pub max_items: Option<usize>,

    /// Upper bound on scroll cycles.
    #[arg(long)]
    pub max_scrolls: Option<usize>,

    /// Detail pages rendered at the same time.
    #[arg(long)]
    pub max_contexts: Option<usize>,

    /// Give up on unfinished detail pages after this many seconds.
    #[arg(long)]
    pub deadline_secs: Option<u64>,

    #[arg(long, value_enum)]
    pub engine: Option<EngineArg>,

    /// Directory the JSON file is written to.
    #[arg(long)]
    pub output_dir: Option<PathBuf>,

    /// Run the browser with a visible window.
    #[arg(long)]
    pub headed: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum EngineArg {
    Http,
    Chromium,
}

impl HarvestArgs {
    pub fn apply(&self, config: &mut AppConfig) {
        if let Some(url) = &self.listing_url {
            config.listing_url = url.clone();
        }
        if let Some(max_items) = self.max_items {
            config.max_items = max_items;
        }
        if let Some(max_scrolls) = self.max_scrolls {
            config.max_scrolls = Some(max_scrolls);
        }
        if let Some(max_contexts) = self.max_contexts {
            config.max_contexts = max_contexts;
        }
        if let Some(secs) = self.deadline_secs {
            config.run_deadline_secs = Some(secs);
        }
        if let Some(engine) = self.engine {
            config.engine = match engine {
                EngineArg::Http => RenderEngine::Http,
                EngineArg::Chromium => RenderEngine::Chromium,
            };
        }
        if let Some(dir) = &self.output_dir {
            config.output_dir = dir.clone();
        }
        if self.headed {
            config.browser.headless = false;
        }
    }
}
