use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use engine_logging::LogDestination;
use harvester_core::SiteProfile;
use harvester_engine::{default_max_scrolls, HarvestSettings, DEFAULT_OUTPUT_FILE};
use log::LevelFilter;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RenderEngine {
    /// Plain HTTP fetches; no script runs.
    Http,
    /// Headless Chromium; needs the `browser` feature.
    Chromium,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserConfig {
    pub headless: bool,
    pub executable: Option<PathBuf>,
    pub args: Vec<String>,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            headless: true,
            executable: None,
            args: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LogOutput {
    File,
    Terminal,
    Both,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    pub output: LogOutput,
    pub level: LogLevel,
    pub file: PathBuf,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            output: LogOutput::Terminal,
            level: LogLevel::Info,
            file: PathBuf::from("harvester.log"),
        }
    }
}

impl LogConfig {
    pub fn destination(&self) -> LogDestination {
        match self.output {
            LogOutput::File => LogDestination::File,
            LogOutput::Terminal => LogDestination::Terminal,
            LogOutput::Both => LogDestination::Both,
        }
    }

    pub fn level_filter(&self) -> LevelFilter {
        match self.level {
            LogLevel::Error => LevelFilter::Error,
            LogLevel::Warn => LevelFilter::Warn,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Trace => LevelFilter::Trace,
        }
    }
}

/// Everything the binary can be told from its RON file. Missing fields take
/// their defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub listing_url: String,
    pub profile: SiteProfile,
    pub max_items: usize,
    /// Derived from `max_items` when unset.
    pub max_scrolls: Option<usize>,
    pub settle_ms: u64,
    pub render_timeout_secs: u64,
    pub max_contexts: usize,
    pub run_deadline_secs: Option<u64>,
    pub engine: RenderEngine,
    pub browser: BrowserConfig,
    pub output_dir: PathBuf,
    pub output_file: String,
    pub log: LogConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        let settings = HarvestSettings::default();
        Self {
            listing_url: settings.listing_url,
            profile: settings.profile,
            max_items: settings.max_items,
            max_scrolls: None,
            settle_ms: settings.settle_interval.as_millis() as u64,
            render_timeout_secs: settings.render_timeout.as_secs(),
            max_contexts: settings.max_contexts,
            run_deadline_secs: None,
            engine: RenderEngine::Http,
            browser: BrowserConfig::default(),
            output_dir: PathBuf::from("."),
            output_file: DEFAULT_OUTPUT_FILE.to_string(),
            log: LogConfig::default(),
        }
    }
}

impl AppConfig {
    /// Read `path`, falling back to defaults when the file does not exist.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Ok(Self::default());
            }
            Err(err) => {
                return Err(err).with_context(|| format!("reading config {}", path.display()))
            }
        };
        ron::from_str(&content).with_context(|| format!("parsing config {}", path.display()))
    }

    pub fn to_ron(&self) -> anyhow::Result<String> {
        let pretty = ron::ser::PrettyConfig::new();
        ron::ser::to_string_pretty(self, pretty).context("serializing config")
    }

    pub fn to_settings(&self) -> HarvestSettings {
        HarvestSettings {
            listing_url: self.listing_url.clone(),
            profile: self.profile.clone(),
            max_items: self.max_items,
            max_scrolls: self
                .max_scrolls
                .unwrap_or_else(|| default_max_scrolls(self.max_items)),
            settle_interval: Duration::from_millis(self.settle_ms),
            render_timeout: Duration::from_secs(self.render_timeout_secs),
            max_contexts: self.max_contexts,
            run_deadline: self.run_deadline_secs.map(Duration::from_secs),
        }
    }
}
