use anyhow::Context;
use clap::Args;
use interspy_editor::{Layout, Relevance, SessionConfig};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_CONFIG_NAME: &str = "interspy.config.json";

/// Interspy configuration file format
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Quiet period after an edit before re-evaluating, in milliseconds
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,

    /// How often a pending pass is checked for, in milliseconds
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,

    /// Which bindings are shown next to a line
    #[serde(default)]
    pub relevance: Relevance,

    /// Where annotations are placed
    #[serde(default)]
    pub layout: Layout,
}

fn default_debounce_ms() -> u64 {
    interspy_editor::DEFAULT_DEBOUNCE.as_millis() as u64
}

fn default_tick_interval_ms() -> u64 {
    interspy_editor::DEFAULT_TICK_INTERVAL.as_millis() as u64
}

/// Command line flags that take precedence over the config file
#[derive(Debug, Default, Args)]
pub struct ConfigOverrides {
    /// Quiet period after an edit, in milliseconds
    #[arg(long)]
    pub debounce_ms: Option<u64>,

    /// Tick interval, in milliseconds
    #[arg(long)]
    pub tick_ms: Option<u64>,

    /// Binding relevance (substring, identifier)
    #[arg(long)]
    pub relevance: Option<Relevance>,
}

impl Config {
    /// Load config from a directory
    pub fn load(cwd: &str) -> anyhow::Result<Self> {
        let config_path = PathBuf::from(cwd).join(DEFAULT_CONFIG_NAME);

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let config: Config = serde_json::from_str(&content)
                .with_context(|| format!("Invalid config file {}", config_path.display()))?;
            Ok(config)
        } else {
            // Return default config if none exists
            Ok(Config::default())
        }
    }

    pub fn with_overrides(mut self, overrides: &ConfigOverrides) -> Self {
        if let Some(debounce_ms) = overrides.debounce_ms {
            self.debounce_ms = debounce_ms;
        }
        if let Some(tick_ms) = overrides.tick_ms {
            self.tick_interval_ms = tick_ms;
        }
        if let Some(relevance) = overrides.relevance {
            self.relevance = relevance;
        }
        self
    }

    pub fn session_config(&self) -> anyhow::Result<SessionConfig> {
        let config = SessionConfig {
            debounce: Duration::from_millis(self.debounce_ms),
            tick_interval: Duration::from_millis(self.tick_interval_ms),
            relevance: self.relevance,
            layout: self.layout,
        };
        config.validate()?;
        Ok(config)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            debounce_ms: default_debounce_ms(),
            tick_interval_ms: default_tick_interval_ms(),
            relevance: Relevance::default(),
            layout: Layout::default(),
        }
    }
}
