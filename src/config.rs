//! flowscope configuration
//!
//! Config is stored in `~/.config/flowscope/config.toml`.
//!
//! ## Priority Order (highest to lowest)
//!
//! 1. Command-line flags
//! 2. Environment variables (`FLOWSCOPE_EVENT_LOG`, `FLOWSCOPE_PROGRAMS`, `FLOWSCOPE_SCHEDULER`)
//! 3. Config file
//! 4. Defaults

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Result, ScopeError};
use crate::program::DEFAULT_MAX_DEPTH;

pub const ENV_EVENT_LOG: &str = "FLOWSCOPE_EVENT_LOG";
pub const ENV_PROGRAMS: &str = "FLOWSCOPE_PROGRAMS";
pub const ENV_SCHEDULER: &str = "FLOWSCOPE_SCHEDULER";

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ScopeConfig {
    /// Where the observed engine keeps its state
    #[serde(default)]
    pub sources: Sources,

    /// Presentation knobs
    #[serde(default)]
    pub view: ViewConfig,
}

/// Backend locations
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Sources {
    /// JSONL event log
    pub event_log: Option<PathBuf>,

    /// Directory of program definitions
    pub programs: Option<PathBuf>,

    /// Scheduler snapshot (JSON object)
    pub scheduler: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ViewConfig {
    /// Events per page when browsing
    #[serde(default = "default_page_size")]
    pub page_size: usize,

    /// Trailing window for the recent-events view
    #[serde(default = "default_recent")]
    pub recent: usize,

    /// Depth budget for program walks
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,
}

fn default_page_size() -> usize {
    20
}

fn default_recent() -> usize {
    50
}

fn default_max_depth() -> usize {
    DEFAULT_MAX_DEPTH
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
            recent: default_recent(),
            max_depth: default_max_depth(),
        }
    }
}

impl ScopeConfig {
    /// Get the config directory path
    ///
    /// Returns `~/.config/flowscope/` on Unix, `%APPDATA%/flowscope/` on Windows
    pub fn config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("flowscope")
    }

    /// Get the config file path
    pub fn config_path() -> PathBuf {
        Self::config_dir().join("config.toml")
    }

    /// Load configuration from the default location
    ///
    /// Returns default config if file doesn't exist.
    pub fn load() -> Result<Self> {
        let path = Self::config_path();
        if !path.exists() {
            return Ok(Self::default());
        }
        Self::load_from(&path)
    }

    /// Load configuration from an explicit file (must exist)
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| ScopeError::Config {
            reason: format!("Failed to read config file {}: {}", path.display(), e),
        })?;

        toml::from_str(&content).map_err(|e| ScopeError::Config {
            reason: format!("Failed to parse config file {}: {}", path.display(), e),
        })
    }

    /// Merge with environment variables
    pub fn with_env(self) -> Self {
        self.with_vars(|name| std::env::var(name).ok())
    }

    /// Merge with variables from `lookup` (empty values are ignored)
    pub fn with_vars<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|v| !v.is_empty()).map(PathBuf::from);

        if let Some(path) = var(ENV_EVENT_LOG) {
            self.sources.event_log = Some(path);
        }
        if let Some(path) = var(ENV_PROGRAMS) {
            self.sources.programs = Some(path);
        }
        if let Some(path) = var(ENV_SCHEDULER) {
            self.sources.scheduler = Some(path);
        }

        self
    }
}
