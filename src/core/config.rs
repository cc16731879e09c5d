//! Configuration for paged-graph
//!
//! Settings come from defaults, then `paged-graph.toml` when present, then
//! `PG_*` environment variables. Every section can be omitted from the file.

use std::env;
use std::path::Path;

use paged_graph_core::constants::DEFAULT_PREFETCH_PAGES;
use paged_graph_core::{log_info, log_warn};
use paged_graph_core::{ByteArray, LocalAllocator, MemoryLayout};
use serde::{Deserialize, Serialize};

use crate::core::error::{Error, Result};

/// File read by [`Config::load`]
pub const CONFIG_FILE: &str = "paged-graph.toml";

const MAX_PREFETCH_PAGES: usize = 1024;

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Memory layout used by every size estimate
    pub memory: MemoryConfig,

    /// Paging behaviour of the growable structures
    pub paging: PagingConfig,

    /// Logging configuration
    pub logging: LoggingConfig,

    /// Metrics configuration
    pub metrics: MetricsConfig,
}

/// Memory layout configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MemoryConfig {
    /// Fixed bytes charged to every array allocation
    pub header_bytes: u64,

    /// Quantum allocation sizes are rounded up to
    pub alignment: u64,

    /// Width of a reference (4 or 8)
    pub reference_bytes: u64,
}

/// Paging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PagingConfig {
    /// Pages a byte store allocator claims per refill
    pub byte_prefetch_pages: usize,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Log format (json, pretty)
    pub format: String,
}

/// Metrics configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    /// Enable Prometheus gauges over allocation trackers
    pub enable_prometheus: bool,

    /// Prefix of every metric name
    pub prefix: String,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        let native = MemoryLayout::native();
        Self {
            header_bytes: native.header_bytes,
            alignment: native.alignment,
            reference_bytes: native.reference_bytes,
        }
    }
}

impl Default for PagingConfig {
    fn default() -> Self {
        Self { byte_prefetch_pages: DEFAULT_PREFETCH_PAGES }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enable_prometheus: true,
            prefix: "pg".to_string(),
        }
    }
}

impl MemoryConfig {
    /// The layout these settings describe
    pub fn layout(&self) -> MemoryLayout {
        MemoryLayout {
            header_bytes: self.header_bytes,
            alignment: self.alignment,
            reference_bytes: self.reference_bytes,
        }
    }
}

impl Config {
    /// Load configuration from the config file and environment variables
    pub fn load() -> Result<Self> {
        let mut config = if Path::new(CONFIG_FILE).exists() {
            Self::from_file(CONFIG_FILE)?
        } else {
            Config::default()
        };

        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;
        let config = toml::from_str(&contents)
            .map_err(|e| Error::config(format!("Failed to parse {}: {}", path.display(), e)))?;
        log_info!(path = %path.display(), "Loaded configuration file");
        Ok(config)
    }

    /// Apply `PG_*` environment variable overrides
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        self.apply_overrides(|key| env::var(key).ok())
    }

    /// Apply overrides looked up by variable name
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(value) = lookup("PG_HEADER_BYTES") {
            self.memory.header_bytes = parse_var("PG_HEADER_BYTES", &value)?;
        }
        if let Some(value) = lookup("PG_ALIGNMENT") {
            self.memory.alignment = parse_var("PG_ALIGNMENT", &value)?;
        }
        if let Some(value) = lookup("PG_REFERENCE_BYTES") {
            self.memory.reference_bytes = parse_var("PG_REFERENCE_BYTES", &value)?;
        }
        if let Some(value) = lookup("PG_PREFETCH_PAGES") {
            self.paging.byte_prefetch_pages = parse_var("PG_PREFETCH_PAGES", &value)?;
        }
        if let Some(level) = lookup("PG_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Some(format) = lookup("PG_LOG_FORMAT") {
            self.logging.format = format;
        }
        Ok(())
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        self.memory.layout().validate()?;

        if self.paging.byte_prefetch_pages == 0 || self.paging.byte_prefetch_pages > MAX_PREFETCH_PAGES {
            return Err(Error::config(format!(
                "byte_prefetch_pages must be in 1..={}, got {}",
                MAX_PREFETCH_PAGES, self.paging.byte_prefetch_pages
            )));
        }

        match self.logging.level.as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            other => return Err(Error::config(format!("Invalid log level: {}", other))),
        }
        match self.logging.format.as_str() {
            "json" | "pretty" => {}
            other => return Err(Error::config(format!("Invalid log format: {}", other))),
        }

        let prefix = &self.metrics.prefix;
        let valid_prefix = prefix.chars().next().is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
            && prefix.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
        if !valid_prefix {
            return Err(Error::config(format!("Invalid metrics prefix: {:?}", prefix)));
        }
        Ok(())
    }

    /// Resolve the process-wide memory layout from these settings
    ///
    /// Must run before the first structure is sized. Installing a different
    /// layout after that fails.
    pub fn install_layout(&self) -> Result<&'static MemoryLayout> {
        Ok(MemoryLayout::install(self.memory.layout())?)
    }

    /// Byte store allocator claiming the configured number of pages per refill
    pub fn byte_allocator<'a>(&self, array: &'a ByteArray) -> LocalAllocator<'a> {
        LocalAllocator::with_prefetch_pages(array, self.paging.byte_prefetch_pages)
    }
}

fn parse_var<T: std::str::FromStr>(name: &str, value: &str) -> Result<T>
where
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e| Error::config(format!("Invalid {}: {}", name, e)))
}

/// Load configuration from `path`, or [`Config::load`] when `None`
///
/// Falls back to defaults and logs a warning when loading fails.
pub fn load_config_or_default(path: Option<&str>) -> Config {
    let loaded = match path {
        Some(path) => Config::from_file(path).and_then(|mut config| {
            config.apply_env_overrides()?;
            config.validate()?;
            Ok(config)
        }),
        None => Config::load(),
    };
    loaded.unwrap_or_else(|e| {
        log_warn!(error = %e, "Falling back to default configuration");
        Config::default()
    })
}
