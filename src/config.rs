//! Scrape configuration: defaults, TOML loading and validation.
//!
//! The config file is looked up in this order:
//! 1. the path given with `--config`
//! 2. `$XDG_CONFIG_HOME/disclosure-scraper/config.toml`
//! 3. `$HOME/.config/disclosure-scraper/config.toml`
//!
//! A missing default file is not an error; a missing explicit file is.

use std::env;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::export::DEFAULT_FILE_PREFIX;
use crate::fetch::FetchConfig;
use crate::render::{DEFAULT_MAX_PAGES, DEFAULT_TABLE_SELECTORS, LoaderConfig};

/// Application directory name under the config home.
const APP_DIR: &str = "disclosure-scraper";

/// Upper bound on the scroll and page-turn pauses.
const MAX_DELAY_SECONDS: f64 = 60.0;

/// Default number of URLs scraped at once.
pub const DEFAULT_CONCURRENCY: usize = 4;

/// Errors produced while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("failed to read config file '{path}': {source}")]
    Read {
        /// Config file path.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// The config file is not valid TOML for [`ScrapeConfig`].
    #[error("failed to parse config file '{path}': {source}")]
    Parse {
        /// Config file path.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: Box<toml::de::Error>,
    },

    /// A value is outside its allowed range.
    #[error("invalid config value for `{field}`: {value}. Expected range: {expected}")]
    OutOfRange {
        /// Field name as written in the file.
        field: &'static str,
        /// Offending value.
        value: String,
        /// Allowed range.
        expected: &'static str,
    },

    /// A value is structurally invalid.
    #[error("invalid config value for `{field}`: {reason}")]
    Invalid {
        /// Field name as written in the file.
        field: &'static str,
        /// What is wrong.
        reason: String,
    },
}

/// Everything a scrape run needs; every component receives a derived slice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScrapeConfig {
    /// Static fetch timeout per request.
    pub timeout_seconds: u64,
    /// Retries after the first attempt on transient failure.
    pub max_retries: u32,
    /// First backoff delay; doubles per retry.
    pub backoff_base_ms: u64,
    /// Run the browser without a window.
    pub headless: bool,
    /// Bound on navigation and each browser call.
    pub page_load_timeout_seconds: u64,
    /// Bound on waiting for a table element.
    pub element_wait_timeout_seconds: u64,
    /// Maximum scroll cycles.
    pub max_scroll_times: u32,
    /// Pause after each scroll; fractional seconds allowed.
    pub scroll_delay_seconds: f64,
    /// Selectors identifying the data table on dynamic pages.
    pub table_selectors: Vec<String>,
    /// Pages of a paginated listing captured per URL, the first included.
    pub max_pages: u32,
    /// Pause after clicking a "next page" control; fractional seconds allowed.
    pub page_turn_delay_seconds: f64,
    /// Directory receiving exported files.
    pub output_dir: PathBuf,
    /// Prefix of exported file names.
    pub file_prefix: String,
    /// Treat validation issues as a failed run.
    pub strict_validation: bool,
    /// URLs scraped at once in a batch.
    pub concurrency: usize,
}

impl Default for ScrapeConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: 30,
            max_retries: 3,
            backoff_base_ms: 1000,
            headless: true,
            page_load_timeout_seconds: 30,
            element_wait_timeout_seconds: 20,
            max_scroll_times: 10,
            scroll_delay_seconds: 2.0,
            table_selectors: DEFAULT_TABLE_SELECTORS
                .iter()
                .map(ToString::to_string)
                .collect(),
            max_pages: DEFAULT_MAX_PAGES,
            page_turn_delay_seconds: 3.0,
            output_dir: PathBuf::from("output"),
            file_prefix: DEFAULT_FILE_PREFIX.to_string(),
            strict_validation: false,
            concurrency: DEFAULT_CONCURRENCY,
        }
    }
}

impl ScrapeConfig {
    /// Parses TOML text; absent keys keep their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed TOML or unknown keys.
    pub fn from_toml_str(raw: &str, origin: &Path) -> Result<Self, ConfigError> {
        toml::from_str(raw).map_err(|e| ConfigError::Parse {
            path: origin.to_path_buf(),
            source: Box::new(e),
        })
    }

    /// Reads and validates a config file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file cannot be read, parsed or validated.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&raw, path)?;
        config.validate()?;
        debug!(path = %path.display(), "config file loaded");
        Ok(config)
    }

    /// Loads `explicit` if given, else the default file if it exists, else defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when a file exists but is invalid, or when
    /// `explicit` cannot be read.
    pub fn resolve(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = explicit {
            return Self::load(path);
        }
        match default_config_path() {
            Some(path) if path.exists() => Self::load(&path),
            _ => Ok(Self::default()),
        }
    }

    /// Checks every range constraint.
    ///
    /// # Errors
    ///
    /// Returns the first violated constraint.
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_range("timeout_seconds", self.timeout_seconds, 1, 3600, "1..=3600")?;
        check_range("max_retries", self.max_retries.into(), 0, 10, "0..=10")?;
        check_range("backoff_base_ms", self.backoff_base_ms, 0, 60_000, "0..=60000")?;
        check_range(
            "page_load_timeout_seconds",
            self.page_load_timeout_seconds,
            1,
            3600,
            "1..=3600",
        )?;
        check_range(
            "element_wait_timeout_seconds",
            self.element_wait_timeout_seconds,
            1,
            3600,
            "1..=3600",
        )?;
        check_range("max_scroll_times", self.max_scroll_times.into(), 0, 100, "0..=100")?;
        check_delay("scroll_delay_seconds", self.scroll_delay_seconds)?;
        check_delay("page_turn_delay_seconds", self.page_turn_delay_seconds)?;
        check_range("max_pages", self.max_pages.into(), 1, 100, "1..=100")?;
        check_range("concurrency", self.concurrency as u64, 1, 16, "1..=16")?;

        if self.table_selectors.iter().all(|s| s.trim().is_empty()) {
            return Err(ConfigError::Invalid {
                field: "table_selectors",
                reason: "at least one non-empty selector is required".to_string(),
            });
        }
        if self.file_prefix.trim().is_empty() || self.file_prefix.contains(['/', '\\']) {
            return Err(ConfigError::Invalid {
                field: "file_prefix",
                reason: format!("{:?} is not a usable file name prefix", self.file_prefix),
            });
        }
        Ok(())
    }

    /// Settings for the static fetcher.
    #[must_use]
    pub fn fetch_config(&self) -> FetchConfig {
        FetchConfig {
            timeout: Duration::from_secs(self.timeout_seconds),
            max_retries: self.max_retries,
            backoff_base: Duration::from_millis(self.backoff_base_ms),
        }
    }

    /// Settings for the dynamic loader.
    #[must_use]
    pub fn loader_config(&self) -> LoaderConfig {
        LoaderConfig {
            headless: self.headless,
            page_load_timeout: Duration::from_secs(self.page_load_timeout_seconds),
            element_wait_timeout: Duration::from_secs(self.element_wait_timeout_seconds),
            max_scroll_times: self.max_scroll_times,
            scroll_delay: Duration::from_secs_f64(self.scroll_delay_seconds),
            max_pages: self.max_pages,
            page_turn_delay: Duration::from_secs_f64(self.page_turn_delay_seconds),
            table_selectors: self
                .table_selectors
                .iter()
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
            ..LoaderConfig::default()
        }
    }
}

/// Accepts `0.0..=60.0`; NaN fails the range check.
fn check_delay(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if (0.0..=MAX_DELAY_SECONDS).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::OutOfRange {
            field,
            value: value.to_string(),
            expected: "0.0..=60.0",
        })
    }
}

fn check_range(
    field: &'static str,
    value: u64,
    min: u64,
    max: u64,
    expected: &'static str,
) -> Result<(), ConfigError> {
    if (min..=max).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::OutOfRange {
            field,
            value: value.to_string(),
            expected,
        })
    }
}

/// Resolves the default config path.
///
/// Priority:
/// 1. `$XDG_CONFIG_HOME/disclosure-scraper/config.toml`
/// 2. `$HOME/.config/disclosure-scraper/config.toml`
#[must_use]
pub fn default_config_path() -> Option<PathBuf> {
    config_path_from(env_var_non_empty("XDG_CONFIG_HOME"), env_var_non_empty("HOME"))
}

fn config_path_from(xdg_config_home: Option<OsString>, home: Option<OsString>) -> Option<PathBuf> {
    if let Some(xdg) = xdg_config_home {
        return Some(PathBuf::from(xdg).join(APP_DIR).join("config.toml"));
    }
    let home = home?;
    Some(
        PathBuf::from(home)
            .join(".config")
            .join(APP_DIR)
            .join("config.toml"),
    )
}

fn env_var_non_empty(name: &str) -> Option<OsString> {
    env::var_os(name).filter(|v| !v.is_empty())
}
