//! Configuration management with TOML, environment variables, and CLI overrides.

use crate::browser::LaunchOptions;
use crate::justwatch::selectors::BASE_URL;
use crate::justwatch::{Country, SessionOptions, Timeouts};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

/// Application configuration with layered loading.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Country whose offers are looked up
    #[serde(default)]
    pub country: Country,

    /// JustWatch root URL
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Firefox executable
    #[serde(default)]
    pub browser_binary: Option<PathBuf>,

    /// geckodriver executable, spawned on `driver_port` when set
    #[serde(default)]
    pub driver_path: Option<PathBuf>,

    /// Port for a spawned driver
    #[serde(default = "default_driver_port")]
    pub driver_port: u16,

    /// WebDriver endpoint used when no driver is spawned
    #[serde(default = "default_webdriver_url")]
    pub webdriver_url: String,

    /// Run the browser without a window
    #[serde(default = "default_headless")]
    pub headless: bool,

    /// Default wait for page elements, in seconds
    #[serde(default = "default_wait_secs")]
    pub implicit_wait_secs: u64,

    /// Wait for the cookie consent overlay, in seconds
    #[serde(default = "default_wait_secs")]
    pub consent_wait_secs: u64,

    /// Wait for the first search result, in seconds
    #[serde(default = "default_wait_secs")]
    pub results_wait_secs: u64,

    /// Wait for the home page during startup, in seconds; 0 means no bound
    #[serde(default = "default_page_load_secs")]
    pub page_load_secs: u64,

    /// Address the HTTP server binds to
    #[serde(default = "default_bind")]
    pub bind: String,

    /// Output format for CLI commands
    #[serde(default)]
    pub format: OutputFormat,
}

fn default_base_url() -> String {
    BASE_URL.to_string()
}

fn default_driver_port() -> u16 {
    4444
}

fn default_webdriver_url() -> String {
    "http://localhost:4444".to_string()
}

fn default_headless() -> bool {
    true
}

fn default_wait_secs() -> u64 {
    10
}

fn default_page_load_secs() -> u64 {
    30
}

fn default_bind() -> String {
    "0.0.0.0:8000".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            country: Country::default(),
            base_url: default_base_url(),
            browser_binary: None,
            driver_path: None,
            driver_port: default_driver_port(),
            webdriver_url: default_webdriver_url(),
            headless: default_headless(),
            implicit_wait_secs: default_wait_secs(),
            consent_wait_secs: default_wait_secs(),
            results_wait_secs: default_wait_secs(),
            page_load_secs: default_page_load_secs(),
            bind: default_bind(),
            format: OutputFormat::Table,
        }
    }
}

impl Config {
    /// Creates a new default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        debug!("Loading config from: {}", path.display());

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Loads configuration with fallback to default locations.
    pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
        // 1. Explicit path takes precedence
        if let Some(path) = explicit_path {
            return Self::from_file(path);
        }

        // 2. Try current directory
        let local_config = Path::new("config.toml");
        if local_config.exists() {
            debug!("Found config.toml in current directory");
            return Self::from_file(local_config);
        }

        // 3. Try XDG config directory
        if let Some(config_dir) = dirs::config_dir() {
            let xdg_config = config_dir.join("streamfinder").join("config.toml");
            if xdg_config.exists() {
                debug!("Found config in XDG config directory");
                return Self::from_file(xdg_config);
            }
        }

        // 4. Return default config
        debug!("No config file found, using defaults");
        Ok(Self::default())
    }

    /// Applies environment variable overrides. Unparseable values are ignored.
    pub fn with_env(mut self) -> Self {
        if let Ok(country) = std::env::var("COUNTRY") {
            if let Ok(c) = country.parse() {
                self.country = c;
            }
        }

        if let Ok(url) = std::env::var("JUSTWATCH_URL") {
            self.base_url = url;
        }

        if let Ok(bin) = std::env::var("FIREFOX_BIN") {
            self.browser_binary = Some(PathBuf::from(bin));
        }

        if let Ok(driver) = std::env::var("FIREFOX_DRIVER") {
            self.driver_path = Some(PathBuf::from(driver));
        }

        if let Ok(url) = std::env::var("WEBDRIVER_URL") {
            self.webdriver_url = url;
        }

        if let Ok(bind) = std::env::var("BIND_ADDR") {
            self.bind = bind;
        }

        self
    }

    /// Options for starting the browser.
    pub fn launch_options(&self) -> LaunchOptions {
        LaunchOptions {
            browser_binary: self.browser_binary.clone(),
            driver_path: self.driver_path.clone(),
            driver_port: self.driver_port,
            webdriver_url: self.webdriver_url.clone(),
            headless: self.headless,
        }
    }

    /// Options for a session on top of the browser.
    pub fn session_options(&self) -> SessionOptions {
        SessionOptions {
            country: self.country.clone(),
            base_url: self.base_url.clone(),
            timeouts: Timeouts {
                implicit: Duration::from_secs(self.implicit_wait_secs),
                consent: Duration::from_secs(self.consent_wait_secs),
                results: Duration::from_secs(self.results_wait_secs),
                page_load: Duration::from_secs(self.page_load_secs),
            },
        }
    }
}

/// Output format for results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
    Markdown,
    Csv,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "table" => Ok(OutputFormat::Table),
            "json" => Ok(OutputFormat::Json),
            "markdown" | "md" => Ok(OutputFormat::Markdown),
            "csv" => Ok(OutputFormat::Csv),
            _ => Err(format!("Unknown format: {}. Use: table, json, markdown, csv", s)),
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Table => write!(f, "table"),
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Markdown => write!(f, "markdown"),
            OutputFormat::Csv => write!(f, "csv"),
        }
    }
}
