//! Configuration loading and root folder resolution
//!
//! Bootstrap configuration follows a fixed priority order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable
//! 3. TOML config file
//! 4. OS-dependent compiled default (fallback)
//!
//! A missing or unreadable TOML file is never fatal: a warning is logged and
//! the compiled defaults are used.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Environment variable overriding the root folder
pub const ENV_ROOT_FOLDER: &str = "BOOKCLUB_ROOT_FOLDER";

/// Environment variable overriding the HTTP port
pub const ENV_PORT: &str = "BOOKCLUB_PORT";

/// Database file name inside the root folder
pub const DATABASE_FILE_NAME: &str = "bookclub.db";

/// Compiled-in defaults for the current platform
#[derive(Debug, Clone)]
pub struct CompiledDefaults {
    pub root_folder: PathBuf,
    pub port: u16,
    pub log_level: String,
    pub log_file: Option<PathBuf>,
}

impl CompiledDefaults {
    pub fn for_current_platform() -> Self {
        Self {
            root_folder: default_root_folder(),
            port: 5730,
            log_level: "info".to_string(),
            log_file: None,
        }
    }
}

/// Bootstrap configuration loaded from TOML file
///
/// These settings cannot change during runtime. The service must restart to
/// pick up changes to the file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TomlConfig {
    /// Root folder holding the database (optional)
    #[serde(default)]
    pub root_folder: Option<PathBuf>,

    /// HTTP server port (optional)
    #[serde(default)]
    pub port: Option<u16>,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Text generation service settings
    #[serde(default)]
    pub openai: OpenAiConfig,

    /// Bibliographic search service settings
    #[serde(default)]
    pub naver: NaverConfig,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log file path (optional, logs to stderr if not specified)
    #[serde(default)]
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: None,
        }
    }
}

/// Chat completion API settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenAiConfig {
    #[serde(default)]
    pub api_key: Option<String>,

    #[serde(default = "default_openai_model")]
    pub model: String,

    #[serde(default = "default_openai_base_url")]
    pub base_url: String,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: default_openai_model(),
            base_url: default_openai_base_url(),
        }
    }
}

/// Book search API settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NaverConfig {
    #[serde(default)]
    pub client_id: Option<String>,

    #[serde(default)]
    pub client_secret: Option<String>,

    #[serde(default = "default_naver_base_url")]
    pub base_url: String,
}

impl Default for NaverConfig {
    fn default() -> Self {
        Self {
            client_id: None,
            client_secret: None,
            base_url: default_naver_base_url(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_openai_model() -> String {
    "gpt-3.5-turbo".to_string()
}

fn default_openai_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_naver_base_url() -> String {
    "https://openapi.naver.com".to_string()
}

/// Default per-module TOML path: `<config_dir>/bookclub/<module>.toml`
pub fn default_config_path(module_name: &str) -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("bookclub").join(format!("{}.toml", module_name)))
}

/// Load and parse a TOML config file
pub fn load_toml_config(path: &Path) -> Result<TomlConfig> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Read {} failed: {}", path.display(), e)))?;
    toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Parse {} failed: {}", path.display(), e)))
}

/// Load the TOML config, falling back to defaults when absent or invalid
///
/// An explicit path that does not exist is reported with a warning. The
/// default path silently falling through to defaults is the normal first-run case.
pub fn load_toml_config_or_default(explicit: Option<&Path>, module_name: &str) -> TomlConfig {
    let path = match explicit {
        Some(p) => p.to_path_buf(),
        None => match default_config_path(module_name) {
            Some(p) if p.exists() => p,
            _ => {
                info!("No config file for {}, using compiled defaults", module_name);
                return TomlConfig::default();
            }
        },
    };

    match load_toml_config(&path) {
        Ok(config) => {
            info!("Loaded config: {}", path.display());
            config
        }
        Err(e) => {
            warn!("{} - using compiled defaults", e);
            TomlConfig::default()
        }
    }
}

/// Root folder resolution (CLI → ENV → TOML → compiled default)
#[derive(Debug, Clone)]
pub struct RootFolderResolver {
    module_name: String,
    cli_override: Option<PathBuf>,
    toml_value: Option<PathBuf>,
}

impl RootFolderResolver {
    pub fn new(module_name: impl Into<String>) -> Self {
        Self {
            module_name: module_name.into(),
            cli_override: None,
            toml_value: None,
        }
    }

    /// Command-line value (highest priority)
    pub fn with_cli_override(mut self, path: Option<PathBuf>) -> Self {
        self.cli_override = path;
        self
    }

    /// Value read from the module's TOML file
    pub fn with_toml_value(mut self, path: Option<PathBuf>) -> Self {
        self.toml_value = path;
        self
    }

    pub fn resolve(&self) -> PathBuf {
        if let Some(path) = &self.cli_override {
            info!("{}: root folder from command line", self.module_name);
            return path.clone();
        }

        if let Ok(path) = std::env::var(ENV_ROOT_FOLDER) {
            if !path.trim().is_empty() {
                info!("{}: root folder from {}", self.module_name, ENV_ROOT_FOLDER);
                return PathBuf::from(path);
            }
        }

        if let Some(path) = &self.toml_value {
            info!("{}: root folder from TOML config", self.module_name);
            return path.clone();
        }

        CompiledDefaults::for_current_platform().root_folder
    }
}

/// Creates the root folder and locates the database inside it
#[derive(Debug, Clone)]
pub struct RootFolderInitializer {
    root_folder: PathBuf,
}

impl RootFolderInitializer {
    pub fn new(root_folder: PathBuf) -> Self {
        Self { root_folder }
    }

    /// Create the root folder if missing (idempotent)
    pub fn ensure_directory_exists(&self) -> Result<()> {
        if !self.root_folder.exists() {
            std::fs::create_dir_all(&self.root_folder)?;
            info!("Created root folder: {}", self.root_folder.display());
        }
        Ok(())
    }

    pub fn database_path(&self) -> PathBuf {
        self.root_folder.join(DATABASE_FILE_NAME)
    }

    pub fn database_exists(&self) -> bool {
        self.database_path().exists()
    }
}

/// Resolve the HTTP port (CLI → ENV → TOML → compiled default)
pub fn resolve_port(cli: Option<u16>, toml_config: &TomlConfig) -> u16 {
    if let Some(port) = cli {
        return port;
    }

    if let Ok(value) = std::env::var(ENV_PORT) {
        match value.parse::<u16>() {
            Ok(port) => return port,
            Err(_) => warn!("Ignoring invalid {}={}", ENV_PORT, value),
        }
    }

    toml_config
        .port
        .unwrap_or_else(|| CompiledDefaults::for_current_platform().port)
}

/// Get OS-dependent default root folder path
fn default_root_folder() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("bookclub"))
        .unwrap_or_else(|| PathBuf::from("./bookclub_data"))
}
