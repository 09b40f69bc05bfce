//! Bootstrap configuration loading
//!
//! Settings sources, highest priority first:
//! 1. Command-line arguments (applied by the binary)
//! 2. Environment variables
//! 3. TOML configuration file
//! 4. Built-in defaults (code constants)
//!
//! A missing TOML file is not fatal: a warning is logged and defaults are
//! used. A TOML file that exists but cannot be parsed is an error.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Environment variable naming an explicit config file
pub const CONFIG_PATH_ENV: &str = "FORENSICS_WORKER_CONFIG";

/// Directory name under the platform config dir
const CONFIG_DIR_NAME: &str = "forensics-worker";

/// Default number of EM iterations
pub const DEFAULT_EM_ITERATIONS: usize = 80;

/// Default cap on distinct sources x distinct signal types per request
pub const DEFAULT_MAX_CELLS: usize = 250_000;

/// Bootstrap configuration loaded from TOML file
///
/// These settings cannot change during runtime.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct TomlConfig {
    /// Bind address
    pub host: String,

    /// HTTP server port
    pub port: u16,

    /// Maximum accepted request body in bytes
    pub max_body_bytes: usize,

    /// Maximum number of signals accepted in one fuse request
    pub max_signals: usize,

    /// Maximum distinct sources times distinct signal types in one request
    ///
    /// Fusion cost grows with this product, not with the raw signal count.
    pub max_cells: usize,

    /// Fixed EM iteration count
    pub em_iterations: usize,

    pub logging: LoggingConfig,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error); RUST_LOG takes precedence
    pub level: String,
}

impl Default for TomlConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            max_body_bytes: 16 * 1024 * 1024,
            max_signals: 250_000,
            max_cells: DEFAULT_MAX_CELLS,
            em_iterations: DEFAULT_EM_ITERATIONS,
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl TomlConfig {
    /// Reject values the service cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.em_iterations == 0 {
            return Err(Error::Config("em_iterations must be at least 1".to_string()));
        }
        if self.max_signals == 0 {
            return Err(Error::Config("max_signals must be at least 1".to_string()));
        }
        if self.max_cells == 0 {
            return Err(Error::Config("max_cells must be at least 1".to_string()));
        }
        if self.max_body_bytes == 0 {
            return Err(Error::Config("max_body_bytes must be at least 1".to_string()));
        }
        Ok(())
    }

    /// Socket address string for the listener
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Platform default config file: `<config_dir>/forensics-worker/config.toml`
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join(CONFIG_DIR_NAME).join("config.toml"))
}

/// Parse a TOML config file
pub fn load_toml_config(path: &Path) -> Result<TomlConfig> {
    let content = std::fs::read_to_string(path)?;
    let config: TomlConfig = toml::from_str(&content)?;
    config.validate()?;
    Ok(config)
}

/// Resolve the bootstrap config following the priority order above
///
/// `cli_path` is the `--config` argument, if given.
pub fn resolve_config(cli_path: Option<&Path>) -> Result<TomlConfig> {
    let env_path = std::env::var(CONFIG_PATH_ENV).ok().map(PathBuf::from);

    let explicit = cli_path.map(Path::to_path_buf).or(env_path);

    let path = match explicit {
        Some(path) => path,
        None => match default_config_path() {
            Some(path) if path.exists() => path,
            _ => {
                info!("No config file found, using built-in defaults");
                return Ok(TomlConfig::default());
            }
        },
    };

    if !path.exists() {
        warn!(
            "Config file {} not found, using built-in defaults",
            path.display()
        );
        return Ok(TomlConfig::default());
    }

    let config = load_toml_config(&path)?;
    info!("Loaded config from {}", path.display());
    Ok(config)
}
