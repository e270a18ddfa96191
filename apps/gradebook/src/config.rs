//! # Configuration
//!
//! Layered application settings, lowest to highest precedence:
//!
//! 1. Built-in defaults
//! 2. TOML file (`--config <file>`, or `gradebook.toml` if present)
//! 3. Environment variables (`GRADEBOOK_*`)
//! 4. CLI flags (applied by the `cli` module)
//!
//! ## Environment Variables
//!
//! - `GRADEBOOK_HOST`, `GRADEBOOK_PORT`: bind address
//! - `GRADEBOOK_DATABASE`: path of the redb file
//! - `GRADEBOOK_BACKEND`: `redb` or `memory`
//! - `GRADEBOOK_RATE_LIMIT`: requests per second, 0 disables
//! - `GRADEBOOK_CORS_ORIGINS`: comma-separated origins, or `*`
//! - `GRADEBOOK_SOURCE_DIR`: directory served by `/download_source`

use crate::api::ServerSettings;
use gradebook_core::GradebookError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Config file picked up from the working directory when `--config` is absent.
pub const DEFAULT_CONFIG_FILE: &str = "gradebook.toml";

/// Storage backend selection.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// Single-file redb database (persistent).
    #[default]
    Redb,
    /// In-memory roster (lost on exit).
    Memory,
}

impl Backend {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Redb => "redb",
            Self::Memory => "memory",
        }
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Backend {
    type Err = GradebookError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "redb" => Ok(Self::Redb),
            "memory" => Ok(Self::Memory),
            other => Err(GradebookError::InvalidField(format!(
                "unknown backend '{}' (expected redb or memory)",
                other
            ))),
        }
    }
}

/// Resolved application configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub database: PathBuf,
    pub backend: Backend,
    /// Requests per second; 0 disables rate limiting.
    pub rate_limit: u32,
    /// `None` keeps the localhost-only CORS default.
    pub cors_origins: Option<String>,
    pub source_dir: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            database: PathBuf::from("gradebook.db"),
            backend: Backend::Redb,
            rate_limit: 100,
            cors_origins: None,
            source_dir: PathBuf::from("."),
        }
    }
}

impl Config {
    /// Load defaults, then the config file, then the process environment.
    ///
    /// An explicit `path` must exist; the implicit `gradebook.toml` is
    /// optional.
    pub fn load(path: Option<&Path>) -> Result<Self, GradebookError> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => {
                let implicit = Path::new(DEFAULT_CONFIG_FILE);
                if implicit.is_file() {
                    Self::from_file(implicit)?
                } else {
                    Self::default()
                }
            }
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Parse a TOML config file. Missing keys keep their defaults.
    pub fn from_file(path: &Path) -> Result<Self, GradebookError> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            GradebookError::IoError(format!("Cannot read config '{}': {}", path.display(), e))
        })?;
        tracing::debug!("Loaded config from {}", path.display());
        Self::from_toml_str(&text)
    }

    pub fn from_toml_str(text: &str) -> Result<Self, GradebookError> {
        toml::from_str(text)
            .map_err(|e| GradebookError::InvalidField(format!("Invalid config: {}", e)))
    }

    /// Overlay `GRADEBOOK_*` variables read through `lookup`.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), GradebookError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = lookup("GRADEBOOK_HOST") {
            self.host = host;
        }
        if let Some(port) = lookup("GRADEBOOK_PORT") {
            self.port = parse_number(&port, "GRADEBOOK_PORT")?;
        }
        if let Some(database) = lookup("GRADEBOOK_DATABASE") {
            self.database = PathBuf::from(database);
        }
        if let Some(backend) = lookup("GRADEBOOK_BACKEND") {
            self.backend = backend.parse()?;
        }
        if let Some(rate) = lookup("GRADEBOOK_RATE_LIMIT") {
            self.rate_limit = parse_number(&rate, "GRADEBOOK_RATE_LIMIT")?;
        }
        if let Some(origins) = lookup("GRADEBOOK_CORS_ORIGINS") {
            self.cors_origins = Some(origins);
        }
        if let Some(dir) = lookup("GRADEBOOK_SOURCE_DIR") {
            self.source_dir = PathBuf::from(dir);
        }
        Ok(())
    }

    /// `host:port` for the listener.
    #[must_use]
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// The subset of settings the HTTP layer needs.
    #[must_use]
    pub fn server_settings(&self) -> ServerSettings {
        ServerSettings {
            source_dir: self.source_dir.clone(),
            rate_limit: self.rate_limit,
            cors_origins: self.cors_origins.clone(),
        }
    }
}

fn parse_number<T: FromStr>(value: &str, key: &str) -> Result<T, GradebookError> {
    value
        .trim()
        .parse()
        .map_err(|_| GradebookError::InvalidField(format!("{} must be a number, got '{}'", key, value)))
}
