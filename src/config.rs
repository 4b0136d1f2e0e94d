//! Configuration management for the Reminder API
//!
//! Loads settings from TOML file at ~/.reminder-api/config.toml

use crate::error::{CoreError, Result};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Reminder behavior
    #[serde(default)]
    pub reminders: RemindersConfig,
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Server port (default: 3000)
    #[serde(default = "default_port")]
    pub port: u16,

    /// Server host (default: 127.0.0.1 - localhost only)
    #[serde(default = "default_host")]
    pub host: String,
}

fn default_port() -> u16 {
    3000
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            port: default_port(),
            host: default_host(),
        }
    }
}

/// Reminder behavior configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RemindersConfig {
    /// Calendar used to decide what "due today" means
    #[serde(default)]
    pub timezone: Timezone,
}

/// Which clock decides today's date for the due-today view
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Timezone {
    #[default]
    Utc,
    /// The server machine's local timezone
    Local,
}

impl Timezone {
    /// Today's date as `YYYY-MM-DD`
    pub fn today(self) -> String {
        let date = match self {
            Timezone::Utc => chrono::Utc::now().date_naive(),
            Timezone::Local => chrono::Local::now().date_naive(),
        };
        date.format("%Y-%m-%d").to_string()
    }
}

impl FromStr for Timezone {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "utc" => Ok(Timezone::Utc),
            "local" => Ok(Timezone::Local),
            other => Err(CoreError::Config(format!(
                "Unknown timezone '{}', expected \"utc\" or \"local\"",
                other
            ))),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let expanded_path = expand_path(path.as_ref());

        if !expanded_path.exists() {
            return Err(CoreError::Config(format!(
                "Configuration file not found: {}",
                expanded_path.display()
            )));
        }

        let content = std::fs::read_to_string(&expanded_path)?;
        let config: Config = toml::from_str(&content)?;

        Ok(config)
    }

    /// Get the server socket address
    pub fn server_addr(&self) -> SocketAddr {
        use std::net::ToSocketAddrs;

        format!("{}:{}", self.server.host, self.server.port)
            .to_socket_addrs()
            .ok()
            .and_then(|mut addrs| addrs.next())
            .unwrap_or_else(|| SocketAddr::from(([127, 0, 0, 1], self.server.port)))
    }

    /// Apply environment variable overrides
    pub fn apply_env_overrides(&mut self) {
        if let Ok(host) = std::env::var("REMINDER_API_SERVER_HOST") {
            self.server.host = host;
        }
        if let Ok(port) = std::env::var("REMINDER_API_SERVER_PORT") {
            match port.parse() {
                Ok(port) => self.server.port = port,
                Err(_) => tracing::warn!("Ignoring invalid REMINDER_API_SERVER_PORT: {}", port),
            }
        }
        if let Ok(tz) = std::env::var("REMINDER_API_TIMEZONE") {
            match tz.parse() {
                Ok(tz) => self.reminders.timezone = tz,
                Err(e) => tracing::warn!("Ignoring REMINDER_API_TIMEZONE: {}", e),
            }
        }
    }

    /// Create a default configuration file at the given path
    pub fn create_default<P: AsRef<Path>>(path: P) -> Result<()> {
        let content = r#"# Reminder API Configuration

[server]
# Port to listen on (default: 3000)
port = 3000

# Host to bind to
# "127.0.0.1" = localhost only
# "0.0.0.0" = all interfaces
host = "127.0.0.1"

[reminders]
# Which calendar decides "today" for GET /reminders/due-today
# "utc" (default) or "local" (the server machine's timezone)
timezone = "utc"
"#;

        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content)?;

        Ok(())
    }
}

/// Expand ~ to home directory in paths
pub fn expand_path(path: &Path) -> PathBuf {
    if let Ok(rest) = path.strip_prefix("~") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    path.to_path_buf()
}
