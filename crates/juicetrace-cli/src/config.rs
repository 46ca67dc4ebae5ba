//! Configuration for the Juice Trace service.
//!
//! Provides the [`TraceConfig`] struct that loads from TOML files,
//! environment variables, and defaults using the `confyg` crate.
//!
//! # Loading Priority
//!
//! 1. Explicit `--config <path>` flag
//! 2. `JUICETRACE_CONFIG` environment variable
//! 3. XDG default: `~/.config/juicetrace/config.toml`
//! 4. Built-in defaults
//!
//! `JUICETRACE_<SECTION>_<KEY>` variables are layered over the file, and
//! `PORT` overrides `server.port` last.

use confyg::{Confygery, env};
use juicetrace_core::{Error, Result};
use juicetrace_storage::StoreOptions;
use serde::{Deserialize, Deserializer, Serialize, de};
use std::fmt::Display;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// Environment variable prefix.
pub const ENV_PREFIX: &str = "JUICETRACE";

/// Hosting platforms inject the listen port here.
pub const PORT_ENV: &str = "PORT";

// ============================================================================
// Configuration structs
// ============================================================================

/// Main configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TraceConfig {
    /// Project name, used for env var prefixes and default paths.
    pub project_name: String,

    /// HTTP server configuration.
    pub server: ServerConfig,

    /// Database configuration.
    pub database: DatabaseConfig,
}

/// HTTP server configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host address to bind to.
    pub host: String,

    /// Port to listen on.
    #[serde(deserialize_with = "number_or_string")]
    pub port: u16,
}

/// Database configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// SQLite URL of an existing database.
    pub url: String,

    /// Pool size.
    #[serde(deserialize_with = "number_or_string")]
    pub max_connections: u32,

    /// Seconds to wait for a pooled connection.
    #[serde(deserialize_with = "number_or_string")]
    pub acquire_timeout_secs: u64,

    /// Seconds a single query may run.
    #[serde(deserialize_with = "number_or_string")]
    pub query_timeout_secs: u64,

    /// Retries on transient store errors; 0 disables retrying.
    #[serde(deserialize_with = "number_or_string")]
    pub retry_attempts: u32,
}

/// Accept an integer or its decimal string.
///
/// The env overlay hands every `JUICETRACE_*` value over as a TOML string.
fn number_or_string<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr + TryFrom<u64>,
    <T as FromStr>::Err: Display,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(u64),
        Text(String),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Number(n) => {
            T::try_from(n).map_err(|_| de::Error::custom(format!("{n} is out of range")))
        }
        Raw::Text(s) => s
            .trim()
            .parse()
            .map_err(|e| de::Error::custom(format!("cannot parse '{s}' as a number: {e}"))),
    }
}

// ============================================================================
// Default implementations
// ============================================================================

impl Default for TraceConfig {
    fn default() -> Self {
        Self {
            project_name: "juicetrace".to_string(),
            server: ServerConfig::default(),
            database: DatabaseConfig::default(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite://juicetrace.db".to_string(),
            max_connections: 5,
            acquire_timeout_secs: 5,
            query_timeout_secs: 10,
            retry_attempts: 0,
        }
    }
}

// ============================================================================
// Derived settings
// ============================================================================

impl ServerConfig {
    /// The socket address to listen on.
    pub fn bind_addr(&self) -> Result<SocketAddr> {
        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|e| Error::config(format!("invalid server.host '{}': {e}", self.host)))?;
        Ok(SocketAddr::new(ip, self.port))
    }
}

impl DatabaseConfig {
    /// Pool settings for the storage adapter.
    pub fn store_options(&self) -> StoreOptions {
        StoreOptions {
            url: self.url.clone(),
            max_connections: self.max_connections,
            acquire_timeout: Duration::from_secs(self.acquire_timeout_secs),
            query_timeout: Duration::from_secs(self.query_timeout_secs),
        }
    }
}

// ============================================================================
// Config loading
// ============================================================================

impl TraceConfig {
    /// Load configuration from file, environment, and defaults.
    ///
    /// A config path that does not exist falls back to defaults.
    pub fn load(config_path: Option<&str>) -> Result<Self> {
        let mut builder =
            Confygery::new().map_err(|e| Error::config(format!("config init: {e}")))?;

        if let Some(path) = Self::resolve_config_path(config_path) {
            if path.exists() {
                builder
                    .add_file(&path.to_string_lossy())
                    .map_err(|e| Error::config(format!("config file: {e}")))?;
            }
        }

        let mut env_opts = env::Options::with_top_level(ENV_PREFIX);
        env_opts.add_section("server");
        env_opts.add_section("database");
        builder
            .add_env(env_opts)
            .map_err(|e| Error::config(format!("config env: {e}")))?;

        let mut config: Self = builder
            .build()
            .map_err(|e| Error::config(format!("config build: {e}")))?;

        config.apply_port_override(std::env::var(PORT_ENV).ok().as_deref())?;
        Ok(config)
    }

    /// Replace `server.port` with `port` when given.
    pub fn apply_port_override(&mut self, port: Option<&str>) -> Result<()> {
        if let Some(raw) = port {
            self.server.port = raw
                .trim()
                .parse()
                .map_err(|e| Error::config(format!("invalid {PORT_ENV} '{raw}': {e}")))?;
        }
        Ok(())
    }

    /// Resolve the config file path from explicit flag, env var, or XDG default.
    pub fn resolve_config_path(explicit: Option<&str>) -> Option<PathBuf> {
        if let Some(path) = explicit {
            return Some(PathBuf::from(path));
        }

        if let Ok(path) = std::env::var("JUICETRACE_CONFIG") {
            return Some(PathBuf::from(path));
        }

        Self::default_config_path()
    }

    /// Return the XDG default config path.
    pub fn default_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("juicetrace").join("config.toml"))
    }

    /// Serialize this config to a pretty-printed TOML string.
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| Error::serialization(e.to_string()))
    }

    /// Flatten this config into environment variable pairs with the
    /// `JUICETRACE_` prefix.
    pub fn to_env_vars(&self) -> Result<Vec<(String, String)>> {
        let value: toml::Value =
            toml::Value::try_from(self).map_err(|e| Error::serialization(e.to_string()))?;
        let mut vars = Vec::new();
        flatten_toml_value(&value, ENV_PREFIX, &mut vars);
        Ok(vars)
    }
}

// ============================================================================
// Helper: flatten TOML to env vars
// ============================================================================

/// Recursively flatten a TOML value into `KEY=value` pairs.
fn flatten_toml_value(value: &toml::Value, prefix: &str, out: &mut Vec<(String, String)>) {
    match value {
        toml::Value::Table(table) => {
            for (key, val) in table {
                let env_key = format!("{}_{}", prefix, key.to_uppercase());
                flatten_toml_value(val, &env_key, out);
            }
        }
        toml::Value::Array(arr) => {
            if let Ok(json) = serde_json::to_string(arr) {
                out.push((prefix.to_string(), json));
            }
        }
        toml::Value::String(s) => out.push((prefix.to_string(), s.clone())),
        toml::Value::Integer(i) => out.push((prefix.to_string(), i.to_string())),
        toml::Value::Float(f) => out.push((prefix.to_string(), f.to_string())),
        toml::Value::Boolean(b) => out.push((prefix.to_string(), b.to_string())),
        toml::Value::Datetime(dt) => out.push((prefix.to_string(), dt.to_string())),
    }
}

// ============================================================================
// Tests
// ============================================================================
