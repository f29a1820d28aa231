// src/config.rs

//! Manages server configuration: loading, defaulting, and validation.

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};
use std::fs;
use std::time::Duration;

/// The top-level server configuration, deserialized from a TOML file.
/// Every field has a default, so an empty file (or no file at all) yields a
/// runnable configuration.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Config {
    /// The address the listener binds to.
    #[serde(default = "default_host")]
    pub host: String,
    /// The port the listener binds to.
    #[serde(default = "default_port")]
    pub port: u16,
    /// The default tracing filter, overridable via `RUST_LOG`.
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// How long a session waits for a complete request head before giving up
    /// on the client.
    #[serde(with = "humantime_serde", default = "default_read_timeout")]
    pub read_timeout: Duration,
    /// How long a session may spend writing its response.
    #[serde(with = "humantime_serde", default = "default_write_timeout")]
    pub write_timeout: Duration,
    #[serde(default)]
    pub pool: PoolConfig,
}

/// Configuration for the backend handle pool.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct PoolConfig {
    /// The fixed number of backend handles created at startup.
    #[serde(default = "default_pool_capacity")]
    pub capacity: usize,
    /// Upper bound on how long one backend operation may wait for a free
    /// handle.
    #[serde(with = "humantime_serde", default = "default_acquire_timeout")]
    pub acquire_timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            log_level: default_log_level(),
            read_timeout: default_read_timeout(),
            write_timeout: default_write_timeout(),
            pool: PoolConfig::default(),
        }
    }
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            capacity: default_pool_capacity(),
            acquire_timeout: default_acquire_timeout(),
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}
fn default_port() -> u16 {
    8000
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_read_timeout() -> Duration {
    Duration::from_secs(30)
}
fn default_write_timeout() -> Duration {
    Duration::from_secs(10)
}
fn default_pool_capacity() -> usize {
    10
}
fn default_acquire_timeout() -> Duration {
    Duration::from_secs(5)
}

impl Config {
    /// Creates a new `Config` instance by reading and parsing a TOML file.
    pub fn from_file(path: &str) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file at '{path}'"))?;
        let config: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse TOML from '{path}'"))?;

        config.validate()?;
        Ok(config)
    }

    /// Validates the resolved configuration to ensure logical consistency.
    pub fn validate(&self) -> Result<()> {
        if self.port == 0 {
            return Err(anyhow!("port cannot be 0"));
        }
        if self.host.trim().is_empty() {
            return Err(anyhow!("host cannot be empty"));
        }
        if self.pool.capacity == 0 {
            return Err(anyhow!("pool.capacity cannot be 0"));
        }
        if self.pool.acquire_timeout.is_zero() {
            return Err(anyhow!("pool.acquire_timeout cannot be 0"));
        }
        if self.read_timeout.is_zero() {
            return Err(anyhow!("read_timeout cannot be 0"));
        }
        if self.write_timeout.is_zero() {
            return Err(anyhow!("write_timeout cannot be 0"));
        }
        Ok(())
    }
}
