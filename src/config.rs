//! Configuration types for resilient-ws

use crate::telemetry::LogFormat;
use crate::ws::{ReconnectPolicy, Scheme, Target, WsConfig, DEFAULT_PORT};
use serde::Deserialize;
use std::time::Duration;

/// Root configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub connection: ConnectionConfig,
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

/// Connection target and reconnect behavior
#[derive(Debug, Clone, Deserialize)]
pub struct ConnectionConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Appended after the port, e.g. "/feed"
    #[serde(default)]
    pub path: String,

    /// Connect over `wss://`
    #[serde(default)]
    pub secure: bool,

    #[serde(default = "default_max_reconnect_attempts")]
    pub max_reconnect_attempts: u32,

    #[serde(default = "default_initial_delay_ms")]
    pub initial_delay_ms: u64,

    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,

    /// Keepalive ping interval; unset disables client pings
    #[serde(default)]
    pub ping_interval_secs: Option<u64>,
}

fn default_host() -> String {
    "localhost".to_string()
}
fn default_port() -> u16 {
    DEFAULT_PORT
}
fn default_max_reconnect_attempts() -> u32 {
    1000
}
fn default_initial_delay_ms() -> u64 {
    1000
}
fn default_max_delay_ms() -> u64 {
    30_000
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: DEFAULT_PORT,
            path: String::new(),
            secure: false,
            max_reconnect_attempts: 1000,
            initial_delay_ms: 1000,
            max_delay_ms: 30_000,
            ping_interval_secs: None,
        }
    }
}

impl ConnectionConfig {
    /// Reject a target or backoff the connection manager cannot work with
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.host.trim().is_empty() {
            anyhow::bail!("connection.host must not be empty");
        }
        if self.initial_delay_ms == 0 {
            anyhow::bail!("connection.initial_delay_ms must be positive");
        }
        if self.max_delay_ms < self.initial_delay_ms {
            anyhow::bail!(
                "connection.max_delay_ms ({}) is below initial_delay_ms ({})",
                self.max_delay_ms,
                self.initial_delay_ms
            );
        }
        if self.ping_interval_secs == Some(0) {
            anyhow::bail!("connection.ping_interval_secs must be positive");
        }
        Ok(())
    }

    /// Client configuration for this connection
    pub fn to_ws_config(&self) -> WsConfig {
        WsConfig {
            target: Target {
                host: self.host.clone(),
                port: self.port,
                path: self.path.clone(),
                scheme: Scheme::for_context(self.secure),
            },
            reconnect: ReconnectPolicy {
                initial_delay: Duration::from_millis(self.initial_delay_ms),
                max_delay: Duration::from_millis(self.max_delay_ms),
                max_attempts: self.max_reconnect_attempts,
            },
            ping_interval: self.ping_interval_secs.map(Duration::from_secs),
        }
    }
}

/// Telemetry configuration
#[derive(Debug, Clone, Deserialize)]
pub struct TelemetryConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default)]
    pub log_format: LogFormat,

    /// Serve Prometheus metrics on this port
    #[serde(default)]
    pub metrics_port: Option<u16>,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_format: LogFormat::Pretty,
            metrics_port: None,
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn load(path: impl AsRef<std::path::Path>) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings the connection manager cannot work with
    pub fn validate(&self) -> anyhow::Result<()> {
        self.connection.validate()
    }
}
