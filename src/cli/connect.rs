//! Connect command implementation

use crate::config::ConnectionConfig;
use crate::ws::{ConnectionEvent, WsClient, WsError};
use clap::Args;
use tokio::io::{AsyncBufReadExt, BufReader};

#[derive(Args, Debug)]
pub struct ConnectArgs {
    /// Server host (overrides config)
    #[arg(long)]
    pub host: Option<String>,

    /// Server port (overrides config)
    #[arg(long)]
    pub port: Option<u16>,

    /// URL path (overrides config)
    #[arg(long)]
    pub path: Option<String>,

    /// Connect over wss://
    #[arg(long)]
    pub secure: bool,

    /// Maximum reconnection attempts (overrides config)
    #[arg(long)]
    pub max_reconnects: Option<u32>,
}

impl ConnectArgs {
    /// Apply command-line overrides on top of the configured connection
    pub fn resolve(&self, base: &ConnectionConfig) -> ConnectionConfig {
        let mut conn = base.clone();
        if let Some(host) = &self.host {
            conn.host = host.clone();
        }
        if let Some(port) = self.port {
            conn.port = port;
        }
        if let Some(path) = &self.path {
            conn.path = path.clone();
        }
        if self.secure {
            conn.secure = true;
        }
        if let Some(n) = self.max_reconnects {
            conn.max_reconnect_attempts = n;
        }
        conn
    }

    pub async fn execute(&self, base: &ConnectionConfig) -> anyhow::Result<()> {
        let conn = self.resolve(base);
        conn.validate()?;
        let config = conn.to_ws_config();
        tracing::info!(url = %config.url(), "Starting connection");

        let (client, mut events) = WsClient::subscribe(config);
        let mut stdin = BufReader::new(tokio::io::stdin()).lines();
        let mut stdin_open = true;
        let ctrl_c = tokio::signal::ctrl_c();
        tokio::pin!(ctrl_c);

        loop {
            tokio::select! {
                event = events.recv() => match event {
                    Some(ConnectionEvent::Text(text)) => println!("{}", text),
                    Some(ConnectionEvent::GaveUp { attempts }) => {
                        anyhow::bail!("gave up after {} reconnect attempts", attempts);
                    }
                    Some(_) => {}
                    None => break,
                },
                line = stdin.next_line(), if stdin_open => match line? {
                    Some(line) if line.trim().is_empty() => {}
                    Some(line) => match client.send(&outbound_payload(&line)) {
                        Ok(()) | Err(WsError::NotOpen) => {}
                        Err(e) => tracing::warn!(error = %e, "Failed to send line"),
                    },
                    None => stdin_open = false,
                },
                _ = &mut ctrl_c => {
                    tracing::info!("Interrupted, closing connection");
                    break;
                }
            }
        }

        client.shutdown().await;
        Ok(())
    }
}

/// JSON value for one stdin line: parsed if it is JSON, else sent as a string
fn outbound_payload(line: &str) -> serde_json::Value {
    serde_json::from_str(line).unwrap_or_else(|_| serde_json::Value::String(line.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn args() -> ConnectArgs {
        ConnectArgs {
            host: None,
            port: None,
            path: None,
            secure: false,
            max_reconnects: None,
        }
    }

    #[test]
    fn test_resolve_without_overrides_keeps_config() {
        let base = ConnectionConfig::default();
        let resolved = args().resolve(&base);
        assert_eq!(resolved.host, base.host);
        assert_eq!(resolved.port, base.port);
        assert!(!resolved.secure);
    }

    #[test]
    fn test_resolve_applies_overrides() {
        let overrides = ConnectArgs {
            host: Some("example.com".to_string()),
            port: Some(9001),
            path: Some("/feed".to_string()),
            secure: true,
            max_reconnects: Some(3),
        };

        let resolved = overrides.resolve(&ConnectionConfig::default());
        assert_eq!(
            resolved.to_ws_config().url(),
            "wss://example.com:9001/feed"
        );
        assert_eq!(resolved.max_reconnect_attempts, 3);
    }

    #[test]
    fn test_resolved_empty_host_fails_validation() {
        let overrides = ConnectArgs {
            host: Some(String::new()),
            ..args()
        };

        let resolved = overrides.resolve(&ConnectionConfig::default());
        assert!(resolved.validate().is_err());
        assert!(args().resolve(&ConnectionConfig::default()).validate().is_ok());
    }

    #[tokio::test]
    async fn test_execute_rejects_invalid_overrides() {
        let overrides = ConnectArgs {
            host: Some("  ".to_string()),
            ..args()
        };

        let err = overrides
            .execute(&ConnectionConfig::default())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("host"));
    }

    #[test]
    fn test_outbound_payload() {
        assert_eq!(outbound_payload(r#"{"cmd":"stop"}"#), json!({"cmd": "stop"}));
        assert_eq!(outbound_payload("42"), json!(42));
        assert_eq!(outbound_payload("hello there"), json!("hello there"));
    }
}
