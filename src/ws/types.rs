//! WebSocket types and configuration

use super::backoff::ReconnectPolicy;
use std::fmt;
use std::time::Duration;

/// Default server port
pub const DEFAULT_PORT: u16 = 8765;

/// Identifier of one underlying transport connection
pub type ConnectionId = u64;

/// Identifier of one scheduled reconnect timer
pub type TimerId = u64;

/// URL scheme, chosen by whether the embedding context is secure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Scheme {
    /// Plain `ws://`
    #[default]
    Ws,
    /// TLS `wss://`
    Wss,
}

impl Scheme {
    /// Pick the scheme for a secure or insecure context
    pub fn for_context(secure: bool) -> Self {
        if secure {
            Scheme::Wss
        } else {
            Scheme::Ws
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Scheme::Ws => "ws",
            Scheme::Wss => "wss",
        }
    }
}

/// Remote endpoint of a connection manager
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    pub host: String,
    pub port: u16,
    /// Appended verbatim after the port, e.g. `/feed` or empty
    pub path: String,
    pub scheme: Scheme,
}

impl Target {
    /// Target on the default port with an empty path over plain `ws://`
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: DEFAULT_PORT,
            path: String::new(),
            scheme: Scheme::Ws,
        }
    }

    /// Build the endpoint URL
    pub fn url(&self) -> String {
        format!(
            "{}://{}:{}{}",
            self.scheme.as_str(),
            self.host,
            self.port,
            self.path
        )
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.url())
    }
}

/// Connection state of a manager
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connecting,
    Open,
    /// Only observed while shutting down
    Closing,
}

/// Snapshot published by the client driver after every event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ConnectionStatus {
    pub state: ConnectionState,
    pub retry_count: u32,
    /// Reconnect attempts ran out; the manager is inert
    pub exhausted: bool,
}

/// Event raised by a transport for one of its connections
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    /// Handshake completed
    Open,
    /// Inbound text frame
    Message(String),
    /// Advisory only, a `Close` always follows
    Error(String),
    /// Connection is gone
    Close { code: Option<u16>, reason: String },
}

/// Lifecycle events delivered by [`super::ChannelObserver`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionEvent {
    /// Connection established
    Connected,
    /// Raw inbound text
    Text(String),
    /// Transport error, a `Disconnected` follows
    Error(String),
    /// Connection closed
    Disconnected { code: Option<u16>, reason: String },
    /// Reconnect scheduled
    Reconnecting { attempt: u32, delay: Duration },
    /// Maximum reconnection attempts reached, no further events follow
    GaveUp { attempts: u32 },
}

/// WebSocket client configuration
#[derive(Debug, Clone)]
pub struct WsConfig {
    pub target: Target,
    pub reconnect: ReconnectPolicy,
    /// Interval for keepalive pings; `None` relies on the server
    pub ping_interval: Option<Duration>,
}

impl WsConfig {
    /// Create a new config for the given host with default port, path and backoff
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            target: Target::new(host),
            reconnect: ReconnectPolicy::default(),
            ping_interval: None,
        }
    }

    /// Set the server port
    pub fn port(mut self, port: u16) -> Self {
        self.target.port = port;
        self
    }

    /// Set the URL path
    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.target.path = path.into();
        self
    }

    /// Use `wss://` when the embedding context is secure
    pub fn secure(mut self, secure: bool) -> Self {
        self.target.scheme = Scheme::for_context(secure);
        self
    }

    /// Set maximum reconnection attempts
    pub fn max_reconnects(mut self, n: u32) -> Self {
        self.reconnect.max_attempts = n;
        self
    }

    /// Set initial reconnection delay
    pub fn initial_delay(mut self, d: Duration) -> Self {
        self.reconnect.initial_delay = d;
        self
    }

    /// Set maximum reconnection delay
    pub fn max_delay(mut self, d: Duration) -> Self {
        self.reconnect.max_delay = d;
        self
    }

    /// Enable keepalive pings
    pub fn ping_interval(mut self, d: Duration) -> Self {
        self.ping_interval = Some(d);
        self
    }

    /// Get the endpoint URL
    pub fn url(&self) -> String {
        self.target.url()
    }
}

/// WebSocket errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WsError {
    /// Connection failed
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),
    /// Send attempted while the connection is not open
    #[error("WebSocket is not open, message dropped")]
    NotOpen,
    /// Maximum reconnection attempts exceeded
    #[error("Maximum reconnection attempts exceeded")]
    MaxReconnectsExceeded,
    /// Client driver is gone
    #[error("Channel closed")]
    ChannelClosed,
    /// Send failed
    #[error("Send failed: {0}")]
    SendFailed(String),
    /// Outbound payload could not be serialized
    #[error("Serialization failed: {0}")]
    Serialization(String),
}
