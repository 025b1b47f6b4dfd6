//! Resilient WebSocket connection
//!
//! A single logical connection to a message server that re-establishes itself
//! with exponential backoff. The [`ConnectionManager`] state machine is pure
//! and driven through injected [`Transport`] and [`Scheduler`] capabilities;
//! [`WsClient`] runs it on tokio with tokio-tungstenite underneath.

mod backoff;
mod client;
mod manager;
mod observer;
mod scheduler;
mod transport;
mod types;

pub use backoff::ReconnectPolicy;
pub use client::WsClient;
pub use manager::ConnectionManager;
pub use observer::{ChannelObserver, ConnectionObserver, NoopObserver, OnMessage};
pub use scheduler::Scheduler;
pub use transport::Transport;
pub use types::{
    ConnectionEvent, ConnectionId, ConnectionState, ConnectionStatus, Scheme, Target, TimerId,
    TransportEvent, WsConfig, WsError, DEFAULT_PORT,
};
