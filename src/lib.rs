//! resilient-ws: Self-healing WebSocket client
//!
//! This library provides:
//! - A persistent connection that reconnects with exponential backoff
//! - A pure connection state machine with injectable transport and timers
//! - A tokio runtime client with send/receive and lifecycle observers
//! - TOML configuration, structured logging and Prometheus metrics

pub mod cli;
pub mod config;
pub mod telemetry;
pub mod ws;
