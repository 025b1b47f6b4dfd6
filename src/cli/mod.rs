//! CLI interface for resilient-ws
//!
//! Provides subcommands for:
//! - `connect`: Hold a connection open, printing inbound and sending stdin lines
//! - `config`: Show the effective configuration

mod connect;

pub use connect::ConnectArgs;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "resilient-ws")]
#[command(about = "Self-healing WebSocket client with exponential backoff reconnection")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml")]
    pub config: String,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Connect and relay messages between the server and stdin/stdout
    Connect(ConnectArgs),
    /// Show configuration
    Config,
}
