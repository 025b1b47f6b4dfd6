use clap::Parser;
use resilient_ws::cli::{Cli, Commands};
use resilient_ws::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let config = Config::load(&cli.config).unwrap_or_else(|e| {
        eprintln!("Warning: Could not load config from {}: {}", cli.config, e);
        eprintln!("Using default configuration");
        Config::default()
    });

    // Initialize telemetry
    resilient_ws::telemetry::init_telemetry(&config.telemetry)?;

    match cli.command {
        Commands::Connect(args) => {
            args.execute(&config.connection).await?;
        }
        Commands::Config => {
            let conn = &config.connection;
            println!("Current configuration:");
            println!("  Endpoint: {}", conn.to_ws_config().url());
            println!(
                "  Reconnect: max {} attempts, {}ms initial, {}ms cap",
                conn.max_reconnect_attempts, conn.initial_delay_ms, conn.max_delay_ms
            );
            match conn.ping_interval_secs {
                Some(secs) => println!("  Keepalive: ping every {}s", secs),
                None => println!("  Keepalive: off"),
            }
            println!(
                "  Logging: {} ({:?})",
                config.telemetry.log_level, config.telemetry.log_format
            );
        }
    }

    Ok(())
}
