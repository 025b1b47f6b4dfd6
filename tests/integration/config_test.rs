//! Integration tests for configuration loading

use resilient_ws::config::Config;
use std::io::Write;

#[test]
fn test_config_example_loads() {
    let path = concat!(env!("CARGO_MANIFEST_DIR"), "/config.toml.example");
    let config = Config::load(path).unwrap();

    assert_eq!(config.connection.host, "localhost");
    assert_eq!(config.connection.port, 8765);
    assert_eq!(config.connection.max_reconnect_attempts, 1000);
    assert_eq!(config.connection.to_ws_config().url(), "ws://localhost:8765");
}

#[test]
fn test_config_load_from_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(
        file,
        r#"
        [connection]
        host = "example.com"
        secure = true
        path = "/events"
        "#
    )
    .unwrap();

    let config = Config::load(file.path()).unwrap();
    assert_eq!(
        config.connection.to_ws_config().url(),
        "wss://example.com:8765/events"
    );
    assert_eq!(config.telemetry.log_level, "info");
}

#[test]
fn test_config_load_rejects_invalid_values() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(
        file,
        r#"
        [connection]
        host = ""
        "#
    )
    .unwrap();

    assert!(Config::load(file.path()).is_err());
}
