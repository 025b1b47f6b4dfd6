//! Prometheus metrics

use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::time::Duration;

/// Counter metric types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CounterMetric {
    /// Transport connections opened (initial and reconnects)
    ConnectAttempts,
    /// Handshakes completed
    ConnectionsOpened,
    /// Close events from the current connection
    ConnectionsClosed,
    /// Transport failures
    TransportErrors,
    /// Inbound frames delivered
    MessagesReceived,
    /// Outbound frames handed to the transport
    MessagesSent,
    /// Outbound frames dropped
    MessagesDropped,
    /// Reconnects scheduled
    ReconnectsScheduled,
    /// Managers that gave up
    ReconnectsExhausted,
}

impl CounterMetric {
    pub fn name(&self) -> &'static str {
        match self {
            CounterMetric::ConnectAttempts => "wsclient_connect_attempts_total",
            CounterMetric::ConnectionsOpened => "wsclient_connections_opened_total",
            CounterMetric::ConnectionsClosed => "wsclient_connections_closed_total",
            CounterMetric::TransportErrors => "wsclient_transport_errors_total",
            CounterMetric::MessagesReceived => "wsclient_messages_received_total",
            CounterMetric::MessagesSent => "wsclient_messages_sent_total",
            CounterMetric::MessagesDropped => "wsclient_messages_dropped_total",
            CounterMetric::ReconnectsScheduled => "wsclient_reconnects_scheduled_total",
            CounterMetric::ReconnectsExhausted => "wsclient_reconnects_exhausted_total",
        }
    }
}

/// Gauge metric types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GaugeMetric {
    /// Current retry counter
    RetryCount,
}

impl GaugeMetric {
    pub fn name(&self) -> &'static str {
        match self {
            GaugeMetric::RetryCount => "wsclient_retry_count",
        }
    }
}

/// Increment a counter by one
pub fn increment(metric: CounterMetric) {
    ::metrics::counter!(metric.name()).increment(1);
}

/// Set a gauge value
pub fn set_gauge(metric: GaugeMetric, value: f64) {
    ::metrics::gauge!(metric.name()).set(value);
}

/// Record a scheduled reconnect delay
pub fn record_backoff(delay: Duration) {
    ::metrics::histogram!("wsclient_reconnect_delay_ms").record(delay.as_secs_f64() * 1000.0);
}

/// Serve metrics on `0.0.0.0:port/metrics`
///
/// Must be called from within a tokio runtime.
pub fn install_exporter(port: u16) -> anyhow::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| anyhow::anyhow!("Failed to install metrics exporter: {}", e))?;

    tracing::info!(%addr, "Prometheus metrics exporter listening");
    Ok(())
}
