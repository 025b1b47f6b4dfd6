//! Transport connections
//!
//! A [`Transport`] opens connections and reports their lifecycle out of band
//! as [`TransportEvent`]s tagged with the connection id it handed out.

use super::client::DriverEvent;
use super::types::{ConnectionId, TransportEvent, WsError};
use crate::telemetry::{increment, CounterMetric};
use futures_util::{SinkExt, StreamExt};
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_tungstenite::{connect_async, tungstenite::Message};

/// Transport capability injected into the connection manager
pub trait Transport {
    /// Start connecting to `url`, discarding nothing; events for the new
    /// connection are tagged with the returned id
    fn open(&mut self, url: &str) -> ConnectionId;

    /// Transmit one text frame
    fn send(&mut self, id: ConnectionId, text: String) -> Result<(), WsError>;

    /// Drop a connection; any events it still produces are stale
    fn close(&mut self, id: ConnectionId);
}

/// How a connection ended without a transport error
type CloseInfo = Option<(u16, String)>;

/// Transport backed by tokio-tungstenite
///
/// Every connection runs in its own task and owns an outbound queue; closing a
/// connection drops its queue, which makes the task send a close frame and exit.
pub(crate) struct TungsteniteTransport {
    next_id: ConnectionId,
    events: mpsc::UnboundedSender<DriverEvent>,
    ping_interval: Option<Duration>,
    outbound: HashMap<ConnectionId, mpsc::UnboundedSender<Message>>,
}

impl TungsteniteTransport {
    pub(crate) fn new(
        events: mpsc::UnboundedSender<DriverEvent>,
        ping_interval: Option<Duration>,
    ) -> Self {
        Self {
            next_id: 0,
            events,
            ping_interval,
            outbound: HashMap::new(),
        }
    }
}

impl Transport for TungsteniteTransport {
    fn open(&mut self, url: &str) -> ConnectionId {
        self.outbound.retain(|_, tx| !tx.is_closed());

        self.next_id += 1;
        let id = self.next_id;
        let (tx, rx) = mpsc::unbounded_channel();
        self.outbound.insert(id, tx);

        tokio::spawn(run_connection(
            url.to_string(),
            id,
            rx,
            self.events.clone(),
            self.ping_interval,
        ));

        id
    }

    fn send(&mut self, id: ConnectionId, text: String) -> Result<(), WsError> {
        let tx = self.outbound.get(&id).ok_or(WsError::NotOpen)?;
        tx.send(Message::Text(text))
            .map_err(|_| WsError::SendFailed("connection task ended".into()))
    }

    fn close(&mut self, id: ConnectionId) {
        self.outbound.remove(&id);
    }
}

/// Drive one connection and report its lifecycle
///
/// Always ends with exactly one `Close`, preceded by an `Error` when the
/// connection failed rather than closed cleanly.
async fn run_connection(
    url: String,
    id: ConnectionId,
    mut outbound: mpsc::UnboundedReceiver<Message>,
    events: mpsc::UnboundedSender<DriverEvent>,
    ping_interval: Option<Duration>,
) {
    let emit = |event: TransportEvent| {
        let _ = events.send(DriverEvent::Transport { id, event });
    };

    match connect_and_stream(&url, &mut outbound, &emit, ping_interval).await {
        Ok(close) => {
            let (code, reason) = match close {
                Some((code, reason)) => (Some(code), reason),
                None => (None, String::new()),
            };
            emit(TransportEvent::Close { code, reason });
        }
        Err(e) => {
            increment(CounterMetric::TransportErrors);
            emit(TransportEvent::Error(e.to_string()));
            emit(TransportEvent::Close {
                code: None,
                reason: e.to_string(),
            });
        }
    }
}

/// Connect to WebSocket and stream messages until the connection ends
async fn connect_and_stream(
    url: &str,
    outbound: &mut mpsc::UnboundedReceiver<Message>,
    emit: &impl Fn(TransportEvent),
    ping_interval: Option<Duration>,
) -> Result<CloseInfo, WsError> {
    tracing::debug!(url = %url, "Opening WebSocket");

    let (ws_stream, _response) = connect_async(url)
        .await
        .map_err(|e| WsError::ConnectionFailed(e.to_string()))?;

    let (mut write, mut read) = ws_stream.split();

    emit(TransportEvent::Open);

    // Setup ping interval, first tick one period from now
    let mut ping = ping_interval.map(|period| {
        let mut interval = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        interval
    });
    let mut waiting_for_pong = false;

    loop {
        tokio::select! {
            msg = read.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        emit(TransportEvent::Message(text));
                    }
                    Some(Ok(Message::Binary(data))) => match String::from_utf8(data) {
                        Ok(text) => emit(TransportEvent::Message(text)),
                        Err(_) => tracing::debug!("Dropping non-UTF-8 binary frame"),
                    },
                    Some(Ok(Message::Ping(data))) => {
                        write.send(Message::Pong(data)).await
                            .map_err(|e| WsError::SendFailed(e.to_string()))?;
                    }
                    Some(Ok(Message::Pong(_))) => {
                        waiting_for_pong = false;
                    }
                    Some(Ok(Message::Close(frame))) => {
                        tracing::debug!("Received close frame");
                        return Ok(frame.map(|f| (u16::from(f.code), f.reason.into_owned())));
                    }
                    Some(Ok(Message::Frame(_))) => {}
                    Some(Err(e)) => {
                        return Err(WsError::ConnectionFailed(e.to_string()));
                    }
                    None => {
                        return Err(WsError::ConnectionFailed("Stream ended unexpectedly".into()));
                    }
                }
            }

            msg = outbound.recv() => {
                match msg {
                    Some(msg) => {
                        write.send(msg).await
                            .map_err(|e| WsError::SendFailed(e.to_string()))?;
                    }
                    None => {
                        // Handle discarded by the manager
                        let _ = write.send(Message::Close(None)).await;
                        return Ok(None);
                    }
                }
            }

            _ = async {
                match ping.as_mut() {
                    Some(interval) => { interval.tick().await; }
                    None => std::future::pending().await,
                }
            } => {
                if waiting_for_pong {
                    return Err(WsError::ConnectionFailed("Pong timeout".into()));
                }
                write.send(Message::Ping(Vec::new())).await
                    .map_err(|e| WsError::SendFailed(e.to_string()))?;
                waiting_for_pong = true;
            }
        }
    }
}
