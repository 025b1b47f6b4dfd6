//! Connection state machine
//!
//! [`ConnectionManager`] does no I/O of its own. It reacts to transport events
//! and timer firings, and drives an injected [`Transport`] and [`Scheduler`].
//! All methods take `&mut self`; the caller serializes events, which gives the
//! ordering guarantee that a close's reconnect (counter increment and timer
//! scheduling included) finishes before the next event is looked at.

use super::backoff::ReconnectPolicy;
use super::observer::ConnectionObserver;
use super::scheduler::Scheduler;
use super::transport::Transport;
use super::types::{
    ConnectionId, ConnectionState, ConnectionStatus, Target, TimerId, TransportEvent, WsError,
};
use crate::telemetry::{increment, record_backoff, set_gauge, CounterMetric, GaugeMetric};
use serde::Serialize;

/// Owns one logical connection and re-establishes it on failure
pub struct ConnectionManager<T, S> {
    target: Target,
    url: String,
    policy: ReconnectPolicy,
    transport: T,
    scheduler: S,
    observer: Box<dyn ConnectionObserver>,
    state: ConnectionState,
    retry_count: u32,
    active: Option<ConnectionId>,
    pending_timer: Option<TimerId>,
    exhausted: bool,
    shut_down: bool,
}

impl<T: Transport, S: Scheduler> ConnectionManager<T, S> {
    /// Create a manager in the Disconnected state; call [`start`](Self::start) to connect
    pub fn new(
        target: Target,
        policy: ReconnectPolicy,
        transport: T,
        scheduler: S,
        observer: Box<dyn ConnectionObserver>,
    ) -> Self {
        let url = target.url();
        Self {
            target,
            url,
            policy,
            transport,
            scheduler,
            observer,
            state: ConnectionState::Disconnected,
            retry_count: 0,
            active: None,
            pending_timer: None,
            exhausted: false,
            shut_down: false,
        }
    }

    /// Initiate the first connection
    ///
    /// A no-op once the manager is connecting, connected, waiting to
    /// reconnect, exhausted or shut down.
    pub fn start(&mut self) {
        if self.is_inert() {
            tracing::warn!(url = %self.url, "Connection manager is inert, not starting");
            return;
        }
        if self.active.is_some() || self.pending_timer.is_some() {
            tracing::debug!(url = %self.url, "Connection manager already started");
            return;
        }
        self.connect();
    }

    /// Get the connection target
    pub fn target(&self) -> &Target {
        &self.target
    }

    /// Get the endpoint URL
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Get the current connection state
    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Get the number of reconnects since the last successful open
    pub fn retry_count(&self) -> u32 {
        self.retry_count
    }

    /// Reconnect attempts ran out
    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    /// Exhausted or shut down; no further activity will happen
    pub fn is_inert(&self) -> bool {
        self.exhausted || self.shut_down
    }

    /// Snapshot of state, retry counter and exhaustion
    pub fn status(&self) -> ConnectionStatus {
        ConnectionStatus {
            state: self.state,
            retry_count: self.retry_count,
            exhausted: self.exhausted,
        }
    }

    /// Id of the current transport connection
    pub fn active_connection(&self) -> Option<ConnectionId> {
        self.active
    }

    /// Id of the scheduled reconnect, if one is pending
    pub fn pending_timer(&self) -> Option<TimerId> {
        self.pending_timer
    }

    /// Get the injected transport
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Get the injected scheduler
    pub fn scheduler(&self) -> &S {
        &self.scheduler
    }

    /// Open a fresh transport connection
    ///
    /// Only reached with no active handle: from `start` before anything is
    /// open, or from a reconnect timer after the previous handle closed.
    fn connect(&mut self) {
        tracing::info!(url = %self.url, attempt = self.retry_count, "Connecting to WebSocket");
        increment(CounterMetric::ConnectAttempts);

        self.state = ConnectionState::Connecting;
        self.active = Some(self.transport.open(&self.url));
    }

    /// React to an event from the transport
    ///
    /// Events from any connection other than the current one are ignored.
    pub fn handle_transport(&mut self, id: ConnectionId, event: TransportEvent) {
        if self.active != Some(id) {
            tracing::trace!(connection = id, "Ignoring event from stale connection");
            return;
        }

        match event {
            TransportEvent::Open => {
                tracing::info!(url = %self.url, "WebSocket connected");
                increment(CounterMetric::ConnectionsOpened);
                self.state = ConnectionState::Open;
                self.retry_count = 0;
                set_gauge(GaugeMetric::RetryCount, 0.0);
                self.observer.on_open();
            }
            TransportEvent::Message(text) => {
                increment(CounterMetric::MessagesReceived);
                self.observer.on_message(&text);
            }
            TransportEvent::Error(error) => {
                // Advisory only: the transport always follows up with Close
                tracing::warn!(error = %error, "WebSocket error");
                self.observer.on_error(&error);
            }
            TransportEvent::Close { code, reason } => {
                tracing::info!(code = ?code, reason = %reason, "WebSocket closed");
                increment(CounterMetric::ConnectionsClosed);
                self.state = ConnectionState::Disconnected;
                self.active = None;
                self.observer.on_close(code, &reason);
                self.reconnect();
            }
        }
    }

    /// React to a scheduled reconnect firing
    pub fn handle_timer(&mut self, id: TimerId) {
        if self.shut_down || self.pending_timer != Some(id) {
            tracing::trace!(timer = id, "Ignoring stale reconnect timer");
            return;
        }
        self.pending_timer = None;
        self.connect();
    }

    /// Schedule the next connection attempt, or give up for good
    fn reconnect(&mut self) {
        if self.is_inert() {
            return;
        }

        if !self.policy.allows(self.retry_count) {
            tracing::error!(
                attempts = self.retry_count,
                "Max reconnect attempts reached, giving up"
            );
            increment(CounterMetric::ReconnectsExhausted);
            self.exhausted = true;
            self.observer.on_exhausted(self.retry_count);
            return;
        }

        let delay = self.policy.delay_for(self.retry_count);
        self.pending_timer = Some(self.scheduler.schedule(delay));
        self.retry_count += 1;

        tracing::info!(
            attempt = self.retry_count,
            delay_ms = delay.as_millis() as u64,
            "Reconnecting"
        );
        increment(CounterMetric::ReconnectsScheduled);
        record_backoff(delay);
        set_gauge(GaugeMetric::RetryCount, f64::from(self.retry_count));

        self.observer.on_reconnecting(self.retry_count, delay);
    }

    /// Serialize `data` as JSON and transmit it
    ///
    /// Outside the Open state the message is dropped with a warning, never queued.
    pub fn send<D: Serialize + ?Sized>(&mut self, data: &D) -> Result<(), WsError> {
        if self.state != ConnectionState::Open {
            return Err(self.drop_unsent());
        }
        let text =
            serde_json::to_string(data).map_err(|e| WsError::Serialization(e.to_string()))?;
        self.send_text(text)
    }

    /// Transmit an already serialized frame
    pub fn send_text(&mut self, text: String) -> Result<(), WsError> {
        let id = match (self.state, self.active) {
            (ConnectionState::Open, Some(id)) => id,
            _ => return Err(self.drop_unsent()),
        };

        match self.transport.send(id, text) {
            Ok(()) => {
                increment(CounterMetric::MessagesSent);
                Ok(())
            }
            Err(e) => {
                tracing::warn!(error = %e, "WebSocket send failed");
                increment(CounterMetric::MessagesDropped);
                Err(e)
            }
        }
    }

    fn drop_unsent(&self) -> WsError {
        tracing::warn!(state = ?self.state, "WebSocket is not open. Message not sent.");
        increment(CounterMetric::MessagesDropped);
        WsError::NotOpen
    }

    /// Cancel any pending reconnect, close the connection and go inert
    pub fn shutdown(&mut self) {
        if self.shut_down {
            return;
        }
        self.shut_down = true;

        if let Some(timer) = self.pending_timer.take() {
            self.scheduler.cancel(timer);
        }
        if let Some(id) = self.active.take() {
            self.state = ConnectionState::Closing;
            self.transport.close(id);
        }
        self.state = ConnectionState::Disconnected;

        tracing::info!(url = %self.url, "Connection manager shut down");
    }
}
