//! Lifecycle observers
//!
//! Every callback is optional. Observers run on the client driver task, one
//! event at a time, so they must not block.

use super::types::ConnectionEvent;
use std::time::Duration;
use tokio::sync::mpsc;

/// Receives lifecycle notifications from a connection manager
pub trait ConnectionObserver: Send {
    /// Connection established
    fn on_open(&mut self) {}

    /// Inbound frame, raw and unparsed
    fn on_message(&mut self, _text: &str) {}

    /// Transport error; `on_close` follows
    fn on_error(&mut self, _error: &str) {}

    /// Connection closed
    fn on_close(&mut self, _code: Option<u16>, _reason: &str) {}

    /// Reconnect scheduled after `delay`; `attempt` starts at 1
    fn on_reconnecting(&mut self, _attempt: u32, _delay: Duration) {}

    /// Attempts ran out; nothing else will be delivered
    fn on_exhausted(&mut self, _attempts: u32) {}
}

/// Observer that ignores everything
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl ConnectionObserver for NoopObserver {}

/// Wraps a plain message callback
pub struct OnMessage<F>(pub F);

impl<F> ConnectionObserver for OnMessage<F>
where
    F: FnMut(&str) + Send,
{
    fn on_message(&mut self, text: &str) {
        (self.0)(text)
    }
}

/// Forwards every lifecycle event into a channel
pub struct ChannelObserver {
    tx: mpsc::UnboundedSender<ConnectionEvent>,
}

impl ChannelObserver {
    /// Create an observer and the receiving end of its channel
    pub fn new() -> (Self, mpsc::UnboundedReceiver<ConnectionEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    fn emit(&self, event: ConnectionEvent) {
        if self.tx.send(event).is_err() {
            tracing::trace!("Event receiver dropped");
        }
    }
}

impl ConnectionObserver for ChannelObserver {
    fn on_open(&mut self) {
        self.emit(ConnectionEvent::Connected);
    }

    fn on_message(&mut self, text: &str) {
        self.emit(ConnectionEvent::Text(text.to_string()));
    }

    fn on_error(&mut self, error: &str) {
        self.emit(ConnectionEvent::Error(error.to_string()));
    }

    fn on_close(&mut self, code: Option<u16>, reason: &str) {
        self.emit(ConnectionEvent::Disconnected {
            code,
            reason: reason.to_string(),
        });
    }

    fn on_reconnecting(&mut self, attempt: u32, delay: Duration) {
        self.emit(ConnectionEvent::Reconnecting { attempt, delay });
    }

    fn on_exhausted(&mut self, attempts: u32) {
        self.emit(ConnectionEvent::GaveUp { attempts });
    }
}
