//! WebSocket client with automatic reconnection

use super::manager::ConnectionManager;
use super::observer::{ChannelObserver, ConnectionObserver, OnMessage};
use super::scheduler::TokioScheduler;
use super::transport::TungsteniteTransport;
use super::types::{
    ConnectionEvent, ConnectionId, ConnectionState, ConnectionStatus, TimerId, TransportEvent,
    WsConfig, WsError,
};
use serde::Serialize;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

/// Input to the driver task from the transport and the scheduler
pub(crate) enum DriverEvent {
    Transport {
        id: ConnectionId,
        event: TransportEvent,
    },
    Timer(TimerId),
}

/// Input to the driver task from the client handle
enum Command {
    Send(String),
    Shutdown,
}

/// Handle to a self-healing WebSocket connection
///
/// A background task owns the [`ConnectionManager`] and processes transport
/// events, reconnect timers and sends one at a time. Dropping the handle
/// shuts the connection down and cancels any pending reconnect.
pub struct WsClient {
    config: WsConfig,
    commands: mpsc::UnboundedSender<Command>,
    status: watch::Receiver<ConnectionStatus>,
    task: JoinHandle<()>,
}

impl WsClient {
    /// Start connecting immediately, reporting lifecycle events to `observer`
    ///
    /// Must be called from within a tokio runtime.
    pub fn connect(config: WsConfig, observer: impl ConnectionObserver + 'static) -> Self {
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (status_tx, status_rx) = watch::channel(ConnectionStatus::default());

        let manager = ConnectionManager::new(
            config.target.clone(),
            config.reconnect,
            TungsteniteTransport::new(event_tx.clone(), config.ping_interval),
            TokioScheduler::new(event_tx),
            Box::new(observer),
        );

        let task = tokio::spawn(run_driver(manager, event_rx, command_rx, status_tx));

        Self {
            config,
            commands: command_tx,
            status: status_rx,
            task,
        }
    }

    /// Start connecting, invoking `on_message` with each raw inbound payload
    pub fn with_callback<F>(config: WsConfig, on_message: F) -> Self
    where
        F: FnMut(&str) + Send + 'static,
    {
        Self::connect(config, OnMessage(on_message))
    }

    /// Start connecting and return a receiver for all lifecycle events
    ///
    /// The receiver yields `None` once the client is shut down or gives up.
    pub fn subscribe(config: WsConfig) -> (Self, mpsc::UnboundedReceiver<ConnectionEvent>) {
        let (observer, rx) = ChannelObserver::new();
        (Self::connect(config, observer), rx)
    }

    /// Get the configured URL
    pub fn url(&self) -> String {
        self.config.url()
    }

    /// Get the client configuration
    pub fn config(&self) -> &WsConfig {
        &self.config
    }

    /// Latest published status
    pub fn status(&self) -> ConnectionStatus {
        *self.status.borrow()
    }

    /// Latest published connection state
    pub fn state(&self) -> ConnectionState {
        self.status().state
    }

    /// Latest published retry counter
    pub fn retry_count(&self) -> u32 {
        self.status().retry_count
    }

    /// Serialize `data` as JSON and send it if the connection is open
    ///
    /// Never blocks. When the connection is not open the message is dropped
    /// with a warning and `WsError::NotOpen` is returned. A close racing with
    /// the send can still drop an accepted message; the driver logs it.
    pub fn send<D: Serialize + ?Sized>(&self, data: &D) -> Result<(), WsError> {
        self.ensure_open()?;
        let text =
            serde_json::to_string(data).map_err(|e| WsError::Serialization(e.to_string()))?;
        self.enqueue(text)
    }

    /// Send an already serialized frame if the connection is open
    pub fn send_text(&self, text: impl Into<String>) -> Result<(), WsError> {
        self.ensure_open()?;
        self.enqueue(text.into())
    }

    fn ensure_open(&self) -> Result<(), WsError> {
        let state = self.state();
        if state == ConnectionState::Open {
            return Ok(());
        }
        tracing::warn!(state = ?state, "WebSocket is not open. Message not sent.");
        Err(WsError::NotOpen)
    }

    fn enqueue(&self, text: String) -> Result<(), WsError> {
        self.commands
            .send(Command::Send(text))
            .map_err(|_| WsError::ChannelClosed)
    }

    /// Wait until the connection is open
    ///
    /// Fails with `MaxReconnectsExceeded` if the client gives up first.
    pub async fn wait_until_open(&self) -> Result<(), WsError> {
        let mut status = self.status.clone();
        let exhausted = status
            .wait_for(|s| s.state == ConnectionState::Open || s.exhausted)
            .await
            .map_err(|_| WsError::ChannelClosed)?
            .exhausted;

        if exhausted {
            Err(WsError::MaxReconnectsExceeded)
        } else {
            Ok(())
        }
    }

    /// Close the connection, cancel any pending reconnect and wait for the driver to stop
    pub async fn shutdown(self) {
        let _ = self.commands.send(Command::Shutdown);
        if let Err(e) = self.task.await {
            tracing::error!(error = %e, "WebSocket driver task failed");
        }
    }
}

/// Single logical thread of execution for one connection manager
async fn run_driver(
    mut manager: ConnectionManager<TungsteniteTransport, TokioScheduler>,
    mut events: mpsc::UnboundedReceiver<DriverEvent>,
    mut commands: mpsc::UnboundedReceiver<Command>,
    status: watch::Sender<ConnectionStatus>,
) {
    manager.start();
    status.send_replace(manager.status());

    loop {
        tokio::select! {
            event = events.recv() => match event {
                Some(DriverEvent::Transport { id, event }) => manager.handle_transport(id, event),
                Some(DriverEvent::Timer(id)) => manager.handle_timer(id),
                // Transport and scheduler hold senders for as long as the manager lives
                None => break,
            },
            command = commands.recv() => match command {
                Some(Command::Send(text)) => {
                    let _ = manager.send_text(text);
                }
                Some(Command::Shutdown) | None => {
                    manager.shutdown();
                    status.send_replace(manager.status());
                    break;
                }
            },
        }

        status.send_replace(manager.status());

        if manager.is_exhausted() {
            break;
        }
    }

    tracing::debug!(url = %manager.url(), "WebSocket driver stopped");
}
