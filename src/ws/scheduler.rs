//! Deferred reconnect timers

use super::client::DriverEvent;
use super::types::TimerId;
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Schedule-after-delay capability injected into the connection manager
///
/// Firing is reported back to the manager out of band (by the client driver
/// calling `handle_timer` with the returned id), so an implementation only
/// has to remember which ids are still pending.
pub trait Scheduler {
    /// Arrange for `id` to fire after `delay`
    fn schedule(&mut self, delay: Duration) -> TimerId;

    /// Cancel a pending timer; returns whether it was still pending
    fn cancel(&mut self, id: TimerId) -> bool;
}

/// Scheduler backed by tokio timers
///
/// Each timer is a task that sleeps and then posts [`DriverEvent::Timer`].
pub(crate) struct TokioScheduler {
    next_id: TimerId,
    events: mpsc::UnboundedSender<DriverEvent>,
    timers: HashMap<TimerId, JoinHandle<()>>,
}

impl TokioScheduler {
    pub(crate) fn new(events: mpsc::UnboundedSender<DriverEvent>) -> Self {
        Self {
            next_id: 0,
            events,
            timers: HashMap::new(),
        }
    }
}

impl Scheduler for TokioScheduler {
    fn schedule(&mut self, delay: Duration) -> TimerId {
        self.timers.retain(|_, handle| !handle.is_finished());

        self.next_id += 1;
        let id = self.next_id;
        let events = self.events.clone();

        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = events.send(DriverEvent::Timer(id));
        });
        self.timers.insert(id, handle);

        id
    }

    fn cancel(&mut self, id: TimerId) -> bool {
        match self.timers.remove(&id) {
            Some(handle) => {
                let pending = !handle.is_finished();
                handle.abort();
                pending
            }
            None => false,
        }
    }
}

impl Drop for TokioScheduler {
    fn drop(&mut self) {
        for (_, handle) in self.timers.drain() {
            handle.abort();
        }
    }
}
