//! Benchmarks for backoff calculation and the reconnect cycle

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use resilient_ws::ws::{
    ConnectionId, ConnectionManager, NoopObserver, ReconnectPolicy, Scheduler, Target, TimerId,
    Transport, TransportEvent, WsError,
};
use std::time::Duration;

#[derive(Default)]
struct NullTransport {
    next: ConnectionId,
}

impl Transport for NullTransport {
    fn open(&mut self, _url: &str) -> ConnectionId {
        self.next += 1;
        self.next
    }

    fn send(&mut self, _id: ConnectionId, _text: String) -> Result<(), WsError> {
        Ok(())
    }

    fn close(&mut self, _id: ConnectionId) {}
}

#[derive(Default)]
struct NullScheduler {
    next: TimerId,
}

impl Scheduler for NullScheduler {
    fn schedule(&mut self, _delay: Duration) -> TimerId {
        self.next += 1;
        self.next
    }

    fn cancel(&mut self, _id: TimerId) -> bool {
        true
    }
}

fn benchmark_delay_for(c: &mut Criterion) {
    let policy = ReconnectPolicy::default();

    c.bench_function("backoff_delay_for", |b| {
        b.iter(|| {
            for attempt in 0..40u32 {
                black_box(policy.delay_for(black_box(attempt)));
            }
        })
    });
}

fn benchmark_close_reconnect_open(c: &mut Criterion) {
    let mut manager = ConnectionManager::new(
        Target::new("example.com"),
        ReconnectPolicy::default(),
        NullTransport::default(),
        NullScheduler::default(),
        Box::new(NoopObserver),
    );
    manager.start();

    c.bench_function("close_reconnect_open", |b| {
        b.iter(|| {
            let Some(id) = manager.active_connection() else {
                return;
            };
            manager.handle_transport(id, TransportEvent::Open);
            manager.handle_transport(
                id,
                TransportEvent::Close {
                    code: Some(1006),
                    reason: String::new(),
                },
            );
            if let Some(timer) = manager.pending_timer() {
                manager.handle_timer(timer);
            }
        })
    });
}

criterion_group!(
    benches,
    benchmark_delay_for,
    benchmark_close_reconnect_open
);
criterion_main!(benches);
