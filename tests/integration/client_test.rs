//! Integration tests for the WebSocket client against a local server

use futures_util::{SinkExt, StreamExt};
use resilient_ws::ws::{ConnectionEvent, ConnectionState, WsClient, WsConfig, WsError};
use serde_json::json;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio_tungstenite::{accept_async, tungstenite::Message};

const TIMEOUT: Duration = Duration::from_secs(10);

async fn bind() -> (TcpListener, u16) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    (listener, port)
}

fn local(port: u16) -> WsConfig {
    WsConfig::new("127.0.0.1")
        .port(port)
        .initial_delay(Duration::from_millis(10))
        .max_delay(Duration::from_millis(50))
}

/// Wait for the first event matching `pred`, skipping others
async fn expect_event(
    events: &mut UnboundedReceiver<ConnectionEvent>,
    pred: impl Fn(&ConnectionEvent) -> bool,
) -> ConnectionEvent {
    tokio::time::timeout(TIMEOUT, async {
        loop {
            match events.recv().await {
                Some(event) if pred(&event) => return event,
                Some(_) => continue,
                None => panic!("event stream ended"),
            }
        }
    })
    .await
    .expect("timed out waiting for event")
}

#[tokio::test]
async fn test_receive_and_send_while_open() {
    let (listener, port) = bind().await;

    let server = tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let mut ws = accept_async(stream).await.unwrap();
        ws.send(Message::Text("ping".into())).await.unwrap();
        loop {
            match ws.next().await {
                Some(Ok(Message::Text(text))) => return text,
                Some(Ok(_)) => continue,
                other => panic!("connection ended before a text frame: {:?}", other),
            }
        }
    });

    let (client, mut events) = WsClient::subscribe(local(port));

    expect_event(&mut events, |e| *e == ConnectionEvent::Connected).await;
    let text = expect_event(&mut events, |e| matches!(e, ConnectionEvent::Text(_))).await;
    assert_eq!(text, ConnectionEvent::Text("ping".to_string()));

    client.wait_until_open().await.unwrap();
    assert_eq!(client.state(), ConnectionState::Open);

    let payload = json!({"command": "status", "id": 7});
    client.send(&payload).unwrap();

    let received = tokio::time::timeout(TIMEOUT, server)
        .await
        .expect("server timed out")
        .unwrap();
    let decoded: serde_json::Value = serde_json::from_str(&received).unwrap();
    assert_eq!(decoded, payload);

    client.shutdown().await;
}

#[tokio::test]
async fn test_callback_receives_raw_payloads_in_order() {
    let (listener, port) = bind().await;

    tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let mut ws = accept_async(stream).await.unwrap();
        for text in ["first", "{\"second\":2}", "third"] {
            ws.send(Message::Text(text.into())).await.unwrap();
        }
        while let Some(Ok(_)) = ws.next().await {}
    });

    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
    let client = WsClient::with_callback(local(port), move |text| {
        let _ = tx.send(text.to_string());
    });

    let mut received = Vec::new();
    for _ in 0..3 {
        let text = tokio::time::timeout(TIMEOUT, rx.recv())
            .await
            .expect("timed out waiting for message")
            .unwrap();
        received.push(text);
    }
    assert_eq!(received, vec!["first", "{\"second\":2}", "third"]);

    client.shutdown().await;
}

#[tokio::test]
async fn test_reconnects_after_server_close() {
    let (listener, port) = bind().await;

    tokio::spawn(async move {
        // First connection: close straight away
        let (stream, _) = listener.accept().await.unwrap();
        let mut ws = accept_async(stream).await.unwrap();
        ws.close(None).await.unwrap();
        while let Some(Ok(_)) = ws.next().await {}

        // Second connection: stay up
        let (stream, _) = listener.accept().await.unwrap();
        let mut ws = accept_async(stream).await.unwrap();
        ws.send(Message::Text("welcome back".into())).await.unwrap();
        while let Some(Ok(_)) = ws.next().await {}
    });

    let (client, mut events) = WsClient::subscribe(local(port));

    expect_event(&mut events, |e| *e == ConnectionEvent::Connected).await;
    expect_event(&mut events, |e| {
        matches!(e, ConnectionEvent::Disconnected { .. })
    })
    .await;
    let reconnecting = expect_event(&mut events, |e| {
        matches!(e, ConnectionEvent::Reconnecting { .. })
    })
    .await;
    assert_eq!(
        reconnecting,
        ConnectionEvent::Reconnecting {
            attempt: 1,
            delay: Duration::from_millis(10)
        }
    );

    expect_event(&mut events, |e| *e == ConnectionEvent::Connected).await;
    expect_event(&mut events, |e| {
        *e == ConnectionEvent::Text("welcome back".to_string())
    })
    .await;

    client.wait_until_open().await.unwrap();
    assert_eq!(client.retry_count(), 0);

    client.shutdown().await;
}

#[tokio::test]
async fn test_gives_up_when_server_unreachable() {
    let (listener, port) = bind().await;
    drop(listener);

    let (client, mut events) = WsClient::subscribe(local(port).max_reconnects(2));

    assert_eq!(client.send(&"too early"), Err(WsError::NotOpen));

    let gave_up = expect_event(&mut events, |e| {
        matches!(e, ConnectionEvent::GaveUp { .. })
    })
    .await;
    assert_eq!(gave_up, ConnectionEvent::GaveUp { attempts: 2 });

    let result = tokio::time::timeout(TIMEOUT, client.wait_until_open())
        .await
        .expect("timed out");
    assert_eq!(result, Err(WsError::MaxReconnectsExceeded));
    assert_eq!(client.state(), ConnectionState::Disconnected);

    // No further activity once exhausted
    let end = tokio::time::timeout(TIMEOUT, events.recv())
        .await
        .expect("event stream stayed open");
    assert!(end.is_none());
}
