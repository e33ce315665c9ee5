//! End-to-end tests over real HTTP.
//!
//! An axum server streams events; the client uses the default `reqwest`
//! transport and Tokio scheduler. Requires the `http` feature.

#![cfg(feature = "http")]

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::Router;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::response::sse::{Event as SseEvent, Sse};
use axum::routing::get;
use futures::stream;
use serde_json::json;
use ssekit::prelude::*;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio::time::timeout;

/// `Last-Event-ID` of every request the server saw, in order.
#[derive(Clone, Default)]
struct Seen {
    last_event_ids: Arc<Mutex<Vec<Option<String>>>>,
}

impl Seen {
    fn ids(&self) -> Vec<Option<String>> {
        self.last_event_ids
            .lock()
            .map(|ids| ids.clone())
            .unwrap_or_default()
    }
}

async fn events(State(seen): State<Seen>, headers: HeaderMap) -> impl IntoResponse {
    let last = headers
        .get("last-event-id")
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned);
    if let Ok(mut ids) = seen.last_event_ids.lock() {
        ids.push(last);
    }

    let frames = vec![
        Ok::<_, Infallible>(SseEvent::default().id("1").data("hello")),
        Ok(SseEvent::default()
            .id("2")
            .event("ping")
            .retry(Duration::from_millis(50))
            .data(json!({"n": 2}).to_string())),
    ];
    Sse::new(stream::iter(frames))
}

async fn unavailable() -> impl IntoResponse {
    (
        StatusCode::SERVICE_UNAVAILABLE,
        [(axum::http::header::CONTENT_TYPE, "application/json")],
        json!({"error": "maintenance"}).to_string(),
    )
}

async fn serve(seen: Seen) -> Result<SocketAddr, Box<dyn std::error::Error>> {
    let app = Router::new()
        .route("/events", get(events))
        .route("/down", get(unavailable))
        .with_state(seen);
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    tokio::spawn(async move {
        axum::serve(listener, app).await.ok();
    });
    Ok(addr)
}

fn forward(source: &EventSource, names: &[&str]) -> mpsc::UnboundedReceiver<Event> {
    let (tx, rx) = mpsc::unbounded_channel();
    for name in names {
        let tx = tx.clone();
        source.on(name, move |event: &Event| {
            tx.send(event.clone()).ok();
        });
    }
    rx
}

async fn next(rx: &mut mpsc::UnboundedReceiver<Event>) -> Event {
    timeout(Duration::from_secs(5), rx.recv())
        .await
        .expect("event within 5s")
        .expect("channel open")
}

#[tokio::test]
async fn test_stream_reconnects_with_last_event_id() -> Result<(), Box<dyn std::error::Error>> {
    let seen = Seen::default();
    let addr = serve(seen.clone()).await?;

    let source = EventSource::builder(format!("http://{addr}"))
        .path("/events")
        .min_interval(Duration::from_millis(10))
        .build()?;
    let mut rx = forward(&source, &["open", "message", "ping", "timeout"]);

    source.open();

    assert_eq!(next(&mut rx).await, Event::Open);
    let Event::Message(hello) = next(&mut rx).await else {
        panic!("expected message");
    };
    assert_eq!(hello.event_type, "message");
    assert_eq!(hello.data, json!("hello"));
    assert_eq!(hello.last_event_id.as_deref(), Some("1"));

    let Event::Message(ping) = next(&mut rx).await else {
        panic!("expected ping");
    };
    assert_eq!(ping.event_type, "ping");
    assert_eq!(ping.data, json!({"n": 2}));

    assert_eq!(next(&mut rx).await, Event::Timeout);
    assert_eq!(source.reconnect_interval(), Some(Duration::from_millis(50)));

    // The server ended the stream; the client comes back with its id.
    assert_eq!(next(&mut rx).await, Event::Open);
    let ids = seen.ids();
    assert!(ids.len() >= 2);
    assert_eq!(ids[0], None);
    assert!(ids[1..].iter().all(|id| id.as_deref() == Some("2")));

    source.destroy();
    assert_eq!(source.state(), Some(ConnectionState::Closed));
    Ok(())
}

#[tokio::test]
async fn test_server_error_closes_stream() -> Result<(), Box<dyn std::error::Error>> {
    let addr = serve(Seen::default()).await?;

    let source = EventSource::builder(format!("http://{addr}"))
        .path("/down")
        .build()?;
    let mut rx = forward(&source, &["error", "close"]);

    source.open();

    assert_eq!(
        next(&mut rx).await,
        Event::Error(StreamError::Server {
            status: 503,
            body: json!({"error": "maintenance"}),
        })
    );
    assert_eq!(next(&mut rx).await, Event::Close { after_error: true });
    assert_eq!(source.state(), Some(ConnectionState::Closed));
    Ok(())
}

#[tokio::test]
async fn test_unreachable_server_reports_network_error() -> Result<(), Box<dyn std::error::Error>> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    drop(listener);

    let source = EventSource::builder(format!("http://{addr}"))
        .max_attempts(Some(1))
        .min_interval(Duration::from_millis(10))
        .build()?;
    let mut rx = forward(&source, &["error", "close"]);

    source.open();

    assert_eq!(next(&mut rx).await, Event::Error(StreamError::Network));
    assert_eq!(next(&mut rx).await, Event::Close { after_error: true });
    Ok(())
}
