//! Tail a server-sent events endpoint.
//!
//! Connects with the HTTP transport, logs every lifecycle event and frame,
//! and keeps reconnecting until interrupted.
//!
//! # Running
//!
//! ```bash
//! cargo run -p sse-tail -- https://example.com/events
//! cargo run -p sse-tail -- https://example.com /events -H "Authorization: Bearer t" -p topic=orders
//! cargo run -p sse-tail -- --config tail.json
//! ```
//!
//! `--config` reads a JSON `ClientConfig`; command-line values are merged on
//! top of it. Set `RUST_LOG=ssekit_client=debug` to trace the state machine.

use std::time::Duration;

use ssekit::prelude::*;
use tracing::{error, info, warn};

const USAGE: &str = "usage: sse-tail [--config FILE] [URL [PATH]] [-H 'Name: value']... [-p key=value]... [--max-attempts N] [--read-timeout SECS]";

/// Parsed command line.
struct Args {
    config: ClientConfig,
    read_timeout: Option<Duration>,
}

fn parse_args() -> Result<Args, Box<dyn std::error::Error>> {
    let mut config: Option<ClientConfig> = None;
    let mut positional = Vec::new();
    let mut headers = Vec::new();
    let mut params = Vec::new();
    let mut max_attempts = None;
    let mut read_timeout = None;

    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        let flag = arg.clone();
        let mut value = || {
            args.next()
                .ok_or_else(|| format!("missing value for {flag}\n{USAGE}"))
        };
        match arg.as_str() {
            "--config" => {
                let text = std::fs::read_to_string(value()?)?;
                config = Some(serde_json::from_str(&text)?);
            }
            "-H" | "--header" => {
                let raw = value()?;
                let (name, val) = raw
                    .split_once(':')
                    .ok_or_else(|| format!("header must be 'Name: value', got {raw:?}"))?;
                headers.push((name.trim().to_string(), val.trim().to_string()));
            }
            "-p" | "--param" => {
                let raw = value()?;
                let (key, val) = raw
                    .split_once('=')
                    .ok_or_else(|| format!("param must be key=value, got {raw:?}"))?;
                params.push((key.to_string(), val.to_string()));
            }
            "--max-attempts" => {
                let n: i64 = value()?.parse()?;
                max_attempts = Some(u32::try_from(n).ok());
            }
            "--read-timeout" => read_timeout = Some(Duration::from_secs(value()?.parse()?)),
            "-h" | "--help" => {
                println!("{USAGE}");
                std::process::exit(0);
            }
            _ => positional.push(arg),
        }
    }

    let mut positional = positional.into_iter();
    let mut config = match (config, positional.next()) {
        (Some(config), Some(url)) => config.with_url(url),
        (Some(config), None) => config,
        (None, Some(url)) => ClientConfig::new(url),
        (None, None) => return Err(USAGE.into()),
    };
    if let Some(path) = positional.next() {
        config = config.with_path(path);
    }
    config = config.with_headers(headers).with_params(params);
    if let Some(limit) = max_attempts {
        config.retry = config.retry.with_max_attempts(limit);
    }

    Ok(Args {
        config,
        read_timeout,
    })
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "sse_tail=info,ssekit_client=info".into()),
        )
        .init();

    let args = parse_args()?;
    let mut transport_config = HttpTransportConfig::new();
    if let Some(timeout) = args.read_timeout {
        transport_config = transport_config.with_read_timeout(timeout);
    }

    let source = EventSourceBuilder::from_config(args.config)
        .transport(HttpTransport::new(transport_config)?)
        .build()?;
    info!(url = %source.config().request_url()?, "tailing");

    source.on("state", |event: &Event| {
        if let Event::State(state) = event {
            info!(%state, "state");
        }
    });
    source.on("open", |_: &Event| info!("stream open"));
    source.on("timeout", |_: &Event| info!("server ended stream"));
    source.on("error", |event: &Event| match event {
        Event::Error(err) => warn!(error = %err, "stream error"),
        // A content frame that happens to be named "error".
        Event::Message(message) => info!(event = "error", data = %message.data, "frame"),
        _ => {}
    });
    source.on("close", |event: &Event| {
        if let Event::Close { after_error } = event {
            info!(after_error, "stream closed");
        }
    });
    source.on("message", |event: &Event| {
        if let Some(message) = event.as_message() {
            info!(
                id = message.last_event_id.as_deref().unwrap_or("-"),
                data = %message.data,
                "message"
            );
        }
    });

    // Stop waiting once the client gives up on its own.
    let (closed_tx, mut closed_rx) = tokio::sync::mpsc::unbounded_channel();
    source.on("close", move |_: &Event| {
        closed_tx.send(()).ok();
    });

    source.open();

    tokio::select! {
        _ = tokio::signal::ctrl_c() => info!("interrupted"),
        _ = closed_rx.recv() => error!("stream closed by the client"),
    }
    source.destroy();
    Ok(())
}
