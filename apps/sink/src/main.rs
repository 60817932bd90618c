use std::{
    net::SocketAddr,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
};

use anyhow::Context;
use axum::{
    extract::{State, WebSocketUpgrade},
    response::IntoResponse,
    routing::get,
    Router,
};
use clap::Parser;
use shared::protocol::{AngleUnit, StatusKind, WheelMessage};
use tracing::{info, warn};

/// Development receiver: accepts publisher sockets on `/ws` and logs every
/// decoded frame.
#[derive(Parser, Debug)]
#[command(name = "sink")]
struct Args {
    #[arg(long, default_value = "127.0.0.1:9000")]
    bind: String,
}

#[derive(Debug, Default)]
struct AppState {
    connections: AtomicU64,
    frames: AtomicU64,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_env_filter("info").init();

    let args = Args::parse();
    let state = Arc::new(AppState::default());
    let app = build_router(state);

    let addr: SocketAddr = args.bind.parse().context("invalid --bind address")?;
    info!(%addr, "wheel sink listening");
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    axum::serve(listener, app).await?;
    Ok(())
}

fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/ws", get(ws_handler))
        .with_state(state)
}

async fn healthz() -> &'static str {
    "ok"
}

async fn ws_handler(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| ws_connection(state, socket))
}

async fn ws_connection(state: Arc<AppState>, mut socket: axum::extract::ws::WebSocket) {
    use axum::extract::ws::Message;

    let conn = state.connections.fetch_add(1, Ordering::Relaxed) + 1;
    info!(conn, "publisher connected");

    while let Some(Ok(message)) = socket.recv().await {
        let Message::Text(text) = message else {
            continue;
        };
        match serde_json::from_str::<WheelMessage>(&text) {
            Ok(message) => {
                let frame = state.frames.fetch_add(1, Ordering::Relaxed) + 1;
                info!(conn, frame, "{}", summarize(&message));
            }
            Err(error) => warn!(conn, %error, "frame did not decode"),
        }
    }

    info!(conn, "publisher disconnected");
}

fn summarize(message: &WheelMessage) -> String {
    match message {
        WheelMessage::Rotation {
            channel,
            angle,
            unit,
            ..
        } => {
            let unit = match unit {
                AngleUnit::Deg => "deg",
            };
            format!("rotation channel={channel} angle={angle} unit={unit}")
        }
        WheelMessage::Status {
            channel, status, ..
        } => {
            let status = match status {
                StatusKind::Connected => "connected",
                StatusKind::Paused => "paused",
                StatusKind::Resumed => "resumed",
            };
            format!("status channel={channel} status={status}")
        }
    }
}
