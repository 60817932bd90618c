use std::fmt;

use futures::{SinkExt, StreamExt};
use thiserror::Error;
use tokio::sync::mpsc;
use tokio_tungstenite::{connect_async, tungstenite::Message};
use url::Url;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId(Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// A session emits at most one `Opened`, then zero or more `Errored`, and
/// always ends with `Closed`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SocketEvent {
    Opened,
    Errored(String),
    Closed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionEvent {
    pub session: SessionId,
    pub event: SocketEvent,
}

impl SessionEvent {
    pub fn new(session: SessionId, event: SocketEvent) -> Self {
        Self { session, event }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("invalid socket url: {0}")]
    InvalidUrl(String),
    #[error("unsupported url scheme \"{0}\": expected ws or wss")]
    UnsupportedScheme(String),
}

/// On success, events tagged with `session` follow on `events` and end with
/// `Closed`; on error nothing was spawned and no events will arrive.
pub trait Transport: Send + Sync {
    fn open(
        &self,
        url: &str,
        session: SessionId,
        events: mpsc::UnboundedSender<SessionEvent>,
    ) -> Result<Box<dyn SocketHandle>, TransportError>;
}

/// Fire-and-forget write side; both operations are no-ops once the session
/// task is gone.
pub trait SocketHandle: Send {
    fn session(&self) -> SessionId;

    fn send(&self, text: String);

    fn close(&self);
}

enum SocketCommand {
    Send(String),
    Close,
}

/// One spawned task per session; must be opened from within a tokio runtime.
#[derive(Debug, Default)]
pub struct WsTransport;

impl Transport for WsTransport {
    fn open(
        &self,
        url: &str,
        session: SessionId,
        events: mpsc::UnboundedSender<SessionEvent>,
    ) -> Result<Box<dyn SocketHandle>, TransportError> {
        let parsed = Url::parse(url).map_err(|err| TransportError::InvalidUrl(err.to_string()))?;
        match parsed.scheme() {
            "ws" | "wss" => {}
            other => return Err(TransportError::UnsupportedScheme(other.to_string())),
        }
        let (commands_tx, commands_rx) = mpsc::unbounded_channel();
        tokio::spawn(run_session(parsed, session, events, commands_rx));
        Ok(Box::new(WsHandle {
            session,
            commands: commands_tx,
        }))
    }
}

struct WsHandle {
    session: SessionId,
    commands: mpsc::UnboundedSender<SocketCommand>,
}

impl SocketHandle for WsHandle {
    fn session(&self) -> SessionId {
        self.session
    }

    fn send(&self, text: String) {
        if self.commands.send(SocketCommand::Send(text)).is_err() {
            tracing::debug!(session = %self.session, "socket: dropping send, session task gone");
        }
    }

    fn close(&self) {
        let _ = self.commands.send(SocketCommand::Close);
    }
}

async fn run_session(
    url: Url,
    session: SessionId,
    events: mpsc::UnboundedSender<SessionEvent>,
    mut commands: mpsc::UnboundedReceiver<SocketCommand>,
) {
    let emit = |event: SocketEvent| {
        let _ = events.send(SessionEvent::new(session, event));
    };

    tracing::debug!(session = %session, url = %url, "socket: dialing");
    let dial = connect_async(url.as_str());
    tokio::pin!(dial);
    let stream = loop {
        tokio::select! {
            result = &mut dial => match result {
                Ok((stream, _response)) => break stream,
                Err(err) => {
                    tracing::warn!(session = %session, error = %err, "socket: dial failed");
                    emit(SocketEvent::Errored(err.to_string()));
                    emit(SocketEvent::Closed);
                    return;
                }
            },
            cmd = commands.recv() => match cmd {
                // A close during the dial abandons the attempt outright.
                Some(SocketCommand::Close) | None => {
                    tracing::debug!(session = %session, "socket: dial cancelled");
                    emit(SocketEvent::Closed);
                    return;
                }
                // Nothing is sendable before the handshake finishes.
                Some(SocketCommand::Send(_)) => {}
            },
        }
    };

    tracing::debug!(session = %session, "socket: open");
    emit(SocketEvent::Opened);
    let (mut writer, mut reader) = stream.split();

    loop {
        tokio::select! {
            cmd = commands.recv() => match cmd {
                Some(SocketCommand::Send(text)) => {
                    if let Err(err) = writer.send(Message::Text(text)).await {
                        tracing::warn!(session = %session, error = %err, "socket: send failed");
                        emit(SocketEvent::Errored(err.to_string()));
                        break;
                    }
                }
                Some(SocketCommand::Close) | None => {
                    let _ = writer.send(Message::Close(None)).await;
                    break;
                }
            },
            frame = reader.next() => match frame {
                Some(Ok(Message::Close(_))) | None => break,
                // Telemetry is one-way; inbound payloads are drained and dropped.
                Some(Ok(_)) => {}
                Some(Err(err)) => {
                    tracing::warn!(session = %session, error = %err, "socket: read failed");
                    emit(SocketEvent::Errored(err.to_string()));
                    break;
                }
            },
        }
    }

    emit(SocketEvent::Closed);
    tracing::debug!(session = %session, "socket: closed");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_rejects_a_malformed_url() {
        let transport = WsTransport;
        let (events, _rx) = mpsc::unbounded_channel();
        let err = transport
            .open("not a url", SessionId::new(), events)
            .err()
            .unwrap();
        assert!(matches!(err, TransportError::InvalidUrl(_)));
    }

    #[test]
    fn open_rejects_a_non_websocket_scheme() {
        let transport = WsTransport;
        let (events, _rx) = mpsc::unbounded_channel();
        let err = transport
            .open("http://127.0.0.1:1/ws", SessionId::new(), events)
            .err()
            .unwrap();
        assert_eq!(
            err,
            TransportError::UnsupportedScheme("http".to_string())
        );
    }
}
