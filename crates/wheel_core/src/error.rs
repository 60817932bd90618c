use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SocketError {
    #[error("Enter a WebSocket URL before connecting.")]
    MissingUrl,
    #[error("{0}")]
    Construction(String),
    // Detail goes to the log; the operator sees one stable line.
    #[error("WebSocket error occurred.")]
    Runtime,
}
