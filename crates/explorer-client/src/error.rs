//! Error types for indexer requests.

use explorer_core::ValidationError;
use thiserror::Error;

/// The request never produced a usable response body.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The indexer answered with a non-success status.
    #[error("HTTP {status} from {url}")]
    Http { status: u16, url: String },

    /// Connection refused, reset, TLS failure, body read failure.
    #[error("network error: {0}")]
    Network(String),

    /// The body was not the JSON shape we asked for.
    #[error("malformed response: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Coarse classification handed to a presentation layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidArgument,
    EmptyResult,
    Transport,
    Validation,
}

#[derive(Debug, Error)]
pub enum ExplorerError {
    /// Rejected before any request was sent.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The indexer answered, but with nothing in it.
    #[error("no data returned for {0}")]
    EmptyResult(String),

    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A record in the response broke a block invariant; the whole response is dropped.
    #[error("invalid block record: {0}")]
    Validation(#[from] ValidationError),
}

impl ExplorerError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidArgument(_) => ErrorKind::InvalidArgument,
            Self::EmptyResult(_) => ErrorKind::EmptyResult,
            Self::Transport(_) => ErrorKind::Transport,
            Self::Validation(_) => ErrorKind::Validation,
        }
    }

    pub(crate) fn negative_height(height: i64) -> Self {
        Self::InvalidArgument(format!("block height must not be negative (got {height})"))
    }
}
