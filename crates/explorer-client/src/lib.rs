//! Esplora client and the feed session that keeps a block feed in sync.
//!
//! - [`ExplorerClient`] turns feed requests into HTTP calls and validated blocks
//! - [`HttpTransport`] is the I/O seam; [`ReqwestTransport`] is the real one
//! - [`FeedSession`] ties the client, the feed store and the scroll controller together

pub mod client;
pub mod config;
pub mod error;
pub mod session;
pub mod transport;

pub use client::ExplorerClient;
pub use config::{ClientConfig, DEFAULT_BASE_URL};
pub use error::{ErrorKind, ExplorerError, TransportError};
pub use session::{FeedSession, LoadOutcome};
pub use transport::{HttpTransport, ReqwestTransport};

#[cfg(test)]
mod testing;
