//! Unified error type.

use std::net::SocketAddr;

use crate::config::ConfigError;
use crate::router::RouteError;

/// The error type returned by disadis's fallible startup and serving
/// operations.
///
/// Request-level failures (404, 500, etc.) are expressed as
/// [`Response`](crate::Response) values, not as `Error`s. This type surfaces
/// infrastructure failures: bad configuration, an unbuildable route table,
/// or a listener that cannot bind.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Route(#[from] RouteError),
    #[error("cannot listen on {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        source: std::io::Error,
    },
    #[error("listener task failed: {0}")]
    Listener(#[from] tokio::task::JoinError),
}
