//! Unified error type.

use thiserror::Error;

/// The error type returned by ruta's fallible operations.
///
/// Request-level outcomes (404, 405, 500) are HTTP responses written through
/// the [`Context`](crate::Context), not `Error`s. This type surfaces
/// configuration mistakes caught while the route table is built, and
/// infrastructure failures while serving.
#[derive(Debug, Error)]
pub enum Error {
    /// Binding to a port or accepting a connection failed.
    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    /// The address handed to [`Server::bind`](crate::Server::bind) is not `host:port`.
    #[error("invalid socket address `{addr}`: {source}")]
    InvalidAddress {
        addr: String,
        #[source]
        source: std::net::AddrParseError,
    },

    /// A `#`-prefixed path segment does not compile as a regular expression.
    #[error("invalid regex segment `#{pattern}` in route `{path}`: {source}")]
    InvalidPattern {
        path: String,
        pattern: String,
        #[source]
        source: regex::Error,
    },

    /// A router was hooked, directly or indirectly, into itself.
    #[error("router `{0}` is mounted inside itself")]
    CyclicMount(String),
}
