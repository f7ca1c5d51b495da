//! Server errors.

use thiserror::Error;

/// Errors that stop the server from running.
///
/// Per-request failures never surface here; they become HTTP responses.
#[derive(Debug, Error)]
pub enum ServerError {
    /// `http_addr` is not a socket address.
    #[error("invalid listen address '{addr}'")]
    InvalidAddress {
        /// The configured value.
        addr: String,
    },

    /// The listener could not be bound.
    #[error("failed to bind to {addr}")]
    Bind {
        /// Address we tried to bind.
        addr: String,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// Listener I/O failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
