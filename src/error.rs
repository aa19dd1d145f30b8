//! Error taxonomy for the router. Most kinds are logged and swallowed by the
//! dispatcher; a handful are fatal at startup only (see
//! [`RouterError::is_fatal`]).

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RouterError {
    #[error("malformed dotted-quad address: {0}")]
    MalformedAddress(String),

    #[error("malformed network/mask pair: {0}")]
    MalformedPrefix(String),

    #[error("malformed message body: {0}")]
    MalformedMessage(String),

    #[error("unknown message type: {0}")]
    UnknownMessageType(String),

    #[error("bad command-line argument: {0}")]
    BadArgument(String),

    #[error("failed to bind transport socket: {0}")]
    BindFailed(String),
}

impl RouterError {
    /// Startup errors are fatal (non-zero exit); everything encountered once
    /// the poll loop is running is logged and the dispatcher moves on to the
    /// next datagram.
    pub fn is_fatal(&self) -> bool {
        matches!(self, RouterError::BadArgument(_) | RouterError::BindFailed(_))
    }
}
