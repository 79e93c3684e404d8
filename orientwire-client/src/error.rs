//! Client error types.

use orientwire_protocol::{ErrorChain, ProtocolError};
use thiserror::Error;

/// Client errors.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("connection error: {0}")]
    Io(#[from] std::io::Error),

    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    #[error("server error: {0}")]
    Server(ErrorChain),

    #[error("request timeout")]
    Timeout,

    #[error("not connected")]
    NotConnected,

    #[error("already connected")]
    AlreadyConnected,

    #[error("session faulted; open a new connection")]
    Faulted,

    #[error("session closed")]
    SessionClosed,
}

impl ClientError {
    /// Returns whether the failure happened at the transport level (socket
    /// I/O, truncated stream or timeout) rather than in the server.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            ClientError::Io(_)
                | ClientError::Timeout
                | ClientError::Protocol(ProtocolError::Io(_))
                | ClientError::Protocol(ProtocolError::PrematureEof { .. })
        )
    }

    /// Returns whether the server answered with an error chain.
    pub fn is_server_error(&self) -> bool {
        matches!(self, ClientError::Server(_))
    }

    /// The server's error chain, if this is a server error.
    pub fn error_chain(&self) -> Option<&ErrorChain> {
        match self {
            ClientError::Server(chain) => Some(chain),
            _ => None,
        }
    }

    /// Returns whether this error leaves the byte stream at an unknown
    /// position, making the session unusable.
    ///
    /// A server error is not fatal: its error chain has been read in full.
    /// Encoding errors are raised before anything is written.
    pub(crate) fn desynchronizes(&self) -> bool {
        match self {
            ClientError::Io(_) | ClientError::Timeout => true,
            ClientError::Protocol(ProtocolError::KindMismatch { .. }) => false,
            ClientError::Protocol(_) => true,
            ClientError::Server(_)
            | ClientError::NotConnected
            | ClientError::AlreadyConnected
            | ClientError::Faulted
            | ClientError::SessionClosed => false,
        }
    }
}
