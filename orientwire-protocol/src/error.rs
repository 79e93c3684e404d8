//! Protocol error types and the server error chain.

use crate::codec::FieldKind;
use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Protocol-level errors raised while encoding or decoding the byte stream.
///
/// Any decode error leaves the stream at an unknown position, so callers must
/// treat the owning session as unusable once one is returned.
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("premature end of stream while reading {context}")]
    PrematureEof { context: &'static str },

    #[error("malformed length prefix {length} for {context}")]
    MalformedLength { length: i32, context: &'static str },

    #[error("field too large: {size} bytes (max {max})")]
    FieldTooLarge { size: i32, max: i32 },

    #[error("incompatible protocol version: server speaks {actual}, client supports {expected}")]
    IncompatibleProtocolVersion { expected: i16, actual: i16 },

    #[error("unknown record variant {0}")]
    UnknownRecordVariant(i16),

    #[error("unknown payload status {0}")]
    UnknownPayloadStatus(i8),

    #[error("invalid UTF-8 in string field")]
    InvalidUtf8,

    #[error("field '{field}' declared as {expected} but given a {actual} value")]
    KindMismatch {
        field: String,
        expected: FieldKind,
        actual: &'static str,
    },

    #[error("missing response field: {0}")]
    MissingField(&'static str),
}

impl ProtocolError {
    /// Maps a reader error, turning an unexpected EOF into `PrematureEof`.
    pub(crate) fn from_read(err: std::io::Error, context: &'static str) -> Self {
        if err.kind() == std::io::ErrorKind::UnexpectedEof {
            ProtocolError::PrematureEof { context }
        } else {
            ProtocolError::Io(err)
        }
    }
}

/// One `(exception class, message)` pair of an error response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServerException {
    pub class: Option<String>,
    pub message: Option<String>,
}

impl ServerException {
    pub fn new(class: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            class: Some(class.into()),
            message: Some(message.into()),
        }
    }
}

impl fmt::Display for ServerException {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {}",
            self.class.as_deref().unwrap_or("<unknown>"),
            self.message.as_deref().unwrap_or("")
        )
    }
}

/// Ordered exceptions decoded from an ERROR response, in wire order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ErrorChain(Vec<ServerException>);

impl ErrorChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, exception: ServerException) {
        self.0.push(exception);
    }

    pub fn entries(&self) -> &[ServerException] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// The outermost exception, which the server writes first.
    pub fn first(&self) -> Option<&ServerException> {
        self.0.first()
    }
}

impl FromIterator<ServerException> for ErrorChain {
    fn from_iter<I: IntoIterator<Item = ServerException>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl fmt::Display for ErrorChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return write!(f, "<empty error chain>");
        }
        for (i, exception) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, " <- ")?;
            }
            write!(f, "{}", exception)?;
        }
        Ok(())
    }
}
