//! # orientwire-protocol
//!
//! Binary wire protocol (version 15) for OrientDB-style document databases.
//!
//! This crate provides:
//! - Big-endian field codec for the protocol's typed values
//! - Record decoding for full records, remote links and nulls
//! - Static command templates for every supported operation
//! - Request framing and response header / error-chain decoding

pub mod catalog;
pub mod codec;
pub mod error;
pub mod frame;
pub mod opcode;
pub mod record;
pub mod template;

pub use catalog::{Operation, ResponseShape};
pub use codec::{Decoder, Encoder, FieldKind, FieldValue};
pub use error::{ErrorChain, ProtocolError, ServerException};
pub use frame::{encode_request, ResponseHeader, ResponseStatus};
pub use opcode::Opcode;
pub use record::{FetchedRecord, Record, RecordBatch, RecordId};
pub use template::{
    Field, FieldSpec, Literal, RequestTemplate, ResponseField, ResponseFields, ResponseItem,
    ResponseTemplate, ResponseValue,
};

/// Protocol version supported by this implementation.
pub const PROTOCOL_VERSION: i16 = 15;

/// Default binary port of the server.
pub const DEFAULT_PORT: u16 = 2424;

/// Session id carried by requests before authentication.
pub const NO_SESSION: i32 = -1;

/// Largest string, bytes or list length accepted from the wire (64 MiB).
pub const MAX_FIELD_LENGTH: i32 = 64 * 1024 * 1024;
