//! Request framing and response header decoding.
//!
//! ```text
//! handshake (server -> client, once):  | version: i16 |
//!
//! request:   | opcode: u8 | session_id: i32 | [payload_len: i32 | payload] |
//! response:  | status: u8 | session_id: i32 | OK payload or error chain  |
//!
//! error chain entry:  | more: u8 | class: string | message: string |
//!                     ...terminated by more == 0
//! ```

use crate::codec::{Decoder, Encoder};
use crate::error::{ErrorChain, ProtocolError, ServerException};
use crate::opcode::Opcode;
use crate::PROTOCOL_VERSION;
use bytes::Bytes;
use tokio::io::AsyncRead;

/// Size of the request header without payload (opcode + session id).
pub const REQUEST_HEADER_SIZE: usize = 5;

/// Encodes a request. An empty payload writes no body at all.
pub fn encode_request(
    opcode: Opcode,
    session_id: i32,
    payload: &[u8],
) -> Result<Bytes, ProtocolError> {
    let mut enc = Encoder::new();
    enc.put_byte(opcode.code() as i8);
    enc.put_int(session_id);
    if !payload.is_empty() {
        enc.put_bytes(Some(payload))?;
    }
    Ok(enc.finish())
}

/// Response status byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseStatus {
    Ok,
    /// Any nonzero status byte; the raw value is kept for diagnostics.
    Error(u8),
}

impl ResponseStatus {
    pub fn from_byte(b: u8) -> Self {
        if b == 0 {
            ResponseStatus::Ok
        } else {
            ResponseStatus::Error(b)
        }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, ResponseStatus::Ok)
    }
}

/// Status and session echo that start every response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResponseHeader {
    pub status: ResponseStatus,
    pub session_id: i32,
}

impl<R: AsyncRead + Unpin + Send> Decoder<R> {
    /// Reads the server's protocol version and checks it against
    /// [`PROTOCOL_VERSION`].
    pub async fn read_handshake(&mut self) -> Result<i16, ProtocolError> {
        let version = self.read_short().await?;
        if version != PROTOCOL_VERSION {
            return Err(ProtocolError::IncompatibleProtocolVersion {
                expected: PROTOCOL_VERSION,
                actual: version,
            });
        }
        Ok(version)
    }

    pub async fn read_response_header(&mut self) -> Result<ResponseHeader, ProtocolError> {
        let status = ResponseStatus::from_byte(self.read_byte().await? as u8);
        let session_id = self.read_int().await?;
        Ok(ResponseHeader { status, session_id })
    }

    /// Drains the error chain that follows an ERROR header.
    pub async fn read_error_chain(&mut self) -> Result<ErrorChain, ProtocolError> {
        let mut chain = ErrorChain::new();
        while self.read_byte().await? != 0 {
            let class = self.read_string().await?;
            let message = self.read_string().await?;
            chain.push(ServerException { class, message });
        }
        Ok(chain)
    }
}
