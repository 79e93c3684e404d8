//! Connection management and session state.

use crate::error::ClientError;
use orientwire_protocol::catalog::{self, Operation, ResponseShape};
use orientwire_protocol::{
    encode_request, Decoder, FieldValue, RecordBatch, ResponseFields, ResponseStatus, NO_SESSION,
};
use std::fmt;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt, BufStream};

/// Default host.
pub const DEFAULT_HOST: &str = "localhost";

/// Connection configuration.
#[derive(Clone)]
pub struct ConnectionConfig {
    /// Server host name or address.
    pub host: String,
    /// Server port.
    pub port: u16,
    /// User name for CONNECT, DB_OPEN and SHUTDOWN.
    pub user: String,
    /// Password for CONNECT, DB_OPEN and SHUTDOWN.
    pub password: String,
    /// Connection timeout (TCP connect plus handshake).
    pub connect_timeout: Duration,
    /// Request timeout (one full request/response exchange).
    pub request_timeout: Duration,
    /// Client id sent when authenticating. Absent if not set.
    pub client_id: Option<String>,
}

impl ConnectionConfig {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            user: String::new(),
            password: String::new(),
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
            client_id: None,
        }
    }

    pub fn with_credentials(mut self, user: impl Into<String>, password: impl Into<String>) -> Self {
        self.user = user.into();
        self.password = password.into();
        self
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_client_id(mut self, client_id: impl Into<String>) -> Self {
        self.client_id = Some(client_id.into());
        self
    }

    /// `host:port`, as passed to the resolver.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self::new(DEFAULT_HOST, orientwire_protocol::DEFAULT_PORT)
    }
}

impl fmt::Debug for ConnectionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("connect_timeout", &self.connect_timeout)
            .field("request_timeout", &self.request_timeout)
            .field("client_id", &self.client_id)
            .finish()
    }
}

/// Lifecycle of a session.
///
/// ```text
/// Disconnected -> HandshakeInFlight -> Ready -> Authenticated -> Closed
///                                        \           \
///                                         +-----------+--> Faulted
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Disconnected,
    HandshakeInFlight,
    Ready,
    Authenticated,
    Closed,
    Faulted,
}

impl SessionState {
    /// Every state, indexed like [`SessionState::NAMES`].
    pub const ALL: [SessionState; 6] = [
        SessionState::Disconnected,
        SessionState::HandshakeInFlight,
        SessionState::Ready,
        SessionState::Authenticated,
        SessionState::Closed,
        SessionState::Faulted,
    ];

    pub const NAMES: [&'static str; 6] = [
        "DISCONNECTED",
        "HANDSHAKE_IN_FLIGHT",
        "READY",
        "AUTHENTICATED",
        "CLOSED",
        "FAULTED",
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn name(self) -> &'static str {
        Self::NAMES[self.index()]
    }

    pub fn from_index(i: usize) -> Option<Self> {
        Self::ALL.get(i).copied()
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::NAMES
            .iter()
            .position(|n| *n == name)
            .map(|i| Self::ALL[i])
    }

    /// Whether requests may be sent in this state.
    pub fn accepts_requests(self) -> bool {
        matches!(self, SessionState::Ready | SessionState::Authenticated)
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Decoded OK payload of one operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponseBody {
    /// The operation has no response.
    None,
    Fields(ResponseFields),
    Records(RecordBatch),
}

impl ResponseBody {
    pub fn into_fields(self) -> ResponseFields {
        match self {
            ResponseBody::Fields(fields) => fields,
            _ => ResponseFields::new(),
        }
    }

    pub fn into_records(self) -> RecordBatch {
        match self {
            ResponseBody::Records(batch) => batch,
            _ => RecordBatch::default(),
        }
    }
}

/// A single session with a server.
///
/// The connection owns its stream and performs one request/response exchange
/// at a time; exclusive access is enforced by `&mut self`. Any I/O or decode
/// failure moves it to [`SessionState::Faulted`] and releases the stream.
pub struct Connection<S> {
    stream: Option<BufStream<S>>,
    state: SessionState,
    session_id: i32,
    protocol_version: Option<i16>,
}

impl<S: AsyncRead + AsyncWrite + Unpin + Send> Connection<S> {
    /// Creates a connection with no stream attached.
    pub fn new() -> Self {
        Self {
            stream: None,
            state: SessionState::Disconnected,
            session_id: NO_SESSION,
            protocol_version: None,
        }
    }

    /// Attaches a freshly opened stream. The handshake has not been read yet.
    pub fn attach(&mut self, stream: S) {
        self.stream = Some(BufStream::new(stream));
        self.state = SessionState::Disconnected;
        self.session_id = NO_SESSION;
        self.protocol_version = None;
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Current session id; -1 until authenticated.
    pub fn session_id(&self) -> i32 {
        self.session_id
    }

    /// Protocol version announced by the server, once the handshake is done.
    pub fn protocol_version(&self) -> Option<i16> {
        self.protocol_version
    }

    /// Reads the server's version announcement.
    pub async fn handshake(&mut self) -> Result<i16, ClientError> {
        self.check_disconnected()?;
        let stream = self.stream.as_mut().ok_or(ClientError::NotConnected)?;

        self.state = SessionState::HandshakeInFlight;
        match Decoder::new(stream).read_handshake().await {
            Ok(version) => {
                tracing::debug!("Handshake complete, protocol version {}", version);
                self.protocol_version = Some(version);
                self.session_id = NO_SESSION;
                self.state = SessionState::Ready;
                Ok(version)
            }
            Err(e) => {
                tracing::debug!("Handshake failed: {}", e);
                self.fault();
                Err(e.into())
            }
        }
    }

    /// Sends one operation and reads its full response.
    pub async fn call(
        &mut self,
        op: &Operation,
        overrides: &[(&str, FieldValue)],
    ) -> Result<ResponseBody, ClientError> {
        self.check_ready()?;

        // Encoding failures happen before anything is written.
        let payload = op.request.encode(overrides)?;

        match self.exchange(op, &payload).await {
            Err(e) if e.desynchronizes() => {
                tracing::debug!("{} failed, faulting session: {}", op.opcode, e);
                self.fault();
                Err(e)
            }
            other => other,
        }
    }

    /// Fails unless no handshake has been attempted on this connection.
    pub(crate) fn check_disconnected(&self) -> Result<(), ClientError> {
        match self.state {
            SessionState::Disconnected => Ok(()),
            SessionState::Faulted => Err(ClientError::Faulted),
            SessionState::Closed => Err(ClientError::SessionClosed),
            SessionState::HandshakeInFlight
            | SessionState::Ready
            | SessionState::Authenticated => Err(ClientError::AlreadyConnected),
        }
    }

    fn check_ready(&self) -> Result<(), ClientError> {
        match self.state {
            SessionState::Ready | SessionState::Authenticated => Ok(()),
            SessionState::Faulted => Err(ClientError::Faulted),
            SessionState::Closed => Err(ClientError::SessionClosed),
            SessionState::Disconnected | SessionState::HandshakeInFlight => {
                Err(ClientError::NotConnected)
            }
        }
    }

    async fn exchange(&mut self, op: &Operation, payload: &[u8]) -> Result<ResponseBody, ClientError> {
        let stream = self.stream.as_mut().ok_or(ClientError::NotConnected)?;

        let frame = encode_request(op.opcode, self.session_id, payload)?;
        tracing::debug!(
            "Sending {} (session {}, {} bytes)",
            op.opcode,
            self.session_id,
            frame.len()
        );
        stream.write_all(&frame).await?;
        stream.flush().await?;

        if let ResponseShape::None = op.response {
            return Ok(ResponseBody::None);
        }

        let mut dec = Decoder::new(stream);
        let header = dec.read_response_header().await?;
        if header.session_id != self.session_id {
            tracing::warn!(
                "{} response echoed session {}, expected {}",
                op.opcode,
                header.session_id,
                self.session_id
            );
        }

        if let ResponseStatus::Error(status) = header.status {
            let chain = dec.read_error_chain().await?;
            tracing::debug!("{} failed with status {}: {}", op.opcode, status, chain);
            return Err(ClientError::Server(chain));
        }

        let body = match op.response {
            ResponseShape::Fields(template) => ResponseBody::Fields(template.decode(&mut dec).await?),
            ResponseShape::Records => ResponseBody::Records(dec.read_record_batch().await?),
            ResponseShape::None => ResponseBody::None,
        };
        tracing::debug!("{} completed", op.opcode);

        if op.opcode.authenticates() {
            if let ResponseBody::Fields(fields) = &body {
                self.authenticate(fields.int("session-id")?);
            }
        }

        Ok(body)
    }

    /// Records the session id of the first successful authentication.
    fn authenticate(&mut self, session_id: i32) {
        match self.state {
            SessionState::Ready => {
                tracing::debug!("Session id is now {}", session_id);
                self.session_id = session_id;
                self.state = SessionState::Authenticated;
            }
            _ if session_id != self.session_id => {
                tracing::warn!(
                    "Keeping session {}, ignoring session {} from a later authentication",
                    self.session_id,
                    session_id
                );
            }
            _ => {}
        }
    }

    /// Drops the stream and marks the session unusable.
    pub fn fault(&mut self) {
        self.stream = None;
        self.state = SessionState::Faulted;
    }

    /// Sends DB_CLOSE and releases the stream, whatever the outcome.
    pub async fn close(&mut self) -> Result<(), ClientError> {
        tracing::debug!("Closing connection...");

        let result = if self.state.accepts_requests() {
            self.call(&catalog::DB_CLOSE, &[]).await.map(|_| ())
        } else {
            Ok(())
        };

        if let Some(mut stream) = self.stream.take() {
            let _ = stream.shutdown().await;
        }
        if self.state != SessionState::Faulted {
            self.state = SessionState::Closed;
        }

        tracing::debug!("Connection closed");
        result
    }
}

impl<S: AsyncRead + AsyncWrite + Unpin + Send> Default for Connection<S> {
    fn default() -> Self {
        Self::new()
    }
}
