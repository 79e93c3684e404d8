//! Big-endian field codec.
//!
//! Every value on the wire is one of a closed set of kinds:
//!
//! ```text
//! byte     1 byte, signed
//! short    2 bytes
//! int      4 bytes
//! long     8 bytes
//! boolean  1 byte (0 = false, anything else = true)
//! bytes    i32 length + raw bytes   (-1 = absent, 0 = empty)
//! string   i32 length + UTF-8 bytes (-1 = absent, 0 = empty)
//! list<k>  i32 count + count values of kind k
//! ```

use crate::error::ProtocolError;
use crate::MAX_FIELD_LENGTH;
use bytes::{BufMut, Bytes, BytesMut};
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use tokio::io::{AsyncRead, AsyncReadExt};

/// Wire encoding of a single field. Fields declared without a kind are strings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FieldKind {
    Byte,
    Short,
    Int,
    Long,
    Boolean,
    Bytes,
    #[default]
    String,
    List(&'static FieldKind),
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldKind::Byte => write!(f, "byte"),
            FieldKind::Short => write!(f, "short"),
            FieldKind::Int => write!(f, "int"),
            FieldKind::Long => write!(f, "long"),
            FieldKind::Boolean => write!(f, "boolean"),
            FieldKind::Bytes => write!(f, "bytes"),
            FieldKind::String => write!(f, "string"),
            FieldKind::List(inner) => write!(f, "list<{}>", inner),
        }
    }
}

/// A typed value ready to be written to, or just read from, the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Byte(i8),
    Short(i16),
    Int(i32),
    Long(i64),
    Boolean(bool),
    /// `None` is the absent value (length prefix -1).
    Bytes(Option<Bytes>),
    /// `None` is the absent value (length prefix -1).
    String(Option<String>),
    List(Vec<FieldValue>),
}

impl FieldValue {
    /// Short name of the value's kind, used in error messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            FieldValue::Byte(_) => "byte",
            FieldValue::Short(_) => "short",
            FieldValue::Int(_) => "int",
            FieldValue::Long(_) => "long",
            FieldValue::Boolean(_) => "boolean",
            FieldValue::Bytes(_) => "bytes",
            FieldValue::String(_) => "string",
            FieldValue::List(_) => "list",
        }
    }

    /// Returns whether this value can be encoded as `kind` without changing
    /// its width. List elements are checked recursively.
    pub fn matches(&self, kind: FieldKind) -> bool {
        match (kind, self) {
            (FieldKind::Byte, FieldValue::Byte(_))
            | (FieldKind::Short, FieldValue::Short(_))
            | (FieldKind::Int, FieldValue::Int(_))
            | (FieldKind::Long, FieldValue::Long(_))
            | (FieldKind::Boolean, FieldValue::Boolean(_))
            | (FieldKind::Bytes, FieldValue::Bytes(_))
            | (FieldKind::String, FieldValue::String(_)) => true,
            (FieldKind::List(inner), FieldValue::List(values)) => {
                values.iter().all(|v| v.matches(*inner))
            }
            _ => false,
        }
    }

    pub fn as_short(&self) -> Option<i16> {
        match self {
            FieldValue::Short(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i32> {
        match self {
            FieldValue::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_long(&self) -> Option<i64> {
        match self {
            FieldValue::Long(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            FieldValue::Boolean(v) => Some(*v),
            _ => None,
        }
    }
}

impl From<i8> for FieldValue {
    fn from(v: i8) -> Self {
        FieldValue::Byte(v)
    }
}

impl From<i16> for FieldValue {
    fn from(v: i16) -> Self {
        FieldValue::Short(v)
    }
}

impl From<i32> for FieldValue {
    fn from(v: i32) -> Self {
        FieldValue::Int(v)
    }
}

impl From<i64> for FieldValue {
    fn from(v: i64) -> Self {
        FieldValue::Long(v)
    }
}

impl From<bool> for FieldValue {
    fn from(v: bool) -> Self {
        FieldValue::Boolean(v)
    }
}

impl From<&str> for FieldValue {
    fn from(v: &str) -> Self {
        FieldValue::String(Some(v.to_string()))
    }
}

impl From<String> for FieldValue {
    fn from(v: String) -> Self {
        FieldValue::String(Some(v))
    }
}

impl From<Bytes> for FieldValue {
    fn from(v: Bytes) -> Self {
        FieldValue::Bytes(Some(v))
    }
}

/// Writes fields into a payload buffer.
#[derive(Debug, Default)]
pub struct Encoder {
    buf: BytesMut,
}

impl Encoder {
    pub fn new() -> Self {
        Self {
            buf: BytesMut::with_capacity(256),
        }
    }

    pub fn put_byte(&mut self, v: i8) {
        self.buf.put_i8(v);
    }

    pub fn put_short(&mut self, v: i16) {
        self.buf.put_i16(v);
    }

    pub fn put_int(&mut self, v: i32) {
        self.buf.put_i32(v);
    }

    pub fn put_long(&mut self, v: i64) {
        self.buf.put_i64(v);
    }

    pub fn put_boolean(&mut self, v: bool) {
        self.buf.put_u8(u8::from(v));
    }

    /// Writes a length-prefixed byte sequence; `None` writes the -1 prefix.
    pub fn put_bytes(&mut self, v: Option<&[u8]>) -> Result<(), ProtocolError> {
        match v {
            None => self.buf.put_i32(-1),
            Some(data) => {
                let len = i32::try_from(data.len()).map_err(|_| ProtocolError::FieldTooLarge {
                    size: i32::MAX,
                    max: i32::MAX,
                })?;
                self.buf.put_i32(len);
                self.buf.put_slice(data);
            }
        }
        Ok(())
    }

    pub fn put_string(&mut self, v: Option<&str>) -> Result<(), ProtocolError> {
        self.put_bytes(v.map(str::as_bytes))
    }

    /// Writes `value` using the encoding of `kind`.
    ///
    /// The value must already be of the declared kind; no widening or
    /// narrowing is attempted.
    pub fn put_field(
        &mut self,
        name: &str,
        kind: FieldKind,
        value: &FieldValue,
    ) -> Result<(), ProtocolError> {
        let mismatch = || ProtocolError::KindMismatch {
            field: name.to_string(),
            expected: kind,
            actual: value.kind_name(),
        };
        // Checked up front so a bad list element leaves nothing half-written.
        if !value.matches(kind) {
            return Err(mismatch());
        }

        match (kind, value) {
            (_, FieldValue::Byte(v)) => self.put_byte(*v),
            (_, FieldValue::Short(v)) => self.put_short(*v),
            (_, FieldValue::Int(v)) => self.put_int(*v),
            (_, FieldValue::Long(v)) => self.put_long(*v),
            (_, FieldValue::Boolean(v)) => self.put_boolean(*v),
            (_, FieldValue::Bytes(v)) => self.put_bytes(v.as_deref())?,
            (_, FieldValue::String(v)) => self.put_string(v.as_deref())?,
            (FieldKind::List(inner), FieldValue::List(values)) => {
                let count =
                    i32::try_from(values.len()).map_err(|_| ProtocolError::FieldTooLarge {
                        size: i32::MAX,
                        max: i32::MAX,
                    })?;
                self.put_int(count);
                for v in values {
                    self.put_field(name, *inner, v)?;
                }
            }
            (_, FieldValue::List(_)) => return Err(mismatch()),
        }
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Consumes the encoder, returning the payload.
    pub fn finish(self) -> Bytes {
        self.buf.freeze()
    }
}

type FieldFuture<'a> = Pin<Box<dyn Future<Output = Result<FieldValue, ProtocolError>> + Send + 'a>>;

/// Reads fields from a byte stream.
///
/// Every read either consumes a complete field or fails; a failure leaves the
/// stream position undefined.
#[derive(Debug)]
pub struct Decoder<R> {
    reader: R,
}

impl<R: AsyncRead + Unpin + Send> Decoder<R> {
    pub fn new(reader: R) -> Self {
        Self { reader }
    }

    pub async fn read_byte(&mut self) -> Result<i8, ProtocolError> {
        self.reader
            .read_i8()
            .await
            .map_err(|e| ProtocolError::from_read(e, "byte"))
    }

    pub async fn read_short(&mut self) -> Result<i16, ProtocolError> {
        self.reader
            .read_i16()
            .await
            .map_err(|e| ProtocolError::from_read(e, "short"))
    }

    pub async fn read_int(&mut self) -> Result<i32, ProtocolError> {
        self.reader
            .read_i32()
            .await
            .map_err(|e| ProtocolError::from_read(e, "int"))
    }

    pub async fn read_long(&mut self) -> Result<i64, ProtocolError> {
        self.reader
            .read_i64()
            .await
            .map_err(|e| ProtocolError::from_read(e, "long"))
    }

    pub async fn read_boolean(&mut self) -> Result<bool, ProtocolError> {
        let v = self
            .reader
            .read_u8()
            .await
            .map_err(|e| ProtocolError::from_read(e, "boolean"))?;
        Ok(v != 0)
    }

    /// Reads a length or count prefix. Returns `None` for the absent marker
    /// when `allow_absent` is set.
    async fn read_length(
        &mut self,
        context: &'static str,
        allow_absent: bool,
    ) -> Result<Option<usize>, ProtocolError> {
        let length = self
            .reader
            .read_i32()
            .await
            .map_err(|e| ProtocolError::from_read(e, context))?;

        match length {
            -1 if allow_absent => Ok(None),
            l if l < 0 => Err(ProtocolError::MalformedLength { length: l, context }),
            l if l > MAX_FIELD_LENGTH => Err(ProtocolError::FieldTooLarge {
                size: l,
                max: MAX_FIELD_LENGTH,
            }),
            l => Ok(Some(l as usize)),
        }
    }

    pub async fn read_bytes(&mut self) -> Result<Option<Bytes>, ProtocolError> {
        let Some(len) = self.read_length("bytes", true).await? else {
            return Ok(None);
        };
        let mut data = vec![0u8; len];
        self.reader
            .read_exact(&mut data)
            .await
            .map_err(|e| ProtocolError::from_read(e, "bytes"))?;
        Ok(Some(Bytes::from(data)))
    }

    pub async fn read_string(&mut self) -> Result<Option<String>, ProtocolError> {
        let Some(len) = self.read_length("string", true).await? else {
            return Ok(None);
        };
        let mut data = vec![0u8; len];
        self.reader
            .read_exact(&mut data)
            .await
            .map_err(|e| ProtocolError::from_read(e, "string"))?;
        String::from_utf8(data)
            .map(Some)
            .map_err(|_| ProtocolError::InvalidUtf8)
    }

    /// Reads a value of the given kind.
    pub fn read_field(&mut self, kind: FieldKind) -> FieldFuture<'_> {
        Box::pin(async move {
            let value = match kind {
                FieldKind::Byte => FieldValue::Byte(self.read_byte().await?),
                FieldKind::Short => FieldValue::Short(self.read_short().await?),
                FieldKind::Int => FieldValue::Int(self.read_int().await?),
                FieldKind::Long => FieldValue::Long(self.read_long().await?),
                FieldKind::Boolean => FieldValue::Boolean(self.read_boolean().await?),
                FieldKind::Bytes => FieldValue::Bytes(self.read_bytes().await?),
                FieldKind::String => FieldValue::String(self.read_string().await?),
                FieldKind::List(inner) => {
                    let count = self.read_length("list", false).await?.unwrap_or_default();
                    let mut values = Vec::with_capacity(count.min(1024));
                    for _ in 0..count {
                        values.push(self.read_field(*inner).await?);
                    }
                    FieldValue::List(values)
                }
            };
            Ok(value)
        })
    }
}
