//! Command templates.
//!
//! Every operation declares its request as a static, ordered list of named
//! fields with a kind and a default, and its response as an ordered list of
//! named fields to read back. Callers override request values by name; the
//! declared kind of a field never changes.

use crate::codec::{Decoder, Encoder, FieldKind, FieldValue};
use crate::error::ProtocolError;
use bytes::Bytes;
use tokio::io::AsyncRead;

/// Default value of a request field, usable in `const` tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Literal {
    Byte(i8),
    Short(i16),
    Int(i32),
    Long(i64),
    Boolean(bool),
    Str(&'static str),
    /// The -1 length marker for strings and bytes.
    Absent,
    EmptyList,
}

impl Literal {
    /// Materializes the literal for a field of the given kind.
    pub fn to_value(self, kind: FieldKind) -> FieldValue {
        match self {
            Literal::Byte(v) => FieldValue::Byte(v),
            Literal::Short(v) => FieldValue::Short(v),
            Literal::Int(v) => FieldValue::Int(v),
            Literal::Long(v) => FieldValue::Long(v),
            Literal::Boolean(v) => FieldValue::Boolean(v),
            Literal::Str(s) if kind == FieldKind::Bytes => {
                FieldValue::Bytes(Some(Bytes::from_static(s.as_bytes())))
            }
            Literal::Str(s) => FieldValue::String(Some(s.to_string())),
            Literal::Absent if kind == FieldKind::Bytes => FieldValue::Bytes(None),
            Literal::Absent => FieldValue::String(None),
            Literal::EmptyList => FieldValue::List(Vec::new()),
        }
    }
}

/// Declaration of one request field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub kind: FieldKind,
    pub default: Literal,
}

impl FieldSpec {
    pub const fn new(name: &'static str, kind: FieldKind, default: Literal) -> Self {
        Self {
            name,
            kind,
            default,
        }
    }

    /// A string field, the kind used when none is given.
    pub const fn string(name: &'static str, default: &'static str) -> Self {
        Self::new(name, FieldKind::String, Literal::Str(default))
    }
}

/// A request field with its final value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    pub name: &'static str,
    pub kind: FieldKind,
    pub value: FieldValue,
}

/// Ordered request fields of one operation.
#[derive(Debug, Clone, Copy)]
pub struct RequestTemplate {
    fields: &'static [FieldSpec],
}

impl RequestTemplate {
    pub const fn new(fields: &'static [FieldSpec]) -> Self {
        Self { fields }
    }

    pub const EMPTY: RequestTemplate = RequestTemplate::new(&[]);

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Applies named overrides to the defaults, keeping declaration order.
    /// Override names that match no field are ignored.
    pub fn build(&self, overrides: &[(&str, FieldValue)]) -> Vec<Field> {
        for (name, _) in overrides {
            if !self.fields.iter().any(|spec| spec.name == *name) {
                tracing::warn!("ignoring override for undeclared field '{}'", name);
            }
        }

        self.fields
            .iter()
            .map(|spec| {
                let value = overrides
                    .iter()
                    .rev()
                    .find(|(name, _)| *name == spec.name)
                    .map(|(_, value)| value.clone())
                    .unwrap_or_else(|| spec.default.to_value(spec.kind));
                Field {
                    name: spec.name,
                    kind: spec.kind,
                    value,
                }
            })
            .collect()
    }

    /// Builds and encodes the request payload.
    pub fn encode(&self, overrides: &[(&str, FieldValue)]) -> Result<Bytes, ProtocolError> {
        let mut enc = Encoder::new();
        for field in self.build(overrides) {
            enc.put_field(field.name, field.kind, &field.value)?;
        }
        Ok(enc.finish())
    }
}

/// A named field to read from a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResponseField {
    pub name: &'static str,
    pub kind: FieldKind,
}

/// One element of a response template.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseItem {
    Field(ResponseField),
    /// An i16 row count followed by that many rows of `columns`.
    Table {
        name: &'static str,
        columns: &'static [ResponseField],
    },
}

impl ResponseItem {
    pub const fn field(name: &'static str, kind: FieldKind) -> Self {
        ResponseItem::Field(ResponseField { name, kind })
    }

    pub const fn table(name: &'static str, columns: &'static [ResponseField]) -> Self {
        ResponseItem::Table { name, columns }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponseValue {
    Field(FieldValue),
    Table(Vec<ResponseFields>),
}

/// Decoded response fields, in declaration order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResponseFields {
    entries: Vec<(&'static str, ResponseValue)>,
}

impl ResponseFields {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, name: &'static str, value: ResponseValue) {
        self.entries.push((name, value));
    }

    pub fn get(&self, name: &str) -> Option<&ResponseValue> {
        self.entries
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, v)| v)
    }

    pub fn field(&self, name: &str) -> Option<&FieldValue> {
        match self.get(name)? {
            ResponseValue::Field(v) => Some(v),
            ResponseValue::Table(_) => None,
        }
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.entries.iter().map(|(n, _)| *n)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn short(&self, name: &'static str) -> Result<i16, ProtocolError> {
        self.field(name)
            .and_then(FieldValue::as_short)
            .ok_or(ProtocolError::MissingField(name))
    }

    pub fn int(&self, name: &'static str) -> Result<i32, ProtocolError> {
        self.field(name)
            .and_then(FieldValue::as_int)
            .ok_or(ProtocolError::MissingField(name))
    }

    pub fn long(&self, name: &'static str) -> Result<i64, ProtocolError> {
        self.field(name)
            .and_then(FieldValue::as_long)
            .ok_or(ProtocolError::MissingField(name))
    }

    pub fn boolean(&self, name: &'static str) -> Result<bool, ProtocolError> {
        self.field(name)
            .and_then(FieldValue::as_bool)
            .ok_or(ProtocolError::MissingField(name))
    }

    /// A string field; `Ok(None)` when the server sent the absent marker.
    pub fn string(&self, name: &'static str) -> Result<Option<&str>, ProtocolError> {
        match self.field(name) {
            Some(FieldValue::String(s)) => Ok(s.as_deref()),
            _ => Err(ProtocolError::MissingField(name)),
        }
    }

    /// A bytes field; `Ok(None)` when the server sent the absent marker.
    pub fn bytes(&self, name: &'static str) -> Result<Option<&Bytes>, ProtocolError> {
        match self.field(name) {
            Some(FieldValue::Bytes(b)) => Ok(b.as_ref()),
            _ => Err(ProtocolError::MissingField(name)),
        }
    }

    pub fn table(&self, name: &'static str) -> Result<&[ResponseFields], ProtocolError> {
        match self.get(name) {
            Some(ResponseValue::Table(rows)) => Ok(rows),
            _ => Err(ProtocolError::MissingField(name)),
        }
    }
}

/// Ordered response fields of one operation.
#[derive(Debug, Clone, Copy)]
pub struct ResponseTemplate {
    items: &'static [ResponseItem],
}

impl ResponseTemplate {
    pub const fn new(items: &'static [ResponseItem]) -> Self {
        Self { items }
    }

    pub const EMPTY: ResponseTemplate = ResponseTemplate::new(&[]);

    /// Reads every declared item. Nothing is returned unless all of them
    /// decode.
    pub async fn decode<R: AsyncRead + Unpin + Send>(
        &self,
        dec: &mut Decoder<R>,
    ) -> Result<ResponseFields, ProtocolError> {
        let mut fields = ResponseFields::new();
        for item in self.items {
            match item {
                ResponseItem::Field(f) => {
                    let value = dec.read_field(f.kind).await?;
                    fields.push(f.name, ResponseValue::Field(value));
                }
                ResponseItem::Table { name, columns } => {
                    let count = dec.read_short().await?;
                    if count < 0 {
                        return Err(ProtocolError::MalformedLength {
                            length: count.into(),
                            context: "table",
                        });
                    }
                    let mut rows = Vec::with_capacity(count as usize);
                    for _ in 0..count {
                        let mut row = ResponseFields::new();
                        for column in *columns {
                            let value = dec.read_field(column.kind).await?;
                            row.push(column.name, ResponseValue::Field(value));
                        }
                        rows.push(row);
                    }
                    fields.push(*name, ResponseValue::Table(rows));
                }
            }
        }
        Ok(fields)
    }
}
