//! Record decoding.
//!
//! A record reference on the wire starts with an i16 discriminant:
//!
//! ```text
//!  0  full record:  | class: byte | cluster: short | position: long | version: int | content: bytes |
//! -2  null
//! -3  remote link:  | cluster: short | position: long |
//! ```
//!
//! RECORD_LOAD responses use a different, flag-driven layout; see
//! [`Decoder::read_record_batch`].

use crate::codec::Decoder;
use crate::error::ProtocolError;
use bytes::Bytes;
use serde::Serialize;
use std::fmt;
use tokio::io::AsyncRead;

pub const RECORD_FULL: i16 = 0;
pub const RECORD_NULL: i16 = -2;
pub const RECORD_REMOTE_LINK: i16 = -3;

/// Payload status bytes of a RECORD_LOAD response.
pub const PAYLOAD_END: i8 = 0;
pub const PAYLOAD_RECORD: i8 = 1;
pub const PAYLOAD_PREFETCHED: i8 = 2;

/// Record identifier: cluster plus position within the cluster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct RecordId {
    pub cluster_id: i16,
    pub cluster_position: i64,
}

impl RecordId {
    pub fn new(cluster_id: i16, cluster_position: i64) -> Self {
        Self {
            cluster_id,
            cluster_position,
        }
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}:{}", self.cluster_id, self.cluster_position)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Record {
    Full {
        record_class: i8,
        rid: RecordId,
        version: i32,
        content: Option<Bytes>,
    },
    RemoteLink { rid: RecordId },
    Null,
}

impl Record {
    pub fn rid(&self) -> Option<RecordId> {
        match self {
            Record::Full { rid, .. } | Record::RemoteLink { rid } => Some(*rid),
            Record::Null => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Record::Null)
    }
}

/// A record entry of a RECORD_LOAD response. The entry carries no RID; it is
/// the record that was asked for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FetchedRecord {
    pub content: Option<Bytes>,
    pub version: i32,
    pub record_class: i8,
}

/// Everything a RECORD_LOAD response returned.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RecordBatch {
    /// Records loaded by the request, in wire order.
    pub records: Vec<FetchedRecord>,
    /// Related records the fetch plan pulled in.
    pub prefetched: Vec<Record>,
}

impl<R: AsyncRead + Unpin + Send> Decoder<R> {
    pub async fn read_record(&mut self) -> Result<Record, ProtocolError> {
        match self.read_short().await? {
            RECORD_FULL => {
                let record_class = self.read_byte().await?;
                let cluster_id = self.read_short().await?;
                let cluster_position = self.read_long().await?;
                let version = self.read_int().await?;
                let content = self.read_bytes().await?;
                Ok(Record::Full {
                    record_class,
                    rid: RecordId::new(cluster_id, cluster_position),
                    version,
                    content,
                })
            }
            RECORD_NULL => Ok(Record::Null),
            RECORD_REMOTE_LINK => {
                let cluster_id = self.read_short().await?;
                let cluster_position = self.read_long().await?;
                Ok(Record::RemoteLink {
                    rid: RecordId::new(cluster_id, cluster_position),
                })
            }
            other => Err(ProtocolError::UnknownRecordVariant(other)),
        }
    }

    /// Reads record entries until the end-of-payload status byte.
    ///
    /// A status of 1 is followed by `content, version, record_class`, which is
    /// not the field order of [`Decoder::read_record`]. A status of 2 is
    /// followed by a discriminated record.
    pub async fn read_record_batch(&mut self) -> Result<RecordBatch, ProtocolError> {
        let mut batch = RecordBatch::default();
        loop {
            match self.read_byte().await? {
                PAYLOAD_END => return Ok(batch),
                PAYLOAD_RECORD => {
                    let content = self.read_bytes().await?;
                    let version = self.read_int().await?;
                    let record_class = self.read_byte().await?;
                    batch.records.push(FetchedRecord {
                        content,
                        version,
                        record_class,
                    });
                }
                PAYLOAD_PREFETCHED => batch.prefetched.push(self.read_record().await?),
                other => return Err(ProtocolError::UnknownPayloadStatus(other)),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_record_bytes() -> Vec<u8> {
        let mut b = vec![0x00, 0x00]; // discriminant 0
        b.push(1); // record class
        b.extend(5i16.to_be_bytes());
        b.extend(42i64.to_be_bytes());
        b.extend(3i32.to_be_bytes());
        b.extend(4i32.to_be_bytes());
        b.extend_from_slice(b"abcd");
        b
    }

    async fn decode(bytes: &[u8]) -> Result<Record, ProtocolError> {
        let mut slice = bytes;
        Decoder::new(&mut slice).read_record().await
    }

    #[tokio::test]
    async fn test_full_record() {
        let record = decode(&full_record_bytes()).await.unwrap();
        assert_eq!(
            record,
            Record::Full {
                record_class: 1,
                rid: RecordId::new(5, 42),
                version: 3,
                content: Some(Bytes::from_static(b"abcd")),
            }
        );
        assert_eq!(record.rid().unwrap().to_string(), "#5:42");
    }

    #[tokio::test]
    async fn test_null_record() {
        let record = decode(&[0xFF, 0xFE]).await.unwrap();
        assert!(record.is_null());
        assert_eq!(record.rid(), None);
    }

    #[tokio::test]
    async fn test_remote_link() {
        let mut b = vec![0xFF, 0xFD];
        b.extend(5i16.to_be_bytes());
        b.extend(42i64.to_be_bytes());
        let record = decode(&b).await.unwrap();
        assert_eq!(
            record,
            Record::RemoteLink {
                rid: RecordId::new(5, 42)
            }
        );
    }

    #[tokio::test]
    async fn test_unknown_variant() {
        let err = decode(&[0x00, 0x07]).await.unwrap_err();
        assert!(matches!(err, ProtocolError::UnknownRecordVariant(7)));
    }

    #[tokio::test]
    async fn test_truncated_full_record() {
        let bytes = full_record_bytes();
        let err = decode(&bytes[..bytes.len() - 2]).await.unwrap_err();
        assert!(matches!(err, ProtocolError::PrematureEof { .. }));
    }

    #[tokio::test]
    async fn test_record_batch_field_order() {
        let mut b = vec![PAYLOAD_RECORD as u8];
        b.extend(2i32.to_be_bytes());
        b.extend_from_slice(b"hi");
        b.extend(9i32.to_be_bytes());
        b.push(b'd');
        b.push(PAYLOAD_PREFETCHED as u8);
        b.extend(full_record_bytes());
        b.push(PAYLOAD_RECORD as u8);
        b.extend((-1i32).to_be_bytes());
        b.extend(1i32.to_be_bytes());
        b.push(b'b');
        b.push(PAYLOAD_END as u8);

        let mut slice: &[u8] = &b;
        let batch = Decoder::new(&mut slice)
            .read_record_batch()
            .await
            .unwrap();
        assert!(slice.is_empty());

        assert_eq!(
            batch.records,
            vec![
                FetchedRecord {
                    content: Some(Bytes::from_static(b"hi")),
                    version: 9,
                    record_class: b'd' as i8,
                },
                FetchedRecord {
                    content: None,
                    version: 1,
                    record_class: b'b' as i8,
                },
            ]
        );
        assert_eq!(batch.prefetched.len(), 1);
        assert_eq!(batch.prefetched[0].rid(), Some(RecordId::new(5, 42)));
    }

    #[tokio::test]
    async fn test_empty_record_batch() {
        let mut slice: &[u8] = &[0];
        let batch = Decoder::new(&mut slice)
            .read_record_batch()
            .await
            .unwrap();
        assert_eq!(batch, RecordBatch::default());
    }

    #[tokio::test]
    async fn test_unknown_payload_status() {
        let mut slice: &[u8] = &[5];
        let err = Decoder::new(&mut slice)
            .read_record_batch()
            .await
            .unwrap_err();
        assert!(matches!(err, ProtocolError::UnknownPayloadStatus(5)));
    }
}
