//! High-level client API.

use crate::connection::{Connection, ConnectionConfig, ResponseBody, SessionState};
use crate::error::ClientError;
use bytes::Bytes;
use orientwire_protocol::catalog::{self, Operation};
use orientwire_protocol::{FieldValue, RecordBatch, RecordId, ResponseFields};
use serde::Serialize;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;
use tokio::sync::Mutex;

/// Result of DB_OPEN.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DatabaseInfo {
    pub session_id: i32,
    pub clusters: Vec<ClusterInfo>,
    pub cluster_config: Option<Bytes>,
    pub release: Option<String>,
}

/// One row of the cluster table returned by DB_OPEN and DB_RELOAD.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClusterInfo {
    pub name: Option<String>,
    pub id: i16,
    pub cluster_type: Option<String>,
    pub datasegment_id: i16,
}

impl ClusterInfo {
    fn from_row(row: &ResponseFields) -> Result<Self, ClientError> {
        Ok(Self {
            name: row.string("cluster-name")?.map(str::to_string),
            id: row.short("cluster-id")?,
            cluster_type: row.string("cluster-type")?.map(str::to_string),
            datasegment_id: row.short("cluster-datasegment-id")?,
        })
    }

    fn from_table(fields: &ResponseFields) -> Result<Vec<Self>, ClientError> {
        fields
            .table("clusters")?
            .iter()
            .map(ClusterInfo::from_row)
            .collect()
    }
}

/// First and last position of a cluster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DataRange {
    pub begin: i64,
    pub end: i64,
}

fn string(value: &str) -> FieldValue {
    FieldValue::String(Some(value.to_string()))
}

fn optional(value: Option<&str>) -> FieldValue {
    FieldValue::String(value.map(str::to_string))
}

/// A client holding one session.
///
/// Requests are serialized: concurrent callers queue on an async mutex and
/// each caller gets its own full response.
pub struct Client<S = TcpStream> {
    conn: Mutex<Connection<S>>,
    config: ConnectionConfig,
}

impl Client<TcpStream> {
    /// Creates a client. Call [`Client::connect`] before sending requests.
    pub fn new(config: ConnectionConfig) -> Self {
        Self {
            conn: Mutex::new(Connection::new()),
            config,
        }
    }

    /// Opens the TCP connection and reads the server's handshake.
    pub async fn connect(&self) -> Result<i16, ClientError> {
        let addr = self.config.addr();
        {
            let mut conn = self.conn.lock().await;
            conn.check_disconnected()?;

            tracing::debug!("Connecting to {}...", addr);
            let stream = tokio::time::timeout(self.config.connect_timeout, TcpStream::connect(&addr))
                .await
                .map_err(|_| {
                    tracing::debug!("Connection timeout");
                    ClientError::Timeout
                })?
                .map_err(|e| {
                    tracing::debug!("Connection failed: {}", e);
                    ClientError::Io(e)
                })?;
            stream.set_nodelay(true).ok();
            conn.attach(stream);
        }

        self.handshake().await
    }
}

impl<S: AsyncRead + AsyncWrite + Unpin + Send> Client<S> {
    /// Wraps an already open stream. Call [`Client::handshake`] next.
    pub fn from_stream(config: ConnectionConfig, stream: S) -> Self {
        let mut conn = Connection::new();
        conn.attach(stream);
        Self {
            conn: Mutex::new(conn),
            config,
        }
    }

    pub fn config(&self) -> &ConnectionConfig {
        &self.config
    }

    pub async fn state(&self) -> SessionState {
        self.conn.lock().await.state()
    }

    pub async fn session_id(&self) -> i32 {
        self.conn.lock().await.session_id()
    }

    /// Reads the version announcement, bounded by the connect timeout.
    pub async fn handshake(&self) -> Result<i16, ClientError> {
        let mut conn = self.conn.lock().await;
        match tokio::time::timeout(self.config.connect_timeout, conn.handshake()).await {
            Ok(result) => result,
            Err(_) => {
                tracing::debug!("Handshake timeout");
                conn.fault();
                Err(ClientError::Timeout)
            }
        }
    }

    /// Sends one catalog operation, bounded by the request timeout.
    ///
    /// A timeout faults the session: the response may still arrive and would
    /// be read as the answer to the next request.
    pub async fn call(
        &self,
        op: &Operation,
        overrides: &[(&str, FieldValue)],
    ) -> Result<ResponseBody, ClientError> {
        let mut conn = self.conn.lock().await;
        match tokio::time::timeout(self.config.request_timeout, conn.call(op, overrides)).await {
            Ok(result) => result,
            Err(_) => {
                tracing::debug!("{} timed out", op.opcode);
                conn.fault();
                Err(ClientError::Timeout)
            }
        }
    }

    async fn fields(
        &self,
        op: &Operation,
        overrides: &[(&str, FieldValue)],
    ) -> Result<ResponseFields, ClientError> {
        Ok(self.call(op, overrides).await?.into_fields())
    }

    fn credentials(&self) -> Vec<(&'static str, FieldValue)> {
        let mut overrides = vec![
            ("user-name", string(&self.config.user)),
            ("user-password", string(&self.config.password)),
        ];
        if let Some(client_id) = &self.config.client_id {
            overrides.push(("client-id", string(client_id)));
        }
        overrides
    }

    // =========================================================================
    // Server operations
    // =========================================================================

    /// Authenticates against the server. Returns the session id.
    pub async fn connect_server(&self) -> Result<i32, ClientError> {
        let fields = self.fields(&catalog::CONNECT, &self.credentials()).await?;
        Ok(fields.int("session-id")?)
    }

    pub async fn shutdown_server(&self) -> Result<(), ClientError> {
        self.fields(&catalog::SHUTDOWN, &self.credentials()).await?;
        Ok(())
    }

    pub async fn database_exists(&self, name: &str) -> Result<bool, ClientError> {
        let fields = self
            .fields(&catalog::DB_EXIST, &[("database-name", string(name))])
            .await?;
        Ok(fields.boolean("result")?)
    }

    /// Creates a database. `None` keeps the default type (`document`) or
    /// storage (`local`).
    pub async fn create_database(
        &self,
        name: &str,
        database_type: Option<&str>,
        storage_type: Option<&str>,
    ) -> Result<(), ClientError> {
        let mut overrides = vec![("database-name", string(name))];
        if let Some(database_type) = database_type {
            overrides.push(("database-type", string(database_type)));
        }
        if let Some(storage_type) = storage_type {
            overrides.push(("storage-type", string(storage_type)));
        }
        self.fields(&catalog::DB_CREATE, &overrides).await?;
        Ok(())
    }

    pub async fn drop_database(&self, name: &str) -> Result<(), ClientError> {
        self.fields(&catalog::DB_DROP, &[("database-name", string(name))])
            .await?;
        Ok(())
    }

    // =========================================================================
    // Database operations
    // =========================================================================

    /// Opens a database and authenticates the session against it.
    pub async fn open_database(&self, name: &str) -> Result<DatabaseInfo, ClientError> {
        let mut overrides = self.credentials();
        overrides.push(("database-name", string(name)));

        let fields = self.fields(&catalog::DB_OPEN, &overrides).await?;
        Ok(DatabaseInfo {
            session_id: fields.int("session-id")?,
            clusters: ClusterInfo::from_table(&fields)?,
            cluster_config: fields.bytes("cluster-config")?.cloned(),
            release: fields.string("release")?.map(str::to_string),
        })
    }

    /// Sends DB_CLOSE and releases the connection, bounded by the request
    /// timeout.
    pub async fn close(&self) -> Result<(), ClientError> {
        let mut conn = self.conn.lock().await;
        match tokio::time::timeout(self.config.request_timeout, conn.close()).await {
            Ok(result) => result,
            Err(_) => {
                tracing::debug!("Close timed out");
                conn.fault();
                Err(ClientError::Timeout)
            }
        }
    }

    pub async fn database_size(&self) -> Result<i64, ClientError> {
        Ok(self.fields(&catalog::DB_SIZE, &[]).await?.long("size")?)
    }

    pub async fn count_records(&self) -> Result<i64, ClientError> {
        Ok(self
            .fields(&catalog::DB_COUNTRECORDS, &[])
            .await?
            .long("count")?)
    }

    pub async fn reload_database(&self) -> Result<Vec<ClusterInfo>, ClientError> {
        let fields = self.fields(&catalog::DB_RELOAD, &[]).await?;
        ClusterInfo::from_table(&fields)
    }

    /// Adds a cluster and returns its id. `None` for `cluster_type` means
    /// `PHYSICAL`.
    pub async fn add_cluster(
        &self,
        name: &str,
        cluster_type: Option<&str>,
        location: Option<&str>,
        datasegment: Option<&str>,
    ) -> Result<i16, ClientError> {
        let mut overrides = vec![
            ("name", string(name)),
            ("location", optional(location)),
            ("datasegment-name", optional(datasegment)),
        ];
        if let Some(cluster_type) = cluster_type {
            overrides.push(("type", string(cluster_type)));
        }
        let fields = self.fields(&catalog::DATACLUSTER_ADD, &overrides).await?;
        Ok(fields.short("new-cluster")?)
    }

    /// Drops a cluster. Returns whether the client should drop its own copy.
    pub async fn drop_cluster(&self, cluster_id: i16) -> Result<bool, ClientError> {
        let fields = self
            .fields(
                &catalog::DATACLUSTER_DROP,
                &[("cluster-number", FieldValue::Short(cluster_id))],
            )
            .await?;
        Ok(fields.boolean("delete-on-clientside")?)
    }

    /// Counts the records stored in the given clusters.
    pub async fn cluster_record_count(&self, cluster_ids: &[i16]) -> Result<i64, ClientError> {
        let ids = cluster_ids.iter().copied().map(FieldValue::Short).collect();
        let fields = self
            .fields(
                &catalog::DATACLUSTER_COUNT,
                &[("cluster-ids", FieldValue::List(ids))],
            )
            .await?;
        Ok(fields.long("records-in-clusters")?)
    }

    pub async fn cluster_data_range(&self, cluster_id: i16) -> Result<DataRange, ClientError> {
        let fields = self
            .fields(
                &catalog::DATACLUSTER_DATARANGE,
                &[("cluster-number", FieldValue::Short(cluster_id))],
            )
            .await?;
        Ok(DataRange {
            begin: fields.long("begin")?,
            end: fields.long("end")?,
        })
    }

    pub async fn add_datasegment(
        &self,
        name: &str,
        location: Option<&str>,
    ) -> Result<i32, ClientError> {
        let fields = self
            .fields(
                &catalog::DATASEGMENT_ADD,
                &[
                    ("datasegment-name", string(name)),
                    ("datasegment-location", optional(location)),
                ],
            )
            .await?;
        Ok(fields.int("datasegment-id")?)
    }

    pub async fn drop_datasegment(&self, name: &str) -> Result<bool, ClientError> {
        let fields = self
            .fields(
                &catalog::DATASEGMENT_DROP,
                &[("datasegment-name", string(name))],
            )
            .await?;
        Ok(fields.boolean("succeeded")?)
    }

    /// Loads a record plus whatever the fetch plan pulls in.
    pub async fn load_record(
        &self,
        rid: RecordId,
        fetch_plan: &str,
        ignore_cache: bool,
    ) -> Result<RecordBatch, ClientError> {
        let body = self
            .call(
                &catalog::RECORD_LOAD,
                &[
                    ("cluster-id", FieldValue::Short(rid.cluster_id)),
                    ("cluster-position", FieldValue::Long(rid.cluster_position)),
                    ("fetch-plan", string(fetch_plan)),
                    ("ignore-cache", FieldValue::Boolean(ignore_cache)),
                ],
            )
            .await?;
        Ok(body.into_records())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use orientwire_protocol::{encode_request, Opcode, ProtocolError};
    use std::time::Duration;
    use tokio::io::AsyncWriteExt;
    use tokio_test::io::{Builder, Mock};

    const HANDSHAKE: [u8; 2] = [0x00, 0x0F];

    fn string_bytes(s: &str) -> Vec<u8> {
        let mut out = (s.len() as i32).to_be_bytes().to_vec();
        out.extend_from_slice(s.as_bytes());
        out
    }

    fn ok_header(session_id: i32) -> Vec<u8> {
        let mut out = vec![0];
        out.extend(session_id.to_be_bytes());
        out
    }

    fn config() -> ConnectionConfig {
        ConnectionConfig::default().with_credentials("admin", "admin")
    }

    async fn client(mock: Mock) -> Client<Mock> {
        let client = Client::from_stream(config(), mock);
        assert_eq!(client.handshake().await.unwrap(), 15);
        client
    }

    fn db_open_request() -> Vec<u8> {
        let payload = catalog::DB_OPEN
            .request
            .encode(&[
                ("database-name", "demo".into()),
                ("user-name", "admin".into()),
                ("user-password", "admin".into()),
            ])
            .unwrap();
        encode_request(Opcode::DbOpen, -1, &payload).unwrap().to_vec()
    }

    fn db_open_response(session_id: i32) -> Vec<u8> {
        let mut b = ok_header(-1);
        b.extend(session_id.to_be_bytes());
        b.extend(1i16.to_be_bytes());
        b.extend(string_bytes("default"));
        b.extend(3i16.to_be_bytes());
        b.extend(string_bytes("PHYSICAL"));
        b.extend(0i16.to_be_bytes());
        b.extend((-1i32).to_be_bytes());
        b.extend(string_bytes("1.0"));
        b
    }

    #[test]
    fn test_client_creation() {
        let client = Client::new(ConnectionConfig::new("db.local", 2424));
        assert_eq!(client.config().addr(), "db.local:2424");
    }

    #[tokio::test]
    async fn test_handshake_mismatch_faults_client() {
        let client = Client::from_stream(config(), Builder::new().read(&[0x00, 0x0E]).build());
        let err = client.handshake().await.unwrap_err();
        assert!(matches!(
            err,
            ClientError::Protocol(ProtocolError::IncompatibleProtocolVersion { actual: 14, .. })
        ));
        assert_eq!(client.state().await, SessionState::Faulted);
    }

    #[tokio::test]
    async fn test_open_database_sets_session_for_later_requests() {
        let mock = Builder::new()
            .read(&HANDSHAKE)
            .write(&db_open_request())
            .read(&db_open_response(99))
            .write(&[8, 0, 0, 0, 99])
            .read(&ok_header(99))
            .read(&1024i64.to_be_bytes())
            .build();
        let client = client(mock).await;

        let info = client.open_database("demo").await.unwrap();
        assert_eq!(info.session_id, 99);
        assert_eq!(
            info.clusters,
            vec![ClusterInfo {
                name: Some("default".to_string()),
                id: 3,
                cluster_type: Some("PHYSICAL".to_string()),
                datasegment_id: 0,
            }]
        );
        assert_eq!(info.cluster_config, None);
        assert_eq!(info.release.as_deref(), Some("1.0"));
        assert_eq!(client.state().await, SessionState::Authenticated);
        assert_eq!(client.session_id().await, 99);

        assert_eq!(client.database_size().await.unwrap(), 1024);
    }

    #[tokio::test]
    async fn test_unknown_record_variant_faults() {
        let mut request = vec![30, 0xFF, 0xFF, 0xFF, 0xFF];
        let payload = catalog::RECORD_LOAD
            .request
            .encode(&[
                ("cluster-id", FieldValue::Short(5)),
                ("cluster-position", FieldValue::Long(42)),
                ("fetch-plan", "*:-1".into()),
            ])
            .unwrap();
        request.extend((payload.len() as i32).to_be_bytes());
        request.extend_from_slice(&payload);

        let mut response = ok_header(-1);
        response.push(2);
        response.extend(7i16.to_be_bytes());

        let mock = Builder::new()
            .read(&HANDSHAKE)
            .write(&request)
            .read(&response)
            .build();
        let client = client(mock).await;

        let err = client
            .load_record(RecordId::new(5, 42), "*:-1", false)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ClientError::Protocol(ProtocolError::UnknownRecordVariant(7))
        ));
        assert_eq!(client.state().await, SessionState::Faulted);
        assert!(matches!(
            client.database_size().await,
            Err(ClientError::Faulted)
        ));
    }

    #[tokio::test]
    async fn test_load_record() {
        let mut response = ok_header(-1);
        response.push(1);
        response.extend(string_bytes("hi"));
        response.extend(4i32.to_be_bytes());
        response.push(b'd');
        response.push(0);

        let payload = catalog::RECORD_LOAD
            .request
            .encode(&[
                ("cluster-id", FieldValue::Short(1)),
                ("cluster-position", FieldValue::Long(0)),
            ])
            .unwrap();
        let request = encode_request(Opcode::RecordLoad, -1, &payload).unwrap();

        let mock = Builder::new()
            .read(&HANDSHAKE)
            .write(&request)
            .read(&response)
            .build();
        let client = client(mock).await;

        let batch = client
            .load_record(RecordId::new(1, 0), "", false)
            .await
            .unwrap();
        assert_eq!(batch.records.len(), 1);
        assert_eq!(batch.records[0].version, 4);
        assert_eq!(batch.records[0].content.as_deref(), Some(&b"hi"[..]));
        assert!(batch.prefetched.is_empty());
    }

    #[tokio::test]
    async fn test_concurrent_calls_are_serialized() {
        let mock = Builder::new()
            .read(&HANDSHAKE)
            .write(&[8, 0xFF, 0xFF, 0xFF, 0xFF])
            .read(&ok_header(-1))
            .read(&7i64.to_be_bytes())
            .write(&[8, 0xFF, 0xFF, 0xFF, 0xFF])
            .read(&ok_header(-1))
            .read(&9i64.to_be_bytes())
            .build();
        let client = client(mock).await;

        let (a, b) = tokio::join!(client.database_size(), client.database_size());
        let mut sizes = vec![a.unwrap(), b.unwrap()];
        sizes.sort();
        assert_eq!(sizes, vec![7, 9]);
    }

    #[tokio::test]
    async fn test_server_error_keeps_session() {
        let mut response = vec![1, 0xFF, 0xFF, 0xFF, 0xFF];
        response.push(1);
        response.extend(string_bytes("com.orientechnologies.StorageException"));
        response.extend(string_bytes("database 'x' does not exist"));
        response.push(0);

        let payload = catalog::DB_DROP
            .request
            .encode(&[("database-name", "x".into())])
            .unwrap();
        let request = encode_request(Opcode::DbDrop, -1, &payload).unwrap();

        let mock = Builder::new()
            .read(&HANDSHAKE)
            .write(&request)
            .read(&response)
            .build();
        let client = client(mock).await;

        let err = client.drop_database("x").await.unwrap_err();
        assert!(err.is_server_error());
        assert!(err.to_string().contains("does not exist"));
        assert_eq!(client.state().await, SessionState::Ready);
    }

    #[tokio::test]
    async fn test_request_timeout_faults() {
        let (near, mut far) = tokio::io::duplex(256);
        far.write_all(&HANDSHAKE).await.unwrap();

        let config = config().with_request_timeout(Duration::from_millis(50));
        let client = Client::from_stream(config, near);
        client.handshake().await.unwrap();

        let err = client.database_size().await.unwrap_err();
        assert!(matches!(err, ClientError::Timeout));
        assert_eq!(client.state().await, SessionState::Faulted);
        assert!(matches!(
            client.count_records().await,
            Err(ClientError::Faulted)
        ));
        drop(far);
    }

    #[tokio::test]
    async fn test_close_timeout_faults() {
        // The peer never drains its side, so the DB_CLOSE write blocks.
        let (near, mut far) = tokio::io::duplex(2);
        far.write_all(&HANDSHAKE).await.unwrap();

        let config = config().with_request_timeout(Duration::from_millis(50));
        let client = Client::from_stream(config, near);
        client.handshake().await.unwrap();

        let err = client.close().await.unwrap_err();
        assert!(matches!(err, ClientError::Timeout));
        assert_eq!(client.state().await, SessionState::Faulted);
        drop(far);
    }

    #[tokio::test]
    async fn test_handshake_after_close() {
        let mock = Builder::new()
            .read(&HANDSHAKE)
            .write(&[5, 0xFF, 0xFF, 0xFF, 0xFF])
            .build();
        let client = client(mock).await;

        client.close().await.unwrap();
        assert!(matches!(
            client.handshake().await,
            Err(ClientError::SessionClosed)
        ));
    }

    const NULL: [u8; 4] = [0xFF; 4];

    fn request(opcode: u8, session_id: i32, payload: &[u8]) -> Vec<u8> {
        let mut out = vec![opcode];
        out.extend(session_id.to_be_bytes());
        if !payload.is_empty() {
            out.extend((payload.len() as i32).to_be_bytes());
            out.extend_from_slice(payload);
        }
        out
    }

    fn strings(values: &[&str]) -> Vec<u8> {
        values.iter().flat_map(|v| string_bytes(v)).collect()
    }

    #[tokio::test]
    async fn test_server_operations_wire_format() {
        let mut connect = strings(&["orientwire", catalog::DRIVER_VERSION]);
        connect.extend([0, 15]);
        connect.extend(NULL);
        connect.extend(strings(&["admin", "admin"]));
        let mut connect_reply = ok_header(-1);
        connect_reply.extend(42i32.to_be_bytes());

        let create = strings(&["demo", "document", "memory"]);

        let mut exists_reply = ok_header(42);
        exists_reply.push(1);

        let mock = Builder::new()
            .read(&HANDSHAKE)
            .write(&request(2, -1, &connect))
            .read(&connect_reply)
            .write(&request(6, 42, &string_bytes("demo")))
            .read(&exists_reply)
            .write(&request(4, 42, &create))
            .read(&ok_header(42))
            .write(&request(1, 42, &strings(&["admin", "admin"])))
            .read(&ok_header(42))
            .build();
        let client = client(mock).await;

        assert_eq!(client.connect_server().await.unwrap(), 42);
        assert_eq!(client.session_id().await, 42);
        assert!(client.database_exists("demo").await.unwrap());
        client
            .create_database("demo", None, Some("memory"))
            .await
            .unwrap();
        client.shutdown_server().await.unwrap();
    }

    #[tokio::test]
    async fn test_reload_database_wire_format() {
        let mut reply = ok_header(-1);
        reply.extend(2i16.to_be_bytes());
        reply.extend(string_bytes("internal"));
        reply.extend(0i16.to_be_bytes());
        reply.extend(string_bytes("PHYSICAL"));
        reply.extend(0i16.to_be_bytes());
        reply.extend(NULL);
        reply.extend(5i16.to_be_bytes());
        reply.extend(NULL);
        reply.extend((-1i16).to_be_bytes());

        let mock = Builder::new()
            .read(&HANDSHAKE)
            .write(&[73, 0xFF, 0xFF, 0xFF, 0xFF])
            .read(&reply)
            .build();
        let client = client(mock).await;

        let clusters = client.reload_database().await.unwrap();
        assert_eq!(
            clusters,
            vec![
                ClusterInfo {
                    name: Some("internal".to_string()),
                    id: 0,
                    cluster_type: Some("PHYSICAL".to_string()),
                    datasegment_id: 0,
                },
                ClusterInfo {
                    name: None,
                    id: 5,
                    cluster_type: None,
                    datasegment_id: -1,
                },
            ]
        );
    }

    #[tokio::test]
    async fn test_cluster_operations_wire_format() {
        let mut add = strings(&["PHYSICAL", "logs"]);
        add.extend(NULL);
        add.extend(NULL);
        let mut add_reply = ok_header(-1);
        add_reply.extend(7i16.to_be_bytes());

        let mut drop_reply = ok_header(-1);
        drop_reply.push(1);

        let mut count_reply = ok_header(-1);
        count_reply.extend(120i64.to_be_bytes());

        let mut range_reply = ok_header(-1);
        range_reply.extend(0i64.to_be_bytes());
        range_reply.extend(41i64.to_be_bytes());

        let mock = Builder::new()
            .read(&HANDSHAKE)
            .write(&request(10, -1, &add))
            .read(&add_reply)
            .write(&[11, 0xFF, 0xFF, 0xFF, 0xFF, 0, 0, 0, 2, 0, 7])
            .read(&drop_reply)
            .write(&[
                12, 0xFF, 0xFF, 0xFF, 0xFF, 0, 0, 0, 8, 0, 0, 0, 2, 0, 3, 0, 4,
            ])
            .read(&count_reply)
            .write(&[13, 0xFF, 0xFF, 0xFF, 0xFF, 0, 0, 0, 2, 0, 3])
            .read(&range_reply)
            .build();
        let client = client(mock).await;

        assert_eq!(client.add_cluster("logs", None, None, None).await.unwrap(), 7);
        assert!(client.drop_cluster(7).await.unwrap());
        assert_eq!(client.cluster_record_count(&[3, 4]).await.unwrap(), 120);
        assert_eq!(
            client.cluster_data_range(3).await.unwrap(),
            DataRange { begin: 0, end: 41 }
        );
    }

    #[tokio::test]
    async fn test_datasegment_operations_wire_format() {
        let mut add = string_bytes("seg");
        add.extend(NULL);
        let mut add_reply = ok_header(-1);
        add_reply.extend(2i32.to_be_bytes());

        let mut drop_reply = ok_header(-1);
        drop_reply.push(0);

        let mock = Builder::new()
            .read(&HANDSHAKE)
            .write(&request(20, -1, &add))
            .read(&add_reply)
            .write(&request(21, -1, &string_bytes("seg")))
            .read(&drop_reply)
            .build();
        let client = client(mock).await;

        assert_eq!(client.add_datasegment("seg", None).await.unwrap(), 2);
        assert!(!client.drop_datasegment("seg").await.unwrap());
    }

    #[test]
    fn test_results_serialize() {
        let range = serde_json::to_value(DataRange { begin: 0, end: 4 }).unwrap();
        assert_eq!(range, serde_json::json!({"begin": 0, "end": 4}));
    }
}
