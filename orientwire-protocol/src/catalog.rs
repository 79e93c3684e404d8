//! Static operation catalog.
//!
//! Each supported operation is an opcode, a request template and a
//! description of how its OK payload is laid out.

use crate::codec::FieldKind;
use crate::opcode::Opcode;
use crate::template::{
    FieldSpec, Literal, RequestTemplate, ResponseField, ResponseItem, ResponseTemplate,
};
use crate::PROTOCOL_VERSION;

/// Driver name sent with CONNECT and DB_OPEN.
pub const DRIVER_NAME: &str = "orientwire";

/// Driver version sent with CONNECT and DB_OPEN.
pub const DRIVER_VERSION: &str = env!("CARGO_PKG_VERSION");

/// How the OK payload of an operation is decoded.
#[derive(Debug, Clone, Copy)]
pub enum ResponseShape {
    /// The server sends no response at all.
    None,
    /// A flat list of fields, possibly empty.
    Fields(ResponseTemplate),
    /// Status-flagged record entries terminated by a zero byte.
    Records,
}

#[derive(Debug, Clone, Copy)]
pub struct Operation {
    pub opcode: Opcode,
    pub request: RequestTemplate,
    pub response: ResponseShape,
}

impl Operation {
    const fn new(opcode: Opcode, request: RequestTemplate, response: ResponseShape) -> Self {
        Self {
            opcode,
            request,
            response,
        }
    }
}

const NO_FIELDS: ResponseShape = ResponseShape::Fields(ResponseTemplate::EMPTY);

const fn short(name: &'static str) -> FieldSpec {
    FieldSpec::new(name, FieldKind::Short, Literal::Short(0))
}

const fn required(name: &'static str) -> FieldSpec {
    FieldSpec::string(name, "")
}

/// Columns of the cluster table returned by DB_OPEN and DB_RELOAD.
pub const CLUSTER_COLUMNS: &[ResponseField] = &[
    ResponseField {
        name: "cluster-name",
        kind: FieldKind::String,
    },
    ResponseField {
        name: "cluster-id",
        kind: FieldKind::Short,
    },
    ResponseField {
        name: "cluster-type",
        kind: FieldKind::String,
    },
    ResponseField {
        name: "cluster-datasegment-id",
        kind: FieldKind::Short,
    },
];

pub const SHUTDOWN: Operation = Operation::new(
    Opcode::Shutdown,
    RequestTemplate::new(&[required("user-name"), required("user-password")]),
    NO_FIELDS,
);

pub const CONNECT: Operation = Operation::new(
    Opcode::Connect,
    RequestTemplate::new(&[
        FieldSpec::string("driver-name", DRIVER_NAME),
        FieldSpec::string("driver-version", DRIVER_VERSION),
        FieldSpec::new(
            "protocol-version",
            FieldKind::Short,
            Literal::Short(PROTOCOL_VERSION),
        ),
        FieldSpec::new("client-id", FieldKind::String, Literal::Absent),
        required("user-name"),
        required("user-password"),
    ]),
    ResponseShape::Fields(ResponseTemplate::new(&[ResponseItem::field(
        "session-id",
        FieldKind::Int,
    )])),
);

pub const DB_OPEN: Operation = Operation::new(
    Opcode::DbOpen,
    RequestTemplate::new(&[
        FieldSpec::string("driver-name", DRIVER_NAME),
        FieldSpec::string("driver-version", DRIVER_VERSION),
        FieldSpec::new(
            "protocol-version",
            FieldKind::Short,
            Literal::Short(PROTOCOL_VERSION),
        ),
        FieldSpec::new("client-id", FieldKind::String, Literal::Absent),
        required("database-name"),
        FieldSpec::string("database-type", "document"),
        required("user-name"),
        required("user-password"),
    ]),
    ResponseShape::Fields(ResponseTemplate::new(&[
        ResponseItem::field("session-id", FieldKind::Int),
        ResponseItem::table("clusters", CLUSTER_COLUMNS),
        ResponseItem::field("cluster-config", FieldKind::Bytes),
        ResponseItem::field("release", FieldKind::String),
    ])),
);

pub const DB_CREATE: Operation = Operation::new(
    Opcode::DbCreate,
    RequestTemplate::new(&[
        required("database-name"),
        FieldSpec::string("database-type", "document"),
        FieldSpec::string("storage-type", "local"),
    ]),
    NO_FIELDS,
);

pub const DB_CLOSE: Operation =
    Operation::new(Opcode::DbClose, RequestTemplate::EMPTY, ResponseShape::None);

pub const DB_EXIST: Operation = Operation::new(
    Opcode::DbExist,
    RequestTemplate::new(&[required("database-name")]),
    ResponseShape::Fields(ResponseTemplate::new(&[ResponseItem::field(
        "result",
        FieldKind::Boolean,
    )])),
);

pub const DB_DROP: Operation = Operation::new(
    Opcode::DbDrop,
    RequestTemplate::new(&[required("database-name")]),
    NO_FIELDS,
);

pub const DB_SIZE: Operation = Operation::new(
    Opcode::DbSize,
    RequestTemplate::EMPTY,
    ResponseShape::Fields(ResponseTemplate::new(&[ResponseItem::field(
        "size",
        FieldKind::Long,
    )])),
);

pub const DB_COUNTRECORDS: Operation = Operation::new(
    Opcode::DbCountRecords,
    RequestTemplate::EMPTY,
    ResponseShape::Fields(ResponseTemplate::new(&[ResponseItem::field(
        "count",
        FieldKind::Long,
    )])),
);

pub const DATACLUSTER_ADD: Operation = Operation::new(
    Opcode::DataClusterAdd,
    RequestTemplate::new(&[
        FieldSpec::string("type", "PHYSICAL"),
        required("name"),
        FieldSpec::new("location", FieldKind::String, Literal::Absent),
        FieldSpec::new("datasegment-name", FieldKind::String, Literal::Absent),
    ]),
    ResponseShape::Fields(ResponseTemplate::new(&[ResponseItem::field(
        "new-cluster",
        FieldKind::Short,
    )])),
);

pub const DATACLUSTER_DROP: Operation = Operation::new(
    Opcode::DataClusterDrop,
    RequestTemplate::new(&[short("cluster-number")]),
    ResponseShape::Fields(ResponseTemplate::new(&[ResponseItem::field(
        "delete-on-clientside",
        FieldKind::Boolean,
    )])),
);

pub const DATACLUSTER_COUNT: Operation = Operation::new(
    Opcode::DataClusterCount,
    RequestTemplate::new(&[FieldSpec::new(
        "cluster-ids",
        FieldKind::List(&FieldKind::Short),
        Literal::EmptyList,
    )]),
    ResponseShape::Fields(ResponseTemplate::new(&[ResponseItem::field(
        "records-in-clusters",
        FieldKind::Long,
    )])),
);

pub const DATACLUSTER_DATARANGE: Operation = Operation::new(
    Opcode::DataClusterDataRange,
    RequestTemplate::new(&[short("cluster-number")]),
    ResponseShape::Fields(ResponseTemplate::new(&[
        ResponseItem::field("begin", FieldKind::Long),
        ResponseItem::field("end", FieldKind::Long),
    ])),
);

pub const DATASEGMENT_ADD: Operation = Operation::new(
    Opcode::DataSegmentAdd,
    RequestTemplate::new(&[
        required("datasegment-name"),
        FieldSpec::new("datasegment-location", FieldKind::String, Literal::Absent),
    ]),
    ResponseShape::Fields(ResponseTemplate::new(&[ResponseItem::field(
        "datasegment-id",
        FieldKind::Int,
    )])),
);

pub const DATASEGMENT_DROP: Operation = Operation::new(
    Opcode::DataSegmentDrop,
    RequestTemplate::new(&[required("datasegment-name")]),
    ResponseShape::Fields(ResponseTemplate::new(&[ResponseItem::field(
        "succeeded",
        FieldKind::Boolean,
    )])),
);

pub const RECORD_LOAD: Operation = Operation::new(
    Opcode::RecordLoad,
    RequestTemplate::new(&[
        short("cluster-id"),
        FieldSpec::new("cluster-position", FieldKind::Long, Literal::Long(0)),
        FieldSpec::string("fetch-plan", ""),
        FieldSpec::new("ignore-cache", FieldKind::Boolean, Literal::Boolean(false)),
    ]),
    ResponseShape::Records,
);

pub const DB_RELOAD: Operation = Operation::new(
    Opcode::DbReload,
    RequestTemplate::EMPTY,
    ResponseShape::Fields(ResponseTemplate::new(&[ResponseItem::table(
        "clusters",
        CLUSTER_COLUMNS,
    )])),
);

/// Every catalog entry, in opcode order.
pub const ALL: [&Operation; 17] = [
    &SHUTDOWN,
    &CONNECT,
    &DB_OPEN,
    &DB_CREATE,
    &DB_CLOSE,
    &DB_EXIST,
    &DB_DROP,
    &DB_SIZE,
    &DB_COUNTRECORDS,
    &DATACLUSTER_ADD,
    &DATACLUSTER_DROP,
    &DATACLUSTER_COUNT,
    &DATACLUSTER_DATARANGE,
    &DATASEGMENT_ADD,
    &DATASEGMENT_DROP,
    &RECORD_LOAD,
    &DB_RELOAD,
];
