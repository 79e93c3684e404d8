//! Operation identifiers sent as the first byte of every request.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Opcode {
    Shutdown = 1,
    Connect = 2,
    DbOpen = 3,
    DbCreate = 4,
    DbClose = 5,
    DbExist = 6,
    DbDrop = 7,
    DbSize = 8,
    DbCountRecords = 9,
    DataClusterAdd = 10,
    DataClusterDrop = 11,
    DataClusterCount = 12,
    DataClusterDataRange = 13,
    DataSegmentAdd = 20,
    DataSegmentDrop = 21,
    RecordLoad = 30,
    DbReload = 73,
}

impl Opcode {
    /// Every supported opcode, in the same order as [`Opcode::NAMES`].
    pub const ALL: [Opcode; 17] = [
        Opcode::Shutdown,
        Opcode::Connect,
        Opcode::DbOpen,
        Opcode::DbCreate,
        Opcode::DbClose,
        Opcode::DbExist,
        Opcode::DbDrop,
        Opcode::DbSize,
        Opcode::DbCountRecords,
        Opcode::DataClusterAdd,
        Opcode::DataClusterDrop,
        Opcode::DataClusterCount,
        Opcode::DataClusterDataRange,
        Opcode::DataSegmentAdd,
        Opcode::DataSegmentDrop,
        Opcode::RecordLoad,
        Opcode::DbReload,
    ];

    /// Wire names, indexed like [`Opcode::ALL`].
    pub const NAMES: [&'static str; 17] = [
        "SHUTDOWN",
        "CONNECT",
        "DB_OPEN",
        "DB_CREATE",
        "DB_CLOSE",
        "DB_EXIST",
        "DB_DROP",
        "DB_SIZE",
        "DB_COUNTRECORDS",
        "DATACLUSTER_ADD",
        "DATACLUSTER_DROP",
        "DATACLUSTER_COUNT",
        "DATACLUSTER_DATARANGE",
        "DATASEGMENT_ADD",
        "DATASEGMENT_DROP",
        "RECORD_LOAD",
        "DB_RELOAD",
    ];

    pub fn code(self) -> u8 {
        self as u8
    }

    fn index(self) -> usize {
        match self {
            Opcode::Shutdown => 0,
            Opcode::Connect => 1,
            Opcode::DbOpen => 2,
            Opcode::DbCreate => 3,
            Opcode::DbClose => 4,
            Opcode::DbExist => 5,
            Opcode::DbDrop => 6,
            Opcode::DbSize => 7,
            Opcode::DbCountRecords => 8,
            Opcode::DataClusterAdd => 9,
            Opcode::DataClusterDrop => 10,
            Opcode::DataClusterCount => 11,
            Opcode::DataClusterDataRange => 12,
            Opcode::DataSegmentAdd => 13,
            Opcode::DataSegmentDrop => 14,
            Opcode::RecordLoad => 15,
            Opcode::DbReload => 16,
        }
    }

    pub fn name(self) -> &'static str {
        Self::NAMES[self.index()]
    }

    pub fn from_code(code: u8) -> Option<Self> {
        Self::ALL.into_iter().find(|op| op.code() == code)
    }

    /// Looks up an opcode by wire name. The `_REMOVE` spellings are accepted
    /// for the cluster and segment drop operations.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "DATACLUSTER_REMOVE" => Some(Opcode::DataClusterDrop),
            "DATASEGMENT_REMOVE" => Some(Opcode::DataSegmentDrop),
            _ => Self::NAMES
                .iter()
                .position(|n| *n == name)
                .map(|i| Self::ALL[i]),
        }
    }

    /// Whether a successful response to this operation carries the session id
    /// the client must use from then on.
    pub fn authenticates(self) -> bool {
        matches!(self, Opcode::Connect | Opcode::DbOpen)
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
