use serde::{Deserialize, Serialize};

pub mod backend;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod filter;
pub mod filter_cache;
pub mod grid;
pub mod models;
pub mod record;
pub mod sort;
pub mod spec;
pub mod sync;
pub mod transport;
pub mod value;

pub use config::ClientConfig;
pub use error::{ConfigurationError, SyncError, TransportError, ValidationError};
pub use filter::{FilterState, FilterValue, MatchMode, Operator};
pub use filter_cache::{FilterCommand, FilterController};
pub use grid::GridModel;
pub use record::{Record, RecordCache};
pub use spec::{FieldKind, FieldSpec, ModelSpec, SelectItem};
pub use value::Value;

/// Position of a field in its ModelSpec.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
pub struct ColumnUid(pub u32);

/// Locally assigned, stable for the lifetime of a cached record.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct RowUid(pub u32);

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct CellCoord {
    pub row_uid: RowUid,
    pub col_uid: ColumnUid,
}

impl From<(RowUid, ColumnUid)> for CellCoord {
    fn from(value: (RowUid, ColumnUid)) -> Self {
        CellCoord {
            row_uid: value.0,
            col_uid: value.1,
        }
    }
}

impl From<(RowUid, &ColumnUid)> for CellCoord {
    fn from(value: (RowUid, &ColumnUid)) -> Self {
        CellCoord {
            row_uid: value.0,
            col_uid: *value.1,
        }
    }
}
