// crates/boundary-core/src/model/mod.rs
pub mod record;
pub mod sql;
pub mod table;

pub use record::{BoundaryRecord, MAX_NAME_CHARS};
pub use sql::{ColumnInfo, SqlRow, SqlValue};
pub use table::BoundaryTable;
