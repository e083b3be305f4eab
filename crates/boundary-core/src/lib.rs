// crates/boundary-core/src/lib.rs

pub mod aggregate; // District → county/province unions
pub mod analysis; // Offline GeoJSON statistics
pub mod common;
pub mod config;
pub mod db; // The PostgreSQL client
pub mod error;
pub mod importer;
pub mod loader; // The public loader
pub mod model;
pub mod processor;
pub mod schema;
pub mod traits;
pub mod verify;

// Re-exports
pub use crate::error::{BoundaryError, Result, ValidationError, ValidationFailure};
pub use crate::common::{ImportReport, ProcessorStats};
pub use crate::config::DbConfig;
pub use crate::db::DatabaseClient;
pub use crate::loader::{GeoJsonDocument, GeoJsonLoader};
pub use crate::processor::FeatureProcessor;
pub use crate::importer::{BoundaryImporter, ImportEvent, ImportMode, ImportOptions};
pub use crate::aggregate::{AggregateEvent, AggregateLevel, AggregateReport, Aggregator};
pub use model::{BoundaryRecord, BoundaryTable, ColumnInfo, SqlRow, SqlValue};
// Export the seams (crucial for tests and custom front-ends)
pub use crate::traits::{ImportObserver, Silent, SqlClient};
