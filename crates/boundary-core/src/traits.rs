// crates/boundary-core/src/traits.rs
use crate::error::{BoundaryError, Result};
use crate::importer::ImportEvent;
use crate::loader::encoding::{decode_first, SQL_ENCODINGS};
use crate::model::{BoundaryTable, ColumnInfo, SqlRow, SqlValue};
use std::path::Path;
use tracing::debug;

/// The database seam.
///
/// One connection, one statement at a time. Implementors supply the three
/// primitive operations; the catalog and table helpers are built on top.
///
/// Contract for implementors:
/// - every call on a disconnected client fails with
///   [`BoundaryError::Connection`];
/// - `query` is read-only and needs no commit;
/// - `execute` and `run_script` run in their own transaction, committed on
///   success and rolled back on failure ([`BoundaryError::Query`]);
/// - values in `params` are always bound, never spliced into `sql`.
pub trait SqlClient {
    fn is_connected(&self) -> bool;

    /// Runs a `SELECT`; rows come back in result order.
    fn query(&mut self, sql: &str, params: &[SqlValue]) -> Result<Vec<SqlRow>>;

    /// Runs one command and returns the affected row count.
    fn execute(&mut self, sql: &str, params: &[SqlValue]) -> Result<u64>;

    /// Runs a multi-statement script verbatim.
    fn run_script(&mut self, script: &str) -> Result<()>;

    /// Reads a SQL file (UTF-8 first, then the Korean legacy encodings) and
    /// hands it to [`SqlClient::run_script`].
    fn run_file(&mut self, path: &Path) -> Result<()> {
        if !path.exists() {
            return Err(BoundaryError::File(format!(
                "SQL file not found: {}",
                path.display()
            )));
        }
        let bytes = std::fs::read(path).map_err(|e| {
            BoundaryError::File(format!("cannot read SQL file {}: {e}", path.display()))
        })?;
        let (encoding, script) = decode_first(&bytes, &SQL_ENCODINGS, |t| Some(t.to_string()))
            .ok_or_else(|| {
                BoundaryError::File(format!("cannot decode SQL file: {}", path.display()))
            })?;
        debug!(path = %path.display(), encoding = encoding.label(), "running SQL file");
        self.run_script(&script)
    }

    fn table_exists(&mut self, name: &str) -> Result<bool> {
        let rows = self.query(
            "SELECT EXISTS (\
                SELECT FROM information_schema.tables \
                WHERE table_name = $1::text\
             ) AS found",
            &[SqlValue::from(name)],
        )?;
        Ok(rows
            .first()
            .and_then(|r| r.get("found"))
            .and_then(SqlValue::as_bool)
            .unwrap_or(false))
    }

    fn table_info(&mut self, name: &str) -> Result<Vec<ColumnInfo>> {
        let rows = self.query(
            "SELECT column_name::text AS column_name, \
                    data_type::text AS data_type, \
                    is_nullable::text AS is_nullable, \
                    column_default::text AS column_default \
             FROM information_schema.columns \
             WHERE table_name = $1::text \
             ORDER BY ordinal_position",
            &[SqlValue::from(name)],
        )?;
        Ok(rows.iter().map(ColumnInfo::from_row).collect())
    }

    fn count_rows(&mut self, table: BoundaryTable) -> Result<i64> {
        let rows = self.query(&format!("SELECT COUNT(*) AS count FROM {table}"), &[])?;
        Ok(rows.first().and_then(|r| r.get_i64("count")).unwrap_or(0))
    }

    /// Deletes every row of `table`.
    fn clear_table(&mut self, table: BoundaryTable) -> Result<u64> {
        self.execute(&format!("DELETE FROM {table}"), &[])
    }
}

/// Receives importer progress and answers the destructive-clear question.
///
/// Closures taking `&ImportEvent` implement this trait and approve every
/// clear.
pub trait ImportObserver {
    fn on_event(&mut self, event: &ImportEvent);

    /// Asked before deleting `existing` rows from `table`; `false` aborts the
    /// import.
    fn confirm_clear(&mut self, table: BoundaryTable, existing: i64) -> bool {
        let _ = (table, existing);
        true
    }
}

impl<F> ImportObserver for F
where
    F: FnMut(&ImportEvent),
{
    fn on_event(&mut self, event: &ImportEvent) {
        self(event)
    }
}

/// Observer that drops every event and approves clears.
#[derive(Debug, Default, Clone, Copy)]
pub struct Silent;

impl ImportObserver for Silent {
    fn on_event(&mut self, _event: &ImportEvent) {}
}
