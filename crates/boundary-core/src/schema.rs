// crates/boundary-core/src/schema.rs

//! Table creation from the DDL scripts under `sql/`.

use crate::error::{BoundaryError, Result};
use crate::model::{BoundaryTable, ColumnInfo};
use crate::traits::SqlClient;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::info;

/// Columns listed after a table is created.
pub const COLUMN_PREVIEW: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CreatedTable {
    pub table: BoundaryTable,
    pub script: PathBuf,
    /// Leading columns, at most [`COLUMN_PREVIEW`].
    pub columns: Vec<ColumnInfo>,
    pub total_columns: usize,
}

impl CreatedTable {
    pub fn remaining_columns(&self) -> usize {
        self.total_columns.saturating_sub(self.columns.len())
    }
}

/// Runs `table`'s default script from `sql_dir` and reads its columns back.
pub fn create_table<C: SqlClient>(
    client: &mut C,
    table: BoundaryTable,
    sql_dir: &Path,
) -> Result<CreatedTable> {
    let script = table.ddl_path(sql_dir);
    if !script.exists() {
        return Err(BoundaryError::File(format!(
            "DDL for '{table}' not found: {}",
            script.display()
        )));
    }
    create_from_file(client, table, &script)
}

/// Runs an explicit script, then checks that it produced `table`.
pub fn create_from_file<C: SqlClient>(
    client: &mut C,
    table: BoundaryTable,
    script: &Path,
) -> Result<CreatedTable> {
    info!(%table, script = %script.display(), "creating table");
    client.run_file(script)?;

    if !client.table_exists(table.as_str())? {
        return Err(BoundaryError::Query(format!(
            "script {} ran but table '{table}' does not exist",
            script.display()
        )));
    }

    let mut columns = client.table_info(table.as_str())?;
    let total_columns = columns.len();
    columns.truncate(COLUMN_PREVIEW);

    Ok(CreatedTable {
        table,
        script: script.to_path_buf(),
        columns,
        total_columns,
    })
}

/// Creates every table in [`BoundaryTable::ALL`] order, stopping at the first
/// failure.
pub fn create_all<C: SqlClient>(client: &mut C, sql_dir: &Path) -> Result<Vec<CreatedTable>> {
    BoundaryTable::ALL
        .iter()
        .map(|&table| create_table(client, table, sql_dir))
        .collect()
}
