// crates/boundary-core/src/db.rs

//! PostgreSQL/PostGIS implementation of [`SqlClient`].

use crate::config::DbConfig;
use crate::error::{describe_pg, BoundaryError, Result};
use crate::model::{SqlRow, SqlValue};
use crate::traits::SqlClient;
use postgres::error::Severity;
use postgres::types::{ToSql, Type};
use postgres::{Client, NoTls, Row, Transaction};
use tracing::{debug, info, warn};

/// A single synchronous connection with explicit connect/disconnect.
pub struct DatabaseClient {
    config: DbConfig,
    client: Option<Client>,
}

impl DatabaseClient {
    pub fn new(config: DbConfig) -> Self {
        Self {
            config,
            client: None,
        }
    }

    /// Reads [`DbConfig::from_env`] and connects in one step.
    pub fn connect_from_env() -> Result<Self> {
        let mut db = Self::new(DbConfig::from_env()?);
        db.connect()?;
        Ok(db)
    }

    pub fn config(&self) -> &DbConfig {
        &self.config
    }

    pub fn connect(&mut self) -> Result<()> {
        if self.client.is_some() {
            return Ok(());
        }
        let client = self
            .config
            .to_pg_config()
            .connect(NoTls)
            .map_err(|e| BoundaryError::Connection(format!("connect failed: {e}")))?;
        info!(host = %self.config.host, database = %self.config.database, "database connected");
        self.client = Some(client);
        Ok(())
    }

    pub fn disconnect(&mut self) {
        if let Some(client) = self.client.take() {
            if let Err(e) = client.close() {
                warn!(error = %e, "error while closing connection");
            }
            debug!("database disconnected");
        }
    }

    fn conn(&mut self) -> Result<&mut Client> {
        self.client
            .as_mut()
            .ok_or_else(|| BoundaryError::Connection("not connected to the database".into()))
    }

    /// Maps a driver error. A closed session drops the client, so every
    /// later call fails with [`BoundaryError::Connection`] as well.
    fn driver_failure(&mut self, action: &str, e: postgres::Error) -> BoundaryError {
        let closed = e.is_closed()
            || ends_session(&e)
            || self.client.as_ref().map_or(true, Client::is_closed);
        if closed && self.client.take().is_some() {
            warn!(error = %e, "server closed the connection");
        }
        classify(action, &describe_pg(&e), closed)
    }
}

impl Drop for DatabaseClient {
    fn drop(&mut self) {
        self.disconnect();
    }
}

impl SqlClient for DatabaseClient {
    fn is_connected(&self) -> bool {
        self.client.is_some()
    }

    fn query(&mut self, sql: &str, params: &[SqlValue]) -> Result<Vec<SqlRow>> {
        let bound = bind(params);
        let refs = as_refs(&bound);
        let outcome = self.conn()?.query(sql, &refs);
        let rows = outcome.map_err(|e| self.driver_failure("query", e))?;
        rows.iter().map(decode_row).collect()
    }

    fn execute(&mut self, sql: &str, params: &[SqlValue]) -> Result<u64> {
        let bound = bind(params);
        let refs = as_refs(&bound);
        let outcome = in_transaction(self.conn()?, |tx| tx.execute(sql, &refs));
        outcome.map_err(|e| self.driver_failure("command", e))
    }

    fn run_script(&mut self, script: &str) -> Result<()> {
        let outcome = in_transaction(self.conn()?, |tx| tx.batch_execute(script));
        outcome.map_err(|e| self.driver_failure("script", e))
    }
}

/// Runs `work` in its own transaction and commits it.
fn in_transaction<T>(
    client: &mut Client,
    work: impl FnOnce(&mut Transaction<'_>) -> std::result::Result<T, postgres::Error>,
) -> std::result::Result<T, postgres::Error> {
    // Dropping an uncommitted transaction rolls it back.
    let mut tx = client.transaction()?;
    let out = work(&mut tx)?;
    tx.commit()?;
    Ok(out)
}

/// FATAL and PANIC server errors terminate the backend.
fn ends_session(e: &postgres::Error) -> bool {
    e.as_db_error()
        .and_then(|db| db.parsed_severity())
        .is_some_and(|s| matches!(s, Severity::Fatal | Severity::Panic))
}

/// `closed` means the session is gone and the run cannot go on.
fn classify(action: &str, reason: &str, closed: bool) -> BoundaryError {
    if closed {
        BoundaryError::Connection(format!("connection lost during {action}: {reason}"))
    } else {
        BoundaryError::Query(format!("{action} failed: {reason}"))
    }
}

type BoundParam = Box<dyn ToSql + Sync>;

fn bind(params: &[SqlValue]) -> Vec<BoundParam> {
    params
        .iter()
        .map(|p| -> BoundParam {
            match p {
                SqlValue::Null => Box::new(Option::<String>::None),
                SqlValue::Bool(b) => Box::new(*b),
                SqlValue::Int(i) => Box::new(*i),
                SqlValue::Float(f) => Box::new(*f),
                SqlValue::Text(s) => Box::new(s.clone()),
            }
        })
        .collect()
}

fn as_refs(bound: &[BoundParam]) -> Vec<&(dyn ToSql + Sync)> {
    bound.iter().map(|b| b.as_ref()).collect()
}

fn decode_row(row: &Row) -> Result<SqlRow> {
    let mut out = SqlRow::new();
    for (idx, col) in row.columns().iter().enumerate() {
        out.push(col.name(), decode_cell(row, idx, col.type_())?);
    }
    Ok(out)
}

fn decode_cell(row: &Row, idx: usize, ty: &Type) -> Result<SqlValue> {
    let err = |e: postgres::Error| BoundaryError::Query(format!("decode column {idx}: {}", describe_pg(&e)));
    let value: SqlValue = match *ty {
        Type::BOOL => row.try_get::<_, Option<bool>>(idx).map_err(err)?.into(),
        Type::INT2 => row
            .try_get::<_, Option<i16>>(idx)
            .map_err(err)?
            .map(i64::from)
            .into(),
        Type::INT4 => row
            .try_get::<_, Option<i32>>(idx)
            .map_err(err)?
            .map(i64::from)
            .into(),
        Type::INT8 => row.try_get::<_, Option<i64>>(idx).map_err(err)?.into(),
        Type::FLOAT4 => row
            .try_get::<_, Option<f32>>(idx)
            .map_err(err)?
            .map(f64::from)
            .into(),
        Type::FLOAT8 => row.try_get::<_, Option<f64>>(idx).map_err(err)?.into(),
        _ => match row.try_get::<_, Option<String>>(idx) {
            Ok(v) => v.into(),
            Err(_) => {
                return Err(BoundaryError::Query(format!(
                    "column {idx} has unsupported type {ty}; cast it in SQL"
                )))
            }
        },
    };
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn offline() -> DatabaseClient {
        DatabaseClient::new(DbConfig::default())
    }

    #[test]
    fn new_client_is_not_connected() {
        let db = offline();
        assert!(!db.is_connected());
        assert_eq!(db.config(), &DbConfig::default());
    }

    #[test]
    fn every_call_fails_with_connection_error_while_disconnected() {
        let mut db = offline();

        let err = db.query("SELECT 1", &[]).unwrap_err();
        assert!(matches!(err, BoundaryError::Connection(_)), "query: {err:?}");

        let err = db.execute("DELETE FROM hangjungdong", &[]).unwrap_err();
        assert!(matches!(err, BoundaryError::Connection(_)), "execute: {err:?}");

        let err = db.run_script("CREATE TABLE t (id INT)").unwrap_err();
        assert!(matches!(err, BoundaryError::Connection(_)), "run_script: {err:?}");

        let err = db.table_exists("hangjungdong").unwrap_err();
        assert!(matches!(err, BoundaryError::Connection(_)), "table_exists: {err:?}");

        let err = db.count_rows(crate::model::BoundaryTable::Sigungu).unwrap_err();
        assert!(matches!(err, BoundaryError::Connection(_)), "count_rows: {err:?}");
    }

    #[test]
    fn disconnect_without_connection_is_a_no_op() {
        let mut db = offline();
        db.disconnect();
        db.disconnect();
        assert!(!db.is_connected());
    }

    #[test]
    fn closed_session_is_a_connection_error() {
        let err = classify("command", "connection closed", true);
        match err {
            BoundaryError::Connection(msg) => {
                assert_eq!(msg, "connection lost during command: connection closed")
            }
            other => panic!("expected a connection error, got {other:?}"),
        }
    }

    #[test]
    fn statement_failure_on_live_session_is_a_query_error() {
        let err = classify("query", "relation \"nope\" does not exist (SQLSTATE 42P01)", false);
        match err {
            BoundaryError::Query(msg) => {
                assert_eq!(msg, "query failed: relation \"nope\" does not exist (SQLSTATE 42P01)")
            }
            other => panic!("expected a query error, got {other:?}"),
        }
    }

    #[test]
    fn bind_maps_null_and_text() {
        let bound = bind(&[
            SqlValue::Null,
            SqlValue::from("청운효자동"),
            SqlValue::from(7_i64),
            SqlValue::from(true),
        ]);
        assert_eq!(bound.len(), 4);
        assert_eq!(format!("{:?}", bound[0]), "None");
        assert_eq!(format!("{:?}", bound[1]), "\"청운효자동\"");
        assert_eq!(format!("{:?}", bound[2]), "7");
        assert_eq!(format!("{:?}", bound[3]), "true");

        // NULL is typed as text so it binds to any nullable column.
        assert!(<Option<String> as ToSql>::accepts(&Type::VARCHAR));
        assert_eq!(as_refs(&bound).len(), 4);
    }
}
