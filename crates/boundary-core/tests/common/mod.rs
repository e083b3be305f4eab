// crates/boundary-core/tests/common/mod.rs
#![allow(dead_code)]

use boundary_core::{BoundaryError, BoundaryTable, Result, SqlClient, SqlRow, SqlValue};
use serde_json::{json, Value};
use std::collections::BTreeMap;

/// In-memory stand-in for PostgreSQL.
///
/// Understands exactly the statements this crate issues: catalog lookups,
/// `COUNT(*)`, `DELETE`, `INSERT` and the aggregation source/summary reads.
/// Tables hold raw insert parameters.
pub struct MemoryClient {
    pub connected: bool,
    pub tables: BTreeMap<String, Vec<Vec<SqlValue>>>,
    /// Returned for the `ST_AsGeoJSON` source query.
    pub source_rows: Vec<SqlRow>,
    /// Inserts whose parameters mention this text fail with a query error.
    pub fail_on: Option<String>,
    /// The session closes once this many inserts have succeeded.
    pub closes_after_inserts: Option<usize>,
    pub executed: Vec<String>,
    pub scripts: Vec<String>,
}

impl MemoryClient {
    pub fn new() -> Self {
        Self {
            connected: true,
            tables: BTreeMap::new(),
            source_rows: Vec::new(),
            fail_on: None,
            closes_after_inserts: None,
            executed: Vec::new(),
            scripts: Vec::new(),
        }
    }

    pub fn with_table(mut self, table: BoundaryTable) -> Self {
        self.tables.entry(table.as_str().to_string()).or_default();
        self
    }

    pub fn with_rows(mut self, table: BoundaryTable, rows: usize) -> Self {
        let stored = self.tables.entry(table.as_str().to_string()).or_default();
        for i in 0..rows {
            stored.push(vec![SqlValue::from(format!("기존{i}"))]);
        }
        self
    }

    pub fn rows(&self, table: BoundaryTable) -> &[Vec<SqlValue>] {
        self.tables
            .get(table.as_str())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    fn check(&self) -> Result<()> {
        if self.connected {
            Ok(())
        } else {
            Err(BoundaryError::Connection("not connected to the database".into()))
        }
    }

    fn table_mut(&mut self, name: &str) -> Result<&mut Vec<Vec<SqlValue>>> {
        self.tables
            .get_mut(name)
            .ok_or_else(|| BoundaryError::Query(format!("relation \"{name}\" does not exist")))
    }
}

impl SqlClient for MemoryClient {
    fn is_connected(&self) -> bool {
        self.connected
    }

    fn query(&mut self, sql: &str, params: &[SqlValue]) -> Result<Vec<SqlRow>> {
        self.check()?;

        if sql.contains("information_schema.tables") {
            let name = params.first().and_then(SqlValue::as_str).unwrap_or_default();
            let found = self.tables.contains_key(name);
            return Ok(vec![SqlRow::new().with("found", found)]);
        }
        if sql.contains("information_schema.columns") {
            let name = params.first().and_then(SqlValue::as_str).unwrap_or_default();
            if !self.tables.contains_key(name) {
                return Ok(Vec::new());
            }
            return Ok(["id", "adm_nm", "adm_cd", "adm_cd2", "sido", "sgg", "sidonm", "sggnm", "geom"]
                .iter()
                .map(|col| {
                    SqlRow::new()
                        .with("column_name", *col)
                        .with("data_type", "text")
                        .with("is_nullable", if *col == "id" { "NO" } else { "YES" })
                        .with("column_default", SqlValue::Null)
                })
                .collect());
        }
        if let Some(name) = sql.strip_prefix("SELECT COUNT(*) AS count FROM ") {
            let count = self.table_mut(name.trim())?.len() as i64;
            return Ok(vec![SqlRow::new().with("count", count)]);
        }
        if sql.contains("ST_AsGeoJSON") {
            return Ok(self.source_rows.clone());
        }
        if sql.contains("ST_Transform") {
            return Ok(vec![SqlRow::new()
                .with("name", "A")
                .with("dong_count", 3_i64)
                .with("area_km2", 12.5)]);
        }
        Ok(Vec::new())
    }

    fn execute(&mut self, sql: &str, params: &[SqlValue]) -> Result<u64> {
        self.check()?;
        self.executed.push(sql.to_string());

        if let Some(name) = sql.strip_prefix("DELETE FROM ") {
            let table = self.table_mut(name.trim())?;
            let deleted = table.len() as u64;
            table.clear();
            return Ok(deleted);
        }
        if let Some(rest) = sql.strip_prefix("INSERT INTO ") {
            if let Some(limit) = self.closes_after_inserts {
                let inserted: usize = self.tables.values().map(Vec::len).sum();
                if inserted >= limit {
                    self.connected = false;
                    return Err(BoundaryError::Connection(
                        "connection lost during command: connection closed".into(),
                    ));
                }
            }
            if let Some(bad) = &self.fail_on {
                if params.iter().any(|p| p.as_str() == Some(bad.as_str())) {
                    return Err(BoundaryError::Query(format!("value too long: {bad}")));
                }
            }
            let name = rest.split_whitespace().next().unwrap_or_default().to_string();
            self.table_mut(&name)?.push(params.to_vec());
            return Ok(1);
        }
        Ok(0)
    }

    fn run_script(&mut self, script: &str) -> Result<()> {
        self.check()?;
        self.scripts.push(script.to_string());
        for line in script.lines() {
            if let Some(rest) = line.trim().strip_prefix("CREATE TABLE IF NOT EXISTS ") {
                let name = rest.split_whitespace().next().unwrap_or_default();
                self.tables.entry(name.to_string()).or_default();
            }
        }
        Ok(())
    }
}

pub fn square(x: f64, y: f64) -> Value {
    json!({
        "type": "Polygon",
        "coordinates": [[[x, y], [x + 1.0, y], [x + 1.0, y + 1.0], [x, y + 1.0], [x, y]]]
    })
}

/// A district feature with every property set.
pub fn district(name: &str, sidonm: &str, sggnm: &str) -> Value {
    json!({
        "type": "Feature",
        "properties": {
            "adm_nm": name,
            "adm_cd": "1101053",
            "adm_cd2": "1111053000",
            "sido": "11",
            "sgg": "11110",
            "sidonm": sidonm,
            "sggnm": sggnm
        },
        "geometry": square(0.0, 0.0)
    })
}

/// A feature that fails validation (no `adm_nm`).
pub fn nameless() -> Value {
    json!({
        "type": "Feature",
        "properties": { "sidonm": "서울특별시" },
        "geometry": square(0.0, 0.0)
    })
}

pub fn collection(features: &[Value]) -> String {
    json!({ "type": "FeatureCollection", "features": features }).to_string()
}

/// Row shaped like the aggregation source query output.
pub fn source_row(sidonm: &str, sggnm: &str, sido: &str, geometry: &Value) -> SqlRow {
    SqlRow::new()
        .with("sidonm", sidonm)
        .with("sggnm", sggnm)
        .with("sido", sido)
        .with("sgg", format!("{sido}110"))
        .with("geometry_json", geometry.to_string())
}
