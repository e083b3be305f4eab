// crates/boundary-core/src/verify.rs

//! Post-import checks for the `verify` command.

use crate::error::Result;
use crate::model::{BoundaryTable, SqlRow};
use crate::traits::SqlClient;
use serde::Serialize;
use tracing::{info, warn};

const TOP_GROUPS: usize = 10;
const RANDOM_SAMPLES: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroupCount {
    pub name: String,
    pub count: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProvinceEntry {
    pub name: String,
    pub code: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GeometryTypeCount {
    /// `ST_GeometryType` output, e.g. `ST_MultiPolygon`.
    pub geometry_type: String,
    pub count: i64,
}

/// Table-specific part of the report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum TableDetails {
    /// Top provinces by row count plus random samples.
    Grouped {
        top: Vec<GroupCount>,
        samples: Vec<String>,
    },
    /// Every province, ordered by name.
    Provinces(Vec<ProvinceEntry>),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VerifyReport {
    pub table: BoundaryTable,
    pub total: i64,
    /// `None` when the table is empty.
    pub details: Option<TableDetails>,
    pub geometry_types: Vec<GeometryTypeCount>,
}

impl VerifyReport {
    pub fn is_empty(&self) -> bool {
        self.total == 0
    }
}

/// Collects counts, samples and the geometry type breakdown for `table`.
///
/// An empty table is not an error; the report just carries no details.
pub fn verify_table<C: SqlClient>(client: &mut C, table: BoundaryTable) -> Result<VerifyReport> {
    let total = client.count_rows(table)?;
    info!(%table, total, "verifying");

    if total == 0 {
        warn!(%table, "table is empty");
        return Ok(VerifyReport {
            table,
            total,
            details: None,
            geometry_types: Vec::new(),
        });
    }

    let details = match table {
        BoundaryTable::Hangjungdong | BoundaryTable::Sigungu => {
            let top = client
                .query(&top_provinces_sql(table), &[])?
                .iter()
                .map(|row| GroupCount {
                    name: text(row, "sidonm"),
                    count: row.get_i64("count").unwrap_or(0),
                })
                .collect();
            let samples = client
                .query(&samples_sql(table), &[])?
                .iter()
                .map(|row| text(row, "label"))
                .collect();
            TableDetails::Grouped { top, samples }
        }
        BoundaryTable::SidoBoundary => TableDetails::Provinces(
            client
                .query(
                    &format!("SELECT sido_name, sido_code FROM {table} ORDER BY sido_name"),
                    &[],
                )?
                .iter()
                .map(|row| ProvinceEntry {
                    name: text(row, "sido_name"),
                    code: text(row, "sido_code"),
                })
                .collect(),
        ),
    };

    let geometry_types = client
        .query(
            &format!(
                "SELECT ST_GeometryType(geom) AS geom_type, COUNT(geom) AS with_geom \
                 FROM {table} \
                 WHERE geom IS NOT NULL \
                 GROUP BY ST_GeometryType(geom)"
            ),
            &[],
        )?
        .iter()
        .map(|row| GeometryTypeCount {
            geometry_type: text(row, "geom_type"),
            count: row.get_i64("with_geom").unwrap_or(0),
        })
        .collect();

    Ok(VerifyReport {
        table,
        total,
        details: Some(details),
        geometry_types,
    })
}

fn top_provinces_sql(table: BoundaryTable) -> String {
    format!(
        "SELECT sidonm, COUNT(*) AS count \
         FROM {table} \
         WHERE sidonm IS NOT NULL \
         GROUP BY sidonm \
         ORDER BY count DESC \
         LIMIT {TOP_GROUPS}"
    )
}

fn samples_sql(table: BoundaryTable) -> String {
    let label = match table {
        BoundaryTable::Sigungu => "sidonm || ' ' || sggnm",
        _ => "adm_nm",
    };
    format!("SELECT {label} AS label FROM {table} ORDER BY RANDOM() LIMIT {RANDOM_SAMPLES}")
}

fn text(row: &SqlRow, column: &str) -> String {
    row.get_str(column).unwrap_or_default().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sample_labels_follow_table() {
        assert_eq!(
            samples_sql(BoundaryTable::Hangjungdong),
            "SELECT adm_nm AS label FROM hangjungdong ORDER BY RANDOM() LIMIT 5"
        );
        assert!(samples_sql(BoundaryTable::Sigungu).starts_with("SELECT sidonm || ' ' || sggnm"));
    }

    #[test]
    fn top_query_is_limited() {
        assert!(top_provinces_sql(BoundaryTable::Sigungu).ends_with("LIMIT 10"));
    }
}
