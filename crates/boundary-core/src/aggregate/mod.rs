// crates/boundary-core/src/aggregate/mod.rs

//! # Boundary Aggregator
//!
//! Derives coarser boundaries from the district table:
//!
//! 1. read district rows with non-null keys and geometry
//! 2. group them by province name, or by (province, county) name pair
//! 3. union each group's polygons
//! 4. write one row per group (provinces upsert on code, counties insert)
//! 5. read back a per-group summary with areas in km²
//!
//! A group that fails to merge or write is recorded and skipped.

pub mod merge;

use crate::error::{BoundaryError, Result};
use crate::model::{BoundaryTable, SqlRow, SqlValue};
use crate::traits::SqlClient;
use geo::Geometry;
use indexmap::IndexMap;
use serde::Serialize;
use tracing::{debug, info, warn};

pub use merge::{merge_geometries, parse_geojson_geometry, to_wkt};

/// Progress is reported every this many groups, and after the last one.
pub const PROGRESS_EVERY: usize = 20;

/// Counties listed in the summary.
pub const SIGUNGU_SUMMARY_LIMIT: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AggregateLevel {
    /// Province boundaries into `sido_boundary`.
    Sido,
    /// County boundaries into `sigungu`.
    Sigungu,
}

impl AggregateLevel {
    pub fn target(&self) -> BoundaryTable {
        match self {
            Self::Sido => BoundaryTable::SidoBoundary,
            Self::Sigungu => BoundaryTable::Sigungu,
        }
    }

    fn source_sql(&self) -> String {
        let src = BoundaryTable::Hangjungdong;
        match self {
            Self::Sido => format!(
                "SELECT sidonm, sido, ST_AsGeoJSON(geom) AS geometry_json \
                 FROM {src} \
                 WHERE sidonm IS NOT NULL AND geom IS NOT NULL"
            ),
            Self::Sigungu => format!(
                "SELECT sidonm, sggnm, sido, sgg, ST_AsGeoJSON(geom) AS geometry_json \
                 FROM {src} \
                 WHERE sidonm IS NOT NULL AND sggnm IS NOT NULL AND geom IS NOT NULL"
            ),
        }
    }

    fn write_sql(&self) -> String {
        let target = self.target();
        match self {
            Self::Sido => format!(
                "INSERT INTO {target} (sido_code, sido_name, geom) \
                 VALUES ($1, $2, ST_Multi(ST_GeomFromText($3, 4326))) \
                 ON CONFLICT (sido_code) DO UPDATE SET \
                     sido_name = EXCLUDED.sido_name, \
                     geom = EXCLUDED.geom, \
                     updated_at = NOW()"
            ),
            // No conflict target: re-running without clearing duplicates rows.
            Self::Sigungu => format!(
                "INSERT INTO {target} (sidonm, sggnm, sido, sgg, geom) \
                 VALUES ($1, $2, $3, $4, ST_Multi(ST_GeomFromText($5, 4326)))"
            ),
        }
    }

    fn summary_sql(&self) -> String {
        let target = self.target();
        let src = BoundaryTable::Hangjungdong;
        match self {
            Self::Sido => format!(
                "SELECT sb.sido_name AS name, \
                        COUNT(h.id) AS dong_count, \
                        COUNT(DISTINCT h.sggnm) AS sgg_count, \
                        ROUND(CAST(ST_Area(ST_Transform(sb.geom, 5179)) / 1000000 AS NUMERIC), 2)::float8 AS area_km2 \
                 FROM {target} sb \
                 LEFT JOIN {src} h ON h.sidonm = sb.sido_name \
                 GROUP BY sb.sido_name, sb.geom \
                 ORDER BY dong_count DESC"
            ),
            Self::Sigungu => format!(
                "SELECT s.sidonm || ' ' || s.sggnm AS name, \
                        COUNT(h.id) AS dong_count, \
                        ROUND(CAST(ST_Area(ST_Transform(s.geom, 5179)) / 1000000 AS NUMERIC), 2)::float8 AS area_km2 \
                 FROM {target} s \
                 LEFT JOIN {src} h ON h.sidonm = s.sidonm AND h.sggnm = s.sggnm \
                 GROUP BY s.sidonm, s.sggnm, s.geom \
                 ORDER BY dong_count DESC \
                 LIMIT {SIGUNGU_SUMMARY_LIMIT}"
            ),
        }
    }

    /// Grouping key of one source row; `None` when a key column is missing.
    fn key_of(&self, row: &SourceRow) -> Option<Vec<String>> {
        match self {
            Self::Sido => Some(vec![row.sidonm.clone()]),
            Self::Sigungu => Some(vec![row.sidonm.clone(), row.sggnm.clone()?]),
        }
    }
}

/// One district row as read for aggregation.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceRow {
    pub sidonm: String,
    pub sggnm: Option<String>,
    pub sido: Option<String>,
    pub sgg: Option<String>,
    pub geometry_json: String,
}

impl SourceRow {
    fn from_row(row: &SqlRow) -> Option<Self> {
        let text = |col: &str| row.get_str(col).map(str::to_string);
        Some(Self {
            sidonm: text("sidonm")?,
            sggnm: text("sggnm"),
            sido: text("sido"),
            sgg: text("sgg"),
            geometry_json: text("geometry_json")?,
        })
    }
}

/// Rows sharing one key. Codes come from the first member row.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregateGroup {
    pub key: Vec<String>,
    pub sido: Option<String>,
    pub sgg: Option<String>,
    pub geometries: Vec<String>,
}

impl AggregateGroup {
    pub fn label(&self) -> String {
        self.key.join(" ")
    }

    pub fn len(&self) -> usize {
        self.geometries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.geometries.is_empty()
    }
}

/// Groups rows by the level's key, in first-seen order.
pub fn group_rows(level: AggregateLevel, rows: &[SourceRow]) -> Vec<AggregateGroup> {
    let mut groups: IndexMap<Vec<String>, AggregateGroup> = IndexMap::new();
    for row in rows {
        let Some(key) = level.key_of(row) else {
            continue;
        };
        groups
            .entry(key.clone())
            .or_insert_with(|| AggregateGroup {
                key,
                sido: row.sido.clone(),
                sgg: row.sgg.clone(),
                geometries: Vec::new(),
            })
            .geometries
            .push(row.geometry_json.clone());
    }
    groups.into_values().collect()
}

/// Summary line per written group.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AreaSummary {
    pub name: String,
    pub dong_count: i64,
    /// Province summaries only.
    pub sgg_count: Option<i64>,
    pub area_km2: Option<f64>,
}

impl AreaSummary {
    fn from_row(row: &SqlRow) -> Self {
        Self {
            name: row.get_str("name").unwrap_or_default().to_string(),
            dong_count: row.get_i64("dong_count").unwrap_or(0),
            sgg_count: row.get_i64("sgg_count"),
            area_km2: row.get_f64("area_km2"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregateReport {
    pub level: AggregateLevel,
    pub source_rows: usize,
    pub groups: usize,
    pub written: usize,
    /// `"<group label>: <error>"` per skipped group.
    pub failures: Vec<String>,
    pub summary: Vec<AreaSummary>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum AggregateEvent {
    SourceLoaded { level: AggregateLevel, rows: usize },
    Grouped { groups: usize },
    Progress { done: usize, total: usize },
    GroupFailed { label: String, error: String },
    Finished { written: usize, groups: usize },
}

impl AggregateEvent {
    pub fn percent(&self) -> Option<f64> {
        match self {
            Self::Progress { done, total } if *total > 0 => {
                Some(*done as f64 / *total as f64 * 100.0)
            }
            _ => None,
        }
    }
}

/// Runs derivations against a connected [`SqlClient`].
pub struct Aggregator<'a, C: SqlClient> {
    client: &'a mut C,
}

impl<'a, C: SqlClient> Aggregator<'a, C> {
    pub fn new(client: &'a mut C) -> Self {
        Self { client }
    }

    /// `hangjungdong` → `sido_boundary`.
    pub fn derive_sido(&mut self, on_event: &mut dyn FnMut(&AggregateEvent)) -> Result<AggregateReport> {
        self.derive(AggregateLevel::Sido, on_event)
    }

    /// `hangjungdong` → `sigungu`. Existing rows are not touched.
    pub fn derive_sigungu(
        &mut self,
        on_event: &mut dyn FnMut(&AggregateEvent),
    ) -> Result<AggregateReport> {
        self.derive(AggregateLevel::Sigungu, on_event)
    }

    pub fn derive(
        &mut self,
        level: AggregateLevel,
        on_event: &mut dyn FnMut(&AggregateEvent),
    ) -> Result<AggregateReport> {
        let target = level.target();
        info!(?level, %target, "deriving boundaries");

        // 1. Source rows
        let src = BoundaryTable::Hangjungdong;
        if !self.client.table_exists(src.as_str())? {
            return Err(BoundaryError::Aggregate(format!(
                "table '{src}' does not exist; import the districts first"
            )));
        }
        let rows: Vec<SourceRow> = self
            .client
            .query(&level.source_sql(), &[])?
            .iter()
            .filter_map(SourceRow::from_row)
            .collect();
        if rows.is_empty() {
            return Err(BoundaryError::Aggregate(format!(
                "no {src} rows with names and geometry"
            )));
        }
        on_event(&AggregateEvent::SourceLoaded {
            level,
            rows: rows.len(),
        });

        // 2. Groups
        let groups = group_rows(level, &rows);
        let total = groups.len();
        debug!(groups = total, "grouped");
        on_event(&AggregateEvent::Grouped { groups: total });

        // 3-4. Merge and write
        let sql = level.write_sql();
        let mut written = 0;
        let mut failures = Vec::new();

        for (idx, group) in groups.iter().enumerate() {
            match self.write_group(level, &sql, group) {
                Ok(()) => written += 1,
                Err(e @ BoundaryError::Connection(_)) => return Err(e),
                Err(e) => {
                    let label = group.label();
                    warn!(group = %label, error = %e, "group skipped");
                    on_event(&AggregateEvent::GroupFailed {
                        label: label.clone(),
                        error: e.to_string(),
                    });
                    failures.push(format!("{label}: {e}"));
                }
            }

            let done = idx + 1;
            if done % PROGRESS_EVERY == 0 || done == total {
                on_event(&AggregateEvent::Progress { done, total });
            }
        }

        // 5. Summary
        let summary = self
            .client
            .query(&level.summary_sql(), &[])?
            .iter()
            .map(AreaSummary::from_row)
            .collect();

        info!(%target, written, groups = total, failed = failures.len(), "derivation finished");
        on_event(&AggregateEvent::Finished {
            written,
            groups: total,
        });

        Ok(AggregateReport {
            level,
            source_rows: rows.len(),
            groups: total,
            written,
            failures,
            summary,
        })
    }

    fn write_group(&mut self, level: AggregateLevel, sql: &str, group: &AggregateGroup) -> Result<()> {
        let geometries = group
            .geometries
            .iter()
            .map(|text| parse_geojson_geometry(text))
            .collect::<Result<Vec<Geometry<f64>>>>()?;
        let wkt = to_wkt(&merge_geometries(&geometries)?);

        let params: Vec<SqlValue> = match level {
            AggregateLevel::Sido => vec![
                group.sido.clone().into(),
                group.key[0].as_str().into(),
                wkt.into(),
            ],
            AggregateLevel::Sigungu => vec![
                group.key[0].as_str().into(),
                group.key[1].as_str().into(),
                group.sido.clone().into(),
                group.sgg.clone().into(),
                wkt.into(),
            ],
        };
        self.client.execute(sql, &params)?;
        Ok(())
    }
}
