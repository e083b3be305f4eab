// crates/boundary-core/src/importer.rs

//! # Boundary Importer
//!
//! Linear pipeline, no retries between stages:
//!
//! 1. load the GeoJSON source
//! 2. check the destination table exists (never auto-created)
//! 3. replace mode: clear existing rows once the observer approves
//! 4. process and insert features in fixed-size batches
//! 5. report totals
//!
//! A feature that fails validation or insertion is counted and skipped. Only
//! whole-run failures (unreadable source, missing table, lost connection) are
//! returned as errors.

use crate::common::{ImportReport, ProcessorStats};
use crate::error::{BoundaryError, Result};
use crate::loader;
use crate::model::{BoundaryRecord, BoundaryTable};
use crate::processor::FeatureProcessor;
use crate::traits::{ImportObserver, SqlClient};
use serde::Serialize;
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

pub const DEFAULT_BATCH_SIZE: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ImportMode {
    /// Delete existing rows before inserting.
    Replace,
    /// Keep existing rows.
    Append,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImportOptions {
    pub batch_size: usize,
    pub mode: ImportMode,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            mode: ImportMode::Replace,
        }
    }
}

impl ImportOptions {
    /// Batch size is clamped to at least 1.
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    pub fn with_mode(mut self, mode: ImportMode) -> Self {
        self.mode = mode;
        self
    }
}

/// Cumulative position after one batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BatchProgress {
    /// 1-based batch number.
    pub batch: usize,
    pub batch_len: usize,
    /// Features seen so far, this batch included.
    pub processed: usize,
    pub total: usize,
    pub imported: usize,
    pub errors: usize,
}

impl BatchProgress {
    pub fn percent(&self) -> f64 {
        if self.total == 0 {
            100.0
        } else {
            self.processed as f64 / self.total as f64 * 100.0
        }
    }
}

/// Progress stream of one import.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum ImportEvent {
    Loaded { path: Option<PathBuf>, total: usize },
    TableVerified { table: BoundaryTable },
    ExistingRows { table: BoundaryTable, count: i64 },
    Cleared { table: BoundaryTable, deleted: u64 },
    BatchCompleted(BatchProgress),
    Finished(ImportReport),
}

/// Snapshot of importer state for reporting.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImportStatistics {
    pub options_batch_size: usize,
    pub processor: ProcessorStats,
    pub last_report: Option<ImportReport>,
}

pub struct BoundaryImporter<'a, C: SqlClient> {
    client: &'a mut C,
    processor: FeatureProcessor,
    options: ImportOptions,
    last_report: Option<ImportReport>,
}

impl<'a, C: SqlClient> BoundaryImporter<'a, C> {
    pub fn new(client: &'a mut C, options: ImportOptions) -> Self {
        Self {
            client,
            processor: FeatureProcessor::new(),
            options,
            last_report: None,
        }
    }

    pub fn options(&self) -> ImportOptions {
        self.options
    }

    /// Full pipeline from a file on disk. Loader errors propagate unchanged.
    pub fn import_from_file(
        &mut self,
        path: impl AsRef<Path>,
        table: BoundaryTable,
        observer: &mut dyn ImportObserver,
    ) -> Result<ImportReport> {
        let path = path.as_ref();
        info!(path = %path.display(), %table, "starting import");
        let document = loader::load_document(path)?;
        observer.on_event(&ImportEvent::Loaded {
            path: Some(path.to_path_buf()),
            total: document.features.len(),
        });
        self.run(&document.features, table, observer)
    }

    /// Steps 2–5 on an already-loaded feature list.
    pub fn import_features(
        &mut self,
        features: &[Value],
        table: BoundaryTable,
        observer: &mut dyn ImportObserver,
    ) -> Result<ImportReport> {
        observer.on_event(&ImportEvent::Loaded {
            path: None,
            total: features.len(),
        });
        self.run(features, table, observer)
    }

    pub fn statistics(&self) -> ImportStatistics {
        ImportStatistics {
            options_batch_size: self.options.batch_size,
            processor: self.processor.stats(),
            last_report: self.last_report.clone(),
        }
    }

    fn run(
        &mut self,
        features: &[Value],
        table: BoundaryTable,
        observer: &mut dyn ImportObserver,
    ) -> Result<ImportReport> {
        // 1. Target must already exist
        if !self.client.table_exists(table.as_str())? {
            return Err(BoundaryError::Import(format!(
                "table '{table}' does not exist; create it first"
            )));
        }
        observer.on_event(&ImportEvent::TableVerified { table });

        // 2. Clear or append
        if self.options.mode == ImportMode::Replace {
            self.clear_existing(table, observer)?;
        }

        // 3. Batched insert
        let report = self.insert_batches(features, table, observer)?;

        info!(
            %table,
            imported = report.imported_count,
            errors = report.error_count,
            "import finished"
        );
        observer.on_event(&ImportEvent::Finished(report.clone()));
        self.last_report = Some(report.clone());
        Ok(report)
    }

    fn clear_existing(&mut self, table: BoundaryTable, observer: &mut dyn ImportObserver) -> Result<()> {
        let existing = self.client.count_rows(table)?;
        if existing == 0 {
            return Ok(());
        }
        observer.on_event(&ImportEvent::ExistingRows {
            table,
            count: existing,
        });
        if !observer.confirm_clear(table, existing) {
            warn!(%table, existing, "clear declined");
            return Err(BoundaryError::Import(format!(
                "clearing {existing} existing rows of '{table}' was declined"
            )));
        }
        let deleted = self.client.clear_table(table)?;
        observer.on_event(&ImportEvent::Cleared { table, deleted });
        Ok(())
    }

    fn insert_batches(
        &mut self,
        features: &[Value],
        table: BoundaryTable,
        observer: &mut dyn ImportObserver,
    ) -> Result<ImportReport> {
        let total = features.len();
        let batch_size = self.options.batch_size.max(1);
        let sql = insert_sql(table);

        let mut report = ImportReport {
            total_features: total,
            ..ImportReport::default()
        };
        let mut processed = 0;

        debug!(batch_size, total, "inserting");

        for (idx, batch) in features.chunks(batch_size).enumerate() {
            for feature in batch {
                match self.processor.process(feature) {
                    Ok(record) => match insert_record(self.client, &sql, &record) {
                        Ok(()) => report.imported_count += 1,
                        // Connectivity is not a per-row problem.
                        Err(e @ BoundaryError::Connection(_)) => return Err(e),
                        Err(e) => {
                            report.error_count += 1;
                            report
                                .errors
                                .push(format!("insert failed ({}): {e}", record.adm_nm));
                        }
                    },
                    Err(e) => {
                        report.error_count += 1;
                        report.errors.push(e.to_string());
                    }
                }
            }

            processed += batch.len();
            report.batches += 1;

            let progress = BatchProgress {
                batch: idx + 1,
                batch_len: batch.len(),
                processed,
                total,
                imported: report.imported_count,
                errors: report.error_count,
            };
            debug!(
                batch = progress.batch,
                processed,
                total,
                imported = progress.imported,
                errors = progress.errors,
                "batch done"
            );
            observer.on_event(&ImportEvent::BatchCompleted(progress));
        }

        Ok(report)
    }
}

/// `INSERT` for one district row; the geometry is built server-side from its
/// GeoJSON text and forced to a 4326 multipolygon.
pub fn insert_sql(table: BoundaryTable) -> String {
    format!(
        "INSERT INTO {table} (adm_nm, adm_cd, adm_cd2, sido, sgg, sidonm, sggnm, geom) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, ST_Multi(ST_SetSRID(ST_GeomFromGeoJSON($8), 4326)))"
    )
}

fn insert_record<C: SqlClient>(client: &mut C, sql: &str, record: &BoundaryRecord) -> Result<()> {
    client.execute(sql, &record.insert_params())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn batch_size_is_clamped() {
        assert_eq!(ImportOptions::default().with_batch_size(0).batch_size, 1);
        assert_eq!(ImportOptions::default().batch_size, DEFAULT_BATCH_SIZE);
    }

    #[test]
    fn insert_sql_binds_every_value() {
        let sql = insert_sql(BoundaryTable::Hangjungdong);
        assert!(sql.starts_with("INSERT INTO hangjungdong "));
        assert!(sql.contains("ST_GeomFromGeoJSON($8)"));
        assert_eq!(sql.matches('$').count(), 8);
    }

    #[test]
    fn progress_percent() {
        let p = BatchProgress {
            batch: 2,
            batch_len: 100,
            processed: 200,
            total: 250,
            imported: 190,
            errors: 10,
        };
        assert!((p.percent() - 80.0).abs() < 1e-9);
    }
}
