// crates/boundary-core/src/model/table.rs
use crate::error::{BoundaryError, Result};
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// The fixed set of tables this tool reads and writes.
///
/// SQL identifiers cannot be bound as query parameters, so every statement
/// that names a table builds the name from this enum and nothing else.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BoundaryTable {
    /// District level (행정동).
    Hangjungdong,
    /// County level (시군구).
    Sigungu,
    /// Province level (시도).
    SidoBoundary,
}

impl BoundaryTable {
    /// Creation order for `setup --table all`.
    pub const ALL: [BoundaryTable; 3] = [
        BoundaryTable::Hangjungdong,
        BoundaryTable::Sigungu,
        BoundaryTable::SidoBoundary,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Hangjungdong => "hangjungdong",
            Self::Sigungu => "sigungu",
            Self::SidoBoundary => "sido_boundary",
        }
    }

    pub fn ddl_file_name(&self) -> &'static str {
        match self {
            Self::Hangjungdong => "create_hangjungdong_table.sql",
            Self::Sigungu => "create_sigungu_table.sql",
            Self::SidoBoundary => "create_sido_boundary_table.sql",
        }
    }

    /// DDL script location under `sql_dir`.
    pub fn ddl_path(&self, sql_dir: &Path) -> PathBuf {
        sql_dir.join(self.ddl_file_name())
    }
}

impl fmt::Display for BoundaryTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BoundaryTable {
    type Err = BoundaryError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "hangjungdong" => Ok(Self::Hangjungdong),
            "sigungu" => Ok(Self::Sigungu),
            "sido_boundary" | "sido" => Ok(Self::SidoBoundary),
            other => Err(BoundaryError::Import(format!("unknown table: {other:?}"))),
        }
    }
}
