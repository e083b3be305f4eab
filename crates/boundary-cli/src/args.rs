use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

pub const DEFAULT_GEOJSON: &str = "data/HangJeongDong_ver20250401.geojson";
pub const DEFAULT_SQL_DIR: &str = "sql";

/// CLI arguments for boundary-cli
#[derive(Debug, Parser)]
#[command(
    name = "boundary",
    version,
    about = "Import Korean administrative boundaries into PostGIS and derive coarser levels"
)]
pub struct CliArgs {
    /// Log level (RUST_LOG wins when set)
    #[arg(long = "log-level", global = true, value_enum, default_value = "info")]
    pub log_level: LogLevel,

    /// Optional .env file with DB_HOST, DB_PORT, DB_NAME, DB_USER, DB_PASSWORD
    #[arg(long = "env-file", global = true)]
    pub env_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// `--log-level` choices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl From<LogLevel> for tracing::Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Trace => tracing::Level::TRACE,
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Error => tracing::Level::ERROR,
        }
    }
}

/// `--table` choices for `setup`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SetupTarget {
    Hangjungdong,
    Sigungu,
    Sido,
    All,
}

/// `--level` choices for `import`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ImportLevel {
    /// GeoJSON districts into hangjungdong
    Hangjungdong,
    /// County boundaries derived from hangjungdong
    Sigungu,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Create tables from the DDL scripts
    Setup {
        /// Table to create
        #[arg(long, value_enum, default_value = "hangjungdong")]
        table: SetupTarget,

        /// Run this script instead of the default one
        #[arg(long = "sql-file")]
        sql_file: Option<PathBuf>,

        /// Directory holding the default DDL scripts
        #[arg(long = "sql-dir", default_value = DEFAULT_SQL_DIR)]
        sql_dir: PathBuf,

        /// Derive sido_boundary from hangjungdong afterwards
        #[arg(long = "create-sido-from-data")]
        create_sido_from_data: bool,
    },

    /// Import GeoJSON districts, or derive counties
    Import {
        #[arg(long, value_enum, default_value = "hangjungdong")]
        level: ImportLevel,

        /// GeoJSON source (.geojson or .geojson.gz)
        #[arg(long = "geojson-file", default_value = DEFAULT_GEOJSON)]
        geojson_file: PathBuf,

        /// Target table (defaults to the level's table)
        #[arg(long = "table-name")]
        table_name: Option<String>,

        /// Keep existing rows
        #[arg(long)]
        append: bool,

        /// Features per batch
        #[arg(long = "batch-size", default_value_t = boundary_core::importer::DEFAULT_BATCH_SIZE)]
        batch_size: usize,

        /// Ask before deleting existing rows
        #[arg(long)]
        interactive: bool,
    },

    /// Inspect a GeoJSON file without touching the database
    Analyze {
        #[arg(long = "geojson-file", default_value = DEFAULT_GEOJSON)]
        geojson_file: PathBuf,
    },

    /// Report row counts, samples and geometry types of a table
    Verify {
        #[arg(long = "table-name", default_value = "hangjungdong")]
        table_name: String,
    },
}
