//! boundary-cli — Command-line interface for boundary-core
//!
//! Loads Korean administrative boundaries (행정동) from GeoJSON into
//! PostGIS and derives county (시군구) and province (시도) boundaries from
//! them.
//!
//! Usage examples
//! --------------
//!
//! - Create every table, then derive provinces once districts are loaded
//!   $ boundary setup --table all
//!   $ boundary setup --table sido --create-sido-from-data
//!
//! - Import districts (replacing existing rows), or append
//!   $ boundary import --geojson-file data/HangJeongDong_ver20250401.geojson
//!   $ boundary import --append --batch-size 500
//!
//! - Derive counties
//!   $ boundary import --level sigungu
//!
//! - Inspect a file offline, or check a table
//!   $ boundary analyze
//!   $ boundary verify --table-name sigungu
//!
//! Connection settings come from `DB_HOST`, `DB_PORT`, `DB_NAME`, `DB_USER`
//! and `DB_PASSWORD` (a `.env` file in the working directory is read first).
mod args;

use crate::args::{CliArgs, Commands, ImportLevel, LogLevel, SetupTarget};
use anyhow::{bail, Context};
use boundary_core::aggregate::{AggregateEvent, AggregateReport};
use boundary_core::analysis::{self, AnalysisReport};
use boundary_core::importer::{BatchProgress, ImportEvent};
use boundary_core::schema::{self, CreatedTable};
use boundary_core::verify::{self, TableDetails, VerifyReport};
use boundary_core::{
    Aggregator, BoundaryImporter, BoundaryTable, DatabaseClient, DbConfig, ImportMode,
    ImportObserver, ImportOptions, SqlClient,
};
use clap::Parser;
use std::io::{self, BufRead, Write};
use std::path::Path;
use std::process::ExitCode;
use tracing::{error, info, warn, Level};
use tracing_subscriber::EnvFilter;

/// Process status after SIGINT or SIGTERM.
const INTERRUPTED_EXIT_CODE: i32 = 1;

fn main() -> ExitCode {
    let args = CliArgs::parse();
    setup_logging(args.log_level);
    if let Err(e) = exit_on_interrupt() {
        warn!("{e:#}");
    }

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}

fn setup_logging(log_level: LogLevel) {
    let level = Level::from(log_level);

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("postgres=warn,tokio_postgres=warn,{level}")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .without_time()
        .init();
}

/// Logs the interruption and exits with [`INTERRUPTED_EXIT_CODE`].
///
/// Open transactions are rolled back by the server when the socket closes.
#[cfg(unix)]
fn exit_on_interrupt() -> anyhow::Result<()> {
    use signal_hook::consts::{SIGINT, SIGTERM};
    use signal_hook::iterator::Signals;
    use std::thread;

    let mut signals =
        Signals::new([SIGINT, SIGTERM]).context("failed to register the interrupt handler")?;
    thread::spawn(move || {
        if let Some(signal) = signals.forever().next() {
            error!(signal, "interrupted; stopping");
            std::process::exit(INTERRUPTED_EXIT_CODE);
        }
    });
    Ok(())
}

#[cfg(not(unix))]
fn exit_on_interrupt() -> anyhow::Result<()> {
    Ok(())
}

fn run(args: CliArgs) -> anyhow::Result<()> {
    match args.command {
        Commands::Setup {
            table,
            sql_file,
            sql_dir,
            create_sido_from_data,
        } => {
            let mut db = connect(args.env_file.as_deref())?;
            let result = setup(&mut db, table, sql_file.as_deref(), &sql_dir, create_sido_from_data);
            db.disconnect();
            result
        }

        Commands::Import {
            level,
            geojson_file,
            table_name,
            append,
            batch_size,
            interactive,
        } => {
            let mode = if append { ImportMode::Append } else { ImportMode::Replace };
            let options = ImportOptions::default()
                .with_batch_size(batch_size)
                .with_mode(mode);

            let mut db = connect(args.env_file.as_deref())?;
            let result = match level {
                ImportLevel::Hangjungdong => {
                    let table = resolve_table(table_name.as_deref(), BoundaryTable::Hangjungdong)?;
                    import_districts(&mut db, &geojson_file, table, options, interactive)
                }
                ImportLevel::Sigungu => {
                    let table = resolve_table(table_name.as_deref(), BoundaryTable::Sigungu)?;
                    derive_counties(&mut db, table, options, interactive)
                }
            };
            db.disconnect();
            result
        }

        Commands::Analyze { geojson_file } => analyze(&geojson_file),

        Commands::Verify { table_name } => {
            let table: BoundaryTable = table_name.parse()?;
            let mut db = connect(args.env_file.as_deref())?;
            let result = verify::verify_table(&mut db, table).map(|r| print_verify(&r));
            db.disconnect();
            Ok(result?)
        }
    }
}

fn connect(env_file: Option<&Path>) -> anyhow::Result<DatabaseClient> {
    let config = match env_file {
        Some(path) => DbConfig::from_env_file(path)?,
        None => DbConfig::from_env()?,
    };
    info!(%config, "connecting");
    let mut db = DatabaseClient::new(config);
    db.connect().context("database connection failed")?;
    Ok(db)
}

fn resolve_table(name: Option<&str>, default: BoundaryTable) -> anyhow::Result<BoundaryTable> {
    let table = match name {
        Some(n) => n.parse::<BoundaryTable>()?,
        None => default,
    };
    if table != default {
        bail!("this level writes to '{default}', not '{table}'");
    }
    Ok(table)
}

// -----------------------------------------------------------------------------
// setup
// -----------------------------------------------------------------------------

fn setup(
    db: &mut DatabaseClient,
    target: SetupTarget,
    sql_file: Option<&Path>,
    sql_dir: &Path,
    create_sido_from_data: bool,
) -> anyhow::Result<()> {
    let table = match target {
        SetupTarget::Hangjungdong => Some(BoundaryTable::Hangjungdong),
        SetupTarget::Sigungu => Some(BoundaryTable::Sigungu),
        SetupTarget::Sido => Some(BoundaryTable::SidoBoundary),
        SetupTarget::All => None,
    };

    match (sql_file, table) {
        (Some(file), Some(table)) => print_created(&schema::create_from_file(db, table, file)?),
        (Some(file), None) => {
            db.run_file(file)?;
            println!("Executed {}", file.display());
        }
        (None, Some(table)) => print_created(&schema::create_table(db, table, sql_dir)?),
        (None, None) => {
            for created in schema::create_all(db, sql_dir)? {
                print_created(&created);
            }
        }
    }

    if create_sido_from_data {
        let report = Aggregator::new(db).derive_sido(&mut log_aggregate_event)?;
        print_aggregate(&report, 5);
    }
    Ok(())
}

fn print_created(created: &CreatedTable) {
    println!("Table '{}' ready ({})", created.table, created.script.display());
    for col in &created.columns {
        let nullable = if col.is_nullable { "NULL" } else { "NOT NULL" };
        println!("  {}: {} {}", col.column_name, col.data_type, nullable);
    }
    let more = created.remaining_columns();
    if more > 0 {
        println!("  ... and {more} more columns");
    }
}

// -----------------------------------------------------------------------------
// import
// -----------------------------------------------------------------------------

/// Turns importer events into log lines; optionally asks before clearing.
struct CliObserver {
    interactive: bool,
}

impl ImportObserver for CliObserver {
    fn on_event(&mut self, event: &ImportEvent) {
        match event {
            ImportEvent::Loaded { total, .. } => info!(features = total, "GeoJSON loaded"),
            ImportEvent::TableVerified { table } => info!(%table, "target table found"),
            ImportEvent::ExistingRows { table, count } => {
                warn!(%table, rows = count, "table already has rows")
            }
            ImportEvent::Cleared { table, deleted } => info!(%table, deleted, "existing rows deleted"),
            ImportEvent::BatchCompleted(p) => log_batch(p),
            ImportEvent::Finished(_) => {}
        }
    }

    fn confirm_clear(&mut self, table: BoundaryTable, existing: i64) -> bool {
        !self.interactive || ask(&format!("Delete {existing} existing rows from '{table}'?"))
    }
}

fn log_batch(p: &BatchProgress) {
    info!(
        "batch {}: {}/{} ({:.1}%) imported={} errors={}",
        p.batch,
        p.processed,
        p.total,
        p.percent(),
        p.imported,
        p.errors
    );
}

fn ask(question: &str) -> bool {
    print!("{question} [y/N] ");
    if io::stdout().flush().is_err() {
        return false;
    }
    let mut line = String::new();
    match io::stdin().lock().read_line(&mut line) {
        Ok(_) => matches!(line.trim().to_lowercase().as_str(), "y" | "yes"),
        Err(_) => false,
    }
}

fn import_districts(
    db: &mut DatabaseClient,
    geojson_file: &Path,
    table: BoundaryTable,
    options: ImportOptions,
    interactive: bool,
) -> anyhow::Result<()> {
    if !geojson_file.exists() {
        bail!("GeoJSON file not found: {}", geojson_file.display());
    }

    let mut observer = CliObserver { interactive };
    let report = BoundaryImporter::new(db, options).import_from_file(geojson_file, table, &mut observer)?;

    println!("Import into '{table}' finished");
    println!("  total:    {}", report.total_features);
    println!("  imported: {}", report.imported_count);
    println!("  errors:   {}", report.error_count);
    println!("  success:  {:.1}%", report.success_percentage());
    for msg in report.errors.iter().take(10) {
        println!("  - {msg}");
    }
    if report.errors.len() > 10 {
        println!("  ... {} more errors", report.errors.len() - 10);
    }

    if report.total_features > 0 && report.imported_count == 0 {
        bail!("no features were imported");
    }
    Ok(())
}

fn derive_counties(
    db: &mut DatabaseClient,
    table: BoundaryTable,
    options: ImportOptions,
    interactive: bool,
) -> anyhow::Result<()> {
    for required in [BoundaryTable::Hangjungdong, table] {
        if !db.table_exists(required.as_str())? {
            bail!("table '{required}' does not exist; run setup first");
        }
    }

    if options.mode == ImportMode::Replace {
        let existing = db.count_rows(table)?;
        if existing > 0 {
            let mut observer = CliObserver { interactive };
            if !observer.confirm_clear(table, existing) {
                bail!("clearing {existing} existing rows of '{table}' was declined");
            }
            let deleted = db.clear_table(table)?;
            info!(%table, deleted, "existing rows deleted");
        }
    }

    let report = Aggregator::new(db).derive_sigungu(&mut log_aggregate_event)?;
    print_aggregate(&report, report.summary.len());
    if report.written == 0 {
        bail!("no county boundaries were written");
    }
    Ok(())
}

fn log_aggregate_event(event: &AggregateEvent) {
    match event {
        AggregateEvent::SourceLoaded { rows, .. } => info!(rows, "district rows read"),
        AggregateEvent::Grouped { groups } => info!(groups, "groups built"),
        AggregateEvent::Progress { done, total } => info!(
            "progress: {:.1}% ({done}/{total})",
            event.percent().unwrap_or(100.0)
        ),
        AggregateEvent::GroupFailed { label, error } => warn!(group = %label, "failed: {error}"),
        AggregateEvent::Finished { written, groups } => info!(written, groups, "derivation done"),
    }
}

fn print_aggregate(report: &AggregateReport, limit: usize) {
    let target = report.level.target();
    println!(
        "'{target}' derived: {} of {} groups written from {} rows",
        report.written, report.groups, report.source_rows
    );
    for line in report.summary.iter().take(limit) {
        let area = line
            .area_km2
            .map(|a| format!("{a:.2}km²"))
            .unwrap_or_else(|| "-".into());
        match line.sgg_count {
            Some(sgg) => println!("  {}: {} dong, {sgg} sigungu, {area}", line.name, line.dong_count),
            None => println!("  {}: {} dong, {area}", line.name, line.dong_count),
        }
    }
    for failure in &report.failures {
        println!("  failed: {failure}");
    }
}

// -----------------------------------------------------------------------------
// analyze / verify
// -----------------------------------------------------------------------------

fn analyze(geojson_file: &Path) -> anyhow::Result<()> {
    if !geojson_file.exists() {
        bail!("GeoJSON file not found: {}", geojson_file.display());
    }
    let report = analysis::analyze_file(geojson_file)?;
    print_analysis(&report);
    Ok(())
}

fn print_analysis(report: &AnalysisReport) {
    let f = &report.features;
    println!("Encoding: {}", report.encoding);
    println!("Features: {}", f.total_features);
    println!("Properties ({}): {}", f.unique_properties.len(), f.unique_properties.join(", "));
    if let Some(geometry) = &report.geometry {
        println!("Geometry types: {}", geometry.geometry_types.join(", "));
    }
    println!("Sido: {}, Sigungu: {}", f.sido_count, f.sgg_count);

    println!("Top sido:");
    for entry in &f.top_sido {
        println!("  {}: {}", entry.name, entry.count);
    }
    println!("Top sigungu:");
    for entry in &f.top_sgg {
        println!("  {}: {}", entry.name, entry.count);
    }

    if let Some(props) = &report.properties {
        println!("Sample properties:");
        for (key, value) in &props.sample_properties {
            println!("  {key}: {value}");
        }
    }
}

fn print_verify(report: &VerifyReport) {
    println!("Table '{}': {} rows", report.table, report.total);
    match &report.details {
        None => println!("  (empty)"),
        Some(TableDetails::Grouped { top, samples }) => {
            println!("Top sido:");
            for g in top {
                println!("  {}: {}", g.name, g.count);
            }
            println!("Random samples:");
            for s in samples {
                println!("  {s}");
            }
        }
        Some(TableDetails::Provinces(provinces)) => {
            println!("Provinces:");
            for p in provinces {
                println!("  {} ({})", p.name, p.code);
            }
        }
    }
    if !report.geometry_types.is_empty() {
        println!("Geometry:");
        for g in &report.geometry_types {
            println!("  {}: {}", g.geometry_type, g.count);
        }
    }
}
