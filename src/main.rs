use clap::Parser;
use lib::structs::{DEFAULT_DATABASE_PATH, DEFAULT_SOURCE_PATH};
use lib::{ColumnMapping, ImportConfig, ImportError, Importer, SimpleLogger, write_summary};
use log::debug;
use std::path::PathBuf;
use std::time::Instant;

static LOGGER: SimpleLogger = SimpleLogger;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Semicolon-delimited meter export to import
    #[arg(short, long, default_value = DEFAULT_SOURCE_PATH)]
    input_file: PathBuf,

    /// SQLite database file (created if absent)
    #[arg(short, long, default_value = DEFAULT_DATABASE_PATH)]
    database: PathBuf,

    /// Field delimiter of the source file
    #[arg(long, default_value_t = ';')]
    delimiter: char,

    /// Header of the 15-minute timestamp column
    #[arg(long, default_value = "Datetime_15min")]
    timestamp_column: String,

    /// Header of the production column
    #[arg(long, default_value = "Výroba FVE (kWh)")]
    production_column: String,

    /// Header of the direct consumption column
    #[arg(long, default_value = "Odběr ČEZ (kWh)")]
    consumption_column: String,

    /// Header of the grid import column
    #[arg(long, default_value = "Dokup elektřiny z ČEZ (kWh)")]
    import_column: String,

    /// Optional path for a JSON import summary
    #[arg(long)]
    summary: Option<PathBuf>,

    /// Log level for output
    #[arg(long, default_value = "false")]
    debug: bool,
}

fn main() -> Result<(), ImportError> {
    let total_start = Instant::now();
    log::set_logger(&LOGGER).map_err(|e| ImportError::Config(e.to_string()))?;

    let args = Args::parse();
    if args.debug {
        log::set_max_level(log::LevelFilter::Debug);
    } else {
        log::set_max_level(log::LevelFilter::Info);
    }

    if !args.delimiter.is_ascii() {
        return Err(ImportError::Config(format!(
            "delimiter must be a single ASCII character, got '{}'",
            args.delimiter
        )));
    }

    let config = ImportConfig {
        source_path: args.input_file,
        destination_path: args.database,
        columns: ColumnMapping {
            timestamp: args.timestamp_column,
            production: args.production_column,
            consumption: args.consumption_column,
            grid_import: args.import_column,
        },
        delimiter: args.delimiter as u8,
    };
    debug!(
        "Source: {} | Database: {} | Columns: {:?}",
        config.source_path.display(),
        config.destination_path.display(),
        config.columns
    );

    let importer = Importer::new(config);
    let summary = importer.run()?;
    debug!(
        "Rejected rows | missing timestamp={} invalid timestamp={} all zero={}",
        summary.rejected.missing_timestamp,
        summary.rejected.invalid_timestamp,
        summary.rejected.all_zero
    );

    if let Some(path) = &args.summary {
        write_summary(&summary, path)?;
        debug!("Wrote summary to {}", path.display());
    }

    println!("Imported rows: {}", summary.accepted);
    debug!("Import completed in {:.2?}", total_start.elapsed());
    Ok(())
}
