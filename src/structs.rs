use log::{Log, Metadata, Record as LogRecord};
use serde::Serialize;
use std::path::PathBuf;

pub const DEFAULT_SOURCE_PATH: &str = "/opt/energy_dashboard/energy_report_JAN_FAIT_ALL.csv";
pub const DEFAULT_DATABASE_PATH: &str = "/opt/energy_dashboard/data/energy.db";

/// Simple logger implementation
pub struct SimpleLogger;

impl Log for SimpleLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &LogRecord) {
        if self.enabled(record.metadata()) {
            println!("[{}] {}", record.level(), record.args());
        }
    }

    fn flush(&self) {}
}

/// One accepted meter reading, ready to be written to the `measurements` table.
#[derive(Debug, Clone, PartialEq)]
pub struct MeasurementRecord {
    /// ISO-8601 local time without offset, e.g. `2024-01-15T08:30:00`
    pub timestamp: String,
    pub production_kwh: f64,
    /// Direct consumption plus grid import
    pub consumption_kwh: f64,
}

/// Raw field values of one source row, looked up by configured column name.
///
/// `None` means the column is absent from the header or the row is short.
#[derive(Debug, Clone, Copy, Default)]
pub struct RawRow<'a> {
    pub timestamp: Option<&'a str>,
    pub production: Option<&'a str>,
    pub consumption: Option<&'a str>,
    pub grid_import: Option<&'a str>,
}

/// Why a source row was left out of the batch.
#[derive(Debug, Clone, PartialEq)]
pub enum RejectReason {
    MissingTimestamp,
    InvalidTimestamp(String),
    AllZero,
}

/// Result of normalizing a single source row.
#[derive(Debug, Clone, PartialEq)]
pub enum RowOutcome {
    Accepted(MeasurementRecord),
    Rejected(RejectReason),
}

/// Header names of the source columns the import reads.
#[derive(Debug, Clone)]
pub struct ColumnMapping {
    pub timestamp: String,
    pub production: String,
    pub consumption: String,
    pub grid_import: String,
}

impl Default for ColumnMapping {
    fn default() -> Self {
        Self {
            timestamp: "Datetime_15min".to_string(),
            production: "Výroba FVE (kWh)".to_string(),
            consumption: "Odběr ČEZ (kWh)".to_string(),
            grid_import: "Dokup elektřiny z ČEZ (kWh)".to_string(),
        }
    }
}

/// Configuration for one import run
#[derive(Debug, Clone)]
pub struct ImportConfig {
    pub source_path: PathBuf,
    pub destination_path: PathBuf,
    pub columns: ColumnMapping,
    pub delimiter: u8,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            source_path: PathBuf::from(DEFAULT_SOURCE_PATH),
            destination_path: PathBuf::from(DEFAULT_DATABASE_PATH),
            columns: ColumnMapping::default(),
            delimiter: b';',
        }
    }
}

/// Rejected row counts, one per reason.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RejectCounts {
    pub missing_timestamp: usize,
    pub invalid_timestamp: usize,
    pub all_zero: usize,
}

impl RejectCounts {
    pub fn record(&mut self, reason: &RejectReason) {
        match reason {
            RejectReason::MissingTimestamp => self.missing_timestamp += 1,
            RejectReason::InvalidTimestamp(_) => self.invalid_timestamp += 1,
            RejectReason::AllZero => self.all_zero += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.missing_timestamp + self.invalid_timestamp + self.all_zero
    }
}

/// Outcome of a complete import run
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ImportSummary {
    /// Data rows read from the source, header excluded
    pub total_rows: usize,
    /// Records that passed normalization and were written
    pub accepted: usize,
    /// Rows in the table after the load (distinct timestamps)
    pub stored: usize,
    pub rejected: RejectCounts,
}
