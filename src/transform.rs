use crate::error::Result;
use crate::structs::{
    ColumnMapping, ImportConfig, MeasurementRecord, RawRow, RejectCounts, RejectReason, RowOutcome,
};
use chrono::{NaiveDateTime, Timelike};
use csv::{ReaderBuilder, StringRecord};
use log::{debug, warn};
use std::fs::File;

const SOURCE_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
const STORED_TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Accepted records and rejection statistics for one source file.
#[derive(Debug, Default)]
pub struct ParsedSource {
    pub records: Vec<MeasurementRecord>,
    pub rejected: RejectCounts,
    pub total_rows: usize,
}

/// Positions of the configured columns within the source header.
#[derive(Debug, Clone, Copy)]
struct ColumnIndex {
    timestamp: Option<usize>,
    production: Option<usize>,
    consumption: Option<usize>,
    grid_import: Option<usize>,
}

impl ColumnIndex {
    fn resolve(headers: &StringRecord, columns: &ColumnMapping) -> Self {
        let find = |name: &str| {
            let position = headers.iter().position(|h| h.trim() == name);
            if position.is_none() {
                warn!("Column not found in source header: {}", name);
            }
            position
        };

        Self {
            timestamp: find(&columns.timestamp),
            production: find(&columns.production),
            consumption: find(&columns.consumption),
            grid_import: find(&columns.grid_import),
        }
    }

    fn raw_row<'a>(&self, record: &'a StringRecord) -> RawRow<'a> {
        let field = |idx: Option<usize>| idx.and_then(|i| record.get(i));
        RawRow {
            timestamp: field(self.timestamp),
            production: field(self.production),
            consumption: field(self.consumption),
            grid_import: field(self.grid_import),
        }
    }
}

/// Reads the delimited source file and normalizes every data row.
///
/// Rows that fail normalization are counted and skipped. Only problems with
/// the file itself (missing, unreadable, not UTF-8) are returned as errors.
///
/// # Errors
///
/// Returns `ImportError::Io` if the file cannot be opened and
/// `ImportError::Csv` if a record cannot be read.
pub fn read_measurements(config: &ImportConfig) -> Result<ParsedSource> {
    debug!("Reading source file: {}", config.source_path.display());
    let file = File::open(&config.source_path)?;
    let mut reader = ReaderBuilder::new()
        .delimiter(config.delimiter)
        .has_headers(true)
        .flexible(true)
        .from_reader(file);

    let headers = reader.headers()?.clone();
    let index = ColumnIndex::resolve(&headers, &config.columns);

    let mut parsed = ParsedSource::default();
    for result in reader.records() {
        let record = result?;
        parsed.total_rows += 1;

        match parse_row(&index.raw_row(&record)) {
            RowOutcome::Accepted(measurement) => parsed.records.push(measurement),
            RowOutcome::Rejected(reason) => {
                debug!("Skipping row {}: {:?}", parsed.total_rows, reason);
                parsed.rejected.record(&reason);
            }
        }
    }

    debug!(
        "Read {} rows, accepted {}, rejected {}",
        parsed.total_rows,
        parsed.records.len(),
        parsed.rejected.total()
    );
    Ok(parsed)
}

/// Normalizes one source row into a measurement, or says why it was dropped.
///
/// Consumption is the sum of the direct consumption and grid import columns.
/// A row whose production and consumption are both zero carries no reading
/// and is rejected.
pub fn parse_row(row: &RawRow) -> RowOutcome {
    let ts_raw = row.timestamp.unwrap_or("").trim();
    if ts_raw.is_empty() {
        return RowOutcome::Rejected(RejectReason::MissingTimestamp);
    }

    let Some(timestamp) = parse_timestamp(ts_raw) else {
        return RowOutcome::Rejected(RejectReason::InvalidTimestamp(ts_raw.to_string()));
    };

    let production_kwh = parse_number(row.production.unwrap_or(""));
    let consumption_kwh =
        parse_number(row.consumption.unwrap_or("")) + parse_number(row.grid_import.unwrap_or(""));

    if production_kwh == 0.0 && consumption_kwh == 0.0 {
        return RowOutcome::Rejected(RejectReason::AllZero);
    }

    RowOutcome::Accepted(MeasurementRecord {
        timestamp,
        production_kwh,
        consumption_kwh,
    })
}

/// Parses `YYYY-MM-DD HH:MM:SS` and renders it as `YYYY-MM-DDTHH:MM:SS`.
///
/// Only the exact zero-padded layout is accepted. Leap seconds are rejected.
pub fn parse_timestamp(value: &str) -> Option<String> {
    let value = value.trim();
    if !has_timestamp_shape(value) {
        return None;
    }

    let dt = NaiveDateTime::parse_from_str(value, SOURCE_TIMESTAMP_FORMAT).ok()?;
    if dt.nanosecond() >= 1_000_000_000 {
        return None;
    }
    Some(dt.format(STORED_TIMESTAMP_FORMAT).to_string())
}

// chrono tolerates signs, missing separators and second 60; the layout check
// pins the input to `dddd-dd-dd dd:dd:dd`.
fn has_timestamp_shape(value: &str) -> bool {
    let bytes = value.as_bytes();
    bytes.len() == 19
        && bytes.iter().enumerate().all(|(i, b)| match i {
            4 | 7 => *b == b'-',
            10 => *b == b' ',
            13 | 16 => *b == b':',
            _ => b.is_ascii_digit(),
        })
}

/// Tolerant number parser: decimal commas become dots, and anything empty,
/// malformed or non-finite reads as zero.
pub fn parse_number(value: &str) -> f64 {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return 0.0;
    }

    strip_digit_grouping(&trimmed.replace(',', "."))
        .and_then(|v| v.parse::<f64>().ok())
        .filter(|v| v.is_finite())
        .unwrap_or(0.0)
}

/// Removes `_` digit separators (`1_000`). An underscore that is not
/// between two digits makes the value malformed.
fn strip_digit_grouping(value: &str) -> Option<String> {
    let bytes = value.as_bytes();
    let mut out = String::with_capacity(value.len());
    for (i, c) in value.char_indices() {
        if c == '_' {
            let prev_digit = i > 0 && bytes[i - 1].is_ascii_digit();
            let next_digit = bytes.get(i + 1).is_some_and(u8::is_ascii_digit);
            if !(prev_digit && next_digit) {
                return None;
            }
        } else {
            out.push(c);
        }
    }
    Some(out)
}
