use crate::error::Result;
use crate::structs::{ImportSummary, MeasurementRecord};
use log::debug;
use rusqlite::{Connection, params};
use std::{fs, fs::File, path::Path};

/// SQLite destination holding the `measurements` table.
///
/// The connection is closed when the store is dropped.
pub struct MeasurementStore {
    conn: Connection,
}

impl MeasurementStore {
    /// Opens the database file, creating it and any missing parent
    /// directories first.
    ///
    /// # Errors
    /// Returns error if the directory cannot be created or SQLite cannot open the file.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        debug!("Opening database: {}", path.display());
        let conn = Connection::open(path)?;
        Ok(Self { conn })
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Ok(Self { conn })
    }

    /// Drops and recreates the `measurements` table.
    ///
    /// Previously imported rows are gone as soon as this returns, whether or
    /// not a later load succeeds.
    pub fn reset_schema(&self) -> Result<()> {
        self.conn.execute_batch(
            "DROP TABLE IF EXISTS measurements;
             CREATE TABLE IF NOT EXISTS measurements (
                 timestamp TEXT PRIMARY KEY,
                 production_kwh REAL,
                 consumption_kwh REAL
             );",
        )?;
        Ok(())
    }

    /// Writes all records in a single transaction, replacing rows that share a timestamp.
    ///
    /// # Returns
    /// The number of records written.
    ///
    /// # Errors
    /// Returns error if the table is missing or any insert fails; nothing is committed then.
    pub fn load_batch(&mut self, records: &[MeasurementRecord]) -> Result<usize> {
        let tx = self.conn.transaction()?;
        {
            let mut stmt = tx.prepare(
                "INSERT OR REPLACE INTO measurements (timestamp, production_kwh, consumption_kwh)
                 VALUES (?1, ?2, ?3)",
            )?;
            for record in records {
                stmt.execute(params![
                    record.timestamp,
                    record.production_kwh,
                    record.consumption_kwh
                ])?;
            }
        }
        tx.commit()?;
        Ok(records.len())
    }

    pub fn row_count(&self) -> Result<usize> {
        let count: usize = self
            .conn
            .query_row("SELECT COUNT(*) FROM measurements", [], |row| row.get(0))?;
        Ok(count)
    }

    /// All stored measurements ordered by timestamp.
    pub fn measurements(&self) -> Result<Vec<MeasurementRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT timestamp, production_kwh, consumption_kwh
             FROM measurements
             ORDER BY timestamp ASC",
        )?;
        let rows = stmt
            .query_map([], |row| {
                Ok(MeasurementRecord {
                    timestamp: row.get(0)?,
                    production_kwh: row.get(1)?,
                    consumption_kwh: row.get(2)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }
}

/// Writes an import summary to a pretty-formatted JSON file.
///
/// # Errors
/// Returns error if file cannot be created or serialization fails.
pub fn write_summary(summary: &ImportSummary, output_path: &Path) -> Result<()> {
    let file = File::create(output_path)?;
    serde_json::to_writer_pretty(file, summary)?;
    Ok(())
}
