use crate::error::Result;
use crate::load::MeasurementStore;
use crate::structs::{ImportConfig, ImportSummary};
use crate::transform::read_measurements;
use log::{debug, info};

/// Full-replace import of one source file into the `measurements` table.
pub struct Importer {
    config: ImportConfig,
}

impl Importer {
    pub fn new(config: ImportConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ImportConfig {
        &self.config
    }

    /// Resets the destination table, parses the source and loads the accepted records.
    ///
    /// The table is recreated before the source is opened, so a missing or
    /// unreadable source leaves the destination empty.
    ///
    /// # Errors
    ///
    /// Returns `ImportError` if the store cannot be opened or written, or the
    /// source cannot be read. Malformed rows are never errors.
    pub fn run(&self) -> Result<ImportSummary> {
        let mut store = MeasurementStore::open(&self.config.destination_path)?;
        store.reset_schema()?;
        debug!("Recreated measurements table");

        let parsed = read_measurements(&self.config)?;
        info!(
            "Parsed {} rows from {} ({} rejected)",
            parsed.total_rows,
            self.config.source_path.display(),
            parsed.rejected.total()
        );

        let accepted = store.load_batch(&parsed.records)?;
        let stored = store.row_count()?;
        debug!("Committed {} records, table holds {} rows", accepted, stored);

        Ok(ImportSummary {
            total_rows: parsed.total_rows,
            accepted,
            stored,
            rejected: parsed.rejected,
        })
    }
}
