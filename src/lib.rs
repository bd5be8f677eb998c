pub mod error;
pub mod import;
pub mod load;
pub mod structs;
pub mod transform;

// Re-export public API
pub use error::{ImportError, Result};
pub use import::Importer;
pub use load::{MeasurementStore, write_summary};
pub use structs::{
    ColumnMapping, ImportConfig, ImportSummary, MeasurementRecord, RawRow, RejectCounts,
    RejectReason, RowOutcome, SimpleLogger,
};
pub use transform::{ParsedSource, parse_number, parse_row, parse_timestamp, read_measurements};
