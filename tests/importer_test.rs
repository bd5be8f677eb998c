use lib::{ImportConfig, ImportError, Importer, MeasurementRecord, MeasurementStore, RejectCounts};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

const HEADER: &str =
    "Datetime_15min;Výroba FVE (kWh);Odběr ČEZ (kWh);Dokup elektřiny z ČEZ (kWh)";

fn write_source(dir: &Path, rows: &[&str]) -> std::path::PathBuf {
    let path = dir.join("energy_report.csv");
    let mut contents = String::from(HEADER);
    for row in rows {
        contents.push('\n');
        contents.push_str(row);
    }
    contents.push('\n');
    fs::write(&path, contents).unwrap();
    path
}

fn config_for(dir: &TempDir, rows: &[&str]) -> ImportConfig {
    ImportConfig {
        source_path: write_source(dir.path(), rows),
        destination_path: dir.path().join("data").join("energy.db"),
        ..ImportConfig::default()
    }
}

fn stored(config: &ImportConfig) -> Vec<MeasurementRecord> {
    MeasurementStore::open(&config.destination_path)
        .unwrap()
        .measurements()
        .unwrap()
}

#[test]
fn imports_only_valid_nonzero_rows() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_for(
        &dir,
        &[
            "2024-01-01 00:00:00;1,5;0,2;0",
            ";3;0;0",
            "2024-01-01 00:15:00;0;0;0",
        ],
    );

    let summary = Importer::new(config.clone()).run().unwrap();

    assert_eq!(summary.total_rows, 3);
    assert_eq!(summary.accepted, 1);
    assert_eq!(summary.stored, 1);
    assert_eq!(
        summary.rejected,
        RejectCounts {
            missing_timestamp: 1,
            invalid_timestamp: 0,
            all_zero: 1,
        }
    );
    assert_eq!(
        stored(&config),
        vec![MeasurementRecord {
            timestamp: "2024-01-01T00:00:00".to_string(),
            production_kwh: 1.5,
            consumption_kwh: 0.2,
        }]
    );
}

#[test]
fn skips_unparseable_timestamps_and_tolerates_bad_numbers() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_for(
        &dir,
        &[
            "01.01.2024 00:00;1;1;1",
            "2024-01-01 00:30:00;abc;2,5;",
            "2024-01-01 00:45:00;7.25",
        ],
    );

    let summary = Importer::new(config.clone()).run().unwrap();

    assert_eq!(summary.rejected.invalid_timestamp, 1);
    assert_eq!(summary.accepted, 2);
    assert_eq!(
        stored(&config),
        vec![
            MeasurementRecord {
                timestamp: "2024-01-01T00:30:00".to_string(),
                production_kwh: 0.0,
                consumption_kwh: 2.5,
            },
            MeasurementRecord {
                timestamp: "2024-01-01T00:45:00".to_string(),
                production_kwh: 7.25,
                consumption_kwh: 0.0,
            },
        ]
    );
}

#[test]
fn later_duplicate_timestamp_wins() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_for(
        &dir,
        &["2024-01-01 00:00:00;1;0;0", "2024-01-01 00:00:00;2;0;0"],
    );

    let summary = Importer::new(config.clone()).run().unwrap();

    assert_eq!(summary.accepted, 2);
    assert_eq!(summary.stored, 1);
    assert_eq!(stored(&config)[0].production_kwh, 2.0);
}

#[test]
fn running_twice_matches_running_once() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_for(
        &dir,
        &["2024-01-01 00:00:00;1,5;0,2;0", "2024-01-01 00:15:00;0;1;1"],
    );
    let importer = Importer::new(config);

    importer.run().unwrap();
    let first = stored(importer.config());
    let summary = importer.run().unwrap();
    let second = stored(importer.config());

    assert_eq!(summary.stored, 2);
    assert_eq!(first, second);
}

#[test]
fn rerun_replaces_previous_contents() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_for(&dir, &["2024-01-01 00:00:00;1;0;0"]);
    Importer::new(config.clone()).run().unwrap();

    let config = ImportConfig {
        source_path: write_source(dir.path(), &["2024-02-01 00:00:00;0;3;0"]),
        ..config
    };
    Importer::new(config.clone()).run().unwrap();

    let rows = stored(&config);
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].timestamp, "2024-02-01T00:00:00");
}

#[test]
fn missing_source_is_fatal_after_reset() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_for(&dir, &["2024-01-01 00:00:00;1;0;0"]);
    Importer::new(config.clone()).run().unwrap();

    let missing = ImportConfig {
        source_path: dir.path().join("does_not_exist.csv"),
        ..config.clone()
    };
    let result = Importer::new(missing).run();

    assert!(matches!(result, Err(ImportError::Io(_))));
    assert!(stored(&config).is_empty());
}

#[test]
fn unknown_columns_read_as_empty() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = config_for(&dir, &["2024-01-01 00:00:00;1;2;3"]);
    config.columns.grid_import = "Missing column".to_string();

    let summary = Importer::new(config.clone()).run().unwrap();

    assert_eq!(summary.accepted, 1);
    assert_eq!(stored(&config)[0].consumption_kwh, 2.0);
}

#[test]
fn summary_is_written_as_json() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_for(&dir, &["2024-01-01 00:00:00;1;0;0", ";1;1;1"]);
    let summary = Importer::new(config).run().unwrap();

    let path = dir.path().join("summary.json");
    lib::write_summary(&summary, &path).unwrap();

    let json: serde_json::Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(json["accepted"], 1);
    assert_eq!(json["rejected"]["missing_timestamp"], 1);
}
