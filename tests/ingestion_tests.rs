//! End-to-end ingestion tests for the navlog core.
//!
//! These exercise the background reader, the store and the windowed cursor
//! together through the public API, over real files on disk.

use std::fs;
use std::path::PathBuf;
use std::thread;
use std::time::{Duration, Instant};

use navlog::record::Quantity;
use navlog::{Delimiter, Log, SensorType};

/// Build one valid log line for `sensor` whose ground-truth timestamp is
/// `time`; every other column is zero.
fn sample_line(sensor: SensorType, time: f64, delimiter: Delimiter) -> String {
    let mut toks = vec![(sensor as usize).to_string()];
    toks.extend(std::iter::repeat("0".to_string()).take(sensor.input_cols()));
    toks.push(time.to_string());
    // Remaining real-quantity columns, the state quantity and the covariance
    let remaining = sensor.total_cols() - sensor.input_cols() - 1;
    toks.extend(std::iter::repeat("0".to_string()).take(remaining));
    toks.join(delimiter.as_str())
}

/// Write a temp log file with a unique name, returning its path.
fn write_log(name: &str, contents: &str) -> PathBuf {
    let path = std::env::temp_dir().join(format!("navlog-it-{}-{}", std::process::id(), name));
    fs::write(&path, contents).unwrap_or_else(|e| panic!("failed to write {}: {}", path.display(), e));
    path
}

/// Poll until the run reports completion, with a hard deadline so a hung
/// reader fails the test instead of wedging CI.
fn poll_to_completion(log: &mut Log) {
    let deadline = Instant::now() + Duration::from_secs(5);
    while log.is_running() {
        log.poll();
        assert!(Instant::now() < deadline, "ingestion did not finish in time");
        thread::sleep(Duration::from_millis(1));
    }
    log.poll();
}

// ============================================
// Ingestion Scenarios
// ============================================

#[test]
fn test_three_valid_imu_lines() {
    let contents: String = (1..=3)
        .map(|i| sample_line(SensorType::Imu, i as f64, Delimiter::Space) + "\n")
        .collect();
    let path = write_log("three-imu.log", &contents);

    let mut log = Log::new();
    log.parse(&path);
    poll_to_completion(&mut log);

    assert_eq!(log.store().len(), 3, "all three IMU lines should decode");
    assert_eq!(log.completed(), Some(true));
    for i in 0..3 {
        let record = log.store().at(i).expect("record should exist");
        assert_eq!(record.sensor_type(), SensorType::Imu);
        assert_eq!(record.time(), (i + 1) as f64);
    }

    fs::remove_file(&path).ok();
}

#[test]
fn test_bad_middle_line_is_skipped_not_fatal() {
    let good1 = sample_line(SensorType::Imu, 1.0, Delimiter::Space);
    let mut bad = sample_line(SensorType::Imu, 2.0, Delimiter::Space);
    bad.truncate(bad.rfind(' ').unwrap()); // one token too few
    let good2 = sample_line(SensorType::Imu, 3.0, Delimiter::Space);
    let path = write_log("bad-middle.log", &format!("{good1}\n{bad}\n{good2}\n"));

    let mut log = Log::new();
    log.parse(&path);
    poll_to_completion(&mut log);

    assert_eq!(log.store().len(), 2);
    assert_eq!(log.skipped_lines(), 1);
    // Per-line failure is not file-level failure
    assert_eq!(log.completed(), Some(true));

    fs::remove_file(&path).ok();
}

#[test]
fn test_nonexistent_file_reports_reason() {
    let mut log = Log::new();
    log.parse("/definitely/not/here/run.log");
    poll_to_completion(&mut log);

    assert_eq!(log.store().len(), 0);
    assert_eq!(log.completed(), Some(false));
    let reason = log.last_error().expect("file-open failure must be reportable");
    assert!(!reason.is_empty());
}

#[test]
fn test_mixed_sensor_types_preserve_line_order() {
    let sensors = [
        SensorType::Imu,
        SensorType::Odom,
        SensorType::Camera,
        SensorType::Gnss,
        SensorType::Imu,
    ];
    let contents: String = sensors
        .iter()
        .enumerate()
        .map(|(i, s)| sample_line(*s, i as f64, Delimiter::Space) + "\n")
        .collect();
    let path = write_log("mixed.log", &contents);

    let mut log = Log::new();
    log.parse(&path);
    poll_to_completion(&mut log);

    assert_eq!(log.store().len(), sensors.len());
    for (i, sensor) in sensors.iter().enumerate() {
        let record = log.store().at(i).unwrap();
        assert_eq!(record.sensor_type(), *sensor, "record {i} out of order");
        assert_eq!(record.time(), i as f64);
    }

    fs::remove_file(&path).ok();
}

#[test]
fn test_comma_delimited_deployment() {
    let contents = sample_line(SensorType::Odom, 4.5, Delimiter::Comma) + "\n";
    let path = write_log("comma.log", &contents);

    let mut log = Log::with_delimiter(Delimiter::Comma);
    log.parse(&path);
    poll_to_completion(&mut log);

    assert_eq!(log.store().len(), 1);
    assert_eq!(log.store().time(0), Ok(4.5));

    fs::remove_file(&path).ok();
}

#[test]
fn test_trailing_blank_separator_ends_stream() {
    let contents = format!(
        "{}\n\n{}\n",
        sample_line(SensorType::Imu, 1.0, Delimiter::Space),
        sample_line(SensorType::Imu, 2.0, Delimiter::Space),
    );
    let path = write_log("blank-sep.log", &contents);

    let mut log = Log::new();
    log.parse(&path);
    poll_to_completion(&mut log);

    assert_eq!(log.store().len(), 1);
    assert_eq!(log.completed(), Some(true));

    fs::remove_file(&path).ok();
}

// ============================================
// Windowed Retrieval
// ============================================

#[test]
fn test_get_until_monotonic_windows() {
    let times = [100.0, 100.2, 100.4, 101.0, 102.0];
    let contents: String = times
        .iter()
        .map(|t| sample_line(SensorType::Imu, *t, Delimiter::Space) + "\n")
        .collect();
    let path = write_log("monotonic.log", &contents);

    let mut log = Log::new();
    log.parse(&path);
    poll_to_completion(&mut log);

    // Growing windows partition the store: no gaps, no overlap
    let (first, _) = log.get_until(0.3);
    let first: Vec<f64> = first.iter().map(|r| r.time()).collect();
    assert_eq!(first, vec![100.0, 100.2]);

    let (second, _) = log.get_until(1.0);
    let second: Vec<f64> = second.iter().map(|r| r.time()).collect();
    assert_eq!(second, vec![100.4, 101.0]);

    // elapsed exactly equal to last - base includes the last record once
    let (third, _) = log.get_until(2.0);
    assert_eq!(third.len(), 1);
    assert_eq!(third[0].time(), 102.0);

    // Nothing left, even with a larger window
    let (rest, running) = log.get_until(100.0);
    assert!(rest.is_empty());
    assert!(!running);

    fs::remove_file(&path).ok();
}

#[test]
fn test_get_until_empty_store() {
    let mut log = Log::new();
    let (due, running) = log.get_until(10.0);
    assert!(due.is_empty());
    assert!(!running, "no producer was ever started");
}

#[test]
fn test_reset_replays_from_start() {
    let contents: String = [1.0, 2.0, 3.0]
        .iter()
        .map(|t| sample_line(SensorType::Camera, *t, Delimiter::Space) + "\n")
        .collect();
    let path = write_log("reset.log", &contents);

    let mut log = Log::new();
    log.parse(&path);
    poll_to_completion(&mut log);

    let (all, _) = log.get_until(10.0);
    assert_eq!(all.len(), 3);

    log.reset();
    let (replay, _) = log.get_until(1.0);
    let replay: Vec<f64> = replay.iter().map(|r| r.time()).collect();
    assert_eq!(replay, vec![1.0, 2.0]);

    fs::remove_file(&path).ok();
}

// ============================================
// Store Projections
// ============================================

#[test]
fn test_series_projection_over_ingested_log() {
    let contents: String = (0..10)
        .map(|i| sample_line(SensorType::Imu, i as f64, Delimiter::Space) + "\n")
        .collect();
    let path = write_log("series.log", &contents);

    let mut log = Log::new();
    log.parse(&path);
    poll_to_completion(&mut log);

    use navlog::record::QuantityField;
    let series = log.store().series(QuantityField::BgX, 5);
    assert_eq!(series.len(), 2);
    assert_eq!(series[0], (0.0, 0.0));
    assert_eq!(series[1], (5.0, 0.0));

    assert_eq!(log.store().trajectory(1).len(), 10);

    fs::remove_file(&path).ok();
}

#[test]
fn test_total_cols_contract() {
    // The column contract the producer and this crate agree on
    assert_eq!(SensorType::Imu.total_cols(), 7 + 2 * Quantity::COLS + 324);
    assert_eq!(SensorType::Odom.total_cols(), 4 + 2 * Quantity::COLS + 324);
    assert_eq!(SensorType::Camera.total_cols(), 7 + 2 * Quantity::COLS + 324);
    assert_eq!(SensorType::Gnss.total_cols(), 7 + 2 * Quantity::COLS + 324);
}
