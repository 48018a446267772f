use entropyfx::report::{default_manifest_path, export_report, file_sha256, ReportManifest, REPORT_COLUMNS};
use entropyfx::scenario::{visual_inspection_scenarios, MarketScenario, ScenarioHarness};
use entropyfx::volatility::VolatilityModel;
use std::fs;
use tempfile::TempDir;

#[test]
fn exports_every_window() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("out/visual_inspection_data.csv");
    let report = ScenarioHarness::new(42, VolatilityModel::default()).run_all(&visual_inspection_scenarios());

    let manifest = export_report(&path, &report, "abc").unwrap();
    let content = fs::read_to_string(&path).unwrap();
    let lines: Vec<&str> = content.lines().collect();
    assert_eq!(lines[0], REPORT_COLUMNS.join(","));
    assert_eq!(lines.len(), 61);
    assert!(lines[1].starts_with("1,"));
    assert!(lines[60].starts_with("60,"));
    assert!(lines[60].contains(",Recovery,"));

    assert_eq!(manifest.rows, 60);
    assert_eq!(manifest.hash_sha256, file_sha256(&path).unwrap());
    let stored: ReportManifest =
        serde_json::from_str(&fs::read_to_string(default_manifest_path(&path)).unwrap()).unwrap();
    assert_eq!(stored.hash_sha256, manifest.hash_sha256);
    assert_eq!(stored.config_fingerprint, "abc");
}

#[test]
fn undefined_correlation_is_recorded() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("frozen.csv");
    let frozen = MarketScenario::new("Frozen", "all hold", 1.0, 0.1, 10, 1.0, 4);
    let report = ScenarioHarness::new(1, VolatilityModel::default()).run_all(&[frozen]);

    let manifest = export_report(&path, &report, "x").unwrap();
    assert!(manifest.correlation.is_none());
    assert!(manifest.correlation_error.is_some());
    assert!(!manifest.thesis_supported);
}
