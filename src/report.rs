//! Report export: window observations to CSV plus a JSON manifest.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sha2::{Digest, Sha256};
use std::fs::{create_dir_all, File};
use std::io::{BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use crate::logging::{log, obj, v_str, Domain, Level};
use crate::scenario::{HarnessReport, WindowObservation};

pub const REPORT_COLUMNS: [&str; 5] = [
    "Window_ID",
    "Entropy",
    "Volatility",
    "Market_Condition",
    "Behavior_Pattern",
];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportManifest {
    pub path: String,
    pub hash_sha256: String,
    pub rows: u64,
    pub correlation: Option<f64>,
    pub correlation_error: Option<String>,
    pub concordant_pairs: usize,
    pub tied_volatility_pairs: usize,
    pub total_pairs: usize,
    pub thesis_supported: bool,
    pub config_fingerprint: String,
    pub generated_at: String,
}

/// Write observations as CSV, replacing any existing file.
pub fn write_observations_csv(path: &Path, observations: &[WindowObservation]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        create_dir_all(parent).with_context(|| format!("create {}", parent.display()))?;
    }
    let file = File::create(path).with_context(|| format!("create {}", path.display()))?;
    let mut out = BufWriter::new(file);
    writeln!(out, "{}", REPORT_COLUMNS.join(","))?;
    for o in observations {
        writeln!(
            out,
            "{},{:.6},{:.6},{},{}",
            o.window_id,
            o.entropy,
            o.volatility,
            csv_field(&o.scenario_label),
            o.behavior.as_str()
        )?;
    }
    out.flush()?;
    log(
        Level::Info,
        Domain::Report,
        "csv_written",
        obj(&[
            ("path", v_str(&path.display().to_string())),
            ("rows", json!(observations.len())),
        ]),
    );
    Ok(())
}

fn csv_field(s: &str) -> String {
    if s.contains(',') || s.contains('"') || s.contains('\n') {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}

/// Export the report CSV and its manifest; returns the manifest.
pub fn export_report(path: &Path, report: &HarnessReport, config_fingerprint: &str) -> Result<ReportManifest> {
    write_observations_csv(path, &report.observations)?;
    let manifest = ReportManifest {
        path: path.display().to_string(),
        hash_sha256: file_sha256(path)?,
        rows: report.observations.len() as u64,
        correlation: report.correlation.as_ref().ok().copied(),
        correlation_error: report.correlation.as_ref().err().map(|e| e.to_string()),
        concordant_pairs: report.concordance.concordant,
        tied_volatility_pairs: report.concordance.tied_b,
        total_pairs: report.concordance.total_pairs,
        thesis_supported: report.thesis_supported(),
        config_fingerprint: config_fingerprint.to_string(),
        generated_at: crate::logging::ts_now(),
    };
    let manifest_path = default_manifest_path(path);
    let json = serde_json::to_string_pretty(&manifest)?;
    std::fs::write(&manifest_path, json).with_context(|| format!("write {}", manifest_path.display()))?;
    Ok(manifest)
}

pub fn file_sha256(path: &Path) -> Result<String> {
    let mut file = File::open(path).with_context(|| format!("open {}", path.display()))?;
    let mut hasher = Sha256::new();
    let mut buf = [0u8; 8192];
    loop {
        let n = file.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(hex::encode(hasher.finalize()))
}

pub fn default_manifest_path(report_path: &Path) -> PathBuf {
    let mut p = report_path.to_path_buf();
    let fname = report_path
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or("report.csv");
    p.set_file_name(format!("{}.manifest.json", fname));
    p
}

/// Fixed-width table of the first `limit` observations.
pub fn render_table(observations: &[WindowObservation], limit: usize) -> String {
    let mut out = String::new();
    out.push_str("Window | Entropy | Volatility | Market Condition | Behavior\n");
    out.push_str("-------|---------|------------|------------------|--------------\n");
    for o in observations.iter().take(limit) {
        out.push_str(&format!(
            "{:>6} | {:>7.3} | {:>10.3} | {:>16} | {}\n",
            o.window_id,
            o.entropy,
            o.volatility,
            o.scenario_label,
            o.behavior.as_str()
        ));
    }
    out
}
