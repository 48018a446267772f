//! Append-only CSV ledger of quote snapshots.
//!
//! Each append takes one JSON quote object (`c`, `h`, `l`, `o`, `pc`) and
//! writes one timestamped row. The header is written only when the file is
//! created. Input that does not parse is rejected before the file is touched.

use anyhow::{anyhow, bail, Context, Result};
use chrono::{Local, NaiveDateTime};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::fs::{create_dir_all, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use crate::logging::{log, obj, v_num, v_str, Domain, Level};

pub const LEDGER_HEADER: &str = "Timestamp,Price,High,Low,Open,PrevClose";
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// One quote snapshot. Missing fields read as 0.0.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct QuoteRecord {
    /// Current / close price
    #[serde(default)]
    pub c: f64,
    #[serde(default)]
    pub h: f64,
    #[serde(default)]
    pub l: f64,
    #[serde(default)]
    pub o: f64,
    /// Previous close
    #[serde(default)]
    pub pc: f64,
}

impl QuoteRecord {
    pub fn parse(raw: &str) -> Result<Self> {
        let value: serde_json::Value =
            serde_json::from_str(raw).map_err(|e| anyhow!("invalid quote JSON: {}", e))?;
        if !value.is_object() {
            bail!("quote must be a JSON object");
        }
        serde_json::from_value(value).map_err(|e| anyhow!("invalid quote fields: {}", e))
    }
}

#[derive(Debug, Clone)]
pub struct Ledger {
    path: PathBuf,
}

impl Ledger {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append `record` stamped with `ts`, writing the header first if the
    /// ledger does not exist yet.
    pub fn append(&self, record: &QuoteRecord, ts: NaiveDateTime) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            create_dir_all(parent).with_context(|| format!("create {}", parent.display()))?;
        }
        let exists = self.path.exists();
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .with_context(|| format!("open ledger {}", self.path.display()))?;

        let mut buf = String::new();
        if !exists {
            buf.push_str(LEDGER_HEADER);
            buf.push('\n');
        }
        buf.push_str(&format!(
            "{},{},{},{},{},{}\n",
            ts.format(TIMESTAMP_FORMAT),
            record.c,
            record.h,
            record.l,
            record.o,
            record.pc
        ));
        file.write_all(buf.as_bytes())?;

        log(
            Level::Info,
            Domain::Ledger,
            "append",
            obj(&[
                ("path", v_str(&self.path.display().to_string())),
                ("price", v_num(record.c)),
                ("header_written", json!(!exists)),
            ]),
        );
        Ok(())
    }

    /// Parse then append; a parse failure writes nothing.
    pub fn append_raw(&self, raw: &str, ts: NaiveDateTime) -> Result<QuoteRecord> {
        let record = match QuoteRecord::parse(raw) {
            Ok(r) => r,
            Err(err) => {
                log(
                    Level::Warn,
                    Domain::Ledger,
                    "rejected",
                    obj(&[("reason", v_str(&err.to_string()))]),
                );
                return Err(err);
            }
        };
        self.append(&record, ts)?;
        Ok(record)
    }

    pub fn append_now(&self, raw: &str) -> Result<QuoteRecord> {
        self.append_raw(raw, Local::now().naive_local())
    }

    /// Price column of every data row, in file order.
    pub fn read_prices(&self) -> Result<Vec<f64>> {
        read_price_column(&self.path, 1)
    }
}

/// Read one numeric column from a headered CSV file.
///
/// The first non-empty line is taken as the header. Rows whose column does
/// not parse are skipped; a file with no header is an error.
pub fn read_price_column(path: &Path, column: usize) -> Result<Vec<f64>> {
    let file = std::fs::File::open(path).with_context(|| format!("open {}", path.display()))?;
    let mut lines = BufReader::new(file).lines();
    let mut saw_header = false;
    let mut prices = Vec::new();
    while let Some(line) = lines.next().transpose()? {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        if !saw_header {
            saw_header = true;
            continue;
        }
        if let Some(v) = trimmed.split(',').nth(column).and_then(|f| f.trim().parse::<f64>().ok()) {
            prices.push(v);
        }
    }
    if !saw_header {
        bail!("{} has no header row", path.display());
    }
    Ok(prices)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_record() {
        let r = QuoteRecord::parse(r#"{"c":681.27,"h":681.7,"l":677.52,"o":680.0,"pc":679.1}"#).unwrap();
        assert_eq!(r.c, 681.27);
        assert_eq!(r.pc, 679.1);
    }

    #[test]
    fn test_parse_missing_fields_default() {
        let r = QuoteRecord::parse(r#"{"c":10.5,"t":1700000000}"#).unwrap();
        assert_eq!(r.c, 10.5);
        assert_eq!(r.h, 0.0);
        assert_eq!(r.pc, 0.0);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(QuoteRecord::parse("not json").is_err());
        assert!(QuoteRecord::parse("[1,2,3]").is_err());
        assert!(QuoteRecord::parse(r#"{"c":"high"}"#).is_err());
    }
}
