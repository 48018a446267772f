//! Rolling-window entropy over a recorded price series.
//!
//! Reads the price column of a ledger CSV, turns consecutive moves into
//! hold/buy/sell actions, and reports entropy against realized volatility
//! per window.
//!
//! Usage: windows [ledger.csv] [label]

use anyhow::{bail, Result};
use std::path::Path;

use entropyfx::config::AnalysisConfig;
use entropyfx::entropy::price_level_entropy;
use entropyfx::ledger::Ledger;
use entropyfx::report::{export_report, render_table};
use entropyfx::scenario::{observe_price_windows, HarnessReport, ScenarioSummary};

fn main() -> Result<()> {
    let cfg = AnalysisConfig::from_env();
    let path = std::env::args().nth(1).unwrap_or_else(|| cfg.ledger_path.clone());
    let label = std::env::args().nth(2).unwrap_or_else(|| "SPY".to_string());

    let prices = Ledger::new(&path).read_prices()?;
    if prices.len() <= cfg.window_size {
        bail!(
            "{} has {} prices; need more than the window size {}",
            path,
            prices.len(),
            cfg.window_size
        );
    }

    let observations = observe_price_windows(&prices, cfg.window_size, cfg.window_step, &label);
    let summary = ScenarioSummary::from_observations(&label, &observations);
    let report = HarnessReport::from_observations(vec![summary], observations);

    println!("Prices: {}  windows: {}", prices.len(), report.observations.len());
    println!(
        "Price-level entropy (bucket {}): {:.3} bits",
        cfg.price_bucket,
        price_level_entropy(&prices, cfg.price_bucket)
    );
    print!("{}", render_table(&report.observations, cfg.table_rows));
    match &report.correlation {
        Ok(r) => println!("Entropy/volatility correlation: {:.3}", r),
        Err(err) => println!("Entropy/volatility correlation undefined: {}", err),
    }

    let manifest = export_report(Path::new(&cfg.report_path), &report, &cfg.fingerprint())?;
    println!("Data exported to: {}", manifest.path);
    Ok(())
}
