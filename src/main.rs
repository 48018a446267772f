use anyhow::Result;
use serde_json::json;
use std::path::Path;

use entropyfx::config::AnalysisConfig;
use entropyfx::logging::{log, obj, run_id, v_num, v_str, Domain, Level};
use entropyfx::report::{export_report, render_table};
use entropyfx::scenario::{
    market_validation_scenarios, run_parallel, visual_inspection_scenarios, HarnessReport,
    ScenarioHarness,
};

fn usage() -> ! {
    eprintln!("usage: entropyfx [visual|validation]");
    std::process::exit(2);
}

fn main() -> Result<()> {
    let cfg = AnalysisConfig::from_env();
    let preset = std::env::args().nth(1).unwrap_or_else(|| "visual".to_string());
    let scenarios = match preset.as_str() {
        "visual" => visual_inspection_scenarios(),
        "validation" => market_validation_scenarios(),
        _ => usage(),
    };

    log(
        Level::Info,
        Domain::System,
        "start",
        obj(&[
            ("run", v_str(run_id())),
            ("preset", v_str(&preset)),
            ("seed", json!(cfg.seed)),
            ("entropy_weight", v_num(cfg.entropy_weight)),
            ("stress_weight", v_num(cfg.stress_weight)),
            ("parallel", json!(cfg.parallel)),
            ("fingerprint", v_str(&cfg.fingerprint())),
        ]),
    );

    let report = if cfg.parallel {
        run_parallel(&scenarios, cfg.seed, cfg.volatility_model())?
    } else {
        ScenarioHarness::new(cfg.seed, cfg.volatility_model()).run_all(&scenarios)
    };

    print_report(&report, cfg.table_rows);

    let manifest = export_report(Path::new(&cfg.report_path), &report, &cfg.fingerprint())?;
    println!("\nData exported to: {} (sha256 {})", manifest.path, &manifest.hash_sha256[..12]);
    Ok(())
}

fn print_report(report: &HarnessReport, rows: usize) {
    println!("=== Entropy vs Volatility ===\n");
    println!("Generated {} windows\n", report.observations.len());
    print!("{}", render_table(&report.observations, rows));

    println!("\n=== Scenario Summary ===");
    for s in &report.summaries {
        println!(
            "{:<16} windows={:>3}  mean entropy={:.3} bits  mean volatility={:.3}  [{}]",
            s.name,
            s.windows,
            s.mean_entropy,
            s.mean_volatility,
            s.verdict.as_str()
        );
    }

    println!("\n=== Correlation ===");
    match &report.correlation {
        Ok(r) => {
            let strength = report.strength().map(|s| s.as_str()).unwrap_or("undefined");
            println!("Pearson r = {:.3} ({} correlation)", r, strength);
        }
        Err(err) => println!("Pearson r undefined: {}", err),
    }
    let c = report.concordance;
    println!(
        "Concordant pairs: {}/{} (discordant {}, tied volatility {})",
        c.concordant, c.total_pairs, c.discordant, c.tied_b
    );

    if report.thesis_supported() {
        println!("THESIS SUPPORTED: rising entropy tracks rising volatility");
    } else {
        println!("THESIS NOT SUPPORTED: no clear relationship found");
    }
}
