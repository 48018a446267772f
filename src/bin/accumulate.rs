//! Append one JSON quote to the CSV ledger.
//!
//! Usage: accumulate '<json>'   (ledger path from LEDGER_PATH)

use entropyfx::config::AnalysisConfig;
use entropyfx::ledger::Ledger;

fn main() {
    let raw = match std::env::args().nth(1) {
        Some(r) => r,
        None => {
            eprintln!("usage: accumulate '<quote json>'");
            std::process::exit(1);
        }
    };
    let cfg = AnalysisConfig::from_env();
    let ledger = Ledger::new(&cfg.ledger_path);
    match ledger.append_now(&raw) {
        Ok(_) => println!("Data saved to {}", ledger.path().display()),
        Err(err) => {
            eprintln!("{:#}", err);
            std::process::exit(1);
        }
    }
}
