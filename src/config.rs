use crate::volatility::{VolatilityModel, DEFAULT_ENTROPY_WEIGHT, DEFAULT_STRESS_WEIGHT};

/// Runtime settings for analysis runs, read from the environment.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisConfig {
    pub seed: u64,
    pub entropy_weight: f64,
    pub stress_weight: f64,
    pub report_path: String,
    pub ledger_path: String,
    /// Actions per window when windowing a price series
    pub window_size: usize,
    pub window_step: usize,
    /// Bucket width for price-level entropy
    pub price_bucket: f64,
    pub parallel: bool,
    pub table_rows: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            entropy_weight: DEFAULT_ENTROPY_WEIGHT,
            stress_weight: DEFAULT_STRESS_WEIGHT,
            report_path: "out/visual_inspection_data.csv".to_string(),
            ledger_path: "tests/spy_live_data.csv".to_string(),
            window_size: 100,
            window_step: 50,
            price_bucket: 0.05,
            parallel: false,
            table_rows: 10,
        }
    }
}

impl AnalysisConfig {
    pub fn from_env() -> Self {
        let d = Self::default();
        Self {
            seed: std::env::var("SEED").ok().and_then(|v| v.parse().ok()).unwrap_or(d.seed),
            entropy_weight: std::env::var("ENTROPY_WEIGHT").ok().and_then(|v| v.parse().ok()).unwrap_or(d.entropy_weight),
            stress_weight: std::env::var("STRESS_WEIGHT").ok().and_then(|v| v.parse().ok()).unwrap_or(d.stress_weight),
            report_path: std::env::var("REPORT_PATH").unwrap_or(d.report_path),
            ledger_path: std::env::var("LEDGER_PATH").unwrap_or(d.ledger_path),
            window_size: std::env::var("WINDOW_SIZE").ok().and_then(|v| v.parse().ok()).unwrap_or(d.window_size),
            window_step: std::env::var("WINDOW_STEP").ok().and_then(|v| v.parse().ok()).unwrap_or(d.window_step),
            price_bucket: std::env::var("PRICE_BUCKET").ok().and_then(|v| v.parse().ok()).unwrap_or(d.price_bucket),
            parallel: std::env::var("PARALLEL").map(|v| matches!(v.to_lowercase().as_str(), "1" | "true" | "yes")).unwrap_or(d.parallel),
            table_rows: std::env::var("TABLE_ROWS").ok().and_then(|v| v.parse().ok()).unwrap_or(d.table_rows),
        }
    }

    pub fn volatility_model(&self) -> VolatilityModel {
        VolatilityModel::new(self.entropy_weight, self.stress_weight)
    }

    /// Stable short fingerprint of the settings that affect results.
    pub fn fingerprint(&self) -> String {
        crate::logging::params_hash(&format!(
            "seed={};ew={};sw={};win={};step={};bucket={}",
            self.seed,
            self.entropy_weight,
            self.stress_weight,
            self.window_size,
            self.window_step,
            self.price_bucket
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cfg = AnalysisConfig::default();
        assert_eq!(cfg.seed, 42);
        assert_eq!(cfg.volatility_model(), VolatilityModel::default());
        assert_eq!(cfg.window_size, 100);
        assert_eq!(cfg.window_step, 50);
    }

    #[test]
    fn test_fingerprint_tracks_seed() {
        let a = AnalysisConfig::default();
        let b = AnalysisConfig { seed: 7, ..AnalysisConfig::default() };
        assert_eq!(a.fingerprint(), AnalysisConfig::default().fingerprint());
        assert_ne!(a.fingerprint(), b.fingerprint());
    }
}
