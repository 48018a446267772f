//! Volatility model: base level plus entropy and stress contributions.

use serde::{Deserialize, Serialize};

pub const DEFAULT_ENTROPY_WEIGHT: f64 = 1.2;
pub const DEFAULT_STRESS_WEIGHT: f64 = 2.5;

/// Smallest weight accepted; keeps the estimate strictly increasing.
const MIN_WEIGHT: f64 = 1e-6;

/// Linear volatility model.
///
/// `estimate = base + entropy * entropy_weight + stress * stress_weight`.
/// Both weights are strictly positive, so the estimate is strictly
/// increasing in entropy and in stress. The weights themselves are a tuning
/// choice.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VolatilityModel {
    pub entropy_weight: f64,
    pub stress_weight: f64,
}

impl Default for VolatilityModel {
    fn default() -> Self {
        Self {
            entropy_weight: DEFAULT_ENTROPY_WEIGHT,
            stress_weight: DEFAULT_STRESS_WEIGHT,
        }
    }
}

impl VolatilityModel {
    pub fn new(entropy_weight: f64, stress_weight: f64) -> Self {
        Self {
            entropy_weight: sanitize_weight(entropy_weight, DEFAULT_ENTROPY_WEIGHT),
            stress_weight: sanitize_weight(stress_weight, DEFAULT_STRESS_WEIGHT),
        }
    }

    pub fn estimate(&self, base: f64, entropy: f64, stress: f64) -> f64 {
        base + entropy * self.entropy_weight + stress * self.stress_weight
    }
}

fn sanitize_weight(w: f64, fallback: f64) -> f64 {
    if w.is_finite() {
        w.max(MIN_WEIGHT)
    } else {
        fallback
    }
}

/// Estimate with the default weights.
pub fn estimate_volatility(base: f64, entropy: f64, stress: f64) -> f64 {
    VolatilityModel::default().estimate(base, entropy, stress)
}

/// Population standard deviation of consecutive price differences.
///
/// Fewer than three prices leave at most one difference, which has no
/// spread, so the result is 0.0.
pub fn realized_volatility(prices: &[f64]) -> f64 {
    if prices.len() < 3 {
        return 0.0;
    }
    let diffs: Vec<f64> = prices.windows(2).map(|w| w[1] - w[0]).collect();
    let n = diffs.len() as f64;
    let mean = diffs.iter().sum::<f64>() / n;
    let var = diffs.iter().map(|d| (d - mean) * (d - mean)).sum::<f64>() / n;
    var.max(0.0).sqrt()
}
