//! Correlation between paired entropy and volatility series.
//!
//! [`pearson_correlation`] is the parametric check; [`rank_concordance`] is
//! the stricter pairwise-ordering check used as a fallback when the
//! coefficient is undefined.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Entropy differences below this count as ties.
pub const TIE_EPS: f64 = 1e-12;

/// Reasons a correlation cannot be computed.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CorrelationError {
    #[error("series lengths differ: {left} vs {right}")]
    LengthMismatch { left: usize, right: usize },

    #[error("need at least 2 observations, got {0}")]
    TooFewObservations(usize),

    #[error("series has zero variance")]
    ZeroVariance,

    #[error("series contains non-finite values")]
    NonFinite,
}

/// Pearson product-moment correlation of `a` and `b`, in [-1, 1].
///
/// Undefined inputs (mismatched lengths, fewer than two points, a constant
/// series, NaN or infinite values) are reported as errors rather than as a
/// NaN or a silent 0.0.
pub fn pearson_correlation(a: &[f64], b: &[f64]) -> Result<f64, CorrelationError> {
    if a.len() != b.len() {
        return Err(CorrelationError::LengthMismatch {
            left: a.len(),
            right: b.len(),
        });
    }
    if a.len() < 2 {
        return Err(CorrelationError::TooFewObservations(a.len()));
    }
    if a.iter().chain(b.iter()).any(|x| !x.is_finite()) {
        return Err(CorrelationError::NonFinite);
    }
    if is_constant(a) || is_constant(b) {
        return Err(CorrelationError::ZeroVariance);
    }

    let n = a.len() as f64;
    let mean_a = a.iter().sum::<f64>() / n;
    let mean_b = b.iter().sum::<f64>() / n;

    let mut numerator = 0.0;
    let mut ss_a = 0.0;
    let mut ss_b = 0.0;
    for (x, y) in a.iter().zip(b.iter()) {
        let da = x - mean_a;
        let db = y - mean_b;
        numerator += da * db;
        ss_a += da * da;
        ss_b += db * db;
    }

    let denom = ss_a.sqrt() * ss_b.sqrt();
    if denom <= 0.0 || !denom.is_finite() {
        return Err(CorrelationError::ZeroVariance);
    }
    Ok((numerator / denom).clamp(-1.0, 1.0))
}

fn is_constant(xs: &[f64]) -> bool {
    xs.iter().all(|x| *x == xs[0])
}

/// Pairwise ordering agreement between two series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Concordance {
    pub concordant: usize,
    pub discordant: usize,
    /// Pairs ordered in the first series but tied in the second.
    #[serde(default)]
    pub tied_b: usize,
    /// Pairs compared, i.e. all pairs not tied in the first series.
    pub total_pairs: usize,
}

impl Concordance {
    /// Every compared pair agrees, and at least one pair was compared.
    pub fn is_perfect(&self) -> bool {
        self.total_pairs > 0 && self.concordant == self.total_pairs
    }

    pub fn ratio(&self) -> Option<f64> {
        if self.total_pairs == 0 {
            None
        } else {
            Some(self.concordant as f64 / self.total_pairs as f64)
        }
    }
}

/// Count index pairs whose relative order agrees between `a` and `b`.
///
/// Pairs tied in `a` are skipped. A compared pair tied in `b` has no order
/// and counts toward `tied_b`, never `concordant`. Otherwise the pair is
/// concordant when `a[i] < a[j]` has the same truth value as `b[i] < b[j]`.
pub fn rank_concordance(a: &[f64], b: &[f64]) -> Result<Concordance, CorrelationError> {
    if a.len() != b.len() {
        return Err(CorrelationError::LengthMismatch {
            left: a.len(),
            right: b.len(),
        });
    }
    let mut out = Concordance::default();
    for i in 0..a.len() {
        for j in (i + 1)..a.len() {
            if (a[i] - a[j]).abs() < TIE_EPS {
                continue;
            }
            out.total_pairs += 1;
            if (b[i] - b[j]).abs() < TIE_EPS {
                out.tied_b += 1;
                continue;
            }
            let a_order = a[i] < a[j];
            let b_order = b[i] < b[j];
            if a_order == b_order {
                out.concordant += 1;
            } else {
                out.discordant += 1;
            }
        }
    }
    Ok(out)
}

/// Qualitative reading of a correlation coefficient.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CorrelationStrength {
    Strong,
    Moderate,
    Weak,
    Negative,
}

impl CorrelationStrength {
    pub fn classify(r: f64) -> Self {
        if r > 0.7 {
            Self::Strong
        } else if r > 0.3 {
            Self::Moderate
        } else if r > -0.3 {
            Self::Weak
        } else {
            Self::Negative
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Strong => "strong positive",
            Self::Moderate => "moderate positive",
            Self::Weak => "weak",
            Self::Negative => "negative",
        }
    }
}

/// Paired entropy/volatility observations accumulated over windows.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CorrelationSeries {
    entropies: Vec<f64>,
    volatilities: Vec<f64>,
}

impl CorrelationSeries {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(n: usize) -> Self {
        Self {
            entropies: Vec::with_capacity(n),
            volatilities: Vec::with_capacity(n),
        }
    }

    pub fn push(&mut self, entropy: f64, volatility: f64) {
        self.entropies.push(entropy);
        self.volatilities.push(volatility);
    }

    pub fn len(&self) -> usize {
        self.entropies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entropies.is_empty()
    }

    pub fn correlation(&self) -> Result<f64, CorrelationError> {
        pearson_correlation(&self.entropies, &self.volatilities)
    }

    pub fn concordance(&self) -> Concordance {
        // Both vectors grow together, so lengths always match.
        rank_concordance(&self.entropies, &self.volatilities).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_self_correlation_is_one() {
        let a = [1.0, 2.5, 0.3, 4.0, 2.2];
        let r = pearson_correlation(&a, &a).unwrap();
        assert!((r - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_anti_correlation() {
        let a = [1.0, 2.0, 3.0, 4.0];
        let b = [8.0, 6.0, 4.0, 2.0];
        let r = pearson_correlation(&a, &b).unwrap();
        assert!((r + 1.0).abs() < 1e-12);
        assert_eq!(CorrelationStrength::classify(r), CorrelationStrength::Negative);
    }

    #[test]
    fn test_constant_series_is_undefined() {
        let a = [1.0, 2.0, 3.0];
        let flat = [0.1, 0.1, 0.1];
        assert_eq!(pearson_correlation(&a, &flat), Err(CorrelationError::ZeroVariance));
        assert_eq!(pearson_correlation(&flat, &a), Err(CorrelationError::ZeroVariance));
    }

    #[test]
    fn test_degenerate_shapes() {
        assert_eq!(
            pearson_correlation(&[1.0, 2.0], &[1.0]),
            Err(CorrelationError::LengthMismatch { left: 2, right: 1 })
        );
        assert_eq!(
            pearson_correlation(&[1.0], &[2.0]),
            Err(CorrelationError::TooFewObservations(1))
        );
        assert_eq!(pearson_correlation(&[], &[]), Err(CorrelationError::TooFewObservations(0)));
        assert_eq!(
            pearson_correlation(&[1.0, f64::NAN], &[1.0, 2.0]),
            Err(CorrelationError::NonFinite)
        );
    }

    #[test]
    fn test_uncorrelated_is_valid_zero() {
        // Symmetric pattern: defined correlation of exactly 0
        let a = [1.0, 2.0, 3.0, 4.0, 5.0];
        let b = [1.0, 2.0, 3.0, 2.0, 1.0];
        let r = pearson_correlation(&a, &b).unwrap();
        assert!(r.abs() < 1e-12);
    }

    #[test]
    fn test_concordance_perfect() {
        let entropies = [0.0, 1.5567, 1.585];
        let vols = [0.2, 2.5, 3.0];
        let c = rank_concordance(&entropies, &vols).unwrap();
        assert_eq!(c.total_pairs, 3);
        assert_eq!(c.concordant, c.total_pairs);
        assert!(c.is_perfect());
        assert_eq!(c.ratio(), Some(1.0));
    }

    #[test]
    fn test_concordance_skips_ties_and_counts_discordant() {
        let a = [1.0, 1.0, 2.0];
        let b = [5.0, 1.0, 0.0];
        let c = rank_concordance(&a, &b).unwrap();
        // (0,1) tied in a; (0,2) and (1,2) both discordant
        assert_eq!(c.total_pairs, 2);
        assert_eq!(c.discordant, 2);
        assert!(!c.is_perfect());
    }

    #[test]
    fn test_concordance_ties_in_b_never_concordant() {
        let down = rank_concordance(&[2.0, 1.0], &[5.0, 5.0]).unwrap();
        let up = rank_concordance(&[1.0, 2.0], &[5.0, 5.0]).unwrap();
        for c in [down, up] {
            assert_eq!(c.total_pairs, 1);
            assert_eq!(c.tied_b, 1);
            assert_eq!(c.concordant, 0);
            assert_eq!(c.discordant, 0);
            assert!(!c.is_perfect());
            assert_eq!(c.ratio(), Some(0.0));
        }
    }

    #[test]
    fn test_concordance_partial_ties_in_b() {
        // (0,1) concordant, (0,2) concordant, (1,2) tied in b
        let c = rank_concordance(&[0.5, 1.0, 1.5], &[1.0, 3.0, 3.0]).unwrap();
        assert_eq!(c.total_pairs, 3);
        assert_eq!(c.concordant, 2);
        assert_eq!(c.tied_b, 1);
        assert!(!c.is_perfect());
    }

    #[test]
    fn test_large_finite_values_stay_defined() {
        let r = pearson_correlation(&[1e80, 2e80, 3e80], &[1e80, 2e80, 4e80]).unwrap();
        assert!(r > 0.9 && r <= 1.0);
    }

    #[test]
    fn test_concordance_empty() {
        let c = rank_concordance(&[], &[]).unwrap();
        assert_eq!(c.total_pairs, 0);
        assert!(!c.is_perfect());
        assert_eq!(c.ratio(), None);
        assert!(rank_concordance(&[1.0], &[]).is_err());
    }

    #[test]
    fn test_strength_thresholds() {
        assert_eq!(CorrelationStrength::classify(0.9), CorrelationStrength::Strong);
        assert_eq!(CorrelationStrength::classify(0.5), CorrelationStrength::Moderate);
        assert_eq!(CorrelationStrength::classify(0.0), CorrelationStrength::Weak);
        assert_eq!(CorrelationStrength::classify(-0.5), CorrelationStrength::Negative);
    }

    #[test]
    fn test_series_accumulates() {
        let mut s = CorrelationSeries::new();
        assert!(s.correlation().is_err());
        s.push(0.5, 1.0);
        s.push(1.0, 2.0);
        s.push(1.5, 3.5);
        assert_eq!(s.len(), 3);
        assert!(s.correlation().unwrap() > 0.9);
        assert!(s.concordance().is_perfect());
    }
}
