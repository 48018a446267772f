//! Shannon entropy estimators for trading-action windows.
//!
//! Two independent estimators live here:
//! - [`entropy_from_counts`] tallies raw category labels (hold/buy/sell or any
//!   other integer label) and measures the spread of their frequencies.
//! - [`entropy_from_weights`] treats its input as unnormalized probability
//!   mass and measures the distribution directly.
//!
//! Everything else in this module is an adapter that turns some other input
//! (actions, prices) into labels before calling [`entropy_from_counts`].
//! All results are in bits and never negative.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::ops::Range;

/// Price moves smaller than this are treated as unchanged.
const PRICE_EPS: f64 = 1e-12;

// =============================================================================
// Actions
// =============================================================================

/// Discrete trading action observed in a window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Hold,
    Buy,
    Sell,
}

impl Action {
    pub const ALL: [Action; 3] = [Action::Hold, Action::Buy, Action::Sell];

    /// Category label used by the entropy estimators.
    pub fn label(self) -> i64 {
        match self {
            Action::Hold => 0,
            Action::Buy => 1,
            Action::Sell => 2,
        }
    }

    pub fn from_label(label: i64) -> Option<Self> {
        match label {
            0 => Some(Action::Hold),
            1 => Some(Action::Buy),
            2 => Some(Action::Sell),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Hold => "hold",
            Action::Buy => "buy",
            Action::Sell => "sell",
        }
    }
}

// =============================================================================
// Core estimators
// =============================================================================

/// Entropy in bits of the label frequencies in `labels`.
///
/// Only distinctness and frequency matter: label values are opaque, so
/// negative or very large labels are fine and ordering is irrelevant.
/// An empty slice has no information and yields 0.0, as does any slice with
/// a single distinct label.
pub fn entropy_from_counts(labels: &[i64]) -> f64 {
    if labels.is_empty() {
        return 0.0;
    }
    let mut counts: BTreeMap<i64, usize> = BTreeMap::new();
    for &label in labels {
        *counts.entry(label).or_insert(0) += 1;
    }
    let total = labels.len() as f64;
    let mut entropy = 0.0;
    for &count in counts.values() {
        let p = count as f64 / total;
        if p > 0.0 {
            entropy -= p * p.log2();
        }
    }
    entropy.max(0.0)
}

/// Entropy in bits of a weight vector treated as probability mass.
///
/// Non-positive (and non-finite) weights are absent categories. The positive
/// weights are normalized by their sum, so the result does not change under
/// uniform positive rescaling. No positive mass at all yields 0.0.
pub fn entropy_from_weights(weights: &[f64]) -> f64 {
    let total: f64 = weights.iter().copied().filter(|w| is_mass(*w)).sum();
    if total <= 0.0 || !total.is_finite() {
        return 0.0;
    }
    let mut entropy = 0.0;
    for &w in weights.iter().filter(|w| is_mass(**w)) {
        let p = w / total;
        entropy -= p * p.log2();
    }
    entropy.max(0.0)
}

fn is_mass(w: f64) -> bool {
    w > 0.0 && w.is_finite()
}

// =============================================================================
// Derived measures
// =============================================================================

/// Entropy of a window of actions.
pub fn entropy_from_actions(actions: &[Action]) -> f64 {
    let labels: Vec<i64> = actions.iter().map(|a| a.label()).collect();
    entropy_from_counts(&labels)
}

/// Upper bound of the entropy for `distinct` equally likely categories.
pub fn max_entropy(distinct: usize) -> f64 {
    if distinct <= 1 {
        0.0
    } else {
        (distinct as f64).log2()
    }
}

/// Number of distinct labels present.
pub fn distinct_labels(labels: &[i64]) -> usize {
    let mut seen: Vec<i64> = labels.to_vec();
    seen.sort_unstable();
    seen.dedup();
    seen.len()
}

/// Entropy scaled into [0, 1] by the maximum for the labels actually present.
pub fn normalized_entropy(labels: &[i64]) -> f64 {
    let max = max_entropy(distinct_labels(labels));
    if max <= 0.0 {
        return 0.0;
    }
    (entropy_from_counts(labels) / max).clamp(0.0, 1.0)
}

// =============================================================================
// Price adapters
// =============================================================================

/// Bucket prices into integer levels of width `bucket_width`.
///
/// Non-finite prices are dropped. A width that is not a positive finite
/// number yields no buckets at all.
pub fn quantize_prices(prices: &[f64], bucket_width: f64) -> Vec<i64> {
    if !bucket_width.is_finite() || bucket_width <= 0.0 {
        return Vec::new();
    }
    prices
        .iter()
        .filter(|p| p.is_finite())
        .map(|p| (p / bucket_width).floor() as i64)
        .collect()
}

/// Entropy over quantized price levels.
///
/// This measures how spread out the visited price levels are, which is a
/// different quantity from the action entropy above.
pub fn price_level_entropy(prices: &[f64], bucket_width: f64) -> f64 {
    entropy_from_counts(&quantize_prices(prices, bucket_width))
}

/// Derive one action per consecutive price pair: up is a buy, down is a
/// sell, unchanged is a hold.
pub fn actions_from_prices(prices: &[f64]) -> Vec<Action> {
    prices
        .windows(2)
        .map(|pair| {
            let delta = pair[1] - pair[0];
            if delta > PRICE_EPS {
                Action::Buy
            } else if delta < -PRICE_EPS {
                Action::Sell
            } else {
                Action::Hold
            }
        })
        .collect()
}

/// Start/end ranges of full windows of `window` items advancing by `step`.
///
/// A trailing partial window is not produced. Zero `window` or `step`
/// produces nothing.
pub fn rolling_windows(len: usize, window: usize, step: usize) -> Vec<Range<usize>> {
    if window == 0 || step == 0 || len < window {
        return Vec::new();
    }
    (0..=len - window).step_by(step).map(|start| start..start + window).collect()
}

// =============================================================================
// Tests
// =============================================================================
