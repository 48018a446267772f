//! Seeded synthetic action sequences.
//!
//! Each [`SequenceGenerator`] owns its PRNG. A fixed seed always yields the
//! same sequence, so scenarios that run side by side must each build their
//! own generator.

use rand::{rngs::StdRng, Rng, SeedableRng};

use crate::entropy::Action;

/// Deterministic hold/buy/sell sequence generator.
#[derive(Debug)]
pub struct SequenceGenerator {
    seed: u64,
    rng: StdRng,
}

impl SequenceGenerator {
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Generate `length` labels over {hold=0, buy=1, sell=2}.
    ///
    /// `predictability_bias` in [0, 1] moves probability mass toward hold:
    /// 0 is uniform, 1 is all hold. See [`category_weights`].
    pub fn generate(&mut self, length: usize, predictability_bias: f64) -> Vec<i64> {
        self.generate_actions(length, predictability_bias)
            .into_iter()
            .map(Action::label)
            .collect()
    }

    pub fn generate_actions(&mut self, length: usize, predictability_bias: f64) -> Vec<Action> {
        let weights = category_weights(predictability_bias);
        let mut actions = Vec::with_capacity(length);
        for _ in 0..length {
            let draw: f64 = self.rng.gen();
            actions.push(pick(&weights, draw));
        }
        actions
    }
}

/// Category probabilities [hold, buy, sell] for a predictability bias.
///
/// Bias is clamped to [0, 1] and non-finite values count as 0. Hold grows
/// linearly from 1/3 to 1; buy and sell split the remainder evenly.
pub fn category_weights(predictability_bias: f64) -> [f64; 3] {
    let bias = if predictability_bias.is_finite() {
        predictability_bias.clamp(0.0, 1.0)
    } else {
        0.0
    };
    let hold = 1.0 / 3.0 + bias * 2.0 / 3.0;
    let rest = ((1.0 - hold) / 2.0).max(0.0);
    [hold, rest, rest]
}

fn pick(weights: &[f64; 3], draw: f64) -> Action {
    let mut cumulative = 0.0;
    for (action, weight) in Action::ALL.iter().zip(weights.iter()) {
        cumulative += weight;
        if draw < cumulative {
            return *action;
        }
    }
    // Rounding can leave the cumulative sum a hair under 1.0
    Action::ALL
        .iter()
        .zip(weights.iter())
        .rev()
        .find(|(_, w)| **w > 0.0)
        .map(|(a, _)| *a)
        .unwrap_or(Action::Hold)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entropy::entropy_from_counts;

    #[test]
    fn test_seed_survives_generation() {
        let mut g = SequenceGenerator::new(99);
        g.generate(50, 0.3);
        assert_eq!(g.seed(), 99);
    }

    #[test]
    fn test_same_seed_same_sequence() {
        let mut a = SequenceGenerator::new(42);
        let mut b = SequenceGenerator::new(42);
        assert_eq!(a.generate(50, 0.3), b.generate(50, 0.3));
        assert_eq!(a.generate(20, 0.8), b.generate(20, 0.8));
    }

    #[test]
    fn test_different_seeds_diverge() {
        let mut a = SequenceGenerator::new(1);
        let mut b = SequenceGenerator::new(2);
        assert_ne!(a.generate(100, 0.0), b.generate(100, 0.0));
    }

    #[test]
    fn test_state_advances() {
        let mut g = SequenceGenerator::new(7);
        let first = g.generate(30, 0.0);
        let second = g.generate(30, 0.0);
        assert_ne!(first, second);
    }

    #[test]
    fn test_full_bias_is_all_hold() {
        let mut g = SequenceGenerator::new(42);
        let seq = g.generate(200, 1.0);
        assert!(seq.iter().all(|&l| l == 0));
        assert_eq!(entropy_from_counts(&seq), 0.0);
    }

    #[test]
    fn test_zero_bias_near_uniform() {
        let mut g = SequenceGenerator::new(42);
        let seq = g.generate(5000, 0.0);
        let h = entropy_from_counts(&seq);
        assert!(h > 1.57, "entropy {} should approach log2(3)", h);
    }

    #[test]
    fn test_bias_lowers_entropy() {
        let mut g = SequenceGenerator::new(42);
        let loose = entropy_from_counts(&g.generate(2000, 0.1));
        let tight = entropy_from_counts(&g.generate(2000, 0.9));
        assert!(loose > tight);
    }

    #[test]
    fn test_category_weights() {
        let w = category_weights(0.0);
        assert!((w[0] - 1.0 / 3.0).abs() < 1e-12);
        assert!((w[1] - w[2]).abs() < 1e-12);
        assert_eq!(category_weights(1.0)[1], 0.0);
        assert_eq!(category_weights(5.0), category_weights(1.0));
        assert_eq!(category_weights(-1.0), category_weights(0.0));
        assert_eq!(category_weights(f64::NAN), category_weights(0.0));
        for bias in [0.0, 0.25, 0.5, 0.75, 1.0] {
            let sum: f64 = category_weights(bias).iter().sum();
            assert!((sum - 1.0).abs() < 1e-12);
        }
    }

    #[test]
    fn test_empty_length() {
        let mut g = SequenceGenerator::new(3);
        assert!(g.generate(0, 0.5).is_empty());
    }
}
