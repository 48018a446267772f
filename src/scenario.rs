//! Scenario harness: drives generator → entropy → volatility over a set of
//! market scenarios and hands the accumulated series to the correlation
//! analyzer.
//!
//! Each harness owns exactly one [`SequenceGenerator`]. Parallel runs build
//! one harness per scenario with its own seed, so no PRNG state is shared.

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::thread;

use crate::correlation::{Concordance, CorrelationError, CorrelationSeries, CorrelationStrength};
use crate::entropy::{actions_from_prices, entropy_from_actions, entropy_from_counts, rolling_windows};
use crate::generator::SequenceGenerator;
use crate::logging::{log_concordance, log_correlation, log_scenario_summary, log_window, ProfileScope};
use crate::volatility::{realized_volatility, VolatilityModel};

/// Correlation above this supports the entropy → volatility thesis.
pub const THESIS_THRESHOLD: f64 = 0.3;

// =============================================================================
// Scenarios
// =============================================================================

/// Named configuration used to generate a batch of action windows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketScenario {
    pub name: String,
    pub description: String,
    pub base_volatility: f64,
    pub stress_factor: f64,
    /// Actions per window
    pub sequence_length: usize,
    /// 0 = random, 1 = fully predictable
    pub predictability_bias: f64,
    pub num_windows: usize,
}

impl MarketScenario {
    pub fn new(
        name: &str,
        description: &str,
        base_volatility: f64,
        stress_factor: f64,
        sequence_length: usize,
        predictability_bias: f64,
        num_windows: usize,
    ) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            base_volatility,
            stress_factor,
            sequence_length,
            predictability_bias,
            num_windows,
        }
    }
}

/// Five market regimes with 5 windows of 20 actions each.
pub fn market_validation_scenarios() -> Vec<MarketScenario> {
    vec![
        MarketScenario::new("Bull Market", "Steady upward trend with low volatility", 0.5, 0.1, 20, 0.6, 5),
        MarketScenario::new("Bear Market", "Declining trend with moderate volatility", 1.2, 0.3, 20, 0.4, 5),
        MarketScenario::new("Market Crash", "Sharp decline with extreme volatility", 2.5, 0.8, 20, 0.1, 5),
        MarketScenario::new("Sideways Market", "No clear trend, mixed sentiment", 1.0, 0.2, 20, 0.5, 5),
        MarketScenario::new("Recovery Period", "Bouncing back from crash", 1.8, 0.4, 20, 0.3, 5),
    ]
}

/// Sixty windows of 15 actions across four regimes, for plotting.
pub fn visual_inspection_scenarios() -> Vec<MarketScenario> {
    vec![
        MarketScenario::new("Bull Market", "Low predictability, calm", 1.0, 0.1, 15, 0.3, 20),
        MarketScenario::new("Bear Market", "Medium predictability", 2.0, 0.4, 15, 0.6, 20),
        MarketScenario::new("Market Crash", "Panic herding", 3.5, 0.8, 15, 0.8, 10),
        MarketScenario::new("Recovery", "Medium-low predictability", 2.5, 0.3, 15, 0.4, 10),
    ]
}

// =============================================================================
// Observations
// =============================================================================

/// Coarse reading of a window's entropy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BehaviorPattern {
    Predictable,
    Mixed,
    Unpredictable,
}

impl BehaviorPattern {
    pub fn classify(entropy: f64) -> Self {
        if entropy < 0.5 {
            Self::Predictable
        } else if entropy < 1.2 {
            Self::Mixed
        } else {
            Self::Unpredictable
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Predictable => "Predictable",
            Self::Mixed => "Mixed",
            Self::Unpredictable => "Unpredictable",
        }
    }
}

/// One analysed window, as exported for plotting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindowObservation {
    pub window_id: usize,
    pub entropy: f64,
    pub volatility: f64,
    pub scenario_label: String,
    pub behavior: BehaviorPattern,
}

impl WindowObservation {
    pub fn new(window_id: usize, entropy: f64, volatility: f64, scenario_label: &str) -> Self {
        Self {
            window_id,
            entropy,
            volatility,
            scenario_label: scenario_label.to_string(),
            behavior: BehaviorPattern::classify(entropy),
        }
    }
}

/// How strongly a scenario's averages point at the thesis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScenarioVerdict {
    Strong,
    Moderate,
    Weak,
}

impl ScenarioVerdict {
    pub fn from_means(mean_entropy: f64, mean_volatility: f64) -> Self {
        if mean_entropy > 1.0 && mean_volatility > 2.0 {
            Self::Strong
        } else if mean_entropy > 0.5 && mean_volatility > 1.0 {
            Self::Moderate
        } else {
            Self::Weak
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Strong => "Strong",
            Self::Moderate => "Moderate",
            Self::Weak => "Weak",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioSummary {
    pub name: String,
    pub windows: usize,
    pub mean_entropy: f64,
    pub mean_volatility: f64,
    pub verdict: ScenarioVerdict,
}

impl ScenarioSummary {
    pub fn from_observations(name: &str, observations: &[WindowObservation]) -> Self {
        let n = observations.len().max(1) as f64;
        let mean_entropy = observations.iter().map(|o| o.entropy).sum::<f64>() / n;
        let mean_volatility = observations.iter().map(|o| o.volatility).sum::<f64>() / n;
        Self {
            name: name.to_string(),
            windows: observations.len(),
            mean_entropy,
            mean_volatility,
            verdict: ScenarioVerdict::from_means(mean_entropy, mean_volatility),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScenarioRun {
    pub summary: ScenarioSummary,
    pub observations: Vec<WindowObservation>,
}

// =============================================================================
// Harness
// =============================================================================

/// Runs scenarios with a single owned generator.
#[derive(Debug)]
pub struct ScenarioHarness {
    generator: SequenceGenerator,
    model: VolatilityModel,
}

impl ScenarioHarness {
    pub fn new(seed: u64, model: VolatilityModel) -> Self {
        Self {
            generator: SequenceGenerator::new(seed),
            model,
        }
    }

    /// Generate and analyse every window of `scenario`, numbering windows
    /// from `first_window_id`.
    pub fn run_scenario(&mut self, scenario: &MarketScenario, first_window_id: usize) -> ScenarioRun {
        let mut observations = Vec::with_capacity(scenario.num_windows);
        for offset in 0..scenario.num_windows {
            let actions = self
                .generator
                .generate_actions(scenario.sequence_length, scenario.predictability_bias);
            let entropy = entropy_from_actions(&actions);
            let volatility = self
                .model
                .estimate(scenario.base_volatility, entropy, scenario.stress_factor);
            let obs = WindowObservation::new(first_window_id + offset, entropy, volatility, &scenario.name);
            log_window(&scenario.name, obs.window_id, entropy, volatility, obs.behavior.as_str());
            observations.push(obs);
        }
        let summary = ScenarioSummary::from_observations(&scenario.name, &observations);
        log_scenario_summary(
            &summary.name,
            self.generator.seed(),
            summary.windows,
            summary.mean_entropy,
            summary.mean_volatility,
            summary.verdict.as_str(),
        );
        ScenarioRun { summary, observations }
    }

    /// Run scenarios in order; window ids continue across scenarios from 1.
    pub fn run_all(&mut self, scenarios: &[MarketScenario]) -> HarnessReport {
        let _scope = ProfileScope::new("run_all");
        let starts = first_window_ids(scenarios);
        let runs = scenarios
            .iter()
            .zip(starts)
            .map(|(s, start)| self.run_scenario(s, start))
            .collect();
        HarnessReport::from_runs(runs)
    }
}

fn first_window_ids(scenarios: &[MarketScenario]) -> Vec<usize> {
    let mut next = 1;
    scenarios
        .iter()
        .map(|s| {
            let start = next;
            next += s.num_windows;
            start
        })
        .collect()
}

/// Run each scenario on its own harness seeded `base_seed + index`.
///
/// Work is spread over at most `num_cpus` scoped threads. The result is
/// identical to running the same per-scenario harnesses one after another.
pub fn run_parallel(
    scenarios: &[MarketScenario],
    base_seed: u64,
    model: VolatilityModel,
) -> Result<HarnessReport> {
    let _scope = ProfileScope::new("run_parallel");
    let starts = first_window_ids(scenarios);
    let jobs: Vec<(usize, &MarketScenario, usize)> = scenarios
        .iter()
        .zip(starts)
        .enumerate()
        .map(|(idx, (s, start))| (idx, s, start))
        .collect();
    let workers = num_cpus::get().max(1);

    let mut runs = Vec::with_capacity(scenarios.len());
    for batch in jobs.chunks(workers) {
        let batch_runs = thread::scope(|scope| {
            let handles: Vec<_> = batch
                .iter()
                .map(|&(idx, scenario, start)| {
                    scope.spawn(move || {
                        let mut harness = ScenarioHarness::new(base_seed.wrapping_add(idx as u64), model);
                        harness.run_scenario(scenario, start)
                    })
                })
                .collect();
            handles
                .into_iter()
                .map(|h| h.join().map_err(|_| anyhow!("scenario worker panicked")))
                .collect::<Result<Vec<_>>>()
        })?;
        runs.extend(batch_runs);
    }
    Ok(HarnessReport::from_runs(runs))
}

// =============================================================================
// Price windows
// =============================================================================

/// Derive actions from a price series and analyse it in rolling windows.
///
/// Window `k` covers actions `[start, start + window)`, which come from
/// prices `[start, start + window]`; volatility is the spread of price
/// differences over that same span.
pub fn observe_price_windows(prices: &[f64], window: usize, step: usize, label: &str) -> Vec<WindowObservation> {
    let actions = actions_from_prices(prices);
    let labels: Vec<i64> = actions.iter().map(|a| a.label()).collect();
    rolling_windows(labels.len(), window, step)
        .into_iter()
        .enumerate()
        .map(|(idx, range)| {
            let entropy = entropy_from_counts(&labels[range.clone()]);
            let volatility = realized_volatility(&prices[range.start..=range.end]);
            WindowObservation::new(idx, entropy, volatility, label)
        })
        .collect()
}

// =============================================================================
// Report
// =============================================================================

/// All observations of a run plus the correlation verdict over them.
#[derive(Debug, Clone)]
pub struct HarnessReport {
    pub summaries: Vec<ScenarioSummary>,
    pub observations: Vec<WindowObservation>,
    pub series: CorrelationSeries,
    pub correlation: Result<f64, CorrelationError>,
    pub concordance: Concordance,
}

impl HarnessReport {
    pub fn from_runs(runs: Vec<ScenarioRun>) -> Self {
        let mut summaries = Vec::with_capacity(runs.len());
        let mut observations = Vec::new();
        for run in runs {
            summaries.push(run.summary);
            observations.extend(run.observations);
        }
        Self::from_observations(summaries, observations)
    }

    pub fn from_observations(summaries: Vec<ScenarioSummary>, observations: Vec<WindowObservation>) -> Self {
        let mut series = CorrelationSeries::with_capacity(observations.len());
        for obs in &observations {
            series.push(obs.entropy, obs.volatility);
        }
        let correlation = series.correlation();
        let concordance = series.concordance();

        match &correlation {
            Ok(r) => log_correlation(series.len(), Some(*r), None),
            Err(err) => log_correlation(series.len(), None, Some(&err.to_string())),
        }
        log_concordance(
            concordance.concordant,
            concordance.discordant,
            concordance.tied_b,
            concordance.total_pairs,
        );

        Self {
            summaries,
            observations,
            series,
            correlation,
            concordance,
        }
    }

    pub fn strength(&self) -> Option<CorrelationStrength> {
        self.correlation.as_ref().ok().map(|r| CorrelationStrength::classify(*r))
    }

    /// Correlation above [`THESIS_THRESHOLD`]; when the coefficient is
    /// undefined, a majority of concordant pairs instead.
    pub fn thesis_supported(&self) -> bool {
        match self.correlation {
            Ok(r) => r > THESIS_THRESHOLD,
            Err(_) => self.concordance.ratio().map(|r| r > 0.5).unwrap_or(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small() -> Vec<MarketScenario> {
        vec![
            MarketScenario::new("Calm", "", 0.5, 0.1, 20, 0.9, 4),
            MarketScenario::new("Chaos", "", 2.0, 0.6, 20, 0.0, 4),
        ]
    }

    #[test]
    fn test_behavior_thresholds() {
        assert_eq!(BehaviorPattern::classify(0.0), BehaviorPattern::Predictable);
        assert_eq!(BehaviorPattern::classify(0.5), BehaviorPattern::Mixed);
        assert_eq!(BehaviorPattern::classify(1.19), BehaviorPattern::Mixed);
        assert_eq!(BehaviorPattern::classify(1.2), BehaviorPattern::Unpredictable);
    }

    #[test]
    fn test_verdict_from_means() {
        assert_eq!(ScenarioVerdict::from_means(1.2, 2.5), ScenarioVerdict::Strong);
        assert_eq!(ScenarioVerdict::from_means(0.8, 1.5), ScenarioVerdict::Moderate);
        assert_eq!(ScenarioVerdict::from_means(0.2, 3.0), ScenarioVerdict::Weak);
    }

    #[test]
    fn test_window_ids_continue_across_scenarios() {
        let mut harness = ScenarioHarness::new(42, VolatilityModel::default());
        let report = harness.run_all(&small());
        let ids: Vec<usize> = report.observations.iter().map(|o| o.window_id).collect();
        assert_eq!(ids, (1..=8).collect::<Vec<_>>());
        assert_eq!(report.series.len(), 8);
        assert_eq!(report.summaries.len(), 2);
        assert_eq!(report.summaries[0].windows, 4);
    }

    #[test]
    fn test_same_seed_reproducible() {
        let a = ScenarioHarness::new(9, VolatilityModel::default()).run_all(&small());
        let b = ScenarioHarness::new(9, VolatilityModel::default()).run_all(&small());
        assert_eq!(a.observations, b.observations);
    }

    #[test]
    fn test_parallel_matches_per_scenario_seeds() {
        let scenarios = small();
        let model = VolatilityModel::default();
        let par = run_parallel(&scenarios, 100, model).unwrap();

        let first = ScenarioHarness::new(100, model).run_scenario(&scenarios[0], 1);
        let second = ScenarioHarness::new(101, model).run_scenario(&scenarios[1], 5);
        let mut expected = first.observations;
        expected.extend(second.observations);
        assert_eq!(par.observations, expected);
    }

    #[test]
    fn test_volatility_follows_model() {
        let model = VolatilityModel::default();
        let scenario = MarketScenario::new("One", "", 1.0, 0.4, 15, 0.5, 3);
        let run = ScenarioHarness::new(1, model).run_scenario(&scenario, 1);
        for obs in &run.observations {
            let expected = model.estimate(1.0, obs.entropy, 0.4);
            assert!((obs.volatility - expected).abs() < 1e-12);
        }
    }

    #[test]
    fn test_single_scenario_entropy_tracks_volatility() {
        // Same base and stress: volatility is a strictly increasing function
        // of entropy, so correlation is 1 whenever entropy varies.
        let scenario = MarketScenario::new("Only", "", 1.0, 0.2, 12, 0.3, 12);
        let report = ScenarioHarness::new(42, VolatilityModel::default()).run_all(&[scenario]);
        let r = report.correlation.clone().unwrap();
        assert!((r - 1.0).abs() < 1e-9);
        assert_eq!(report.strength(), Some(CorrelationStrength::Strong));
        assert_eq!(report.concordance.discordant, 0);
        assert!(report.thesis_supported());
    }

    #[test]
    fn test_undefined_correlation_falls_back() {
        // Fully predictable windows: every entropy is 0
        let scenario = MarketScenario::new("Frozen", "", 1.0, 0.2, 10, 1.0, 5);
        let report = ScenarioHarness::new(42, VolatilityModel::default()).run_all(&[scenario]);
        assert_eq!(report.correlation, Err(CorrelationError::ZeroVariance));
        assert_eq!(report.concordance.total_pairs, 0);
        assert!(report.strength().is_none());
        assert!(!report.thesis_supported());
    }

    #[test]
    fn test_flat_volatility_does_not_support_thesis() {
        let observations: Vec<WindowObservation> = [1.5, 1.0, 0.5, 0.1]
            .iter()
            .enumerate()
            .map(|(i, &e)| WindowObservation::new(i + 1, e, 2.0, "Flat"))
            .collect();
        let report = HarnessReport::from_observations(Vec::new(), observations);
        assert_eq!(report.correlation, Err(CorrelationError::ZeroVariance));
        assert_eq!(report.concordance.total_pairs, 6);
        assert_eq!(report.concordance.tied_b, 6);
        assert_eq!(report.concordance.concordant, 0);
        assert!(!report.thesis_supported());
    }

    #[test]
    fn test_observe_price_windows() {
        let prices: Vec<f64> = (0..=250).map(|i| 100.0 + ((i as f64) * 0.7).sin()).collect();
        let obs = observe_price_windows(&prices, 100, 50, "SPY");
        assert_eq!(obs.len(), 4);
        assert_eq!(obs[0].window_id, 0);
        for o in &obs {
            assert!(o.entropy >= 0.0 && o.entropy <= 3f64.log2() + 1e-9);
            assert!(o.volatility > 0.0);
            assert_eq!(o.scenario_label, "SPY");
        }
        assert!(observe_price_windows(&prices[..50], 100, 50, "SPY").is_empty());
    }

    #[test]
    fn test_presets_shape() {
        let total: usize = visual_inspection_scenarios().iter().map(|s| s.num_windows).sum();
        assert_eq!(total, 60);
        assert_eq!(market_validation_scenarios().len(), 5);
    }
}
