//! Monte Carlo resampling of a run's daily returns.
//!
//! Each simulation reshuffles the observed net returns (without
//! replacement) and compounds them to a terminal return. Simulations are
//! seeded per index, so results are reproducible for a given seed no matter
//! how the parallel scheduler interleaves them.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rayon::prelude::*;

const CONFIDENCE_LOW_PCT: f64 = 2.5;
const CONFIDENCE_HIGH_PCT: f64 = 97.5;

#[derive(Debug, Clone)]
pub struct MonteCarloConfig {
    pub simulations: usize,
    pub seed: u64,
}

impl Default for MonteCarloConfig {
    fn default() -> Self {
        Self {
            simulations: 500,
            seed: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct MonteCarloSummary {
    pub simulations: usize,
    /// Mean terminal compound return across simulations.
    pub mean: f64,
    /// Population standard deviation of the terminal returns.
    pub std_dev: f64,
    /// 2.5th percentile of the terminal returns.
    pub percentile_low: f64,
    /// 97.5th percentile of the terminal returns.
    pub percentile_high: f64,
    /// Fraction of simulations ending above zero.
    pub prob_positive: f64,
}

pub fn run_monte_carlo(returns: &[f64], config: &MonteCarloConfig) -> MonteCarloSummary {
    if config.simulations == 0 || returns.is_empty() {
        return MonteCarloSummary {
            simulations: 0,
            ..MonteCarloSummary::default()
        };
    }

    let outcomes: Vec<f64> = (0..config.simulations)
        .into_par_iter()
        .map(|s| {
            let mut rng = StdRng::seed_from_u64(config.seed.wrapping_add(s as u64));
            let mut sample = returns.to_vec();
            sample.shuffle(&mut rng);
            sample.iter().fold(1.0, |acc, r| acc * (1.0 + r)) - 1.0
        })
        .collect();

    let n = outcomes.len() as f64;
    let mean = outcomes.iter().sum::<f64>() / n;
    let variance = outcomes.iter().map(|o| (o - mean).powi(2)).sum::<f64>() / n;

    let mut sorted = outcomes.clone();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

    let positive = outcomes.iter().filter(|o| **o > 0.0).count();

    MonteCarloSummary {
        simulations: outcomes.len(),
        mean,
        std_dev: variance.sqrt(),
        percentile_low: percentile_sorted(&sorted, CONFIDENCE_LOW_PCT),
        percentile_high: percentile_sorted(&sorted, CONFIDENCE_HIGH_PCT),
        prob_positive: positive as f64 / n,
    }
}

/// Linear-interpolation percentile over an ascending slice.
/// The rank `pct/100 * (n-1)` is split into its floor index and fractional
/// remainder and the two neighbors are blended.
fn percentile_sorted(sorted: &[f64], pct: f64) -> f64 {
    match sorted.len() {
        0 => 0.0,
        1 => sorted[0],
        n => {
            let rank = (pct / 100.0) * (n - 1) as f64;
            let lo = rank.floor() as usize;
            let hi = rank.ceil() as usize;
            let frac = rank - lo as f64;
            sorted[lo] + (sorted[hi] - sorted[lo]) * frac
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const RETURNS: [f64; 6] = [0.01, -0.02, 0.03, 0.005, -0.01, 0.02];

    #[test]
    fn same_seed_reproduces_summary() {
        let config = MonteCarloConfig {
            simulations: 100,
            seed: 42,
        };
        let first = run_monte_carlo(&RETURNS, &config);
        let second = run_monte_carlo(&RETURNS, &config);
        assert_eq!(first, second);
    }

    #[test]
    fn mean_matches_compounded_returns() {
        let config = MonteCarloConfig {
            simulations: 50,
            seed: 7,
        };
        let summary = run_monte_carlo(&RETURNS, &config);
        let expected = RETURNS.iter().fold(1.0, |acc, r| acc * (1.0 + r)) - 1.0;
        assert_relative_eq!(summary.mean, expected, epsilon = 1e-9);
    }

    #[test]
    fn percentile_band_is_ordered() {
        let config = MonteCarloConfig {
            simulations: 200,
            seed: 1,
        };
        let summary = run_monte_carlo(&RETURNS, &config);
        assert!(summary.percentile_low <= summary.percentile_high);
        assert_eq!(summary.simulations, 200);
    }

    #[test]
    fn all_positive_returns_give_certain_positive_outcome() {
        let returns = [0.01, 0.02, 0.005];
        let config = MonteCarloConfig::default();
        let summary = run_monte_carlo(&returns, &config);
        assert_eq!(summary.prob_positive, 1.0);
    }

    #[test]
    fn all_negative_returns_give_zero_positive_probability() {
        let returns = [-0.01, -0.02, -0.005];
        let config = MonteCarloConfig::default();
        let summary = run_monte_carlo(&returns, &config);
        assert_eq!(summary.prob_positive, 0.0);
    }

    #[test]
    fn zero_simulations_short_circuits() {
        let config = MonteCarloConfig {
            simulations: 0,
            seed: 0,
        };
        let summary = run_monte_carlo(&RETURNS, &config);
        assert_eq!(summary.simulations, 0);
        assert_eq!(summary.mean, 0.0);
        assert_eq!(summary.prob_positive, 0.0);
    }

    #[test]
    fn empty_return_series_short_circuits() {
        let summary = run_monte_carlo(&[], &MonteCarloConfig::default());
        assert_eq!(summary.simulations, 0);
        assert_eq!(summary.std_dev, 0.0);
    }

    #[test]
    fn percentile_interpolates_between_neighbors() {
        let sorted = [1.0, 2.0, 3.0, 4.0];
        assert_relative_eq!(percentile_sorted(&sorted, 0.0), 1.0, epsilon = 1e-12);
        assert_relative_eq!(percentile_sorted(&sorted, 100.0), 4.0, epsilon = 1e-12);
        assert_relative_eq!(percentile_sorted(&sorted, 50.0), 2.5, epsilon = 1e-12);
        // rank 0.025 * 3 = 0.075
        assert_relative_eq!(percentile_sorted(&sorted, 2.5), 1.075, epsilon = 1e-12);
    }

    #[test]
    fn percentile_degenerate_lengths() {
        assert_eq!(percentile_sorted(&[], 50.0), 0.0);
        assert_eq!(percentile_sorted(&[0.3], 97.5), 0.3);
    }
}
