//! Performance metrics over a finished ledger.

use crate::domain::accounting::Ledger;

pub const TRADING_DAYS_PER_YEAR: f64 = 252.0;

/// Annual risk-free rate used for the Sharpe ratio.
pub const RISK_FREE_RATE: f64 = 0.03;

#[derive(Debug, Clone, PartialEq, Default)]
pub struct PerformanceSummary {
    pub total_return: f64,
    /// Linear scaling of the total return to a 252-day year.
    pub annualized_return: f64,
    /// Sample standard deviation of daily log returns, annualized.
    pub annualized_volatility: f64,
    pub sharpe_ratio: f64,
    /// Deepest peak-to-trough equity move, recorded as a negative fraction.
    pub max_drawdown: f64,
    pub calmar_ratio: f64,
    /// Winning days over days with a nonzero net return.
    pub win_rate: f64,
    /// Mean winning-day return over the magnitude of the mean losing-day
    /// return.
    pub profit_loss_ratio: f64,
    /// Days with a nonzero net return.
    pub total_trades: usize,
}

impl PerformanceSummary {
    pub fn compute(ledger: &Ledger) -> Self {
        if ledger.is_empty() {
            return Self::default();
        }

        let final_equity = ledger.equity[ledger.len() - 1];
        let total_return = final_equity - 1.0;
        let annualized_return =
            total_return * TRADING_DAYS_PER_YEAR / ledger.len() as f64;

        let nets = ledger.defined_net_returns();
        let log_returns: Vec<f64> = nets
            .iter()
            .filter(|r| **r > -1.0)
            .map(|r| (1.0 + r).ln())
            .collect();
        let annualized_volatility = sample_std(&log_returns) * TRADING_DAYS_PER_YEAR.sqrt();

        let sharpe_ratio = if annualized_volatility > 0.0 {
            (annualized_return - RISK_FREE_RATE) / annualized_volatility
        } else {
            0.0
        };

        let max_drawdown = compute_max_drawdown(&ledger.equity);
        let calmar_ratio = if max_drawdown < 0.0 {
            annualized_return / max_drawdown.abs()
        } else {
            0.0
        };

        let wins: Vec<f64> = nets.iter().copied().filter(|r| *r > 0.0).collect();
        let losses: Vec<f64> = nets.iter().copied().filter(|r| *r < 0.0).collect();
        let total_trades = wins.len() + losses.len();

        let win_rate = if total_trades > 0 {
            wins.len() as f64 / total_trades as f64
        } else {
            0.0
        };

        let avg_win = if wins.is_empty() {
            0.0
        } else {
            wins.iter().sum::<f64>() / wins.len() as f64
        };
        let avg_loss = if losses.is_empty() {
            1.0
        } else {
            (losses.iter().sum::<f64>() / losses.len() as f64).abs()
        };
        let profit_loss_ratio = avg_win / avg_loss;

        PerformanceSummary {
            total_return,
            annualized_return,
            annualized_volatility,
            sharpe_ratio,
            max_drawdown,
            calmar_ratio,
            win_rate,
            profit_loss_ratio,
            total_trades,
        }
    }
}

/// Deepest drop from a running equity peak, as a fraction of that peak.
/// Zero for a curve that never dips, negative otherwise.
fn compute_max_drawdown(equity: &[f64]) -> f64 {
    if equity.is_empty() {
        return 0.0;
    }
    let mut peak = equity[0];
    let mut max_dd = 0.0_f64;
    for &e in equity {
        if e > peak {
            peak = e;
        } else if peak > 0.0 {
            let dd = (e - peak) / peak;
            if dd < max_dd {
                max_dd = dd;
            }
        }
    }
    max_dd
}

/// Sample standard deviation (divides by N-1). Zero for fewer than two
/// observations.
pub fn sample_std(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0);
    variance.sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::NaiveDate;

    /// Ledger with a synthetic day 0 followed by the given net returns.
    fn make_ledger(net_returns: &[f64]) -> Ledger {
        let n = net_returns.len() + 1;
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();

        let mut raw_returns = vec![None];
        let mut nets = vec![0.0];
        let mut equity = vec![1.0];
        for &r in net_returns {
            raw_returns.push(Some(r));
            nets.push(r);
            equity.push(equity.last().copied().unwrap_or(1.0) * (1.0 + r));
        }

        Ledger {
            dates: (0..n)
                .map(|i| start + chrono::Duration::days(i as i64))
                .collect(),
            raw_returns,
            gross_returns: nets.clone(),
            costs: vec![0.0; n],
            net_returns: nets,
            equity,
            benchmark_returns: vec![None; n],
            benchmark_equity: vec![1.0; n],
        }
    }

    fn empty_ledger() -> Ledger {
        Ledger {
            dates: Vec::new(),
            raw_returns: Vec::new(),
            gross_returns: Vec::new(),
            costs: Vec::new(),
            net_returns: Vec::new(),
            equity: Vec::new(),
            benchmark_returns: Vec::new(),
            benchmark_equity: Vec::new(),
        }
    }

    #[test]
    fn empty_ledger_yields_zero_summary() {
        let summary = PerformanceSummary::compute(&empty_ledger());
        assert_eq!(summary, PerformanceSummary::default());
    }

    #[test]
    fn total_return_is_final_equity_minus_one() {
        let ledger = make_ledger(&[0.10, -0.05]);
        let summary = PerformanceSummary::compute(&ledger);
        assert_relative_eq!(summary.total_return, 1.10 * 0.95 - 1.0, epsilon = 1e-12);
    }

    #[test]
    fn annualized_return_scales_linearly() {
        // 251 return days plus the seed day: exactly one 252-day year
        let nets = vec![0.0; 251];
        let mut ledger = make_ledger(&nets);
        let n = ledger.len();
        ledger.net_returns[n - 1] = 0.10;
        ledger.equity[n - 1] = 1.10;
        let summary = PerformanceSummary::compute(&ledger);
        assert_relative_eq!(summary.annualized_return, 0.10, epsilon = 1e-12);
    }

    #[test]
    fn volatility_uses_sample_std_of_log_returns() {
        let ledger = make_ledger(&[0.01, -0.01]);
        let summary = PerformanceSummary::compute(&ledger);

        let a = 1.01_f64.ln();
        let b = 0.99_f64.ln();
        let mean = (a + b) / 2.0;
        let expected = (((a - mean).powi(2) + (b - mean).powi(2)) / 1.0).sqrt()
            * TRADING_DAYS_PER_YEAR.sqrt();
        assert_relative_eq!(summary.annualized_volatility, expected, epsilon = 1e-12);
    }

    #[test]
    fn constant_returns_have_zero_volatility_and_sharpe() {
        let ledger = make_ledger(&[0.01, 0.01, 0.01]);
        let summary = PerformanceSummary::compute(&ledger);
        assert_eq!(summary.annualized_volatility, 0.0);
        assert_eq!(summary.sharpe_ratio, 0.0);
    }

    #[test]
    fn sharpe_subtracts_risk_free_rate() {
        let ledger = make_ledger(&[0.01, -0.01, 0.02]);
        let summary = PerformanceSummary::compute(&ledger);
        assert!(summary.annualized_volatility > 0.0);
        let expected =
            (summary.annualized_return - RISK_FREE_RATE) / summary.annualized_volatility;
        assert_relative_eq!(summary.sharpe_ratio, expected, epsilon = 1e-12);
    }

    #[test]
    fn max_drawdown_is_negative_trough_from_peak() {
        let equity = vec![1.0, 1.1, 0.9, 0.95, 0.8, 1.0];
        let dd = compute_max_drawdown(&equity);
        assert_relative_eq!(dd, (0.8 - 1.1) / 1.1, epsilon = 1e-12);
        assert!(dd < 0.0);
    }

    #[test]
    fn monotone_equity_has_zero_drawdown_and_calmar() {
        let ledger = make_ledger(&[0.01, 0.02, 0.01]);
        let summary = PerformanceSummary::compute(&ledger);
        assert_eq!(summary.max_drawdown, 0.0);
        assert_eq!(summary.calmar_ratio, 0.0);
    }

    #[test]
    fn calmar_divides_by_drawdown_magnitude() {
        let ledger = make_ledger(&[0.10, -0.05, 0.02]);
        let summary = PerformanceSummary::compute(&ledger);
        assert!(summary.max_drawdown < 0.0);
        assert_relative_eq!(
            summary.calmar_ratio,
            summary.annualized_return / summary.max_drawdown.abs(),
            epsilon = 1e-12
        );
    }

    #[test]
    fn win_rate_ignores_flat_days() {
        let ledger = make_ledger(&[0.01, 0.0, -0.02, 0.03, 0.0]);
        let summary = PerformanceSummary::compute(&ledger);
        assert_eq!(summary.total_trades, 3);
        assert_relative_eq!(summary.win_rate, 2.0 / 3.0, epsilon = 1e-12);
    }

    #[test]
    fn win_rate_zero_when_never_in_market() {
        let ledger = make_ledger(&[0.0, 0.0, 0.0]);
        let summary = PerformanceSummary::compute(&ledger);
        assert_eq!(summary.total_trades, 0);
        assert_eq!(summary.win_rate, 0.0);
        assert_eq!(summary.profit_loss_ratio, 0.0);
    }

    #[test]
    fn profit_loss_ratio_from_mean_win_and_loss() {
        let ledger = make_ledger(&[0.02, 0.04, -0.01, -0.03]);
        let summary = PerformanceSummary::compute(&ledger);
        // mean win 0.03, mean loss magnitude 0.02
        assert_relative_eq!(summary.profit_loss_ratio, 1.5, epsilon = 1e-12);
    }

    #[test]
    fn profit_loss_ratio_without_losses_uses_unit_divisor() {
        let ledger = make_ledger(&[0.02, 0.04]);
        let summary = PerformanceSummary::compute(&ledger);
        assert_relative_eq!(summary.profit_loss_ratio, 0.03, epsilon = 1e-12);
    }

    #[test]
    fn sample_std_handles_degenerate_input() {
        assert_eq!(sample_std(&[]), 0.0);
        assert_eq!(sample_std(&[0.5]), 0.0);
        assert_relative_eq!(sample_std(&[10.0, 20.0, 30.0]), 10.0, epsilon = 1e-12);
    }
}
