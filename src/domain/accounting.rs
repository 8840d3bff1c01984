//! Return, cost and equity accounting over a finished run.
//!
//! Returns realize with a one-day lag: today's gross return is yesterday's
//! signal and position applied to today's close-to-close move. Transaction
//! costs land on the day the signal changes.

use crate::domain::ohlcv::OhlcvBar;
use crate::domain::signal::DayState;
use crate::domain::strategy::StrategyConfig;
use chrono::NaiveDate;

/// Per-day series aligned with the bar series. `raw_returns[0]` and
/// `benchmark_returns[0]` are `None`: the first bar has no prior close.
#[derive(Debug, Clone)]
pub struct Ledger {
    pub dates: Vec<NaiveDate>,
    pub raw_returns: Vec<Option<f64>>,
    pub gross_returns: Vec<f64>,
    pub costs: Vec<f64>,
    pub net_returns: Vec<f64>,
    pub equity: Vec<f64>,
    pub benchmark_returns: Vec<Option<f64>>,
    pub benchmark_equity: Vec<f64>,
}

impl Ledger {
    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    /// Net returns for days that have a defined raw return, in order.
    /// This is the resampling population for Monte Carlo runs.
    pub fn defined_net_returns(&self) -> Vec<f64> {
        self.net_returns
            .iter()
            .zip(&self.raw_returns)
            .filter_map(|(net, raw)| raw.map(|_| *net))
            .collect()
    }
}

/// Build the full ledger for one run. `benchmark_closes` must already be
/// aligned to `bars` date-for-date.
pub fn build_ledger(
    bars: &[OhlcvBar],
    states: &[DayState],
    benchmark_closes: &[f64],
    config: &StrategyConfig,
) -> Ledger {
    debug_assert_eq!(states.len(), bars.len());
    debug_assert_eq!(benchmark_closes.len(), bars.len());

    let n = bars.len();
    let mut ledger = Ledger {
        dates: bars.iter().map(|b| b.date).collect(),
        raw_returns: Vec::with_capacity(n),
        gross_returns: Vec::with_capacity(n),
        costs: Vec::with_capacity(n),
        net_returns: Vec::with_capacity(n),
        equity: Vec::with_capacity(n),
        benchmark_returns: Vec::with_capacity(n),
        benchmark_equity: Vec::with_capacity(n),
    };

    for i in 0..n {
        let raw = if i == 0 {
            None
        } else {
            Some(bars[i].close / bars[i - 1].close - 1.0)
        };

        let gross = match raw {
            Some(r) => states[i - 1].signal.as_f64() * r * states[i - 1].position,
            None => 0.0,
        };

        let cost = if i > 0 && states[i].signal != states[i - 1].signal {
            config.commission_rate
                + config.slippage_rate
                + config.stamp_tax_rate * states[i].signal.as_f64().abs()
        } else {
            0.0
        };

        let net = gross - cost;

        let equity = if i == 0 {
            1.0
        } else {
            ledger.equity[i - 1] * (1.0 + net)
        };

        let bench = if i == 0 || benchmark_closes[i - 1] <= 0.0 {
            None
        } else {
            Some(benchmark_closes[i] / benchmark_closes[i - 1] - 1.0)
        };

        let bench_equity = if i == 0 {
            1.0
        } else {
            ledger.benchmark_equity[i - 1] * (1.0 + bench.unwrap_or(0.0))
        };

        ledger.raw_returns.push(raw);
        ledger.gross_returns.push(gross);
        ledger.costs.push(cost);
        ledger.net_returns.push(net);
        ledger.equity.push(equity);
        ledger.benchmark_returns.push(bench);
        ledger.benchmark_equity.push(bench_equity);
    }

    ledger
}
