//! Single-code backtest orchestration.
//!
//! Wires the pipeline together: fetch and validate bars, screen
//! fundamentals, compute indicators, fold the state machine, settle the
//! ledger against a benchmark, and summarize.

use crate::domain::accounting::{build_ledger, Ledger};
use crate::domain::code_data::CodeData;
use crate::domain::error::AshtraderError;
use crate::domain::fundamental::{assess, FundamentalAssessment};
use crate::domain::metrics::PerformanceSummary;
use crate::domain::monte_carlo::{run_monte_carlo, MonteCarloConfig, MonteCarloSummary};
use crate::domain::ohlcv::validate_bars;
use crate::domain::signal::{run_state_machine, DayState, RiskEvent};
use crate::domain::strategy::StrategyConfig;
use crate::ports::data_port::DataPort;
use chrono::NaiveDate;
use std::collections::HashMap;

/// How often each risk exit fired over a run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RiskTriggerCounts {
    pub stop_loss: usize,
    pub take_profit: usize,
    pub drawdown_limit: usize,
    pub trailing_stop: usize,
}

impl RiskTriggerCounts {
    pub fn tally(states: &[DayState]) -> Self {
        let mut counts = Self::default();
        for state in states {
            match state.risk_event {
                RiskEvent::StopLoss => counts.stop_loss += 1,
                RiskEvent::TakeProfit => counts.take_profit += 1,
                RiskEvent::DrawdownLimit => counts.drawdown_limit += 1,
                RiskEvent::TrailingStop => counts.trailing_stop += 1,
                RiskEvent::None => {}
            }
        }
        counts
    }

    pub fn total(&self) -> usize {
        self.stop_loss + self.take_profit + self.drawdown_limit + self.trailing_stop
    }
}

/// Everything a finished single-code run produces.
#[derive(Debug, Clone)]
pub struct RunResult {
    pub code: String,
    pub days: Vec<DayState>,
    pub ledger: Ledger,
    pub summary: PerformanceSummary,
    pub risk_triggers: RiskTriggerCounts,
    pub fundamental: Option<FundamentalAssessment>,
    pub monte_carlo: Option<MonteCarloSummary>,
}

pub fn run_backtest(
    data_port: &dyn DataPort,
    code: &str,
    benchmark_id: Option<&str>,
    start_date: NaiveDate,
    end_date: NaiveDate,
    config: &StrategyConfig,
    monte_carlo: Option<&MonteCarloConfig>,
) -> Result<RunResult, AshtraderError> {
    let bars = data_port.fetch_bars(code, start_date, end_date)?;
    if bars.is_empty() {
        return Err(AshtraderError::NoData {
            code: code.to_string(),
        });
    }
    validate_bars(code, &bars)?;

    // A failed screen lowers the score but does not abort the run.
    let (fundamental, fundamental_score) = if config.use_fundamental {
        let snapshot = data_port.fetch_fundamentals(code);
        let assessment = assess(&snapshot, &config.thresholds);
        if assessment.excluded {
            eprintln!(
                "Warning: {} fails fundamental screening (score {:.2})",
                code, assessment.overall_score
            );
        }
        let score = assessment.overall_score;
        (Some(assessment), score)
    } else {
        (None, 0.5)
    };

    let code_data = CodeData::compute(code.to_string(), bars, config);
    let states = run_state_machine(&code_data, config, fundamental_score);

    let benchmark_closes =
        align_benchmark(data_port, benchmark_id, &code_data, start_date, end_date);

    let ledger = build_ledger(&code_data.bars, &states, &benchmark_closes, config);
    let summary = PerformanceSummary::compute(&ledger);
    let risk_triggers = RiskTriggerCounts::tally(&states);

    let monte_carlo =
        monte_carlo.map(|mc| run_monte_carlo(&ledger.defined_net_returns(), mc));

    Ok(RunResult {
        code: code.to_string(),
        days: states,
        ledger,
        summary,
        risk_triggers,
        fundamental,
        monte_carlo,
    })
}

/// Benchmark closes aligned date-for-date with the code's bars.
///
/// Falls back to the code's own closes (a buy-and-hold comparison) when no
/// benchmark is configured, the fetch fails, or any trading day has no
/// benchmark bar.
fn align_benchmark(
    data_port: &dyn DataPort,
    benchmark_id: Option<&str>,
    code_data: &CodeData,
    start_date: NaiveDate,
    end_date: NaiveDate,
) -> Vec<f64> {
    let own: Vec<f64> = code_data.bars.iter().map(|b| b.close).collect();

    let id = match benchmark_id {
        Some(id) => id,
        None => return own,
    };

    let bench_bars = match data_port.fetch_benchmark(id, start_date, end_date) {
        Ok(bars) if !bars.is_empty() => bars,
        Ok(_) => {
            eprintln!("Warning: benchmark {id} returned no data, comparing to buy-and-hold");
            return own;
        }
        Err(e) => {
            eprintln!("Warning: benchmark {id} unavailable ({e}), comparing to buy-and-hold");
            return own;
        }
    };

    let by_date: HashMap<NaiveDate, f64> =
        bench_bars.iter().map(|b| (b.date, b.close)).collect();

    let mut closes = Vec::with_capacity(code_data.bars.len());
    for bar in &code_data.bars {
        match by_date.get(&bar.date) {
            Some(close) => closes.push(*close),
            None => {
                eprintln!(
                    "Warning: benchmark {id} has no bar for {}, comparing to buy-and-hold",
                    bar.date
                );
                return own;
            }
        }
    }
    closes
}
