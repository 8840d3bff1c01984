//! CSV report adapter implementing ReportPort.
//!
//! Writes one file with two blocks: the per-day table, then a blank line
//! and `metric,value` summary rows. The writer runs in flexible mode since
//! the two blocks have different widths.

use crate::domain::backtest::RunResult;
use crate::domain::error::AshtraderError;
use crate::ports::report_port::ReportPort;

pub struct CsvReportAdapter;

impl CsvReportAdapter {
    pub fn new() -> Self {
        Self
    }
}

impl Default for CsvReportAdapter {
    fn default() -> Self {
        Self::new()
    }
}

const DAY_TABLE_HEADER: [&str; 16] = [
    "date",
    "signal",
    "position",
    "entry_price",
    "stop_loss",
    "take_profit",
    "trailing_stop",
    "risk_event",
    "tech_score",
    "fundamental_score",
    "composite_score",
    "raw_return",
    "net_return",
    "cost",
    "equity",
    "benchmark_equity",
];

impl ReportPort for CsvReportAdapter {
    fn write(&self, result: &RunResult, output_path: &str) -> Result<(), AshtraderError> {
        let mut writer = csv::WriterBuilder::new()
            .flexible(true)
            .from_path(output_path)?;

        writer.write_record(DAY_TABLE_HEADER)?;
        for (i, day) in result.days.iter().enumerate() {
            let raw = match result.ledger.raw_returns[i] {
                Some(r) => format!("{r:.6}"),
                None => String::new(),
            };
            writer.write_record(&[
                day.date.to_string(),
                format!("{}", day.signal.as_f64()),
                format!("{:.6}", day.position),
                format!("{:.6}", day.entry_price),
                format!("{:.6}", day.stop_loss),
                format!("{:.6}", day.take_profit),
                format!("{:.6}", day.trailing_stop),
                day.risk_event.to_string(),
                format!("{:.6}", day.tech_score),
                format!("{:.6}", day.fundamental_score),
                format!("{:.6}", day.composite_score),
                raw,
                format!("{:.6}", result.ledger.net_returns[i]),
                format!("{:.6}", result.ledger.costs[i]),
                format!("{:.6}", result.ledger.equity[i]),
                format!("{:.6}", result.ledger.benchmark_equity[i]),
            ])?;
        }

        writer.write_record([""])?;
        writer.write_record(["metric", "value"])?;

        let mut metric = |name: &str, value: String| -> Result<(), AshtraderError> {
            writer.write_record([name, &value])?;
            Ok(())
        };

        let summary = &result.summary;
        metric("code", result.code.clone())?;
        metric("total_return", format!("{:.6}", summary.total_return))?;
        metric("annualized_return", format!("{:.6}", summary.annualized_return))?;
        metric(
            "annualized_volatility",
            format!("{:.6}", summary.annualized_volatility),
        )?;
        metric("sharpe_ratio", format!("{:.6}", summary.sharpe_ratio))?;
        metric("max_drawdown", format!("{:.6}", summary.max_drawdown))?;
        metric("calmar_ratio", format!("{:.6}", summary.calmar_ratio))?;
        metric("win_rate", format!("{:.6}", summary.win_rate))?;
        metric("profit_loss_ratio", format!("{:.6}", summary.profit_loss_ratio))?;
        metric("total_trades", summary.total_trades.to_string())?;

        let benchmark_return = result
            .ledger
            .benchmark_equity
            .last()
            .map(|e| e - 1.0)
            .unwrap_or(0.0);
        metric("benchmark_total_return", format!("{benchmark_return:.6}"))?;

        let triggers = &result.risk_triggers;
        metric("stop_loss_exits", triggers.stop_loss.to_string())?;
        metric("take_profit_exits", triggers.take_profit.to_string())?;
        metric("drawdown_exits", triggers.drawdown_limit.to_string())?;
        metric("trailing_stop_exits", triggers.trailing_stop.to_string())?;

        if let Some(fundamental) = &result.fundamental {
            metric(
                "fundamental_score",
                format!("{:.6}", fundamental.overall_score),
            )?;
            metric("fundamental_excluded", fundamental.excluded.to_string())?;
        }

        if let Some(mc) = &result.monte_carlo {
            metric("mc_simulations", mc.simulations.to_string())?;
            metric("mc_mean", format!("{:.6}", mc.mean))?;
            metric("mc_std_dev", format!("{:.6}", mc.std_dev))?;
            metric("mc_percentile_low", format!("{:.6}", mc.percentile_low))?;
            metric("mc_percentile_high", format!("{:.6}", mc.percentile_high))?;
            metric("mc_prob_positive", format!("{:.6}", mc.prob_positive))?;
        }

        writer.flush()?;
        Ok(())
    }
}
