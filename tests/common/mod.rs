#![allow(dead_code)]

use ashtrader::domain::error::AshtraderError;
use ashtrader::domain::fundamental::FundamentalSnapshot;
pub use ashtrader::domain::ohlcv::{BenchmarkBar, OhlcvBar};
use ashtrader::domain::strategy::StrategyConfig;
use ashtrader::ports::data_port::DataPort;
use chrono::NaiveDate;
use std::collections::HashMap;

pub struct MockDataPort {
    pub data: HashMap<String, Vec<OhlcvBar>>,
    pub benchmarks: HashMap<String, Vec<BenchmarkBar>>,
    pub fundamentals: HashMap<String, FundamentalSnapshot>,
    pub errors: HashMap<String, String>,
}

impl MockDataPort {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
            benchmarks: HashMap::new(),
            fundamentals: HashMap::new(),
            errors: HashMap::new(),
        }
    }

    pub fn with_bars(mut self, code: &str, bars: Vec<OhlcvBar>) -> Self {
        self.data.insert(code.to_string(), bars);
        self
    }

    pub fn with_benchmark(mut self, benchmark_id: &str, bars: Vec<BenchmarkBar>) -> Self {
        self.benchmarks.insert(benchmark_id.to_string(), bars);
        self
    }

    pub fn with_fundamentals(mut self, code: &str, snapshot: FundamentalSnapshot) -> Self {
        self.fundamentals.insert(code.to_string(), snapshot);
        self
    }

    pub fn with_error(mut self, code: &str, reason: &str) -> Self {
        self.errors.insert(code.to_string(), reason.to_string());
        self
    }
}

impl DataPort for MockDataPort {
    fn fetch_bars(
        &self,
        code: &str,
        _start_date: NaiveDate,
        _end_date: NaiveDate,
    ) -> Result<Vec<OhlcvBar>, AshtraderError> {
        if let Some(reason) = self.errors.get(code) {
            return Err(AshtraderError::Provider {
                code: code.to_string(),
                detail: reason.clone(),
            });
        }
        Ok(self.data.get(code).cloned().unwrap_or_default())
    }

    fn fetch_benchmark(
        &self,
        benchmark_id: &str,
        _start_date: NaiveDate,
        _end_date: NaiveDate,
    ) -> Result<Vec<BenchmarkBar>, AshtraderError> {
        if let Some(reason) = self.errors.get(benchmark_id) {
            return Err(AshtraderError::Provider {
                code: benchmark_id.to_string(),
                detail: reason.clone(),
            });
        }
        Ok(self.benchmarks.get(benchmark_id).cloned().unwrap_or_default())
    }

    fn fetch_fundamentals(&self, code: &str) -> FundamentalSnapshot {
        self.fundamentals.get(code).copied().unwrap_or_default()
    }

    fn list_codes(&self) -> Result<Vec<String>, AshtraderError> {
        let mut codes: Vec<String> = self.data.keys().cloned().collect();
        codes.sort();
        Ok(codes)
    }

    fn data_range(
        &self,
        code: &str,
    ) -> Result<Option<(NaiveDate, NaiveDate, usize)>, AshtraderError> {
        if let Some(reason) = self.errors.get(code) {
            return Err(AshtraderError::Provider {
                code: code.to_string(),
                detail: reason.clone(),
            });
        }
        match self.data.get(code) {
            Some(bars) if !bars.is_empty() => {
                let min = bars.iter().map(|b| b.date).min().unwrap();
                let max = bars.iter().map(|b| b.date).max().unwrap();
                Ok(Some((min, max, bars.len())))
            }
            _ => Ok(None),
        }
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn make_bar(code: &str, date: &str, close: f64) -> OhlcvBar {
    OhlcvBar {
        code: code.to_string(),
        date: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
        open: close - 1.0,
        high: close + 1.0,
        low: close - 2.0,
        close,
        volume: 1000,
    }
}

/// Bars with closes ramping by `step` per day from `start_price`.
pub fn generate_bars(
    code: &str,
    start_date: &str,
    count: usize,
    start_price: f64,
    step: f64,
) -> Vec<OhlcvBar> {
    let start = NaiveDate::parse_from_str(start_date, "%Y-%m-%d").unwrap();
    (0..count)
        .map(|i| {
            let close = start_price + i as f64 * step;
            OhlcvBar {
                code: code.to_string(),
                date: start + chrono::Duration::days(i as i64),
                open: close,
                high: close + 1.0,
                low: close - 1.0,
                close,
                volume: 1000,
            }
        })
        .collect()
}

/// Falling leg then rising leg, so the fast average crosses above the slow
/// average exactly once on the way back up.
pub fn generate_v_bars(
    code: &str,
    start_date: &str,
    down: usize,
    up: usize,
    start_price: f64,
    step: f64,
) -> Vec<OhlcvBar> {
    let start = NaiveDate::parse_from_str(start_date, "%Y-%m-%d").unwrap();
    (0..down + up)
        .map(|i| {
            let close = if i < down {
                start_price - i as f64 * step
            } else {
                start_price - down as f64 * step + (i - down) as f64 * step
            };
            OhlcvBar {
                code: code.to_string(),
                date: start + chrono::Duration::days(i as i64),
                open: close,
                high: close + 1.0,
                low: close - 1.0,
                close,
                volume: 1000,
            }
        })
        .collect()
}

/// Wide stops so no risk exit fires unless a test wants one.
pub fn sample_config() -> StrategyConfig {
    StrategyConfig {
        stop_loss_pct: 0.90,
        take_profit_pct: 9.0,
        max_drawdown_limit: 0.95,
        ..StrategyConfig::default()
    }
}
