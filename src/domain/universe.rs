//! Multi-code basket runs.
//!
//! Parses code lists from configuration, runs a reduced trend-following
//! pass over every code in parallel, and ranks the survivors. A failing
//! code is skipped with a warning; it never aborts the basket.

use crate::domain::error::AshtraderError;
use crate::domain::indicator::sma::calculate_sma;
use crate::domain::metrics::sample_std;
use crate::domain::ohlcv::{validate_bars, OhlcvBar};
use crate::domain::strategy::StrategyConfig;
use crate::ports::data_port::DataPort;
use chrono::NaiveDate;
use rayon::prelude::*;
use std::collections::HashSet;

/// Parse a comma-separated code list. Codes are trimmed and lowercased;
/// blank tokens and duplicates are configuration errors.
pub fn parse_codes(input: &str) -> Result<Vec<String>, AshtraderError> {
    if input.trim().is_empty() {
        return Err(AshtraderError::EmptyUniverse);
    }

    let mut codes = Vec::new();
    let mut seen = HashSet::new();

    for token in input.split(',') {
        let trimmed = token.trim();
        if trimmed.is_empty() {
            return Err(AshtraderError::ConfigInvalid {
                section: "backtest".to_string(),
                key: "codes".to_string(),
                reason: "empty token in code list".to_string(),
            });
        }
        let code = trimmed.to_lowercase();
        if !seen.insert(code.clone()) {
            return Err(AshtraderError::ConfigInvalid {
                section: "backtest".to_string(),
                key: "codes".to_string(),
                reason: format!("duplicate code: {code}"),
            });
        }
        codes.push(code);
    }

    Ok(codes)
}

#[derive(Debug, Clone)]
pub struct CodeRanking {
    pub code: String,
    pub total_return: f64,
    pub annualized_return: f64,
    pub bars: usize,
}

#[derive(Debug, Clone)]
pub struct SkippedCode {
    pub code: String,
    pub reason: String,
}

#[derive(Debug, Clone)]
pub struct BasketSummary {
    /// Survivors in descending annualized-return order.
    pub rankings: Vec<CodeRanking>,
    pub skipped: Vec<SkippedCode>,
    pub mean_annualized: f64,
    pub std_annualized: f64,
    /// Mean over standard deviation of the annualized returns, zero when
    /// the spread is zero.
    pub naive_sharpe: f64,
}

/// Run the reduced pass over every code and rank the results.
///
/// Codes run in parallel; failures are collected and reported once the
/// whole basket has finished so the warnings come out in input order.
pub fn run_basket(
    data_port: &(dyn DataPort + Sync),
    codes: &[String],
    start_date: NaiveDate,
    end_date: NaiveDate,
    config: &StrategyConfig,
) -> Result<BasketSummary, AshtraderError> {
    if codes.is_empty() {
        return Err(AshtraderError::EmptyUniverse);
    }

    let outcomes: Vec<Result<CodeRanking, SkippedCode>> = codes
        .par_iter()
        .map(|code| {
            rank_single(data_port, code, start_date, end_date, config).map_err(|e| {
                SkippedCode {
                    code: code.clone(),
                    reason: e.to_string(),
                }
            })
        })
        .collect();

    let mut rankings = Vec::new();
    let mut skipped = Vec::new();
    for outcome in outcomes {
        match outcome {
            Ok(ranking) => rankings.push(ranking),
            Err(skip) => skipped.push(skip),
        }
    }

    for skip in &skipped {
        eprintln!("Warning: skipping {} ({})", skip.code, skip.reason);
    }

    if rankings.is_empty() {
        return Err(AshtraderError::NoResults);
    }

    rankings.sort_by(|a, b| {
        b.annualized_return
            .partial_cmp(&a.annualized_return)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let annualized: Vec<f64> = rankings.iter().map(|r| r.annualized_return).collect();
    let mean_annualized = annualized.iter().sum::<f64>() / annualized.len() as f64;
    let std_annualized = sample_std(&annualized);
    let naive_sharpe = if std_annualized > 0.0 {
        mean_annualized / std_annualized
    } else {
        0.0
    };

    Ok(BasketSummary {
        rankings,
        skipped,
        mean_annualized,
        std_annualized,
        naive_sharpe,
    })
}

fn rank_single(
    data_port: &(dyn DataPort + Sync),
    code: &str,
    start_date: NaiveDate,
    end_date: NaiveDate,
    config: &StrategyConfig,
) -> Result<CodeRanking, AshtraderError> {
    let bars = data_port.fetch_bars(code, start_date, end_date)?;
    if bars.is_empty() {
        return Err(AshtraderError::NoData {
            code: code.to_string(),
        });
    }
    validate_bars(code, &bars)?;

    let (total_return, annualized_return) =
        trend_following_return(&bars, config.fast_period, config.slow_period);

    Ok(CodeRanking {
        code: code.to_string(),
        total_return,
        annualized_return,
        bars: bars.len(),
    })
}

/// The reduced pass: long while the fast moving average sits above the
/// slow one, flat otherwise, no overlay and no costs. Yesterday's signal
/// earns today's close-to-close move.
fn trend_following_return(
    bars: &[OhlcvBar],
    fast_period: usize,
    slow_period: usize,
) -> (f64, f64) {
    let fast = calculate_sma(bars, fast_period);
    let slow = calculate_sma(bars, slow_period);

    let mut compound = 1.0;
    for i in 1..bars.len() {
        let long_yesterday = match (fast.simple_at(i - 1), slow.simple_at(i - 1)) {
            (Some(f), Some(s)) => f > s,
            _ => false,
        };
        if long_yesterday {
            compound *= bars[i].close / bars[i - 1].close;
        }
    }
    let total_return = compound - 1.0;

    let days = (bars[bars.len() - 1].date - bars[0].date).num_days();
    let annualized_return = if days <= 0 {
        0.0
    } else {
        let years = days as f64 / 365.0;
        (1.0 + total_return).powf(1.0 / years) - 1.0
    };

    (total_return, annualized_return)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::fundamental::FundamentalSnapshot;
    use crate::domain::ohlcv::BenchmarkBar;
    use approx::assert_relative_eq;
    use std::collections::HashMap;

    fn date(d: i64) -> NaiveDate {
        NaiveDate::from_ymd_opt(2023, 1, 2).unwrap() + chrono::Duration::days(d)
    }

    fn rising_bars(code: &str, count: usize, daily_gain: f64) -> Vec<OhlcvBar> {
        let mut close = 100.0;
        (0..count)
            .map(|i| {
                if i > 0 {
                    close *= 1.0 + daily_gain;
                }
                OhlcvBar {
                    code: code.to_string(),
                    date: date(i as i64),
                    open: close,
                    high: close + 1.0,
                    low: close - 1.0,
                    close,
                    volume: 1000,
                }
            })
            .collect()
    }

    struct StaticDataPort {
        data: HashMap<String, Vec<OhlcvBar>>,
    }

    impl StaticDataPort {
        fn new() -> Self {
            Self {
                data: HashMap::new(),
            }
        }

        fn with_bars(mut self, code: &str, bars: Vec<OhlcvBar>) -> Self {
            self.data.insert(code.to_string(), bars);
            self
        }
    }

    impl DataPort for StaticDataPort {
        fn fetch_bars(
            &self,
            code: &str,
            _start_date: NaiveDate,
            _end_date: NaiveDate,
        ) -> Result<Vec<OhlcvBar>, AshtraderError> {
            self.data
                .get(code)
                .cloned()
                .ok_or_else(|| AshtraderError::NoData {
                    code: code.to_string(),
                })
        }

        fn fetch_benchmark(
            &self,
            _benchmark_id: &str,
            _start_date: NaiveDate,
            _end_date: NaiveDate,
        ) -> Result<Vec<BenchmarkBar>, AshtraderError> {
            Ok(Vec::new())
        }

        fn fetch_fundamentals(&self, _code: &str) -> FundamentalSnapshot {
            FundamentalSnapshot::default()
        }

        fn list_codes(&self) -> Result<Vec<String>, AshtraderError> {
            let mut codes: Vec<String> = self.data.keys().cloned().collect();
            codes.sort();
            Ok(codes)
        }

        fn data_range(
            &self,
            _code: &str,
        ) -> Result<Option<(NaiveDate, NaiveDate, usize)>, AshtraderError> {
            Ok(None)
        }
    }

    #[test]
    fn parse_codes_lowercases_and_trims() {
        let result = parse_codes(" SH600000 , sz000001 ").unwrap();
        assert_eq!(result, vec!["sh600000", "sz000001"]);
    }

    #[test]
    fn parse_codes_single() {
        assert_eq!(parse_codes("sh600519").unwrap(), vec!["sh600519"]);
    }

    #[test]
    fn parse_codes_rejects_empty_token() {
        let err = parse_codes("sh600000,,sz000001").unwrap_err();
        assert!(matches!(err, AshtraderError::ConfigInvalid { .. }));
        assert!(err.to_string().contains("empty token"));
    }

    #[test]
    fn parse_codes_rejects_duplicates_after_normalization() {
        let err = parse_codes("sh600000,SH600000").unwrap_err();
        assert!(err.to_string().contains("duplicate code: sh600000"));
    }

    #[test]
    fn parse_codes_blank_input_is_empty_universe() {
        let err = parse_codes("   ").unwrap_err();
        assert!(matches!(err, AshtraderError::EmptyUniverse));
    }

    #[test]
    fn basket_ranks_by_annualized_return_descending() {
        let port = StaticDataPort::new()
            .with_bars("sh600000", rising_bars("sh600000", 60, 0.01))
            .with_bars("sz000001", rising_bars("sz000001", 60, 0.001));
        let codes = vec!["sz000001".to_string(), "sh600000".to_string()];
        let config = StrategyConfig::default();

        let summary = run_basket(&port, &codes, date(0), date(59), &config).unwrap();

        assert_eq!(summary.rankings.len(), 2);
        assert!(summary.skipped.is_empty());
        assert_eq!(summary.rankings[0].code, "sh600000");
        assert!(
            summary.rankings[0].annualized_return >= summary.rankings[1].annualized_return
        );
        assert!(summary.std_annualized > 0.0);
        assert!(summary.naive_sharpe > 0.0);
    }

    #[test]
    fn basket_isolates_failing_codes() {
        let port =
            StaticDataPort::new().with_bars("sh600000", rising_bars("sh600000", 60, 0.01));
        let codes = vec!["sh600000".to_string(), "sz999999".to_string()];
        let config = StrategyConfig::default();

        let summary = run_basket(&port, &codes, date(0), date(59), &config).unwrap();

        assert_eq!(summary.rankings.len(), 1);
        assert_eq!(summary.skipped.len(), 1);
        assert_eq!(summary.skipped[0].code, "sz999999");
        assert!(summary.skipped[0].reason.contains("no data"));
    }

    #[test]
    fn basket_skips_codes_with_too_few_bars() {
        let port = StaticDataPort::new()
            .with_bars("sh600000", rising_bars("sh600000", 60, 0.01))
            .with_bars("sz000001", rising_bars("sz000001", 20, 0.01));
        let codes = vec!["sh600000".to_string(), "sz000001".to_string()];
        let config = StrategyConfig::default();

        let summary = run_basket(&port, &codes, date(0), date(59), &config).unwrap();

        assert_eq!(summary.rankings.len(), 1);
        assert_eq!(summary.skipped[0].code, "sz000001");
        assert!(summary.skipped[0].reason.contains("insufficient data"));
    }

    #[test]
    fn basket_with_no_survivors_is_an_error() {
        let port = StaticDataPort::new();
        let codes = vec!["sh600000".to_string()];
        let config = StrategyConfig::default();

        let err = run_basket(&port, &codes, date(0), date(59), &config).unwrap_err();
        assert!(matches!(err, AshtraderError::NoResults));
    }

    #[test]
    fn basket_rejects_empty_code_list() {
        let port = StaticDataPort::new();
        let config = StrategyConfig::default();
        let err = run_basket(&port, &[], date(0), date(59), &config).unwrap_err();
        assert!(matches!(err, AshtraderError::EmptyUniverse));
    }

    #[test]
    fn reduced_pass_compounds_from_first_valid_signal() {
        // fast 2 / slow 3: the slow average becomes valid at index 2, so the
        // first earning day is index 3
        let bars = rising_bars("sh600000", 60, 0.01);
        let (total, annualized) = trend_following_return(&bars, 2, 3);

        let expected_total = 1.01_f64.powi(57) - 1.0;
        assert_relative_eq!(total, expected_total, epsilon = 1e-9);

        let years = 59.0 / 365.0;
        let expected_annualized = (1.0 + expected_total).powf(1.0 / years) - 1.0;
        assert_relative_eq!(annualized, expected_annualized, epsilon = 1e-9);
    }

    #[test]
    fn reduced_pass_single_day_has_zero_annualized() {
        let bars = rising_bars("sh600000", 1, 0.01);
        let (total, annualized) = trend_following_return(&bars, 2, 3);
        assert_eq!(total, 0.0);
        assert_eq!(annualized, 0.0);
    }
}
