//! Per-code container for bars and their computed indicator series.

use crate::domain::indicator::atr::calculate_atr;
use crate::domain::indicator::bollinger::calculate_bollinger;
use crate::domain::indicator::sma::calculate_sma;
use crate::domain::indicator::{IndicatorSeries, IndicatorType};
use crate::domain::ohlcv::OhlcvBar;
use crate::domain::strategy::StrategyConfig;
use std::collections::HashMap;

#[derive(Debug, Clone)]
pub struct CodeData {
    pub code: String,
    pub bars: Vec<OhlcvBar>,
    pub indicators: HashMap<IndicatorType, IndicatorSeries>,
}

impl CodeData {
    pub fn new(code: String, bars: Vec<OhlcvBar>) -> Self {
        Self {
            code,
            bars,
            indicators: HashMap::new(),
        }
    }

    /// Build the container with every indicator the state machine reads:
    /// fast and slow SMA, ATR and Bollinger Bands per the configuration.
    pub fn compute(code: String, bars: Vec<OhlcvBar>, config: &StrategyConfig) -> Self {
        let mut indicators = HashMap::new();
        for period in [config.fast_period, config.slow_period] {
            indicators
                .entry(IndicatorType::Sma(period))
                .or_insert_with(|| calculate_sma(&bars, period));
        }
        indicators.insert(
            IndicatorType::Atr(config.atr_period),
            calculate_atr(&bars, config.atr_period),
        );
        indicators.insert(
            IndicatorType::Bollinger {
                period: config.bollinger_period,
                stddev_mult_x100: config.bollinger_mult_x100,
            },
            calculate_bollinger(&bars, config.bollinger_period, config.bollinger_mult_x100),
        );
        Self {
            code,
            bars,
            indicators,
        }
    }

    pub fn bar_count(&self) -> usize {
        self.bars.len()
    }

    /// Scalar indicator value at bar index `i`; `None` for warmup, a missing
    /// series, or an out-of-range index.
    pub fn simple_at(&self, indicator_type: &IndicatorType, i: usize) -> Option<f64> {
        self.indicators.get(indicator_type)?.simple_at(i)
    }

    /// Bollinger `(upper, middle, lower)` at bar index `i`.
    pub fn bollinger_at(&self, indicator_type: &IndicatorType, i: usize) -> Option<(f64, f64, f64)> {
        self.indicators.get(indicator_type)?.bollinger_at(i)
    }
}
