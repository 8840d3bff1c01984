//! Strategy configuration.

use crate::domain::fundamental::FundamentalThresholds;
use crate::domain::sizing::{SizingMethod, SizingParams};

/// Closed set of signal generation modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalMode {
    Crossover,
    TrendFollowing,
    MultiFactor,
}

impl SignalMode {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "crossover" => Some(SignalMode::Crossover),
            "trend_following" => Some(SignalMode::TrendFollowing),
            "multi_factor" => Some(SignalMode::MultiFactor),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SignalMode::Crossover => "crossover",
            SignalMode::TrendFollowing => "trend_following",
            SignalMode::MultiFactor => "multi_factor",
        }
    }
}

/// One immutable record holding every parameter of a run. Built from config
/// once, then passed by reference through the whole pipeline; nothing in the
/// engine reads ambient state.
#[derive(Debug, Clone, PartialEq)]
pub struct StrategyConfig {
    pub signal_mode: SignalMode,
    pub fast_period: usize,
    pub slow_period: usize,
    pub atr_period: usize,
    pub bollinger_period: usize,
    pub bollinger_mult_x100: u32,

    pub stop_loss_pct: f64,
    pub take_profit_pct: f64,
    pub max_drawdown_limit: f64,
    pub trailing_stop_pct: f64,
    pub use_trailing_stop: bool,
    pub max_position: f64,

    pub commission_rate: f64,
    pub slippage_rate: f64,
    pub stamp_tax_rate: f64,

    pub sizing_method: SizingMethod,
    pub sizing: SizingParams,
    pub initial_capital: f64,

    pub use_fundamental: bool,
    pub thresholds: FundamentalThresholds,
}

impl Default for StrategyConfig {
    fn default() -> Self {
        Self {
            signal_mode: SignalMode::Crossover,
            fast_period: 5,
            slow_period: 20,
            atr_period: 14,
            bollinger_period: 20,
            bollinger_mult_x100: 200,
            stop_loss_pct: 0.10,
            take_profit_pct: 0.30,
            max_drawdown_limit: 0.20,
            trailing_stop_pct: 0.10,
            use_trailing_stop: false,
            max_position: 0.50,
            commission_rate: 0.001,
            slippage_rate: 0.0005,
            stamp_tax_rate: 0.001,
            sizing_method: SizingMethod::Fixed,
            sizing: SizingParams::default(),
            initial_capital: 1_000_000.0,
            use_fundamental: false,
            thresholds: FundamentalThresholds::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_parameter_set() {
        let config = StrategyConfig::default();
        assert_eq!(config.signal_mode, SignalMode::Crossover);
        assert_eq!(config.fast_period, 5);
        assert_eq!(config.slow_period, 20);
        assert_eq!(config.atr_period, 14);
        assert_eq!(config.bollinger_period, 20);
        assert_eq!(config.bollinger_mult_x100, 200);
        assert_eq!(config.stop_loss_pct, 0.10);
        assert_eq!(config.take_profit_pct, 0.30);
        assert_eq!(config.max_drawdown_limit, 0.20);
        assert_eq!(config.max_position, 0.50);
        assert!(!config.use_trailing_stop);
        assert!(!config.use_fundamental);
        assert_eq!(config.sizing_method, SizingMethod::Fixed);
        assert_eq!(config.initial_capital, 1_000_000.0);
    }

    #[test]
    fn signal_mode_parse_round_trips() {
        for mode in [
            SignalMode::Crossover,
            SignalMode::TrendFollowing,
            SignalMode::MultiFactor,
        ] {
            assert_eq!(SignalMode::parse(mode.as_str()), Some(mode));
        }
        assert_eq!(SignalMode::parse("momentum"), None);
    }

    #[test]
    fn signal_mode_parse_is_case_insensitive() {
        assert_eq!(SignalMode::parse(" Crossover "), Some(SignalMode::Crossover));
        assert_eq!(
            SignalMode::parse("TREND_FOLLOWING"),
            Some(SignalMode::TrendFollowing)
        );
    }
}
