//! Configuration validation.
//!
//! A chain of per-section validators that reports the first problem found.
//! Absent keys fall back to the same defaults the run itself would use, so
//! a minimal configuration passes.

use crate::domain::error::AshtraderError;
use crate::domain::sizing::SizingMethod;
use crate::domain::strategy::{SignalMode, StrategyConfig};
use crate::ports::config_port::ConfigPort;
use chrono::NaiveDate;

pub fn validate_config(config: &dyn ConfigPort) -> Result<(), AshtraderError> {
    validate_dates(config)?;
    validate_codes(config)?;
    validate_capital(config)?;
    validate_strategy(config)?;
    validate_risk(config)?;
    validate_sizing(config)?;
    validate_monte_carlo(config)?;
    Ok(())
}

fn invalid(section: &str, key: &str, reason: &str) -> AshtraderError {
    AshtraderError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason: reason.to_string(),
    }
}

fn validate_dates(config: &dyn ConfigPort) -> Result<(), AshtraderError> {
    let start = parse_date(config.get_string("backtest", "start_date").as_deref(), "start_date")?;
    let end = parse_date(config.get_string("backtest", "end_date").as_deref(), "end_date")?;

    if start >= end {
        return Err(invalid(
            "backtest",
            "start_date",
            "start_date must be before end_date",
        ));
    }
    Ok(())
}

fn parse_date(value: Option<&str>, field: &str) -> Result<NaiveDate, AshtraderError> {
    match value {
        None => Err(AshtraderError::ConfigMissing {
            section: "backtest".to_string(),
            key: field.to_string(),
        }),
        Some(s) => NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|_| {
            invalid(
                "backtest",
                field,
                &format!("invalid {field} format, expected YYYY-MM-DD"),
            )
        }),
    }
}

fn validate_codes(config: &dyn ConfigPort) -> Result<(), AshtraderError> {
    let codes = config.get_string("backtest", "codes");
    let code = config.get_string("backtest", "code");

    match (codes, code) {
        (Some(c), _) if !c.trim().is_empty() => Ok(()),
        (None, Some(c)) if !c.trim().is_empty() => Ok(()),
        _ => Err(AshtraderError::ConfigMissing {
            section: "backtest".to_string(),
            key: "code".to_string(),
        }),
    }
}

fn validate_capital(config: &dyn ConfigPort) -> Result<(), AshtraderError> {
    let defaults = StrategyConfig::default();
    let value = config.get_double("backtest", "initial_capital", defaults.initial_capital);
    if value <= 0.0 {
        return Err(invalid(
            "backtest",
            "initial_capital",
            "initial_capital must be positive",
        ));
    }
    Ok(())
}

fn validate_strategy(config: &dyn ConfigPort) -> Result<(), AshtraderError> {
    if let Some(mode) = config.get_string("strategy", "signal_mode") {
        if SignalMode::parse(&mode).is_none() {
            return Err(invalid(
                "strategy",
                "signal_mode",
                "expected crossover, trend_following or multi_factor",
            ));
        }
    }

    let fast = config.get_int("strategy", "fast_period", 5);
    if fast < 1 {
        return Err(invalid("strategy", "fast_period", "fast_period must be at least 1"));
    }
    let slow = config.get_int("strategy", "slow_period", 20);
    if slow < 1 {
        return Err(invalid("strategy", "slow_period", "slow_period must be at least 1"));
    }
    if fast >= slow {
        return Err(invalid(
            "strategy",
            "fast_period",
            "fast_period must be less than slow_period",
        ));
    }

    let atr = config.get_int("strategy", "atr_period", 14);
    if atr < 1 {
        return Err(invalid("strategy", "atr_period", "atr_period must be at least 1"));
    }

    let bollinger = config.get_int("strategy", "bollinger_period", 20);
    if bollinger < 2 {
        return Err(invalid(
            "strategy",
            "bollinger_period",
            "bollinger_period must be at least 2",
        ));
    }

    let stddev = config.get_double("strategy", "bollinger_stddev", 2.0);
    if stddev <= 0.0 {
        return Err(invalid(
            "strategy",
            "bollinger_stddev",
            "bollinger_stddev must be positive",
        ));
    }

    Ok(())
}

fn validate_risk(config: &dyn ConfigPort) -> Result<(), AshtraderError> {
    let defaults = StrategyConfig::default();

    let stop_loss = config.get_double("risk", "stop_loss", defaults.stop_loss_pct);
    if stop_loss <= 0.0 || stop_loss >= 1.0 {
        return Err(invalid("risk", "stop_loss", "stop_loss must be between 0 and 1"));
    }

    let take_profit = config.get_double("risk", "take_profit", defaults.take_profit_pct);
    if take_profit <= 0.0 {
        return Err(invalid("risk", "take_profit", "take_profit must be positive"));
    }

    let drawdown = config.get_double("risk", "max_drawdown_limit", defaults.max_drawdown_limit);
    if drawdown <= 0.0 || drawdown >= 1.0 {
        return Err(invalid(
            "risk",
            "max_drawdown_limit",
            "max_drawdown_limit must be between 0 and 1",
        ));
    }

    let trailing = config.get_double("risk", "trailing_stop", defaults.trailing_stop_pct);
    if trailing <= 0.0 || trailing >= 1.0 {
        return Err(invalid(
            "risk",
            "trailing_stop",
            "trailing_stop must be between 0 and 1",
        ));
    }

    let max_position = config.get_double("risk", "max_position", defaults.max_position);
    if max_position <= 0.0 || max_position > 1.0 {
        return Err(invalid(
            "risk",
            "max_position",
            "max_position must be between 0 and 1",
        ));
    }

    for key in ["commission", "slippage", "stamp_tax"] {
        let default = match key {
            "commission" => defaults.commission_rate,
            "slippage" => defaults.slippage_rate,
            _ => defaults.stamp_tax_rate,
        };
        let value = config.get_double("risk", key, default);
        if value < 0.0 {
            return Err(invalid("risk", key, &format!("{key} must be non-negative")));
        }
    }

    Ok(())
}

fn validate_sizing(config: &dyn ConfigPort) -> Result<(), AshtraderError> {
    let method = match config.get_string("sizing", "method") {
        Some(s) => match SizingMethod::parse(&s) {
            Some(m) => m,
            None => {
                return Err(invalid(
                    "sizing",
                    "method",
                    "expected kelly, risk_parity or fixed",
                ));
            }
        },
        None => SizingMethod::Fixed,
    };

    let defaults = StrategyConfig::default();

    let win_rate = config.get_double("sizing", "win_rate", defaults.sizing.win_rate);
    if !(0.0..=1.0).contains(&win_rate) {
        return Err(invalid("sizing", "win_rate", "win_rate must be between 0 and 1"));
    }

    let avg_win = config.get_double("sizing", "avg_win", defaults.sizing.avg_win);
    if avg_win <= 0.0 {
        return Err(invalid("sizing", "avg_win", "avg_win must be positive"));
    }

    let avg_loss = config.get_double("sizing", "avg_loss", defaults.sizing.avg_loss);
    if avg_loss < 0.0 {
        return Err(invalid("sizing", "avg_loss", "avg_loss must be non-negative"));
    }
    if method == SizingMethod::RiskParity && avg_loss == 0.0 {
        return Err(invalid(
            "sizing",
            "avg_loss",
            "avg_loss must be positive for risk_parity sizing",
        ));
    }

    let risk_per_trade =
        config.get_double("sizing", "risk_per_trade", defaults.sizing.risk_per_trade);
    if risk_per_trade <= 0.0 {
        return Err(invalid(
            "sizing",
            "risk_per_trade",
            "risk_per_trade must be positive",
        ));
    }

    Ok(())
}

fn validate_monte_carlo(config: &dyn ConfigPort) -> Result<(), AshtraderError> {
    if !config.get_bool("monte_carlo", "enabled", false) {
        return Ok(());
    }
    let simulations = config.get_int("monte_carlo", "simulations", 500);
    if simulations < 1 {
        return Err(invalid(
            "monte_carlo",
            "simulations",
            "simulations must be at least 1",
        ));
    }
    Ok(())
}
