//! Day-by-day strategy state machine.
//!
//! Each trading day is an immutable [`DayState`] record produced by folding
//! the previous day's record plus today's indicator values through
//! [`advance`]. Day 0 is a flat seed; the risk overlay runs before any new
//! signal logic and a fired risk event ends the day's transition.

use crate::domain::code_data::CodeData;
use crate::domain::indicator::IndicatorType;
use crate::domain::sizing::position_fraction;
use crate::domain::strategy::{SignalMode, StrategyConfig};
use chrono::NaiveDate;
use std::fmt;

/// ATR must exceed its mean over this many prior days to count as expansion.
pub const ATR_SCORE_LOOKBACK: usize = 20;

/// Composite score required to open a position in crossover and
/// trend-following modes.
pub const ENTRY_SCORE_MIN: f64 = 0.5;

/// Multi-factor mode enters/holds at or above the upper bound, exits at or
/// below the lower one; the gap between them carries the prior signal.
pub const MULTI_FACTOR_ENTER: f64 = 0.7;
pub const MULTI_FACTOR_EXIT: f64 = 0.3;

const TECH_WEIGHT: f64 = 0.6;
const FUNDAMENTAL_WEIGHT: f64 = 0.4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    Flat,
    Long,
}

impl Signal {
    pub fn as_f64(self) -> f64 {
        match self {
            Signal::Flat => 0.0,
            Signal::Long => 1.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RiskEvent {
    None,
    StopLoss,
    TakeProfit,
    DrawdownLimit,
    TrailingStop,
}

impl RiskEvent {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskEvent::None => "none",
            RiskEvent::StopLoss => "stop_loss",
            RiskEvent::TakeProfit => "take_profit",
            RiskEvent::DrawdownLimit => "drawdown_limit",
            RiskEvent::TrailingStop => "trailing_stop",
        }
    }
}

impl fmt::Display for RiskEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Everything recorded about one trading day.
#[derive(Debug, Clone, PartialEq)]
pub struct DayState {
    pub date: NaiveDate,
    pub signal: Signal,
    pub position: f64,
    pub entry_price: f64,
    pub stop_loss: f64,
    pub take_profit: f64,
    pub trailing_stop: f64,
    pub risk_event: RiskEvent,
    pub tech_score: f64,
    pub fundamental_score: f64,
    pub composite_score: f64,
}

impl DayState {
    /// The all-flat day-0 record; there is no look-back before series start.
    pub fn seed(date: NaiveDate) -> Self {
        Self {
            date,
            signal: Signal::Flat,
            position: 0.0,
            entry_price: 0.0,
            stop_loss: 0.0,
            take_profit: 0.0,
            trailing_stop: 0.0,
            risk_event: RiskEvent::None,
            tech_score: 0.0,
            fundamental_score: 0.0,
            composite_score: 0.0,
        }
    }
}

/// Per-day inputs resolved from the indicator series. A `None` moving
/// average means insufficient history; any comparison involving it is false.
#[derive(Debug, Clone, Copy)]
pub struct DayInputs {
    pub date: NaiveDate,
    pub close: f64,
    pub fast_ma: Option<f64>,
    pub slow_ma: Option<f64>,
    pub prev_fast_ma: Option<f64>,
    pub prev_slow_ma: Option<f64>,
    pub tech_score: f64,
    pub fundamental_score: f64,
    pub composite_score: f64,
}

/// Technical sub-scores at bar `i`: moving-average alignment, close inside
/// the Bollinger channel, and ATR expansion, each 0 or 1, averaged.
pub fn technical_score(code_data: &CodeData, config: &StrategyConfig, i: usize) -> f64 {
    let close = code_data.bars[i].close;

    let fast = code_data.simple_at(&IndicatorType::Sma(config.fast_period), i);
    let slow = code_data.simple_at(&IndicatorType::Sma(config.slow_period), i);
    let ma_score = match (fast, slow) {
        (Some(f), Some(s)) if f > s => 1.0,
        _ => 0.0,
    };

    let boll_type = IndicatorType::Bollinger {
        period: config.bollinger_period,
        stddev_mult_x100: config.bollinger_mult_x100,
    };
    let bb_score = match code_data.bollinger_at(&boll_type, i) {
        Some((upper, _, lower)) if lower < close && close < upper => 1.0,
        _ => 0.0,
    };

    let atr_score = atr_expansion_score(code_data, config.atr_period, i);

    (ma_score + bb_score + atr_score) / 3.0
}

/// 1 when ATR[i] exceeds the mean of the previous [`ATR_SCORE_LOOKBACK`]
/// ATR values, 0 when it does not or when any of them is still warming up.
fn atr_expansion_score(code_data: &CodeData, period: usize, i: usize) -> f64 {
    if i < ATR_SCORE_LOOKBACK {
        return 0.0;
    }
    let atr_type = IndicatorType::Atr(period);
    let current = match code_data.simple_at(&atr_type, i) {
        Some(v) => v,
        None => return 0.0,
    };
    let mut sum = 0.0;
    for j in (i - ATR_SCORE_LOOKBACK)..i {
        match code_data.simple_at(&atr_type, j) {
            Some(v) => sum += v,
            None => return 0.0,
        }
    }
    if current > sum / ATR_SCORE_LOOKBACK as f64 {
        1.0
    } else {
        0.0
    }
}

/// Technical score alone, except in multi-factor mode where the fundamental
/// score is blended in at a fixed 60/40 weighting.
pub fn composite_score(tech: f64, fundamental: f64, mode: SignalMode) -> f64 {
    match mode {
        SignalMode::MultiFactor => TECH_WEIGHT * tech + FUNDAMENTAL_WEIGHT * fundamental,
        _ => tech,
    }
}

fn crossed_above(inputs: &DayInputs) -> bool {
    match (
        inputs.prev_fast_ma,
        inputs.prev_slow_ma,
        inputs.fast_ma,
        inputs.slow_ma,
    ) {
        (Some(pf), Some(ps), Some(f), Some(s)) => pf <= ps && f > s,
        _ => false,
    }
}

fn crossed_below(inputs: &DayInputs) -> bool {
    match (
        inputs.prev_fast_ma,
        inputs.prev_slow_ma,
        inputs.fast_ma,
        inputs.slow_ma,
    ) {
        (Some(pf), Some(ps), Some(f), Some(s)) => pf >= ps && f < s,
        _ => false,
    }
}

fn trending_up(inputs: &DayInputs) -> bool {
    matches!(
        (inputs.fast_ma, inputs.slow_ma),
        (Some(f), Some(s)) if f > s
    )
}

fn enter_long(inputs: &DayInputs, config: &StrategyConfig) -> DayState {
    let close = inputs.close;
    DayState {
        date: inputs.date,
        signal: Signal::Long,
        position: position_fraction(
            config.sizing_method,
            &config.sizing,
            config.initial_capital,
            config.max_position,
        ),
        entry_price: close,
        stop_loss: close * (1.0 - config.stop_loss_pct),
        take_profit: close * (1.0 + config.take_profit_pct),
        trailing_stop: if config.use_trailing_stop {
            close * (1.0 - config.trailing_stop_pct)
        } else {
            0.0
        },
        risk_event: RiskEvent::None,
        tech_score: inputs.tech_score,
        fundamental_score: inputs.fundamental_score,
        composite_score: inputs.composite_score,
    }
}

fn carry_forward(prev: &DayState, inputs: &DayInputs) -> DayState {
    DayState {
        date: inputs.date,
        signal: prev.signal,
        position: prev.position,
        entry_price: prev.entry_price,
        stop_loss: prev.stop_loss,
        take_profit: prev.take_profit,
        trailing_stop: prev.trailing_stop,
        risk_event: RiskEvent::None,
        tech_score: inputs.tech_score,
        fundamental_score: inputs.fundamental_score,
        composite_score: inputs.composite_score,
    }
}

/// One transition of the state machine.
///
/// The risk overlay runs first and only while a position is held. Exactly
/// one stop family is evaluated per run: the trailing ratchet when enabled,
/// the fixed stop-loss/take-profit pair otherwise. The drawdown limit is
/// tested only when that family did not fire, so a single event is recorded
/// even when several conditions hold on the same day. A fired event forces
/// the day flat and skips all new-signal logic.
///
/// Hold days keep the previous day's trailing level; the intra-day ratchet
/// is recorded only on event days and voluntary exits.
pub fn advance(prev: &DayState, inputs: &DayInputs, config: &StrategyConfig) -> DayState {
    let close = inputs.close;

    let mut flat = DayState {
        date: inputs.date,
        signal: Signal::Flat,
        position: 0.0,
        entry_price: 0.0,
        stop_loss: 0.0,
        take_profit: 0.0,
        trailing_stop: 0.0,
        risk_event: RiskEvent::None,
        tech_score: inputs.tech_score,
        fundamental_score: inputs.fundamental_score,
        composite_score: inputs.composite_score,
    };

    let in_position = prev.position > 0.0 && prev.entry_price > 0.0;
    if in_position {
        if config.use_trailing_stop {
            let ratchet = prev
                .trailing_stop
                .max(close * (1.0 - config.trailing_stop_pct));
            flat.trailing_stop = ratchet;
            if close <= ratchet {
                flat.risk_event = RiskEvent::TrailingStop;
                return flat;
            }
        } else if close <= prev.stop_loss {
            flat.risk_event = RiskEvent::StopLoss;
            return flat;
        } else if close >= prev.take_profit {
            flat.risk_event = RiskEvent::TakeProfit;
            return flat;
        }
        // Reached only when the selected stop family did not fire.
        if close / prev.entry_price - 1.0 <= -config.max_drawdown_limit {
            flat.risk_event = RiskEvent::DrawdownLimit;
            return flat;
        }
    }

    match config.signal_mode {
        SignalMode::Crossover => {
            if crossed_above(inputs) && inputs.composite_score >= ENTRY_SCORE_MIN {
                enter_long(inputs, config)
            } else if crossed_below(inputs) {
                flat
            } else {
                carry_forward(prev, inputs)
            }
        }
        SignalMode::TrendFollowing => {
            if trending_up(inputs) && inputs.composite_score >= ENTRY_SCORE_MIN {
                if prev.signal == Signal::Flat {
                    enter_long(inputs, config)
                } else {
                    carry_forward(prev, inputs)
                }
            } else {
                flat
            }
        }
        SignalMode::MultiFactor => {
            if inputs.composite_score >= MULTI_FACTOR_ENTER {
                if prev.signal == Signal::Flat {
                    enter_long(inputs, config)
                } else {
                    carry_forward(prev, inputs)
                }
            } else if inputs.composite_score <= MULTI_FACTOR_EXIT {
                flat
            } else {
                carry_forward(prev, inputs)
            }
        }
    }
}

/// Fold the whole bar series into per-day records. `fundamental_score` is
/// constant for the run: the scorer output when fundamental analysis is
/// enabled, a neutral 0.5 otherwise.
pub fn run_state_machine(
    code_data: &CodeData,
    config: &StrategyConfig,
    fundamental_score: f64,
) -> Vec<DayState> {
    let bars = &code_data.bars;
    if bars.is_empty() {
        return Vec::new();
    }

    let fast_type = IndicatorType::Sma(config.fast_period);
    let slow_type = IndicatorType::Sma(config.slow_period);

    let mut states = Vec::with_capacity(bars.len());
    states.push(DayState::seed(bars[0].date));

    for i in 1..bars.len() {
        let tech = technical_score(code_data, config, i);
        let inputs = DayInputs {
            date: bars[i].date,
            close: bars[i].close,
            fast_ma: code_data.simple_at(&fast_type, i),
            slow_ma: code_data.simple_at(&slow_type, i),
            prev_fast_ma: code_data.simple_at(&fast_type, i - 1),
            prev_slow_ma: code_data.simple_at(&slow_type, i - 1),
            tech_score: tech,
            fundamental_score,
            composite_score: composite_score(tech, fundamental_score, config.signal_mode),
        };
        let next = advance(&states[i - 1], &inputs, config);
        states.push(next);
    }

    states
}
