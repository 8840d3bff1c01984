//! OHLCV bar representation and input validation.

use crate::domain::error::AshtraderError;
use chrono::NaiveDate;

/// Minimum bar count for a run; shorter series are rejected before any
/// indicator is computed.
pub const MIN_BARS: usize = 50;

#[derive(Debug, Clone, PartialEq)]
pub struct OhlcvBar {
    pub code: String,
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: i64,
}

impl OhlcvBar {
    /// max(high - low, |high - prev_close|, |low - prev_close|)
    pub fn true_range(&self, prev_close: f64) -> f64 {
        let hl = self.high - self.low;
        let hc = (self.high - prev_close).abs();
        let lc = (self.low - prev_close).abs();
        hl.max(hc).max(lc)
    }
}

/// One close observation of a benchmark index, aligned by date.
#[derive(Debug, Clone, PartialEq)]
pub struct BenchmarkBar {
    pub date: NaiveDate,
    pub close: f64,
}

/// Admission check for a bar series: at least [`MIN_BARS`] bars, finite
/// positive prices, high/low envelope intact, dates strictly ascending.
pub fn validate_bars(code: &str, bars: &[OhlcvBar]) -> Result<(), AshtraderError> {
    if bars.len() < MIN_BARS {
        return Err(AshtraderError::InsufficientBars {
            code: code.to_string(),
            bars: bars.len(),
            minimum: MIN_BARS,
        });
    }

    let invalid = |date: NaiveDate, reason: &str| AshtraderError::InvalidBar {
        code: code.to_string(),
        date,
        reason: reason.to_string(),
    };

    let mut prev_date: Option<NaiveDate> = None;
    for bar in bars {
        let fields = [bar.open, bar.high, bar.low, bar.close];
        if fields.iter().any(|v| !v.is_finite()) {
            return Err(invalid(bar.date, "non-finite price field"));
        }
        if fields.iter().any(|v| *v <= 0.0) {
            return Err(invalid(bar.date, "non-positive price field"));
        }
        if bar.volume < 0 {
            return Err(invalid(bar.date, "negative volume"));
        }
        if bar.high < bar.open.max(bar.close).max(bar.low) {
            return Err(invalid(bar.date, "high below open/close/low"));
        }
        if bar.low > bar.open.min(bar.close).min(bar.high) {
            return Err(invalid(bar.date, "low above open/close/high"));
        }
        match prev_date {
            Some(prev) if bar.date <= prev => {
                return Err(invalid(bar.date, "dates not strictly ascending"));
            }
            _ => prev_date = Some(bar.date),
        }
    }
    Ok(())
}
