//! Bollinger Bands indicator.
//!
//! Bollinger Bands consist of:
//! - Middle: Simple Moving Average (SMA) over n periods
//! - Upper: Middle + (multiplier × StdDev)
//! - Lower: Middle - (multiplier × StdDev)
//!
//! Where StdDev is sample standard deviation (divides by N-1, not N).
//!
//! Default parameters: period=20, multiplier=2.0
//! Warmup: first (period-1) bars are invalid.

use crate::domain::indicator::{IndicatorPoint, IndicatorSeries, IndicatorType, IndicatorValue};
use crate::domain::ohlcv::OhlcvBar;

pub fn calculate_bollinger(
    bars: &[OhlcvBar],
    period: usize,
    stddev_mult_x100: u32,
) -> IndicatorSeries {
    let indicator_type = IndicatorType::Bollinger {
        period,
        stddev_mult_x100,
    };
    // Sample stddev needs at least two observations per window.
    if period < 2 || bars.is_empty() {
        return IndicatorSeries {
            indicator_type,
            values: Vec::new(),
        };
    }

    let mut values = Vec::with_capacity(bars.len());
    let warmup = period - 1;
    let mult = stddev_mult_x100 as f64 / 100.0;

    for i in 0..bars.len() {
        let date = bars[i].date;
        let valid = i >= warmup;

        let (upper, middle, lower) = if valid {
            let start = i + 1 - period;
            let window = &bars[start..=i];

            let middle_val: f64 = window.iter().map(|b| b.close).sum::<f64>() / period as f64;

            let variance: f64 = window
                .iter()
                .map(|b| {
                    let diff = b.close - middle_val;
                    diff * diff
                })
                .sum::<f64>()
                / (period - 1) as f64;

            let stddev = variance.sqrt();
            let upper = middle_val + mult * stddev;
            let lower = middle_val - mult * stddev;

            (upper, middle_val, lower)
        } else {
            (0.0, 0.0, 0.0)
        };

        values.push(IndicatorPoint {
            date,
            valid,
            value: IndicatorValue::Bollinger {
                upper,
                middle,
                lower,
            },
        });
    }

    IndicatorSeries {
        indicator_type,
        values,
    }
}
