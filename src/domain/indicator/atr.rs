//! Average True Range indicator.
//!
//! TR[i] = max(high-low, |high-prev_close|, |low-prev_close|); ATR is the
//! rolling mean of TR over n periods. Day 0 has no previous close, so its
//! true range is undefined and the first valid ATR lands at index n.

use crate::domain::indicator::{IndicatorPoint, IndicatorSeries, IndicatorType, IndicatorValue};
use crate::domain::ohlcv::OhlcvBar;

pub fn calculate_atr(bars: &[OhlcvBar], period: usize) -> IndicatorSeries {
    if period == 0 || bars.is_empty() {
        return IndicatorSeries {
            indicator_type: IndicatorType::Atr(period),
            values: Vec::new(),
        };
    }

    // true_ranges[j] belongs to bar j+1
    let true_ranges: Vec<f64> = bars
        .windows(2)
        .map(|pair| pair[1].true_range(pair[0].close))
        .collect();

    let mut values = Vec::with_capacity(bars.len());
    for (i, bar) in bars.iter().enumerate() {
        if i < period {
            values.push(IndicatorPoint {
                date: bar.date,
                valid: false,
                value: IndicatorValue::Simple(0.0),
            });
        } else {
            let window = &true_ranges[i - period..i];
            let atr = window.iter().sum::<f64>() / period as f64;
            values.push(IndicatorPoint {
                date: bar.date,
                valid: true,
                value: IndicatorValue::Simple(atr),
            });
        }
    }

    IndicatorSeries {
        indicator_type: IndicatorType::Atr(period),
        values,
    }
}
