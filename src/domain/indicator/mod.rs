//! Technical indicator implementations.
//!
//! This module provides types for representing indicator values and series:
//! - `IndicatorPoint`: A single point in an indicator time series
//! - `IndicatorValue`: Enum for different indicator output shapes
//! - `IndicatorType`: Enum for indicator identity + parameters (serves as HashMap key)
//! - `IndicatorSeries`: A time series of indicator values
//!
//! Every series is aligned 1:1 with the bar series that produced it. Points
//! inside the warmup window carry `valid: false`; consumers must treat them as
//! insufficient history, never as zero.

pub mod atr;
pub mod bollinger;
pub mod sma;

use chrono::NaiveDate;
use std::fmt;

#[derive(Debug, Clone)]
pub struct IndicatorPoint {
    pub date: NaiveDate,
    pub valid: bool,
    pub value: IndicatorValue,
}

#[derive(Debug, Clone)]
pub enum IndicatorValue {
    Simple(f64),
    Bollinger { upper: f64, middle: f64, lower: f64 },
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum IndicatorType {
    Sma(usize),
    Atr(usize),
    Bollinger {
        period: usize,
        stddev_mult_x100: u32,
    },
}

#[derive(Debug, Clone)]
pub struct IndicatorSeries {
    pub indicator_type: IndicatorType,
    pub values: Vec<IndicatorPoint>,
}

impl IndicatorSeries {
    /// Scalar value at index `i`, or `None` inside the warmup window, out of
    /// range, or for non-scalar series.
    pub fn simple_at(&self, i: usize) -> Option<f64> {
        match self.values.get(i) {
            Some(IndicatorPoint {
                valid: true,
                value: IndicatorValue::Simple(v),
                ..
            }) => Some(*v),
            _ => None,
        }
    }

    /// Band values `(upper, middle, lower)` at index `i`, or `None` inside the
    /// warmup window, out of range, or for scalar series.
    pub fn bollinger_at(&self, i: usize) -> Option<(f64, f64, f64)> {
        match self.values.get(i) {
            Some(IndicatorPoint {
                valid: true,
                value: IndicatorValue::Bollinger { upper, middle, lower },
                ..
            }) => Some((*upper, *middle, *lower)),
            _ => None,
        }
    }
}

impl fmt::Display for IndicatorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndicatorType::Sma(period) => write!(f, "SMA({})", period),
            IndicatorType::Atr(period) => write!(f, "ATR({})", period),
            IndicatorType::Bollinger {
                period,
                stddev_mult_x100,
            } => {
                let mult = *stddev_mult_x100 as f64 / 100.0;
                write!(f, "BOLLINGER({},{})", period, mult)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn indicator_type_display_sma() {
        assert_eq!(IndicatorType::Sma(20).to_string(), "SMA(20)");
    }

    #[test]
    fn indicator_type_display_atr() {
        assert_eq!(IndicatorType::Atr(14).to_string(), "ATR(14)");
    }

    #[test]
    fn indicator_type_display_bollinger() {
        let boll = IndicatorType::Bollinger {
            period: 20,
            stddev_mult_x100: 200,
        };
        assert_eq!(boll.to_string(), "BOLLINGER(20,2)");
    }

    #[test]
    fn indicator_type_hash_eq() {
        use std::collections::HashMap;

        let mut map = HashMap::new();
        let sma5 = IndicatorType::Sma(5);
        let sma20 = IndicatorType::Sma(20);
        let boll = IndicatorType::Bollinger {
            period: 20,
            stddev_mult_x100: 200,
        };

        map.insert(sma5.clone(), "sma5_series".to_string());
        map.insert(sma20.clone(), "sma20_series".to_string());
        map.insert(boll.clone(), "boll_series".to_string());

        assert_eq!(map.get(&sma5), Some(&"sma5_series".to_string()));
        assert_eq!(map.get(&sma20), Some(&"sma20_series".to_string()));
        assert_eq!(map.get(&boll), Some(&"boll_series".to_string()));
        assert_eq!(
            map.get(&IndicatorType::Sma(5)),
            Some(&"sma5_series".to_string())
        );
    }

    #[test]
    fn simple_at_rejects_invalid_points() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let series = IndicatorSeries {
            indicator_type: IndicatorType::Sma(2),
            values: vec![
                IndicatorPoint {
                    date,
                    valid: false,
                    value: IndicatorValue::Simple(0.0),
                },
                IndicatorPoint {
                    date,
                    valid: true,
                    value: IndicatorValue::Simple(1.5),
                },
            ],
        };
        assert_eq!(series.simple_at(0), None);
        assert_eq!(series.simple_at(1), Some(1.5));
        assert_eq!(series.simple_at(2), None);
    }
}
