//! Core domain types and logic.

pub mod accounting;
pub mod backtest;
pub mod code_data;
pub mod config_validation;
pub mod error;
pub mod fundamental;
pub mod indicator;
pub mod metrics;
pub mod monte_carlo;
pub mod ohlcv;
pub mod signal;
pub mod sizing;
pub mod strategy;
pub mod universe;
