//! Data access port trait.

use crate::domain::error::AshtraderError;
use crate::domain::fundamental::FundamentalSnapshot;
use crate::domain::ohlcv::{BenchmarkBar, OhlcvBar};
use chrono::NaiveDate;

pub trait DataPort {
    fn fetch_bars(
        &self,
        code: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<OhlcvBar>, AshtraderError>;

    fn fetch_benchmark(
        &self,
        benchmark_id: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<BenchmarkBar>, AshtraderError>;

    /// Fundamental figures for a code. Adapters substitute neutral defaults
    /// when nothing is on file, so this cannot fail.
    fn fetch_fundamentals(&self, code: &str) -> FundamentalSnapshot;

    fn list_codes(&self) -> Result<Vec<String>, AshtraderError>;

    fn data_range(
        &self,
        code: &str,
    ) -> Result<Option<(NaiveDate, NaiveDate, usize)>, AshtraderError>;
}
