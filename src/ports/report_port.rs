//! Report generation port trait.

use crate::domain::backtest::RunResult;
use crate::domain::error::AshtraderError;

/// Port for writing the per-day table and summary of a finished run.
pub trait ReportPort {
    fn write(&self, result: &RunResult, output_path: &str) -> Result<(), AshtraderError>;
}
