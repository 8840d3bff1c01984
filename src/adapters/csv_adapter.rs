//! CSV file data adapter.
//!
//! Bars live in `{csv_dir}/{code}.csv` with a `date,open,high,low,close,volume`
//! header. Benchmark files only need `date` and `close` columns, located by
//! name. Fundamentals, when present, sit in `{csv_dir}/fundamentals.csv`.

use crate::domain::error::AshtraderError;
use crate::domain::fundamental::FundamentalSnapshot;
use crate::domain::ohlcv::{BenchmarkBar, OhlcvBar};
use crate::ports::data_port::DataPort;
use chrono::NaiveDate;
use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;

const FUNDAMENTALS_FILE: &str = "fundamentals.csv";

pub struct CsvAdapter {
    base_path: PathBuf,
}

impl CsvAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    fn csv_path(&self, code: &str) -> PathBuf {
        self.base_path.join(format!("{code}.csv"))
    }

    fn read_file(&self, code: &str) -> Result<String, AshtraderError> {
        let path = self.csv_path(code);
        fs::read_to_string(&path).map_err(|e| {
            if e.kind() == ErrorKind::NotFound {
                AshtraderError::NoData {
                    code: code.to_string(),
                }
            } else {
                AshtraderError::Provider {
                    code: code.to_string(),
                    detail: format!("failed to read {}: {}", path.display(), e),
                }
            }
        })
    }
}

impl DataPort for CsvAdapter {
    fn fetch_bars(
        &self,
        code: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<OhlcvBar>, AshtraderError> {
        let content = self.read_file(code)?;

        let mut rdr = csv::Reader::from_reader(content.as_bytes());
        let mut bars = Vec::new();

        for (row, result) in rdr.records().enumerate() {
            let line = row + 2; // header is line 1
            let record = result.map_err(|e| AshtraderError::Provider {
                code: code.to_string(),
                detail: format!("CSV parse error on line {line}: {e}"),
            })?;

            let date_str = record.get(0).ok_or_else(|| AshtraderError::Provider {
                code: code.to_string(),
                detail: format!("missing date column on line {line}"),
            })?;
            let date = NaiveDate::parse_from_str(date_str, "%Y-%m-%d").map_err(|e| {
                AshtraderError::Provider {
                    code: code.to_string(),
                    detail: format!("invalid date on line {line}: {e}"),
                }
            })?;

            if date < start_date || date > end_date {
                continue;
            }

            let open: f64 = record
                .get(1)
                .ok_or_else(|| AshtraderError::Provider {
                    code: code.to_string(),
                    detail: format!("missing open column on line {line}"),
                })?
                .parse()
                .map_err(|e| AshtraderError::Provider {
                    code: code.to_string(),
                    detail: format!("invalid open value on line {line}: {e}"),
                })?;

            let high: f64 = record
                .get(2)
                .ok_or_else(|| AshtraderError::Provider {
                    code: code.to_string(),
                    detail: format!("missing high column on line {line}"),
                })?
                .parse()
                .map_err(|e| AshtraderError::Provider {
                    code: code.to_string(),
                    detail: format!("invalid high value on line {line}: {e}"),
                })?;

            let low: f64 = record
                .get(3)
                .ok_or_else(|| AshtraderError::Provider {
                    code: code.to_string(),
                    detail: format!("missing low column on line {line}"),
                })?
                .parse()
                .map_err(|e| AshtraderError::Provider {
                    code: code.to_string(),
                    detail: format!("invalid low value on line {line}: {e}"),
                })?;

            let close: f64 = record
                .get(4)
                .ok_or_else(|| AshtraderError::Provider {
                    code: code.to_string(),
                    detail: format!("missing close column on line {line}"),
                })?
                .parse()
                .map_err(|e| AshtraderError::Provider {
                    code: code.to_string(),
                    detail: format!("invalid close value on line {line}: {e}"),
                })?;

            let volume: i64 = record
                .get(5)
                .ok_or_else(|| AshtraderError::Provider {
                    code: code.to_string(),
                    detail: format!("missing volume column on line {line}"),
                })?
                .parse()
                .map_err(|e| AshtraderError::Provider {
                    code: code.to_string(),
                    detail: format!("invalid volume value on line {line}: {e}"),
                })?;

            bars.push(OhlcvBar {
                code: code.to_string(),
                date,
                open,
                high,
                low,
                close,
                volume,
            });
        }

        bars.sort_by_key(|b| b.date);
        Ok(bars)
    }

    fn fetch_benchmark(
        &self,
        benchmark_id: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<BenchmarkBar>, AshtraderError> {
        let content = self.read_file(benchmark_id)?;

        let mut rdr = csv::Reader::from_reader(content.as_bytes());
        let headers = rdr.headers().map_err(|e| AshtraderError::Provider {
            code: benchmark_id.to_string(),
            detail: format!("unreadable header: {e}"),
        })?;

        let find = |name: &str| headers.iter().position(|h| h.trim().eq_ignore_ascii_case(name));
        let date_idx = find("date").ok_or_else(|| AshtraderError::Provider {
            code: benchmark_id.to_string(),
            detail: "no date column in benchmark file".to_string(),
        })?;
        let close_idx = find("close").ok_or_else(|| AshtraderError::Provider {
            code: benchmark_id.to_string(),
            detail: "no close column in benchmark file".to_string(),
        })?;

        let mut bars = Vec::new();
        for (row, result) in rdr.records().enumerate() {
            let line = row + 2;
            let record = result.map_err(|e| AshtraderError::Provider {
                code: benchmark_id.to_string(),
                detail: format!("CSV parse error on line {line}: {e}"),
            })?;

            let date_str = record.get(date_idx).ok_or_else(|| AshtraderError::Provider {
                code: benchmark_id.to_string(),
                detail: format!("missing date on line {line}"),
            })?;
            let date = NaiveDate::parse_from_str(date_str, "%Y-%m-%d").map_err(|e| {
                AshtraderError::Provider {
                    code: benchmark_id.to_string(),
                    detail: format!("invalid date on line {line}: {e}"),
                }
            })?;

            if date < start_date || date > end_date {
                continue;
            }

            let close: f64 = record
                .get(close_idx)
                .ok_or_else(|| AshtraderError::Provider {
                    code: benchmark_id.to_string(),
                    detail: format!("missing close on line {line}"),
                })?
                .parse()
                .map_err(|e| AshtraderError::Provider {
                    code: benchmark_id.to_string(),
                    detail: format!("invalid close value on line {line}: {e}"),
                })?;

            bars.push(BenchmarkBar { date, close });
        }

        bars.sort_by_key(|b| b.date);
        Ok(bars)
    }

    fn fetch_fundamentals(&self, code: &str) -> FundamentalSnapshot {
        let content = match self.read_file("fundamentals") {
            Ok(content) => content,
            Err(_) => {
                eprintln!("Warning: no fundamentals file, using defaults for {code}");
                return FundamentalSnapshot::default();
            }
        };

        let mut rdr = csv::Reader::from_reader(content.as_bytes());
        for record in rdr.records().flatten() {
            if record.get(0).map(str::trim) != Some(code) {
                continue;
            }
            let field = |idx: usize| record.get(idx).and_then(|v| v.trim().parse::<f64>().ok());
            match (field(1), field(2), field(3), field(4)) {
                (Some(roe), Some(revenue_growth), Some(profit_growth), Some(cash_flow)) => {
                    return FundamentalSnapshot {
                        roe,
                        revenue_growth,
                        profit_growth,
                        cash_flow,
                    };
                }
                _ => {
                    eprintln!(
                        "Warning: malformed fundamentals row for {code}, using defaults"
                    );
                    return FundamentalSnapshot::default();
                }
            }
        }

        eprintln!("Warning: no fundamentals on file for {code}, using defaults");
        FundamentalSnapshot::default()
    }

    fn list_codes(&self) -> Result<Vec<String>, AshtraderError> {
        let entries = fs::read_dir(&self.base_path).map_err(|e| AshtraderError::Provider {
            code: "*".to_string(),
            detail: format!("failed to read directory {}: {}", self.base_path.display(), e),
        })?;

        let mut codes = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| AshtraderError::Provider {
                code: "*".to_string(),
                detail: format!("directory entry error: {e}"),
            })?;

            let name = entry.file_name();
            let name_str = name.to_string_lossy();

            if name_str == FUNDAMENTALS_FILE {
                continue;
            }
            if let Some(code) = name_str.strip_suffix(".csv") {
                codes.push(code.to_string());
            }
        }

        codes.sort();
        Ok(codes)
    }

    fn data_range(
        &self,
        code: &str,
    ) -> Result<Option<(NaiveDate, NaiveDate, usize)>, AshtraderError> {
        let bars = match self.fetch_bars(code, NaiveDate::MIN, NaiveDate::MAX) {
            Ok(bars) => bars,
            Err(AshtraderError::NoData { .. }) => return Ok(None),
            Err(e) => return Err(e),
        };
        match (bars.first(), bars.last()) {
            (Some(first), Some(last)) => Ok(Some((first.date, last.date, bars.len()))),
            _ => Ok(None),
        }
    }
}
