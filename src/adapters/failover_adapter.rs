//! Failover data adapter.
//!
//! Chains several data providers: each request walks the chain in order and
//! the first provider that returns usable data wins. Transient provider
//! errors are retried with exponential backoff before moving on; a missing
//! code is not retried, the chain just moves to the next provider.

use crate::domain::error::AshtraderError;
use crate::domain::fundamental::FundamentalSnapshot;
use crate::domain::ohlcv::{BenchmarkBar, OhlcvBar};
use crate::ports::data_port::DataPort;
use chrono::NaiveDate;
use std::thread;
use std::time::Duration;

const DEFAULT_MAX_RETRIES: usize = 3;
const DEFAULT_BACKOFF_BASE: Duration = Duration::from_secs(1);

pub struct FailoverAdapter {
    providers: Vec<Box<dyn DataPort + Sync>>,
    max_retries: usize,
    backoff_base: Duration,
}

impl FailoverAdapter {
    pub fn new(providers: Vec<Box<dyn DataPort + Sync>>) -> Self {
        Self {
            providers,
            max_retries: DEFAULT_MAX_RETRIES,
            backoff_base: DEFAULT_BACKOFF_BASE,
        }
    }

    pub fn with_retry(mut self, max_retries: usize, backoff_base: Duration) -> Self {
        self.max_retries = max_retries.max(1);
        self.backoff_base = backoff_base;
        self
    }

    fn total_attempts(&self) -> usize {
        self.providers.len() * self.max_retries
    }

    fn backoff(&self, attempt: usize) -> Duration {
        self.backoff_base * 2u32.saturating_pow(attempt as u32)
    }

    /// Walk the provider chain for one request. `fetch` is the per-provider
    /// call; a non-empty result ends the walk.
    fn fetch_with_failover<T>(
        &self,
        code: &str,
        what: &str,
        fetch: impl Fn(&dyn DataPort) -> Result<Vec<T>, AshtraderError>,
    ) -> Result<Vec<T>, AshtraderError> {
        for (index, provider) in self.providers.iter().enumerate() {
            for attempt in 0..self.max_retries {
                match fetch(provider.as_ref()) {
                    Ok(rows) if !rows.is_empty() => return Ok(rows),
                    Ok(_) => {
                        eprintln!(
                            "Warning: provider {index} returned no {what} for {code} \
                             (attempt {}/{})",
                            attempt + 1,
                            self.max_retries
                        );
                    }
                    Err(AshtraderError::NoData { .. }) => {
                        eprintln!("Warning: provider {index} has no {what} for {code}");
                        break;
                    }
                    Err(e) => {
                        eprintln!(
                            "Warning: provider {index} failed for {code}: {e} (attempt {}/{})",
                            attempt + 1,
                            self.max_retries
                        );
                        if attempt + 1 < self.max_retries {
                            thread::sleep(self.backoff(attempt));
                        }
                    }
                }
            }
        }

        Err(AshtraderError::ProviderExhausted {
            code: code.to_string(),
            attempts: self.total_attempts(),
        })
    }
}

impl DataPort for FailoverAdapter {
    fn fetch_bars(
        &self,
        code: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<OhlcvBar>, AshtraderError> {
        self.fetch_with_failover(code, "bars", |provider| {
            provider.fetch_bars(code, start_date, end_date)
        })
    }

    fn fetch_benchmark(
        &self,
        benchmark_id: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<BenchmarkBar>, AshtraderError> {
        self.fetch_with_failover(benchmark_id, "benchmark bars", |provider| {
            provider.fetch_benchmark(benchmark_id, start_date, end_date)
        })
    }

    fn fetch_fundamentals(&self, code: &str) -> FundamentalSnapshot {
        match self.providers.first() {
            Some(provider) => provider.fetch_fundamentals(code),
            None => FundamentalSnapshot::default(),
        }
    }

    fn list_codes(&self) -> Result<Vec<String>, AshtraderError> {
        let mut last_err = AshtraderError::ProviderExhausted {
            code: "*".to_string(),
            attempts: 0,
        };
        for provider in &self.providers {
            match provider.list_codes() {
                Ok(codes) => return Ok(codes),
                Err(e) => last_err = e,
            }
        }
        Err(last_err)
    }

    fn data_range(
        &self,
        code: &str,
    ) -> Result<Option<(NaiveDate, NaiveDate, usize)>, AshtraderError> {
        let mut saw_none = false;
        let mut last_err = None;
        for provider in &self.providers {
            match provider.data_range(code) {
                Ok(Some(range)) => return Ok(Some(range)),
                Ok(None) => saw_none = true,
                Err(e) => last_err = Some(e),
            }
        }
        if saw_none {
            return Ok(None);
        }
        Err(last_err.unwrap_or(AshtraderError::ProviderExhausted {
            code: code.to_string(),
            attempts: 0,
        }))
    }
}
