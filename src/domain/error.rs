//! Domain error types.

/// Top-level error type for ashtrader.
#[derive(Debug, thiserror::Error)]
pub enum AshtraderError {
    #[error("provider failure for {code}: {detail}")]
    Provider { code: String, detail: String },

    #[error("all providers exhausted for {code} after {attempts} attempts")]
    ProviderExhausted { code: String, attempts: usize },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("no data for {code}")]
    NoData { code: String },

    #[error("insufficient data for {code}: have {bars} bars, need {minimum}")]
    InsufficientBars {
        code: String,
        bars: usize,
        minimum: usize,
    },

    #[error("invalid bar for {code} on {date}: {reason}")]
    InvalidBar {
        code: String,
        date: chrono::NaiveDate,
        reason: String,
    },

    #[error("universe is empty")]
    EmptyUniverse,

    #[error("no results: every code in the basket failed")]
    NoResults,

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<&AshtraderError> for std::process::ExitCode {
    fn from(err: &AshtraderError) -> Self {
        let code: u8 = match err {
            AshtraderError::Io(_) | AshtraderError::Csv(_) => 1,
            AshtraderError::ConfigParse { .. }
            | AshtraderError::ConfigMissing { .. }
            | AshtraderError::ConfigInvalid { .. } => 2,
            AshtraderError::Provider { .. } | AshtraderError::ProviderExhausted { .. } => 3,
            AshtraderError::NoData { .. }
            | AshtraderError::InsufficientBars { .. }
            | AshtraderError::InvalidBar { .. }
            | AshtraderError::EmptyUniverse
            | AshtraderError::NoResults => 5,
        };
        std::process::ExitCode::from(code)
    }
}
