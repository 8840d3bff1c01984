//! INI file configuration adapter.

use crate::ports::config_port::ConfigPort;
use configparser::ini::Ini;
use std::path::Path;

pub struct FileConfigAdapter {
    config: Ini,
}

impl FileConfigAdapter {
    pub fn from_file<P: AsRef<Path>>(path: P) -> std::io::Result<Self> {
        let mut config = Ini::new();
        config.load(path).map_err(std::io::Error::other)?;
        Ok(Self { config })
    }

    pub fn from_string(content: &str) -> Result<Self, String> {
        let mut config = Ini::new();
        config.read(content.to_string())?;
        Ok(Self { config })
    }

    fn parse_bool(value: &str) -> Option<bool> {
        match value.to_lowercase().as_str() {
            "true" | "yes" | "1" => Some(true),
            "false" | "no" | "0" => Some(false),
            _ => None,
        }
    }
}

impl ConfigPort for FileConfigAdapter {
    fn get_string(&self, section: &str, key: &str) -> Option<String> {
        self.config.get(section, key)
    }

    fn get_int(&self, section: &str, key: &str, default: i64) -> i64 {
        self.config
            .getint(section, key)
            .ok()
            .flatten()
            .unwrap_or(default)
    }

    fn get_double(&self, section: &str, key: &str, default: f64) -> f64 {
        self.config
            .getfloat(section, key)
            .ok()
            .flatten()
            .unwrap_or(default)
    }

    fn get_bool(&self, section: &str, key: &str, default: bool) -> bool {
        self.config
            .get(section, key)
            .as_ref()
            .and_then(|v| Self::parse_bool(v))
            .unwrap_or(default)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_temp_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{}", content).unwrap();
        file
    }

    #[test]
    fn from_string_parses_config() {
        let content = r#"
[data]
csv_dir = /srv/ashare/daily

[backtest]
code = sh600000
initial_capital = 1000000.0

[strategy]
signal_mode = crossover
fast_period = 5
"#;
        let adapter = FileConfigAdapter::from_string(content).unwrap();
        assert_eq!(
            adapter.get_string("data", "csv_dir"),
            Some("/srv/ashare/daily".to_string())
        );
        assert_eq!(
            adapter.get_string("strategy", "signal_mode"),
            Some("crossover".to_string())
        );
    }

    #[test]
    fn get_string_returns_none_for_missing_key() {
        let adapter = FileConfigAdapter::from_string("[backtest]\ncode = sh600000\n").unwrap();
        assert_eq!(adapter.get_string("backtest", "missing"), None);
        assert_eq!(adapter.get_string("missing_section", "key"), None);
    }

    #[test]
    fn get_int_returns_value() {
        let adapter =
            FileConfigAdapter::from_string("[strategy]\nslow_period = 20\n").unwrap();
        assert_eq!(adapter.get_int("strategy", "slow_period", 0), 20);
    }

    #[test]
    fn get_int_returns_default_for_missing() {
        let adapter = FileConfigAdapter::from_string("[strategy]\n").unwrap();
        assert_eq!(adapter.get_int("strategy", "missing", 42), 42);
    }

    #[test]
    fn get_int_returns_default_for_non_numeric() {
        let adapter =
            FileConfigAdapter::from_string("[strategy]\nslow_period = abc\n").unwrap();
        assert_eq!(adapter.get_int("strategy", "slow_period", 42), 42);
    }

    #[test]
    fn get_double_returns_value() {
        let adapter = FileConfigAdapter::from_string("[risk]\nstop_loss = 0.10\n").unwrap();
        assert_eq!(adapter.get_double("risk", "stop_loss", 0.0), 0.10);
    }

    #[test]
    fn get_double_returns_default_for_missing() {
        let adapter = FileConfigAdapter::from_string("[risk]\n").unwrap();
        assert_eq!(adapter.get_double("risk", "missing", 99.9), 99.9);
    }

    #[test]
    fn get_double_returns_default_for_non_numeric() {
        let adapter =
            FileConfigAdapter::from_string("[risk]\nstop_loss = not_a_number\n").unwrap();
        assert_eq!(adapter.get_double("risk", "stop_loss", 99.9), 99.9);
    }

    #[test]
    fn get_bool_returns_true_values() {
        let adapter =
            FileConfigAdapter::from_string("[risk]\na = true\nb = yes\nc = 1\n").unwrap();
        assert!(adapter.get_bool("risk", "a", false));
        assert!(adapter.get_bool("risk", "b", false));
        assert!(adapter.get_bool("risk", "c", false));
    }

    #[test]
    fn get_bool_returns_false_values() {
        let adapter =
            FileConfigAdapter::from_string("[risk]\na = false\nb = no\nc = 0\n").unwrap();
        assert!(!adapter.get_bool("risk", "a", true));
        assert!(!adapter.get_bool("risk", "b", true));
        assert!(!adapter.get_bool("risk", "c", true));
    }

    #[test]
    fn get_bool_returns_default_for_missing() {
        let adapter = FileConfigAdapter::from_string("[risk]\n").unwrap();
        assert!(adapter.get_bool("risk", "missing", true));
        assert!(!adapter.get_bool("risk", "missing", false));
    }

    #[test]
    fn from_file_reads_config() {
        let content = "[report]\noutput = /tmp/report.csv\n";
        let file = create_temp_config(content);
        let adapter = FileConfigAdapter::from_file(file.path()).unwrap();
        assert_eq!(
            adapter.get_string("report", "output"),
            Some("/tmp/report.csv".to_string())
        );
    }

    #[test]
    fn from_file_returns_error_for_missing_file() {
        let result = FileConfigAdapter::from_file("/nonexistent/path/config.ini");
        assert!(result.is_err());
    }

    #[test]
    fn handles_all_config_sections() {
        let content = r#"
[data]
csv_dir = /srv/ashare/daily
benchmark = sh000300

[backtest]
codes = sh600000,sz000001
start_date = 2023-01-01
end_date = 2024-01-01

[risk]
use_trailing_stop = true
max_position = 0.5

[sizing]
method = kelly

[monte_carlo]
enabled = true
simulations = 500
"#;
        let adapter = FileConfigAdapter::from_string(content).unwrap();

        assert_eq!(
            adapter.get_string("data", "benchmark"),
            Some("sh000300".to_string())
        );
        assert_eq!(
            adapter.get_string("backtest", "codes"),
            Some("sh600000,sz000001".to_string())
        );
        assert!(adapter.get_bool("risk", "use_trailing_stop", false));
        assert_eq!(adapter.get_double("risk", "max_position", 0.0), 0.5);
        assert_eq!(adapter.get_string("sizing", "method"), Some("kelly".to_string()));
        assert_eq!(adapter.get_int("monte_carlo", "simulations", 0), 500);
    }
}
