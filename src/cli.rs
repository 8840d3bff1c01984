//! CLI definition and dispatch.

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::csv_report_adapter::CsvReportAdapter;
use crate::adapters::failover_adapter::FailoverAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::domain::backtest::{self as backtest_engine, RunResult};
use crate::domain::config_validation::validate_config;
use crate::domain::error::AshtraderError;
use crate::domain::fundamental::FundamentalThresholds;
use crate::domain::monte_carlo::MonteCarloConfig;
use crate::domain::sizing::{SizingMethod, SizingParams};
use crate::domain::strategy::{SignalMode, StrategyConfig};
use crate::domain::universe::{parse_codes, run_basket};
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::DataPort;
use crate::ports::report_port::ReportPort;

#[derive(Parser, Debug)]
#[command(name = "ashtrader", about = "A-share trading strategy backtester")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run a single-code backtest
    Backtest {
        #[arg(short, long)]
        config: PathBuf,
        /// Override the configured code
        #[arg(long)]
        code: Option<String>,
        /// Override the configured signal mode
        #[arg(long)]
        signal_mode: Option<String>,
        /// Write a CSV report to this path
        #[arg(short, long)]
        output: Option<String>,
        /// Validate and print the resolved run without fetching data
        #[arg(long)]
        dry_run: bool,
    },
    /// Rank a basket of codes by backtested return
    Portfolio {
        #[arg(short, long)]
        config: PathBuf,
        /// Override the configured code list (comma separated)
        #[arg(long)]
        codes: Option<String>,
    },
    /// List codes visible to the data adapter
    ListCodes {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Show the available data range for a code
    Info {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        code: Option<String>,
    },
    /// Validate a configuration file
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Backtest {
            config,
            code,
            signal_mode,
            output,
            dry_run,
        } => {
            if dry_run {
                run_dry_run(&config, code.as_deref(), signal_mode.as_deref())
            } else {
                run_backtest(
                    &config,
                    code.as_deref(),
                    signal_mode.as_deref(),
                    output.as_deref(),
                )
            }
        }
        Command::Portfolio { config, codes } => run_portfolio(&config, codes.as_deref()),
        Command::ListCodes { config } => run_list_codes(&config),
        Command::Info { config, code } => run_info(&config, code.as_deref()),
        Command::Validate { config } => run_validate(&config),
    }
}

pub fn load_config(path: &PathBuf) -> Result<FileConfigAdapter, ExitCode> {
    FileConfigAdapter::from_file(path).map_err(|e| {
        let err = AshtraderError::ConfigParse {
            file: path.display().to_string(),
            reason: e.to_string(),
        };
        eprintln!("error: {err}");
        ExitCode::from(&err)
    })
}

fn run_backtest(
    config_path: &PathBuf,
    code_override: Option<&str>,
    signal_mode_override: Option<&str>,
    output_override: Option<&str>,
) -> ExitCode {
    // Stage 1: Load config
    eprintln!("Loading config from {}", config_path.display());
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };

    // Stage 2: Validate config
    if let Err(e) = validate_config(&adapter) {
        eprintln!("error: {e}");
        return (&e).into();
    }

    // Stage 3: Build strategy config and resolve the run
    let mut config = match build_strategy_config(&adapter) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };
    if let Err(e) = apply_signal_mode(&mut config, signal_mode_override) {
        eprintln!("error: {e}");
        return (&e).into();
    }

    let (start_date, end_date) = match run_window(&adapter) {
        Ok(w) => w,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    let code = match resolve_code(code_override, &adapter) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    let benchmark_id = adapter.get_string("backtest", "benchmark");
    let monte_carlo = build_monte_carlo_config(&adapter);

    // Stage 4: Build data adapter
    let data_port = match build_data_port(&adapter) {
        Ok(p) => p,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    // Stage 5: Run the pipeline
    eprintln!(
        "Running backtest: {} ({}), {} to {}",
        code,
        config.signal_mode.as_str(),
        start_date,
        end_date,
    );

    let result = match backtest_engine::run_backtest(
        data_port.as_ref(),
        &code,
        benchmark_id.as_deref(),
        start_date,
        end_date,
        &config,
        monte_carlo.as_ref(),
    ) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    // Stage 6: Print console summary to stderr
    print_summary(&result);

    // Stage 7: Write report when a path is configured
    let output = output_override
        .map(str::to_string)
        .or_else(|| adapter.get_string("report", "output"));

    if let Some(path) = output {
        let report = CsvReportAdapter::new();
        if let Err(e) = report.write(&result, &path) {
            eprintln!("error: failed to write report: {e}");
            return (&e).into();
        }
        eprintln!("\nReport written to: {path}");
    }

    ExitCode::SUCCESS
}

fn print_summary(result: &RunResult) {
    let summary = &result.summary;
    eprintln!("\n=== Performance: {} ===", result.code);
    eprintln!("Total Return:     {:.2}%", summary.total_return * 100.0);
    eprintln!("Annualized:       {:.2}%", summary.annualized_return * 100.0);
    eprintln!(
        "Volatility:       {:.2}%",
        summary.annualized_volatility * 100.0
    );
    eprintln!("Sharpe Ratio:     {:.2}", summary.sharpe_ratio);
    eprintln!("Max Drawdown:     {:.2}%", summary.max_drawdown * 100.0);
    eprintln!("Calmar Ratio:     {:.2}", summary.calmar_ratio);
    eprintln!("Win Rate:         {:.1}%", summary.win_rate * 100.0);
    eprintln!("P/L Ratio:        {:.2}", summary.profit_loss_ratio);
    eprintln!("Total Trades:     {}", summary.total_trades);

    if let Some(benchmark_equity) = result.ledger.benchmark_equity.last() {
        eprintln!(
            "Benchmark Return: {:.2}%",
            (benchmark_equity - 1.0) * 100.0
        );
    }

    if result.risk_triggers.total() > 0 {
        let triggers = &result.risk_triggers;
        eprintln!("\n=== Risk Exits ===");
        eprintln!("  stop_loss:      {}", triggers.stop_loss);
        eprintln!("  take_profit:    {}", triggers.take_profit);
        eprintln!("  drawdown_limit: {}", triggers.drawdown_limit);
        eprintln!("  trailing_stop:  {}", triggers.trailing_stop);
    }

    if let Some(fundamental) = &result.fundamental {
        eprintln!("\n=== Fundamental Screen ===");
        eprintln!("  ROE score:       {:.1}", fundamental.roe_score);
        eprintln!("  Growth score:    {:.1}", fundamental.growth_score);
        eprintln!("  Cash flow score: {:.1}", fundamental.cash_flow_score);
        eprintln!(
            "  Overall:         {:.2} (excluded: {})",
            fundamental.overall_score, fundamental.excluded
        );
    }

    if let Some(mc) = &result.monte_carlo {
        eprintln!("\n=== Monte Carlo ({} runs) ===", mc.simulations);
        eprintln!("Mean Return:      {:.2}%", mc.mean * 100.0);
        eprintln!("Std Dev:          {:.2}%", mc.std_dev * 100.0);
        eprintln!(
            "95% Interval:     [{:.2}%, {:.2}%]",
            mc.percentile_low * 100.0,
            mc.percentile_high * 100.0
        );
        eprintln!("Prob. Positive:   {:.1}%", mc.prob_positive * 100.0);
    }
}

fn run_portfolio(config_path: &PathBuf, codes_override: Option<&str>) -> ExitCode {
    // Stage 1: Load config
    eprintln!("Loading config from {}", config_path.display());
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };

    // Stage 2: Validate config
    if let Err(e) = validate_config(&adapter) {
        eprintln!("error: {e}");
        return (&e).into();
    }

    // Stage 3: Build strategy config and resolve the universe
    let config = match build_strategy_config(&adapter) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    let (start_date, end_date) = match run_window(&adapter) {
        Ok(w) => w,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    let codes = match resolve_universe(codes_override, &adapter) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    // Stage 4: Build data adapter
    let data_port = match build_data_port(&adapter) {
        Ok(p) => p,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    // Stage 5: Run the basket
    eprintln!(
        "Ranking {} codes, {} to {}",
        codes.len(),
        start_date,
        end_date,
    );

    let basket = match run_basket(data_port.as_ref(), &codes, start_date, end_date, &config) {
        Ok(b) => b,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    // Stage 6: Print rankings to stdout, stats to stderr
    for (rank, entry) in basket.rankings.iter().enumerate() {
        println!(
            "{}. {}: {:.2}% total, {:.2}% annualized ({} bars)",
            rank + 1,
            entry.code,
            entry.total_return * 100.0,
            entry.annualized_return * 100.0,
            entry.bars,
        );
    }

    eprintln!("\n=== Basket Statistics ===");
    eprintln!("Codes Ranked:     {}", basket.rankings.len());
    eprintln!("Codes Skipped:    {}", basket.skipped.len());
    eprintln!("Mean Annualized:  {:.2}%", basket.mean_annualized * 100.0);
    eprintln!("Std Annualized:   {:.2}%", basket.std_annualized * 100.0);
    eprintln!("Naive Sharpe:     {:.2}", basket.naive_sharpe);

    ExitCode::SUCCESS
}

fn run_list_codes(config_path: &PathBuf) -> ExitCode {
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };

    let data_port = match build_data_port(&adapter) {
        Ok(p) => p,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    let codes = match data_port.list_codes() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    if codes.is_empty() {
        eprintln!("No codes found");
    } else {
        for code in &codes {
            println!("{code}");
        }
        eprintln!("{} codes found", codes.len());
    }
    ExitCode::SUCCESS
}

fn run_info(config_path: &PathBuf, code_override: Option<&str>) -> ExitCode {
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };

    let code = match resolve_code(code_override, &adapter) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    let data_port = match build_data_port(&adapter) {
        Ok(p) => p,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    match data_port.data_range(&code) {
        Ok(Some((min_date, max_date, count))) => {
            println!("{code}: {count} bars, {min_date} to {max_date}");
            ExitCode::SUCCESS
        }
        Ok(None) => {
            eprintln!("{code}: no data found");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error querying {code}: {e}");
            (&e).into()
        }
    }
}

fn run_validate(config_path: &PathBuf) -> ExitCode {
    eprintln!("Validating config: {}", config_path.display());
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };

    if let Err(e) = validate_config(&adapter) {
        eprintln!("error: {e}");
        return (&e).into();
    }

    eprintln!("Configuration is valid");
    ExitCode::SUCCESS
}

fn run_dry_run(
    config_path: &PathBuf,
    code_override: Option<&str>,
    signal_mode_override: Option<&str>,
) -> ExitCode {
    eprintln!("Loading config from {}", config_path.display());
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };

    if let Err(e) = validate_config(&adapter) {
        eprintln!("error: {e}");
        return (&e).into();
    }

    let mut config = match build_strategy_config(&adapter) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };
    if let Err(e) = apply_signal_mode(&mut config, signal_mode_override) {
        eprintln!("error: {e}");
        return (&e).into();
    }

    let (start_date, end_date) = match run_window(&adapter) {
        Ok(w) => w,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    let code = match resolve_code(code_override, &adapter) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    eprintln!("\nResolved run:");
    eprintln!("  code:         {code}");
    eprintln!("  window:       {start_date} to {end_date}");
    eprintln!("  signal mode:  {}", config.signal_mode.as_str());
    eprintln!("  fast/slow:    {}/{}", config.fast_period, config.slow_period);
    eprintln!(
        "  risk:         stop {:.1}%, take {:.1}%, drawdown {:.1}%",
        config.stop_loss_pct * 100.0,
        config.take_profit_pct * 100.0,
        config.max_drawdown_limit * 100.0,
    );
    eprintln!(
        "  trailing:     {}",
        if config.use_trailing_stop {
            format!("{:.1}%", config.trailing_stop_pct * 100.0)
        } else {
            "off".to_string()
        }
    );
    eprintln!("  sizing:       {}", config.sizing_method.as_str());
    eprintln!(
        "  fundamental:  {}",
        if config.use_fundamental { "on" } else { "off" }
    );
    match build_monte_carlo_config(&adapter) {
        Some(mc) => eprintln!("  monte carlo:  {} simulations", mc.simulations),
        None => eprintln!("  monte carlo:  off"),
    }

    eprintln!("\nDry run complete: configuration is valid");
    ExitCode::SUCCESS
}

pub fn build_strategy_config(
    adapter: &dyn ConfigPort,
) -> Result<StrategyConfig, AshtraderError> {
    let defaults = StrategyConfig::default();

    let signal_mode = match adapter.get_string("strategy", "signal_mode") {
        Some(s) => SignalMode::parse(&s).ok_or_else(|| AshtraderError::ConfigInvalid {
            section: "strategy".into(),
            key: "signal_mode".into(),
            reason: "expected crossover, trend_following or multi_factor".into(),
        })?,
        None => defaults.signal_mode,
    };

    let sizing_method = match adapter.get_string("sizing", "method") {
        Some(s) => SizingMethod::parse(&s).ok_or_else(|| AshtraderError::ConfigInvalid {
            section: "sizing".into(),
            key: "method".into(),
            reason: "expected kelly, risk_parity or fixed".into(),
        })?,
        None => defaults.sizing_method,
    };

    let bollinger_stddev = adapter.get_double(
        "strategy",
        "bollinger_stddev",
        defaults.bollinger_mult_x100 as f64 / 100.0,
    );

    Ok(StrategyConfig {
        signal_mode,
        fast_period: adapter.get_int("strategy", "fast_period", defaults.fast_period as i64)
            as usize,
        slow_period: adapter.get_int("strategy", "slow_period", defaults.slow_period as i64)
            as usize,
        atr_period: adapter.get_int("strategy", "atr_period", defaults.atr_period as i64)
            as usize,
        bollinger_period: adapter.get_int(
            "strategy",
            "bollinger_period",
            defaults.bollinger_period as i64,
        ) as usize,
        bollinger_mult_x100: (bollinger_stddev * 100.0).round() as u32,
        stop_loss_pct: adapter.get_double("risk", "stop_loss", defaults.stop_loss_pct),
        take_profit_pct: adapter.get_double("risk", "take_profit", defaults.take_profit_pct),
        max_drawdown_limit: adapter.get_double(
            "risk",
            "max_drawdown_limit",
            defaults.max_drawdown_limit,
        ),
        trailing_stop_pct: adapter.get_double("risk", "trailing_stop", defaults.trailing_stop_pct),
        use_trailing_stop: adapter.get_bool("risk", "use_trailing_stop", false),
        max_position: adapter.get_double("risk", "max_position", defaults.max_position),
        commission_rate: adapter.get_double("risk", "commission", defaults.commission_rate),
        slippage_rate: adapter.get_double("risk", "slippage", defaults.slippage_rate),
        stamp_tax_rate: adapter.get_double("risk", "stamp_tax", defaults.stamp_tax_rate),
        sizing_method,
        sizing: SizingParams {
            win_rate: adapter.get_double("sizing", "win_rate", defaults.sizing.win_rate),
            avg_win: adapter.get_double("sizing", "avg_win", defaults.sizing.avg_win),
            avg_loss: adapter.get_double("sizing", "avg_loss", defaults.sizing.avg_loss),
            risk_per_trade: adapter.get_double(
                "sizing",
                "risk_per_trade",
                defaults.sizing.risk_per_trade,
            ),
        },
        initial_capital: adapter.get_double(
            "backtest",
            "initial_capital",
            defaults.initial_capital,
        ),
        use_fundamental: adapter.get_bool("fundamental", "enabled", false),
        thresholds: FundamentalThresholds {
            min_roe: adapter.get_double(
                "fundamental",
                "min_roe",
                FundamentalThresholds::default().min_roe,
            ),
            min_revenue_growth: adapter.get_double(
                "fundamental",
                "min_revenue_growth",
                FundamentalThresholds::default().min_revenue_growth,
            ),
            min_profit_growth: adapter.get_double(
                "fundamental",
                "min_profit_growth",
                FundamentalThresholds::default().min_profit_growth,
            ),
            min_cash_flow: adapter.get_double(
                "fundamental",
                "min_cash_flow",
                FundamentalThresholds::default().min_cash_flow,
            ),
        },
    })
}

fn apply_signal_mode(
    config: &mut StrategyConfig,
    signal_mode_override: Option<&str>,
) -> Result<(), AshtraderError> {
    if let Some(s) = signal_mode_override {
        config.signal_mode =
            SignalMode::parse(s).ok_or_else(|| AshtraderError::ConfigInvalid {
                section: "strategy".into(),
                key: "signal_mode".into(),
                reason: "expected crossover, trend_following or multi_factor".into(),
            })?;
    }
    Ok(())
}

pub fn build_monte_carlo_config(adapter: &dyn ConfigPort) -> Option<MonteCarloConfig> {
    if !adapter.get_bool("monte_carlo", "enabled", false) {
        return None;
    }
    Some(MonteCarloConfig {
        simulations: adapter.get_int("monte_carlo", "simulations", 500).max(1) as usize,
        seed: adapter.get_int("monte_carlo", "seed", 0) as u64,
    })
}

pub fn run_window(adapter: &dyn ConfigPort) -> Result<(NaiveDate, NaiveDate), AshtraderError> {
    let start_str = adapter
        .get_string("backtest", "start_date")
        .ok_or_else(|| AshtraderError::ConfigMissing {
            section: "backtest".into(),
            key: "start_date".into(),
        })?;
    let end_str = adapter.get_string("backtest", "end_date").ok_or_else(|| {
        AshtraderError::ConfigMissing {
            section: "backtest".into(),
            key: "end_date".into(),
        }
    })?;

    let start_date = NaiveDate::parse_from_str(&start_str, "%Y-%m-%d").map_err(|_| {
        AshtraderError::ConfigInvalid {
            section: "backtest".into(),
            key: "start_date".into(),
            reason: "invalid date format (expected YYYY-MM-DD)".into(),
        }
    })?;
    let end_date = NaiveDate::parse_from_str(&end_str, "%Y-%m-%d").map_err(|_| {
        AshtraderError::ConfigInvalid {
            section: "backtest".into(),
            key: "end_date".into(),
            reason: "invalid date format (expected YYYY-MM-DD)".into(),
        }
    })?;

    Ok((start_date, end_date))
}

pub fn resolve_code(
    code_override: Option<&str>,
    config: &dyn ConfigPort,
) -> Result<String, AshtraderError> {
    if let Some(c) = code_override {
        let code = c.trim().to_lowercase();
        if code.is_empty() {
            return Err(AshtraderError::ConfigInvalid {
                section: "backtest".into(),
                key: "code".into(),
                reason: "code must not be empty".into(),
            });
        }
        return Ok(code);
    }

    if let Some(code) = config.get_string("backtest", "code") {
        let code = code.trim().to_lowercase();
        if !code.is_empty() {
            return Ok(code);
        }
    }

    if let Some(codes_str) = config.get_string("backtest", "codes") {
        let codes = parse_codes(&codes_str)?;
        if codes.len() == 1 {
            return Ok(codes.into_iter().next().unwrap_or_default());
        }
        return Err(AshtraderError::ConfigInvalid {
            section: "backtest".into(),
            key: "codes".into(),
            reason: "multiple codes configured; select one with --code".into(),
        });
    }

    Err(AshtraderError::ConfigMissing {
        section: "backtest".into(),
        key: "code".into(),
    })
}

pub fn resolve_universe(
    codes_override: Option<&str>,
    config: &dyn ConfigPort,
) -> Result<Vec<String>, AshtraderError> {
    if let Some(s) = codes_override {
        return parse_codes(s);
    }
    if let Some(codes_str) = config.get_string("backtest", "codes") {
        return parse_codes(&codes_str);
    }
    if let Some(code) = config.get_string("backtest", "code") {
        return parse_codes(&code);
    }
    Err(AshtraderError::ConfigMissing {
        section: "backtest".into(),
        key: "codes".into(),
    })
}

/// Data adapter from the `[data]` section: a bare CSV adapter when only
/// `csv_dir` is set, a failover chain when `fallback_dirs` adds more roots.
pub fn build_data_port(
    config: &dyn ConfigPort,
) -> Result<Box<dyn DataPort + Sync>, AshtraderError> {
    let csv_dir = config
        .get_string("data", "csv_dir")
        .ok_or_else(|| AshtraderError::ConfigMissing {
            section: "data".into(),
            key: "csv_dir".into(),
        })?;

    let fallback_dirs: Vec<String> = config
        .get_string("data", "fallback_dirs")
        .map(|s| {
            s.split(',')
                .map(str::trim)
                .filter(|d| !d.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();

    if fallback_dirs.is_empty() {
        return Ok(Box::new(CsvAdapter::new(PathBuf::from(csv_dir))));
    }

    let mut providers: Vec<Box<dyn DataPort + Sync>> =
        vec![Box::new(CsvAdapter::new(PathBuf::from(csv_dir)))];
    for dir in fallback_dirs {
        providers.push(Box::new(CsvAdapter::new(PathBuf::from(dir))));
    }

    let max_retries = config.get_int("data", "max_retries", 3).max(1) as usize;
    Ok(Box::new(
        FailoverAdapter::new(providers).with_retry(max_retries, Duration::from_secs(1)),
    ))
}
