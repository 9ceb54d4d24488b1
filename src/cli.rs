//! CLI definition and dispatch.

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{error, info, warn};

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::domain::config::PipelineConfig;
use crate::domain::error::EchoAlphaError;
use crate::domain::pipeline::SignalPipeline;
use crate::domain::signal::{Action, EmittedSignal};
use crate::ports::feature_port::FeatureSource;
use crate::ports::signal_port::SignalSink;

const KNOWN_SECTIONS: [&str; 4] = ["confidence", "regime", "thresholds", "weights"];

#[derive(Parser, Debug)]
#[command(name = "echoalpha", about = "Multi-source trading signal generator")]
pub struct Cli {
    /// Log every emitted signal
    #[arg(short, long, global = true)]
    pub verbose: bool,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Generate signals from feature files for one trading date
    Generate {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        data_dir: PathBuf,
        /// Comma-separated, e.g. AAPL,MSFT
        #[arg(long)]
        symbols: String,
        /// Trading date, YYYY-MM-DD
        #[arg(long)]
        date: NaiveDate,
        /// Defaults to the data directory
        #[arg(long)]
        output_dir: Option<PathBuf>,
    },
    /// Validate a configuration file and print the resolved values
    CheckConfig {
        #[arg(short, long)]
        config: PathBuf,
    },
}

/// Counts from one `generate` run.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct GenerateSummary {
    pub emitted: usize,
    pub dropped: usize,
    pub clamped: usize,
    pub skipped_symbols: Vec<String>,
    pub written: Vec<String>,
    pub actions: BTreeMap<String, usize>,
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Generate {
            config,
            data_dir,
            symbols,
            date,
            output_dir,
        } => run_generate(&config, &data_dir, &symbols, date, output_dir.as_deref()),
        Command::CheckConfig { config } => run_check_config(&config),
    }
}

/// Load and validate an INI file into a resolved pipeline configuration.
pub fn load_pipeline_config(path: &Path) -> Result<PipelineConfig, EchoAlphaError> {
    let adapter =
        FileConfigAdapter::from_file(path).map_err(|e| EchoAlphaError::ConfigParse {
            file: path.display().to_string(),
            reason: e.to_string(),
        })?;
    for section in adapter.sections() {
        if !KNOWN_SECTIONS.contains(&section.as_str()) {
            warn!(section = %section, "ignoring unrecognised config section");
        }
    }
    PipelineConfig::from_port(&adapter)
}

/// Split a comma-separated symbol list; symbols are uppercased and must be
/// unique.
pub fn parse_symbols(input: &str) -> Result<Vec<String>, String> {
    let mut symbols = Vec::new();
    let mut seen = HashSet::new();

    for token in input.split(',') {
        let trimmed = token.trim();
        if trimmed.is_empty() {
            return Err("empty symbol in list".into());
        }
        let symbol = trimmed.to_uppercase();
        if !seen.insert(symbol.clone()) {
            return Err(format!("duplicate symbol {symbol}"));
        }
        symbols.push(symbol);
    }

    Ok(symbols)
}

fn run_generate(
    config_path: &Path,
    data_dir: &Path,
    symbols: &str,
    date: NaiveDate,
    output_dir: Option<&Path>,
) -> ExitCode {
    info!(path = %config_path.display(), "loading config");
    let config = match load_pipeline_config(config_path) {
        Ok(c) => c,
        Err(e) => {
            error!("{e}");
            return (&e).into();
        }
    };

    let symbols = match parse_symbols(symbols) {
        Ok(s) => s,
        Err(e) => {
            error!("{e}");
            return ExitCode::from(2);
        }
    };

    let adapter = CsvAdapter::new(
        data_dir.to_path_buf(),
        output_dir.unwrap_or(data_dir).to_path_buf(),
    );
    let pipeline = SignalPipeline::new(config);

    match generate(&pipeline, &adapter, &adapter, &symbols, date) {
        Ok(summary) => {
            print_summary(&summary);
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("{e}");
            (&e).into()
        }
    }
}

/// Load, process and write every symbol for one date.
///
/// A symbol whose features cannot be loaded is skipped; the run fails only
/// when no symbol could be loaded at all.
pub fn generate(
    pipeline: &SignalPipeline,
    source: &dyn FeatureSource,
    sink: &dyn SignalSink,
    symbols: &[String],
    date: NaiveDate,
) -> Result<GenerateSummary, EchoAlphaError> {
    let mut summary = GenerateSummary::default();
    let mut rows = Vec::new();
    let mut loaded = Vec::new();

    for symbol in symbols {
        match source.load_features(symbol, date) {
            Ok(mut r) => {
                rows.append(&mut r);
                loaded.push(symbol.clone());
            }
            Err(e) => {
                warn!(symbol = %symbol, error = %e, "skipping symbol");
                summary.skipped_symbols.push(symbol.clone());
            }
        }
    }
    if loaded.is_empty() {
        return Err(EchoAlphaError::Data {
            reason: format!("no feature data for any symbol on {date}"),
        });
    }

    let report = pipeline.process_batch(&rows);
    summary.dropped = report.rejected.len();
    summary.clamped = report.warning_count();

    let mut by_symbol: BTreeMap<&str, Vec<EmittedSignal>> =
        loaded.iter().map(|s| (s.as_str(), Vec::new())).collect();
    for signal in report.emitted {
        match by_symbol.get_mut(signal.record.symbol.as_str()) {
            Some(list) => {
                *summary.actions.entry(signal.action.to_string()).or_default() += 1;
                summary.emitted += 1;
                list.push(signal);
            }
            None => {
                warn!(
                    symbol = %signal.record.symbol,
                    "row names a symbol that was not requested, dropping"
                );
                summary.dropped += 1;
            }
        }
    }

    for (symbol, signals) in &by_symbol {
        summary.written.push(sink.write_signals(symbol, date, signals)?);
    }
    Ok(summary)
}

fn print_summary(summary: &GenerateSummary) {
    println!(
        "Signals: {} emitted, {} dropped, {} clamped",
        summary.emitted, summary.dropped, summary.clamped
    );
    for action in [Action::Buy, Action::Sell, Action::Hold] {
        let label = action.to_string();
        let count = summary.actions.get(&label).copied().unwrap_or(0);
        println!("  {label:<5} {count}");
    }
    if !summary.skipped_symbols.is_empty() {
        println!("Skipped: {}", summary.skipped_symbols.join(", "));
    }
    for path in &summary.written {
        println!("Wrote {path}");
    }
}

fn run_check_config(config_path: &Path) -> ExitCode {
    match load_pipeline_config(config_path) {
        Ok(config) => {
            print!("{}", format_config(&config));
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("{e}");
            (&e).into()
        }
    }
}

/// Resolved configuration in INI form, defaults included.
pub fn format_config(config: &PipelineConfig) -> String {
    let floor = match config.confidence.min_floor {
        Some(f) => format!("min_floor = {f}"),
        None => "; min_floor unset".to_string(),
    };
    format!(
        "[weights]\ntechnical = {}\nsentiment = {}\nmicrostructure = {}\n\n\
         [thresholds]\nbuy = {}\nsell = {}\n\n\
         [confidence]\n{}\n\n\
         [regime]\nwindow_size = {}\ntrend_threshold = {}\nvolatility_threshold = {}\n\
         price_volatility_threshold = {}\n",
        config.weights.technical,
        config.weights.sentiment,
        config.weights.microstructure,
        config.thresholds.buy,
        config.thresholds.sell,
        floor,
        config.regime.window_size,
        config.regime.trend_threshold,
        config.regime.volatility_threshold,
        config.regime.price_volatility_threshold,
    )
}
