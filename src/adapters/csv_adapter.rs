//! CSV file adapter: feature tables in, signal tables out.
//!
//! Files are named `features_<symbol>_<YYYY-MM-DD>.csv` and
//! `signals_<symbol>_<YYYY-MM-DD>.csv`.

use crate::domain::error::EchoAlphaError;
use crate::domain::feature::RawFeatureRecord;
use crate::domain::signal::EmittedSignal;
use crate::ports::feature_port::FeatureSource;
use crate::ports::signal_port::SignalSink;
use chrono::{NaiveDate, SecondsFormat};
use std::fs;
use std::path::PathBuf;
use tracing::info;

pub const SIGNAL_COLUMNS: [&str; 14] = [
    "symbol",
    "timestamp",
    "technical_signal",
    "sentiment_signal",
    "microstructure_signal",
    "combined_signal",
    "momentum_score",
    "mean_reversion_score",
    "trend_score",
    "signal_strength",
    "confidence",
    "regime",
    "signal_action",
    "warnings",
];

pub struct CsvAdapter {
    features_dir: PathBuf,
    output_dir: PathBuf,
}

impl CsvAdapter {
    pub fn new(features_dir: PathBuf, output_dir: PathBuf) -> Self {
        Self {
            features_dir,
            output_dir,
        }
    }

    pub fn features_path(&self, symbol: &str, date: NaiveDate) -> PathBuf {
        self.features_dir
            .join(format!("features_{}_{}.csv", symbol, date.format("%Y-%m-%d")))
    }

    pub fn signals_path(&self, symbol: &str, date: NaiveDate) -> PathBuf {
        self.output_dir
            .join(format!("signals_{}_{}.csv", symbol, date.format("%Y-%m-%d")))
    }
}

impl FeatureSource for CsvAdapter {
    fn load_features(
        &self,
        symbol: &str,
        date: NaiveDate,
    ) -> Result<Vec<RawFeatureRecord>, EchoAlphaError> {
        let path = self.features_path(symbol, date);
        let content = fs::read_to_string(&path).map_err(|e| EchoAlphaError::Data {
            reason: format!("failed to read {}: {}", path.display(), e),
        })?;

        let mut rdr = csv::Reader::from_reader(content.as_bytes());
        let headers: Vec<String> = rdr
            .headers()
            .map_err(|e| EchoAlphaError::Data {
                reason: format!("{}: CSV header error: {}", path.display(), e),
            })?
            .iter()
            .map(|h| h.trim().to_lowercase())
            .collect();

        let mut rows = Vec::new();
        for result in rdr.records() {
            let record = result.map_err(|e| EchoAlphaError::Data {
                reason: format!("{}: CSV parse error: {}", path.display(), e),
            })?;
            let mut row: RawFeatureRecord = headers
                .iter()
                .zip(record.iter())
                .map(|(h, cell)| (h.clone(), cell.to_string()))
                .collect();
            // Per-symbol files usually leave the symbol implicit.
            let row_symbol = row
                .symbol_hint()
                .map_or_else(|| symbol.to_string(), str::to_uppercase);
            row.insert("symbol", row_symbol);
            rows.push(row);
        }

        info!(path = %path.display(), rows = rows.len(), "features loaded");
        Ok(rows)
    }
}

impl SignalSink for CsvAdapter {
    fn write_signals(
        &self,
        symbol: &str,
        date: NaiveDate,
        signals: &[EmittedSignal],
    ) -> Result<String, EchoAlphaError> {
        fs::create_dir_all(&self.output_dir)?;
        let path = self.signals_path(symbol, date);
        let csv_err = |e: csv::Error| EchoAlphaError::Data {
            reason: format!("failed to write {}: {}", path.display(), e),
        };

        let mut wtr = csv::Writer::from_path(&path).map_err(csv_err)?;
        wtr.write_record(SIGNAL_COLUMNS).map_err(csv_err)?;
        for signal in signals {
            let r = &signal.record;
            let warnings: Vec<String> = signal.warnings.iter().map(|w| w.to_string()).collect();
            wtr.write_record([
                r.symbol.clone(),
                r.timestamp.to_rfc3339_opts(SecondsFormat::Secs, true),
                r.technical_signal.to_string(),
                r.sentiment_signal.to_string(),
                r.microstructure_signal.to_string(),
                r.combined_signal.to_string(),
                r.momentum_score.to_string(),
                r.mean_reversion_score.to_string(),
                r.trend_score.to_string(),
                r.signal_strength.to_string(),
                r.confidence.to_string(),
                r.regime.to_string(),
                signal.action.to_string(),
                warnings.join("; "),
            ])
            .map_err(csv_err)?;
        }
        wtr.flush()?;

        info!(path = %path.display(), rows = signals.len(), "signals written");
        Ok(path.display().to_string())
    }
}
