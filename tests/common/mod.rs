#![allow(dead_code)]

use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use echoalpha::domain::error::EchoAlphaError;
pub use echoalpha::domain::feature::{
    FeatureRecord, MicrostructureFeatures, RawFeatureRecord, SentimentFeatures, TechnicalFeatures,
};
use echoalpha::domain::signal::EmittedSignal;
use echoalpha::ports::feature_port::FeatureSource;
use echoalpha::ports::signal_port::SignalSink;
use std::collections::HashMap;
use std::sync::Mutex;

pub struct MockFeatureSource {
    pub rows: HashMap<String, Vec<RawFeatureRecord>>,
}

impl MockFeatureSource {
    pub fn new() -> Self {
        Self {
            rows: HashMap::new(),
        }
    }

    pub fn with_rows(mut self, symbol: &str, rows: Vec<RawFeatureRecord>) -> Self {
        self.rows.insert(symbol.to_string(), rows);
        self
    }
}

impl FeatureSource for MockFeatureSource {
    fn load_features(
        &self,
        symbol: &str,
        _date: NaiveDate,
    ) -> Result<Vec<RawFeatureRecord>, EchoAlphaError> {
        self.rows
            .get(symbol)
            .cloned()
            .ok_or_else(|| EchoAlphaError::Data {
                reason: format!("no features for {symbol}"),
            })
    }
}

/// Collects written signals in memory.
#[derive(Default)]
pub struct MockSignalSink {
    pub written: Mutex<Vec<(String, Vec<EmittedSignal>)>>,
}

impl SignalSink for MockSignalSink {
    fn write_signals(
        &self,
        symbol: &str,
        _date: NaiveDate,
        signals: &[EmittedSignal],
    ) -> Result<String, EchoAlphaError> {
        self.written
            .lock()
            .unwrap()
            .push((symbol.to_string(), signals.to_vec()));
        Ok(format!("memory://{symbol}"))
    }
}

pub fn ts(minutes: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 3, 14, 0, 0).unwrap() + Duration::minutes(minutes)
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// rsi 80, sentiment 0.8 / ma_1d 0.7, no microstructure.
pub fn overbought_record(symbol: &str, minutes: i64) -> FeatureRecord {
    FeatureRecord::new(symbol, ts(minutes))
        .with_technical(TechnicalFeatures {
            rsi_14: Some(80.0),
            ..Default::default()
        })
        .with_sentiment(SentimentFeatures {
            score: 0.8,
            ma_1d: 0.7,
            ..Default::default()
        })
}

pub fn full_record(symbol: &str, minutes: i64, imbalance: f64) -> FeatureRecord {
    overbought_record(symbol, minutes).with_microstructure(MicrostructureFeatures {
        bid_ask_spread: 0.0005,
        order_imbalance: imbalance,
        volume_profile: 1.0,
    })
}

pub fn overbought_row(symbol: &str, timestamp: &str) -> RawFeatureRecord {
    RawFeatureRecord::new()
        .with("symbol", symbol)
        .with("timestamp", timestamp)
        .with("close", "101.5")
        .with("rsi_14", "80")
        .with("sentiment_score", "0.8")
        .with("sentiment_ma_1d", "0.7")
}
