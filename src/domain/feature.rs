//! Feature record types handed over by the feature-engineering stage.
//!
//! Optional groups are explicit: `None` means the upstream had no data for the
//! group (e.g. no order book), which is different from a group of zeros.

use chrono::{DateTime, Datelike, Timelike, Utc};
use std::collections::BTreeMap;

/// Technical indicator columns. Every field may be absent on its own.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TechnicalFeatures {
    pub close: Option<f64>,
    pub sma_20: Option<f64>,
    pub ema_12: Option<f64>,
    pub rsi_14: Option<f64>,
    pub rsi_14_zscore: Option<f64>,
    pub bb_upper: Option<f64>,
    pub bb_lower: Option<f64>,
    pub bb_position: Option<f64>,
    pub macd: Option<f64>,
    pub macd_signal: Option<f64>,
    pub volatility: Option<f64>,
    pub close_zscore: Option<f64>,
    pub volume_sma: Option<f64>,
}

impl TechnicalFeatures {
    /// Named view over all fields, used for finiteness checks and output.
    pub fn fields(&self) -> [(&'static str, Option<f64>); 13] {
        [
            ("close", self.close),
            ("sma_20", self.sma_20),
            ("ema_12", self.ema_12),
            ("rsi_14", self.rsi_14),
            ("rsi_14_zscore", self.rsi_14_zscore),
            ("bb_upper", self.bb_upper),
            ("bb_lower", self.bb_lower),
            ("bb_position", self.bb_position),
            ("macd", self.macd),
            ("macd_signal", self.macd_signal),
            ("volatility", self.volatility),
            ("close_zscore", self.close_zscore),
            ("volume_sma", self.volume_sma),
        ]
    }

    /// Price volatility relative to close, when both are available.
    pub fn relative_volatility(&self) -> Option<f64> {
        match (self.volatility, self.close) {
            (Some(vol), Some(close)) if close > 0.0 => Some(vol.abs() / close),
            _ => None,
        }
    }
}

/// Sentiment group. Inside a present group, missing values are neutral 0.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SentimentFeatures {
    pub score: f64,
    pub ma_1h: f64,
    pub ma_1d: f64,
    pub volatility: f64,
    /// Per-source mean sentiment, keyed by source name (reddit, news, ...).
    pub by_source: BTreeMap<String, f64>,
}

/// Order-book derived group. Absent when no order-book data was available.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MicrostructureFeatures {
    /// Relative bid-ask spread (fraction of mid price).
    pub bid_ask_spread: f64,
    /// Order imbalance in [-1, 1]; positive means bid-heavy.
    pub order_imbalance: f64,
    pub volume_profile: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeContext {
    pub hour: u32,
    /// Monday = 0 .. Sunday = 6.
    pub day_of_week: u32,
    pub is_weekend: bool,
    pub is_market_open: bool,
}

impl TimeContext {
    /// Weekend is Saturday/Sunday; the market is open 09:00-16:59 on weekdays.
    pub fn from_timestamp(ts: DateTime<Utc>) -> Self {
        let hour = ts.hour();
        let day_of_week = ts.weekday().num_days_from_monday();
        let is_weekend = day_of_week >= 5;
        Self {
            hour,
            day_of_week,
            is_weekend,
            is_market_open: (9..=16).contains(&hour) && !is_weekend,
        }
    }
}

/// One feature row per (symbol, timestamp), as supplied upstream.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureRecord {
    pub symbol: String,
    pub timestamp: DateTime<Utc>,
    pub technical: TechnicalFeatures,
    pub sentiment: Option<SentimentFeatures>,
    pub microstructure: Option<MicrostructureFeatures>,
    pub time: TimeContext,
}

impl FeatureRecord {
    /// Record with only the key set; time context derived from the timestamp.
    pub fn new(symbol: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            symbol: symbol.into(),
            timestamp,
            technical: TechnicalFeatures::default(),
            sentiment: None,
            microstructure: None,
            time: TimeContext::from_timestamp(timestamp),
        }
    }

    pub fn with_technical(mut self, technical: TechnicalFeatures) -> Self {
        self.technical = technical;
        self
    }

    pub fn with_sentiment(mut self, sentiment: SentimentFeatures) -> Self {
        self.sentiment = Some(sentiment);
        self
    }

    pub fn with_microstructure(mut self, microstructure: MicrostructureFeatures) -> Self {
        self.microstructure = Some(microstructure);
        self
    }
}

/// Which optional groups carried real data before defaults were filled in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GroupPresence {
    pub sentiment: bool,
    pub microstructure: bool,
}

impl GroupPresence {
    pub fn absent_groups(&self) -> u32 {
        u32::from(!self.sentiment) + u32::from(!self.microstructure)
    }
}

/// Fully populated record the scorers work on: every group present, with
/// neutral defaults where upstream had nothing, and `presence` recording
/// what was defaulted.
#[derive(Debug, Clone, PartialEq)]
pub struct AdaptedRecord {
    pub symbol: String,
    pub timestamp: DateTime<Utc>,
    pub technical: TechnicalFeatures,
    pub sentiment: SentimentFeatures,
    pub microstructure: MicrostructureFeatures,
    pub time: TimeContext,
    pub presence: GroupPresence,
}

/// A feature-table row as column -> cell text. A missing column means the
/// value is absent; an empty cell means null. Both end up absent after
/// adaptation, but they stay distinguishable here.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawFeatureRecord {
    cells: BTreeMap<String, String>,
}

impl RawFeatureRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, column: &str, value: impl ToString) -> Self {
        self.insert(column, value);
        self
    }

    pub fn insert(&mut self, column: &str, value: impl ToString) {
        self.cells.insert(column.to_string(), value.to_string());
    }

    /// `None` when the column is missing; `Some("")` when the cell is null.
    pub fn get(&self, column: &str) -> Option<&str> {
        self.cells.get(column).map(String::as_str)
    }

    /// Non-empty, trimmed cell value.
    pub fn value(&self, column: &str) -> Option<&str> {
        self.get(column).map(str::trim).filter(|v| !v.is_empty())
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.cells.keys().map(String::as_str)
    }

    pub fn symbol_hint(&self) -> Option<&str> {
        self.value("symbol")
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for RawFeatureRecord {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            cells: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}
