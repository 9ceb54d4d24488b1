//! Feature record adapter.
//!
//! Turns an upstream row into the fixed shape the scorers expect:
//! - `parse_raw`: column/cell row -> typed [`FeatureRecord`]
//! - `adapt`: typed record -> [`AdaptedRecord`] with every group populated
//!
//! Both are pure. Any unusable key, unresolvable timestamp or non-finite
//! value is a `MalformedRecord`.

use chrono::{DateTime, Utc};
use std::collections::BTreeMap;

use crate::domain::error::EchoAlphaError;
use crate::domain::feature::{
    AdaptedRecord, FeatureRecord, GroupPresence, MicrostructureFeatures, RawFeatureRecord,
    SentimentFeatures, TechnicalFeatures, TimeContext,
};

const SENTIMENT_COLUMNS: [&str; 4] = [
    "sentiment_score",
    "sentiment_ma_1h",
    "sentiment_ma_1d",
    "sentiment_volatility",
];
const MICROSTRUCTURE_COLUMNS: [&str; 3] = ["bid_ask_spread", "order_imbalance", "volume_profile"];
const SENTIMENT_SOURCE_PREFIX: &str = "sentiment_";

/// Offset-carrying timestamp layouts accepted besides RFC 3339.
const TIMESTAMP_FORMATS: [&str; 3] = [
    "%Y-%m-%d %H:%M:%S%:z",
    "%Y-%m-%d %H:%M:%S%.f%:z",
    "%Y-%m-%d %H:%M:%S%z",
];

/// Parse and adapt in one step.
pub fn adapt_raw(raw: &RawFeatureRecord) -> Result<AdaptedRecord, EchoAlphaError> {
    adapt(&parse_raw(raw)?)
}

/// Fill optional groups with neutral defaults and record what was present.
pub fn adapt(record: &FeatureRecord) -> Result<AdaptedRecord, EchoAlphaError> {
    if record.symbol.trim().is_empty() {
        return Err(EchoAlphaError::malformed("symbol is empty"));
    }
    check_finite(record)?;

    Ok(AdaptedRecord {
        symbol: record.symbol.trim().to_string(),
        timestamp: record.timestamp,
        technical: record.technical.clone(),
        sentiment: record.sentiment.clone().unwrap_or_default(),
        microstructure: record.microstructure.clone().unwrap_or_default(),
        time: record.time,
        presence: GroupPresence {
            sentiment: record.sentiment.is_some(),
            microstructure: record.microstructure.is_some(),
        },
    })
}

/// Parse a raw row into a typed record.
pub fn parse_raw(raw: &RawFeatureRecord) -> Result<FeatureRecord, EchoAlphaError> {
    let symbol = raw
        .value("symbol")
        .ok_or_else(|| EchoAlphaError::malformed("missing symbol"))?
        .to_string();
    let ts_text = raw
        .value("timestamp")
        .ok_or_else(|| EchoAlphaError::malformed(format!("{symbol}: missing timestamp")))?;
    let timestamp = parse_timestamp(ts_text)?;

    let technical = TechnicalFeatures {
        close: number(raw, "close")?,
        sma_20: number(raw, "sma_20")?,
        ema_12: number(raw, "ema_12")?,
        rsi_14: number(raw, "rsi_14")?,
        rsi_14_zscore: number(raw, "rsi_14_zscore")?,
        bb_upper: number(raw, "bb_upper")?,
        bb_lower: number(raw, "bb_lower")?,
        bb_position: number(raw, "bb_position")?,
        macd: number(raw, "macd")?,
        macd_signal: number(raw, "macd_signal")?,
        volatility: number(raw, "volatility")?,
        close_zscore: number(raw, "close_zscore")?,
        volume_sma: number(raw, "volume_sma")?,
    };

    Ok(FeatureRecord {
        symbol,
        timestamp,
        technical,
        sentiment: parse_sentiment(raw)?,
        microstructure: parse_microstructure(raw)?,
        time: parse_time(raw, timestamp)?,
    })
}

/// Resolve a timestamp to UTC. Naive timestamps carry no zone and are rejected.
pub fn parse_timestamp(text: &str) -> Result<DateTime<Utc>, EchoAlphaError> {
    let text = text.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(text) {
        return Ok(ts.with_timezone(&Utc));
    }
    TIMESTAMP_FORMATS
        .iter()
        .find_map(|fmt| DateTime::parse_from_str(text, fmt).ok())
        .map(|ts| ts.with_timezone(&Utc))
        .ok_or_else(|| {
            EchoAlphaError::malformed(format!("timestamp {text:?} is not resolvable to UTC"))
        })
}

fn number(raw: &RawFeatureRecord, column: &str) -> Result<Option<f64>, EchoAlphaError> {
    let Some(text) = raw.value(column) else {
        return Ok(None);
    };
    let value: f64 = text
        .parse()
        .map_err(|_| EchoAlphaError::malformed(format!("{column}: {text:?} is not a number")))?;
    if !value.is_finite() {
        return Err(EchoAlphaError::malformed(format!(
            "{column}: non-finite value {text}"
        )));
    }
    Ok(Some(value))
}

fn flag(raw: &RawFeatureRecord, column: &str) -> Result<Option<bool>, EchoAlphaError> {
    let Some(text) = raw.value(column) else {
        return Ok(None);
    };
    match text.to_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(Some(true)),
        "false" | "0" | "no" => Ok(Some(false)),
        _ => Err(EchoAlphaError::malformed(format!(
            "{column}: {text:?} is not a boolean"
        ))),
    }
}

fn parse_sentiment(raw: &RawFeatureRecord) -> Result<Option<SentimentFeatures>, EchoAlphaError> {
    let mut by_source = BTreeMap::new();
    for column in raw.columns() {
        if let Some(source) = column.strip_prefix(SENTIMENT_SOURCE_PREFIX) {
            if SENTIMENT_COLUMNS.contains(&column) || source == "mean" {
                continue;
            }
            if let Some(value) = number(raw, column)? {
                by_source.insert(source.to_string(), value);
            }
        }
    }

    let score = number(raw, "sentiment_score")?;
    let mean = number(raw, "sentiment_mean")?;
    let ma_1h = number(raw, "sentiment_ma_1h")?;
    let ma_1d = number(raw, "sentiment_ma_1d")?;
    let volatility = number(raw, "sentiment_volatility")?;

    if score.is_none()
        && mean.is_none()
        && ma_1h.is_none()
        && ma_1d.is_none()
        && volatility.is_none()
        && by_source.is_empty()
    {
        return Ok(None);
    }

    // Fall back to the cross-source mean when no blended score was supplied.
    let source_mean = if by_source.is_empty() {
        None
    } else {
        Some(by_source.values().sum::<f64>() / by_source.len() as f64)
    };
    let score = score.or(mean).or(source_mean).unwrap_or(0.0);

    Ok(Some(SentimentFeatures {
        score,
        ma_1h: ma_1h.unwrap_or(0.0),
        ma_1d: ma_1d.unwrap_or(0.0),
        volatility: volatility.unwrap_or(0.0),
        by_source,
    }))
}

fn parse_microstructure(
    raw: &RawFeatureRecord,
) -> Result<Option<MicrostructureFeatures>, EchoAlphaError> {
    let spread = number(raw, MICROSTRUCTURE_COLUMNS[0])?;
    let imbalance = number(raw, MICROSTRUCTURE_COLUMNS[1])?;
    let profile = number(raw, MICROSTRUCTURE_COLUMNS[2])?;
    // Without an imbalance the group scores 0 from defaults alone.
    let Some(imbalance) = imbalance else {
        return Ok(None);
    };
    Ok(Some(MicrostructureFeatures {
        bid_ask_spread: spread.unwrap_or(0.0),
        order_imbalance: imbalance,
        volume_profile: profile.unwrap_or(0.0),
    }))
}

fn parse_time(raw: &RawFeatureRecord, ts: DateTime<Utc>) -> Result<TimeContext, EchoAlphaError> {
    let derived = TimeContext::from_timestamp(ts);
    let hour = match number(raw, "hour")? {
        Some(h) if (0.0..24.0).contains(&h) && h.fract() == 0.0 => h as u32,
        Some(h) => return Err(EchoAlphaError::malformed(format!("hour {h} out of range"))),
        None => derived.hour,
    };
    let day_of_week = match number(raw, "day_of_week")? {
        Some(d) if (0.0..7.0).contains(&d) && d.fract() == 0.0 => d as u32,
        Some(d) => {
            return Err(EchoAlphaError::malformed(format!(
                "day_of_week {d} out of range"
            )));
        }
        None => derived.day_of_week,
    };
    let is_weekend = flag(raw, "is_weekend")?.unwrap_or(day_of_week >= 5);
    let is_market_open = flag(raw, "is_market_open")?
        .unwrap_or((9..=16).contains(&hour) && !is_weekend);
    Ok(TimeContext {
        hour,
        day_of_week,
        is_weekend,
        is_market_open,
    })
}

fn check_finite(record: &FeatureRecord) -> Result<(), EchoAlphaError> {
    let mut values: Vec<(String, f64)> = record
        .technical
        .fields()
        .iter()
        .filter_map(|(name, v)| v.map(|v| (name.to_string(), v)))
        .collect();
    if let Some(s) = &record.sentiment {
        values.push(("sentiment_score".into(), s.score));
        values.push(("sentiment_ma_1h".into(), s.ma_1h));
        values.push(("sentiment_ma_1d".into(), s.ma_1d));
        values.push(("sentiment_volatility".into(), s.volatility));
        for (source, v) in &s.by_source {
            values.push((format!("sentiment_{source}"), *v));
        }
    }
    if let Some(m) = &record.microstructure {
        values.push(("bid_ask_spread".into(), m.bid_ask_spread));
        values.push(("order_imbalance".into(), m.order_imbalance));
        values.push(("volume_profile".into(), m.volume_profile));
    }
    match values.into_iter().find(|(_, v)| !v.is_finite()) {
        Some((name, v)) => Err(EchoAlphaError::malformed(format!(
            "{}: non-finite value {v}",
            name
        ))),
        None => Ok(()),
    }
}
