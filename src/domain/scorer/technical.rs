//! Technical scorer.
//!
//! Components (each in [-1, 1], each optional):
//! - RSI: `(50 - rsi_14) / 50`, or `-tanh(rsi_14_zscore)` when the z-score is
//!   supplied. Overbought reads bearish.
//! - Bollinger: `1 - 2 * position`, position 0 at the lower band, 1 at the upper.
//! - MACD: `tanh(100 * (macd - macd_signal) / close)`; without a positive
//!   close the raw histogram is squashed instead.
//!
//! Score = weighted mean over the present components, weights RSI 0.4,
//! Bollinger 0.3, MACD 0.3 renormalised. No component -> 0.

use crate::domain::error::EchoAlphaError;
use crate::domain::feature::{AdaptedRecord, TechnicalFeatures};
use crate::domain::scorer::{Scorer, bounded};
use crate::domain::signal::{SignalSource, SubSignal, saturate};

const RSI_WEIGHT: f64 = 0.4;
const BOLLINGER_WEIGHT: f64 = 0.3;
const MACD_WEIGHT: f64 = 0.3;

/// Histogram as percent of price before squashing.
const MACD_PRICE_SCALE: f64 = 100.0;
/// Sensitivity of the moving-average spread terms (2% spread ~ tanh(1)).
const TREND_SCALE: f64 = 50.0;

/// Normalised technical components shared by the scorer and the combiner's
/// decompositions.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TechnicalComponents {
    pub rsi: Option<f64>,
    pub bollinger: Option<f64>,
    pub macd: Option<f64>,
    /// `-tanh(close_zscore / 2)`: stretched above the mean reads bearish.
    pub zscore: Option<f64>,
    /// EMA(12) relative to SMA(20).
    pub ema_vs_sma: Option<f64>,
    /// Close relative to SMA(20).
    pub price_vs_sma: Option<f64>,
}

impl TechnicalComponents {
    pub fn from_features(t: &TechnicalFeatures) -> Self {
        let rsi = match (t.rsi_14_zscore, t.rsi_14) {
            (Some(z), _) => Some(-z.tanh()),
            (None, Some(rsi)) => Some(saturate((50.0 - rsi) / 50.0)),
            (None, None) => None,
        };

        let position = t.bb_position.or_else(|| match (t.close, t.bb_upper, t.bb_lower) {
            (Some(close), Some(upper), Some(lower)) if upper - lower > 0.0 => {
                Some((close - lower) / (upper - lower))
            }
            _ => None,
        });
        let bollinger = position.map(|p| saturate(1.0 - 2.0 * p));

        let macd = match (t.macd, t.macd_signal) {
            (Some(line), Some(signal)) => {
                let histogram = line - signal;
                Some(match t.close {
                    Some(close) if close > 0.0 => (MACD_PRICE_SCALE * histogram / close).tanh(),
                    _ => histogram.tanh(),
                })
            }
            _ => None,
        };

        let zscore = t.close_zscore.map(|z| -(z / 2.0).tanh());

        let relative_to_sma = |value: Option<f64>| match (value, t.sma_20) {
            (Some(v), Some(sma)) if sma > 0.0 => Some((TREND_SCALE * (v - sma) / sma).tanh()),
            _ => None,
        };

        Self {
            rsi,
            bollinger,
            macd,
            zscore,
            ema_vs_sma: relative_to_sma(t.ema_12),
            price_vs_sma: relative_to_sma(t.close),
        }
    }

    /// Weighted blend of the oscillator components; 0 when none is present.
    pub fn blended(&self) -> f64 {
        let parts = [
            (RSI_WEIGHT, self.rsi),
            (BOLLINGER_WEIGHT, self.bollinger),
            (MACD_WEIGHT, self.macd),
        ];
        weighted_mean(&parts)
    }
}

/// Mean of the present values, each weighted; weights are normalised first
/// so a single present component comes through unchanged.
pub(crate) fn weighted_mean(parts: &[(f64, Option<f64>)]) -> f64 {
    let total: f64 = parts
        .iter()
        .filter(|(_, v)| v.is_some())
        .map(|(w, _)| *w)
        .sum();
    if total <= 0.0 {
        return 0.0;
    }
    parts
        .iter()
        .filter_map(|(w, v)| v.map(|v| (w / total) * v))
        .sum()
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TechnicalScorer;

impl Scorer for TechnicalScorer {
    fn source(&self) -> SignalSource {
        SignalSource::Technical
    }

    fn score(&self, record: &AdaptedRecord) -> Result<SubSignal, EchoAlphaError> {
        let components = TechnicalComponents::from_features(&record.technical);
        bounded(SignalSource::Technical, components.blended())
    }
}
