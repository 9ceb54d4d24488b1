//! Signal combiner.
//!
//! combined = saturate(sum(w_i * s_i) / sum(w_i)) over the technical,
//! sentiment and microstructure sub-signals. Weights come from configuration
//! and need not sum to 1.
//!
//! The combiner also breaks the signal into three named drivers:
//! - momentum: MACD histogram plus short-vs-long sentiment drift
//! - mean reversion: RSI, Bollinger position and price z-score
//! - trend: EMA/price against SMA(20) plus the daily sentiment average

use crate::domain::config::SignalWeights;
use crate::domain::error::EchoAlphaError;
use crate::domain::feature::AdaptedRecord;
use crate::domain::scorer::TechnicalComponents;
use crate::domain::scorer::technical::weighted_mean;
use crate::domain::signal::{SignalSource, SubSignals, saturate};

const MOMENTUM_MACD_WEIGHT: f64 = 0.6;
const MOMENTUM_SENTIMENT_WEIGHT: f64 = 0.4;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Combination {
    pub combined: f64,
    pub momentum: f64,
    pub mean_reversion: f64,
    pub trend: f64,
}

pub trait SignalCombiner: Send + Sync {
    fn combine(
        &self,
        record: &AdaptedRecord,
        signals: &SubSignals,
    ) -> Result<Combination, EchoAlphaError>;
}

#[derive(Debug, Clone, Copy)]
pub struct WeightedCombiner {
    weights: SignalWeights,
}

impl WeightedCombiner {
    pub fn new(weights: SignalWeights) -> Self {
        Self { weights }
    }

    /// Normalised weighted blend. Each weight is divided by the total before
    /// multiplying, so zeroing the other weights returns the remaining
    /// sub-signal bit-for-bit.
    pub fn blend(&self, signals: &SubSignals) -> Result<f64, EchoAlphaError> {
        let w = &self.weights;
        let total = w.total();
        if !(total.is_finite() && total > 0.0) {
            return Err(EchoAlphaError::Scoring {
                scorer: SignalSource::Technical,
                reason: format!("weight total {total} cannot normalise the blend"),
            });
        }
        let combined = (w.technical / total) * signals.technical.value
            + (w.sentiment / total) * signals.sentiment.value
            + (w.microstructure / total) * signals.microstructure.value;
        Ok(saturate(combined))
    }
}

impl SignalCombiner for WeightedCombiner {
    fn combine(
        &self,
        record: &AdaptedRecord,
        signals: &SubSignals,
    ) -> Result<Combination, EchoAlphaError> {
        let combined = self.blend(signals)?;
        let tech = TechnicalComponents::from_features(&record.technical);
        let sentiment = record.presence.sentiment.then_some(&record.sentiment);

        let sentiment_drift = sentiment.map(|s| saturate(s.score - s.ma_1d));
        let momentum = saturate(
            MOMENTUM_MACD_WEIGHT * tech.macd.unwrap_or(0.0)
                + MOMENTUM_SENTIMENT_WEIGHT * sentiment_drift.unwrap_or(0.0),
        );

        let mean_reversion = saturate(weighted_mean(&[
            (1.0, tech.rsi),
            (1.0, tech.bollinger),
            (1.0, tech.zscore),
        ]));

        let trend = saturate(weighted_mean(&[
            (1.0, tech.ema_vs_sma),
            (1.0, tech.price_vs_sma),
            (1.0, sentiment.map(|s| saturate(s.ma_1d))),
        ]));

        Ok(Combination {
            combined,
            momentum,
            mean_reversion,
            trend,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::feature::{
        GroupPresence, MicrostructureFeatures, SentimentFeatures, TechnicalFeatures, TimeContext,
    };
    use crate::domain::signal::SubSignal;
    use approx::assert_relative_eq;
    use chrono::{TimeZone, Utc};

    fn signals(t: f64, s: f64, m: f64) -> SubSignals {
        SubSignals {
            technical: SubSignal {
                source: SignalSource::Technical,
                value: t,
            },
            sentiment: SubSignal {
                source: SignalSource::Sentiment,
                value: s,
            },
            microstructure: SubSignal {
                source: SignalSource::Microstructure,
                value: m,
            },
        }
    }

    fn record(technical: TechnicalFeatures, sentiment: Option<SentimentFeatures>) -> AdaptedRecord {
        let ts = Utc.with_ymd_and_hms(2024, 6, 3, 14, 0, 0).unwrap();
        AdaptedRecord {
            symbol: "AAPL".into(),
            timestamp: ts,
            technical,
            presence: GroupPresence {
                sentiment: sentiment.is_some(),
                microstructure: false,
            },
            sentiment: sentiment.unwrap_or_default(),
            microstructure: MicrostructureFeatures::default(),
            time: TimeContext::from_timestamp(ts),
        }
    }

    #[test]
    fn default_weights_blend() {
        let c = WeightedCombiner::new(SignalWeights::default());
        let combined = c.blend(&signals(-0.6, 0.61, 0.0)).unwrap();
        assert_relative_eq!(combined, -0.057, epsilon = 1e-12);
    }

    #[test]
    fn weights_are_normalised() {
        let c = WeightedCombiner::new(SignalWeights {
            technical: 2.0,
            sentiment: 2.0,
            microstructure: 0.0,
        });
        assert_relative_eq!(c.blend(&signals(0.5, -0.1, 1.0)).unwrap(), 0.2, epsilon = 1e-12);
    }

    #[test]
    fn zero_weights_pass_technical_through_exactly() {
        let c = WeightedCombiner::new(SignalWeights {
            technical: 0.4,
            sentiment: 0.0,
            microstructure: 0.0,
        });
        for t in [-0.6, 0.123456789, 0.999, -1.0, 0.0] {
            assert_eq!(c.blend(&signals(t, 0.9, -0.7)).unwrap(), t);
        }
    }

    #[test]
    fn zero_total_weight_is_scoring_error() {
        let c = WeightedCombiner::new(SignalWeights {
            technical: 0.0,
            sentiment: 0.0,
            microstructure: 0.0,
        });
        assert!(matches!(
            c.blend(&signals(0.1, 0.1, 0.1)),
            Err(EchoAlphaError::Scoring { .. })
        ));
    }

    #[test]
    fn decomposition_of_overbought_uptrend() {
        let technical = TechnicalFeatures {
            close: Some(102.0),
            sma_20: Some(100.0),
            ema_12: Some(101.0),
            rsi_14: Some(80.0),
            bb_position: Some(1.0),
            macd: Some(1.0),
            macd_signal: Some(0.5),
            ..Default::default()
        };
        let sentiment = SentimentFeatures {
            score: 0.8,
            ma_1d: 0.4,
            ..Default::default()
        };
        let c = WeightedCombiner::new(SignalWeights::default());
        let rec = record(technical, Some(sentiment));
        let parts = c.combine(&rec, &signals(0.0, 0.0, 0.0)).unwrap();

        // momentum: 0.6 * tanh(0.5 * 100 / 102) + 0.4 * (0.8 - 0.4)
        let expected_momentum = 0.6 * (50.0_f64 / 102.0).tanh() + 0.4 * 0.4;
        assert_relative_eq!(parts.momentum, expected_momentum, epsilon = 1e-12);
        // mean reversion: mean(-0.6, -1.0)
        assert_relative_eq!(parts.mean_reversion, -0.8, epsilon = 1e-12);
        // trend: mean(tanh(0.5), tanh(1.0), 0.4)
        let expected_trend = (0.5_f64.tanh() + 1.0_f64.tanh() + 0.4) / 3.0;
        assert_relative_eq!(parts.trend, expected_trend, epsilon = 1e-12);
        assert!(parts.trend > 0.0 && parts.mean_reversion < 0.0);
    }

    #[test]
    fn decomposition_without_inputs_is_neutral() {
        let c = WeightedCombiner::new(SignalWeights::default());
        let parts = c
            .combine(&record(TechnicalFeatures::default(), None), &signals(0.0, 0.0, 0.0))
            .unwrap();
        assert_eq!(parts.momentum, 0.0);
        assert_eq!(parts.mean_reversion, 0.0);
        assert_eq!(parts.trend, 0.0);
    }
}
