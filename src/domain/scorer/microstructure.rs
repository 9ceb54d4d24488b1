//! Microstructure scorer.
//!
//! score = clamp(order_imbalance / (1 + 100 * bid_ask_spread))
//!
//! A wide spread discounts the imbalance (1% spread halves it). Missing
//! order-book data is common and scores exactly 0 rather than failing.

use crate::domain::error::EchoAlphaError;
use crate::domain::feature::AdaptedRecord;
use crate::domain::scorer::{Scorer, bounded};
use crate::domain::signal::{SignalSource, SubSignal, saturate};

const SPREAD_PENALTY: f64 = 100.0;

#[derive(Debug, Clone, Copy, Default)]
pub struct MicrostructureScorer;

impl Scorer for MicrostructureScorer {
    fn source(&self) -> SignalSource {
        SignalSource::Microstructure
    }

    fn score(&self, record: &AdaptedRecord) -> Result<SubSignal, EchoAlphaError> {
        if !record.presence.microstructure {
            return Ok(SubSignal::neutral(SignalSource::Microstructure));
        }
        let m = &record.microstructure;
        // A crossed book would let the divisor reach zero.
        if m.bid_ask_spread < 0.0 {
            return Err(EchoAlphaError::Scoring {
                scorer: SignalSource::Microstructure,
                reason: format!("negative bid-ask spread {}", m.bid_ask_spread),
            });
        }
        let liquidity = 1.0 / (1.0 + SPREAD_PENALTY * m.bid_ask_spread);
        bounded(
            SignalSource::Microstructure,
            saturate(m.order_imbalance) * liquidity,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::feature::{
        GroupPresence, MicrostructureFeatures, SentimentFeatures, TechnicalFeatures, TimeContext,
    };
    use approx::assert_relative_eq;
    use chrono::{TimeZone, Utc};

    fn record(micro: Option<MicrostructureFeatures>) -> AdaptedRecord {
        let ts = Utc.with_ymd_and_hms(2024, 6, 3, 14, 0, 0).unwrap();
        AdaptedRecord {
            symbol: "AAPL".into(),
            timestamp: ts,
            technical: TechnicalFeatures::default(),
            sentiment: SentimentFeatures::default(),
            presence: GroupPresence {
                sentiment: false,
                microstructure: micro.is_some(),
            },
            microstructure: micro.unwrap_or_default(),
            time: TimeContext::from_timestamp(ts),
        }
    }

    fn micro(spread: f64, imbalance: f64) -> Option<MicrostructureFeatures> {
        Some(MicrostructureFeatures {
            bid_ask_spread: spread,
            order_imbalance: imbalance,
            volume_profile: 0.0,
        })
    }

    #[test]
    fn absent_data_scores_exactly_zero() {
        let s = MicrostructureScorer.score(&record(None)).unwrap();
        assert_eq!(s.value, 0.0);
        assert_eq!(s.source, SignalSource::Microstructure);
    }

    #[test]
    fn tight_spread_passes_imbalance_through() {
        let s = MicrostructureScorer.score(&record(micro(0.0, 0.4))).unwrap();
        assert_eq!(s.value, 0.4);
    }

    #[test]
    fn wide_spread_discounts_imbalance() {
        let s = MicrostructureScorer.score(&record(micro(0.01, -0.8))).unwrap();
        assert_relative_eq!(s.value, -0.4, epsilon = 1e-12);
    }

    #[test]
    fn imbalance_outside_unit_range_saturates() {
        let s = MicrostructureScorer.score(&record(micro(0.0, 3.0))).unwrap();
        assert_eq!(s.value, 1.0);
    }

    #[test]
    fn negative_spread_is_scoring_error() {
        let err = MicrostructureScorer
            .score(&record(micro(-0.02, 0.5)))
            .unwrap_err();
        assert!(matches!(
            err,
            EchoAlphaError::Scoring {
                scorer: SignalSource::Microstructure,
                ..
            }
        ));
    }
}
