//! Sentiment scorer.
//!
//! raw   = 0.5 * score + 0.2 * ma_1h + 0.3 * ma_1d
//! score = clamp(raw / (1 + 2 * |volatility|))
//!
//! High sentiment volatility shrinks the score toward zero. An absent group
//! scores 0.

use crate::domain::error::EchoAlphaError;
use crate::domain::feature::{AdaptedRecord, SentimentFeatures};
use crate::domain::scorer::{Scorer, bounded};
use crate::domain::signal::{SignalSource, SubSignal};

const SCORE_WEIGHT: f64 = 0.5;
const MA_1H_WEIGHT: f64 = 0.2;
const MA_1D_WEIGHT: f64 = 0.3;
const VOLATILITY_DAMPING: f64 = 2.0;

#[derive(Debug, Clone, Copy, Default)]
pub struct SentimentScorer;

impl SentimentScorer {
    pub fn raw_score(s: &SentimentFeatures) -> f64 {
        let blend = SCORE_WEIGHT * s.score + MA_1H_WEIGHT * s.ma_1h + MA_1D_WEIGHT * s.ma_1d;
        blend / (1.0 + VOLATILITY_DAMPING * s.volatility.abs())
    }
}

impl Scorer for SentimentScorer {
    fn source(&self) -> SignalSource {
        SignalSource::Sentiment
    }

    fn score(&self, record: &AdaptedRecord) -> Result<SubSignal, EchoAlphaError> {
        if !record.presence.sentiment {
            return Ok(SubSignal::neutral(SignalSource::Sentiment));
        }
        bounded(SignalSource::Sentiment, Self::raw_score(&record.sentiment))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn sentiment(score: f64, ma_1h: f64, ma_1d: f64, volatility: f64) -> SentimentFeatures {
        SentimentFeatures {
            score,
            ma_1h,
            ma_1d,
            volatility,
            ..Default::default()
        }
    }

    #[test]
    fn blends_score_and_averages() {
        let s = sentiment(0.8, 0.0, 0.7, 0.0);
        assert_relative_eq!(SentimentScorer::raw_score(&s), 0.61, epsilon = 1e-12);
    }

    #[test]
    fn volatility_dampens_contribution() {
        let calm = SentimentScorer::raw_score(&sentiment(0.8, 0.5, 0.7, 0.0));
        let noisy = SentimentScorer::raw_score(&sentiment(0.8, 0.5, 0.7, 0.5));
        assert!(noisy.abs() < calm.abs());
        assert_relative_eq!(noisy, calm / 2.0, epsilon = 1e-12);
    }

    #[test]
    fn negative_volatility_treated_as_magnitude() {
        let a = SentimentScorer::raw_score(&sentiment(-0.4, 0.0, 0.0, 0.25));
        let b = SentimentScorer::raw_score(&sentiment(-0.4, 0.0, 0.0, -0.25));
        assert_eq!(a, b);
    }

    #[test]
    fn all_max_inputs_stay_bounded() {
        let s = sentiment(1.0, 1.0, 1.0, 0.0);
        assert_relative_eq!(SentimentScorer::raw_score(&s), 1.0, epsilon = 1e-12);
    }
}
