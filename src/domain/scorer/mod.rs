//! Sub-signal scorers.
//!
//! Each scorer maps one feature group of an [`AdaptedRecord`] to a bounded
//! [-1, 1] [`SubSignal`]:
//! - `TechnicalScorer`: RSI distance, Bollinger position, MACD histogram
//! - `SentimentScorer`: instantaneous and averaged sentiment, damped by volatility
//! - `MicrostructureScorer`: order imbalance discounted by spread

pub mod microstructure;
pub mod sentiment;
pub mod technical;

pub use microstructure::MicrostructureScorer;
pub use sentiment::SentimentScorer;
pub use technical::{TechnicalComponents, TechnicalScorer};

use crate::domain::error::EchoAlphaError;
use crate::domain::feature::AdaptedRecord;
use crate::domain::signal::{SignalSource, SubSignal, SubSignals, saturate};

pub trait Scorer: Send + Sync {
    fn source(&self) -> SignalSource;

    fn score(&self, record: &AdaptedRecord) -> Result<SubSignal, EchoAlphaError>;
}

/// The scorer set used by one pipeline.
pub struct ScorerSet {
    pub technical: Box<dyn Scorer>,
    pub sentiment: Box<dyn Scorer>,
    pub microstructure: Box<dyn Scorer>,
}

impl Default for ScorerSet {
    fn default() -> Self {
        Self {
            technical: Box::new(TechnicalScorer),
            sentiment: Box::new(SentimentScorer),
            microstructure: Box::new(MicrostructureScorer),
        }
    }
}

impl ScorerSet {
    pub fn score_all(&self, record: &AdaptedRecord) -> Result<SubSignals, EchoAlphaError> {
        Ok(SubSignals {
            technical: self.technical.score(record)?,
            sentiment: self.sentiment.score(record)?,
            microstructure: self.microstructure.score(record)?,
        })
    }
}

/// Reject a non-finite raw score, otherwise saturate it.
pub(crate) fn bounded(source: SignalSource, raw: f64) -> Result<SubSignal, EchoAlphaError> {
    if !raw.is_finite() {
        return Err(EchoAlphaError::Scoring {
            scorer: source,
            reason: format!("non-finite score {raw}"),
        });
    }
    Ok(SubSignal {
        source,
        value: saturate(raw),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bounded_saturates() {
        let s = bounded(SignalSource::Technical, 3.5).unwrap();
        assert_eq!(s.value, 1.0);
        let s = bounded(SignalSource::Technical, -3.5).unwrap();
        assert_eq!(s.value, -1.0);
    }

    #[test]
    fn bounded_rejects_nan() {
        let err = bounded(SignalSource::Sentiment, f64::NAN).unwrap_err();
        assert!(matches!(
            err,
            EchoAlphaError::Scoring {
                scorer: SignalSource::Sentiment,
                ..
            }
        ));
    }

    #[test]
    fn default_set_sources() {
        let set = ScorerSet::default();
        assert_eq!(set.technical.source(), SignalSource::Technical);
        assert_eq!(set.sentiment.source(), SignalSource::Sentiment);
        assert_eq!(set.microstructure.source(), SignalSource::Microstructure);
    }
}
