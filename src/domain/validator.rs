//! Signal validation: the last gate before a record leaves the pipeline.
//!
//! Bounded numeric fields are clamped and reported; structural problems
//! (empty symbol, missing regime, NaN) drop the record.

use crate::domain::error::{EchoAlphaError, SignalWarning};
use crate::domain::signal::{SignalDraft, SignalRecord};

pub trait SignalValidator: Send + Sync {
    fn validate(
        &self,
        draft: SignalDraft,
    ) -> Result<(SignalRecord, Vec<SignalWarning>), EchoAlphaError>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct BoundsValidator;

impl BoundsValidator {
    fn bound(
        field: &'static str,
        value: f64,
        lo: f64,
        hi: f64,
        warnings: &mut Vec<SignalWarning>,
    ) -> Result<f64, EchoAlphaError> {
        if value.is_nan() {
            return Err(EchoAlphaError::invalid_signal(format!("{field} is NaN")));
        }
        let clamped = value.clamp(lo, hi);
        if clamped != value {
            warnings.push(SignalWarning::OutOfRangeClamped {
                field,
                value,
                clamped_to: clamped,
            });
        }
        Ok(clamped)
    }
}

impl SignalValidator for BoundsValidator {
    fn validate(
        &self,
        draft: SignalDraft,
    ) -> Result<(SignalRecord, Vec<SignalWarning>), EchoAlphaError> {
        if draft.symbol.trim().is_empty() {
            return Err(EchoAlphaError::invalid_signal("symbol is empty"));
        }
        let regime = draft.regime.ok_or_else(|| {
            EchoAlphaError::invalid_signal(format!(
                "{} at {} has no regime label",
                draft.symbol, draft.timestamp
            ))
        })?;

        let mut warnings = Vec::new();
        let w = &mut warnings;
        let record = SignalRecord {
            technical_signal: Self::bound("technical_signal", draft.technical_signal, -1.0, 1.0, w)?,
            sentiment_signal: Self::bound("sentiment_signal", draft.sentiment_signal, -1.0, 1.0, w)?,
            microstructure_signal: Self::bound(
                "microstructure_signal",
                draft.microstructure_signal,
                -1.0,
                1.0,
                w,
            )?,
            combined_signal: Self::bound("combined_signal", draft.combined_signal, -1.0, 1.0, w)?,
            momentum_score: Self::bound("momentum_score", draft.momentum_score, -1.0, 1.0, w)?,
            mean_reversion_score: Self::bound(
                "mean_reversion_score",
                draft.mean_reversion_score,
                -1.0,
                1.0,
                w,
            )?,
            trend_score: Self::bound("trend_score", draft.trend_score, -1.0, 1.0, w)?,
            signal_strength: Self::bound("signal_strength", draft.signal_strength, 0.0, 1.0, w)?,
            confidence: Self::bound("confidence", draft.confidence, 0.0, 1.0, w)?,
            symbol: draft.symbol,
            timestamp: draft.timestamp,
            regime,
        };
        Ok((record, warnings))
    }
}
