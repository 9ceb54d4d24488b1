//! Signal types: sub-signals, regimes, actions and the emitted signal record.

use chrono::{DateTime, Utc};
use std::fmt;
use std::str::FromStr;

use crate::domain::error::{EchoAlphaError, SignalWarning};

/// Saturate a score into [-1, 1].
pub fn saturate(value: f64) -> f64 {
    value.clamp(-1.0, 1.0)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SignalSource {
    Technical,
    Sentiment,
    Microstructure,
}

impl fmt::Display for SignalSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SignalSource::Technical => write!(f, "technical"),
            SignalSource::Sentiment => write!(f, "sentiment"),
            SignalSource::Microstructure => write!(f, "microstructure"),
        }
    }
}

/// A bounded [-1, 1] score and the scorer that produced it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SubSignal {
    pub source: SignalSource,
    pub value: f64,
}

impl SubSignal {
    pub fn neutral(source: SignalSource) -> Self {
        Self { source, value: 0.0 }
    }
}

/// The three sub-signals of one combination pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SubSignals {
    pub technical: SubSignal,
    pub sentiment: SubSignal,
    pub microstructure: SubSignal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Regime {
    Trending,
    Ranging,
    Volatile,
    Neutral,
}

impl Regime {
    pub const ALL: [Regime; 4] = [
        Regime::Trending,
        Regime::Ranging,
        Regime::Volatile,
        Regime::Neutral,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Regime::Trending => "trending",
            Regime::Ranging => "ranging",
            Regime::Volatile => "volatile",
            Regime::Neutral => "neutral",
        }
    }
}

impl fmt::Display for Regime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Regime {
    type Err = EchoAlphaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let label = s.trim().to_lowercase();
        Regime::ALL
            .into_iter()
            .find(|r| r.as_str() == label)
            .ok_or_else(|| EchoAlphaError::invalid_signal(format!("unknown regime label {s:?}")))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    Buy,
    Sell,
    Hold,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Buy => write!(f, "BUY"),
            Action::Sell => write!(f, "SELL"),
            Action::Hold => write!(f, "HOLD"),
        }
    }
}

/// Candidate signal before validation. `regime` may be missing and the
/// bounded fields may be out of range; the validator decides what survives.
#[derive(Debug, Clone, PartialEq)]
pub struct SignalDraft {
    pub symbol: String,
    pub timestamp: DateTime<Utc>,
    pub technical_signal: f64,
    pub sentiment_signal: f64,
    pub microstructure_signal: f64,
    pub combined_signal: f64,
    pub momentum_score: f64,
    pub mean_reversion_score: f64,
    pub trend_score: f64,
    pub signal_strength: f64,
    pub confidence: f64,
    pub regime: Option<Regime>,
}

/// Validated pipeline output, one per (symbol, timestamp).
#[derive(Debug, Clone, PartialEq)]
pub struct SignalRecord {
    pub symbol: String,
    pub timestamp: DateTime<Utc>,
    pub technical_signal: f64,
    pub sentiment_signal: f64,
    pub microstructure_signal: f64,
    pub combined_signal: f64,
    pub momentum_score: f64,
    pub mean_reversion_score: f64,
    pub trend_score: f64,
    pub signal_strength: f64,
    pub confidence: f64,
    pub regime: Regime,
}

/// A validated record, its action, and any recoverable warnings raised on the way.
#[derive(Debug, Clone, PartialEq)]
pub struct EmittedSignal {
    pub record: SignalRecord,
    pub action: Action,
    pub warnings: Vec<SignalWarning>,
}
