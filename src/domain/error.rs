//! Domain error and warning types.

use chrono::{DateTime, Utc};

use crate::domain::signal::SignalSource;

/// Top-level error type for echoalpha.
///
/// Record-level variants (`MalformedRecord`, `Scoring`, `InvalidSignalRecord`,
/// `OutOfOrder`) are fatal for one record only; the pipeline keeps going.
#[derive(Debug, thiserror::Error)]
pub enum EchoAlphaError {
    #[error("malformed feature record: {reason}")]
    MalformedRecord { reason: String },

    #[error("{scorer} scorer failed: {reason}")]
    Scoring { scorer: SignalSource, reason: String },

    #[error("invalid signal record: {reason}")]
    InvalidSignalRecord { reason: String },

    #[error("out-of-order record for {symbol}: {timestamp} is not after {last}")]
    OutOfOrder {
        symbol: String,
        timestamp: DateTime<Utc>,
        last: DateTime<Utc>,
    },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("data error: {reason}")]
    Data { reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl EchoAlphaError {
    pub(crate) fn malformed(reason: impl Into<String>) -> Self {
        EchoAlphaError::MalformedRecord {
            reason: reason.into(),
        }
    }

    pub(crate) fn invalid_signal(reason: impl Into<String>) -> Self {
        EchoAlphaError::InvalidSignalRecord {
            reason: reason.into(),
        }
    }

    pub(crate) fn config_invalid(section: &str, key: &str, reason: impl Into<String>) -> Self {
        EchoAlphaError::ConfigInvalid {
            section: section.to_string(),
            key: key.to_string(),
            reason: reason.into(),
        }
    }

    /// True for errors that drop a single record rather than stop a run.
    pub fn is_record_level(&self) -> bool {
        matches!(
            self,
            EchoAlphaError::MalformedRecord { .. }
                | EchoAlphaError::Scoring { .. }
                | EchoAlphaError::InvalidSignalRecord { .. }
                | EchoAlphaError::OutOfOrder { .. }
        )
    }
}

impl From<&EchoAlphaError> for std::process::ExitCode {
    fn from(err: &EchoAlphaError) -> Self {
        let code: u8 = match err {
            EchoAlphaError::Io(_) => 1,
            EchoAlphaError::ConfigParse { .. } | EchoAlphaError::ConfigInvalid { .. } => 2,
            EchoAlphaError::Data { .. } => 3,
            EchoAlphaError::MalformedRecord { .. }
            | EchoAlphaError::Scoring { .. }
            | EchoAlphaError::InvalidSignalRecord { .. }
            | EchoAlphaError::OutOfOrder { .. } => 4,
        };
        std::process::ExitCode::from(code)
    }
}

/// Recoverable condition reported next to an emitted signal.
#[derive(Debug, Clone, PartialEq)]
pub enum SignalWarning {
    /// A bounded field was outside its range and was pulled back to the bound.
    OutOfRangeClamped {
        field: &'static str,
        value: f64,
        clamped_to: f64,
    },
}

impl std::fmt::Display for SignalWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SignalWarning::OutOfRangeClamped {
                field,
                value,
                clamped_to,
            } => write!(f, "{field} = {value} out of range, clamped to {clamped_to}"),
        }
    }
}
