//! Downstream signal persistence port trait.

use crate::domain::error::EchoAlphaError;
use crate::domain::signal::EmittedSignal;
use chrono::NaiveDate;

pub trait SignalSink {
    /// Persist one symbol's signals for a trading date. Returns where they went.
    fn write_signals(
        &self,
        symbol: &str,
        date: NaiveDate,
        signals: &[EmittedSignal],
    ) -> Result<String, EchoAlphaError>;
}
