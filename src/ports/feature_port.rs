//! Upstream feature supply port trait.

use crate::domain::error::EchoAlphaError;
use crate::domain::feature::RawFeatureRecord;
use chrono::NaiveDate;

pub trait FeatureSource {
    /// Feature rows for one symbol and trading date, in the order stored.
    fn load_features(
        &self,
        symbol: &str,
        date: NaiveDate,
    ) -> Result<Vec<RawFeatureRecord>, EchoAlphaError>;
}
