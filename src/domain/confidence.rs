//! Signal strength and confidence.
//!
//! strength   = |combined| clamped to [0, 1]
//! confidence = (0.6 + 0.4 * agreement) * 0.55^(absent optional groups)
//!
//! agreement is `|sum v| / sum |v|` over the sub-signals whose group carried
//! data: 1 when they all point the same way, 0 when they cancel out or are
//! all zero.

use crate::domain::feature::GroupPresence;
use crate::domain::signal::SubSignals;

const AGREEMENT_FLOOR: f64 = 0.6;
const AGREEMENT_SPAN: f64 = 1.0 - AGREEMENT_FLOOR;
/// Must stay below AGREEMENT_FLOOR: a missing group has to cost more than
/// the worst disagreement a present group can add.
const ABSENT_GROUP_FACTOR: f64 = 0.55;

pub fn signal_strength(combined: f64) -> f64 {
    combined.abs().min(1.0)
}

/// Sign agreement among the sub-signals of present groups.
pub fn agreement(signals: &SubSignals, presence: &GroupPresence) -> f64 {
    let mut values = vec![signals.technical.value];
    if presence.sentiment {
        values.push(signals.sentiment.value);
    }
    if presence.microstructure {
        values.push(signals.microstructure.value);
    }
    let magnitude: f64 = values.iter().map(|v| v.abs()).sum();
    if magnitude <= f64::EPSILON {
        return 0.0;
    }
    (values.iter().sum::<f64>().abs() / magnitude).min(1.0)
}

pub fn confidence(signals: &SubSignals, presence: &GroupPresence) -> f64 {
    let base = AGREEMENT_FLOOR + AGREEMENT_SPAN * agreement(signals, presence);
    let completeness = ABSENT_GROUP_FACTOR.powi(presence.absent_groups() as i32);
    (base * completeness).clamp(0.0, 1.0)
}
