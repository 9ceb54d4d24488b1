//! Port traits: the boundaries between the pipeline and the outside world.

pub mod config_port;
pub mod feature_port;
pub mod signal_port;
