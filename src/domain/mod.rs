//! Core domain types and logic.

pub mod combiner;
pub mod confidence;
pub mod config;
pub mod error;
pub mod feature;
pub mod feature_adapter;
pub mod pipeline;
pub mod regime;
pub mod scorer;
pub mod signal;
pub mod thresholder;
pub mod validator;
