//! Market regime classification over a bounded trailing window.
//!
//! The window is the only state the pipeline keeps between records. One
//! window per symbol; records for a symbol must arrive in strictly increasing
//! timestamp order or they are rejected with `OutOfOrder`.
//!
//! Labels, most specific first (the first matching wins):
//! - volatile: combined-signal std-dev above `volatility_threshold`, or mean
//!   relative price volatility above `price_volatility_threshold`
//! - trending: |mean| above `trend_threshold` with at least 70% of the
//!   window on the mean's side of zero
//! - ranging: the signal crossed zero inside the window
//! - neutral: anything else, including a window too short to judge

use chrono::{DateTime, Utc};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, PoisonError};

use crate::domain::config::RegimeConfig;
use crate::domain::error::EchoAlphaError;
use crate::domain::signal::Regime;

const TREND_PERSISTENCE: f64 = 0.7;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RegimeObservation {
    pub timestamp: DateTime<Utc>,
    pub combined: f64,
    /// Relative price volatility, when the record carried one.
    pub volatility: Option<f64>,
}

pub trait RegimeClassifier: Send {
    /// Append one observation and classify the updated window.
    fn observe(
        &mut self,
        symbol: &str,
        observation: RegimeObservation,
    ) -> Result<Regime, EchoAlphaError>;
}

#[derive(Debug, Clone)]
pub struct WindowedRegimeClassifier {
    config: RegimeConfig,
    history: VecDeque<RegimeObservation>,
}

impl WindowedRegimeClassifier {
    pub fn new(config: RegimeConfig) -> Self {
        Self {
            history: VecDeque::new(),
            config,
        }
    }

    pub fn len(&self) -> usize {
        self.history.len()
    }

    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }

    pub fn last_timestamp(&self) -> Option<DateTime<Utc>> {
        self.history.back().map(|o| o.timestamp)
    }

    fn classify(&self) -> Regime {
        let n = self.history.len();
        let signals: Vec<f64> = self.history.iter().map(|o| o.combined).collect();
        let mean = signals.iter().sum::<f64>() / n.max(1) as f64;
        let std_dev = if n >= 2 {
            (signals.iter().map(|s| (s - mean).powi(2)).sum::<f64>() / n as f64).sqrt()
        } else {
            0.0
        };

        let vols: Vec<f64> = self.history.iter().filter_map(|o| o.volatility).collect();
        let price_vol = if vols.is_empty() {
            0.0
        } else {
            vols.iter().sum::<f64>() / vols.len() as f64
        };

        if std_dev > self.config.volatility_threshold
            || price_vol > self.config.price_volatility_threshold
        {
            return Regime::Volatile;
        }
        if n < 2 {
            return Regime::Neutral;
        }

        if mean.abs() > self.config.trend_threshold {
            let same_side = signals
                .iter()
                .filter(|s| s.signum() == mean.signum() && **s != 0.0)
                .count();
            if same_side as f64 / n as f64 >= TREND_PERSISTENCE {
                return Regime::Trending;
            }
        }

        let crossings = signals
            .iter()
            .filter(|s| **s != 0.0)
            .collect::<Vec<_>>()
            .windows(2)
            .filter(|pair| pair[0].signum() != pair[1].signum())
            .count();
        if crossings > 0 {
            return Regime::Ranging;
        }

        Regime::Neutral
    }
}

impl RegimeClassifier for WindowedRegimeClassifier {
    fn observe(
        &mut self,
        symbol: &str,
        observation: RegimeObservation,
    ) -> Result<Regime, EchoAlphaError> {
        if let Some(last) = self.last_timestamp() {
            if observation.timestamp <= last {
                return Err(EchoAlphaError::OutOfOrder {
                    symbol: symbol.to_string(),
                    timestamp: observation.timestamp,
                    last,
                });
            }
        }
        self.history.push_back(observation);
        while self.history.len() > self.config.window_size {
            self.history.pop_front();
        }
        Ok(self.classify())
    }
}

pub type ClassifierFactory = Box<dyn Fn() -> Box<dyn RegimeClassifier> + Send + Sync>;

type SharedClassifier = Arc<Mutex<Box<dyn RegimeClassifier>>>;

/// Per-symbol classifier windows.
///
/// The map lock is held only to look up or create a symbol's window; each
/// window then has its own lock, so different symbols classify in parallel
/// while calls for one symbol are serialized.
pub struct RegimeBook {
    factory: ClassifierFactory,
    windows: Mutex<HashMap<String, SharedClassifier>>,
}

impl RegimeBook {
    pub fn new(config: RegimeConfig) -> Self {
        Self::with_factory(Box::new(move || -> Box<dyn RegimeClassifier> {
            Box::new(WindowedRegimeClassifier::new(config))
        }))
    }

    pub fn with_factory(factory: ClassifierFactory) -> Self {
        Self {
            factory,
            windows: Mutex::new(HashMap::new()),
        }
    }

    pub fn observe(
        &self,
        symbol: &str,
        observation: RegimeObservation,
    ) -> Result<Regime, EchoAlphaError> {
        let window = {
            let mut windows = self.windows.lock().unwrap_or_else(PoisonError::into_inner);
            Arc::clone(
                windows
                    .entry(symbol.to_string())
                    .or_insert_with(|| Arc::new(Mutex::new((self.factory)()))),
            )
        };
        let mut classifier = window.lock().unwrap_or_else(PoisonError::into_inner);
        classifier.observe(symbol, observation)
    }

    pub fn symbols(&self) -> Vec<String> {
        let windows = self.windows.lock().unwrap_or_else(PoisonError::into_inner);
        let mut symbols: Vec<String> = windows.keys().cloned().collect();
        symbols.sort();
        symbols
    }

    /// Drop a symbol's history, e.g. before replaying it from the start.
    pub fn reset(&self, symbol: &str) {
        let mut windows = self.windows.lock().unwrap_or_else(PoisonError::into_inner);
        windows.remove(symbol);
    }
}
