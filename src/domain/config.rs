//! Pipeline configuration and its validation.
//!
//! Built once from a [`ConfigPort`] and injected into the pipeline by value.
//! Missing keys take defaults; a key that is present but unparseable or out
//! of range rejects the whole configuration.

use crate::domain::error::EchoAlphaError;
use crate::ports::config_port::ConfigPort;

/// Largest accepted `regime.window_size`.
pub const MAX_WINDOW_SIZE: usize = 10_000;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SignalWeights {
    pub technical: f64,
    pub sentiment: f64,
    pub microstructure: f64,
}

impl Default for SignalWeights {
    fn default() -> Self {
        Self {
            technical: 0.4,
            sentiment: 0.3,
            microstructure: 0.3,
        }
    }
}

impl SignalWeights {
    pub fn total(&self) -> f64 {
        self.technical + self.sentiment + self.microstructure
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ActionThresholds {
    pub buy: f64,
    pub sell: f64,
}

impl Default for ActionThresholds {
    fn default() -> Self {
        Self {
            buy: 0.5,
            sell: -0.5,
        }
    }
}

/// Optional confidence gate: below `min_floor` the action is always HOLD.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ConfidenceGate {
    pub min_floor: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RegimeConfig {
    /// Trailing records kept per symbol.
    pub window_size: usize,
    /// |mean combined signal| above which a persistent window is trending.
    pub trend_threshold: f64,
    /// Std-dev of combined signals above which the window is volatile.
    pub volatility_threshold: f64,
    /// Mean relative price volatility above which the window is volatile.
    pub price_volatility_threshold: f64,
}

impl Default for RegimeConfig {
    fn default() -> Self {
        Self {
            window_size: 20,
            trend_threshold: 0.3,
            volatility_threshold: 0.35,
            price_volatility_threshold: 0.03,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PipelineConfig {
    pub weights: SignalWeights,
    pub thresholds: ActionThresholds,
    pub confidence: ConfidenceGate,
    pub regime: RegimeConfig,
}

impl PipelineConfig {
    /// Read and validate every recognised option.
    pub fn from_port(config: &dyn ConfigPort) -> Result<Self, EchoAlphaError> {
        let defaults = PipelineConfig::default();
        let built = PipelineConfig {
            weights: SignalWeights {
                technical: read_f64(config, "weights", "technical", defaults.weights.technical)?,
                sentiment: read_f64(config, "weights", "sentiment", defaults.weights.sentiment)?,
                microstructure: read_f64(
                    config,
                    "weights",
                    "microstructure",
                    defaults.weights.microstructure,
                )?,
            },
            thresholds: ActionThresholds {
                buy: read_f64(config, "thresholds", "buy", defaults.thresholds.buy)?,
                sell: read_f64(config, "thresholds", "sell", defaults.thresholds.sell)?,
            },
            confidence: ConfidenceGate {
                min_floor: read_optional_f64(config, "confidence", "min_floor")?,
            },
            regime: RegimeConfig {
                window_size: read_usize(
                    config,
                    "regime",
                    "window_size",
                    defaults.regime.window_size,
                )?,
                trend_threshold: read_f64(
                    config,
                    "regime",
                    "trend_threshold",
                    defaults.regime.trend_threshold,
                )?,
                volatility_threshold: read_f64(
                    config,
                    "regime",
                    "volatility_threshold",
                    defaults.regime.volatility_threshold,
                )?,
                price_volatility_threshold: read_f64(
                    config,
                    "regime",
                    "price_volatility_threshold",
                    defaults.regime.price_volatility_threshold,
                )?,
            },
        };
        built.validate()?;
        Ok(built)
    }

    pub fn validate(&self) -> Result<(), EchoAlphaError> {
        validate_weights(&self.weights)?;
        validate_thresholds(&self.thresholds)?;
        validate_confidence(&self.confidence)?;
        validate_regime(&self.regime)?;
        Ok(())
    }
}

fn validate_weights(w: &SignalWeights) -> Result<(), EchoAlphaError> {
    for (key, value) in [
        ("technical", w.technical),
        ("sentiment", w.sentiment),
        ("microstructure", w.microstructure),
    ] {
        if !value.is_finite() || value < 0.0 {
            return Err(EchoAlphaError::config_invalid(
                "weights",
                key,
                format!("{key} weight must be a non-negative number"),
            ));
        }
    }
    if w.total() <= 0.0 {
        return Err(EchoAlphaError::config_invalid(
            "weights",
            "technical",
            "at least one weight must be positive",
        ));
    }
    Ok(())
}

fn validate_thresholds(t: &ActionThresholds) -> Result<(), EchoAlphaError> {
    for (key, value) in [("buy", t.buy), ("sell", t.sell)] {
        if !(-1.0..=1.0).contains(&value) {
            return Err(EchoAlphaError::config_invalid(
                "thresholds",
                key,
                format!("{key} must be between -1 and 1"),
            ));
        }
    }
    if t.buy <= t.sell {
        return Err(EchoAlphaError::config_invalid(
            "thresholds",
            "buy",
            "buy must be greater than sell",
        ));
    }
    Ok(())
}

fn validate_confidence(c: &ConfidenceGate) -> Result<(), EchoAlphaError> {
    match c.min_floor {
        Some(floor) if !(0.0..=1.0).contains(&floor) => Err(EchoAlphaError::config_invalid(
            "confidence",
            "min_floor",
            "min_floor must be between 0 and 1",
        )),
        _ => Ok(()),
    }
}

fn validate_regime(r: &RegimeConfig) -> Result<(), EchoAlphaError> {
    if !(1..=MAX_WINDOW_SIZE).contains(&r.window_size) {
        return Err(EchoAlphaError::config_invalid(
            "regime",
            "window_size",
            format!("window_size must be between 1 and {MAX_WINDOW_SIZE}"),
        ));
    }
    if !(r.trend_threshold > 0.0 && r.trend_threshold <= 1.0) {
        return Err(EchoAlphaError::config_invalid(
            "regime",
            "trend_threshold",
            "trend_threshold must be in (0, 1]",
        ));
    }
    for (key, value) in [
        ("volatility_threshold", r.volatility_threshold),
        ("price_volatility_threshold", r.price_volatility_threshold),
    ] {
        if !value.is_finite() || value <= 0.0 {
            return Err(EchoAlphaError::config_invalid(
                "regime",
                key,
                format!("{key} must be positive"),
            ));
        }
    }
    Ok(())
}

fn read_optional_f64(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
) -> Result<Option<f64>, EchoAlphaError> {
    match config.get_string(section, key) {
        None => Ok(None),
        Some(s) if s.trim().is_empty() => Ok(None),
        Some(s) => s.trim().parse::<f64>().map(Some).map_err(|_| {
            EchoAlphaError::config_invalid(section, key, format!("{s:?} is not a number"))
        }),
    }
}

fn read_f64(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
    default: f64,
) -> Result<f64, EchoAlphaError> {
    Ok(read_optional_f64(config, section, key)?.unwrap_or(default))
}

fn read_usize(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
    default: usize,
) -> Result<usize, EchoAlphaError> {
    match config.get_string(section, key) {
        None => Ok(default),
        Some(s) if s.trim().is_empty() => Ok(default),
        Some(s) => s.trim().parse::<usize>().map_err(|_| {
            EchoAlphaError::config_invalid(
                section,
                key,
                format!("{s:?} is not a non-negative integer"),
            )
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::file_config_adapter::FileConfigAdapter;

    fn make_config(content: &str) -> FileConfigAdapter {
        FileConfigAdapter::from_string(content).unwrap()
    }

    fn invalid_key(result: Result<PipelineConfig, EchoAlphaError>) -> String {
        match result.unwrap_err() {
            EchoAlphaError::ConfigInvalid { key, .. } => key,
            other => panic!("expected ConfigInvalid, got {other:?}"),
        }
    }

    #[test]
    fn valid_config_passes() {
        let config = make_config(
            r#"
[weights]
technical = 0.5
sentiment = 0.25
microstructure = 0.25

[thresholds]
buy = 0.4
sell = -0.6

[confidence]
min_floor = 0.3

[regime]
window_size = 10
"#,
        );
        let built = PipelineConfig::from_port(&config).unwrap();
        assert_eq!(built.weights.technical, 0.5);
        assert_eq!(built.thresholds.buy, 0.4);
        assert_eq!(built.thresholds.sell, -0.6);
        assert_eq!(built.confidence.min_floor, Some(0.3));
        assert_eq!(built.regime.window_size, 10);
        assert_eq!(built.regime.trend_threshold, 0.3);
    }

    #[test]
    fn empty_config_uses_defaults() {
        let built = PipelineConfig::from_port(&make_config("[weights]\n")).unwrap();
        assert_eq!(built, PipelineConfig::default());
        assert_eq!(built.confidence.min_floor, None);
    }

    #[test]
    fn weights_need_not_sum_to_one() {
        let config = make_config("[weights]\ntechnical = 2\nsentiment = 1\nmicrostructure = 0\n");
        let built = PipelineConfig::from_port(&config).unwrap();
        assert_eq!(built.weights.total(), 3.0);
    }

    #[test]
    fn negative_weight_fails() {
        let config = make_config("[weights]\nsentiment = -0.1\n");
        assert_eq!(invalid_key(PipelineConfig::from_port(&config)), "sentiment");
    }

    #[test]
    fn non_numeric_weight_fails_instead_of_defaulting() {
        let config = make_config("[weights]\ntechnical = heavy\n");
        assert_eq!(invalid_key(PipelineConfig::from_port(&config)), "technical");
    }

    #[test]
    fn all_zero_weights_fail() {
        let config =
            make_config("[weights]\ntechnical = 0\nsentiment = 0\nmicrostructure = 0\n");
        assert!(PipelineConfig::from_port(&config).is_err());
    }

    #[test]
    fn buy_must_exceed_sell() {
        let config = make_config("[thresholds]\nbuy = -0.2\nsell = 0.2\n");
        assert_eq!(invalid_key(PipelineConfig::from_port(&config)), "buy");
    }

    #[test]
    fn threshold_out_of_range_fails() {
        let config = make_config("[thresholds]\nsell = -1.5\n");
        assert_eq!(invalid_key(PipelineConfig::from_port(&config)), "sell");
    }

    #[test]
    fn min_floor_out_of_range_fails() {
        let config = make_config("[confidence]\nmin_floor = 1.2\n");
        assert_eq!(invalid_key(PipelineConfig::from_port(&config)), "min_floor");
    }

    #[test]
    fn window_size_zero_fails() {
        let config = make_config("[regime]\nwindow_size = 0\n");
        assert_eq!(invalid_key(PipelineConfig::from_port(&config)), "window_size");
    }

    #[test]
    fn huge_window_size_fails() {
        let config = make_config("[regime]\nwindow_size = 100000000000000\n");
        assert_eq!(invalid_key(PipelineConfig::from_port(&config)), "window_size");
        let config = make_config(&format!("[regime]\nwindow_size = {MAX_WINDOW_SIZE}\n"));
        assert!(PipelineConfig::from_port(&config).is_ok());
    }

    #[test]
    fn window_size_non_integer_fails() {
        let config = make_config("[regime]\nwindow_size = 2.5\n");
        assert_eq!(invalid_key(PipelineConfig::from_port(&config)), "window_size");
    }

    #[test]
    fn trend_threshold_zero_fails() {
        let config = make_config("[regime]\ntrend_threshold = 0\n");
        assert_eq!(
            invalid_key(PipelineConfig::from_port(&config)),
            "trend_threshold"
        );
    }
}
