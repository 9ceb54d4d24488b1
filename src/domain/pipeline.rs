//! The signal pipeline shell.
//!
//! feature record -> adapter -> scorers -> combiner -> confidence + regime
//! -> validator -> thresholder. Every stage sits behind a trait and can be
//! swapped with the `with_*` builders. The only state carried between calls
//! is the per-symbol regime window.

use rayon::prelude::*;
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

use crate::domain::combiner::{SignalCombiner, WeightedCombiner};
use crate::domain::confidence::{confidence, signal_strength};
use crate::domain::config::PipelineConfig;
use crate::domain::error::EchoAlphaError;
use crate::domain::feature::{AdaptedRecord, FeatureRecord, RawFeatureRecord};
use crate::domain::feature_adapter::{adapt, adapt_raw};
use crate::domain::regime::{ClassifierFactory, RegimeBook, RegimeObservation};
use crate::domain::scorer::ScorerSet;
use crate::domain::signal::{EmittedSignal, SignalDraft, saturate};
use crate::domain::thresholder::{ActionThresholder, ThresholdPolicy};
use crate::domain::validator::{BoundsValidator, SignalValidator};

/// A record the pipeline refused, with its position in the input.
#[derive(Debug)]
pub struct RejectedRecord {
    pub index: usize,
    pub symbol: Option<String>,
    pub error: EchoAlphaError,
}

/// Outcome of a batch: emitted signals and dropped records, each in input order.
#[derive(Debug, Default)]
pub struct BatchReport {
    pub emitted: Vec<EmittedSignal>,
    pub rejected: Vec<RejectedRecord>,
}

impl BatchReport {
    pub fn warning_count(&self) -> usize {
        self.emitted.iter().map(|e| e.warnings.len()).sum()
    }
}

pub struct SignalPipeline {
    config: PipelineConfig,
    scorers: ScorerSet,
    combiner: Box<dyn SignalCombiner>,
    validator: Box<dyn SignalValidator>,
    thresholder: Box<dyn ActionThresholder>,
    regimes: RegimeBook,
}

impl SignalPipeline {
    pub fn new(config: PipelineConfig) -> Self {
        Self {
            scorers: ScorerSet::default(),
            combiner: Box::new(WeightedCombiner::new(config.weights)),
            validator: Box::new(BoundsValidator),
            thresholder: Box::new(ThresholdPolicy::new(config.thresholds, config.confidence)),
            regimes: RegimeBook::new(config.regime),
            config,
        }
    }

    pub fn with_scorers(mut self, scorers: ScorerSet) -> Self {
        self.scorers = scorers;
        self
    }

    pub fn with_combiner(mut self, combiner: Box<dyn SignalCombiner>) -> Self {
        self.combiner = combiner;
        self
    }

    pub fn with_validator(mut self, validator: Box<dyn SignalValidator>) -> Self {
        self.validator = validator;
        self
    }

    pub fn with_thresholder(mut self, thresholder: Box<dyn ActionThresholder>) -> Self {
        self.thresholder = thresholder;
        self
    }

    /// Replaces the regime book, discarding any history already observed.
    pub fn with_regime_classifier(mut self, factory: ClassifierFactory) -> Self {
        self.regimes = RegimeBook::with_factory(factory);
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn regimes(&self) -> &RegimeBook {
        &self.regimes
    }

    /// Process one feature-table row.
    pub fn process(&self, raw: &RawFeatureRecord) -> Result<EmittedSignal, EchoAlphaError> {
        self.emit(adapt_raw(raw)?)
    }

    /// Process one typed feature record.
    pub fn process_record(&self, record: &FeatureRecord) -> Result<EmittedSignal, EchoAlphaError> {
        self.emit(adapt(record)?)
    }

    /// Score, combine and classify an adapted record. Advances the symbol's
    /// regime window.
    pub fn draft(&self, record: &AdaptedRecord) -> Result<SignalDraft, EchoAlphaError> {
        let signals = self.scorers.score_all(record)?;
        let parts = self.combiner.combine(record, &signals)?;
        // A NaN would stay in the regime window long after this record.
        if !parts.combined.is_finite() {
            return Err(EchoAlphaError::invalid_signal(format!(
                "{} at {}: combined signal {} is not finite",
                record.symbol, record.timestamp, parts.combined
            )));
        }
        let regime = self.regimes.observe(
            &record.symbol,
            RegimeObservation {
                timestamp: record.timestamp,
                combined: saturate(parts.combined),
                volatility: record.technical.relative_volatility(),
            },
        )?;

        Ok(SignalDraft {
            symbol: record.symbol.clone(),
            timestamp: record.timestamp,
            technical_signal: signals.technical.value,
            sentiment_signal: signals.sentiment.value,
            microstructure_signal: signals.microstructure.value,
            combined_signal: parts.combined,
            momentum_score: parts.momentum,
            mean_reversion_score: parts.mean_reversion,
            trend_score: parts.trend,
            signal_strength: signal_strength(parts.combined),
            confidence: confidence(&signals, &record.presence),
            regime: Some(regime),
        })
    }

    fn emit(&self, record: AdaptedRecord) -> Result<EmittedSignal, EchoAlphaError> {
        let draft = self.draft(&record)?;
        let market_open = record.time.is_market_open;
        let (record, warnings) = self.validator.validate(draft)?;
        for w in &warnings {
            warn!(symbol = %record.symbol, timestamp = %record.timestamp, "{w}");
        }
        let action = self.thresholder.action(&record);
        debug!(
            symbol = %record.symbol,
            timestamp = %record.timestamp,
            combined = record.combined_signal,
            confidence = record.confidence,
            regime = %record.regime,
            action = %action,
            market_open,
            "signal emitted"
        );
        Ok(EmittedSignal {
            record,
            action,
            warnings,
        })
    }

    /// Process feature rows, isolating failures per record.
    ///
    /// Rows are grouped by symbol; each symbol's rows run in input order on
    /// one thread while different symbols run in parallel.
    pub fn process_batch(&self, rows: &[RawFeatureRecord]) -> BatchReport {
        self.run_batch(rows, |r| r.symbol_hint().map(str::to_string), |r| {
            self.process(r)
        })
    }

    /// Same as [`process_batch`](Self::process_batch) for typed records.
    pub fn process_records(&self, records: &[FeatureRecord]) -> BatchReport {
        self.run_batch(records, |r| Some(r.symbol.trim().to_string()), |r| {
            self.process_record(r)
        })
    }

    fn run_batch<T, K, P>(&self, items: &[T], key: K, process: P) -> BatchReport
    where
        T: Sync,
        K: Fn(&T) -> Option<String>,
        P: Fn(&T) -> Result<EmittedSignal, EchoAlphaError> + Sync,
    {
        let mut groups: BTreeMap<Option<String>, Vec<usize>> = BTreeMap::new();
        for (i, item) in items.iter().enumerate() {
            groups.entry(key(item)).or_default().push(i);
        }

        let mut outcomes: Vec<(usize, Option<String>, Result<EmittedSignal, EchoAlphaError>)> =
            groups
                .into_par_iter()
                .flat_map_iter(|(symbol, indices)| {
                    let process = &process;
                    indices
                        .into_iter()
                        .map(move |i| (i, symbol.clone(), process(&items[i])))
                })
                .collect();
        outcomes.sort_by_key(|(i, _, _)| *i);

        let mut report = BatchReport::default();
        for (index, symbol, outcome) in outcomes {
            match outcome {
                Ok(signal) => report.emitted.push(signal),
                Err(error) => {
                    warn!(
                        index,
                        symbol = symbol.as_deref().unwrap_or("?"),
                        error = %error,
                        "record dropped"
                    );
                    report.rejected.push(RejectedRecord {
                        index,
                        symbol,
                        error,
                    });
                }
            }
        }
        info!(
            emitted = report.emitted.len(),
            dropped = report.rejected.len(),
            clamped = report.warning_count(),
            "batch processed"
        );
        report
    }
}
