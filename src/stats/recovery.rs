//! Recovery Comparator Module
//! Splits states into high-tax and low-tax groups and compares how far each
//! state's employment has recovered from its low point.

use super::calculator::{
    GroupStats, StatsCalculator, StatsError, TTestResult, SIGNIFICANCE_THRESHOLD,
};
use crate::data::{DataProcessor, EmploymentMetric, Observation, ProcessorError};
use chrono::NaiveDate;
use polars::prelude::DataFrame;
use rayon::prelude::*;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Error, Debug)]
pub enum ComparatorError {
    #[error(transparent)]
    Processor(#[from] ProcessorError),
    #[error(transparent)]
    Stats(#[from] StatsError),
    #[error("unified table has no rows to compare")]
    EmptyTable,
    #[error("low quantile {low} must be below high quantile {high}")]
    InvalidQuantiles { low: f64, high: f64 },
}

/// The date whose value is compared against each state's minimum.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferenceDate {
    /// A fixed calendar date shared by all states.
    Fixed(NaiveDate),
    /// Each state's most recent valid observation.
    Latest,
}

impl Default for ReferenceDate {
    fn default() -> Self {
        // September 1st, 2020
        ReferenceDate::Fixed(NaiveDate::from_ymd_opt(2020, 9, 1).unwrap_or_default())
    }
}

impl FromStr for ReferenceDate {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("latest") {
            return Ok(ReferenceDate::Latest);
        }
        NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .map(ReferenceDate::Fixed)
            .map_err(|e| format!("expected YYYY-MM-DD or 'latest': {e}"))
    }
}

impl fmt::Display for ReferenceDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReferenceDate::Fixed(date) => write!(f, "{}", date.format("%Y-%m-%d")),
            ReferenceDate::Latest => f.write_str("latest"),
        }
    }
}

/// Knobs for the group comparison.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ComparatorSettings {
    pub high_quantile: f64,
    pub low_quantile: f64,
    pub reference: ReferenceDate,
    pub significance: f64,
}

impl Default for ComparatorSettings {
    fn default() -> Self {
        Self {
            high_quantile: 0.8,
            low_quantile: 0.2,
            reference: ReferenceDate::default(),
            significance: SIGNIFICANCE_THRESHOLD,
        }
    }
}

/// Tax-rate cutoffs for the two groups.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RateThresholds {
    pub high: f64,
    pub low: f64,
}

impl RateThresholds {
    /// Quantile cutoffs over the row-level tax rates.
    pub fn from_observations(
        observations: &[Observation],
        low_quantile: f64,
        high_quantile: f64,
    ) -> Result<Self, ComparatorError> {
        if observations.is_empty() {
            return Err(ComparatorError::EmptyTable);
        }
        if low_quantile >= high_quantile {
            return Err(ComparatorError::InvalidQuantiles {
                low: low_quantile,
                high: high_quantile,
            });
        }

        let rates: Vec<f64> = observations.iter().map(|obs| obs.rate).collect();
        Ok(Self {
            high: StatsCalculator::quantile(&rates, high_quantile)?,
            low: StatsCalculator::quantile(&rates, low_quantile)?,
        })
    }

    pub fn is_high(&self, rate: f64) -> bool {
        rate >= self.high
    }

    pub fn is_low(&self, rate: f64) -> bool {
        rate <= self.low
    }
}

/// Recovery of one state from its trough.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StateDelta {
    pub state: String,
    pub rate: f64,
    pub minimum: f64,
    pub reference: f64,
    pub delta: f64,
}

/// Comparison of one metric between the high and low groups.
#[derive(Debug, Clone, Serialize)]
pub struct MetricComparison {
    pub metric: EmploymentMetric,
    pub thresholds: RateThresholds,
    pub high: GroupStats,
    pub low: GroupStats,
    pub test: TTestResult,
    pub significant: bool,
    pub high_states: Vec<StateDelta>,
    pub low_states: Vec<StateDelta>,
}

/// Result of comparing one metric; failures stay attached to their metric.
#[derive(Debug)]
pub struct MetricOutcome {
    pub metric: EmploymentMetric,
    pub result: Result<MetricComparison, ComparatorError>,
}

/// Runs the per-metric recovery comparison.
pub struct RecoveryComparator {
    settings: ComparatorSettings,
}

impl Default for RecoveryComparator {
    fn default() -> Self {
        Self::new(ComparatorSettings::default())
    }
}

impl RecoveryComparator {
    pub fn new(settings: ComparatorSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &ComparatorSettings {
        &self.settings
    }

    /// Per-state `reference - minimum` over valid readings.
    ///
    /// States with no valid reading on the reference date are left out.
    pub fn recovery_deltas(
        observations: &[Observation],
        reference: ReferenceDate,
    ) -> Vec<StateDelta> {
        #[derive(Default)]
        struct Series {
            rate: f64,
            minimum: Option<f64>,
            reference: Option<(NaiveDate, f64)>,
        }

        let mut by_state: BTreeMap<&str, Series> = BTreeMap::new();

        for (obs, value) in DataProcessor::valid_values(observations) {
            let series = by_state.entry(obs.state.as_str()).or_default();
            series.rate = obs.rate;
            series.minimum = Some(series.minimum.map_or(value, |m| m.min(value)));

            let take = match reference {
                ReferenceDate::Fixed(date) => obs.date == date,
                ReferenceDate::Latest => series
                    .reference
                    .map_or(true, |(seen, _)| obs.date >= seen),
            };
            if take {
                series.reference = Some((obs.date, value));
            }
        }

        by_state
            .into_iter()
            .filter_map(|(state, series)| {
                let (minimum, (_, current)) = match (series.minimum, series.reference) {
                    (Some(minimum), Some(reference)) => (minimum, reference),
                    _ => {
                        debug!(state, %reference, "no valid reading on reference date");
                        return None;
                    }
                };
                Some(StateDelta {
                    state: state.to_string(),
                    rate: series.rate,
                    minimum,
                    reference: current,
                    delta: current - minimum,
                })
            })
            .collect()
    }

    /// Compare recovery of `metric` between high-tax and low-tax states.
    pub fn compare(
        &self,
        df: &DataFrame,
        metric: EmploymentMetric,
    ) -> Result<MetricComparison, ComparatorError> {
        let observations = DataProcessor::observations(df, metric)?;
        self.compare_observations(metric, &observations)
    }

    /// Same as [`compare`](Self::compare) over already extracted rows.
    pub fn compare_observations(
        &self,
        metric: EmploymentMetric,
        observations: &[Observation],
    ) -> Result<MetricComparison, ComparatorError> {
        let thresholds = RateThresholds::from_observations(
            observations,
            self.settings.low_quantile,
            self.settings.high_quantile,
        )?;

        let (high_states, low_states) =
            Self::recovery_deltas(observations, self.settings.reference)
                .into_iter()
                .fold((Vec::new(), Vec::new()), |(mut high, mut low), delta| {
                    if thresholds.is_high(delta.rate) {
                        high.push(delta.clone());
                    }
                    if thresholds.is_low(delta.rate) {
                        low.push(delta);
                    }
                    (high, low)
                });

        let high_deltas: Vec<f64> = high_states.iter().map(|d| d.delta).collect();
        let low_deltas: Vec<f64> = low_states.iter().map(|d| d.delta).collect();

        debug!(
            %metric,
            high_threshold = thresholds.high,
            low_threshold = thresholds.low,
            high = high_deltas.len(),
            low = low_deltas.len(),
            "partitioned states"
        );

        let test = StatsCalculator::welch_t_test(&high_deltas, &low_deltas)?;
        let significant = test.is_significant(self.settings.significance);

        Ok(MetricComparison {
            metric,
            thresholds,
            high: StatsCalculator::compute_descriptive_stats(&high_deltas),
            low: StatsCalculator::compute_descriptive_stats(&low_deltas),
            test,
            significant,
            high_states,
            low_states,
        })
    }

    /// Compare every metric in parallel. One metric failing does not stop
    /// the others.
    pub fn compare_all(
        &self,
        df: &DataFrame,
        metrics: &[EmploymentMetric],
    ) -> Vec<MetricOutcome> {
        let outcomes: Vec<MetricOutcome> = metrics
            .par_iter()
            .map(|&metric| MetricOutcome {
                metric,
                result: self.compare(df, metric),
            })
            .collect();

        for outcome in &outcomes {
            match &outcome.result {
                Ok(comparison) => info!(
                    metric = %outcome.metric,
                    p_value = comparison.test.p_value,
                    significant = comparison.significant,
                    "t-test complete"
                ),
                Err(err) => warn!(metric = %outcome.metric, error = %err, "t-test failed"),
            }
        }

        outcomes
    }
}
