//! Stats module - quantiles, Welch's t-test and the recovery comparison

mod calculator;
mod recovery;

pub use calculator::{GroupStats, StatsCalculator, StatsError, TTestResult, SIGNIFICANCE_THRESHOLD};
pub use recovery::{
    ComparatorError, ComparatorSettings, MetricComparison, MetricOutcome, RateThresholds,
    RecoveryComparator, ReferenceDate, StateDelta,
};
