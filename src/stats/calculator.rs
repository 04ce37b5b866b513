//! Statistics Calculator Module
//! Descriptive statistics, NumPy-style quantiles and Welch's t-test.

use serde::Serialize;
use statrs::distribution::{ContinuousCDF, StudentsT};
use thiserror::Error;

/// Default significance threshold for the t-test
pub const SIGNIFICANCE_THRESHOLD: f64 = 0.05;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum StatsError {
    #[error("{group} group has {found} valid sample(s); at least 2 are required")]
    InsufficientSamples { group: &'static str, found: usize },
    #[error("both groups have zero variance; t statistic is undefined")]
    ZeroVariance,
    #[error("invalid t distribution with {degrees_of_freedom} degrees of freedom")]
    Distribution { degrees_of_freedom: f64 },
    #[error("quantile {0} is outside [0, 1]")]
    InvalidQuantile(f64),
    #[error("cannot take a quantile of an empty sample")]
    EmptySample,
}

/// Summary statistics for one sample.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupStats {
    pub count: usize,
    pub mean: f64,
    pub std: f64,
    pub variance: f64,
}

/// Outcome of a two-sample Welch t-test.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TTestResult {
    pub t_statistic: f64,
    pub degrees_of_freedom: f64,
    pub p_value: f64,
}

impl TTestResult {
    pub fn is_significant(&self, alpha: f64) -> bool {
        self.p_value <= alpha
    }
}

/// Handles statistical calculations.
pub struct StatsCalculator;

impl StatsCalculator {
    /// Mean and sample variance (n - 1 denominator).
    pub fn compute_descriptive_stats(values: &[f64]) -> GroupStats {
        let n = values.len();
        if n == 0 {
            return GroupStats {
                count: 0,
                mean: f64::NAN,
                std: f64::NAN,
                variance: f64::NAN,
            };
        }

        let mean = values.iter().sum::<f64>() / n as f64;
        let variance = if n > 1 {
            values.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / (n - 1) as f64
        } else {
            0.0
        };

        GroupStats {
            count: n,
            mean,
            std: variance.sqrt(),
            variance,
        }
    }

    /// Quantile using linear interpolation (NumPy / pandas default).
    pub fn quantile(values: &[f64], q: f64) -> Result<f64, StatsError> {
        if !(0.0..=1.0).contains(&q) {
            return Err(StatsError::InvalidQuantile(q));
        }
        if values.is_empty() {
            return Err(StatsError::EmptySample);
        }

        let mut sorted = values.to_vec();
        sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
        Ok(Self::interpolate_sorted(&sorted, q))
    }

    /// Value at fraction `q` of an ascending, non-empty slice.
    fn interpolate_sorted(sorted: &[f64], q: f64) -> f64 {
        let last = sorted.len() - 1;
        let rank = q * last as f64;
        let lower = rank.floor() as usize;
        let upper = (lower + 1).min(last);
        let frac = rank - lower as f64;

        sorted[lower] + (sorted[upper] - sorted[lower]) * frac
    }

    /// Perform Welch's t-test (independent samples, unequal variance).
    ///
    /// `high` and `low` name the groups in errors.
    pub fn welch_t_test(high: &[f64], low: &[f64]) -> Result<TTestResult, StatsError> {
        if high.len() < 2 {
            return Err(StatsError::InsufficientSamples {
                group: "high",
                found: high.len(),
            });
        }
        if low.len() < 2 {
            return Err(StatsError::InsufficientSamples {
                group: "low",
                found: low.len(),
            });
        }

        let a = Self::compute_descriptive_stats(high);
        let b = Self::compute_descriptive_stats(low);
        let n1 = a.count as f64;
        let n2 = b.count as f64;

        let se2 = a.variance / n1 + b.variance / n2;
        if se2 == 0.0 {
            return Err(StatsError::ZeroVariance);
        }

        let t = (a.mean - b.mean) / se2.sqrt();

        // Welch-Satterthwaite degrees of freedom
        let df_denom =
            (a.variance / n1).powi(2) / (n1 - 1.0) + (b.variance / n2).powi(2) / (n2 - 1.0);
        let df = se2.powi(2) / df_denom;

        // Two-tailed p-value using t-distribution
        let dist = StudentsT::new(0.0, 1.0, df)
            .map_err(|_| StatsError::Distribution {
                degrees_of_freedom: df,
            })?;
        let p_value = (2.0 * (1.0 - dist.cdf(t.abs()))).clamp(0.0, 1.0);

        Ok(TTestResult {
            t_statistic: t,
            degrees_of_freedom: df,
            p_value,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64, tol: f64) -> bool {
        (a - b).abs() < tol
    }

    #[test]
    fn descriptive_stats_use_sample_variance() {
        let values = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        let stats = StatsCalculator::compute_descriptive_stats(&values);
        assert_eq!(stats.count, 8);
        assert!(close(stats.mean, 5.0, 1e-12));
        assert!(close(stats.variance, 32.0 / 7.0, 1e-12));
    }

    #[test]
    fn quantile_matches_numpy_linear_interpolation() {
        let values = [1.0, 2.0, 3.0, 4.0, 5.0];
        // numpy.quantile([1,2,3,4,5], 0.8) == 4.2
        assert!(close(StatsCalculator::quantile(&values, 0.8).unwrap(), 4.2, 1e-12));
        assert!(close(StatsCalculator::quantile(&values, 0.2).unwrap(), 1.8, 1e-12));
        assert_eq!(StatsCalculator::quantile(&[3.0, 1.0], 0.0).unwrap(), 1.0);
        assert_eq!(StatsCalculator::quantile(&[3.0, 1.0], 1.0).unwrap(), 3.0);
        assert_eq!(StatsCalculator::quantile(&[7.5], 0.8).unwrap(), 7.5);
    }

    #[test]
    fn quantile_rejects_bad_input() {
        assert_eq!(
            StatsCalculator::quantile(&[1.0], 1.5),
            Err(StatsError::InvalidQuantile(1.5))
        );
        assert_eq!(
            StatsCalculator::quantile(&[], 0.5),
            Err(StatsError::EmptySample)
        );
    }

    #[test]
    fn separated_groups_are_significant() {
        let high = [10.1, 9.8, 10.3, 9.9, 10.0, 10.2];
        let low = [5.1, 4.8, 5.3, 4.9, 5.0, 5.2];
        let result = StatsCalculator::welch_t_test(&high, &low).unwrap();
        assert!(result.t_statistic > 0.0);
        assert!(result.p_value < SIGNIFICANCE_THRESHOLD);
        assert!(result.is_significant(SIGNIFICANCE_THRESHOLD));
    }

    #[test]
    fn identical_groups_are_not_significant() {
        let sample = [1.0, 2.0, 3.0, 4.0, 5.0];
        let result = StatsCalculator::welch_t_test(&sample, &sample).unwrap();
        assert_eq!(result.t_statistic, 0.0);
        assert!(close(result.p_value, 1.0, 1e-9));
    }

    #[test]
    fn welch_statistic_and_degrees_of_freedom() {
        // t = -2.5 / sqrt(25 / 12) = -sqrt(3), df = 75 / 17
        let a = [1.0, 2.0, 3.0, 4.0];
        let b = [2.0, 4.0, 6.0, 8.0];
        let result = StatsCalculator::welch_t_test(&a, &b).unwrap();
        assert!(close(result.t_statistic, -3f64.sqrt(), 1e-9));
        assert!(close(result.degrees_of_freedom, 75.0 / 17.0, 1e-9));
        assert!(result.p_value > 0.1 && result.p_value < 0.2);
    }

    #[test]
    fn single_sample_groups_are_rejected() {
        assert_eq!(
            StatsCalculator::welch_t_test(&[4.0], &[2.0, 3.0]),
            Err(StatsError::InsufficientSamples {
                group: "high",
                found: 1
            })
        );
        assert_eq!(
            StatsCalculator::welch_t_test(&[4.0, 5.0], &[]),
            Err(StatsError::InsufficientSamples {
                group: "low",
                found: 0
            })
        );
    }

    #[test]
    fn constant_groups_have_no_defined_statistic() {
        assert_eq!(
            StatsCalculator::welch_t_test(&[1.0, 1.0], &[2.0, 2.0]),
            Err(StatsError::ZeroVariance)
        );
    }
}
