//! Report Module
//! Collects per-metric outcomes into the printed p-value mapping.

use crate::data::EmploymentMetric;
use crate::stats::{MetricComparison, MetricOutcome};
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Serialize)]
pub struct ReportEntry {
    pub metric: EmploymentMetric,
    pub p_value: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comparison: Option<MetricComparison>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Outcome of every metric comparison in one run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RecoveryReport {
    pub entries: Vec<ReportEntry>,
}

impl RecoveryReport {
    pub fn from_outcomes(outcomes: Vec<MetricOutcome>) -> Self {
        let entries = outcomes
            .into_iter()
            .map(|outcome| match outcome.result {
                Ok(comparison) => ReportEntry {
                    metric: outcome.metric,
                    p_value: Some(comparison.test.p_value),
                    comparison: Some(comparison),
                    error: None,
                },
                Err(err) => ReportEntry {
                    metric: outcome.metric,
                    p_value: None,
                    comparison: None,
                    error: Some(err.to_string()),
                },
            })
            .collect();

        Self { entries }
    }

    /// Metric name -> p-value; failed metrics map to `None`.
    pub fn p_values(&self) -> BTreeMap<&'static str, Option<f64>> {
        self.entries
            .iter()
            .map(|entry| (entry.metric.column(), entry.p_value))
            .collect()
    }

    pub fn failures(&self) -> impl Iterator<Item = &ReportEntry> {
        self.entries.iter().filter(|entry| entry.error.is_some())
    }

    /// Render the p-value mapping, or every entry in full when `detailed`.
    pub fn to_json(&self, detailed: bool) -> serde_json::Result<String> {
        if detailed {
            serde_json::to_string_pretty(&self.entries)
        } else {
            serde_json::to_string_pretty(&self.p_values())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::{ComparatorError, StatsError};

    fn failed(metric: EmploymentMetric) -> MetricOutcome {
        MetricOutcome {
            metric,
            result: Err(ComparatorError::Stats(StatsError::InsufficientSamples {
                group: "low",
                found: 1,
            })),
        }
    }

    #[test]
    fn failures_map_to_null_p_values() {
        let report = RecoveryReport::from_outcomes(vec![
            failed(EmploymentMetric::Combined),
            failed(EmploymentMetric::IncomeHigh),
        ]);

        let p_values = report.p_values();
        assert_eq!(p_values.len(), 2);
        assert_eq!(p_values["emp_combined"], None);
        assert_eq!(report.failures().count(), 2);

        let json: serde_json::Value =
            serde_json::from_str(&report.to_json(false).unwrap()).unwrap();
        assert!(json["emp_combined_inchigh"].is_null());
    }

    #[test]
    fn detailed_json_carries_error_text() {
        let report = RecoveryReport::from_outcomes(vec![failed(EmploymentMetric::IncomeLow)]);
        let json: serde_json::Value =
            serde_json::from_str(&report.to_json(true).unwrap()).unwrap();

        assert_eq!(json[0]["metric"], "emp_combined_inclow");
        assert!(json[0]["error"]
            .as_str()
            .unwrap()
            .contains("at least 2 are required"));
        assert!(json[0].get("comparison").is_none());
    }
}
