//! Data Processor Module
//! Turns the unified state table into typed observations for one metric.

use super::loader::{RATE_COLUMN, STATE_KEY};
use super::metric::EmploymentMetric;
use chrono::NaiveDate;
use polars::prelude::*;
use thiserror::Error;

/// Marker the employment table uses for suppressed or unavailable values.
pub const MISSING_SENTINEL: &str = ".";

#[derive(Error, Debug)]
pub enum ProcessorError {
    #[error("Polars error: {0}")]
    PolarsError(#[from] PolarsError),
    #[error("unified table has no '{0}' column")]
    MissingColumn(String),
    #[error("non-numeric value '{value}' in {column} for {state}")]
    NonNumericValue {
        column: String,
        state: String,
        value: String,
    },
    #[error("null value in {column} at row {row}")]
    NullValue { column: String, row: usize },
    #[error("invalid date {year}-{month}-{day} at row {row}")]
    InvalidDate {
        year: i32,
        month: i32,
        day: i32,
        row: usize,
    },
}

/// A metric reading: numeric, or flagged missing by the source.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MetricValue {
    Value(f64),
    Missing,
}

impl MetricValue {
    /// Classify a raw cell. Nulls and the sentinel are missing; anything else
    /// has to parse as a finite number.
    pub fn parse(raw: Option<&str>) -> Result<Self, String> {
        let Some(raw) = raw.map(str::trim) else {
            return Ok(MetricValue::Missing);
        };
        if raw.is_empty() || raw == MISSING_SENTINEL {
            return Ok(MetricValue::Missing);
        }
        match raw.parse::<f64>() {
            Ok(v) if v.is_finite() => Ok(MetricValue::Value(v)),
            _ => Err(raw.to_string()),
        }
    }

    pub fn value(self) -> Option<f64> {
        match self {
            MetricValue::Value(v) => Some(v),
            MetricValue::Missing => None,
        }
    }
}

/// One row of the unified table, narrowed to a single metric.
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    pub state: String,
    pub rate: f64,
    pub date: NaiveDate,
    pub value: MetricValue,
}

/// Handles extraction and cleaning of the unified table.
pub struct DataProcessor;

impl DataProcessor {
    /// Extract every row of the table as an observation of `metric`.
    ///
    /// Missing markers are kept as [`MetricValue::Missing`] so callers decide
    /// how to exclude them; any other non-numeric cell is an error.
    pub fn observations(
        df: &DataFrame,
        metric: EmploymentMetric,
    ) -> Result<Vec<Observation>, ProcessorError> {
        let states = Self::column(df, STATE_KEY)?.cast(&DataType::String)?;
        let states = states.str()?;
        let rates = Self::column(df, RATE_COLUMN)?.cast(&DataType::Float64)?;
        let rates = rates.f64()?;
        let years = Self::column(df, "year")?.cast(&DataType::Int32)?;
        let years = years.i32()?;
        let months = Self::column(df, "month")?.cast(&DataType::Int32)?;
        let months = months.i32()?;
        let days = Self::column(df, "day")?.cast(&DataType::Int32)?;
        let days = days.i32()?;
        let values = Self::column(df, metric.column())?.cast(&DataType::String)?;
        let values = values.str()?;

        let mut observations = Vec::with_capacity(df.height());

        for row in 0..df.height() {
            let state = states
                .get(row)
                .ok_or_else(|| Self::null(STATE_KEY, row))?
                .to_string();
            let rate = rates.get(row).ok_or_else(|| Self::null(RATE_COLUMN, row))?;
            let year = years.get(row).ok_or_else(|| Self::null("year", row))?;
            let month = months.get(row).ok_or_else(|| Self::null("month", row))?;
            let day = days.get(row).ok_or_else(|| Self::null("day", row))?;

            let date = u32::try_from(month)
                .ok()
                .zip(u32::try_from(day).ok())
                .and_then(|(m, d)| NaiveDate::from_ymd_opt(year, m, d))
                .ok_or(ProcessorError::InvalidDate {
                    year,
                    month,
                    day,
                    row,
                })?;

            let value = MetricValue::parse(values.get(row)).map_err(|value| {
                ProcessorError::NonNumericValue {
                    column: metric.column().to_string(),
                    state: state.clone(),
                    value,
                }
            })?;

            observations.push(Observation {
                state,
                rate,
                date,
                value,
            });
        }

        Ok(observations)
    }

    /// Drop missing readings, leaving `(observation, value)` pairs.
    pub fn valid_values(observations: &[Observation]) -> Vec<(&Observation, f64)> {
        observations
            .iter()
            .filter_map(|obs| obs.value.value().map(|v| (obs, v)))
            .collect()
    }

    fn column<'a>(df: &'a DataFrame, name: &str) -> Result<&'a Column, ProcessorError> {
        df.column(name)
            .map_err(|_| ProcessorError::MissingColumn(name.to_string()))
    }

    fn null(column: &str, row: usize) -> ProcessorError {
        ProcessorError::NullValue {
            column: column.to_string(),
            row,
        }
    }
}
