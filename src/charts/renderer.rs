//! Static Chart Renderer
//! Draws the employment bar chart comparing the highest- and lowest-taxed
//! states.
//!
//! Layout:
//! 1. Title centered above the plot
//! 2. One red bar per date for the high-tax group
//! 3. A translucent blue bar per date for the low-tax group, drawn on top
//! 4. Legend in the upper right corner

use crate::data::{DataProcessor, EmploymentMetric, Observation, ProcessorError};
use crate::stats::{ComparatorError, RateThresholds};
use chrono::NaiveDate;
use plotters::prelude::*;
use polars::prelude::DataFrame;
use std::collections::BTreeMap;
use std::path::Path;
use thiserror::Error;
use tracing::info;

pub const CHART_TITLE: &str = "COVID Impact on Employment of Top and Bottom Taxed States";

// Bar colors
const HIGH_COLOR: RGBColor = RED;
const LOW_COLOR: RGBColor = BLUE;
const LOW_ALPHA: f64 = 0.3;

#[derive(Error, Debug)]
pub enum RenderError {
    #[error(transparent)]
    Processor(#[from] ProcessorError),
    #[error(transparent)]
    Grouping(#[from] ComparatorError),
    #[error("no valid {0} readings to plot")]
    NoData(EmploymentMetric),
    #[error("failed to draw chart: {0}")]
    Drawing(String),
}

/// Chart settings
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChartOptions {
    pub high_quantile: f64,
    pub low_quantile: f64,
    pub width: u32,
    pub height: u32,
}

impl Default for ChartOptions {
    fn default() -> Self {
        Self {
            high_quantile: 0.9,
            low_quantile: 0.1,
            width: 1200,
            height: 1200,
        }
    }
}

/// Per-date group means for one metric.
#[derive(Debug, Clone, PartialEq)]
pub struct BarChartData {
    pub metric: EmploymentMetric,
    pub dates: Vec<NaiveDate>,
    pub high: Vec<Option<f64>>,
    pub low: Vec<Option<f64>>,
}

impl BarChartData {
    /// Average each group's valid readings per date. Both series share one
    /// sorted date axis; a date with no reading in a group is `None`.
    pub fn from_observations(
        metric: EmploymentMetric,
        observations: &[Observation],
        thresholds: &RateThresholds,
    ) -> Self {
        let mut high: BTreeMap<NaiveDate, (f64, usize)> = BTreeMap::new();
        let mut low: BTreeMap<NaiveDate, (f64, usize)> = BTreeMap::new();

        for (obs, value) in DataProcessor::valid_values(observations) {
            if thresholds.is_high(obs.rate) {
                let entry = high.entry(obs.date).or_insert((0.0, 0));
                entry.0 += value;
                entry.1 += 1;
            }
            if thresholds.is_low(obs.rate) {
                let entry = low.entry(obs.date).or_insert((0.0, 0));
                entry.0 += value;
                entry.1 += 1;
            }
        }

        let mut dates: Vec<NaiveDate> = high.keys().chain(low.keys()).copied().collect();
        dates.sort();
        dates.dedup();

        let mean_on = |series: &BTreeMap<NaiveDate, (f64, usize)>, date: &NaiveDate| {
            series.get(date).map(|(sum, count)| sum / *count as f64)
        };

        Self {
            metric,
            high: dates.iter().map(|d| mean_on(&high, d)).collect(),
            low: dates.iter().map(|d| mean_on(&low, d)).collect(),
            dates,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.high.iter().chain(self.low.iter()).all(Option::is_none)
    }

    /// Y range covering every bar and the zero baseline, with padding.
    pub fn y_range(&self) -> (f64, f64) {
        let (min, max) = self
            .high
            .iter()
            .chain(self.low.iter())
            .flatten()
            .fold((0.0f64, 0.0f64), |(lo, hi), &v| (lo.min(v), hi.max(v)));
        let pad = ((max - min) * 0.05).max(f64::EPSILON);
        (min - pad, max + pad)
    }
}

pub struct StaticChartRenderer;

impl StaticChartRenderer {
    /// Build the chart data for `metric` from the unified table.
    pub fn prepare(
        df: &DataFrame,
        metric: EmploymentMetric,
        options: &ChartOptions,
    ) -> Result<BarChartData, RenderError> {
        let observations = DataProcessor::observations(df, metric)?;
        let thresholds = RateThresholds::from_observations(
            &observations,
            options.low_quantile,
            options.high_quantile,
        )?;
        let data = BarChartData::from_observations(metric, &observations, &thresholds);
        if data.is_empty() {
            return Err(RenderError::NoData(metric));
        }
        Ok(data)
    }

    /// Render the bar chart as a PNG at `output_path`.
    pub fn render_png(
        data: &BarChartData,
        output_path: &Path,
        options: &ChartOptions,
    ) -> Result<(), RenderError> {
        let root =
            BitMapBackend::new(output_path, (options.width, options.height)).into_drawing_area();
        root.fill(&WHITE).map_err(drawing_error)?;

        let n = data.dates.len() as f64;
        let (y_min, y_max) = data.y_range();
        let dates = &data.dates;

        let mut chart = ChartBuilder::on(&root)
            .caption(CHART_TITLE, ("sans-serif", 28).into_font().style(FontStyle::Bold))
            .margin(20)
            .x_label_area_size(60)
            .y_label_area_size(90)
            .build_cartesian_2d(0f64..n, y_min..y_max)
            .map_err(drawing_error)?;

        chart
            .configure_mesh()
            .x_desc("Date")
            .y_desc(data.metric.axis_label())
            .x_labels(12)
            .x_label_formatter(&|x: &f64| {
                let idx = x.floor() as usize;
                dates
                    .get(idx)
                    .map(|d| d.format("%m-%d").to_string())
                    .unwrap_or_default()
            })
            .label_style(("sans-serif", 16))
            .axis_desc_style(("sans-serif", 18))
            .draw()
            .map_err(drawing_error)?;

        chart
            .draw_series(Self::bars(&data.high, HIGH_COLOR.filled()))
            .map_err(drawing_error)?
            .label("Highest Tax")
            .legend(|(x, y)| Rectangle::new([(x, y - 6), (x + 14, y + 6)], HIGH_COLOR.filled()));

        chart
            .draw_series(Self::bars(&data.low, LOW_COLOR.mix(LOW_ALPHA).filled()))
            .map_err(drawing_error)?
            .label("Lowest Tax")
            .legend(|(x, y)| {
                Rectangle::new([(x, y - 6), (x + 14, y + 6)], LOW_COLOR.mix(LOW_ALPHA).filled())
            });

        chart
            .configure_series_labels()
            .position(SeriesLabelPosition::UpperRight)
            .background_style(WHITE.mix(0.8))
            .border_style(BLACK)
            .label_font(("sans-serif", 18))
            .draw()
            .map_err(drawing_error)?;

        root.present().map_err(drawing_error)?;

        info!(
            path = %output_path.display(),
            metric = %data.metric,
            dates = data.dates.len(),
            "rendered employment chart"
        );
        Ok(())
    }

    fn bars(
        values: &[Option<f64>],
        style: ShapeStyle,
    ) -> impl Iterator<Item = Rectangle<(f64, f64)>> + '_ {
        values.iter().enumerate().filter_map(move |(i, v)| {
            v.map(|v| {
                let x = i as f64;
                Rectangle::new([(x + 0.1, 0.0), (x + 0.9, v)], style)
            })
        })
    }
}

fn drawing_error<E: std::fmt::Display>(err: E) -> RenderError {
    RenderError::Drawing(err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::MetricValue;

    fn obs(state: &str, rate: f64, day: u32, value: Option<f64>) -> Observation {
        Observation {
            state: state.to_string(),
            rate,
            date: NaiveDate::from_ymd_opt(2020, 4, day).unwrap(),
            value: value.map_or(MetricValue::Missing, MetricValue::Value),
        }
    }

    fn thresholds() -> RateThresholds {
        RateThresholds {
            high: 9.0,
            low: 2.0,
        }
    }

    #[test]
    fn groups_are_averaged_per_date() {
        let observations = vec![
            obs("A", 9.5, 1, Some(-0.2)),
            obs("B", 9.0, 1, Some(-0.4)),
            obs("C", 1.0, 1, Some(-0.1)),
            obs("A", 9.5, 2, Some(-0.1)),
            obs("B", 9.0, 2, None),
            obs("C", 1.0, 3, Some(0.05)),
            obs("M", 5.0, 1, Some(-0.9)),
        ];

        let data = BarChartData::from_observations(
            EmploymentMetric::Combined,
            &observations,
            &thresholds(),
        );

        assert_eq!(data.dates.len(), 3);
        assert!((data.high[0].unwrap() + 0.3).abs() < 1e-12);
        assert_eq!(data.high[1], Some(-0.1));
        assert_eq!(data.high[2], None);
        assert_eq!(data.low, vec![Some(-0.1), None, Some(0.05)]);
    }

    #[test]
    fn y_range_includes_zero_baseline() {
        let data = BarChartData {
            metric: EmploymentMetric::Combined,
            dates: vec![NaiveDate::from_ymd_opt(2020, 4, 1).unwrap()],
            high: vec![Some(-0.4)],
            low: vec![Some(-0.1)],
        };
        let (lo, hi) = data.y_range();
        assert!(lo < -0.4);
        assert!(hi > 0.0);
    }

    #[test]
    fn all_missing_is_empty() {
        let observations = vec![obs("A", 9.5, 1, None), obs("C", 1.0, 1, None)];
        let data = BarChartData::from_observations(
            EmploymentMetric::IncomeHigh,
            &observations,
            &thresholds(),
        );
        assert!(data.is_empty());
    }

    #[test]
    fn render_png_writes_a_chart_file() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("employment_chart.png");
        let data = BarChartData {
            metric: EmploymentMetric::LeisureHospitality,
            dates: vec![
                NaiveDate::from_ymd_opt(2020, 4, 1).unwrap(),
                NaiveDate::from_ymd_opt(2020, 4, 2).unwrap(),
            ],
            high: vec![Some(-0.4), Some(-0.3)],
            low: vec![Some(-0.2), None],
        };
        let options = ChartOptions {
            width: 400,
            height: 300,
            ..ChartOptions::default()
        };

        StaticChartRenderer::render_png(&data, &output, &options).expect("chart renders");

        let written = std::fs::metadata(&output).expect("png exists");
        assert!(written.len() > 0);
    }
}
