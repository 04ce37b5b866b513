//! Command-line configuration.
//!
//! Every flag has a default, so a bare run loads the three tables from
//! `data/`, plots leisure and hospitality employment, and prints the
//! p-value of every metric.

use crate::charts::ChartOptions;
use crate::data::{EmploymentMetric, SourcePaths};
use crate::stats::{ComparatorSettings, ReferenceDate, SIGNIFICANCE_THRESHOLD};
use clap::Parser;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("--{flag} must be within [0, 1], got {value}")]
    QuantileOutOfRange { flag: &'static str, value: f64 },
    #[error("--low-quantile ({low}) must be below --high-quantile ({high})")]
    QuantileOrder { low: f64, high: f64 },
    #[error("--significance must be within (0, 1), got {0}")]
    Significance(f64),
}

#[derive(Parser, Debug, Clone)]
#[command(
    name = "tax_recovery",
    about = "Compare employment recovery between high-tax and low-tax U.S. states",
    version
)]
pub struct Cli {
    /// State tax table (statename, combinedRate)
    #[arg(long, default_value = "data/state_tax.csv")]
    pub tax: PathBuf,
    /// Daily state employment table (statefips, year, month, day, emp_*)
    #[arg(long, default_value = "data/state_employment.csv")]
    pub employment: PathBuf,
    /// State FIPS code to name lookup (statefips, statename)
    #[arg(long, default_value = "data/geo_state.csv")]
    pub geography: PathBuf,

    /// Write the unified table as a zipped CSV
    #[arg(long)]
    pub make_csv: bool,
    /// Zip archive path for --make-csv
    #[arg(long, default_value = "out.zip")]
    pub csv_out: PathBuf,

    /// Employment metric to plot
    #[arg(long, value_enum, default_value = "emp_combined_ss70")]
    pub metric: EmploymentMetric,
    /// PNG path for the chart
    #[arg(long, default_value = "employment_chart.png")]
    pub chart_out: PathBuf,
    /// Skip rendering the chart
    #[arg(long)]
    pub no_chart: bool,
    /// Chart width in pixels
    #[arg(long, default_value_t = 1200)]
    pub chart_width: u32,
    /// Chart height in pixels
    #[arg(long, default_value_t = 1200)]
    pub chart_height: u32,
    /// Open the rendered chart in the system viewer
    #[arg(long, conflicts_with = "no_chart")]
    pub show: bool,

    /// Date compared against each state's minimum (YYYY-MM-DD or "latest")
    #[arg(long, default_value = "2020-09-01")]
    pub reference_date: ReferenceDate,
    /// Tax-rate quantile at or above which a state is "high tax"
    #[arg(long, default_value_t = 0.8)]
    pub high_quantile: f64,
    /// Tax-rate quantile at or below which a state is "low tax"
    #[arg(long, default_value_t = 0.2)]
    pub low_quantile: f64,
    /// Significance level for the t-tests
    #[arg(long, default_value_t = SIGNIFICANCE_THRESHOLD)]
    pub significance: f64,

    /// Print every comparison in full instead of just p-values
    #[arg(long)]
    pub detailed: bool,
    /// Log filter used when RUST_LOG is unset
    #[arg(long, default_value = "info")]
    pub log_level: String,
}

impl Cli {
    /// Check numeric flags that clap cannot range-check on its own.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (flag, value) in [
            ("high-quantile", self.high_quantile),
            ("low-quantile", self.low_quantile),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::QuantileOutOfRange { flag, value });
            }
        }
        if self.low_quantile >= self.high_quantile {
            return Err(ConfigError::QuantileOrder {
                low: self.low_quantile,
                high: self.high_quantile,
            });
        }
        if !(self.significance > 0.0 && self.significance < 1.0) {
            return Err(ConfigError::Significance(self.significance));
        }
        Ok(())
    }

    pub fn source_paths(&self) -> SourcePaths {
        SourcePaths {
            tax: self.tax.clone(),
            employment: self.employment.clone(),
            geography: self.geography.clone(),
        }
    }

    pub fn comparator_settings(&self) -> ComparatorSettings {
        ComparatorSettings {
            high_quantile: self.high_quantile,
            low_quantile: self.low_quantile,
            reference: self.reference_date,
            significance: self.significance,
        }
    }

    pub fn chart_options(&self) -> ChartOptions {
        ChartOptions {
            width: self.chart_width,
            height: self.chart_height,
            ..ChartOptions::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_reproduce_the_stock_run() {
        let cli = Cli::try_parse_from(["tax_recovery"]).unwrap();
        assert_eq!(cli.tax, PathBuf::from("data/state_tax.csv"));
        assert_eq!(cli.employment, PathBuf::from("data/state_employment.csv"));
        assert_eq!(cli.geography, PathBuf::from("data/geo_state.csv"));
        assert_eq!(cli.metric, EmploymentMetric::LeisureHospitality);
        assert!(!cli.make_csv);
        assert_eq!(cli.comparator_settings(), ComparatorSettings::default());
        assert_eq!(cli.validate(), Ok(()));
    }

    #[test]
    fn flags_override_defaults() {
        let cli = Cli::try_parse_from([
            "tax_recovery",
            "--metric",
            "emp_combined_inclow",
            "--reference-date",
            "latest",
            "--high-quantile",
            "0.9",
            "--make-csv",
        ])
        .unwrap();
        assert_eq!(cli.metric, EmploymentMetric::IncomeLow);
        assert_eq!(cli.reference_date, ReferenceDate::Latest);
        assert_eq!(cli.comparator_settings().high_quantile, 0.9);
        assert!(cli.make_csv);
    }

    #[test]
    fn bad_quantiles_fail_validation() {
        let cli = Cli::try_parse_from(["tax_recovery", "--low-quantile", "0.9"]).unwrap();
        assert_eq!(
            cli.validate(),
            Err(ConfigError::QuantileOrder {
                low: 0.9,
                high: 0.8
            })
        );

        let cli = Cli::try_parse_from(["tax_recovery", "--high-quantile", "1.5"]).unwrap();
        assert!(matches!(
            cli.validate(),
            Err(ConfigError::QuantileOutOfRange {
                flag: "high-quantile",
                ..
            })
        ));
    }

    #[test]
    fn show_conflicts_with_no_chart() {
        assert!(Cli::try_parse_from(["tax_recovery", "--show", "--no-chart"]).is_err());
    }

    #[test]
    fn malformed_reference_date_is_rejected() {
        assert!(Cli::try_parse_from(["tax_recovery", "--reference-date", "Sept 1"]).is_err());
    }
}
