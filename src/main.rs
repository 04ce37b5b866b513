//! Tax Recovery - command-line entry point

use anyhow::{Context, Result};
use clap::Parser;
use tax_recovery::charts::StaticChartRenderer;
use tax_recovery::config::Cli;
use tax_recovery::data::{DataLoader, EmploymentMetric};
use tax_recovery::report::RecoveryReport;
use tax_recovery::stats::RecoveryComparator;
use tax_recovery::telemetry;
use tracing::{info, warn};

fn main() -> Result<()> {
    let cli = Cli::parse();
    telemetry::init(&cli.log_level)?;
    cli.validate()?;

    let paths = cli.source_paths();
    info!(
        tax = %paths.tax.display(),
        employment = %paths.employment.display(),
        geography = %paths.geography.display(),
        "loading state tables"
    );
    let mut unified = DataLoader::load_sources(&paths).context("loading input tables")?;

    if cli.make_csv {
        DataLoader::write_compressed_csv(&mut unified, &cli.csv_out, "out.csv")
            .with_context(|| format!("writing {}", cli.csv_out.display()))?;
    }

    if !cli.no_chart {
        let options = cli.chart_options();
        let chart = StaticChartRenderer::prepare(&unified, cli.metric, &options)
            .with_context(|| format!("preparing {} chart", cli.metric))?;
        StaticChartRenderer::render_png(&chart, &cli.chart_out, &options)
            .with_context(|| format!("rendering {}", cli.chart_out.display()))?;

        if cli.show {
            if let Err(err) = open::that(&cli.chart_out) {
                warn!(error = %err, "could not open chart viewer");
            }
        }
    }

    let comparator = RecoveryComparator::new(cli.comparator_settings());
    info!(
        reference = %comparator.settings().reference,
        high_quantile = comparator.settings().high_quantile,
        low_quantile = comparator.settings().low_quantile,
        "comparing recovery of high- and low-tax states"
    );
    let outcomes = comparator.compare_all(&unified, &EmploymentMetric::ALL);
    let report = RecoveryReport::from_outcomes(outcomes);

    let failed = report.failures().count();
    if failed > 0 {
        warn!(failed, "some metrics could not be tested");
    }

    println!("{}", report.to_json(cli.detailed)?);
    Ok(())
}
