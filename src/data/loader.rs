//! CSV Data Loader Module
//! Loads the tax, employment and geography tables and joins them per state.

use polars::prelude::*;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};
use ::zip::write::FileOptions;
use ::zip::{CompressionMethod, ZipWriter};

/// Join key between employment and geography tables.
pub const FIPS_KEY: &str = "statefips";
/// Join key between the merged table and the tax table.
pub const STATE_KEY: &str = "statename";
/// Tax rate column used to rank states.
pub const RATE_COLUMN: &str = "combinedRate";

#[derive(Error, Debug)]
pub enum LoaderError {
    #[error("Failed to load CSV: {0}")]
    CsvError(#[from] PolarsError),
    #[error("{source_name} table has no '{column}' column to join on")]
    MissingJoinKey {
        source_name: &'static str,
        column: &'static str,
    },
    #[error("Failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to write zip archive: {0}")]
    Zip(#[from] ::zip::result::ZipError),
}

/// Locations of the three input tables.
#[derive(Debug, Clone)]
pub struct SourcePaths {
    pub tax: PathBuf,
    pub employment: PathBuf,
    pub geography: PathBuf,
}

impl Default for SourcePaths {
    fn default() -> Self {
        Self {
            tax: PathBuf::from("data/state_tax.csv"),
            employment: PathBuf::from("data/state_employment.csv"),
            geography: PathBuf::from("data/geo_state.csv"),
        }
    }
}

/// Loads and joins the state-level tables with Polars.
pub struct DataLoader;

impl DataLoader {
    /// Load a CSV file using Polars.
    pub fn load_csv(file_path: &Path) -> Result<DataFrame, LoaderError> {
        // Use lazy evaluation for memory efficiency, then collect
        let df = LazyCsvReader::new(file_path)
            .with_infer_schema_length(Some(10000))
            .with_ignore_errors(true)
            .finish()?
            .collect()?;

        debug!(
            path = %file_path.display(),
            rows = df.height(),
            columns = df.width(),
            "loaded csv"
        );
        Ok(df)
    }

    /// Load the employment table with every metric cell kept as raw text.
    ///
    /// Inference would turn a word that appears past the inference window
    /// into null, which reads the same as a suppressed cell. Only the join
    /// and date columns are typed here.
    pub fn load_employment_csv(file_path: &Path) -> Result<DataFrame, LoaderError> {
        let mut df = LazyCsvReader::new(file_path)
            .with_infer_schema_length(Some(0))
            .finish()?
            .collect()?;

        for name in [FIPS_KEY, "year", "month", "day"] {
            if df.get_column_index(name).is_some() {
                let typed = df.column(name)?.strict_cast(&DataType::Int64)?;
                df.with_column(typed)?;
            }
        }

        debug!(
            path = %file_path.display(),
            rows = df.height(),
            columns = df.width(),
            "loaded employment csv"
        );
        Ok(df)
    }

    /// Load all three tables and join them into one unified table.
    pub fn load_sources(paths: &SourcePaths) -> Result<DataFrame, LoaderError> {
        let tax = Self::load_csv(&paths.tax)?;
        let employment = Self::load_employment_csv(&paths.employment)?;
        let geography = Self::load_csv(&paths.geography)?;

        let unified = Self::join_sources(employment, geography, tax)?;
        info!(
            rows = unified.height(),
            columns = unified.width(),
            "unified state table ready"
        );
        Ok(unified)
    }

    /// Inner join employment -> geography on the FIPS code, then -> tax on
    /// the state name. Rows for states missing from any table are dropped.
    pub fn join_sources(
        employment: DataFrame,
        geography: DataFrame,
        tax: DataFrame,
    ) -> Result<DataFrame, LoaderError> {
        Self::require_key(&employment, "employment", FIPS_KEY)?;
        Self::require_key(&geography, "geography", FIPS_KEY)?;
        Self::require_key(&geography, "geography", STATE_KEY)?;
        Self::require_key(&tax, "tax", STATE_KEY)?;

        let employment_rows = employment.height();

        let unified = employment
            .lazy()
            .join(
                geography.lazy(),
                [col(FIPS_KEY)],
                [col(FIPS_KEY)],
                JoinArgs::new(JoinType::Inner),
            )
            .join(
                tax.lazy(),
                [col(STATE_KEY)],
                [col(STATE_KEY)],
                JoinArgs::new(JoinType::Inner),
            )
            .collect()?;

        let dropped = employment_rows.saturating_sub(unified.height());
        if dropped > 0 {
            debug!(dropped, "employment rows without a geography or tax match");
        }

        Ok(unified)
    }

    fn require_key(
        df: &DataFrame,
        source_name: &'static str,
        column: &'static str,
    ) -> Result<(), LoaderError> {
        match df.get_column_index(column) {
            Some(_) => Ok(()),
            None => Err(LoaderError::MissingJoinKey {
                source_name,
                column,
            }),
        }
    }

    /// Write the table as a single CSV entry inside a deflate zip archive.
    pub fn write_compressed_csv(
        df: &mut DataFrame,
        zip_path: &Path,
        archive_name: &str,
    ) -> Result<(), LoaderError> {
        let file = File::create(zip_path).map_err(|source| LoaderError::Io {
            path: zip_path.to_path_buf(),
            source,
        })?;
        let mut zip = ZipWriter::new(file);
        let options = FileOptions::default().compression_method(CompressionMethod::Deflated);

        zip.start_file(archive_name, options)?;
        CsvWriter::new(&mut zip).include_header(true).finish(df)?;
        zip.flush().map_err(|source| LoaderError::Io {
            path: zip_path.to_path_buf(),
            source,
        })?;
        zip.finish()?;

        info!(
            path = %zip_path.display(),
            entry = archive_name,
            rows = df.height(),
            "wrote compressed csv"
        );
        Ok(())
    }
}
