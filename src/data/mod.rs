//! Data module - CSV loading, joining and metric extraction

mod loader;
mod metric;
mod processor;

pub use loader::{DataLoader, LoaderError, SourcePaths, FIPS_KEY, RATE_COLUMN, STATE_KEY};
pub use metric::EmploymentMetric;
pub use processor::{DataProcessor, MetricValue, Observation, ProcessorError, MISSING_SENTINEL};
