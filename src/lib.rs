//! Tax Recovery - State tax rate vs. employment recovery analysis
//!
//! Joins state tax, employment and geography tables, charts employment for
//! the highest- and lowest-taxed states, and runs Welch t-tests on each
//! state's recovery from its employment trough.

pub mod charts;
pub mod config;
pub mod data;
pub mod report;
pub mod stats;
pub mod telemetry;
