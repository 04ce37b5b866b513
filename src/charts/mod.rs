//! Charts module - Static chart rendering

mod renderer;

pub use renderer::{BarChartData, ChartOptions, RenderError, StaticChartRenderer, CHART_TITLE};
