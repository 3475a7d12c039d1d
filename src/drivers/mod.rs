// src/drivers/mod.rs
pub mod config;
pub mod error;
pub mod plot;
pub mod series;
pub mod source;
pub mod spline;
// Re-export the types callers reach for most.
pub use config::PlotConfig;
pub use error::VoltageDataError;
pub use plot::{LineStyle, Marker, PlotOptions, PlotStyle, SPLINE_SAMPLES};
pub use series::VoltageData;
pub use source::{read_columns, write_columns, Columns};
pub use spline::{CubicSpline, SplineFit};
