//! Voltage-vs-time measurement series with spline interpolation and plotting.
//!
//! ```no_run
//! use voltage_data::{PlotOptions, VoltageData};
//!
//! let data = VoltageData::from_file("data/sample_data_file.txt")?;
//! println!("{data}");
//! let halfway = data.evaluate(0.5);
//! let png = data.plot(&PlotOptions { draw_spline: true, ..PlotOptions::default() })?;
//! # let _ = (halfway, png);
//! # Ok::<(), voltage_data::VoltageDataError>(())
//! ```
pub mod drivers;
pub use drivers::*;
