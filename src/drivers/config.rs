use std::fs;
use std::path::Path;
use plotters::style::RGBColor;
use serde::{Deserialize, Serialize};
use crate::drivers::plot::{LineStyle, Marker, PlotOptions, PlotStyle};
use crate::drivers::spline::SplineFit;
use crate::drivers::VoltageDataError;
/// JSON-backed plot settings for the command line tool. Missing fields fall
/// back to the defaults below.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlotConfig {
    pub width: u32,
    pub height: u32,
    pub marker: Marker,
    pub marker_size: u32,
    pub line_style: LineStyle,
    pub color: [u8; 3],
    pub draw_spline: bool,
    /// Curvature penalty; `None` keeps the interpolating spline.
    pub smoothing: Option<f64>,
    pub caption: Option<String>,
}
impl Default for PlotConfig {
    fn default() -> Self {
        // Circles joined by a dashed black line, spline on top.
        Self {
            width: 900,
            height: 600,
            marker: Marker::Circle,
            marker_size: 4,
            line_style: LineStyle::Dashed,
            color: [0, 0, 0],
            draw_spline: true,
            smoothing: None,
            caption: None,
        }
    }
}
impl PlotConfig {
    pub fn from_json_str(text: &str) -> Result<Self, VoltageDataError> {
        Ok(serde_json::from_str(text)?)
    }
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, VoltageDataError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| VoltageDataError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&text)
    }
    pub fn spline_fit(&self) -> SplineFit {
        match self.smoothing {
            Some(penalty) => SplineFit::Smoothing { penalty },
            None => SplineFit::Interpolating,
        }
    }
    pub fn plot_options(&self) -> PlotOptions {
        let [r, g, b] = self.color;
        PlotOptions {
            draw_spline: self.draw_spline,
            marker: self.marker,
            marker_size: self.marker_size,
            line_style: self.line_style,
            color: RGBColor(r, g, b),
            caption: self.caption.clone(),
            style: PlotStyle {
                width: self.width,
                height: self.height,
                ..PlotStyle::default()
            },
            ..PlotOptions::default()
        }
    }
}
