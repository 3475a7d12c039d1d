use std::io::Cursor;
use image::{DynamicImage, ImageBuffer, ImageFormat, Rgb};
use ndarray::Array1;
use plotters::coord::Shift;
use plotters::prelude::*;
use serde::{Deserialize, Serialize};
use crate::drivers::error::VoltageDataError;
use crate::drivers::VoltageData;
/// Number of evenly spaced samples used to draw the spline overlay.
pub const SPLINE_SAMPLES: usize = 100;
pub const TIME_AXIS_LABEL: &str = "T [s]";
pub const VOLTAGE_AXIS_LABEL: &str = "Voltage [mV]";
/// Canvas used when the caller does not supply a drawing area.
#[derive(Clone, Debug)]
pub struct PlotStyle {
    pub width: u32,
    pub height: u32,
    pub background: RGBColor,
    pub foreground: RGBColor,
}
impl Default for PlotStyle {
    fn default() -> Self {
        Self {
            width: 900,
            height: 600,
            background: WHITE,
            foreground: BLACK,
        }
    }
}
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Marker {
    #[default]
    Circle,
    Cross,
    Triangle,
    None,
}
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineStyle {
    #[default]
    None,
    Solid,
    Dashed,
}
/// Per-call styling, the equivalent of keyword plot options.
#[derive(Clone, Debug)]
pub struct PlotOptions {
    pub draw_spline: bool,
    pub marker: Marker,
    pub marker_size: u32,
    pub line_style: LineStyle,
    pub color: RGBColor,
    pub spline_color: RGBColor,
    pub label: String,
    pub caption: Option<String>,
    pub style: PlotStyle,
}
impl Default for PlotOptions {
    fn default() -> Self {
        Self {
            draw_spline: false,
            marker: Marker::default(),
            marker_size: 4,
            line_style: LineStyle::default(),
            color: BLUE,
            spline_color: RED,
            label: "Data".into(),
            caption: None,
            style: PlotStyle::default(),
        }
    }
}
impl VoltageData {
    /// Render onto a fresh canvas sized by `options.style` and return PNG bytes.
    pub fn plot(&self, options: &PlotOptions) -> Result<Vec<u8>, VoltageDataError> {
        let style = &options.style;
        let mut buffer = vec![0u8; (style.width * style.height * 3) as usize];
        {
            let root = BitMapBackend::with_buffer(&mut buffer, (style.width, style.height))
                .into_drawing_area();
            root.fill(&style.background)?;
            self.plot_on(&root, options)?;
            root.present()?;
        }
        encode_png(&buffer, style.width, style.height)
    }
    /// Draw error bars, markers, optional line and spline overlay onto `area`.
    pub fn plot_on<DB>(
        &self,
        area: &DrawingArea<DB, Shift>,
        options: &PlotOptions,
    ) -> Result<(), VoltageDataError>
    where
        DB: DrawingBackend,
        DB::ErrorType: 'static,
    {
        let errors = self.voltage_errors().ok();
        let points: Vec<(f64, f64, f64)> = self
            .times()
            .iter()
            .zip(self.voltages().iter())
            .enumerate()
            .map(|(i, (&t, &v))| (t, v, errors.map_or(0.0, |e| e[i])))
            .collect();
        let t_min = points.iter().map(|p| p.0).fold(f64::INFINITY, f64::min);
        let t_max = points.iter().map(|p| p.0).fold(f64::NEG_INFINITY, f64::max);
        let spline_points: Vec<(f64, f64)> = if options.draw_spline {
            let grid = Array1::linspace(t_min, t_max, SPLINE_SAMPLES);
            let values = self.evaluate_many(grid.view());
            grid.iter().copied().zip(values.iter().copied()).collect()
        } else {
            Vec::new()
        };
        let v_min = points
            .iter()
            .map(|p| p.1 - p.2.abs())
            .chain(spline_points.iter().map(|p| p.1))
            .fold(f64::INFINITY, f64::min);
        let v_max = points
            .iter()
            .map(|p| p.1 + p.2.abs())
            .chain(spline_points.iter().map(|p| p.1))
            .fold(f64::NEG_INFINITY, f64::max);
        let x_range = padded(t_min, t_max);
        let y_range = padded(v_min, v_max);
        let fg = options.style.foreground;
        let color = options.color;
        let mut builder = ChartBuilder::on(area);
        builder
            .margin(10)
            .set_label_area_size(LabelAreaPosition::Left, 60)
            .set_label_area_size(LabelAreaPosition::Bottom, 45);
        if let Some(caption) = &options.caption {
            builder.caption(caption, ("sans-serif", 20).into_font().color(&fg));
        }
        let mut chart = builder.build_cartesian_2d(x_range.0..x_range.1, y_range.0..y_range.1)?;
        chart
            .configure_mesh()
            .x_desc(TIME_AXIS_LABEL)
            .y_desc(VOLTAGE_AXIS_LABEL)
            .axis_desc_style(("sans-serif", 15).into_font().color(&fg))
            .label_style(("sans-serif", 12).into_font().color(&fg))
            .axis_style(&fg)
            .bold_line_style(&fg.mix(0.2))
            .light_line_style(&fg.mix(0.05))
            .draw()?;
        if errors.is_some() {
            chart.draw_series(points.iter().map(|&(t, v, e)| {
                ErrorBar::new_vertical(t, v - e.abs(), v, v + e.abs(), color.stroke_width(1), 6)
            }))?;
        }
        let xy: Vec<(f64, f64)> = points.iter().map(|&(t, v, _)| (t, v)).collect();
        match options.line_style {
            LineStyle::None => {}
            LineStyle::Solid => {
                chart.draw_series(LineSeries::new(xy.iter().copied(), color.stroke_width(1)))?;
            }
            LineStyle::Dashed => {
                chart.draw_series(DashedLineSeries::new(
                    xy.iter().copied(),
                    6,
                    4,
                    color.stroke_width(1),
                ))?;
            }
        }
        let size = options.marker_size;
        match options.marker {
            Marker::None => {}
            Marker::Circle => {
                chart.draw_series(xy.iter().map(|&p| Circle::new(p, size, color.filled())))?;
            }
            Marker::Cross => {
                chart.draw_series(xy.iter().map(|&p| Cross::new(p, size, color.stroke_width(2))))?;
            }
            Marker::Triangle => {
                chart.draw_series(
                    xy.iter()
                        .map(|&p| TriangleMarker::new(p, size, color.filled())),
                )?;
            }
        }
        // Legend entry for the data, drawn once regardless of how many series made it up.
        chart
            .draw_series(std::iter::empty::<PathElement<(f64, f64)>>())?
            .label(options.label.as_str())
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], &color));
        if options.draw_spline {
            let spline_color = options.spline_color;
            chart
                .draw_series(LineSeries::new(spline_points, spline_color.stroke_width(2)))?
                .label("Spline")
                .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], &spline_color));
        }
        chart
            .configure_series_labels()
            .position(SeriesLabelPosition::UpperRight)
            .label_font(("sans-serif", 13).into_font().color(&fg))
            .border_style(&fg.mix(0.4))
            .background_style(&options.style.background.mix(0.8))
            .draw()?;
        Ok(())
    }
}
/// Widen `[lo, hi]` by 5% on each side; degenerate ranges get a unit margin.
fn padded(lo: f64, hi: f64) -> (f64, f64) {
    let span = hi - lo;
    if span.abs() < f64::EPSILON {
        (lo - 1.0, hi + 1.0)
    } else {
        (lo - 0.05 * span, hi + 0.05 * span)
    }
}
fn encode_png(buffer: &[u8], width: u32, height: u32) -> Result<Vec<u8>, VoltageDataError> {
    let image = ImageBuffer::<Rgb<u8>, _>::from_raw(width, height, buffer.to_vec())
        .ok_or_else(|| VoltageDataError::Plot("failed to allocate image buffer".into()))?;
    let mut output = Vec::new();
    let dynamic = DynamicImage::ImageRgb8(image);
    dynamic.write_to(&mut Cursor::new(&mut output), ImageFormat::Png)?;
    Ok(output)
}
#[cfg(test)]
mod tests {
    use super::*;
    const PNG_MAGIC: &[u8] = &[0x89, b'P', b'N', b'G'];
    #[test]
    fn plotting_returns_png() {
        let data =
            VoltageData::with_errors([0, 1, 2, 3, 4], [0.0, 1.0, 0.5, 1.5, 1.0], [0.1; 5]).unwrap();
        let options = PlotOptions {
            draw_spline: true,
            line_style: LineStyle::Dashed,
            color: BLACK,
            caption: Some("Voltage vs time".into()),
            ..PlotOptions::default()
        };
        let png = data.plot(&options).unwrap();
        assert!(png.starts_with(PNG_MAGIC));
    }
    #[test]
    fn plotting_onto_a_supplied_area() {
        let data = VoltageData::new([0, 1, 2, 3], [0, 1, 0, 1]).unwrap();
        let (width, height) = (320u32, 240u32);
        let mut buffer = vec![0u8; (width * height * 3) as usize];
        {
            let root = BitMapBackend::with_buffer(&mut buffer, (width, height)).into_drawing_area();
            root.fill(&WHITE).unwrap();
            let (left, right) = root.split_horizontally(160);
            for (area, marker) in [(left, Marker::Cross), (right, Marker::Triangle)] {
                let options = PlotOptions {
                    marker,
                    line_style: LineStyle::Solid,
                    ..PlotOptions::default()
                };
                data.plot_on(&area, &options).unwrap();
            }
            root.present().unwrap();
        }
        assert!(buffer.iter().any(|&b| b != 255));
    }
    #[test]
    fn padding_handles_flat_ranges() {
        assert_eq!(padded(2.0, 2.0), (1.0, 3.0));
        let (lo, hi) = padded(0.0, 10.0);
        assert!((lo + 0.5).abs() < 1e-12 && (hi - 10.5).abs() < 1e-12);
    }
}
