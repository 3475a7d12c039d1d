// src/main.rs
use std::fs;
use std::path::PathBuf;
use anyhow::Context;
use clap::Parser;
use voltage_data::{PlotConfig, SplineFit, VoltageData};
/// Load a voltage-vs-time measurement file and render it to PNG.
#[derive(Debug, Parser)]
#[command(name = "voltage-plot", version, about)]
struct Args {
    /// Whitespace-delimited file with `time voltage [error]` rows.
    input: PathBuf,
    /// Where to write the rendered figure.
    #[arg(short, long, default_value = "Voltage_vs_time.png")]
    output: PathBuf,
    /// JSON plot configuration; see `PlotConfig` for the fields.
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Skip the spline overlay.
    #[arg(long)]
    no_spline: bool,
    /// Fit a smoothing spline with this curvature penalty instead of interpolating.
    #[arg(long)]
    smoothing: Option<f64>,
    /// Print the table before plotting.
    #[arg(long)]
    print: bool,
}
fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();
    let mut config = match &args.config {
        Some(path) => PlotConfig::from_json_file(path)
            .with_context(|| format!("loading plot config {}", path.display()))?,
        None => PlotConfig::default(),
    };
    if args.no_spline {
        config.draw_spline = false;
    }
    if args.smoothing.is_some() {
        config.smoothing = args.smoothing;
    }
    let fit: SplineFit = config.spline_fit();
    let data = VoltageData::from_file_with_fit(&args.input, fit)
        .with_context(|| format!("loading measurements from {}", args.input.display()))?;
    log::info!(
        "loaded {} samples from {} (errors: {})",
        data.len(),
        args.input.display(),
        data.has_errors()
    );
    if args.print {
        println!("{data}");
    }
    let png = data
        .plot(&config.plot_options())
        .context("rendering plot")?;
    fs::write(&args.output, png)
        .with_context(|| format!("writing {}", args.output.display()))?;
    log::info!("wrote {}", args.output.display());
    Ok(())
}
