use std::path::PathBuf;
use thiserror::Error;
#[derive(Debug, Error)]
pub enum VoltageDataError {
    #[error("length mismatch: {field} has {actual} entries, expected {expected}")]
    LengthMismatch {
        field: &'static str,
        expected: usize,
        actual: usize,
    },
    #[error("cannot stack columns: {0}")]
    Shape(#[from] ndarray::ShapeError),
    #[error("the optional column 'voltage_errors' is not present")]
    MissingErrorColumn,
    #[error("row index {index} is out of range for {len} entries")]
    IndexOutOfRange { index: isize, len: usize },
    #[error("slice step must be non-zero")]
    ZeroStep,
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
    #[error("line {line}: {message}")]
    Parse { line: usize, message: String },
    #[error("input contains no data rows")]
    NoData,
    #[error("cannot fit spline: {0}")]
    Spline(String),
    #[error("failed to render plot: {0}")]
    Plot(String),
    #[error("invalid plot configuration: {0}")]
    Config(#[from] serde_json::Error),
}
impl<E: std::error::Error + Send + Sync + 'static> From<plotters::drawing::DrawingAreaErrorKind<E>>
    for VoltageDataError
{
    fn from(value: plotters::drawing::DrawingAreaErrorKind<E>) -> Self {
        VoltageDataError::Plot(format!("{value:?}"))
    }
}
impl From<image::ImageError> for VoltageDataError {
    fn from(value: image::ImageError) -> Self {
        VoltageDataError::Plot(value.to_string())
    }
}
