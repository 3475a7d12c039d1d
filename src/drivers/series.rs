use std::fmt;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::ops::Index;
use std::path::Path;
use ndarray::{stack, Array1, Array2, ArrayView1, ArrayView2, Axis, Ix1, Slice};
use crate::drivers::source::{read_columns, write_columns, Columns};
use crate::drivers::spline::{CubicSpline, SplineFit};
use crate::drivers::VoltageDataError;
pub const TIME_COLUMN: usize = 0;
pub const VOLTAGE_COLUMN: usize = 1;
pub const ERROR_COLUMN: usize = 2;
/// A sequence of voltage measurements taken at different times.
///
/// Rows are `[time, voltage]` or `[time, voltage, error]`. The table is
/// immutable and the spline through it is fitted once, at construction.
#[derive(Clone)]
pub struct VoltageData {
    table: Array2<f64>,
    spline: CubicSpline,
}
impl VoltageData {
    pub fn new<T, V>(times: T, voltages: V) -> Result<Self, VoltageDataError>
    where
        T: IntoIterator,
        T::Item: Into<f64>,
        V: IntoIterator,
        V::Item: Into<f64>,
    {
        Self::from_columns(times, voltages, None::<Vec<f64>>, SplineFit::default())
    }
    pub fn with_errors<T, V, E>(times: T, voltages: V, errors: E) -> Result<Self, VoltageDataError>
    where
        T: IntoIterator,
        T::Item: Into<f64>,
        V: IntoIterator,
        V::Item: Into<f64>,
        E: IntoIterator,
        E::Item: Into<f64>,
    {
        Self::from_columns(times, voltages, Some(errors), SplineFit::default())
    }
    pub fn from_columns<T, V, E>(
        times: T,
        voltages: V,
        errors: Option<E>,
        fit: SplineFit,
    ) -> Result<Self, VoltageDataError>
    where
        T: IntoIterator,
        T::Item: Into<f64>,
        V: IntoIterator,
        V::Item: Into<f64>,
        E: IntoIterator,
        E::Item: Into<f64>,
    {
        let times: Array1<f64> = times.into_iter().map(Into::into).collect();
        let voltages: Array1<f64> = voltages.into_iter().map(Into::into).collect();
        let errors: Option<Array1<f64>> =
            errors.map(|e| e.into_iter().map(Into::into).collect());
        check_length("voltages", times.len(), voltages.len())?;
        let table = match &errors {
            Some(errors) => {
                check_length("voltage_errors", times.len(), errors.len())?;
                stack(Axis(1), &[times.view(), voltages.view(), errors.view()])?
            }
            None => stack(Axis(1), &[times.view(), voltages.view()])?,
        };
        let spline = CubicSpline::fit(
            times.view(),
            voltages.view(),
            errors.as_ref().map(|e| e.view()),
            fit,
        )?;
        log::debug!(
            "built voltage series: {} rows x {} columns",
            table.nrows(),
            table.ncols()
        );
        Ok(Self { table, spline })
    }
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, VoltageDataError> {
        Self::from_file_with_fit(path, SplineFit::default())
    }
    pub fn from_file_with_fit<P: AsRef<Path>>(
        path: P,
        fit: SplineFit,
    ) -> Result<Self, VoltageDataError> {
        let path = path.as_ref();
        let read_err = |source| VoltageDataError::Read {
            path: path.to_path_buf(),
            source,
        };
        let file = File::open(path).map_err(read_err)?;
        let columns = match read_columns(BufReader::new(file)) {
            Err(VoltageDataError::Io(source)) => return Err(read_err(source)),
            other => other?,
        };
        log::debug!("loaded {} rows from {}", columns.len(), path.display());
        Self::from_parsed(columns, fit)
    }
    pub fn from_reader<R: BufRead>(reader: R) -> Result<Self, VoltageDataError> {
        Self::from_parsed(read_columns(reader)?, SplineFit::default())
    }
    fn from_parsed(columns: Columns, fit: SplineFit) -> Result<Self, VoltageDataError> {
        Self::from_columns(
            columns.times,
            columns.voltages,
            columns.voltage_errors,
            fit,
        )
    }
    pub fn times(&self) -> ArrayView1<'_, f64> {
        self.table.column(TIME_COLUMN)
    }
    pub fn voltages(&self) -> ArrayView1<'_, f64> {
        self.table.column(VOLTAGE_COLUMN)
    }
    /// Fails with `MissingErrorColumn` when the series was built without errors.
    pub fn voltage_errors(&self) -> Result<ArrayView1<'_, f64>, VoltageDataError> {
        if self.has_errors() {
            Ok(self.table.column(ERROR_COLUMN))
        } else {
            Err(VoltageDataError::MissingErrorColumn)
        }
    }
    pub fn has_errors(&self) -> bool {
        self.table.ncols() > ERROR_COLUMN
    }
    pub fn table(&self) -> ArrayView2<'_, f64> {
        self.table.view()
    }
    pub fn spline(&self) -> &CubicSpline {
        &self.spline
    }
    pub fn len(&self) -> usize {
        self.table.nrows()
    }
    pub fn is_empty(&self) -> bool {
        self.table.nrows() == 0
    }
    /// Row at `index`; negative indices count back from the end.
    pub fn row(&self, index: isize) -> Result<ArrayView1<'_, f64>, VoltageDataError> {
        let len = self.len();
        let resolved = if index < 0 { index + len as isize } else { index };
        if resolved < 0 || resolved >= len as isize {
            return Err(VoltageDataError::IndexOutOfRange { index, len });
        }
        Ok(self.table.row(resolved as usize))
    }
    /// Sub-table of the selected rows. Bounds clamp to the table like numpy
    /// slicing; the step follows ndarray's convention.
    pub fn slice_rows(&self, slice: Slice) -> Result<ArrayView2<'_, f64>, VoltageDataError> {
        if slice.step == 0 {
            return Err(VoltageDataError::ZeroStep);
        }
        let len = self.len() as isize;
        let clamp = |i: isize| if i < 0 { (i + len).max(0) } else { i.min(len) };
        let start = clamp(slice.start);
        let end = slice.end.map_or(len, clamp).max(start);
        Ok(self
            .table
            .slice_axis(Axis(0), Slice::new(start, Some(end), slice.step)))
    }
    pub fn iter(&self) -> ndarray::iter::LanesIter<'_, f64, Ix1> {
        self.table.rows().into_iter()
    }
    /// Interpolated voltage at `time`. Outside the sampled range the end
    /// polynomials extrapolate.
    pub fn evaluate(&self, time: f64) -> f64 {
        self.spline.evaluate(time)
    }
    pub fn evaluate_many(&self, times: ArrayView1<f64>) -> Array1<f64> {
        self.spline.evaluate_many(times)
    }
    pub fn write_to<W: std::io::Write>(&self, writer: W) -> Result<(), VoltageDataError> {
        write_columns(self.table.view(), writer)
    }
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), VoltageDataError> {
        let path = path.as_ref();
        let write_err = |source| VoltageDataError::Write {
            path: path.to_path_buf(),
            source,
        };
        let file = File::create(path).map_err(write_err)?;
        match self.write_to(file) {
            Err(VoltageDataError::Io(source)) => return Err(write_err(source)),
            other => other?,
        }
        log::debug!("saved {} rows to {}", self.len(), path.display());
        Ok(())
    }
}
fn check_length(field: &'static str, expected: usize, actual: usize) -> Result<(), VoltageDataError> {
    if expected != actual {
        return Err(VoltageDataError::LengthMismatch {
            field,
            expected,
            actual,
        });
    }
    Ok(())
}
impl Index<(usize, usize)> for VoltageData {
    type Output = f64;
    /// `series[(entry, column)]`; panics when out of bounds.
    fn index(&self, (row, column): (usize, usize)) -> &f64 {
        &self.table[[row, column]]
    }
}
impl<'a> IntoIterator for &'a VoltageData {
    type Item = ArrayView1<'a, f64>;
    type IntoIter = ndarray::iter::LanesIter<'a, f64, Ix1>;
    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
impl fmt::Display for VoltageData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Row -> Time [s], Voltage [mV]")?;
        for (i, row) in self.iter().enumerate() {
            write!(f, "\n{i} -> {:.1}, {:.2}", row[TIME_COLUMN], row[VOLTAGE_COLUMN])?;
            if let Some(error) = row.get(ERROR_COLUMN) {
                write!(f, " +/- {error:.2}")?;
            }
        }
        Ok(())
    }
}
impl fmt::Debug for VoltageData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, row) in self.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            let values: Vec<String> = row.iter().map(|v| format!("{v:?}")).collect();
            write!(f, "{}", values.join(" "))?;
        }
        Ok(())
    }
}
