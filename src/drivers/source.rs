use std::io::{BufRead, Write};
use ndarray::ArrayView2;
use crate::drivers::VoltageDataError;
/// Columns parsed from a measurement file, in file order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Columns {
    pub times: Vec<f64>,
    pub voltages: Vec<f64>,
    pub voltage_errors: Option<Vec<f64>>,
}
impl Columns {
    pub fn len(&self) -> usize {
        self.times.len()
    }
    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }
    pub fn width(&self) -> usize {
        if self.voltage_errors.is_some() {
            3
        } else {
            2
        }
    }
}
/// Parse whitespace-delimited `time voltage [error]` rows.
///
/// Blank lines and `#` comments are skipped. The first data row fixes the
/// column count; a later row with a different count fails the whole read.
pub fn read_columns<R: BufRead>(reader: R) -> Result<Columns, VoltageDataError> {
    let mut columns = Columns::default();
    let mut width = None;
    for (idx, line) in reader.lines().enumerate() {
        let line_no = idx + 1;
        let line = line?;
        let content = line.split('#').next().unwrap_or_default().trim();
        if content.is_empty() {
            continue;
        }
        let fields = content
            .split_whitespace()
            .map(|field| {
                field.parse::<f64>().map_err(|_| VoltageDataError::Parse {
                    line: line_no,
                    message: format!("'{field}' is not a number"),
                })
            })
            .collect::<Result<Vec<f64>, _>>()?;
        match width {
            None => {
                if !(2..=3).contains(&fields.len()) {
                    return Err(VoltageDataError::Parse {
                        line: line_no,
                        message: format!("expected 2 or 3 columns, found {}", fields.len()),
                    });
                }
                if fields.len() == 3 {
                    columns.voltage_errors = Some(Vec::new());
                }
                width = Some(fields.len());
            }
            Some(expected) if expected != fields.len() => {
                return Err(VoltageDataError::Parse {
                    line: line_no,
                    message: format!("expected {expected} columns, found {}", fields.len()),
                });
            }
            Some(_) => {}
        }
        columns.times.push(fields[0]);
        columns.voltages.push(fields[1]);
        if let Some(errors) = columns.voltage_errors.as_mut() {
            errors.push(fields[2]);
        }
    }
    if columns.is_empty() {
        return Err(VoltageDataError::NoData);
    }
    log::debug!(
        "parsed {} rows with {} columns",
        columns.len(),
        columns.width()
    );
    Ok(columns)
}
/// Write a table back in the format `read_columns` accepts.
pub fn write_columns<W: Write>(table: ArrayView2<f64>, writer: W) -> Result<(), VoltageDataError> {
    let mut w = std::io::BufWriter::new(writer);
    for row in table.rows() {
        let line = row
            .iter()
            .map(|v| v.to_string())
            .collect::<Vec<_>>()
            .join(" ");
        writeln!(w, "{line}")?;
    }
    w.flush()?;
    Ok(())
}
