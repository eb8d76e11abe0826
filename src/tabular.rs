//! Tabular file readers for CSV and spreadsheet input.
//!
//! Everything is read into a header + text-cell table first; callers then
//! parse the columns they need with [`parse_date`] and [`parse_number`].

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use chrono::{NaiveDate, NaiveDateTime};

use crate::domain::{Observation, TimeSeries};
use crate::error::{Error, Result};

/// Supported input formats, chosen by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableFormat {
    Csv,
    Spreadsheet,
}

impl TableFormat {
    /// Detect the format from a file name. Unknown extensions are rejected
    /// with a message naming the file.
    pub fn from_file_name(name: &str) -> Result<Self> {
        let lower = name.to_ascii_lowercase();
        if lower.ends_with(".csv") {
            Ok(Self::Csv)
        } else if [".xlsx", ".xls", ".xlsm", ".ods"]
            .iter()
            .any(|ext| lower.ends_with(ext))
        {
            Ok(Self::Spreadsheet)
        } else {
            Err(Error::Validation(format!(
                "unsupported file format for '{name}': expected .csv, .xlsx or .xls"
            )))
        }
    }
}

/// Header row plus text cells.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h.trim() == name)
    }

    pub fn cell(&self, row: usize, col: usize) -> &str {
        self.rows
            .get(row)
            .and_then(|r| r.get(col))
            .map(String::as_str)
            .unwrap_or("")
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Read a CSV or spreadsheet file into a [`Table`].
pub fn read_table(path: &Path) -> Result<Table> {
    let name = display_name(path);
    match TableFormat::from_file_name(&name)? {
        TableFormat::Csv => {
            let file = File::open(path)
                .map_err(|e| Error::Validation(format!("error reading file '{name}': {e}")))?;
            read_csv(BufReader::new(file), &name)
        }
        TableFormat::Spreadsheet => read_spreadsheet(path, &name),
    }
}

/// Parse CSV text from any reader. `name` is only used in error messages.
pub fn read_csv<R: Read>(reader: R, name: &str) -> Result<Table> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = reader
        .headers()
        .map_err(|e| Error::Validation(format!("error reading file '{name}': {e}")))?
        .iter()
        .map(str::to_string)
        .collect();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record =
            record.map_err(|e| Error::Validation(format!("error reading file '{name}': {e}")))?;
        rows.push(record.iter().map(str::to_string).collect());
    }

    Ok(Table { headers, rows })
}

#[cfg(feature = "spreadsheet")]
fn read_spreadsheet(path: &Path, name: &str) -> Result<Table> {
    use calamine::{open_workbook_auto, Data, DataType, Reader};

    let mut workbook = open_workbook_auto(path)
        .map_err(|e| Error::Validation(format!("error reading file '{name}': {e}")))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| Error::Validation(format!("error reading file '{name}': workbook has no sheets")))?
        .map_err(|e| Error::Validation(format!("error reading file '{name}': {e}")))?;

    let cell_text = |cell: &Data| -> String {
        match cell {
            Data::Empty => String::new(),
            Data::String(s) => s.trim().to_string(),
            Data::Float(f) => f.to_string(),
            Data::Int(i) => i.to_string(),
            Data::DateTime(_) | Data::DateTimeIso(_) => cell
                .as_datetime()
                .map(|dt| dt.date().to_string())
                .unwrap_or_default(),
            other => other.to_string(),
        }
    };

    let mut rows = range.rows();
    let headers = rows
        .next()
        .map(|r| r.iter().map(cell_text).collect())
        .unwrap_or_default();
    let rows = rows.map(|r| r.iter().map(cell_text).collect()).collect();

    Ok(Table { headers, rows })
}

#[cfg(not(feature = "spreadsheet"))]
fn read_spreadsheet(_path: &Path, name: &str) -> Result<Table> {
    Err(Error::Validation(format!(
        "unsupported file format for '{name}': spreadsheet support is not enabled"
    )))
}

/// Read a dated series: first column is the date index, last column the value.
///
/// Rows whose value cell is empty or non-numeric carry NaN.
pub fn read_series_file(path: &Path) -> Result<TimeSeries> {
    let name = display_name(path);
    let table = read_table(path)?;
    series_from_table(&table, &name)
}

/// Interpret a [`Table`] as a dated series (first column dates, last column values).
pub fn series_from_table(table: &Table, name: &str) -> Result<TimeSeries> {
    if table.headers.len() < 2 {
        return Err(Error::Validation(format!(
            "file '{name}' needs a date column and at least one value column"
        )));
    }
    let value_col = table.headers.len() - 1;

    let mut points = Vec::with_capacity(table.len());
    for (i, row) in table.rows.iter().enumerate() {
        if row.iter().all(|c| c.is_empty()) {
            continue;
        }
        let date = parse_date(table.cell(i, 0)).ok_or_else(|| {
            Error::Validation(format!(
                "file '{name}', row {}: first column '{}' is not a parsable date",
                i + 2,
                table.cell(i, 0)
            ))
        })?;
        points.push(Observation::new(date, parse_number(table.cell(i, value_col))));
    }

    TimeSeries::new(points)
        .map_err(|e| Error::Validation(format!("file '{name}': {e}")))
}

/// Parse `YYYY-MM-DD`, optionally followed by a time component, or `MM/DD/YYYY`.
pub fn parse_date(text: &str) -> Option<NaiveDate> {
    let text = text.trim();
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .or_else(|| {
            ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S%.f"]
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
                .map(|dt| dt.date())
        })
        .or_else(|| NaiveDate::parse_from_str(text, "%m/%d/%Y").ok())
}

/// Parse a numeric cell. Empty or unparsable text is NaN.
pub fn parse_number(text: &str) -> f64 {
    text.trim().parse::<f64>().unwrap_or(f64::NAN)
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
