//! Historical lake level record used as the forecast baseline.

use std::path::Path;

use chrono::{Datelike, NaiveDate};
use tracing::{debug, info};

use crate::domain::ForecastRecord;
use crate::error::{Error, Result};
use crate::tabular::{self, Table};

pub const DATE_COLUMN: &str = "Date";
pub const DEFAULT_TARGET_COLUMN: &str = "Lake_Level";

/// A raw covariate column after the natural-log transform.
#[derive(Debug, Clone, PartialEq)]
pub struct Covariate {
    pub name: String,
    pub values: Vec<f64>,
}

/// Read-only daily record: dates ascending and unique, no missing values.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoricalDataset {
    target_column: String,
    dates: Vec<NaiveDate>,
    target: Vec<f64>,
    covariates: Vec<Covariate>,
}

impl HistoricalDataset {
    /// Assemble a dataset from columns.
    ///
    /// Rows are sorted by date, covariates are log-transformed and any row
    /// with a NaN (target or transformed covariate) is dropped.
    pub fn from_columns(
        target_column: impl Into<String>,
        dates: Vec<NaiveDate>,
        target: Vec<f64>,
        raw_covariates: Vec<(String, Vec<f64>)>,
    ) -> Result<Self> {
        let target_column = target_column.into();
        let n = dates.len();
        if target.len() != n || raw_covariates.iter().any(|(_, v)| v.len() != n) {
            return Err(Error::Validation(
                "historical columns have different lengths".to_string(),
            ));
        }

        let mut order: Vec<usize> = (0..n).collect();
        order.sort_by_key(|&i| dates[i]);

        let logged: Vec<Vec<f64>> = raw_covariates
            .iter()
            .map(|(_, values)| values.iter().map(|v| v.ln()).collect())
            .collect();

        let keep: Vec<usize> = order
            .into_iter()
            .filter(|&i| !target[i].is_nan() && logged.iter().all(|col| !col[i].is_nan()))
            .collect();

        let sorted_dates: Vec<NaiveDate> = keep.iter().map(|&i| dates[i]).collect();
        if let Some(pair) = sorted_dates.windows(2).find(|w| w[0] == w[1]) {
            return Err(Error::Validation(format!(
                "historical dataset has duplicate date {}",
                pair[0]
            )));
        }

        let dropped = n - keep.len();
        if dropped > 0 {
            debug!(dropped, "dropped historical rows with missing values");
        }

        Ok(Self {
            target: keep.iter().map(|&i| target[i]).collect(),
            covariates: raw_covariates
                .into_iter()
                .zip(logged)
                .map(|((name, _), col)| Covariate {
                    name,
                    values: keep.iter().map(|&i| col[i]).collect(),
                })
                .collect(),
            dates: sorted_dates,
            target_column,
        })
    }

    /// Build from a parsed table with a `Date` column and the target column.
    /// Every other column is treated as a numeric covariate.
    pub fn from_table(table: &Table, target_column: &str) -> Result<Self> {
        let date_col = table.column_index(DATE_COLUMN).ok_or_else(|| {
            Error::Validation(format!("historical data is missing the '{DATE_COLUMN}' column"))
        })?;
        let target_col = table.column_index(target_column).ok_or_else(|| {
            Error::Validation(format!("historical data is missing the '{target_column}' column"))
        })?;

        let mut dates = Vec::with_capacity(table.len());
        for row in 0..table.len() {
            let text = table.cell(row, date_col);
            let date = tabular::parse_date(text).ok_or_else(|| {
                Error::Validation(format!("row {}: unparsable date '{}'", row + 2, text))
            })?;
            dates.push(date);
        }

        let column = |col: usize| -> Vec<f64> {
            (0..table.len())
                .map(|row| tabular::parse_number(table.cell(row, col)))
                .collect()
        };

        let covariates = table
            .headers
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != date_col && *i != target_col)
            .map(|(i, name)| (name.trim().to_string(), column(i)))
            .collect();

        Self::from_columns(target_column, dates, column(target_col), covariates)
    }

    /// Load from a CSV or spreadsheet file.
    pub fn load(path: &Path, target_column: &str) -> Result<Self> {
        let table = tabular::read_table(path)?;
        let dataset = Self::from_table(&table, target_column)?;
        info!(
            path = %path.display(),
            rows = dataset.len(),
            covariates = dataset.covariates.len(),
            first = ?dataset.first_date(),
            last = ?dataset.max_date(),
            "historical dataset loaded"
        );
        Ok(dataset)
    }

    pub fn target_column(&self) -> &str {
        &self.target_column
    }

    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn target(&self) -> &[f64] {
        &self.target
    }

    pub fn covariates(&self) -> &[Covariate] {
        &self.covariates
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.dates.first().copied()
    }

    /// Latest date in the record (`max_date_train`).
    pub fn max_date(&self) -> Option<NaiveDate> {
        self.dates.last().copied()
    }

    pub fn min_year(&self) -> Option<i32> {
        self.first_date().map(|d| d.year())
    }

    /// Target values for `start..=end`.
    pub fn slice(&self, start: NaiveDate, end: NaiveDate) -> Vec<ForecastRecord> {
        let lo = self.dates.partition_point(|d| *d < start);
        let hi = self.dates.partition_point(|d| *d <= end);
        (lo..hi.max(lo))
            .map(|i| ForecastRecord {
                date: self.dates[i],
                value: self.target[i],
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn test_from_table_sorts_logs_and_drops() {
        let csv = "Date,Lake_Level,Rainfall\n\
                   2020-01-03,3.0,1.0\n\
                   2020-01-01,1.0,2.718281828459045\n\
                   2020-01-02,2.0,-1.0\n\
                   2020-01-04,,5.0\n";
        let table = tabular::read_csv(csv.as_bytes(), "levels.csv").unwrap();
        let ds = HistoricalDataset::from_table(&table, DEFAULT_TARGET_COLUMN).unwrap();

        // negative covariate -> NaN after log, blank target -> NaN: both dropped
        assert_eq!(ds.dates(), &[d(2020, 1, 1), d(2020, 1, 3)]);
        assert_eq!(ds.target(), &[1.0, 3.0]);
        assert_eq!(ds.covariates()[0].name, "Rainfall");
        assert_relative_eq!(ds.covariates()[0].values[0], 1.0, epsilon = 1e-12);
        assert_eq!(ds.covariates()[0].values[1], 0.0);
        assert_eq!(ds.max_date(), Some(d(2020, 1, 3)));
    }

    #[test]
    fn test_zero_covariate_is_kept_as_negative_infinity() {
        let ds = HistoricalDataset::from_columns(
            "Lake_Level",
            vec![d(2020, 1, 1)],
            vec![1.0],
            vec![("Evaporation".to_string(), vec![0.0])],
        )
        .unwrap();
        assert_eq!(ds.len(), 1);
        assert_eq!(ds.covariates()[0].values[0], f64::NEG_INFINITY);
    }

    #[test]
    fn test_missing_target_column() {
        let table = tabular::read_csv("Date,Level\n2020-01-01,1\n".as_bytes(), "x.csv").unwrap();
        let err = HistoricalDataset::from_table(&table, DEFAULT_TARGET_COLUMN).unwrap_err();
        assert!(err.to_string().contains("Lake_Level"));
    }

    #[test]
    fn test_slice_is_inclusive() {
        let dates: Vec<NaiveDate> = (1..=5).map(|day| d(2020, 1, day)).collect();
        let ds = HistoricalDataset::from_columns(
            "Lake_Level",
            dates,
            vec![1.0, 2.0, 3.0, 4.0, 5.0],
            Vec::new(),
        )
        .unwrap();
        let slice = ds.slice(d(2020, 1, 2), d(2020, 1, 4));
        assert_eq!(slice.len(), 3);
        assert_eq!(slice[0].value, 2.0);
        assert_eq!(slice[2].date, d(2020, 1, 4));
        assert!(ds.slice(d(2021, 1, 1), d(2021, 2, 1)).is_empty());
    }
}
