//! Feature engineering for the recursive lake level forecaster
//!
//! Builds the calendar, one-hot and lagged-target columns the ensemble was
//! trained on, for the future dates that need predictions.

use std::collections::{BTreeSet, HashMap};

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::domain::HistoricalDataset;
use crate::error::{Error, Result};

/// Calendar attributes of a single day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarFeatures {
    /// Month (1-12)
    pub month: u32,
    /// Day of week (0=Monday, 6=Sunday)
    pub day_of_week: u32,
    /// Day of month (1-31)
    pub day: u32,
    /// Quarter (1-4)
    pub quarter: u32,
    /// ISO week number (1-53)
    pub week: u32,
    /// Calendar years since the first year of the historical record
    pub years_since_min: i32,
    /// Saturday or Sunday
    pub weekend: bool,
}

impl CalendarFeatures {
    pub fn from_date(date: NaiveDate, min_year: i32) -> Self {
        let day_of_week = date.weekday().num_days_from_monday();
        Self {
            month: date.month(),
            day_of_week,
            day: date.day(),
            quarter: (date.month() - 1) / 3 + 1,
            week: date.iso_week().week(),
            years_since_min: date.year() - min_year,
            weekend: day_of_week >= 5,
        }
    }
}

/// Name of the lagged-target column for a target column.
pub fn lag_column(target_column: &str) -> String {
    format!("lag_{target_column}")
}

/// Shift `values` forward by `periods` and back-fill the gaps.
///
/// Slot `i` takes `values[i - periods]`; every slot still undefined (NaN)
/// afterwards takes the next defined slot after it. The leading `periods`
/// slots therefore all receive the first defined shifted value, and NaN
/// slots with no defined successor stay NaN.
pub fn shift_backfill(values: &[f64], periods: usize) -> Vec<f64> {
    let n = values.len();
    let mut shifted: Vec<f64> = (0..n)
        .map(|i| if i >= periods { values[i - periods] } else { f64::NAN })
        .collect();

    let mut next = f64::NAN;
    for slot in shifted.iter_mut().rev() {
        if slot.is_nan() {
            *slot = next;
        } else {
            next = *slot;
        }
    }
    shifted
}

/// Engineered feature columns for the future rows of a forecast.
#[derive(Debug, Clone)]
pub struct FeatureTable {
    dates: Vec<NaiveDate>,
    lag_column: String,
    names: Vec<String>,
    index: HashMap<String, usize>,
    columns: Vec<Vec<f64>>,
}

impl FeatureTable {
    /// Engineer features for `future_dates`, which must directly follow the
    /// historical record.
    ///
    /// One-hot columns exist for every value seen across the historical and
    /// future dates together. Covariates are unknown in the future and are
    /// NaN there.
    pub fn engineer(
        historical: &HistoricalDataset,
        future_dates: &[NaiveDate],
        horizon: usize,
    ) -> Result<Self> {
        let min_year = historical.min_year().ok_or_else(|| {
            Error::DataUnavailable("historical dataset is empty".to_string())
        })?;
        let n_future = future_dates.len();
        let calendar: Vec<CalendarFeatures> = future_dates
            .iter()
            .map(|d| CalendarFeatures::from_date(*d, min_year))
            .collect();

        let mut seen_dow = BTreeSet::new();
        let mut seen_month = BTreeSet::new();
        let mut seen_quarter = BTreeSet::new();
        let mut seen_week = BTreeSet::new();
        for date in historical.dates().iter().chain(future_dates) {
            let c = CalendarFeatures::from_date(*date, min_year);
            seen_dow.insert(c.day_of_week);
            seen_month.insert(c.month);
            seen_quarter.insert(c.quarter);
            seen_week.insert(c.week);
        }

        let mut table = Self {
            dates: future_dates.to_vec(),
            lag_column: lag_column(historical.target_column()),
            names: Vec::new(),
            index: HashMap::new(),
            columns: Vec::new(),
        };

        for covariate in historical.covariates() {
            table.push(covariate.name.clone(), vec![f64::NAN; n_future]);
        }
        table.push("years_since_min", calendar.iter().map(|c| c.years_since_min as f64).collect());
        table.push("day", calendar.iter().map(|c| c.day as f64).collect());
        table.push("weekend", calendar.iter().map(|c| if c.weekend { 1.0 } else { 0.0 }).collect());

        table.push_one_hot("dayofweek", &seen_dow, calendar.iter().map(|c| c.day_of_week));
        table.push_one_hot("month", &seen_month, calendar.iter().map(|c| c.month));
        table.push_one_hot("quarter", &seen_quarter, calendar.iter().map(|c| c.quarter));
        table.push_one_hot("week", &seen_week, calendar.iter().map(|c| c.week));

        let mut combined_target = historical.target().to_vec();
        combined_target.resize(historical.len() + n_future, f64::NAN);
        let lag = shift_backfill(&combined_target, horizon).split_off(historical.len());
        table.push(table.lag_column.clone(), lag);

        Ok(table)
    }

    fn push(&mut self, name: impl Into<String>, column: Vec<f64>) {
        let name = name.into();
        self.index.insert(name.clone(), self.columns.len());
        self.names.push(name);
        self.columns.push(column);
    }

    fn push_one_hot(
        &mut self,
        prefix: &str,
        categories: &BTreeSet<u32>,
        values: impl Iterator<Item = u32> + Clone,
    ) {
        for category in categories {
            let column = values
                .clone()
                .map(|v| if v == *category { 1.0 } else { 0.0 })
                .collect();
            self.push(format!("{prefix}_{category}"), column);
        }
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn column_names(&self) -> &[String] {
        &self.names
    }

    pub fn column(&self, name: &str) -> Option<&[f64]> {
        self.index.get(name).map(|&i| self.columns[i].as_slice())
    }

    pub fn lag_column_name(&self) -> &str {
        &self.lag_column
    }

    /// Rows ordered by `features`. Every requested name must exist.
    pub fn select(&self, features: &[String]) -> Result<FeatureMatrix> {
        let missing: Vec<String> = features
            .iter()
            .filter(|f| !self.index.contains_key(f.as_str()))
            .cloned()
            .collect();
        if !missing.is_empty() {
            return Err(Error::FeatureMismatch { missing });
        }

        let picked: Vec<&Vec<f64>> = features.iter().map(|f| &self.columns[self.index[f.as_str()]]).collect();
        let rows = (0..self.dates.len())
            .map(|r| picked.iter().map(|col| col[r]).collect())
            .collect();

        Ok(FeatureMatrix {
            rows,
            lag_position: features.iter().position(|f| *f == self.lag_column),
        })
    }
}

/// Row-major model input in bundle feature order.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureMatrix {
    rows: Vec<Vec<f64>>,
    lag_position: Option<usize>,
}

impl FeatureMatrix {
    pub fn rows(&self) -> &[Vec<f64>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Copy of row `i` with the lag feature replaced, if the bundle uses it.
    pub fn row_with_lag(&self, i: usize, lag: f64) -> Vec<f64> {
        let mut row = self.rows[i].clone();
        if let Some(pos) = self.lag_position {
            row[pos] = lag;
        }
        row
    }
}
