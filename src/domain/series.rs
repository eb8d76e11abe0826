use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// A single dated value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub date: NaiveDate,
    pub value: f64,
}

impl Observation {
    pub fn new(date: NaiveDate, value: f64) -> Self {
        Self { date, value }
    }
}

/// Date-keyed series with unique dates in ascending order.
///
/// Construction sorts the input, so callers may hand over points in any order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct TimeSeries {
    points: Vec<Observation>,
}

impl TimeSeries {
    /// Build a series, sorting by date. Duplicate dates are rejected.
    pub fn new(mut points: Vec<Observation>) -> Result<Self> {
        points.sort_by_key(|p| p.date);
        if let Some(pair) = points.windows(2).find(|w| w[0].date == w[1].date) {
            return Err(Error::Validation(format!(
                "duplicate date {} in time series",
                pair[0].date
            )));
        }
        Ok(Self { points })
    }

    /// Build a series from parallel date and value vectors.
    pub fn from_parts(dates: Vec<NaiveDate>, values: Vec<f64>) -> Result<Self> {
        if dates.len() != values.len() {
            return Err(Error::Validation(format!(
                "series has {} dates but {} values",
                dates.len(),
                values.len()
            )));
        }
        Self::new(
            dates
                .into_iter()
                .zip(values)
                .map(|(date, value)| Observation { date, value })
                .collect(),
        )
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn points(&self) -> &[Observation] {
        &self.points
    }

    pub fn dates(&self) -> Vec<NaiveDate> {
        self.points.iter().map(|p| p.date).collect()
    }

    pub fn values(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.value).collect()
    }

    pub fn first(&self) -> Option<&Observation> {
        self.points.first()
    }

    pub fn last(&self) -> Option<&Observation> {
        self.points.last()
    }

    pub fn get(&self, date: NaiveDate) -> Option<f64> {
        self.points
            .binary_search_by_key(&date, |p| p.date)
            .ok()
            .map(|i| self.points[i].value)
    }

    /// Replace every value, keeping the date index.
    pub fn with_values(&self, values: Vec<f64>) -> Result<Self> {
        if values.len() != self.points.len() {
            return Err(Error::Validation(format!(
                "cannot re-index {} values onto a series of length {}",
                values.len(),
                self.points.len()
            )));
        }
        Ok(Self {
            points: self
                .points
                .iter()
                .zip(values)
                .map(|(p, value)| Observation { date: p.date, value })
                .collect(),
        })
    }

    /// True when both series carry exactly the same dates.
    pub fn is_aligned_with(&self, other: &TimeSeries) -> bool {
        self.points.len() == other.points.len()
            && self
                .points
                .iter()
                .zip(&other.points)
                .all(|(a, b)| a.date == b.date)
    }

    /// Value pairs `(self, other)` on the dates both series share.
    pub fn intersect(&self, other: &TimeSeries) -> Vec<(f64, f64)> {
        self.points
            .iter()
            .filter_map(|p| other.get(p.date).map(|o| (p.value, o)))
            .collect()
    }
}

impl<'de> Deserialize<'de> for TimeSeries {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let points = Vec::<Observation>::deserialize(deserializer)?;
        TimeSeries::new(points).map_err(serde::de::Error::custom)
    }
}
