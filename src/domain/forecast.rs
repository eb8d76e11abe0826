use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// A validated forecast window. `end` is always after `start`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ForecastRequest {
    start: NaiveDate,
    end: NaiveDate,
}

impl ForecastRequest {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self> {
        if end <= start {
            return Err(Error::InvalidRange { start, end });
        }
        Ok(Self { start, end })
    }

    /// Build a request from calendar components as received at the boundary.
    pub fn from_ymd(
        start_year: i32,
        start_month: u32,
        start_day: u32,
        end_year: i32,
        end_month: u32,
        end_day: u32,
    ) -> Result<Self> {
        let start = calendar_date("start", start_year, start_month, start_day)?;
        let end = calendar_date("end", end_year, end_month, end_day)?;
        Self::new(start, end)
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }
}

fn calendar_date(which: &str, year: i32, month: u32, day: u32) -> Result<NaiveDate> {
    NaiveDate::from_ymd_opt(year, month, day).ok_or_else(|| {
        Error::Validation(format!(
            "{which} date {year:04}-{month:02}-{day:02} is not a valid calendar date"
        ))
    })
}

/// How a request relates to the last date of the historical record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ForecastRegime {
    /// Window ends on or before the last historical date.
    Historical,
    /// Window straddles the last historical date.
    Blended,
    /// Window starts after the last historical date.
    Future,
}

impl ForecastRegime {
    pub fn select(request: &ForecastRequest, max_date_train: NaiveDate) -> Self {
        if request.end() <= max_date_train {
            Self::Historical
        } else if request.start() <= max_date_train {
            Self::Blended
        } else {
            Self::Future
        }
    }
}

impl std::fmt::Display for ForecastRegime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Historical => "historical",
            Self::Blended => "blended",
            Self::Future => "future",
        };
        write!(f, "{}", s)
    }
}

/// One dated output value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForecastRecord {
    pub date: NaiveDate,
    pub value: f64,
}

/// Ordered forecast covering the requested window.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForecastResult {
    pub regime: ForecastRegime,
    pub records: Vec<ForecastRecord>,
}

impl ForecastResult {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.records.first().map(|r| r.date)
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.records.last().map(|r| r.date)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[rstest]
    #[case(d(2020, 1, 1), d(2020, 1, 1))]
    #[case(d(2020, 2, 1), d(2020, 1, 1))]
    fn test_request_rejects_empty_or_reversed_window(#[case] start: NaiveDate, #[case] end: NaiveDate) {
        assert_eq!(
            ForecastRequest::new(start, end),
            Err(Error::InvalidRange { start, end })
        );
    }

    #[test]
    fn test_from_ymd_rejects_impossible_dates() {
        let err = ForecastRequest::from_ymd(2021, 2, 30, 2021, 6, 1).unwrap_err();
        assert!(matches!(err, Error::Validation(msg) if msg.contains("2021-02-30")));
    }

    #[rstest]
    #[case(d(2019, 1, 1), d(2019, 6, 1), ForecastRegime::Historical)]
    #[case(d(2019, 1, 1), d(2020, 1, 1), ForecastRegime::Historical)]
    #[case(d(2019, 6, 1), d(2020, 6, 1), ForecastRegime::Blended)]
    #[case(d(2020, 1, 1), d(2020, 6, 1), ForecastRegime::Blended)]
    #[case(d(2021, 1, 1), d(2021, 6, 1), ForecastRegime::Future)]
    fn test_regime_selection(
        #[case] start: NaiveDate,
        #[case] end: NaiveDate,
        #[case] expected: ForecastRegime,
    ) {
        let request = ForecastRequest::new(start, end).unwrap();
        assert_eq!(ForecastRegime::select(&request, d(2020, 1, 1)), expected);
    }

    #[test]
    fn test_record_serializes_iso_date() {
        let record = ForecastRecord {
            date: d(2021, 3, 4),
            value: 1.5,
        };
        let json = serde_json::to_string(&record).unwrap();
        assert_eq!(json, r#"{"date":"2021-03-04","value":1.5}"#);
    }
}
