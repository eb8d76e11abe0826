use std::sync::Arc;

use chrono::NaiveDate;
use tracing::{debug, warn};

use super::features::FeatureTable;
use crate::domain::{ForecastRecord, ForecastRegime, ForecastRequest, ForecastResult, HistoricalDataset};
use crate::error::{Error, Result};
use crate::ml::{EnsemblePredictor, ModelBundle};

/// Steps covered by the lagged-target feature.
pub const DEFAULT_HORIZON: usize = 120;

/// Reconstructs or predicts lake levels over a requested window.
///
/// Windows inside the historical record are answered from the record. Past
/// its last date the engine predicts daily values: the first `horizon` days
/// in one batch, then one day at a time feeding each prediction back in as
/// the next day's lag feature. The recursive part is strictly sequential.
pub struct ForecastEngine {
    bundle: Arc<ModelBundle>,
    horizon: usize,
}

impl ForecastEngine {
    pub fn new(bundle: Arc<ModelBundle>) -> Self {
        Self {
            bundle,
            horizon: DEFAULT_HORIZON,
        }
    }

    pub fn with_horizon(mut self, horizon: usize) -> Result<Self> {
        if horizon == 0 {
            return Err(Error::Validation("forecast horizon must be at least 1".to_string()));
        }
        self.horizon = horizon;
        Ok(self)
    }

    pub fn horizon(&self) -> usize {
        self.horizon
    }

    pub fn bundle(&self) -> &ModelBundle {
        &self.bundle
    }

    /// Produce the series for `request`.
    ///
    /// Fails with `DataUnavailable` when no (or an empty) historical dataset
    /// is supplied. Any inference failure aborts the whole request.
    pub fn forecast(
        &self,
        request: &ForecastRequest,
        historical: Option<&HistoricalDataset>,
    ) -> Result<ForecastResult> {
        let historical = historical.ok_or_else(|| {
            Error::DataUnavailable("historical dataset is not loaded".to_string())
        })?;
        let max_date_train = historical.max_date().ok_or_else(|| {
            Error::DataUnavailable("historical dataset is empty".to_string())
        })?;

        let regime = ForecastRegime::select(request, max_date_train);
        debug!(
            %regime,
            start = %request.start(),
            end = %request.end(),
            %max_date_train,
            "forecast regime selected"
        );

        let records = match regime {
            ForecastRegime::Historical => historical.slice(request.start(), request.end()),
            ForecastRegime::Blended => {
                let mut records = historical.slice(request.start(), max_date_train);
                records.extend(self.predict_continuation(historical, request.end())?);
                records
            }
            ForecastRegime::Future => self
                .predict_continuation(historical, request.end())?
                .into_iter()
                .filter(|r| r.date >= request.start())
                .collect(),
        };

        Ok(ForecastResult { regime, records })
    }

    /// Predict every day after the historical record up to and including `end`.
    pub fn predict_continuation(
        &self,
        historical: &HistoricalDataset,
        end: NaiveDate,
    ) -> Result<Vec<ForecastRecord>> {
        let max_date_train = historical.max_date().ok_or_else(|| {
            Error::DataUnavailable("historical dataset is empty".to_string())
        })?;
        let future_dates: Vec<NaiveDate> = max_date_train
            .iter_days()
            .skip(1)
            .take_while(|d| *d <= end)
            .collect();
        if future_dates.is_empty() {
            return Ok(Vec::new());
        }

        let table = FeatureTable::engineer(historical, &future_dates, self.horizon)?;
        let matrix = table.select(self.bundle.features())?;
        let predictor = EnsemblePredictor::new(&self.bundle);

        let head = self.horizon.min(matrix.len());
        let mut values = predictor.predict_batch(&matrix.rows()[..head])?;

        let mut lag = values[head - 1];
        for step in head..matrix.len() {
            let row = matrix.row_with_lag(step, lag);
            lag = predictor.predict_narrowed(&row).map_err(|e| {
                warn!(step, date = %future_dates[step], error = %e, "recursive inference failed");
                e
            })?;
            values.push(lag);
        }

        debug!(
            days = future_dates.len(),
            batch = head,
            recursive = future_dates.len() - head,
            "continuation predicted"
        );

        Ok(future_dates
            .into_iter()
            .zip(values)
            .map(|(date, value)| ForecastRecord { date, value })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ml::{LinearRegressionModel, Regressor};

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn history(start: NaiveDate, values: &[f64]) -> HistoricalDataset {
        let dates = start.iter_days().take(values.len()).collect();
        HistoricalDataset::from_columns("Lake_Level", dates, values.to_vec(), Vec::new()).unwrap()
    }

    /// exp(ln(lag)) == lag: the model carries the lag straight through.
    #[derive(Debug)]
    struct LogLag;

    impl Regressor for LogLag {
        fn predict(&self, features: &[f64]) -> Result<f64> {
            Ok(features[0].ln())
        }

        fn model_type(&self) -> crate::ml::ModelType {
            crate::ml::ModelType::LinearRegression
        }
    }

    fn lag_engine(horizon: usize) -> ForecastEngine {
        let bundle = ModelBundle::new(
            vec![Box::new(LogLag)],
            vec![1.0],
            vec!["lag_Lake_Level".to_string()],
        )
        .unwrap();
        ForecastEngine::new(Arc::new(bundle)).with_horizon(horizon).unwrap()
    }

    #[test]
    fn test_zero_horizon_rejected() {
        let bundle = ModelBundle::new(
            vec![Box::new(LinearRegressionModel::new(vec![0.0], 0.0))],
            vec![1.0],
            vec!["day".to_string()],
        )
        .unwrap();
        assert!(ForecastEngine::new(Arc::new(bundle)).with_horizon(0).is_err());
    }

    #[test]
    fn test_missing_dataset_is_unavailable() {
        let engine = lag_engine(2);
        let request = ForecastRequest::new(d(2020, 1, 1), d(2020, 2, 1)).unwrap();
        assert!(matches!(
            engine.forecast(&request, None),
            Err(Error::DataUnavailable(_))
        ));
    }

    #[test]
    fn test_continuation_batch_then_recursive() {
        // history 1..=4, horizon 2: batch rows take lags 3 and 4 from history,
        // recursion then repeats the last prediction
        let hist = history(d(2020, 1, 1), &[1.0, 2.0, 3.0, 4.0]);
        let engine = lag_engine(2);
        let records = engine.predict_continuation(&hist, d(2020, 1, 8)).unwrap();

        let dates: Vec<NaiveDate> = records.iter().map(|r| r.date).collect();
        assert_eq!(dates, d(2020, 1, 5).iter_days().take(4).collect::<Vec<_>>());
        let values: Vec<f64> = records.iter().map(|r| r.value).collect();
        assert!((values[0] - 3.0).abs() < 1e-12);
        assert!((values[1] - 4.0).abs() < 1e-12);
        assert!((values[2] - 4.0).abs() < 1e-6);
        assert!((values[3] - 4.0).abs() < 1e-6);
    }

    #[test]
    fn test_end_before_history_end_yields_nothing() {
        let hist = history(d(2020, 1, 1), &[1.0, 2.0]);
        let engine = lag_engine(2);
        assert!(engine.predict_continuation(&hist, d(2020, 1, 2)).unwrap().is_empty());
    }

    #[test]
    fn test_missing_feature_aborts_before_inference() {
        let bundle = ModelBundle::new(
            vec![Box::new(LinearRegressionModel::new(vec![0.0], 0.0))],
            vec![1.0],
            vec!["week_99".to_string()],
        )
        .unwrap();
        let engine = ForecastEngine::new(Arc::new(bundle));
        let hist = history(d(2020, 1, 1), &[1.0, 2.0]);
        let request = ForecastRequest::new(d(2020, 1, 1), d(2020, 1, 10)).unwrap();
        assert!(matches!(
            engine.forecast(&request, Some(&hist)),
            Err(Error::FeatureMismatch { .. })
        ));
    }
}
