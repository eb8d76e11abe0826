use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use tracing::warn;

use crate::config::Config;
use crate::domain::{ForecastRequest, ForecastResult, HistoricalDataset};
use crate::forecast::ForecastEngine;
use crate::ml::ModelBundle;

/// Identity reported by the health endpoint.
pub const MODEL_NAME: &str = "lake_level_forecast_v1";

/// Read-only forecasting state shared by every request.
///
/// The model bundle is mandatory. The historical dataset may be missing, in
/// which case forecasts fail with `DataUnavailable` while the rest of the
/// service keeps running.
pub struct ForecastContext {
    engine: ForecastEngine,
    historical: Option<HistoricalDataset>,
    unavailable_reason: Option<String>,
}

impl ForecastContext {
    pub fn new(engine: ForecastEngine, historical: Option<HistoricalDataset>) -> Self {
        let unavailable_reason = historical
            .is_none()
            .then(|| "historical dataset is not loaded".to_string());
        Self {
            engine,
            historical,
            unavailable_reason,
        }
    }

    /// Load the bundle (fatal on failure) and the historical dataset
    /// (degraded on failure).
    pub fn load(cfg: &Config) -> Result<Self> {
        let bundle = ModelBundle::load(&cfg.data.model_bundle_path, cfg.forecast.weight_policy())
            .with_context(|| {
                format!(
                    "failed to load model bundle from {}",
                    cfg.data.model_bundle_path.display()
                )
            })?;
        let engine = ForecastEngine::new(Arc::new(bundle)).with_horizon(cfg.forecast.horizon)?;

        match HistoricalDataset::load(&cfg.data.historical_dataset_path, &cfg.data.target_column) {
            Ok(dataset) => Ok(Self::new(engine, Some(dataset))),
            Err(e) => {
                warn!(
                    path = %cfg.data.historical_dataset_path.display(),
                    error = %e,
                    "historical dataset unavailable, forecasts will be rejected"
                );
                Ok(Self {
                    engine,
                    historical: None,
                    unavailable_reason: Some(e.to_string()),
                })
            }
        }
    }

    pub fn forecast(&self, request: &ForecastRequest) -> crate::error::Result<ForecastResult> {
        self.engine.forecast(request, self.historical.as_ref())
    }

    pub fn engine(&self) -> &ForecastEngine {
        &self.engine
    }

    pub fn historical(&self) -> Option<&HistoricalDataset> {
        self.historical.as_ref()
    }

    pub fn is_dataset_available(&self) -> bool {
        self.historical.as_ref().is_some_and(|h| !h.is_empty())
    }

    pub fn unavailable_reason(&self) -> Option<&str> {
        self.unavailable_reason.as_deref()
    }

    /// First and last date of the historical record.
    pub fn dataset_span(&self) -> Option<(NaiveDate, NaiveDate)> {
        let h = self.historical.as_ref()?;
        Some((h.first_date()?, h.max_date()?))
    }
}

#[derive(Clone)]
pub struct AppState {
    pub cfg: Config,
    pub context: Arc<ForecastContext>,
}

impl AppState {
    pub fn new(cfg: Config, context: ForecastContext) -> Self {
        Self {
            cfg,
            context: Arc::new(context),
        }
    }

    pub fn load(cfg: Config) -> Result<Self> {
        let context = ForecastContext::load(&cfg)?;
        Ok(Self::new(cfg, context))
    }
}
