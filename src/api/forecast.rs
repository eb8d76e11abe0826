use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{
    api::error::ApiError,
    domain::{ForecastRecord, ForecastRegime, ForecastRequest},
    state::AppState,
};

/// Forecast window as six calendar components.
#[derive(Debug, Clone, Deserialize)]
pub struct ForecastQuery {
    pub start_year: i32,
    pub start_month: u32,
    pub start_day: u32,
    pub end_year: i32,
    pub end_month: u32,
    pub end_day: u32,
}

impl ForecastQuery {
    pub fn to_request(&self) -> crate::error::Result<ForecastRequest> {
        ForecastRequest::from_ymd(
            self.start_year,
            self.start_month,
            self.start_day,
            self.end_year,
            self.end_month,
            self.end_day,
        )
    }
}

#[derive(Debug, Serialize)]
pub struct ForecastResponse {
    pub regime: ForecastRegime,
    pub forecast: Vec<ForecastRecord>,
}

/// POST /api/v1/forecast - Lake level series for a date window
pub async fn post_forecast(
    State(state): State<AppState>,
    payload: Result<Json<ForecastQuery>, axum::extract::rejection::JsonRejection>,
) -> Result<Json<ForecastResponse>, ApiError> {
    let Json(query) = payload?;
    let request = query.to_request()?;

    // Recursive inference is CPU bound; keep it off the async workers.
    let context = state.context.clone();
    let result = tokio::task::spawn_blocking(move || context.forecast(&request)).await??;

    info!(
        regime = %result.regime,
        records = result.len(),
        first = ?result.first_date(),
        last = ?result.last_date(),
        "forecast served"
    );

    Ok(Json(ForecastResponse {
        regime: result.regime,
        forecast: result.records,
    }))
}
