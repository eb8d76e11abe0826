use axum::{extract::rejection::JsonRejection, Json};
use serde::Deserialize;

use crate::{
    api::error::ApiError,
    correction::{BiasCorrectionReport, CorrectionMethod},
    domain::TimeSeries,
};

#[derive(Debug, Deserialize)]
pub struct BiasCorrectionRequest {
    pub observed: TimeSeries,
    pub modeled: TimeSeries,
    /// One of the correction selectors, e.g. `"quantile_mapping"`.
    pub method: String,
}

/// POST /api/v1/bias-correction - Correct a modeled series against observations
pub async fn post_bias_correction(
    payload: Result<Json<BiasCorrectionRequest>, JsonRejection>,
) -> Result<Json<BiasCorrectionReport>, ApiError> {
    let Json(request) = payload?;
    let method = CorrectionMethod::parse(&request.method)?;
    let report = BiasCorrectionReport::build(method, &request.observed, &request.modeled)?;
    Ok(Json(report))
}
