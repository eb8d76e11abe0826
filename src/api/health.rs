use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use chrono::NaiveDate;
use serde::Serialize;

use crate::state::{AppState, MODEL_NAME};

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    status: &'static str,
    model: &'static str,
    timestamp: chrono::DateTime<chrono::Utc>,
    checks: HealthChecks,
}

/// Individual health checks
#[derive(Debug, Serialize)]
pub struct HealthChecks {
    model_bundle: ComponentHealth,
    historical_dataset: ComponentHealth,
}

/// Health status of a component
#[derive(Debug, Serialize)]
pub struct ComponentHealth {
    status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    detail: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl ComponentHealth {
    fn healthy(detail: String) -> Self {
        Self {
            status: "healthy",
            detail: Some(detail),
            error: None,
        }
    }

    fn unhealthy(error: String) -> Self {
        Self {
            status: "unhealthy",
            detail: None,
            error: Some(error),
        }
    }
}

fn describe_span((first, last): (NaiveDate, NaiveDate), rows: usize) -> String {
    format!("{rows} rows from {first} to {last}")
}

/// GET /api/v1/health - Health check endpoint
///
/// Degraded (503) while the historical dataset is unavailable.
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let context = &state.context;
    let bundle = context.engine().bundle();
    let model_bundle = ComponentHealth::healthy(format!(
        "{} models, {} features",
        bundle.len(),
        bundle.features().len()
    ));

    let historical_dataset = match (context.dataset_span(), context.historical()) {
        (Some(span), Some(h)) => ComponentHealth::healthy(describe_span(span, h.len())),
        _ => ComponentHealth::unhealthy(
            context
                .unavailable_reason()
                .unwrap_or("historical dataset is empty")
                .to_string(),
        ),
    };

    let healthy = historical_dataset.status == "healthy";
    let response = HealthResponse {
        status: if healthy { "healthy" } else { "degraded" },
        model: MODEL_NAME,
        timestamp: chrono::Utc::now(),
        checks: HealthChecks {
            model_bundle,
            historical_dataset,
        },
    };

    let status = if healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status, Json(response))
}
