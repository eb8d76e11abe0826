//! HTTP routes driven through the router without a socket.

use std::sync::Arc;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use chrono::NaiveDate;
use figment::{providers::{Format, Toml}, Figment};
use lake_level_forecast::{
    api,
    config::Config,
    domain::HistoricalDataset,
    forecast::ForecastEngine,
    ml::{ModelBundle, WeightPolicy},
    state::{AppState, ForecastContext},
};
use serde_json::{json, Value};
use tower::ServiceExt;

const CONFIG: &str = r#"
    [server]
    host = "127.0.0.1"
    port = 0

    [data]
    model_bundle_path = "unused.json"
    historical_dataset_path = "unused.csv"

    [forecast]
    horizon = 5
"#;

const BUNDLE: &str = r#"{
    "models": [{"kind": "linear", "coefficients": [0.0, 0.0], "intercept": 2.302585092994046}],
    "weights": [1.0],
    "features": ["day", "lag_Lake_Level"]
}"#;

fn app(with_dataset: bool) -> Router {
    let cfg = Config::from_figment(Figment::new().merge(Toml::string(CONFIG))).unwrap();
    let bundle = ModelBundle::from_json(BUNDLE, WeightPolicy::default()).unwrap();
    let engine = ForecastEngine::new(Arc::new(bundle))
        .with_horizon(cfg.forecast.horizon)
        .unwrap();

    let historical = with_dataset.then(|| {
        let start = NaiveDate::from_ymd_opt(2019, 12, 1).unwrap();
        let dates: Vec<NaiveDate> = start.iter_days().take(32).collect();
        let levels = (0..32).map(|i| 10.0 + i as f64).collect();
        HistoricalDataset::from_columns("Lake_Level", dates, levels, Vec::new()).unwrap()
    });

    let state = AppState::new(cfg.clone(), ForecastContext::new(engine, historical));
    api::router(state, &cfg)
}

async fn send(app: Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

fn window(start: (i32, u32, u32), end: (i32, u32, u32)) -> Value {
    json!({
        "start_year": start.0, "start_month": start.1, "start_day": start.2,
        "end_year": end.0, "end_month": end.1, "end_day": end.2,
    })
}

#[tokio::test]
async fn health_reports_model_and_dataset() {
    let (status, body) = send(app(true), "GET", "/api/v1/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["model"], "lake_level_forecast_v1");
    assert_eq!(body["checks"]["historical_dataset"]["status"], "healthy");
}

#[tokio::test]
async fn health_is_degraded_without_dataset() {
    let (status, body) = send(app(false), "GET", "/api/v1/health", None).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["status"], "degraded");
}

#[tokio::test]
async fn forecast_blends_history_and_predictions() {
    let body = window((2019, 12, 30), (2020, 1, 4));
    let (status, body) = send(app(true), "POST", "/api/v1/forecast", Some(body)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["regime"], "blended");

    let records = body["forecast"].as_array().unwrap();
    assert_eq!(records.len(), 6);
    assert_eq!(records[0]["date"], "2019-12-30");
    assert_eq!(records[0]["value"], 39.0);
    // exp(ln 10) for every predicted day
    let predicted = records[3]["value"].as_f64().unwrap();
    assert!((predicted - 10.0).abs() < 1e-9);
}

#[tokio::test]
async fn reversed_window_is_bad_request() {
    let body = window((2020, 2, 1), (2020, 1, 1));
    let (status, body) = send(app(true), "POST", "/api/v1/forecast", Some(body)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "InvalidRange");
}

#[tokio::test]
async fn impossible_calendar_date_is_bad_request() {
    let body = window((2021, 2, 30), (2021, 3, 1));
    let (status, body) = send(app(true), "POST", "/api/v1/forecast", Some(body)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "ValidationError");
}

#[tokio::test]
async fn forecast_without_dataset_is_unavailable() {
    let body = window((2019, 12, 1), (2019, 12, 5));
    let (status, body) = send(app(false), "POST", "/api/v1/forecast", Some(body)).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["error"], "DataUnavailable");
}

#[tokio::test]
async fn bias_correction_returns_report() {
    let body = json!({
        "observed": [
            {"date": "2021-01-01", "value": 2.0},
            {"date": "2021-01-02", "value": 4.0}
        ],
        "modeled": [
            {"date": "2021-01-02", "value": 2.0},
            {"date": "2021-01-01", "value": 1.0}
        ],
        "method": "linear_scaling"
    });
    let (status, body) = send(app(true), "POST", "/api/v1/bias-correction", Some(body)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["method_name"], "Linear Scaling");
    assert_eq!(body["corrected"][0]["value"], 2.0);
    assert_eq!(body["corrected"][1]["value"], 4.0);
    assert_eq!(body["metrics_after"]["RMSE"], 0.0);
}

#[tokio::test]
async fn unknown_correction_method_is_bad_request() {
    let body = json!({
        "observed": [{"date": "2021-01-01", "value": 2.0}],
        "modeled": [{"date": "2021-01-01", "value": 1.0}],
        "method": "bias_removal"
    });
    let (status, body) = send(app(true), "POST", "/api/v1/bias-correction", Some(body)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "ValidationError");
}
