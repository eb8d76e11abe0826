//! Before/after comparison of a bias correction.

use std::path::Path;

use serde::Serialize;
use tracing::info;

use super::CorrectionMethod;
use crate::domain::TimeSeries;
use crate::error::Result;
use crate::forecast::metrics::{calculate_metrics, MetricSet};
use crate::tabular::read_series_file;

/// Relative change `(after - before) / |before| * 100`.
///
/// `None` when `before` is zero or not finite, or the change itself is not.
pub fn percentage_diff(before: f64, after: f64) -> Option<f64> {
    if before == 0.0 || !before.is_finite() {
        return None;
    }
    let diff = (after - before) / before.abs() * 100.0;
    diff.is_finite().then_some(diff)
}

/// Per-metric percentage change between two metric sets.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MetricChange {
    #[serde(rename = "RMSE")]
    pub rmse: Option<f64>,
    #[serde(rename = "MAE")]
    pub mae: Option<f64>,
    #[serde(rename = "Bias")]
    pub bias: Option<f64>,
    #[serde(rename = "Correlation")]
    pub correlation: Option<f64>,
    #[serde(rename = "NSE")]
    pub nse: Option<f64>,
    #[serde(rename = "KGE")]
    pub kge: Option<f64>,
}

impl MetricChange {
    pub fn between(before: &MetricSet, after: &MetricSet) -> Self {
        Self {
            rmse: percentage_diff(before.rmse, after.rmse),
            mae: percentage_diff(before.mae, after.mae),
            bias: percentage_diff(before.bias, after.bias),
            correlation: percentage_diff(before.correlation, after.correlation),
            nse: percentage_diff(before.nse, after.nse),
            kge: percentage_diff(before.kge, after.kge),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct BiasCorrectionReport {
    pub method: CorrectionMethod,
    pub method_name: &'static str,
    pub corrected: TimeSeries,
    pub metrics_before: MetricSet,
    pub metrics_after: MetricSet,
    pub percentage_diff: MetricChange,
}

impl BiasCorrectionReport {
    /// Correct `modeled` and score it against `observed` before and after.
    pub fn build(
        method: CorrectionMethod,
        observed: &TimeSeries,
        modeled: &TimeSeries,
    ) -> Result<Self> {
        let corrected = method.apply(observed, modeled)?.corrected;
        let metrics_before = calculate_metrics(observed, modeled);
        let metrics_after = calculate_metrics(observed, &corrected);

        info!(
            method = %method,
            points = corrected.len(),
            rmse_before = metrics_before.rmse,
            rmse_after = metrics_after.rmse,
            "bias correction processed"
        );

        Ok(Self {
            method,
            method_name: method.display_name(),
            corrected,
            percentage_diff: MetricChange::between(&metrics_before, &metrics_after),
            metrics_before,
            metrics_after,
        })
    }
}

/// Read observed and modeled series from CSV or spreadsheet files and
/// correct with the method named by `selector`.
pub fn correct_files(
    observed_path: &Path,
    modeled_path: &Path,
    selector: &str,
) -> Result<BiasCorrectionReport> {
    let method = CorrectionMethod::parse(selector)?;
    let observed = read_series_file(observed_path)?;
    let modeled = read_series_file(modeled_path)?;
    BiasCorrectionReport::build(method, &observed, &modeled)
}
