//! Forecast Metrics and Evaluation
//!
//! Goodness-of-fit scores between an observed and a modeled series. The
//! metric engine never fails: degenerate statistics (empty overlap, constant
//! series, zero means) come back as NaN fields and callers check for them.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::TimeSeries;
use crate::utils::stats;

/// Fit statistics of a modeled series against observations.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct MetricSet {
    /// Root Mean Square Error
    #[serde(rename = "RMSE")]
    pub rmse: f64,
    /// Mean Absolute Error
    #[serde(rename = "MAE")]
    pub mae: f64,
    /// Mean of modeled - observed
    #[serde(rename = "Bias")]
    pub bias: f64,
    /// Pearson correlation coefficient
    #[serde(rename = "Correlation")]
    pub correlation: f64,
    /// Nash-Sutcliffe Efficiency
    #[serde(rename = "NSE")]
    pub nse: f64,
    /// Kling-Gupta Efficiency
    #[serde(rename = "KGE")]
    pub kge: f64,
}

impl MetricSet {
    pub fn all_nan() -> Self {
        Self {
            rmse: f64::NAN,
            mae: f64::NAN,
            bias: f64::NAN,
            correlation: f64::NAN,
            nse: f64::NAN,
            kge: f64::NAN,
        }
    }

    /// `(name, value)` pairs in reporting order.
    pub fn entries(&self) -> [(&'static str, f64); 6] {
        [
            ("RMSE", self.rmse),
            ("MAE", self.mae),
            ("Bias", self.bias),
            ("Correlation", self.correlation),
            ("NSE", self.nse),
            ("KGE", self.kge),
        ]
    }

    pub fn is_all_nan(&self) -> bool {
        self.entries().iter().all(|(_, v)| v.is_nan())
    }
}

impl fmt::Display for MetricSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Metrics: RMSE={:.3}, MAE={:.3}, Bias={:.3}, r={:.3}, NSE={:.3}, KGE={:.3}",
            self.rmse, self.mae, self.bias, self.correlation, self.nse, self.kge
        )
    }
}

/// Compare `modeled` against `observed` on the dates they share.
pub fn calculate_metrics(observed: &TimeSeries, modeled: &TimeSeries) -> MetricSet {
    let aligned = observed.intersect(modeled);
    if aligned.is_empty() {
        return MetricSet::all_nan();
    }

    let (obs, sim): (Vec<f64>, Vec<f64>) = aligned
        .iter()
        .copied()
        .filter(|(o, m)| !o.is_nan() && !m.is_nan())
        .unzip();

    let errors: Vec<f64> = obs.iter().zip(&sim).map(|(o, m)| m - o).collect();
    let squared_error: f64 = errors.iter().map(|e| e * e).sum();
    let obs_mean = stats::mean(&obs);
    let obs_variance: f64 = obs.iter().map(|o| (o - obs_mean).powi(2)).sum();

    MetricSet {
        rmse: stats::mean(&errors.iter().map(|e| e * e).collect::<Vec<_>>()).sqrt(),
        mae: stats::mean(&errors.iter().map(|e| e.abs()).collect::<Vec<_>>()),
        bias: stats::mean(&errors),
        correlation: stats::pearson(&obs, &sim),
        nse: if obs_variance == 0.0 {
            f64::NAN
        } else {
            1.0 - squared_error / obs_variance
        },
        kge: kge(&obs, &sim),
    }
}

/// Kling-Gupta Efficiency of paired values. Pairs with a NaN on either side
/// are dropped first.
pub fn kge(observed: &[f64], modeled: &[f64]) -> f64 {
    let (obs, sim): (Vec<f64>, Vec<f64>) = observed
        .iter()
        .zip(modeled)
        .filter(|(o, m)| !o.is_nan() && !m.is_nan())
        .map(|(o, m)| (*o, *m))
        .unzip();

    let r = stats::pearson(&obs, &sim);
    let alpha = stats::std_dev(&sim) / stats::std_dev(&obs);
    let beta = stats::mean(&sim) / stats::mean(&obs);

    1.0 - ((r - 1.0).powi(2) + (alpha - 1.0).powi(2) + (beta - 1.0).powi(2)).sqrt()
}
