//! Weighted ensemble inference.

use super::bundle::ModelBundle;
use crate::error::{Error, Result};

/// Combines the bundle's models into one prediction.
///
/// Each model predicts in log space; its output is exponentiated and the
/// results are combined as `Σ weight_i * exp(model_i(x))`. Weights are used
/// as given, not normalised.
pub struct EnsemblePredictor<'a> {
    bundle: &'a ModelBundle,
}

impl<'a> EnsemblePredictor<'a> {
    pub fn new(bundle: &'a ModelBundle) -> Self {
        Self { bundle }
    }

    /// Predict one row. A model error or a non-finite result aborts.
    pub fn predict(&self, features: &[f64]) -> Result<f64> {
        let mut weighted_sum = 0.0;
        for (i, (model, weight)) in self
            .bundle
            .models()
            .iter()
            .zip(self.bundle.weights())
            .enumerate()
        {
            let log_value = model.predict(features)?;
            weighted_sum += weight * log_value.exp();
            if weighted_sum.is_nan() {
                return Err(Error::Computation(format!(
                    "model {i} ({}) produced a non-numeric prediction",
                    model.model_type()
                )));
            }
        }

        if !weighted_sum.is_finite() {
            return Err(Error::Computation(format!(
                "ensemble prediction overflowed to {weighted_sum}"
            )));
        }
        Ok(weighted_sum)
    }

    /// Predict one row after narrowing every feature to single precision.
    pub fn predict_narrowed(&self, features: &[f64]) -> Result<f64> {
        let narrowed: Vec<f64> = features.iter().map(|&x| x as f32 as f64).collect();
        self.predict(&narrowed)
    }

    /// Predict independent rows.
    pub fn predict_batch(&self, rows: &[Vec<f64>]) -> Result<Vec<f64>> {
        rows.iter().map(|row| self.predict(row)).collect()
    }
}
