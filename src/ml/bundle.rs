//! Model bundle: the trained ensemble plus its weights and feature list.

use std::collections::HashSet;
use std::path::Path;

use serde::Deserialize;
use tracing::info;

use super::models::{Regressor, RegressorSpec};
use crate::error::{Error, Result};

/// How strictly the ensemble weights are checked at load time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WeightPolicy {
    /// Reject bundles whose weights do not sum to 1 within `tolerance`.
    pub require_unit_sum: bool,
    pub tolerance: f64,
}

impl Default for WeightPolicy {
    fn default() -> Self {
        Self {
            require_unit_sum: true,
            tolerance: 1e-3,
        }
    }
}

#[derive(Debug, Deserialize)]
struct BundleFile {
    models: Vec<RegressorSpec>,
    weights: Vec<f64>,
    features: Vec<String>,
}

/// Immutable trained ensemble.
///
/// Invariants: at least one model, `models.len() == weights.len()`, every
/// weight finite and non-negative, feature names unique.
#[derive(Debug)]
pub struct ModelBundle {
    models: Vec<Box<dyn Regressor>>,
    weights: Vec<f64>,
    features: Vec<String>,
}

impl ModelBundle {
    pub fn new(
        models: Vec<Box<dyn Regressor>>,
        weights: Vec<f64>,
        features: Vec<String>,
    ) -> Result<Self> {
        if models.is_empty() {
            return Err(Error::Validation("model bundle contains no models".to_string()));
        }
        if models.len() != weights.len() {
            return Err(Error::Validation(format!(
                "model bundle has {} models but {} weights",
                models.len(),
                weights.len()
            )));
        }
        if let Some(w) = weights.iter().find(|w| !w.is_finite() || **w < 0.0) {
            return Err(Error::Validation(format!(
                "ensemble weights must be finite and non-negative, found {w}"
            )));
        }

        let mut seen = HashSet::new();
        if let Some(dup) = features.iter().find(|f| !seen.insert(f.as_str())) {
            return Err(Error::Validation(format!(
                "feature '{dup}' listed twice in model bundle"
            )));
        }

        for (i, model) in models.iter().enumerate() {
            model
                .validate(features.len())
                .map_err(|e| Error::Validation(format!("model {i}: {e}")))?;
        }

        Ok(Self {
            models,
            weights,
            features,
        })
    }

    /// Parse a JSON bundle document and apply the weight policy.
    pub fn from_json(json: &str, policy: WeightPolicy) -> Result<Self> {
        let file: BundleFile = serde_json::from_str(json)
            .map_err(|e| Error::Validation(format!("malformed model bundle: {e}")))?;
        let bundle = Self::new(
            file.models.into_iter().map(RegressorSpec::into_regressor).collect(),
            file.weights,
            file.features,
        )?;
        if policy.require_unit_sum {
            bundle.check_weight_sum(policy.tolerance)?;
        }
        Ok(bundle)
    }

    /// Read and validate a bundle file.
    pub fn load(path: &Path, policy: WeightPolicy) -> Result<Self> {
        let json = std::fs::read_to_string(path).map_err(|e| {
            Error::Validation(format!("cannot read model bundle '{}': {e}", path.display()))
        })?;
        let bundle = Self::from_json(&json, policy)?;
        info!(
            path = %path.display(),
            models = bundle.len(),
            features = bundle.features.len(),
            weight_sum = bundle.weight_sum(),
            "model bundle loaded"
        );
        Ok(bundle)
    }

    /// Fail when the weights clearly do not form a unit linear combination.
    pub fn check_weight_sum(&self, tolerance: f64) -> Result<()> {
        let sum = self.weight_sum();
        if (sum - 1.0).abs() > tolerance {
            return Err(Error::Validation(format!(
                "ensemble weights sum to {sum}, expected 1 ± {tolerance}"
            )));
        }
        Ok(())
    }

    pub fn models(&self) -> &[Box<dyn Regressor>] {
        &self.models
    }

    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    pub fn features(&self) -> &[String] {
        &self.features
    }

    pub fn weight_sum(&self) -> f64 {
        self.weights.iter().sum()
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ml::models::LinearRegressionModel;

    fn bundle_json(weights: &str) -> String {
        format!(
            r#"{{
                "models": [
                    {{"kind": "linear", "coefficients": [0.0, 0.0], "intercept": 0.0}},
                    {{"kind": "decision_tree", "nodes": [{{"type": "leaf", "value": 0.0}}]}}
                ],
                "weights": {weights},
                "features": ["day", "lag_Lake_Level"]
            }}"#
        )
    }

    #[test]
    fn test_from_json_valid() {
        let bundle = ModelBundle::from_json(&bundle_json("[0.25, 0.75]"), WeightPolicy::default()).unwrap();
        assert_eq!(bundle.len(), 2);
        assert_eq!(bundle.features(), &["day".to_string(), "lag_Lake_Level".to_string()]);
    }

    #[test]
    fn test_weight_count_mismatch_rejected() {
        let err = ModelBundle::from_json(&bundle_json("[1.0]"), WeightPolicy::default()).unwrap_err();
        assert!(err.to_string().contains("2 models but 1 weights"));
    }

    #[test]
    fn test_weight_sum_policy() {
        let json = bundle_json("[0.5, 0.7]");
        assert!(ModelBundle::from_json(&json, WeightPolicy::default()).is_err());

        let lenient = WeightPolicy {
            require_unit_sum: false,
            ..WeightPolicy::default()
        };
        let bundle = ModelBundle::from_json(&json, lenient).unwrap();
        assert!((bundle.weight_sum() - 1.2).abs() < 1e-12);
    }

    #[test]
    fn test_missing_field_is_malformed() {
        let err = ModelBundle::from_json(r#"{"models": [], "weights": []}"#, WeightPolicy::default())
            .unwrap_err();
        assert!(err.to_string().contains("malformed model bundle"));
    }

    #[test]
    fn test_negative_weight_and_coefficient_count() {
        let model = || Box::new(LinearRegressionModel::new(vec![1.0], 0.0)) as Box<dyn Regressor>;
        assert!(ModelBundle::new(vec![model()], vec![-0.1], vec!["day".into()]).is_err());
        assert!(ModelBundle::new(vec![model()], vec![1.0], vec!["day".into(), "week_1".into()]).is_err());
        assert!(ModelBundle::new(vec![model()], vec![1.0], vec!["day".into()]).is_ok());
    }
}
