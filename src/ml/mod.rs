//! Machine Learning Module
//!
//! Inference-side pieces of the lake level forecaster:
//! - Regressor capability and the concrete model families
//! - Model bundle loading and validation
//! - Weighted ensemble combination
//!
//! Training happens offline; this crate only consumes the exported bundle.

use serde::{Deserialize, Serialize};

pub mod bundle;
pub mod ensemble;
pub mod models;

pub use bundle::*;
pub use ensemble::*;
pub use models::*;

/// ML Model Type
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ModelType {
    LinearRegression,
    DecisionTree,
    TreeEnsemble,
}

impl std::fmt::Display for ModelType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::LinearRegression => "linear_regression",
            Self::DecisionTree => "decision_tree",
            Self::TreeEnsemble => "tree_ensemble",
        };
        write!(f, "{}", s)
    }
}
