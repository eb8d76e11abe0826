//! Regressor implementations consumed by the forecast ensemble.
//!
//! Every model predicts the log of the target from one feature row whose
//! column order is given by the bundle's feature list.

use serde::{Deserialize, Serialize};

use super::ModelType;
use crate::error::{Error, Result};

/// Anything that can score a single feature row.
pub trait Regressor: Send + Sync + std::fmt::Debug {
    /// Predict a (log-space) value for one row of features.
    fn predict(&self, features: &[f64]) -> Result<f64>;

    /// Model family, for logging and health output.
    fn model_type(&self) -> ModelType;

    /// Check the model can score rows of `n_features` columns.
    fn validate(&self, _n_features: usize) -> Result<()> {
        Ok(())
    }
}

/// Ordinary linear model: `intercept + Σ coefficient_i * x_i`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearRegressionModel {
    pub coefficients: Vec<f64>,
    #[serde(default)]
    pub intercept: f64,
}

impl LinearRegressionModel {
    pub fn new(coefficients: Vec<f64>, intercept: f64) -> Self {
        Self {
            coefficients,
            intercept,
        }
    }
}

impl Regressor for LinearRegressionModel {
    fn predict(&self, features: &[f64]) -> Result<f64> {
        if features.len() != self.coefficients.len() {
            return Err(Error::Computation(format!(
                "linear model expects {} features, got {}",
                self.coefficients.len(),
                features.len()
            )));
        }

        let prediction: f64 = features
            .iter()
            .zip(self.coefficients.iter())
            .map(|(f, c)| f * c)
            .sum::<f64>()
            + self.intercept;

        Ok(prediction)
    }

    fn model_type(&self) -> ModelType {
        ModelType::LinearRegression
    }

    fn validate(&self, n_features: usize) -> Result<()> {
        if self.coefficients.len() != n_features {
            return Err(Error::Validation(format!(
                "linear model has {} coefficients but the bundle lists {} features",
                self.coefficients.len(),
                n_features
            )));
        }
        Ok(())
    }
}

/// Node of a flattened binary regression tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TreeNode {
    /// Rows with `x[feature] < threshold` go left. NaN follows `missing_left`.
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
        #[serde(default = "default_missing_left")]
        missing_left: bool,
    },
    Leaf {
        value: f64,
    },
}

fn default_missing_left() -> bool {
    true
}

/// Single regression tree stored as a node array; node 0 is the root.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionTreeRegressor {
    pub nodes: Vec<TreeNode>,
}

impl DecisionTreeRegressor {
    pub fn new(nodes: Vec<TreeNode>) -> Self {
        Self { nodes }
    }

    fn leaf_value(&self, features: &[f64]) -> Result<f64> {
        let mut idx = 0;
        // A well-formed tree reaches a leaf in fewer hops than it has nodes.
        for _ in 0..=self.nodes.len() {
            match self.nodes.get(idx) {
                Some(TreeNode::Leaf { value }) => return Ok(*value),
                Some(TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                    missing_left,
                }) => {
                    let x = *features.get(*feature).ok_or_else(|| {
                        Error::Computation(format!(
                            "tree splits on feature {} but row has {} columns",
                            feature,
                            features.len()
                        ))
                    })?;
                    idx = if x.is_nan() {
                        if *missing_left { *left } else { *right }
                    } else if x < *threshold {
                        *left
                    } else {
                        *right
                    };
                }
                None => {
                    return Err(Error::Computation(format!(
                        "tree node index {idx} out of range"
                    )))
                }
            }
        }
        Err(Error::Computation("tree traversal did not reach a leaf".to_string()))
    }
}

impl Regressor for DecisionTreeRegressor {
    fn predict(&self, features: &[f64]) -> Result<f64> {
        self.leaf_value(features)
    }

    fn model_type(&self) -> ModelType {
        ModelType::DecisionTree
    }

    fn validate(&self, n_features: usize) -> Result<()> {
        if self.nodes.is_empty() {
            return Err(Error::Validation("decision tree has no nodes".to_string()));
        }
        for (i, node) in self.nodes.iter().enumerate() {
            if let TreeNode::Split {
                feature,
                left,
                right,
                ..
            } = node
            {
                if *feature >= n_features {
                    return Err(Error::Validation(format!(
                        "tree node {i} splits on feature {feature}, bundle lists {n_features}"
                    )));
                }
                if *left <= i || *right <= i || *left >= self.nodes.len() || *right >= self.nodes.len() {
                    return Err(Error::Validation(format!(
                        "tree node {i} has invalid children ({left}, {right})"
                    )));
                }
            }
        }
        Ok(())
    }
}

/// How tree outputs are combined inside a [`TreeEnsembleRegressor`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TreeAggregation {
    /// Gradient boosting: `base_score + learning_rate * Σ tree(x)`.
    #[default]
    Sum,
    /// Random forest: `base_score + learning_rate * mean(tree(x))`.
    Mean,
}

/// Boosted trees or a random forest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreeEnsembleRegressor {
    pub trees: Vec<DecisionTreeRegressor>,
    #[serde(default)]
    pub base_score: f64,
    #[serde(default = "default_learning_rate")]
    pub learning_rate: f64,
    #[serde(default)]
    pub aggregation: TreeAggregation,
}

fn default_learning_rate() -> f64 {
    1.0
}

impl Regressor for TreeEnsembleRegressor {
    fn predict(&self, features: &[f64]) -> Result<f64> {
        let mut total = 0.0;
        for tree in &self.trees {
            total += tree.predict(features)?;
        }
        let combined = match self.aggregation {
            TreeAggregation::Sum => total,
            TreeAggregation::Mean => total / self.trees.len() as f64,
        };
        Ok(self.base_score + self.learning_rate * combined)
    }

    fn model_type(&self) -> ModelType {
        ModelType::TreeEnsemble
    }

    fn validate(&self, n_features: usize) -> Result<()> {
        if self.trees.is_empty() {
            return Err(Error::Validation("tree ensemble has no trees".to_string()));
        }
        self.trees.iter().try_for_each(|t| t.validate(n_features))
    }
}

/// Serialized form of a regressor inside a bundle file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RegressorSpec {
    Linear(LinearRegressionModel),
    DecisionTree(DecisionTreeRegressor),
    TreeEnsemble(TreeEnsembleRegressor),
}

impl RegressorSpec {
    pub fn into_regressor(self) -> Box<dyn Regressor> {
        match self {
            RegressorSpec::Linear(m) => Box::new(m),
            RegressorSpec::DecisionTree(m) => Box::new(m),
            RegressorSpec::TreeEnsemble(m) => Box::new(m),
        }
    }
}
