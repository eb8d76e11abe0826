//! Bias correction
//!
//! Statistical adjustment of a modeled (or remotely sensed) series towards an
//! observed reference. Pick a [`CorrectionMethod`] from its selector string
//! and [`CorrectionMethod::apply`] it; [`report`] adds before/after metrics.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoEnumIterator};
use tracing::debug;

use crate::domain::TimeSeries;
use crate::error::{Error, Result};

pub mod report;
pub mod transforms;

pub use report::*;
pub use transforms::*;

/// Available correction methods, selected by their snake_case name.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    EnumString,
    Display,
    EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum CorrectionMethod {
    LinearScaling,
    QuantileMapping,
    DeltaChange,
    EmpiricalQuantile,
    VarianceScaling,
}

impl CorrectionMethod {
    /// Resolve a selector such as `"quantile_mapping"`.
    pub fn parse(selector: &str) -> Result<Self> {
        selector.trim().parse().map_err(|_| {
            let known: Vec<String> = Self::iter().map(|m| m.to_string()).collect();
            Error::Validation(format!(
                "unknown correction method '{selector}', expected one of: {}",
                known.join(", ")
            ))
        })
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Self::LinearScaling => "Linear Scaling",
            Self::QuantileMapping => "Quantile Mapping",
            Self::DeltaChange => "Delta Change",
            Self::EmpiricalQuantile => "Empirical Quantile",
            Self::VarianceScaling => "Variance Scaling",
        }
    }

    /// Methods working on paired values need both series on the same dates.
    pub fn requires_alignment(&self) -> bool {
        matches!(
            self,
            Self::LinearScaling | Self::DeltaChange | Self::VarianceScaling
        )
    }

    pub fn apply(&self, observed: &TimeSeries, modeled: &TimeSeries) -> Result<CorrectionResult> {
        debug!(
            method = %self,
            observed = observed.len(),
            modeled = modeled.len(),
            "applying bias correction"
        );
        let corrected = match self {
            Self::LinearScaling => linear_scaling(observed, modeled)?,
            Self::QuantileMapping => quantile_mapping(observed, modeled)?,
            Self::DeltaChange => delta_change(observed, modeled)?,
            Self::EmpiricalQuantile => empirical_quantile(observed, modeled)?,
            Self::VarianceScaling => variance_scaling(observed, modeled)?,
        };
        Ok(CorrectionResult {
            method: *self,
            corrected,
        })
    }
}

/// Corrected series, indexed like the modeled input.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CorrectionResult {
    pub method: CorrectionMethod,
    pub corrected: TimeSeries,
}
