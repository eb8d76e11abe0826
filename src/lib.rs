//! Lake level forecasting and bias correction.
//!
//! - [`forecast`]: regime-aware forecaster over a trained regressor ensemble
//! - [`correction`]: five bias-correction transforms with before/after scoring
//! - [`forecast::metrics`]: goodness-of-fit metrics (RMSE, MAE, Bias, r, NSE, KGE)
//!
//! The HTTP surface in [`api`] is a thin boundary over these.

pub mod api;
pub mod config;
pub mod correction;
pub mod domain;
pub mod error;
pub mod forecast;
pub mod ml;
pub mod state;
pub mod tabular;
pub mod telemetry;
pub mod utils;

pub use error::{Error, Result};
