//! Forecasting
//!
//! - `features`: calendar, one-hot and lagged-target feature engineering
//! - `engine`: regime selection and recursive continuation
//! - `metrics`: goodness-of-fit scores

pub mod engine;
pub mod features;
pub mod metrics;

pub use engine::*;
pub use features::*;
pub use metrics::*;
