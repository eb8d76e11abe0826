//! The five bias-correction transforms.
//!
//! Each takes an observed reference and a modeled series and returns the
//! corrected series on the modeled series' dates. Empty input is rejected;
//! degenerate statistics (zero mean, zero spread) propagate as NaN or inf.

use tracing::warn;

use crate::domain::TimeSeries;
use crate::error::{Error, Result};
use crate::utils::stats;

fn require_non_empty(observed: &TimeSeries, modeled: &TimeSeries) -> Result<()> {
    if observed.is_empty() {
        return Err(Error::Validation("observed series is empty".to_string()));
    }
    if modeled.is_empty() {
        return Err(Error::Validation("modeled series is empty".to_string()));
    }
    Ok(())
}

fn require_aligned(observed: &TimeSeries, modeled: &TimeSeries, method: &str) -> Result<()> {
    require_non_empty(observed, modeled)?;
    if !observed.is_aligned_with(modeled) {
        warn!(
            method,
            observed = observed.len(),
            modeled = modeled.len(),
            "correction inputs are not aligned"
        );
        return Err(Error::Validation(format!(
            "{method} needs observed and modeled series on the same dates \
             (observed has {} points, modeled has {})",
            observed.len(),
            modeled.len()
        )));
    }
    Ok(())
}

/// `modeled * mean(observed) / mean(modeled)`.
pub fn linear_scaling(observed: &TimeSeries, modeled: &TimeSeries) -> Result<TimeSeries> {
    require_aligned(observed, modeled, "linear scaling")?;
    let factor = stats::mean(&observed.values()) / stats::mean(&modeled.values());
    modeled.with_values(modeled.values().iter().map(|m| m * factor).collect())
}

/// Map each modeled value from the modeled distribution onto the observed one.
///
/// Both series are sorted and each modeled value is interpolated on the
/// sorted-modeled axis against the sorted observations. When the lengths
/// differ the observed distribution is resampled at the modeled ranks.
pub fn quantile_mapping(observed: &TimeSeries, modeled: &TimeSeries) -> Result<TimeSeries> {
    require_non_empty(observed, modeled)?;
    let values = modeled.values();
    let sorted_modeled = stats::sorted(&values);
    let sorted_observed = stats::sorted(&observed.values());

    let targets = if sorted_observed.len() == sorted_modeled.len() {
        sorted_observed
    } else {
        stats::linspace(0.0, 100.0, sorted_modeled.len())
            .into_iter()
            .map(|q| stats::percentile_sorted(&sorted_observed, q))
            .collect()
    };

    modeled.with_values(
        values
            .iter()
            .map(|&m| stats::interp(m, &sorted_modeled, &targets))
            .collect(),
    )
}

/// `modeled + (observed[last] - observed[first])`.
pub fn delta_change(observed: &TimeSeries, modeled: &TimeSeries) -> Result<TimeSeries> {
    require_aligned(observed, modeled, "delta change")?;
    let change = match (observed.first(), observed.last()) {
        (Some(first), Some(last)) => last.value - first.value,
        _ => return Err(Error::Validation("observed series is empty".to_string())),
    };
    modeled.with_values(modeled.values().iter().map(|m| m + change).collect())
}

/// Interpolate modeled values on `len(observed)` evenly spaced modeled
/// percentiles, mapped to the sorted observations.
pub fn empirical_quantile(observed: &TimeSeries, modeled: &TimeSeries) -> Result<TimeSeries> {
    require_non_empty(observed, modeled)?;
    let values = modeled.values();
    let sorted_observed = stats::sorted(&observed.values());
    let breakpoints = stats::percentiles(
        &values,
        &stats::linspace(0.0, 100.0, sorted_observed.len()),
    );

    modeled.with_values(
        values
            .iter()
            .map(|&m| stats::interp(m, &breakpoints, &sorted_observed))
            .collect(),
    )
}

/// `(modeled - mean(modeled)) * std(observed) / std(modeled) + mean(observed)`.
pub fn variance_scaling(observed: &TimeSeries, modeled: &TimeSeries) -> Result<TimeSeries> {
    require_aligned(observed, modeled, "variance scaling")?;
    let obs = observed.values();
    let values = modeled.values();
    let mod_mean = stats::mean(&values);
    let obs_mean = stats::mean(&obs);
    let ratio = stats::std_dev(&obs) / stats::std_dev(&values);

    modeled.with_values(
        values
            .iter()
            .map(|m| (m - mod_mean) * ratio + obs_mean)
            .collect(),
    )
}
