//! Property tests for the correction and metric engines.

use approx::relative_eq;
use chrono::{Duration, NaiveDate};
use lake_level_forecast::correction::{linear_scaling, quantile_mapping, variance_scaling};
use lake_level_forecast::domain::{ForecastRequest, TimeSeries};
use lake_level_forecast::forecast::calculate_metrics;
use lake_level_forecast::utils::stats::{mean, std_dev};
use proptest::prelude::*;

fn series_at(start: NaiveDate, values: &[f64]) -> TimeSeries {
    TimeSeries::from_parts(start.iter_days().take(values.len()).collect(), values.to_vec()).unwrap()
}

fn origin() -> NaiveDate {
    NaiveDate::from_ymd_opt(2000, 1, 1).unwrap()
}

fn levels(min_len: usize) -> impl Strategy<Value = Vec<f64>> {
    prop::collection::vec(1.0f64..500.0, min_len..60)
}

fn is_spread(values: &[f64]) -> bool {
    std_dev(values) > 1e-6
}

proptest! {
    #[test]
    fn quantile_mapping_onto_itself_is_identity(values in levels(1)) {
        let x = series_at(origin(), &values);
        let out = quantile_mapping(&x, &x).unwrap();
        prop_assert_eq!(out.dates(), x.dates());
        for (a, b) in out.values().iter().zip(&values) {
            prop_assert!(relative_eq!(*a, *b, max_relative = 1e-12));
        }
    }

    #[test]
    fn linear_scaling_matches_observed_mean(obs in levels(1), factor in 0.1f64..10.0) {
        let sim: Vec<f64> = obs.iter().rev().map(|v| v * factor).collect();
        let out = linear_scaling(&series_at(origin(), &obs), &series_at(origin(), &sim)).unwrap();
        prop_assert!(relative_eq!(mean(&out.values()), mean(&obs), max_relative = 1e-9));
    }

    #[test]
    fn variance_scaling_matches_observed_moments(obs in levels(2), sim in levels(2)) {
        let n = obs.len().min(sim.len());
        let (obs, sim) = (&obs[..n], &sim[..n]);
        prop_assume!(is_spread(obs) && is_spread(sim));

        let out = variance_scaling(&series_at(origin(), obs), &series_at(origin(), sim)).unwrap();
        let values = out.values();
        prop_assert!(relative_eq!(mean(&values), mean(obs), max_relative = 1e-9));
        prop_assert!(relative_eq!(std_dev(&values), std_dev(obs), max_relative = 1e-7));
    }

    #[test]
    fn metrics_of_a_series_against_itself_are_perfect(values in levels(2)) {
        prop_assume!(is_spread(&values));
        let x = series_at(origin(), &values);
        let m = calculate_metrics(&x, &x);
        prop_assert_eq!(m.rmse, 0.0);
        prop_assert_eq!(m.mae, 0.0);
        prop_assert_eq!(m.bias, 0.0);
        prop_assert_eq!(m.nse, 1.0);
        prop_assert!(relative_eq!(m.correlation, 1.0, epsilon = 1e-9));
        prop_assert!(relative_eq!(m.kge, 1.0, epsilon = 1e-9));
    }

    #[test]
    fn metrics_without_shared_dates_are_nan(obs in levels(1), sim in levels(1)) {
        let later = origin() + Duration::days(obs.len() as i64);
        let m = calculate_metrics(&series_at(origin(), &obs), &series_at(later, &sim));
        prop_assert!(m.is_all_nan());
    }

    #[test]
    fn reversed_or_empty_ranges_are_rejected(offset in 0i64..20_000, back in 0i64..5_000) {
        let start = origin() + Duration::days(offset);
        let end = start - Duration::days(back);
        let err = ForecastRequest::new(start, end).unwrap_err();
        prop_assert_eq!(err.kind(), "InvalidRange");
    }
}
