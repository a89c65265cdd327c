//! Time-series demand estimation over a daily sales series.
//!
//! The estimate combines a linear trend, a day-of-week seasonality factor and
//! the dispersion of daily quantities. The `confidence` value it produces is a
//! heuristic score that grows with history length and shrinks with relative
//! volatility. It is not a statistical confidence interval and should not be
//! presented as one.

use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Lower bound of the confidence score.
pub const MIN_CONFIDENCE: f64 = 0.1;
/// Upper bound of the confidence score.
pub const MAX_CONFIDENCE: f64 = 0.95;
/// Days of history at which the history term of the confidence score saturates.
const CONFIDENCE_HISTORY_DAYS: f64 = 30.0;

/// Units sold on a single calendar day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct SalesObservation {
    pub date: NaiveDate,
    pub quantity: i64,
}

impl SalesObservation {
    pub fn new(date: NaiveDate, quantity: i64) -> Self {
        Self { date, quantity }
    }
}

/// Result of [`estimate_demand`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct DemandEstimate {
    /// Units expected over the horizon, never negative.
    pub predicted_demand: i64,
    /// Heuristic score in `[0.1, 0.95]`.
    pub confidence: f64,
    /// Fractional growth per period (OLS slope over mean demand).
    pub trend: f64,
    /// Relative weight of the reference weekday; 1 is neutral.
    pub seasonality: f64,
    /// Population standard deviation of daily quantities.
    pub variability: f64,
}

impl DemandEstimate {
    /// Estimate returned when there is no sales history at all.
    pub const fn empty() -> Self {
        Self {
            predicted_demand: 0,
            confidence: MIN_CONFIDENCE,
            trend: 0.0,
            seasonality: 1.0,
            variability: 0.0,
        }
    }

    /// Predicted units per day over the given horizon.
    pub fn daily_demand(&self, horizon_days: u32) -> f64 {
        if horizon_days == 0 {
            return 0.0;
        }
        self.predicted_demand as f64 / horizon_days as f64
    }
}

/// Projects demand over `horizon_days` from a daily series.
///
/// `reference_day` selects the weekday used for the seasonality factor,
/// normally the weekday of the request.
pub fn estimate_demand(
    series: &[SalesObservation],
    horizon_days: u32,
    reference_day: Weekday,
) -> DemandEstimate {
    if series.is_empty() {
        return DemandEstimate::empty();
    }

    let quantities: Vec<f64> = series.iter().map(|o| o.quantity as f64).collect();
    let avg_daily_demand = average_daily_demand(&quantities);
    let trend = linear_trend(&quantities);
    let seasonality = weekday_seasonality(series, reference_day);
    let variability = population_std_dev(&quantities);

    let projected = avg_daily_demand * horizon_days as f64 * (1.0 + trend) * seasonality;
    let predicted_demand = projected.max(0.0).round() as i64;

    DemandEstimate {
        predicted_demand,
        confidence: confidence_score(series.len(), variability, avg_daily_demand),
        trend,
        seasonality,
        variability,
    }
}

/// Mean of the observed daily quantities, 0 for an empty slice.
pub fn average_daily_demand(quantities: &[f64]) -> f64 {
    if quantities.is_empty() {
        return 0.0;
    }
    quantities.iter().sum::<f64>() / quantities.len() as f64
}

/// Ordinary-least-squares slope against the day index, normalized by the mean.
pub fn linear_trend(quantities: &[f64]) -> f64 {
    let n = quantities.len();
    if n < 2 {
        return 0.0;
    }

    let mean_y = average_daily_demand(quantities);
    if mean_y == 0.0 {
        return 0.0;
    }
    let mean_x = (n - 1) as f64 / 2.0;

    let (covariance, variance) = quantities
        .iter()
        .enumerate()
        .fold((0.0, 0.0), |(cov, var), (i, &y)| {
            let dx = i as f64 - mean_x;
            (cov + dx * (y - mean_y), var + dx * dx)
        });

    if variance == 0.0 {
        return 0.0;
    }

    (covariance / variance) / mean_y
}

/// Mean demand on `reference_day` relative to the mean of the seven weekday means.
///
/// Weekdays with no observations count as zero in the seven-day mean. Returns
/// 1 when the reference weekday has no observations.
pub fn weekday_seasonality(series: &[SalesObservation], reference_day: Weekday) -> f64 {
    let mut totals = [0.0_f64; 7];
    let mut counts = [0_u32; 7];

    for observation in series {
        let idx = observation.date.weekday().num_days_from_sunday() as usize;
        totals[idx] += observation.quantity as f64;
        counts[idx] += 1;
    }

    let weekday_means: Vec<f64> = totals
        .iter()
        .zip(counts.iter())
        .map(|(total, &count)| if count > 0 { total / count as f64 } else { 0.0 })
        .collect();

    let reference = reference_day.num_days_from_sunday() as usize;
    if counts[reference] == 0 {
        return 1.0;
    }

    let overall = weekday_means.iter().sum::<f64>() / 7.0;
    if overall <= 0.0 {
        return 1.0;
    }

    weekday_means[reference] / overall
}

/// Population standard deviation, 0 for an empty slice.
pub fn population_std_dev(quantities: &[f64]) -> f64 {
    if quantities.is_empty() {
        return 0.0;
    }
    let mean = average_daily_demand(quantities);
    let variance =
        quantities.iter().map(|q| (q - mean).powi(2)).sum::<f64>() / quantities.len() as f64;
    variance.sqrt()
}

fn confidence_score(days_of_data: usize, variability: f64, avg_daily_demand: f64) -> f64 {
    let relative_volatility = if avg_daily_demand > 0.0 {
        (variability / avg_daily_demand).min(1.0)
    } else {
        1.0
    };
    let raw = (days_of_data as f64 / CONFIDENCE_HISTORY_DAYS) * (1.0 - relative_volatility);
    raw.clamp(MIN_CONFIDENCE, MAX_CONFIDENCE)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn empty_series_returns_neutral_estimate() {
        let estimate = estimate_demand(&[], 30, Weekday::Mon);
        assert_eq!(estimate, DemandEstimate::empty());
        assert_eq!(estimate.predicted_demand, 0);
        assert_eq!(estimate.confidence, 0.1);
        assert_eq!(estimate.trend, 0.0);
        assert_eq!(estimate.seasonality, 1.0);
        assert_eq!(estimate.variability, 0.0);
    }

    #[test]
    fn three_day_series_matches_hand_computation() {
        // 2024-01-01 is a Monday.
        let series = [
            SalesObservation::new(day(2024, 1, 1), 10),
            SalesObservation::new(day(2024, 1, 2), 12),
            SalesObservation::new(day(2024, 1, 3), 8),
        ];

        // Reference weekday without data keeps seasonality neutral.
        let estimate = estimate_demand(&series, 30, Weekday::Sat);

        // slope = -2 / 2 = -1, mean = 10
        assert!((estimate.trend - (-0.1)).abs() < 1e-12);
        assert_eq!(estimate.seasonality, 1.0);
        assert_eq!(estimate.predicted_demand, 270);

        let expected_sd = (8.0_f64 / 3.0).sqrt();
        assert!((estimate.variability - expected_sd).abs() < 1e-12);
        // 3/30 * (1 - 0.163) is below the floor
        assert_eq!(estimate.confidence, MIN_CONFIDENCE);
    }

    #[test]
    fn seasonality_uses_seven_day_average_of_weekday_means() {
        // Monday 10, Tuesday 4; other weekdays empty.
        let series = [
            SalesObservation::new(day(2024, 1, 1), 10),
            SalesObservation::new(day(2024, 1, 2), 4),
        ];
        let monday = weekday_seasonality(&series, Weekday::Mon);
        assert!((monday - 10.0 / 2.0).abs() < 1e-12);

        let tuesday = weekday_seasonality(&series, Weekday::Tue);
        assert!((tuesday - 4.0 / 2.0).abs() < 1e-12);
    }

    #[test]
    fn flat_series_has_zero_trend_and_full_history_confidence() {
        let start = day(2024, 1, 1);
        let series: Vec<_> = (0..60)
            .map(|i| SalesObservation::new(start + chrono::Duration::days(i), 5))
            .collect();

        let estimate = estimate_demand(&series, 10, Weekday::Wed);
        assert_eq!(estimate.trend, 0.0);
        assert_eq!(estimate.variability, 0.0);
        assert!((estimate.seasonality - 1.0).abs() < 1e-12);
        assert_eq!(estimate.predicted_demand, 50);
        assert_eq!(estimate.confidence, MAX_CONFIDENCE);
    }

    #[test]
    fn steep_decline_never_predicts_negative_demand() {
        let start = day(2024, 3, 4);
        let series: Vec<_> = (0..10)
            .map(|i| SalesObservation::new(start + chrono::Duration::days(i), 100 - i * 11))
            .collect();

        let estimate = estimate_demand(&series, 90, Weekday::Sun);
        assert!(estimate.trend < -0.1);
        assert!(estimate.predicted_demand >= 0);
    }

    #[test]
    fn single_observation_has_no_trend() {
        assert_eq!(linear_trend(&[42.0]), 0.0);
        assert_eq!(linear_trend(&[]), 0.0);
    }

    #[test]
    fn daily_demand_handles_zero_horizon() {
        let estimate = DemandEstimate {
            predicted_demand: 30,
            ..DemandEstimate::empty()
        };
        assert_eq!(estimate.daily_demand(0), 0.0);
        assert_eq!(estimate.daily_demand(30), 1.0);
    }
}
