//! Property-based tests for the demand and stock math.
//!
//! These cover the bounds every forecast must respect regardless of the
//! shape of the sales history that produced it.

use chrono::{Duration, NaiveDate, Weekday};
use predictive_inventory::ml::{
    classify_action, compute_stock_levels, days_until_stockout, estimate_demand,
    suggested_order_quantity, urgency_score, DemandEstimate, RecommendedAction, SalesObservation,
    StockPolicyInput, StockoutRisk,
};
use proptest::prelude::*;

// Strategies for generating test data
fn series_strategy() -> impl Strategy<Value = Vec<SalesObservation>> {
    prop::collection::vec(0i64..5_000, 1..120).prop_map(|quantities| {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        quantities
            .into_iter()
            .enumerate()
            .map(|(i, q)| SalesObservation::new(start + Duration::days(i as i64), q))
            .collect()
    })
}

fn weekday_strategy() -> impl Strategy<Value = Weekday> {
    prop_oneof![
        Just(Weekday::Mon),
        Just(Weekday::Tue),
        Just(Weekday::Wed),
        Just(Weekday::Thu),
        Just(Weekday::Fri),
        Just(Weekday::Sat),
        Just(Weekday::Sun),
    ]
}

fn policy_strategy() -> impl Strategy<Value = StockPolicyInput> {
    (
        0i64..1_000_000,
        1u32..366,
        0u32..120,
        0.5f64..0.999,
        0.0f64..10_000.0,
        0i64..10_000,
    )
        .prop_map(
            |(predicted, horizon, lead, service_level, variability, minimum)| StockPolicyInput {
                predicted_demand: predicted,
                horizon_days: horizon,
                lead_time_days: lead,
                service_level,
                demand_variability: variability,
                minimum_stock_level: minimum,
            },
        )
}

// Property: estimates stay within their documented bounds
proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    #[test]
    fn predicted_demand_is_never_negative(
        series in series_strategy(),
        horizon in 1u32..366,
        day in weekday_strategy(),
    ) {
        let estimate = estimate_demand(&series, horizon, day);
        prop_assert!(estimate.predicted_demand >= 0);
    }

    #[test]
    fn confidence_stays_in_range(
        series in series_strategy(),
        horizon in 1u32..366,
        day in weekday_strategy(),
    ) {
        let estimate = estimate_demand(&series, horizon, day);
        prop_assert!(
            (0.1..=0.95).contains(&estimate.confidence),
            "confidence out of range: {}",
            estimate.confidence
        );
        prop_assert!(estimate.variability >= 0.0);
    }

    #[test]
    fn empty_history_is_always_neutral(horizon in 1u32..366, day in weekday_strategy()) {
        prop_assert_eq!(estimate_demand(&[], horizon, day), DemandEstimate::empty());
    }
}

// Property: stock levels are ordered and floored
proptest! {
    #![proptest_config(ProptestConfig::with_cases(1000))]

    #[test]
    fn reorder_point_never_exceeds_recommendation(input in policy_strategy()) {
        let levels = compute_stock_levels(&input);
        prop_assert!(levels.safety_stock >= 0);
        prop_assert!(levels.reorder_point <= levels.recommended_stock_level);
        prop_assert!(levels.recommended_stock_level >= input.minimum_stock_level as f64);
    }

    #[test]
    fn below_reorder_point_is_always_urgent(input in policy_strategy(), stock in 0i64..1_000_000) {
        let levels = compute_stock_levels(&input);
        let action = classify_action(stock, levels.recommended_stock_level, levels.reorder_point);
        if (stock as f64) < levels.reorder_point {
            prop_assert_eq!(action, RecommendedAction::UrgentReorder);
        } else {
            prop_assert_ne!(action, RecommendedAction::UrgentReorder);
        }
    }

    #[test]
    fn urgency_is_capped(
        stock in -100i64..10_000,
        minimum in 0i64..10_000,
        predicted in 0.0f64..1_000_000.0,
    ) {
        let score = urgency_score(stock, minimum, predicted);
        prop_assert!((0.0..=10.0).contains(&score), "urgency out of range: {}", score);
    }

    #[test]
    fn suggested_quantity_is_never_negative(stock in -100i64..100_000, target in 0.0f64..100_000.0) {
        prop_assert!(suggested_order_quantity(stock, target) >= 0);
    }

    #[test]
    fn stockout_risk_follows_days_left(stock in 0i64..100_000, daily in 0.0f64..1_000.0) {
        let days = days_until_stockout(stock, daily);
        prop_assert!(days.is_finite());
        let expected = if days < 7.0 {
            StockoutRisk::High
        } else if days < 14.0 {
            StockoutRisk::Medium
        } else {
            StockoutRisk::Low
        };
        prop_assert_eq!(StockoutRisk::from_days(days), expected);
    }
}
