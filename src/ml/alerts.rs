use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use strum::Display;
use utoipa::ToSchema;

/// Ceiling of the urgency score.
pub const MAX_URGENCY: f64 = 10.0;
/// Floor applied to daily demand when projecting a stockout.
const MIN_DAILY_DEMAND: f64 = 0.1;

/// Risk tier of a projected stockout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, ToSchema)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum StockoutRisk {
    High,
    Medium,
    Low,
}

impl StockoutRisk {
    pub fn from_days(days_until_stockout: f64) -> Self {
        if days_until_stockout < 7.0 {
            StockoutRisk::High
        } else if days_until_stockout < 14.0 {
            StockoutRisk::Medium
        } else {
            StockoutRisk::Low
        }
    }
}

/// Combines stock deficit and demand pressure into a 0..=10 score.
///
/// Current stock is floored at one unit so an empty shelf does not divide by zero.
pub fn urgency_score(current_stock: i64, minimum_stock: i64, predicted_demand: f64) -> f64 {
    let current = current_stock.max(1) as f64;
    let score = (minimum_stock as f64 / current) * (predicted_demand / current) * 2.0;
    score.min(MAX_URGENCY)
}

pub fn days_until_stockout(current_stock: i64, daily_demand: f64) -> f64 {
    current_stock as f64 / daily_demand.max(MIN_DAILY_DEMAND)
}

/// Units needed to bring stock up to `target`, never negative.
pub fn suggested_order_quantity(current_stock: i64, target_level: f64) -> i64 {
    (target_level - current_stock as f64).ceil().max(0.0) as i64
}

/// Anything that carries an urgency score.
pub trait Urgent {
    fn urgency(&self) -> f64;
}

/// Anything that carries a projected stockout horizon.
pub trait Depleting {
    fn days_until_stockout(&self) -> f64;
}

/// Most urgent first.
pub fn rank_reorder_alerts<T: Urgent>(alerts: &mut [T]) {
    alerts.sort_by(|a, b| {
        b.urgency()
            .partial_cmp(&a.urgency())
            .unwrap_or(Ordering::Equal)
    });
}

/// Soonest stockout first.
pub fn rank_stockout_forecasts<T: Depleting>(forecasts: &mut [T]) {
    forecasts.sort_by(|a, b| {
        a.days_until_stockout()
            .partial_cmp(&b.days_until_stockout())
            .unwrap_or(Ordering::Equal)
    });
}
