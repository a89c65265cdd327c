use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use utoipa::ToSchema;

/// Fixed z-score applied to safety stock, roughly a one-tailed 95% bound.
pub const SAFETY_STOCK_Z_SCORE: f64 = 1.65;

/// Inputs to the stock-level computation for a single product.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StockPolicyInput {
    pub predicted_demand: i64,
    pub horizon_days: u32,
    pub lead_time_days: u32,
    /// Target probability of not stocking out during lead time.
    pub service_level: f64,
    pub demand_variability: f64,
    pub minimum_stock_level: i64,
}

/// Stock thresholds derived from a demand projection.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct StockLevels {
    pub safety_stock: i64,
    pub reorder_point: f64,
    pub recommended_stock_level: f64,
}

/// What the vendor should do about a product's stock.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, ToSchema,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum RecommendedAction {
    UrgentReorder,
    PlanReorder,
    ReduceOrdering,
    Monitor,
}

impl RecommendedAction {
    /// Lower sorts first; urgent work leads any listing.
    pub fn priority(self) -> u8 {
        match self {
            RecommendedAction::UrgentReorder => 0,
            RecommendedAction::PlanReorder => 1,
            RecommendedAction::ReduceOrdering => 2,
            RecommendedAction::Monitor => 3,
        }
    }

    pub fn requires_change(self) -> bool {
        !matches!(self, RecommendedAction::Monitor)
    }
}

/// Safety stock, reorder point and recommended level for the given policy.
///
/// Safety stock multiplies the fixed z-score by the service level itself
/// rather than deriving z from it. That is not how textbook safety stock is
/// computed, but existing stock plans depend on these exact numbers, so the
/// formula is kept as-is.
///
/// `horizon_days` must be non-zero; callers validate it.
pub fn compute_stock_levels(input: &StockPolicyInput) -> StockLevels {
    let lead_time = input.lead_time_days as f64;
    let safety_stock = (SAFETY_STOCK_Z_SCORE
        * lead_time.sqrt()
        * input.demand_variability
        * input.service_level)
        .ceil() as i64;

    let predicted = input.predicted_demand as f64;
    let daily_demand = predicted / input.horizon_days.max(1) as f64;
    let reorder_point = daily_demand * lead_time + safety_stock as f64;
    let recommended_stock_level =
        (reorder_point + predicted / 2.0).max(input.minimum_stock_level as f64);

    StockLevels {
        safety_stock,
        reorder_point,
        recommended_stock_level,
    }
}

/// First matching rule wins: below reorder point, below 80% of the
/// recommended level, above 150% of it, otherwise monitor.
pub fn classify_action(
    current_stock: i64,
    recommended_stock_level: f64,
    reorder_point: f64,
) -> RecommendedAction {
    let current = current_stock as f64;
    if current < reorder_point {
        RecommendedAction::UrgentReorder
    } else if current < recommended_stock_level * 0.8 {
        RecommendedAction::PlanReorder
    } else if current > recommended_stock_level * 1.5 {
        RecommendedAction::ReduceOrdering
    } else {
        RecommendedAction::Monitor
    }
}
