//! Pure demand and stock math. Nothing in here touches the database.

pub mod alerts;
pub mod forecasting;
pub mod optimization;

pub use alerts::{
    days_until_stockout, rank_reorder_alerts, rank_stockout_forecasts, suggested_order_quantity,
    urgency_score, StockoutRisk,
};
pub use forecasting::{estimate_demand, DemandEstimate, SalesObservation};
pub use optimization::{
    classify_action, compute_stock_levels, RecommendedAction, StockLevels, StockPolicyInput,
};
