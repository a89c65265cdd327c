use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Persisted demand forecast. One row per (product, vendor); each run
/// overwrites the previous one and the row stops being served after
/// `valid_until`.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize, ToSchema)]
#[sea_orm(table_name = "demand_predictions")]
#[schema(as = DemandPrediction)]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub product_id: Uuid,
    pub vendor_id: Uuid,
    pub prediction_horizon_days: i32,
    pub predicted_demand: i64,
    pub confidence_score: f64,
    pub trend_factor: f64,
    pub seasonality_factor: f64,
    pub demand_variability: f64,
    pub safety_stock: i64,
    pub recommended_stock_level: f64,
    pub reorder_point: f64,
    pub ai_enhanced: bool,
    pub created_at: DateTime<Utc>,
    pub valid_until: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
