use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Per-vendor stock snapshot, maintained by the inventory subsystem.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "inventory")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub product_id: Uuid,
    pub vendor_id: Uuid,
    pub current_stock: i32,
    pub minimum_stock_level: i32,
    pub maximum_stock_level: Option<i32>,
    /// Replenishment lead time; falls back to the configured default when unset.
    pub lead_time_days: Option<i32>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn is_below_minimum(&self) -> bool {
        self.current_stock <= self.minimum_stock_level
    }
}
