use chrono::{Datelike, Duration, Utc};
use metrics::{counter, histogram};
use sea_orm::{
    sea_query::OnConflict, ActiveValue::Set, ColumnTrait, DatabaseConnection, EntityTrait,
    QueryFilter,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, instrument, warn};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    config::ForecastingConfig,
    entities::{
        demand_prediction::{self, Entity as DemandPredictionEntity, Model as DemandPrediction},
        inventory::{self, Entity as InventoryEntity, Model as InventorySnapshot},
        product::{self, Entity as ProductEntity, Model as ProductModel},
    },
    errors::ServiceError,
    ml::{
        alerts::{Depleting, Urgent},
        classify_action, compute_stock_levels, days_until_stockout, estimate_demand,
        rank_reorder_alerts, rank_stockout_forecasts, suggested_order_quantity, urgency_score,
        RecommendedAction, StockPolicyInput, StockoutRisk,
    },
    services::{
        demand_history::DemandHistoryService,
        enhancement::{DemandEnhancer, EnhancementContext},
    },
};

/// Result of a single-product forecast.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DemandPredictionResponse {
    pub prediction: DemandPrediction,
    pub ai_enhanced: bool,
    pub current_stock: i64,
    pub recommended_action: RecommendedAction,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ai_insights: Option<String>,
}

/// One product's stock recommendation within a vendor run.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct InventoryOptimization {
    pub product_id: Uuid,
    pub product_name: String,
    pub sku: String,
    pub current_stock: i64,
    pub predicted_demand: i64,
    pub confidence_score: f64,
    pub safety_stock: i64,
    pub reorder_point: f64,
    pub recommended_stock_level: f64,
    pub recommended_action: RecommendedAction,
    pub suggested_order_quantity: i64,
}

/// Number of products per recommended action.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct OptimizationSummary {
    pub urgent_reorder: usize,
    pub plan_reorder: usize,
    pub reduce_ordering: usize,
    pub monitor: usize,
}

impl OptimizationSummary {
    fn record(&mut self, action: RecommendedAction) {
        match action {
            RecommendedAction::UrgentReorder => self.urgent_reorder += 1,
            RecommendedAction::PlanReorder => self.plan_reorder += 1,
            RecommendedAction::ReduceOrdering => self.reduce_ordering += 1,
            RecommendedAction::Monitor => self.monitor += 1,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct InventoryOptimizationReport {
    /// Active products in the vendor catalog.
    pub total_products: usize,
    /// Products that had an inventory row and received a forecast.
    pub optimized_products: usize,
    /// Products needing a change, most urgent first.
    pub optimizations: Vec<InventoryOptimization>,
    pub summary: OptimizationSummary,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ReorderAlert {
    pub product_id: Uuid,
    pub product_name: Option<String>,
    pub sku: Option<String>,
    pub current_stock: i64,
    pub minimum_stock_level: i64,
    pub predicted_demand: f64,
    pub urgency_score: f64,
    pub suggested_order_quantity: i64,
    /// Whether an unexpired forecast supplied the demand figure.
    pub has_forecast: bool,
}

impl Urgent for ReorderAlert {
    fn urgency(&self) -> f64 {
        self.urgency_score
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ReorderAlertReport {
    pub alerts_count: usize,
    pub alerts: Vec<ReorderAlert>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct StockoutForecast {
    pub product_id: Uuid,
    pub product_name: Option<String>,
    pub current_stock: i64,
    pub predicted_demand: i64,
    pub daily_demand: f64,
    pub days_until_stockout: f64,
    pub stockout_risk: StockoutRisk,
    pub confidence: f64,
}

impl Depleting for StockoutForecast {
    fn days_until_stockout(&self) -> f64 {
        self.days_until_stockout
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct StockoutReport {
    pub forecast_period_days: u32,
    pub products_analyzed: usize,
    pub high_risk_products: usize,
    pub forecasts: Vec<StockoutForecast>,
}

/// Forecast computed and persisted for one product.
struct ProductForecast {
    prediction: DemandPrediction,
    ai_enhanced: bool,
    insights: Option<String>,
}

/// Demand forecasting and stock optimization over the order log.
#[derive(Clone)]
pub struct ForecastingService {
    db: Arc<DatabaseConnection>,
    history: DemandHistoryService,
    enhancer: Arc<dyn DemandEnhancer>,
    settings: ForecastingConfig,
}

impl ForecastingService {
    pub fn new(
        db: Arc<DatabaseConnection>,
        enhancer: Arc<dyn DemandEnhancer>,
        settings: ForecastingConfig,
    ) -> Self {
        Self {
            history: DemandHistoryService::new(db.clone()),
            db,
            enhancer,
            settings,
        }
    }

    pub fn settings(&self) -> &ForecastingConfig {
        &self.settings
    }

    /// Forecasts one product, persists the forecast and classifies the
    /// product's stock against it.
    #[instrument(skip(self))]
    pub async fn predict_demand(
        &self,
        product_id: Uuid,
        vendor_id: Uuid,
        horizon_days: u32,
    ) -> Result<DemandPredictionResponse, ServiceError> {
        validate_horizon(horizon_days)?;

        let snapshot = self.inventory_snapshot(product_id, vendor_id).await?;
        let forecast = self
            .forecast_product(product_id, vendor_id, horizon_days, snapshot.as_ref(), true)
            .await?;

        let current_stock = snapshot
            .as_ref()
            .map(|s| i64::from(s.current_stock))
            .unwrap_or(0);
        let recommended_action = classify_action(
            current_stock,
            forecast.prediction.recommended_stock_level,
            forecast.prediction.reorder_point,
        );

        info!(
            product_id = %product_id,
            predicted_demand = forecast.prediction.predicted_demand,
            action = %recommended_action,
            ai_enhanced = forecast.ai_enhanced,
            "demand predicted"
        );

        Ok(DemandPredictionResponse {
            prediction: forecast.prediction,
            ai_enhanced: forecast.ai_enhanced,
            current_stock,
            recommended_action,
            ai_insights: forecast.insights,
        })
    }

    /// Forecasts every active product of the vendor that has an inventory row.
    #[instrument(skip(self))]
    pub async fn optimize_inventory(
        &self,
        vendor_id: Uuid,
        horizon_days: u32,
    ) -> Result<InventoryOptimizationReport, ServiceError> {
        validate_horizon(horizon_days)?;

        let products = ProductEntity::find()
            .filter(product::Column::VendorId.eq(vendor_id))
            .filter(product::Column::IsActive.eq(true))
            .all(&*self.db)
            .await?;

        let snapshots: HashMap<Uuid, InventorySnapshot> = InventoryEntity::find()
            .filter(inventory::Column::VendorId.eq(vendor_id))
            .all(&*self.db)
            .await?
            .into_iter()
            .map(|s| (s.product_id, s))
            .collect();

        let mut optimizations = Vec::new();
        let mut summary = OptimizationSummary::default();
        let mut optimized_products = 0;

        for product in &products {
            let Some(snapshot) = snapshots.get(&product.id) else {
                continue;
            };

            let forecast = self
                .forecast_product(product.id, vendor_id, horizon_days, Some(snapshot), false)
                .await?;
            let prediction = forecast.prediction;
            let current_stock = i64::from(snapshot.current_stock);
            let action = classify_action(
                current_stock,
                prediction.recommended_stock_level,
                prediction.reorder_point,
            );

            optimized_products += 1;
            summary.record(action);

            if action.requires_change() {
                optimizations.push(InventoryOptimization {
                    product_id: product.id,
                    product_name: product.name.clone(),
                    sku: product.sku.clone(),
                    current_stock,
                    predicted_demand: prediction.predicted_demand,
                    confidence_score: prediction.confidence_score,
                    safety_stock: prediction.safety_stock,
                    reorder_point: prediction.reorder_point,
                    recommended_stock_level: prediction.recommended_stock_level,
                    recommended_action: action,
                    suggested_order_quantity: suggested_order_quantity(
                        current_stock,
                        prediction.recommended_stock_level,
                    ),
                });
            }
        }

        optimizations.sort_by_key(|o| o.recommended_action.priority());

        counter!("predictive_inventory.optimizations.completed", 1);
        info!(
            vendor_id = %vendor_id,
            total_products = products.len(),
            optimized_products,
            needing_change = optimizations.len(),
            "inventory optimized"
        );

        Ok(InventoryOptimizationReport {
            total_products: products.len(),
            optimized_products,
            optimizations,
            summary,
        })
    }

    /// Products at or below their minimum stock level, most urgent first.
    #[instrument(skip(self))]
    pub async fn generate_reorder_alerts(
        &self,
        vendor_id: Uuid,
    ) -> Result<ReorderAlertReport, ServiceError> {
        let low_stock: Vec<InventorySnapshot> = InventoryEntity::find()
            .filter(inventory::Column::VendorId.eq(vendor_id))
            .all(&*self.db)
            .await?
            .into_iter()
            .filter(InventorySnapshot::is_below_minimum)
            .collect();

        let forecasts: HashMap<Uuid, DemandPrediction> = DemandPredictionEntity::find()
            .filter(demand_prediction::Column::VendorId.eq(vendor_id))
            .filter(demand_prediction::Column::ValidUntil.gt(Utc::now()))
            .all(&*self.db)
            .await?
            .into_iter()
            .map(|f| (f.product_id, f))
            .collect();

        let products = self.products_by_id(&low_stock).await?;

        let mut alerts: Vec<ReorderAlert> = low_stock
            .iter()
            .map(|snapshot| {
                let current_stock = i64::from(snapshot.current_stock);
                let minimum_stock_level = i64::from(snapshot.minimum_stock_level);
                let forecast = forecasts.get(&snapshot.product_id);

                let (predicted_demand, target_level) = match forecast {
                    Some(f) => (f.predicted_demand as f64, f.recommended_stock_level),
                    None => (
                        minimum_stock_level as f64,
                        (minimum_stock_level * 2) as f64,
                    ),
                };
                let product = products.get(&snapshot.product_id);

                ReorderAlert {
                    product_id: snapshot.product_id,
                    product_name: product.map(|p| p.name.clone()),
                    sku: product.map(|p| p.sku.clone()),
                    current_stock,
                    minimum_stock_level,
                    predicted_demand,
                    urgency_score: urgency_score(
                        current_stock,
                        minimum_stock_level,
                        predicted_demand,
                    ),
                    suggested_order_quantity: suggested_order_quantity(
                        current_stock,
                        target_level,
                    ),
                    has_forecast: forecast.is_some(),
                }
            })
            .collect();

        rank_reorder_alerts(&mut alerts);

        counter!("predictive_inventory.reorder_alerts.generated", alerts.len() as u64);

        Ok(ReorderAlertReport {
            alerts_count: alerts.len(),
            alerts,
        })
    }

    /// Products projected to run out within `forecast_days`, soonest first.
    #[instrument(skip(self))]
    pub async fn forecast_stockouts(
        &self,
        vendor_id: Uuid,
        forecast_days: u32,
    ) -> Result<StockoutReport, ServiceError> {
        validate_horizon(forecast_days)?;

        let snapshots = InventoryEntity::find()
            .filter(inventory::Column::VendorId.eq(vendor_id))
            .all(&*self.db)
            .await?;
        let products = self.products_by_id(&snapshots).await?;
        let reference_day = Utc::now().weekday();

        let mut forecasts = Vec::new();
        for snapshot in &snapshots {
            let series = self
                .history
                .daily_demand(snapshot.product_id, self.settings.history_window_days)
                .await?;
            let estimate = estimate_demand(&series, forecast_days, reference_day);
            let daily_demand = estimate.daily_demand(forecast_days);
            let current_stock = i64::from(snapshot.current_stock);
            let days = days_until_stockout(current_stock, daily_demand);

            if days > f64::from(forecast_days) {
                continue;
            }

            forecasts.push(StockoutForecast {
                product_id: snapshot.product_id,
                product_name: products.get(&snapshot.product_id).map(|p| p.name.clone()),
                current_stock,
                predicted_demand: estimate.predicted_demand,
                daily_demand,
                days_until_stockout: days,
                stockout_risk: StockoutRisk::from_days(days),
                confidence: estimate.confidence,
            });
        }

        rank_stockout_forecasts(&mut forecasts);

        let high_risk_products = forecasts
            .iter()
            .filter(|f| f.stockout_risk == StockoutRisk::High)
            .count();

        info!(
            vendor_id = %vendor_id,
            products_analyzed = snapshots.len(),
            at_risk = forecasts.len(),
            high_risk_products,
            "stockouts forecast"
        );

        Ok(StockoutReport {
            forecast_period_days: forecast_days,
            products_analyzed: snapshots.len(),
            high_risk_products,
            forecasts,
        })
    }

    /// Latest persisted forecast, if it has not expired.
    #[instrument(skip(self))]
    pub async fn latest_forecast(
        &self,
        product_id: Uuid,
        vendor_id: Uuid,
    ) -> Result<DemandPrediction, ServiceError> {
        DemandPredictionEntity::find()
            .filter(demand_prediction::Column::ProductId.eq(product_id))
            .filter(demand_prediction::Column::VendorId.eq(vendor_id))
            .filter(demand_prediction::Column::ValidUntil.gt(Utc::now()))
            .one(&*self.db)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("no valid forecast for product {}", product_id))
            })
    }

    async fn forecast_product(
        &self,
        product_id: Uuid,
        vendor_id: Uuid,
        horizon_days: u32,
        snapshot: Option<&InventorySnapshot>,
        allow_enhancement: bool,
    ) -> Result<ProductForecast, ServiceError> {
        let series = self
            .history
            .daily_demand(product_id, self.settings.history_window_days)
            .await?;
        let mut estimate = estimate_demand(&series, horizon_days, Utc::now().weekday());

        let current_stock = snapshot.map(|s| i64::from(s.current_stock)).unwrap_or(0);
        let minimum_stock_level = snapshot
            .map(|s| i64::from(s.minimum_stock_level))
            .unwrap_or(0);
        let lead_time_days = snapshot
            .and_then(|s| s.lead_time_days)
            .and_then(|days| u32::try_from(days).ok())
            .unwrap_or(self.settings.default_lead_time_days);

        let mut ai_enhanced = false;
        let mut insights = None;
        if allow_enhancement {
            let context = EnhancementContext {
                product_id,
                vendor_id,
                horizon_days,
                days_with_sales: series.len(),
                total_units_sold: series.iter().map(|o| o.quantity).sum(),
                current_stock,
                estimate,
            };
            match self.enhancer.enhance(&context).await {
                Ok(Some(enhancement)) => {
                    estimate.predicted_demand = enhancement.predicted_demand;
                    estimate.confidence = enhancement.confidence;
                    insights = enhancement.insights;
                    ai_enhanced = true;
                    counter!("predictive_inventory.enhancements.applied", 1);
                }
                Ok(None) => {}
                Err(e) => {
                    warn!(product_id = %product_id, error = %e, "demand enhancement unavailable");
                    counter!("predictive_inventory.enhancements.failed", 1);
                }
            }
        }

        let levels = compute_stock_levels(&StockPolicyInput {
            predicted_demand: estimate.predicted_demand,
            horizon_days,
            lead_time_days,
            service_level: self.settings.service_level,
            demand_variability: estimate.variability,
            minimum_stock_level,
        });

        let created_at = Utc::now();
        let valid_until = Duration::try_hours(self.settings.forecast_validity_hours)
            .and_then(|validity| created_at.checked_add_signed(validity))
            .ok_or_else(|| {
                ServiceError::InternalError(format!(
                    "forecast validity of {} hours is out of range",
                    self.settings.forecast_validity_hours
                ))
            })?;
        let prediction = DemandPrediction {
            id: Uuid::new_v4(),
            product_id,
            vendor_id,
            prediction_horizon_days: i32::try_from(horizon_days).map_err(|_| {
                ServiceError::ValidationError(format!(
                    "horizon of {} days is out of range",
                    horizon_days
                ))
            })?,
            predicted_demand: estimate.predicted_demand,
            confidence_score: estimate.confidence,
            trend_factor: estimate.trend,
            seasonality_factor: estimate.seasonality,
            demand_variability: estimate.variability,
            safety_stock: levels.safety_stock,
            recommended_stock_level: levels.recommended_stock_level,
            reorder_point: levels.reorder_point,
            ai_enhanced,
            created_at,
            valid_until,
        };

        let prediction = self.persist_forecast(prediction).await?;

        counter!("predictive_inventory.forecasts.generated", 1);
        histogram!(
            "predictive_inventory.forecast.confidence",
            prediction.confidence_score
        );

        Ok(ProductForecast {
            prediction,
            ai_enhanced,
            insights,
        })
    }

    /// Upserts on (product_id, vendor_id); the newest forecast replaces the
    /// previous one and concurrent writers race with last write winning.
    async fn persist_forecast(
        &self,
        prediction: DemandPrediction,
    ) -> Result<DemandPrediction, ServiceError> {
        use demand_prediction::Column;

        let active = demand_prediction::ActiveModel {
            id: Set(prediction.id),
            product_id: Set(prediction.product_id),
            vendor_id: Set(prediction.vendor_id),
            prediction_horizon_days: Set(prediction.prediction_horizon_days),
            predicted_demand: Set(prediction.predicted_demand),
            confidence_score: Set(prediction.confidence_score),
            trend_factor: Set(prediction.trend_factor),
            seasonality_factor: Set(prediction.seasonality_factor),
            demand_variability: Set(prediction.demand_variability),
            safety_stock: Set(prediction.safety_stock),
            recommended_stock_level: Set(prediction.recommended_stock_level),
            reorder_point: Set(prediction.reorder_point),
            ai_enhanced: Set(prediction.ai_enhanced),
            created_at: Set(prediction.created_at),
            valid_until: Set(prediction.valid_until),
        };

        DemandPredictionEntity::insert(active)
            .on_conflict(
                OnConflict::columns([Column::ProductId, Column::VendorId])
                    .update_columns([
                        Column::PredictionHorizonDays,
                        Column::PredictedDemand,
                        Column::ConfidenceScore,
                        Column::TrendFactor,
                        Column::SeasonalityFactor,
                        Column::DemandVariability,
                        Column::SafetyStock,
                        Column::RecommendedStockLevel,
                        Column::ReorderPoint,
                        Column::AiEnhanced,
                        Column::CreatedAt,
                        Column::ValidUntil,
                    ])
                    .to_owned(),
            )
            .exec_without_returning(&*self.db)
            .await?;

        // The row keeps the id of its first insert; read it back for the caller.
        let stored = DemandPredictionEntity::find()
            .filter(Column::ProductId.eq(prediction.product_id))
            .filter(Column::VendorId.eq(prediction.vendor_id))
            .one(&*self.db)
            .await?;

        Ok(stored.unwrap_or(prediction))
    }

    async fn inventory_snapshot(
        &self,
        product_id: Uuid,
        vendor_id: Uuid,
    ) -> Result<Option<InventorySnapshot>, ServiceError> {
        Ok(InventoryEntity::find()
            .filter(inventory::Column::ProductId.eq(product_id))
            .filter(inventory::Column::VendorId.eq(vendor_id))
            .one(&*self.db)
            .await?)
    }

    async fn products_by_id(
        &self,
        snapshots: &[InventorySnapshot],
    ) -> Result<HashMap<Uuid, ProductModel>, ServiceError> {
        if snapshots.is_empty() {
            return Ok(HashMap::new());
        }

        let ids: Vec<Uuid> = snapshots.iter().map(|s| s.product_id).collect();
        Ok(ProductEntity::find()
            .filter(product::Column::Id.is_in(ids))
            .all(&*self.db)
            .await?
            .into_iter()
            .map(|p| (p.id, p))
            .collect())
    }
}

/// Longest horizon or stockout window a request may ask for.
pub const MAX_HORIZON_DAYS: u32 = 3650;

fn validate_horizon(days: u32) -> Result<(), ServiceError> {
    if days == 0 {
        return Err(ServiceError::ValidationError(
            "forecast horizon must be at least one day".to_string(),
        ));
    }
    if days > MAX_HORIZON_DAYS {
        return Err(ServiceError::ValidationError(format!(
            "forecast horizon must be at most {} days",
            MAX_HORIZON_DAYS
        )));
    }
    Ok(())
}
