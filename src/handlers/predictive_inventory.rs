use axum::{body::Bytes, extract::State, response::IntoResponse, routing::post, Json, Router};
use serde::{de::DeserializeOwned, Deserialize};
use serde_json::Value;
use std::sync::Arc;
use strum::{Display, EnumString};
use tracing::{info, warn};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    errors::{FunctionError, ServiceError},
    handlers::AppState,
};

/// Actions accepted by the dispatch endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "snake_case")]
pub enum PredictiveInventoryAction {
    PredictDemand,
    OptimizeInventory,
    GenerateReorderAlerts,
    ForecastStockouts,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PredictDemandParams {
    pub product_id: Uuid,
    pub vendor_id: Uuid,
    /// Days to forecast; defaults to 30
    pub prediction_horizon: Option<u32>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OptimizeInventoryParams {
    pub vendor_id: Uuid,
    /// Days to forecast; defaults to 30
    pub time_horizon: Option<u32>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReorderAlertParams {
    pub vendor_id: Uuid,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ForecastStockoutsParams {
    pub vendor_id: Uuid,
    /// Stockout window in days; defaults to 30
    pub forecast_days: Option<u32>,
}

/// Request body: an `action` plus that action's camelCase parameters.
#[derive(Debug, Deserialize, ToSchema)]
#[schema(example = json!({
    "action": "predict_demand",
    "productId": "550e8400-e29b-41d4-a716-446655440000",
    "vendorId": "6ba7b810-9dad-11d1-80b4-00c04fd430c8",
    "predictionHorizon": 30
}))]
pub struct PredictiveInventoryRequest {
    /// `predict_demand`, `optimize_inventory`, `generate_reorder_alerts` or `forecast_stockouts`
    pub action: String,
}

pub fn predictive_inventory_routes() -> Router<Arc<AppState>> {
    Router::new().route("/api/v1/predictive-inventory", post(dispatch))
}

/// Run a predictive inventory action
#[utoipa::path(
    post,
    path = "/api/v1/predictive-inventory",
    request_body = PredictiveInventoryRequest,
    responses(
        (status = 200, description = "Action result; shape depends on the action",
            headers(("X-Request-Id" = String, description = "Unique request id"))
        ),
        (status = 500, description = "Any failure, including an invalid action", body = crate::errors::FunctionErrorBody)
    ),
    tag = "Predictive Inventory"
)]
pub async fn dispatch(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<impl IntoResponse, FunctionError> {
    let payload: Value = serde_json::from_slice(&body)
        .map_err(|e| ServiceError::BadRequest(format!("invalid JSON body: {}", e)))?;

    let action = payload
        .get("action")
        .and_then(Value::as_str)
        .and_then(|a| a.parse::<PredictiveInventoryAction>().ok())
        .ok_or_else(|| {
            warn!(action = ?payload.get("action"), "rejected predictive inventory action");
            ServiceError::InvalidAction
        })?;

    info!(%action, "dispatching predictive inventory action");

    let forecasting = &state.forecasting;
    let default_horizon = forecasting.settings().default_horizon_days;

    let result = match action {
        PredictiveInventoryAction::PredictDemand => {
            let params: PredictDemandParams = parse_params(payload)?;
            to_value(
                forecasting
                    .predict_demand(
                        params.product_id,
                        params.vendor_id,
                        params.prediction_horizon.unwrap_or(default_horizon),
                    )
                    .await?,
            )?
        }
        PredictiveInventoryAction::OptimizeInventory => {
            let params: OptimizeInventoryParams = parse_params(payload)?;
            to_value(
                forecasting
                    .optimize_inventory(
                        params.vendor_id,
                        params.time_horizon.unwrap_or(default_horizon),
                    )
                    .await?,
            )?
        }
        PredictiveInventoryAction::GenerateReorderAlerts => {
            let params: ReorderAlertParams = parse_params(payload)?;
            to_value(forecasting.generate_reorder_alerts(params.vendor_id).await?)?
        }
        PredictiveInventoryAction::ForecastStockouts => {
            let params: ForecastStockoutsParams = parse_params(payload)?;
            to_value(
                forecasting
                    .forecast_stockouts(
                        params.vendor_id,
                        params.forecast_days.unwrap_or(default_horizon),
                    )
                    .await?,
            )?
        }
    };

    Ok(Json(result))
}

fn parse_params<T: DeserializeOwned>(payload: Value) -> Result<T, ServiceError> {
    serde_json::from_value(payload)
        .map_err(|e| ServiceError::BadRequest(format!("invalid parameters: {}", e)))
}

fn to_value<T: serde::Serialize>(result: T) -> Result<Value, ServiceError> {
    Ok(serde_json::to_value(result)?)
}
