use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;
use utoipa::IntoParams;
use uuid::Uuid;

use crate::{entities::DemandPrediction, errors::ServiceError, handlers::AppState};

#[derive(Debug, Deserialize, IntoParams)]
pub struct ForecastQuery {
    /// Product the forecast belongs to
    pub product_id: Uuid,
    /// Vendor owning the product
    pub vendor_id: Uuid,
}

pub fn forecast_routes() -> Router<Arc<AppState>> {
    Router::new().route("/api/v1/forecasts", get(get_latest_forecast))
}

/// Latest unexpired forecast for a product
#[utoipa::path(
    get,
    path = "/api/v1/forecasts",
    params(ForecastQuery),
    responses(
        (status = 200, description = "Forecast returned", body = DemandPrediction,
            headers(("X-Request-Id" = String, description = "Unique request id"))
        ),
        (status = 400, description = "Missing or malformed query parameters"),
        (status = 404, description = "No unexpired forecast", body = crate::errors::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse)
    ),
    tag = "Forecasts"
)]
pub async fn get_latest_forecast(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ForecastQuery>,
) -> Result<Json<DemandPrediction>, ServiceError> {
    let forecast = state
        .forecasting
        .latest_forecast(query.product_id, query.vendor_id)
        .await?;
    Ok(Json(forecast))
}
