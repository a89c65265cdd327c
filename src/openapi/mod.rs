use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Predictive Inventory API",
        version = "1.0.0",
        description = r#"
# Predictive Inventory API

Demand forecasting and stock-level recommendations for a multi-vendor storefront.

## Actions

`POST /api/v1/predictive-inventory` takes a JSON body with an `action` field and
that action's camelCase parameters:

- `predict_demand`: `productId`, `vendorId`, `predictionHorizon` (days, default 30)
- `optimize_inventory`: `vendorId`, `timeHorizon` (days, default 30)
- `generate_reorder_alerts`: `vendorId`
- `forecast_stockouts`: `vendorId`, `forecastDays` (days, default 30)

Any failure on that endpoint, including an unknown action, is answered with
HTTP 500 and a body of the form:

```json
{ "error": "Invalid action" }
```

## Confidence

`confidence_score` is a heuristic that grows with the amount of sales history
and shrinks with relative demand volatility. It is not a statistical
confidence interval.
        "#,
        license(
            name = "MIT",
            url = "https://opensource.org/licenses/MIT"
        )
    ),
    servers(
        (url = "http://localhost:8080", description = "Local development")
    ),
    tags(
        (name = "Predictive Inventory", description = "Forecasting and stock optimization actions"),
        (name = "Forecasts", description = "Persisted demand forecasts"),
        (name = "Health", description = "Health check endpoints")
    ),
    paths(
        crate::handlers::predictive_inventory::dispatch,
        crate::handlers::forecasts::get_latest_forecast,
        crate::handlers::health::health_check,
    ),
    components(
        schemas(
            // Requests
            crate::handlers::predictive_inventory::PredictiveInventoryRequest,
            crate::handlers::predictive_inventory::PredictDemandParams,
            crate::handlers::predictive_inventory::OptimizeInventoryParams,
            crate::handlers::predictive_inventory::ReorderAlertParams,
            crate::handlers::predictive_inventory::ForecastStockoutsParams,
            // Results
            crate::entities::DemandPrediction,
            crate::services::forecasting::DemandPredictionResponse,
            crate::services::forecasting::InventoryOptimizationReport,
            crate::services::forecasting::InventoryOptimization,
            crate::services::forecasting::OptimizationSummary,
            crate::services::forecasting::ReorderAlertReport,
            crate::services::forecasting::ReorderAlert,
            crate::services::forecasting::StockoutReport,
            crate::services::forecasting::StockoutForecast,
            crate::ml::RecommendedAction,
            crate::ml::StockoutRisk,
            crate::handlers::health::HealthResponse,
            // Error types
            crate::errors::ErrorResponse,
            crate::errors::FunctionErrorBody
        )
    )
)]
pub struct ApiDocV1;

pub fn swagger_ui() -> SwaggerUi {
    SwaggerUi::new("/swagger-ui")
        .url("/api-docs/openapi.json", ApiDocV1::openapi())
        .config(utoipa_swagger_ui::Config::from("/api-docs/openapi.json").try_it_out_enabled(true))
}
