//! Predictive Inventory Library
//!
//! Demand forecasting and stock-level optimization over a multi-vendor
//! order log, exposed over HTTP.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

// Core modules
pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod handlers;
pub mod middleware_helpers;
pub mod migrator;
pub mod ml;
pub mod openapi;
pub mod services;
pub mod tracing;

use axum::{http::HeaderValue, routing::get, Router};
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
};

use crate::services::{enhancement, DemandEnhancer, ForecastingService};

// App state definition
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DatabaseConnection>,
    pub config: config::AppConfig,
    pub forecasting: Arc<ForecastingService>,
}

impl AppState {
    /// Wires services from configuration, choosing the enhancer it asks for.
    pub fn new(db: Arc<DatabaseConnection>, config: config::AppConfig) -> Self {
        let enhancer = enhancement::from_config(&config.enhancement);
        Self::with_enhancer(db, config, enhancer)
    }

    pub fn with_enhancer(
        db: Arc<DatabaseConnection>,
        config: config::AppConfig,
        enhancer: Arc<dyn DemandEnhancer>,
    ) -> Self {
        let forecasting = Arc::new(ForecastingService::new(
            db.clone(),
            enhancer,
            config.forecasting.clone(),
        ));

        Self {
            db,
            config,
            forecasting,
        }
    }
}

/// Full HTTP application: health, actions, forecasts and Swagger UI.
pub fn app_router(state: AppState) -> Router {
    let cors = cors_layer(&state.config);

    Router::new()
        .route("/", get(|| async { "predictive-inventory up" }))
        .merge(handlers::health::health_routes())
        .merge(handlers::predictive_inventory::predictive_inventory_routes())
        .merge(handlers::forecasts::forecast_routes())
        .with_state(Arc::new(state))
        .merge(openapi::swagger_ui())
        // HTTP tracing layer for consistent request/response telemetry
        .layer(crate::tracing::configure_http_tracing())
        .layer(CompressionLayer::new())
        .layer(cors)
        // Ensure every request carries a request id for traceability
        .layer(axum::middleware::from_fn(
            middleware_helpers::request_id::request_id_middleware,
        ))
}

/// Any origin unless explicit origins are configured.
fn cors_layer(config: &config::AppConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .cors_origins()
        .iter()
        .filter_map(|origin| HeaderValue::from_str(origin).ok())
        .collect();

    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    if origins.is_empty() {
        layer.allow_origin(Any)
    } else {
        layer.allow_origin(origins)
    }
}
