#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{Method, Request, StatusCode},
    Router,
};
use chrono::{DateTime, Duration, Utc};
use predictive_inventory::{
    config::AppConfig,
    db,
    entities::{inventory, order, order_item, product},
    services::{DemandEnhancer, NoopEnhancer},
    AppState,
};
use sea_orm::{ActiveModelTrait, DatabaseConnection, Set};
use serde_json::Value;
use tower::ServiceExt;
use uuid::Uuid;

/// Helper harness for spinning up the application backed by an in-memory SQLite database.
pub struct TestApp {
    router: Router,
    pub state: AppState,
    pub db: Arc<DatabaseConnection>,
}

impl TestApp {
    /// Construct a new test application with fresh database state.
    pub async fn new() -> Self {
        Self::with_enhancer(Arc::new(NoopEnhancer)).await
    }

    pub async fn with_enhancer(enhancer: Arc<dyn DemandEnhancer>) -> Self {
        let mut cfg = AppConfig::new(
            "sqlite::memory:".to_string(),
            "127.0.0.1".to_string(),
            18_080,
            "test".to_string(),
        );
        // A single connection keeps every query on the same in-memory database.
        cfg.db_max_connections = 1;
        cfg.db_min_connections = 1;

        let pool = db::establish_connection_from_app_config(&cfg)
            .await
            .expect("failed to create test database");
        db::run_migrations(&pool)
            .await
            .expect("failed to run migrations in tests");

        let db = Arc::new(pool);
        let state = AppState::with_enhancer(db.clone(), cfg, enhancer);
        let router = predictive_inventory::app_router(state.clone());

        Self { router, state, db }
    }

    /// Send a request against the router.
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
    ) -> axum::response::Response {
        let mut builder = Request::builder().method(method).uri(uri);
        let body = if let Some(json) = body {
            builder = builder.header("content-type", "application/json");
            Body::from(serde_json::to_vec(&json).expect("failed to serialize json request body"))
        } else {
            Body::empty()
        };
        let request = builder.body(body).expect("failed to build request");
        self.router_request(request).await
    }

    /// Send a prebuilt request, for custom headers or raw bodies.
    pub async fn router_request(&self, request: Request<Body>) -> axum::response::Response {
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router error during test request")
    }

    /// POST an action to the dispatch endpoint and decode the JSON reply.
    pub async fn dispatch(&self, body: Value) -> (StatusCode, Value) {
        let response = self
            .request(Method::POST, "/api/v1/predictive-inventory", Some(body))
            .await;
        let status = response.status();
        (status, response_json(response).await)
    }

    pub async fn seed_product(&self, vendor_id: Uuid, name: &str) -> Uuid {
        let id = Uuid::new_v4();
        product::ActiveModel {
            id: Set(id),
            vendor_id: Set(vendor_id),
            name: Set(name.to_string()),
            sku: Set(format!("SKU-{}", &id.simple().to_string()[..8])),
            is_active: Set(true),
            created_at: Set(Utc::now()),
        }
        .insert(&*self.db)
        .await
        .expect("insert product");
        id
    }

    pub async fn seed_inactive_product(&self, vendor_id: Uuid, name: &str) -> Uuid {
        let id = self.seed_product(vendor_id, name).await;
        product::ActiveModel {
            id: Set(id),
            is_active: Set(false),
            ..Default::default()
        }
        .update(&*self.db)
        .await
        .expect("deactivate product");
        id
    }

    pub async fn seed_inventory(
        &self,
        product_id: Uuid,
        vendor_id: Uuid,
        current_stock: i32,
        minimum_stock_level: i32,
    ) {
        self.seed_inventory_with_lead_time(
            product_id,
            vendor_id,
            current_stock,
            minimum_stock_level,
            None,
        )
        .await;
    }

    pub async fn seed_inventory_with_lead_time(
        &self,
        product_id: Uuid,
        vendor_id: Uuid,
        current_stock: i32,
        minimum_stock_level: i32,
        lead_time_days: Option<i32>,
    ) {
        inventory::ActiveModel {
            id: Set(Uuid::new_v4()),
            product_id: Set(product_id),
            vendor_id: Set(vendor_id),
            current_stock: Set(current_stock),
            minimum_stock_level: Set(minimum_stock_level),
            maximum_stock_level: Set(None),
            lead_time_days: Set(lead_time_days),
            updated_at: Set(Utc::now()),
        }
        .insert(&*self.db)
        .await
        .expect("insert inventory");
    }

    /// One order with a single line, placed `days_ago` days before now.
    pub async fn seed_sale(
        &self,
        product_id: Uuid,
        vendor_id: Uuid,
        quantity: i32,
        days_ago: i64,
        status: &str,
    ) {
        let placed_at: DateTime<Utc> = Utc::now() - Duration::days(days_ago);
        let order_id = Uuid::new_v4();
        order::ActiveModel {
            id: Set(order_id),
            vendor_id: Set(vendor_id),
            status: Set(status.to_string()),
            created_at: Set(placed_at),
        }
        .insert(&*self.db)
        .await
        .expect("insert order");

        order_item::ActiveModel {
            id: Set(Uuid::new_v4()),
            order_id: Set(order_id),
            product_id: Set(product_id),
            quantity: Set(quantity),
            created_at: Set(placed_at),
        }
        .insert(&*self.db)
        .await
        .expect("insert order item");
    }

    /// A completed sale of `quantity` units on each of the last `days` days.
    pub async fn seed_daily_sales(&self, product_id: Uuid, vendor_id: Uuid, quantity: i32, days: i64) {
        for days_ago in 1..=days {
            self.seed_sale(product_id, vendor_id, quantity, days_ago, order::STATUS_COMPLETED)
                .await;
        }
    }
}

pub async fn response_json(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read response body");
    if bytes.is_empty() {
        return Value::Null;
    }
    serde_json::from_slice(&bytes).unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
}
