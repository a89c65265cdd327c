mod common;

use std::sync::Arc;

use assert_matches::assert_matches;
use axum::http::StatusCode;
use common::TestApp;
use predictive_inventory::{
    config::EnhancementConfig,
    errors::ServiceError,
    ml::DemandEstimate,
    services::{
        enhancement::{DemandEnhancement, EnhancementContext},
        DemandEnhancer, HttpDemandEnhancer,
    },
};
use serde_json::json;
use uuid::Uuid;
use wiremock::{
    matchers::{header, method, path},
    Mock, MockServer, ResponseTemplate,
};

const COMPLETIONS_PATH: &str = "/v1/chat/completions";

fn enhancer_for(server: &MockServer) -> HttpDemandEnhancer {
    let config = EnhancementConfig {
        enabled: true,
        api_url: format!("{}{}", server.uri(), COMPLETIONS_PATH),
        api_key: Some("test-key".to_string()),
        ..Default::default()
    };
    HttpDemandEnhancer::with_client(&config, reqwest::Client::new())
}

fn context() -> EnhancementContext {
    EnhancementContext {
        product_id: Uuid::new_v4(),
        vendor_id: Uuid::new_v4(),
        horizon_days: 30,
        days_with_sales: 30,
        total_units_sold: 300,
        current_stock: 20,
        estimate: DemandEstimate::empty(),
    }
}

fn completion(content: &str) -> serde_json::Value {
    json!({
        "id": "chatcmpl-1",
        "object": "chat.completion",
        "choices": [
            { "index": 0, "message": { "role": "assistant", "content": content } }
        ]
    })
}

async fn mount_reply(server: &MockServer, template: ResponseTemplate) {
    Mock::given(method("POST"))
        .and(path(COMPLETIONS_PATH))
        .and(header("authorization", "Bearer test-key"))
        .respond_with(template)
        .mount(server)
        .await;
}

#[tokio::test]
async fn parses_and_normalizes_model_reply() {
    let server = MockServer::start().await;
    mount_reply(
        &server,
        ResponseTemplate::new(200).set_body_json(completion(
            "```json\n{\"predicted_demand\": 412.6, \"confidence\": 0.99, \"insights\": \"Holiday uplift\"}\n```",
        )),
    )
    .await;

    let enhancement = enhancer_for(&server).enhance(&context()).await.unwrap();

    assert_eq!(
        enhancement,
        Some(DemandEnhancement {
            predicted_demand: 413,
            confidence: 0.95,
            insights: Some("Holiday uplift".to_string()),
        })
    );
}

#[tokio::test]
async fn upstream_failure_is_an_external_service_error() {
    let server = MockServer::start().await;
    mount_reply(&server, ResponseTemplate::new(500).set_body_string("overloaded")).await;

    let result = enhancer_for(&server).enhance(&context()).await;
    assert_matches!(result, Err(ServiceError::ExternalServiceError(msg)) if msg.contains("500"));
}

#[tokio::test]
async fn unparseable_reply_is_an_error() {
    let server = MockServer::start().await;
    mount_reply(
        &server,
        ResponseTemplate::new(200).set_body_json(completion("demand looks steady")),
    )
    .await;

    let result = enhancer_for(&server).enhance(&context()).await;
    assert_matches!(result, Err(ServiceError::ExternalServiceError(_)));
}

#[tokio::test]
async fn empty_choices_mean_no_enhancement() {
    let server = MockServer::start().await;
    mount_reply(
        &server,
        ResponseTemplate::new(200).set_body_json(json!({ "choices": [] })),
    )
    .await;

    let result = enhancer_for(&server).enhance(&context()).await;
    assert_matches!(result, Ok(None));
}

#[tokio::test]
async fn enhanced_forecast_replaces_statistical_demand() {
    let server = MockServer::start().await;
    mount_reply(
        &server,
        ResponseTemplate::new(200).set_body_json(completion(
            "{\"predicted_demand\": 450, \"confidence\": 0.8, \"insights\": \"Promotion next week\"}",
        )),
    )
    .await;

    let app = TestApp::with_enhancer(Arc::new(enhancer_for(&server))).await;
    let vendor_id = Uuid::new_v4();
    let product_id = app.seed_product(vendor_id, "Promoted Scarf").await;
    app.seed_inventory(product_id, vendor_id, 20, 5).await;
    app.seed_daily_sales(product_id, vendor_id, 10, 30).await;

    let (status, body) = app
        .dispatch(json!({
            "action": "predict_demand",
            "productId": product_id,
            "vendorId": vendor_id,
        }))
        .await;

    assert_eq!(status, StatusCode::OK, "body: {body}");
    assert_eq!(body["ai_enhanced"], true);
    assert_eq!(body["ai_insights"], "Promotion next week");
    assert_eq!(body["prediction"]["predicted_demand"], 450);
    assert_eq!(body["prediction"]["confidence_score"], 0.8);
    assert_eq!(body["prediction"]["ai_enhanced"], true);
    // 15/day over the 7 day lead time
    assert_eq!(body["prediction"]["reorder_point"], 105.0);
}

#[tokio::test]
async fn enhancer_outage_falls_back_to_statistical_forecast() {
    let server = MockServer::start().await;
    mount_reply(&server, ResponseTemplate::new(503)).await;

    let app = TestApp::with_enhancer(Arc::new(enhancer_for(&server))).await;
    let vendor_id = Uuid::new_v4();
    let product_id = app.seed_product(vendor_id, "Plain Scarf").await;
    app.seed_daily_sales(product_id, vendor_id, 10, 30).await;

    let (status, body) = app
        .dispatch(json!({
            "action": "predict_demand",
            "productId": product_id,
            "vendorId": vendor_id,
        }))
        .await;

    assert_eq!(status, StatusCode::OK, "body: {body}");
    assert_eq!(body["ai_enhanced"], false);
    assert!(body.get("ai_insights").is_none());
    assert_eq!(body["prediction"]["predicted_demand"], 300);
}

#[tokio::test]
async fn bulk_optimization_never_calls_the_enhancer() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion(
            "{\"predicted_demand\": 1, \"confidence\": 0.5}",
        )))
        .expect(0)
        .mount(&server)
        .await;

    let app = TestApp::with_enhancer(Arc::new(enhancer_for(&server))).await;
    let vendor_id = Uuid::new_v4();
    let product_id = app.seed_product(vendor_id, "Bulk Item").await;
    app.seed_inventory(product_id, vendor_id, 3, 1).await;

    let (status, _) = app
        .dispatch(json!({ "action": "optimize_inventory", "vendorId": vendor_id }))
        .await;
    assert_eq!(status, StatusCode::OK);

    server.verify().await;
}
