use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, instrument, warn};
use uuid::Uuid;

use crate::{
    config::EnhancementConfig,
    errors::ServiceError,
    ml::forecasting::{DemandEstimate, MAX_CONFIDENCE, MIN_CONFIDENCE},
};

const SYSTEM_PROMPT: &str = "You are an inventory demand analyst. Given a statistical \
demand estimate for one product, return a JSON object with the fields \
predicted_demand (number of units over the horizon), confidence (0 to 1) and \
insights (short text). Return only the JSON object.";

/// What the enhancer is told about a product's statistical forecast.
#[derive(Debug, Clone, Serialize)]
pub struct EnhancementContext {
    pub product_id: Uuid,
    pub vendor_id: Uuid,
    pub horizon_days: u32,
    pub days_with_sales: usize,
    pub total_units_sold: i64,
    pub current_stock: i64,
    pub estimate: DemandEstimate,
}

/// Adjusted forecast returned by an enhancer, already normalized.
#[derive(Debug, Clone, PartialEq)]
pub struct DemandEnhancement {
    pub predicted_demand: i64,
    pub confidence: f64,
    pub insights: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawEnhancement {
    predicted_demand: f64,
    confidence: f64,
    #[serde(default)]
    insights: Option<String>,
}

impl From<RawEnhancement> for DemandEnhancement {
    fn from(raw: RawEnhancement) -> Self {
        let predicted_demand = if raw.predicted_demand.is_finite() {
            raw.predicted_demand.max(0.0).round() as i64
        } else {
            0
        };
        let confidence = if raw.confidence.is_finite() {
            raw.confidence.clamp(MIN_CONFIDENCE, MAX_CONFIDENCE)
        } else {
            MIN_CONFIDENCE
        };

        Self {
            predicted_demand,
            confidence,
            insights: raw.insights.filter(|s| !s.trim().is_empty()),
        }
    }
}

/// Optional adjustment of a single-product forecast by an external model.
///
/// `Ok(None)` means no enhancement is available. Callers treat errors the
/// same way after logging them.
#[async_trait]
pub trait DemandEnhancer: Send + Sync {
    async fn enhance(
        &self,
        context: &EnhancementContext,
    ) -> Result<Option<DemandEnhancement>, ServiceError>;
}

/// Enhancer used when no external model is configured.
#[derive(Debug, Clone, Default)]
pub struct NoopEnhancer;

#[async_trait]
impl DemandEnhancer for NoopEnhancer {
    async fn enhance(
        &self,
        _context: &EnhancementContext,
    ) -> Result<Option<DemandEnhancement>, ServiceError> {
        Ok(None)
    }
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Calls an OpenAI-compatible chat completions endpoint once per forecast.
pub struct HttpDemandEnhancer {
    client: Client,
    api_url: String,
    api_key: String,
    model: String,
}

impl HttpDemandEnhancer {
    /// Build an enhancer with a client honoring the configured timeout.
    pub fn new(config: &EnhancementConfig) -> Result<Self, ServiceError> {
        let client = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| {
                ServiceError::InternalError(format!("failed to construct HTTP client: {}", e))
            })?;

        Ok(Self::with_client(config, client))
    }

    /// Build an enhancer from an existing client.
    pub fn with_client(config: &EnhancementConfig, client: Client) -> Self {
        Self {
            client,
            api_url: config.api_url.clone(),
            api_key: config.api_key.clone().unwrap_or_default(),
            model: config.model.clone(),
        }
    }
}

#[async_trait]
impl DemandEnhancer for HttpDemandEnhancer {
    #[instrument(skip(self, context), fields(product_id = %context.product_id))]
    async fn enhance(
        &self,
        context: &EnhancementContext,
    ) -> Result<Option<DemandEnhancement>, ServiceError> {
        let body = json!({
            "model": self.model,
            "temperature": 0.2,
            "response_format": { "type": "json_object" },
            "messages": [
                { "role": "system", "content": SYSTEM_PROMPT },
                { "role": "user", "content": serde_json::to_string(context)? },
            ],
        });

        let response = self
            .client
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                ServiceError::ExternalServiceError(format!("enhancement request failed: {}", e))
            })?;

        let status = response.status();
        let bytes = response.bytes().await.map_err(|e| {
            ServiceError::ExternalServiceError(format!("failed to read enhancement response: {}", e))
        })?;

        if !status.is_success() {
            return Err(ServiceError::ExternalServiceError(format!(
                "enhancement API error (status: {}): {}",
                status,
                String::from_utf8_lossy(&bytes)
            )));
        }

        let completion: ChatCompletionResponse = serde_json::from_slice(&bytes).map_err(|e| {
            ServiceError::ExternalServiceError(format!("malformed enhancement response: {}", e))
        })?;

        let Some(content) = completion
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
        else {
            debug!("enhancement response carried no content");
            return Ok(None);
        };

        let Some(object) = extract_json_object(&content) else {
            return Err(ServiceError::ExternalServiceError(
                "enhancement content is not a JSON object".to_string(),
            ));
        };

        let raw: RawEnhancement = serde_json::from_str(object).map_err(|e| {
            ServiceError::ExternalServiceError(format!("unexpected enhancement payload: {}", e))
        })?;

        Ok(Some(raw.into()))
    }
}

/// Outermost `{...}` span of a model reply, tolerating code fences around it.
fn extract_json_object(content: &str) -> Option<&str> {
    let start = content.find('{')?;
    let end = content.rfind('}')?;
    (end > start).then(|| &content[start..=end])
}

/// Picks the HTTP enhancer when it is enabled and keyed, the no-op one otherwise.
pub fn from_config(config: &EnhancementConfig) -> Arc<dyn DemandEnhancer> {
    if !config.is_active() {
        return Arc::new(NoopEnhancer);
    }

    match HttpDemandEnhancer::new(config) {
        Ok(enhancer) => Arc::new(enhancer),
        Err(e) => {
            warn!(error = %e, "demand enhancement disabled");
            Arc::new(NoopEnhancer)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_object_from_fenced_reply() {
        let reply = "```json\n{\"predicted_demand\": 12, \"confidence\": 0.7}\n```";
        assert_eq!(
            extract_json_object(reply),
            Some("{\"predicted_demand\": 12, \"confidence\": 0.7}")
        );
        assert_eq!(extract_json_object("no json here"), None);
    }

    #[test]
    fn normalizes_out_of_range_values() {
        let enhancement: DemandEnhancement = RawEnhancement {
            predicted_demand: -4.2,
            confidence: 1.7,
            insights: Some("   ".to_string()),
        }
        .into();

        assert_eq!(enhancement.predicted_demand, 0);
        assert_eq!(enhancement.confidence, MAX_CONFIDENCE);
        assert_eq!(enhancement.insights, None);
    }

    #[tokio::test]
    async fn inactive_config_yields_noop() {
        let config = EnhancementConfig {
            enabled: true,
            api_key: None,
            ..Default::default()
        };
        assert!(!config.is_active());
        let enhancer = from_config(&config);
        let context = EnhancementContext {
            product_id: Uuid::nil(),
            vendor_id: Uuid::nil(),
            horizon_days: 30,
            days_with_sales: 0,
            total_units_sold: 0,
            current_stock: 0,
            estimate: DemandEstimate::empty(),
        };
        assert_eq!(enhancer.enhance(&context).await.unwrap(), None);
    }
}
