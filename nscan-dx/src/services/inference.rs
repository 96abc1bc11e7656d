//! Classification endpoint client
//!
//! Wraps the external inference endpoint behind the `InferenceProvider`
//! trait so tests can substitute an in-memory fake. The HTTP client posts
//! raw image bytes and expects an ordered JSON array of label/confidence
//! pairs; the order is preserved as returned, never re-sorted here.

use nscan_common::db::models::Prediction;
use nscan_common::Error;
use std::time::Duration;
use thiserror::Error;

const USER_AGENT: &str = concat!("nscan-dx/", env!("CARGO_PKG_VERSION"));

/// Whole-operation bound for one classification call
const INFERENCE_TIMEOUT: Duration = Duration::from_secs(120);

/// Inference client errors
#[derive(Debug, Error)]
pub enum InferenceError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Inference request timed out")]
    Timeout,

    #[error("Endpoint error {0}: {1}")]
    Api(u16, String),

    #[error("Failed to parse endpoint response: {0}")]
    Parse(String),

    #[error("Endpoint returned no predictions")]
    Empty,
}

impl From<InferenceError> for Error {
    fn from(e: InferenceError) -> Self {
        match e {
            InferenceError::Parse(msg) => Error::Serialization(msg),
            other => Error::Unavailable(other.to_string()),
        }
    }
}

/// Classification backend seam
///
/// Implementations return the ranked prediction list exactly as the
/// endpoint produced it (descending confidence).
#[async_trait::async_trait]
pub trait InferenceProvider: Send + Sync {
    async fn classify(&self, image: &[u8]) -> Result<Vec<Prediction>, InferenceError>;
}

/// HTTP client for the external classification endpoint
pub struct HttpInferenceClient {
    http_client: reqwest::Client,
    endpoint_url: String,
}

impl HttpInferenceClient {
    pub fn new(endpoint_url: String) -> Result<Self, InferenceError> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(INFERENCE_TIMEOUT)
            .build()
            .map_err(|e| InferenceError::Network(e.to_string()))?;

        Ok(Self {
            http_client,
            endpoint_url,
        })
    }
}

#[async_trait::async_trait]
impl InferenceProvider for HttpInferenceClient {
    async fn classify(&self, image: &[u8]) -> Result<Vec<Prediction>, InferenceError> {
        tracing::debug!(bytes = image.len(), "Invoking classification endpoint");

        let response = self
            .http_client
            .post(&self.endpoint_url)
            .header(reqwest::header::CONTENT_TYPE, "application/x-image")
            .body(image.to_vec())
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    InferenceError::Timeout
                } else {
                    InferenceError::Network(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(InferenceError::Api(status.as_u16(), error_text));
        }

        let predictions: Vec<Prediction> = response
            .json()
            .await
            .map_err(|e| InferenceError::Parse(e.to_string()))?;

        if predictions.is_empty() {
            return Err(InferenceError::Empty);
        }

        if let Some(top) = predictions.first() {
            tracing::info!(
                label = %top.label,
                confidence = %top.confidence,
                classes = predictions.len(),
                "Classification completed"
            );
        }

        Ok(predictions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prediction_list_parses_in_endpoint_order() {
        let body = r#"[
            {"label": "Class 2", "confidence": "87.3"},
            {"label": "Class 1", "confidence": "9.1"},
            {"label": "Class 3", "confidence": "3.6"}
        ]"#;

        let predictions: Vec<Prediction> = serde_json::from_str(body).unwrap();
        assert_eq!(predictions.len(), 3);
        assert_eq!(predictions[0].label, "Class 2");
        assert_eq!(predictions[0].confidence, "87.3");
        assert_eq!(predictions[2].label, "Class 3");
    }

    #[test]
    fn parse_failure_maps_to_serialization_class() {
        let err: Error = InferenceError::Parse("bad json".to_string()).into();
        assert!(matches!(err, Error::Serialization(_)));
    }

    #[test]
    fn endpoint_failures_map_to_unavailable_class() {
        for e in [
            InferenceError::Network("connection refused".to_string()),
            InferenceError::Timeout,
            InferenceError::Api(503, "scaling".to_string()),
            InferenceError::Empty,
        ] {
            let err: Error = e.into();
            assert!(matches!(err, Error::Unavailable(_)));
        }
    }
}
