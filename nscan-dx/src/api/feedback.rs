//! Feedback submission endpoint

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

use crate::api::ApiError;
use crate::services::feedback;
use crate::AppState;

/// POST /api/feedback request body
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackRequest {
    #[serde(default)]
    pub diagnosis_id: String,
    #[serde(default)]
    pub rating: String,
    /// Required for 'down'; derived from the top prediction for 'up'
    pub selected_class: Option<String>,
}

/// POST /api/feedback response body
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackResponse {
    pub message: String,
    pub diagnosis_id: String,
}

/// POST /api/feedback
///
/// Persists one feedback row referencing an existing diagnosis; unknown
/// diagnosis ids are rejected with 404 before any write.
pub async fn save_feedback(
    State(state): State<AppState>,
    Json(request): Json<FeedbackRequest>,
) -> Result<Json<FeedbackResponse>, ApiError> {
    let record = feedback::submit(
        &state.db,
        &request.diagnosis_id,
        &request.rating,
        request.selected_class.as_deref(),
    )
    .await?;

    Ok(Json(FeedbackResponse {
        message: "Feedback saved successfully".to_string(),
        diagnosis_id: record.diagnosis_id,
    }))
}
