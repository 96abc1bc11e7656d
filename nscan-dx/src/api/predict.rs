//! Diagnosis submission endpoint

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

use nscan_common::db::models::Prediction;
use nscan_common::Error;

use crate::api::ApiError;
use crate::services::diagnosis;
use crate::AppState;

/// POST /api/predict request body
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PredictRequest {
    /// Base64 or data-URI image payload
    pub image: Option<String>,
    /// Original filename, display only
    pub image_name: Option<String>,
    /// Owner; defaults to "anonymous"
    pub user_id: Option<String>,
}

/// POST /api/predict response body
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PredictResponse {
    pub diagnosis_id: String,
    pub predictions: Vec<Prediction>,
}

/// POST /api/predict
///
/// Stores the image, invokes the classifier, persists one diagnosis record,
/// and returns the new id with the ranked predictions.
pub async fn predict(
    State(state): State<AppState>,
    Json(request): Json<PredictRequest>,
) -> Result<Json<PredictResponse>, ApiError> {
    let image = request
        .image
        .as_deref()
        .filter(|payload| !payload.trim().is_empty())
        .ok_or_else(|| ApiError(Error::InvalidInput("Image not provided".to_string())))?;

    let outcome = diagnosis::submit(
        &state.db,
        &state.images,
        state.inference.as_ref(),
        image,
        request.image_name.as_deref(),
        request.user_id.as_deref(),
    )
    .await?;

    Ok(Json(PredictResponse {
        diagnosis_id: outcome.diagnosis_id,
        predictions: outcome.predictions,
    }))
}
