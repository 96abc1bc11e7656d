//! Signed image display URL resolution
//!
//! Serves stored scan bytes for URLs produced by the image store. The
//! signature covers the key and expiry, so neither can be altered without
//! the shared secret.

use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use serde_json::json;

use crate::services::image_store::ImageStoreError;
use crate::AppState;

/// Query parameters of a signed display URL
#[derive(Debug, Deserialize)]
pub struct ImageQuery {
    pub expires: i64,
    pub sig: String,
}

/// GET /api/images/{key}?expires=&sig=
pub async fn get_image(
    State(state): State<AppState>,
    Path(key): Path<String>,
    Query(query): Query<ImageQuery>,
) -> Result<Response, ImagesError> {
    state
        .images
        .verify(&key, query.expires, &query.sig)
        .map_err(|e| ImagesError::Forbidden(e.to_string()))?;

    let bytes = state.images.load(&key).await.map_err(|e| match e {
        ImageStoreError::NotFound(key) => ImagesError::NotFound(key),
        ImageStoreError::InvalidKey(key) => ImagesError::NotFound(key),
        ImageStoreError::Io(e) => ImagesError::Internal(e.to_string()),
    })?;

    let content_type = infer::get(&bytes)
        .map(|t| t.mime_type())
        .unwrap_or("application/octet-stream");

    Ok(([(header::CONTENT_TYPE, content_type.to_string())], bytes).into_response())
}

/// Image serving errors
#[derive(Debug)]
pub enum ImagesError {
    /// Signature invalid or URL expired
    Forbidden(String),
    NotFound(String),
    Internal(String),
}

impl IntoResponse for ImagesError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ImagesError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg),
            ImagesError::NotFound(key) => (StatusCode::NOT_FOUND, format!("Image not found: {key}")),
            ImagesError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        let body = Json(json!({
            "error": message,
        }));

        (status, body).into_response()
    }
}
