//! History endpoint: list and get-by-id behind an operation discriminator

use axum::extract::{Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use nscan_common::Error;

use crate::api::ApiError;
use crate::services::history::{self, DiagnosisDetail, HistoryList};
use crate::AppState;

/// Query parameters for history retrieval
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryQuery {
    /// "list" (default) or "get"
    #[serde(default = "default_operation")]
    pub operation: String,

    /// Required for operation=get
    pub diagnosis_id: Option<String>,

    /// Optional owner scope for operation=list
    pub user_id: Option<String>,
}

fn default_operation() -> String {
    "list".to_string()
}

/// History response: a listing or a single-record envelope
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum HistoryResponse {
    List(HistoryList),
    Detail { diagnosis: DiagnosisDetail },
}

/// GET /api/history?operation=list|get
///
/// Read-only; an empty store lists as an empty history array.
pub async fn get_history(
    State(state): State<AppState>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<HistoryResponse>, ApiError> {
    match query.operation.as_str() {
        "list" => {
            let listing =
                history::list(&state.db, &state.images, query.user_id.as_deref()).await?;
            Ok(Json(HistoryResponse::List(listing)))
        }
        "get" => {
            let diagnosis_id = query
                .diagnosis_id
                .as_deref()
                .filter(|id| !id.trim().is_empty())
                .ok_or_else(|| {
                    ApiError(Error::InvalidInput(
                        "diagnosisId is required for operation=get".to_string(),
                    ))
                })?;
            let detail = history::get(&state.db, &state.images, diagnosis_id).await?;
            Ok(Json(HistoryResponse::Detail { diagnosis: detail }))
        }
        other => Err(ApiError(Error::InvalidInput(format!(
            "Invalid operation: {other}"
        )))),
    }
}
