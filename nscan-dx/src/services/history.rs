//! History reads: list and get-by-id
//!
//! Both operations are read-only. Feedback is joined by diagnosis id at
//! read time; display URLs are resolved per record and degrade to null on
//! failure rather than failing the whole response.

use serde::Serialize;
use sqlx::SqlitePool;
use std::time::Duration;

use nscan_common::db::models::{DiagnosisRecord, FeedbackRecord, Prediction};
use nscan_common::db::records;
use nscan_common::{Error, Result};

use crate::services::image_store::ImageStore;

/// Most recent diagnoses returned by one list call
const LIST_LIMIT: i64 = 50;

/// Display-URL lifetime (1 hour)
const DISPLAY_URL_TTL: Duration = Duration::from_secs(3600);

/// Compact feedback summary attached to history entries
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackSummary {
    pub rating: String,
    pub selected_class: String,
    pub submitted_at: String,
}

impl From<FeedbackRecord> for FeedbackSummary {
    fn from(record: FeedbackRecord) -> Self {
        Self {
            rating: record.rating,
            selected_class: record.selected_class,
            submitted_at: record.created_at,
        }
    }
}

/// One entry in the history listing
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryItem {
    pub id: String,
    pub image_name: String,
    pub timestamp: String,
    /// Stored prediction payload, verbatim JSON text
    pub predictions: String,
    pub image_path: String,
    pub image_url: Option<String>,
    pub feedback: Option<FeedbackSummary>,
    pub top_prediction: Option<Prediction>,
}

/// List response envelope
#[derive(Debug, Serialize)]
pub struct HistoryList {
    pub history: Vec<HistoryItem>,
    pub total: usize,
}

/// Full detail for one diagnosis
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DiagnosisDetail {
    pub id: String,
    pub image_name: String,
    pub timestamp: String,
    pub predictions: String,
    pub image_path: String,
    pub image_url: Option<String>,
    pub feedback: Option<FeedbackSummary>,
}

/// List diagnoses newest first, optionally scoped to one user
///
/// An empty store yields an empty history array, not an error.
pub async fn list(
    db: &SqlitePool,
    images: &ImageStore,
    user_id: Option<&str>,
) -> Result<HistoryList> {
    let diagnoses = records::list_diagnoses(db, user_id, LIST_LIMIT).await?;

    let mut history = Vec::with_capacity(diagnoses.len());
    for diagnosis in diagnoses {
        let feedback = records::get_feedback(db, &diagnosis.id).await?;
        let image_url = resolve_display_url(images, &diagnosis);
        let top_prediction = diagnosis.top_prediction();

        history.push(HistoryItem {
            id: diagnosis.id,
            image_name: diagnosis.image_name,
            timestamp: diagnosis.timestamp,
            predictions: diagnosis.predictions,
            image_path: diagnosis.image_path,
            image_url,
            feedback: feedback.map(FeedbackSummary::from),
            top_prediction,
        });
    }

    let total = history.len();
    Ok(HistoryList { history, total })
}

/// Get full detail for one diagnosis id
pub async fn get(db: &SqlitePool, images: &ImageStore, diagnosis_id: &str) -> Result<DiagnosisDetail> {
    let diagnosis = records::get_diagnosis(db, diagnosis_id)
        .await?
        .ok_or_else(|| Error::NotFound(format!("diagnosis {diagnosis_id}")))?;

    let feedback = records::get_feedback(db, diagnosis_id).await?;
    let image_url = resolve_display_url(images, &diagnosis);

    Ok(DiagnosisDetail {
        id: diagnosis.id,
        image_name: diagnosis.image_name,
        timestamp: diagnosis.timestamp,
        predictions: diagnosis.predictions,
        image_path: diagnosis.image_path,
        image_url,
        feedback: feedback.map(FeedbackSummary::from),
    })
}

/// Resolve a display URL for one record, degrading to None on failure
fn resolve_display_url(images: &ImageStore, diagnosis: &DiagnosisRecord) -> Option<String> {
    if diagnosis.image_path.is_empty() {
        return None;
    }
    match images.display_url(&diagnosis.image_path, DISPLAY_URL_TTL) {
        Ok(url) => Some(url),
        Err(e) => {
            tracing::warn!(
                diagnosis_id = %diagnosis.id,
                error = %e,
                "Could not resolve display URL; omitting"
            );
            None
        }
    }
}
