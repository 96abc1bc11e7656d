//! Feedback submission
//!
//! Validates the rating, resolves the asserted class, checks that the
//! referenced diagnosis exists, and stores exactly one feedback row.
//! Validation failures are rejected before any durable write.

use chrono::{SecondsFormat, Utc};
use sqlx::SqlitePool;

use nscan_common::db::models::{FeedbackRecord, Rating};
use nscan_common::db::records;
use nscan_common::{Error, Result};

/// Submit feedback for an existing diagnosis
///
/// A repeat submission for the same diagnosis overwrites the previous row
/// (the feedback table is keyed by diagnosis id).
pub async fn submit(
    db: &SqlitePool,
    diagnosis_id: &str,
    rating_raw: &str,
    selected_class: Option<&str>,
) -> Result<FeedbackRecord> {
    if diagnosis_id.trim().is_empty() {
        return Err(Error::InvalidInput("diagnosisId is required".to_string()));
    }

    let rating = Rating::parse(rating_raw)
        .ok_or_else(|| Error::InvalidInput("rating must be 'up' or 'down'".to_string()))?;

    let selected_class = selected_class.map(str::trim).filter(|s| !s.is_empty());

    if rating == Rating::Down && selected_class.is_none() {
        return Err(Error::InvalidInput(
            "selectedClass is required for a 'down' rating".to_string(),
        ));
    }

    // Existence check before insert: orphaned feedback is rejected rather
    // than discovered at read time.
    let diagnosis = records::get_diagnosis(db, diagnosis_id)
        .await?
        .ok_or_else(|| Error::NotFound(format!("diagnosis {diagnosis_id}")))?;

    // An 'up' rating confirms the top prediction; derive the label when the
    // caller omits it, but never store an empty value we cannot resolve.
    let selected_class = match selected_class {
        Some(class) => class.to_string(),
        None => diagnosis
            .decode_predictions()?
            .into_iter()
            .next()
            .map(|p| p.label)
            .ok_or_else(|| {
                Error::InvalidInput(
                    "selectedClass could not be derived from stored predictions".to_string(),
                )
            })?,
    };

    let record = FeedbackRecord {
        diagnosis_id: diagnosis_id.to_string(),
        rating: rating.as_str().to_string(),
        selected_class,
        created_at: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
    };

    records::insert_feedback(db, &record).await?;

    tracing::info!(
        diagnosis_id = %record.diagnosis_id,
        rating = %record.rating,
        "Feedback saved"
    );

    Ok(record)
}

#[cfg(test)]
mod tests {
    use super::*;
    use nscan_common::db::init::init_memory_database;
    use nscan_common::db::models::DiagnosisRecord;

    async fn seed_diagnosis(pool: &SqlitePool, id: &str, predictions: &str) {
        records::insert_diagnosis(
            pool,
            &DiagnosisRecord {
                id: id.to_string(),
                image_name: "scan.jpg".to_string(),
                image_path: format!("uploads/{id}.jpg"),
                predictions: predictions.to_string(),
                timestamp: "2026-03-01T10:00:00.000Z".to_string(),
                user_id: "anonymous".to_string(),
            },
        )
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn down_rating_requires_selected_class() {
        let pool = init_memory_database().await.unwrap();
        seed_diagnosis(&pool, "d1", r#"[{"label":"Class 1","confidence":"55.0"}]"#).await;

        let err = submit(&pool, "d1", "down", Some("")).await.unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
        assert!(records::get_feedback(&pool, "d1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn unknown_diagnosis_is_not_found_and_writes_nothing() {
        let pool = init_memory_database().await.unwrap();

        let err = submit(&pool, "missing", "up", None).await.unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
        assert!(records::get_feedback(&pool, "missing")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn up_rating_derives_top_prediction_label() {
        let pool = init_memory_database().await.unwrap();
        seed_diagnosis(
            &pool,
            "d1",
            r#"[{"label":"Class 2","confidence":"87.3"},{"label":"Class 1","confidence":"9.1"}]"#,
        )
        .await;

        let record = submit(&pool, "d1", "up", None).await.unwrap();
        assert_eq!(record.selected_class, "Class 2");
    }

    #[tokio::test]
    async fn up_rating_with_empty_predictions_is_rejected() {
        let pool = init_memory_database().await.unwrap();
        seed_diagnosis(&pool, "d1", "[]").await;

        let err = submit(&pool, "d1", "up", None).await.unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }

    #[tokio::test]
    async fn up_rating_with_undecodable_predictions_is_serialization_error() {
        let pool = init_memory_database().await.unwrap();
        seed_diagnosis(&pool, "d1", "{not valid json").await;

        let err = submit(&pool, "d1", "up", None).await.unwrap_err();
        assert!(matches!(err, Error::Serialization(_)));
    }

    #[tokio::test]
    async fn invalid_rating_is_rejected() {
        let pool = init_memory_database().await.unwrap();
        seed_diagnosis(&pool, "d1", r#"[{"label":"Class 1","confidence":"55.0"}]"#).await;

        let err = submit(&pool, "d1", "sideways", Some("Class 1"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }
}
