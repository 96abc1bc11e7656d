//! Record-store queries for diagnosis and feedback rows
//!
//! Thin async functions over the pool; all durable state for the subsystem
//! lives in these two tables plus the image blob directory.

use crate::db::models::{DiagnosisRecord, FeedbackRecord};
use crate::Result;
use sqlx::SqlitePool;

/// Insert one diagnosis row. Rows are never updated afterwards.
pub async fn insert_diagnosis(pool: &SqlitePool, record: &DiagnosisRecord) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO diagnoses (id, image_name, image_path, predictions, timestamp, user_id)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&record.id)
    .bind(&record.image_name)
    .bind(&record.image_path)
    .bind(&record.predictions)
    .bind(&record.timestamp)
    .bind(&record.user_id)
    .execute(pool)
    .await?;

    Ok(())
}

/// Fetch one diagnosis by id
pub async fn get_diagnosis(pool: &SqlitePool, id: &str) -> Result<Option<DiagnosisRecord>> {
    let record = sqlx::query_as::<_, DiagnosisRecord>(
        "SELECT id, image_name, image_path, predictions, timestamp, user_id
         FROM diagnoses WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(record)
}

/// List diagnoses newest first, optionally scoped to one user
///
/// Descending timestamp is a presentation contract for history listing, so
/// it is applied here in the query rather than re-sorted by callers.
pub async fn list_diagnoses(
    pool: &SqlitePool,
    user_id: Option<&str>,
    limit: i64,
) -> Result<Vec<DiagnosisRecord>> {
    let records = match user_id {
        Some(user) => {
            sqlx::query_as::<_, DiagnosisRecord>(
                "SELECT id, image_name, image_path, predictions, timestamp, user_id
                 FROM diagnoses WHERE user_id = ?
                 ORDER BY timestamp DESC LIMIT ?",
            )
            .bind(user)
            .bind(limit)
            .fetch_all(pool)
            .await?
        }
        None => {
            sqlx::query_as::<_, DiagnosisRecord>(
                "SELECT id, image_name, image_path, predictions, timestamp, user_id
                 FROM diagnoses ORDER BY timestamp DESC LIMIT ?",
            )
            .bind(limit)
            .fetch_all(pool)
            .await?
        }
    };

    Ok(records)
}

/// Count diagnosis rows (test support for no-partial-write assertions)
pub async fn count_diagnoses(pool: &SqlitePool) -> Result<i64> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM diagnoses")
        .fetch_one(pool)
        .await?;
    Ok(count)
}

/// Insert feedback for a diagnosis, overwriting any previous submission
pub async fn insert_feedback(pool: &SqlitePool, record: &FeedbackRecord) -> Result<()> {
    sqlx::query(
        r#"
        INSERT OR REPLACE INTO feedback (diagnosis_id, rating, selected_class, created_at)
        VALUES (?, ?, ?, ?)
        "#,
    )
    .bind(&record.diagnosis_id)
    .bind(&record.rating)
    .bind(&record.selected_class)
    .bind(&record.created_at)
    .execute(pool)
    .await?;

    Ok(())
}

/// Fetch feedback for one diagnosis, if any was submitted
pub async fn get_feedback(pool: &SqlitePool, diagnosis_id: &str) -> Result<Option<FeedbackRecord>> {
    let record = sqlx::query_as::<_, FeedbackRecord>(
        "SELECT diagnosis_id, rating, selected_class, created_at
         FROM feedback WHERE diagnosis_id = ?",
    )
    .bind(diagnosis_id)
    .fetch_optional(pool)
    .await?;

    Ok(record)
}

/// List feedback rows by outcome, newest first
pub async fn list_feedback_by_rating(
    pool: &SqlitePool,
    rating: &str,
) -> Result<Vec<FeedbackRecord>> {
    let records = sqlx::query_as::<_, FeedbackRecord>(
        "SELECT diagnosis_id, rating, selected_class, created_at
         FROM feedback WHERE rating = ?
         ORDER BY created_at DESC",
    )
    .bind(rating)
    .fetch_all(pool)
    .await?;

    Ok(records)
}
