//! Database initialization
//!
//! Creates the diagnosis and feedback tables on first run so the service
//! starts against an empty folder without any manual schema step.

use crate::Result;
use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};
use std::path::Path;
use tracing::info;

/// Initialize database connection and create tables if needed
pub async fn init_database(db_path: &Path) -> Result<SqlitePool> {
    let newly_created = !db_path.exists();

    // Create parent directory if it doesn't exist
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    // Use sqlite options to create database if it doesn't exist
    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());
    let pool = SqlitePoolOptions::new()
        .max_connections(10)
        .connect(&db_url)
        .await?;

    if newly_created {
        info!("Initialized new database: {}", db_path.display());
    } else {
        info!("Opened existing database: {}", db_path.display());
    }

    configure_pool(&pool).await?;
    create_schema(&pool).await?;

    Ok(pool)
}

/// Create an in-memory database with the full schema (tests)
pub async fn init_memory_database() -> Result<SqlitePool> {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await?;

    configure_pool(&pool).await?;
    create_schema(&pool).await?;

    Ok(pool)
}

async fn configure_pool(pool: &SqlitePool) -> Result<()> {
    // Enable foreign keys
    sqlx::query("PRAGMA foreign_keys = ON").execute(pool).await?;

    // WAL allows concurrent readers while one request writes
    sqlx::query("PRAGMA journal_mode = WAL").execute(pool).await?;

    sqlx::query("PRAGMA busy_timeout = 5000").execute(pool).await?;

    Ok(())
}

/// Run idempotent schema creation (safe to call multiple times)
async fn create_schema(pool: &SqlitePool) -> Result<()> {
    create_settings_table(pool).await?;
    create_diagnoses_table(pool).await?;
    create_feedback_table(pool).await?;
    Ok(())
}

/// Create the settings table
///
/// Stores application configuration key-value pairs, including the shared
/// secret used to sign image display URLs.
pub async fn create_settings_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS settings (
            key TEXT PRIMARY KEY,
            value TEXT,
            updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Create the diagnoses table
///
/// One row per submitted scan. Rows are immutable once written; `predictions`
/// holds the inference output serialized as JSON text in endpoint order.
async fn create_diagnoses_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS diagnoses (
            id TEXT PRIMARY KEY,
            image_name TEXT NOT NULL,
            image_path TEXT NOT NULL,
            predictions TEXT NOT NULL,
            timestamp TEXT NOT NULL,
            user_id TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    // Partition key for user-scoped listing, newest first
    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_diagnoses_user ON diagnoses (user_id, timestamp)",
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Create the feedback table
///
/// Keyed by diagnosis id: a repeat submission for the same diagnosis
/// overwrites the previous feedback row.
async fn create_feedback_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS feedback (
            diagnosis_id TEXT PRIMARY KEY,
            rating TEXT NOT NULL,
            selected_class TEXT NOT NULL,
            created_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    // Index for listing feedback by outcome
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_feedback_rating ON feedback (rating)")
        .execute(pool)
        .await?;

    Ok(())
}
