//! nscan-dx library - Diagnosis service module
//!
//! Submits brain-scan images for classification, persists each submission as
//! a durable diagnosis record, attaches user feedback to past diagnoses, and
//! serves the diagnosis history with read-time feedback joins.

use axum::Router;
use sqlx::SqlitePool;
use std::sync::Arc;

use services::image_store::ImageStore;
use services::inference::InferenceProvider;

pub mod api;
pub mod services;

/// Application state shared across HTTP handlers
///
/// All durable state lives in the record store (pool) and image store; the
/// state itself is cheap to clone per request and holds no request-scoped
/// mutable data.
#[derive(Clone)]
pub struct AppState {
    /// Record store for diagnosis and feedback rows
    pub db: SqlitePool,
    /// Blob store for uploaded scan images
    pub images: ImageStore,
    /// Classification endpoint client (injected; tests substitute a fake)
    pub inference: Arc<dyn InferenceProvider>,
}

impl AppState {
    /// Create new application state
    pub fn new(db: SqlitePool, images: ImageStore, inference: Arc<dyn InferenceProvider>) -> Self {
        Self {
            db,
            images,
            inference,
        }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    use axum::routing::{get, post};
    use tower_http::cors::CorsLayer;

    Router::new()
        .route("/api/predict", post(api::predict::predict))
        .route("/api/feedback", post(api::feedback::save_feedback))
        .route("/api/history", get(api::history::get_history))
        .route("/api/images/*key", get(api::images::get_image))
        .merge(api::health::health_routes())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
