//! Error-to-response mapping
//!
//! Every failure surfaces as a `{"error": message}` JSON envelope with a
//! status code that identifies the failure kind, so callers can distinguish
//! retryable downstream failures from validation and not-found rejections.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use nscan_common::Error;

/// Wrapper carrying a common error into an axum response
#[derive(Debug)]
pub struct ApiError(pub Error);

impl From<Error> for ApiError {
    fn from(e: Error) -> Self {
        ApiError(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            Error::InvalidInput(_) => StatusCode::BAD_REQUEST,
            Error::NotFound(_) => StatusCode::NOT_FOUND,
            Error::Unavailable(_) => StatusCode::BAD_GATEWAY,
            Error::Database(_)
            | Error::Io(_)
            | Error::Config(_)
            | Error::Serialization(_)
            | Error::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        if status.is_server_error() {
            tracing::error!(error = %self.0, "Request failed");
        }

        let body = Json(json!({
            "error": self.0.to_string(),
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status_of(e: Error) -> StatusCode {
        ApiError(e).into_response().status()
    }

    #[test]
    fn statuses_distinguish_failure_kinds() {
        assert_eq!(
            status_of(Error::InvalidInput("x".into())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(status_of(Error::NotFound("x".into())), StatusCode::NOT_FOUND);
        assert_eq!(
            status_of(Error::Unavailable("x".into())),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            status_of(Error::Serialization("x".into())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
