//! Database models

use crate::{Error, Result};
use serde::{Deserialize, Serialize};

/// One ranked inference result
///
/// Confidence is kept as the numeric string produced by the endpoint
/// (e.g. "87.3") and is never reformatted or re-sorted by this service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Prediction {
    pub label: String,
    pub confidence: String,
}

/// Feedback rating: did the user agree with the top prediction?
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Rating {
    Up,
    Down,
}

impl Rating {
    pub fn as_str(&self) -> &'static str {
        match self {
            Rating::Up => "up",
            Rating::Down => "down",
        }
    }

    /// Parse a wire-format rating string
    pub fn parse(s: &str) -> Option<Rating> {
        match s {
            "up" => Some(Rating::Up),
            "down" => Some(Rating::Down),
            _ => None,
        }
    }
}

/// One diagnosis submission: image, inference output, ownership
///
/// Immutable once written. `timestamp` is RFC 3339 UTC and doubles as the
/// ordering key for history listing.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct DiagnosisRecord {
    pub id: String,
    pub image_name: String,
    pub image_path: String,
    /// Ordered prediction list serialized as JSON text, stored verbatim
    pub predictions: String,
    pub timestamp: String,
    pub user_id: String,
}

impl DiagnosisRecord {
    /// Decode the stored prediction payload
    pub fn decode_predictions(&self) -> Result<Vec<Prediction>> {
        serde_json::from_str(&self.predictions).map_err(|e| Error::Serialization(e.to_string()))
    }

    /// First element of the stored sequence (already confidence-sorted)
    ///
    /// Returns None when the payload is empty or undecodable; history
    /// listing degrades rather than failing on a single bad row.
    pub fn top_prediction(&self) -> Option<Prediction> {
        self.decode_predictions()
            .ok()
            .and_then(|preds| preds.into_iter().next())
    }
}

/// User feedback attached to one diagnosis
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct FeedbackRecord {
    pub diagnosis_id: String,
    pub rating: String,
    pub selected_class: String,
    pub created_at: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record_with_predictions(predictions: &str) -> DiagnosisRecord {
        DiagnosisRecord {
            id: "d1".to_string(),
            image_name: "scan.jpg".to_string(),
            image_path: "uploads/d1.jpg".to_string(),
            predictions: predictions.to_string(),
            timestamp: "2026-01-01T00:00:00Z".to_string(),
            user_id: "anonymous".to_string(),
        }
    }

    #[test]
    fn top_prediction_is_first_element() {
        let record = record_with_predictions(
            r#"[{"label":"Class 2","confidence":"87.3"},{"label":"Class 1","confidence":"9.1"}]"#,
        );
        let top = record.top_prediction().unwrap();
        assert_eq!(top.label, "Class 2");
        assert_eq!(top.confidence, "87.3");
    }

    #[test]
    fn top_prediction_none_for_empty_or_garbage() {
        assert!(record_with_predictions("[]").top_prediction().is_none());
        assert!(record_with_predictions("not json").top_prediction().is_none());
    }

    #[test]
    fn decode_error_is_serialization_class() {
        let err = record_with_predictions("{broken").decode_predictions().unwrap_err();
        assert!(matches!(err, Error::Serialization(_)));
    }

    #[test]
    fn rating_round_trip() {
        assert_eq!(Rating::parse("up"), Some(Rating::Up));
        assert_eq!(Rating::parse("down"), Some(Rating::Down));
        assert_eq!(Rating::parse("sideways"), None);
        assert_eq!(Rating::Down.as_str(), "down");
    }
}
