//! Diagnosis submission pipeline
//!
//! Decode the image payload, store it, invoke the classifier, persist one
//! diagnosis record, return the id and ranked predictions. The record is
//! written only after classification succeeds; a stored image with no
//! matching record is an accepted orphan cleaned up out-of-band.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use chrono::{SecondsFormat, Utc};
use sqlx::SqlitePool;
use uuid::Uuid;

use nscan_common::db::models::{DiagnosisRecord, Prediction};
use nscan_common::db::records;
use nscan_common::{Error, Result};

use crate::services::image_store::ImageStore;
use crate::services::inference::InferenceProvider;

/// Fallback display name when the client supplies none
const UNNAMED_IMAGE: &str = "unknown";

/// Result of one successful submission
#[derive(Debug)]
pub struct SubmitOutcome {
    pub diagnosis_id: String,
    pub predictions: Vec<Prediction>,
}

/// Submit one scan for classification
///
/// Non-idempotent by design: every call generates a fresh diagnosis id and
/// row, so a caller retrying a failed submission never collides with a
/// previous attempt.
pub async fn submit(
    db: &SqlitePool,
    images: &ImageStore,
    inference: &dyn InferenceProvider,
    image_payload: &str,
    image_name: Option<&str>,
    user_id: Option<&str>,
) -> Result<SubmitOutcome> {
    let bytes = decode_image_payload(image_payload)?;

    let image_path = images.put(image_name, &bytes).await?;

    // Classify before writing anything to the record store: an endpoint
    // failure must leave zero diagnosis rows for this request.
    let predictions = inference.classify(&bytes).await?;

    let record = DiagnosisRecord {
        id: Uuid::new_v4().to_string(),
        image_name: image_name
            .filter(|name| !name.trim().is_empty())
            .unwrap_or(UNNAMED_IMAGE)
            .to_string(),
        image_path,
        predictions: serde_json::to_string(&predictions)
            .map_err(|e| Error::Serialization(e.to_string()))?,
        timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        user_id: user_id
            .filter(|user| !user.trim().is_empty())
            .unwrap_or("anonymous")
            .to_string(),
    };

    records::insert_diagnosis(db, &record).await?;

    tracing::info!(
        diagnosis_id = %record.id,
        image_path = %record.image_path,
        user_id = %record.user_id,
        "Diagnosis recorded"
    );

    Ok(SubmitOutcome {
        diagnosis_id: record.id,
        predictions,
    })
}

/// Decode a base64 or data-URI image payload into validated image bytes
///
/// Accepts `data:image/...;base64,<payload>` or a bare base64 string; the
/// part after the last comma is the payload.
fn decode_image_payload(payload: &str) -> Result<Vec<u8>> {
    let trimmed = payload.trim();
    if trimmed.is_empty() {
        return Err(Error::InvalidInput("Image not provided".to_string()));
    }

    let encoded = trimmed.rsplit(',').next().unwrap_or(trimmed);

    let bytes = BASE64
        .decode(encoded)
        .map_err(|e| Error::InvalidInput(format!("Image payload is not valid base64: {e}")))?;

    if !infer::is_image(&bytes) {
        return Err(Error::InvalidInput(
            "Image payload does not decode to a recognized image format".to_string(),
        ));
    }

    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn png_base64() -> String {
        let mut bytes = vec![0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];
        bytes.extend_from_slice(&[0u8; 16]);
        BASE64.encode(bytes)
    }

    #[test]
    fn decodes_bare_base64() {
        let bytes = decode_image_payload(&png_base64()).unwrap();
        assert_eq!(&bytes[..4], &[0x89, 0x50, 0x4E, 0x47]);
    }

    #[test]
    fn decodes_data_uri() {
        let payload = format!("data:image/png;base64,{}", png_base64());
        let bytes = decode_image_payload(&payload).unwrap();
        assert_eq!(&bytes[..4], &[0x89, 0x50, 0x4E, 0x47]);
    }

    #[test]
    fn rejects_empty_payload() {
        let err = decode_image_payload("").unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }

    #[test]
    fn rejects_invalid_base64() {
        let err = decode_image_payload("not-base-64!!!").unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }

    #[test]
    fn rejects_non_image_bytes() {
        let payload = BASE64.encode(b"plain text, definitely not an image");
        let err = decode_image_payload(&payload).unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }
}
