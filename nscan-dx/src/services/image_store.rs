//! Filesystem blob store for uploaded scan images
//!
//! Images are written under `<root>/uploads/` with generated UUID keys, so
//! concurrent submissions cannot collide. Display URLs are time-limited
//! signed relative URLs resolved by the `/api/images/{key}` route;
//! generating one reads nothing and writes nothing.

use nscan_common::signing::{self, SigningError};
use nscan_common::Error;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;
use uuid::Uuid;

/// Subdirectory for uploaded scan images
const UPLOADS_PREFIX: &str = "uploads";

/// Image store errors
#[derive(Debug, Error)]
pub enum ImageStoreError {
    /// Key failed validation (traversal or malformed)
    #[error("Invalid object key: {0}")]
    InvalidKey(String),

    /// No object stored under this key
    #[error("Object not found: {0}")]
    NotFound(String),

    /// Underlying filesystem failure
    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<ImageStoreError> for Error {
    fn from(e: ImageStoreError) -> Self {
        match e {
            ImageStoreError::InvalidKey(key) => Error::InvalidInput(format!("invalid key: {key}")),
            ImageStoreError::NotFound(key) => Error::NotFound(format!("image {key}")),
            ImageStoreError::Io(e) => Error::Unavailable(format!("image store: {e}")),
        }
    }
}

/// Filesystem-backed image store
#[derive(Clone)]
pub struct ImageStore {
    root: PathBuf,
    secret: i64,
}

impl ImageStore {
    /// Create store rooted at `root`, creating the uploads directory
    pub fn new(root: PathBuf, secret: i64) -> Result<Self, ImageStoreError> {
        std::fs::create_dir_all(root.join(UPLOADS_PREFIX))?;
        Ok(Self { root, secret })
    }

    /// Persist image bytes under a freshly generated key
    ///
    /// The key combines a sanitized stem of the client filename with a UUID,
    /// so repeated uploads of the same file produce distinct objects.
    /// Extension is sniffed from the bytes, not trusted from the name.
    pub async fn put(&self, image_name: Option<&str>, bytes: &[u8]) -> Result<String, ImageStoreError> {
        let ext = infer::get(bytes)
            .map(|t| t.extension())
            .unwrap_or("bin");
        let key = match sanitize_stem(image_name) {
            Some(stem) => format!("{}/{}_{}.{}", UPLOADS_PREFIX, Uuid::new_v4(), stem, ext),
            None => format!("{}/{}.{}", UPLOADS_PREFIX, Uuid::new_v4(), ext),
        };

        tokio::fs::write(self.root.join(&key), bytes).await?;
        tracing::debug!(key = %key, bytes = bytes.len(), "Stored image");

        Ok(key)
    }

    /// Read stored image bytes back
    pub async fn load(&self, key: &str) -> Result<Vec<u8>, ImageStoreError> {
        if !is_valid_key(key) {
            return Err(ImageStoreError::InvalidKey(key.to_string()));
        }

        match tokio::fs::read(self.root.join(key)).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(ImageStoreError::NotFound(key.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Resolve a transient display URL for a stored key
    ///
    /// Pure computation over the key and secret; safe to call during
    /// read-only history operations.
    pub fn display_url(&self, key: &str, ttl: Duration) -> Result<String, ImageStoreError> {
        if !is_valid_key(key) {
            return Err(ImageStoreError::InvalidKey(key.to_string()));
        }

        let expires = signing::epoch_ms_now() + ttl.as_millis() as i64;
        let sig = signing::sign_display_token(key, expires, self.secret);
        Ok(format!("/api/images/{key}?expires={expires}&sig={sig}"))
    }

    /// Verify a display-URL token for a key
    pub fn verify(&self, key: &str, expires: i64, sig: &str) -> Result<(), SigningError> {
        signing::verify_display_token(key, expires, sig, self.secret)
    }
}

/// Reduce a client filename to a safe key fragment (stem only, no path)
fn sanitize_stem(image_name: Option<&str>) -> Option<String> {
    let name = image_name?.trim();
    let base = name.rsplit(['/', '\\']).next().unwrap_or(name);
    let stem = base.rsplit_once('.').map(|(stem, _ext)| stem).unwrap_or(base);

    let cleaned: String = stem
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_' || *c == '-')
        .take(48)
        .collect();

    (!cleaned.is_empty()).then_some(cleaned)
}

/// Validate an object key: relative, known prefix, no traversal
fn is_valid_key(key: &str) -> bool {
    if key.is_empty() || key.len() > 256 || !key.starts_with(UPLOADS_PREFIX) {
        return false;
    }
    key.split('/').all(|segment| {
        !segment.is_empty()
            && segment != ".."
            && segment
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '_' || c == '-')
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    // Smallest payload the type sniffer recognizes as PNG
    fn png_bytes() -> Vec<u8> {
        let mut bytes = vec![0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];
        bytes.extend_from_slice(&[0u8; 16]);
        bytes
    }

    #[tokio::test]
    async fn put_then_load_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let store = ImageStore::new(dir.path().to_path_buf(), 42).unwrap();

        let key = store.put(Some("scan_001.jpg"), &png_bytes()).await.unwrap();
        assert!(key.starts_with("uploads/"));
        assert!(key.contains("scan_001"));
        // Extension comes from the bytes, not the client name
        assert!(key.ends_with(".png"));

        let loaded = store.load(&key).await.unwrap();
        assert_eq!(loaded, png_bytes());
    }

    #[tokio::test]
    async fn distinct_keys_for_identical_payloads() {
        let dir = tempfile::tempdir().unwrap();
        let store = ImageStore::new(dir.path().to_path_buf(), 42).unwrap();

        let first = store.put(Some("scan.jpg"), &png_bytes()).await.unwrap();
        let second = store.put(Some("scan.jpg"), &png_bytes()).await.unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn stem_sanitization_strips_paths_and_oddities() {
        assert_eq!(
            sanitize_stem(Some("../../etc/passwd.png")),
            Some("passwd".to_string())
        );
        assert_eq!(
            sanitize_stem(Some("C:\\scans\\brain scan!.jpeg")),
            Some("brainscan".to_string())
        );
        assert_eq!(sanitize_stem(Some("...")), None);
        assert_eq!(sanitize_stem(Some("")), None);
        assert_eq!(sanitize_stem(None), None);
    }

    #[tokio::test]
    async fn load_rejects_traversal_keys() {
        let dir = tempfile::tempdir().unwrap();
        let store = ImageStore::new(dir.path().to_path_buf(), 42).unwrap();

        for key in ["uploads/../secrets.db", "/etc/passwd", "other/abc.png", ""] {
            let err = store.load(key).await.unwrap_err();
            assert!(matches!(err, ImageStoreError::InvalidKey(_)), "key: {key}");
        }
    }

    #[tokio::test]
    async fn load_missing_key_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let store = ImageStore::new(dir.path().to_path_buf(), 42).unwrap();

        let err = store.load("uploads/missing.png").await.unwrap_err();
        assert!(matches!(err, ImageStoreError::NotFound(_)));
    }

    #[tokio::test]
    async fn display_url_verifies_with_same_secret() {
        let dir = tempfile::tempdir().unwrap();
        let store = ImageStore::new(dir.path().to_path_buf(), 42).unwrap();

        let key = store.put(None, &png_bytes()).await.unwrap();
        let url = store
            .display_url(&key, Duration::from_secs(3600))
            .unwrap();

        // Pull expires/sig back out of the generated URL
        let query = url.split('?').nth(1).unwrap();
        let mut expires = 0i64;
        let mut sig = String::new();
        for pair in query.split('&') {
            let (name, value) = pair.split_once('=').unwrap();
            match name {
                "expires" => expires = value.parse().unwrap(),
                "sig" => sig = value.to_string(),
                _ => {}
            }
        }

        assert!(store.verify(&key, expires, &sig).is_ok());
        assert!(store.verify(&key, expires, "deadbeef").is_err());
    }
}
