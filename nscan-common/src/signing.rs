//! Shared secret management and display-URL signing
//!
//! Image display URLs are time-limited: `expires` (Unix epoch ms) and a
//! SHA-256 token over `key|expires|secret` are appended as query parameters.
//! The secret is a random non-zero i64 stored in the settings table,
//! generated on first run. Token verification is a pure function; only
//! secret load/init touches the database.

use sha2::{Digest, Sha256};
use sqlx::SqlitePool;
use std::time::{SystemTime, UNIX_EPOCH};

/// Signing error types
#[derive(Debug, Clone, thiserror::Error)]
pub enum SigningError {
    /// `expires` lies in the past
    #[error("URL expired at {expires} (now {now})")]
    Expired { expires: i64, now: i64 },

    /// Token does not match the calculated value
    #[error("Invalid signature")]
    InvalidSignature,

    /// Database error loading shared secret
    #[error("Database error: {0}")]
    DatabaseError(String),
}

/// Load shared secret from database settings
///
/// Key: `api_shared_secret`, value: i64. Generated and stored on first call.
pub async fn load_shared_secret(db: &SqlitePool) -> Result<i64, SigningError> {
    let result: Option<(String,)> =
        sqlx::query_as("SELECT value FROM settings WHERE key = 'api_shared_secret'")
            .fetch_optional(db)
            .await
            .map_err(|e| SigningError::DatabaseError(e.to_string()))?;

    match result {
        Some((value,)) => value
            .parse::<i64>()
            .map_err(|e| SigningError::DatabaseError(format!("Invalid i64: {}", e))),
        None => initialize_shared_secret(db).await,
    }
}

/// Initialize shared secret if not present
///
/// Generates a cryptographically random non-zero i64 and stores it.
pub async fn initialize_shared_secret(db: &SqlitePool) -> Result<i64, SigningError> {
    use rand::Rng;

    let mut rng = rand::thread_rng();
    let secret: i64 = loop {
        let val = rng.gen::<i64>();
        if val != 0 {
            break val;
        }
    };

    sqlx::query("INSERT OR REPLACE INTO settings (key, value) VALUES ('api_shared_secret', ?)")
        .bind(secret.to_string())
        .execute(db)
        .await
        .map_err(|e| SigningError::DatabaseError(e.to_string()))?;

    Ok(secret)
}

/// Current Unix epoch time in milliseconds
pub fn epoch_ms_now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as i64
}

/// Calculate the display-URL token for an object key and expiry
pub fn sign_display_token(key: &str, expires: i64, secret: i64) -> String {
    let mut hasher = Sha256::new();
    hasher.update(key.as_bytes());
    hasher.update(b"|");
    hasher.update(expires.to_string().as_bytes());
    hasher.update(b"|");
    hasher.update(secret.to_string().as_bytes());
    hex_encode(&hasher.finalize())
}

/// Verify a display-URL token: signature match and not expired
pub fn verify_display_token(
    key: &str,
    expires: i64,
    token: &str,
    secret: i64,
) -> Result<(), SigningError> {
    let expected = sign_display_token(key, expires, secret);
    if expected != token {
        return Err(SigningError::InvalidSignature);
    }

    let now = epoch_ms_now();
    if expires < now {
        return Err(SigningError::Expired { expires, now });
    }

    Ok(())
}

fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}
