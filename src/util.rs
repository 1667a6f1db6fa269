//! Shared helpers for request authentication.

use axum::http::HeaderMap;
use rand::RngCore;
use sha2::{Digest, Sha256};

const API_KEY_PREFIX: &str = "tt_";

/// Extract a Bearer token from the Authorization header.
///
/// Returns the token string without the "Bearer " prefix, or None if
/// the header is missing, malformed, or empty after the prefix.
pub fn extract_bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get("Authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.strip_prefix("Bearer "))
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
}

/// Generate a new API key with the `tt_` prefix.
pub fn generate_api_key() -> String {
    let mut bytes = [0u8; 24];
    rand::thread_rng().fill_bytes(&mut bytes);
    format!("{}{}", API_KEY_PREFIX, hex::encode(bytes))
}

/// Hash a secret for storage. Only hashes are persisted.
pub fn hash_secret(secret: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(b"teamtrack-api-key-v1:");
    hasher.update(secret.as_bytes());
    hex::encode(hasher.finalize())
}
