use crate::error::ApiError;
use base64::{Engine, engine::general_purpose::STANDARD as BASE64};
use ed25519_dalek::{Signer, SigningKey};
use reqwest::header::{HeaderMap, HeaderValue};

pub const API_KEY_HEADER: &str = "x-api-key";
pub const SIGNATURE_HEADER: &str = "x-signature";
pub const TIMESTAMP_HEADER: &str = "x-timestamp";

/// Decodes a base64 private key into an Ed25519 signing key.
///
/// Exported keys are sometimes the 64-byte keypair form (seed followed by the
/// public key), so only the first 32 bytes are used as the seed.
pub fn signing_key_from_base64(encoded: &str) -> Result<SigningKey, ApiError> {
    let bytes = BASE64
        .decode(encoded.trim())
        .map_err(|e| ApiError::InvalidKey(format!("private key is not valid base64: {}", e)))?;

    let seed: [u8; 32] = bytes
        .get(..32)
        .and_then(|s| s.try_into().ok())
        .ok_or_else(|| {
            ApiError::InvalidKey(format!(
                "private key must decode to at least 32 bytes, got {}",
                bytes.len()
            ))
        })?;

    Ok(SigningKey::from_bytes(&seed))
}

/// The exact byte string the exchange expects to be signed.
pub fn message_to_sign(api_key: &str, timestamp: i64, path: &str, method: &str, body: &str) -> String {
    format!("{}{}{}{}{}", api_key, timestamp, path, method, body)
}

/// Signs a request and returns the base64-encoded signature.
pub fn sign_request(
    key: &SigningKey,
    api_key: &str,
    timestamp: i64,
    path: &str,
    method: &str,
    body: &str,
) -> String {
    let message = message_to_sign(api_key, timestamp, path, method, body);
    let signature = key.sign(message.as_bytes());
    BASE64.encode(signature.to_bytes())
}

/// Builds the three authentication headers attached to every request.
pub fn authorization_headers(
    key: &SigningKey,
    api_key: &str,
    timestamp: i64,
    path: &str,
    method: &str,
    body: &str,
) -> Result<HeaderMap, ApiError> {
    let signature = sign_request(key, api_key, timestamp, path, method, body);

    let mut headers = HeaderMap::new();
    headers.insert(
        API_KEY_HEADER,
        HeaderValue::from_str(api_key)
            .map_err(|e| ApiError::InvalidData(format!("api key is not a valid header value: {}", e)))?,
    );
    headers.insert(
        SIGNATURE_HEADER,
        HeaderValue::from_str(&signature)
            .map_err(|e| ApiError::InvalidData(e.to_string()))?,
    );
    headers.insert(TIMESTAMP_HEADER, HeaderValue::from(timestamp));
    Ok(headers)
}
