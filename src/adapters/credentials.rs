use base64::Engine;
use error_stack::{report, ResultExt};
use thiserror::Error;

/// Environment variable holding the service-account key.
pub const CREDENTIALS_ENV: &str = "GOOGLE_CREDENTIALS";

#[derive(Error, Debug)]
pub enum CredentialsError {
    #[error("environment variable GOOGLE_CREDENTIALS is not set")]
    Missing,
    #[error("credentials are neither raw JSON nor base64-encoded JSON")]
    Malformed,
}

/// Service-account key JSON from the environment.
///
/// The variable may carry the key either as raw JSON text or base64-encoded
/// JSON; which one is detected by decode success.
pub fn credentials_json() -> error_stack::Result<String, CredentialsError> {
    let raw = std::env::var(CREDENTIALS_ENV).change_context(CredentialsError::Missing)?;
    decode_credentials(&raw)
}

fn decode_credentials(raw: &str) -> error_stack::Result<String, CredentialsError> {
    let trimmed = raw.trim();
    if is_json_object(trimmed) {
        return Ok(trimmed.to_string());
    }

    let bytes = base64::engine::general_purpose::STANDARD
        .decode(trimmed.as_bytes())
        .change_context(CredentialsError::Malformed)?;
    let decoded = String::from_utf8(bytes).change_context(CredentialsError::Malformed)?;
    if is_json_object(decoded.trim()) {
        Ok(decoded.trim().to_string())
    } else {
        Err(report!(CredentialsError::Malformed))
    }
}

fn is_json_object(text: &str) -> bool {
    serde_json::from_str::<serde_json::Value>(text)
        .map(|value| value.is_object())
        .unwrap_or(false)
}
