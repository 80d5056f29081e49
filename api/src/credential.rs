use crate::error::ApiError;
use pdfchat_rag::ApiKey;

/// Shortest credential accepted before any provider call is attempted.
const MIN_KEY_LEN: usize = 11;

/// Checks the shape of a bearer credential. Whether the provider accepts it
/// is only known on the first remote call.
pub fn validate_credential(raw: &str) -> Result<ApiKey, ApiError> {
    let token = raw.trim();

    if token.is_empty() {
        return Err(ApiError::missing_credential());
    }

    if token.chars().any(char::is_whitespace) {
        return Err(ApiError::invalid_credential(
            "API key must not contain whitespace",
        ));
    }

    if token.chars().count() < MIN_KEY_LEN {
        return Err(ApiError::invalid_credential("API key is too short or invalid"));
    }

    Ok(ApiKey::new(token))
}
