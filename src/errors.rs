use reqwest::StatusCode;
use thiserror::Error;

use crate::requests::ValidationError;

/// Failure taxonomy surfaced by the request gateway.
///
/// `Clone` so that a single refresh failure can be handed to every caller
/// queued behind it.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    #[error("Network unreachable: {0}")]
    NetworkUnreachable(String),
    #[error("Credential expired")]
    AuthExpired,
    #[error("Authentication invalid: {0}")]
    AuthInvalid(String),
    #[error("Bad request: {0}")]
    BadRequest(String),
    #[error("Access denied")]
    Forbidden,
    #[error("Resource not found")]
    NotFound,
    #[error("Rate limited")]
    RateLimited,
    #[error("Server error (status {status})")]
    ServerError { status: u16 },
    #[error("Unexpected response (status {status})")]
    Unknown { status: u16 },
    #[error("Failed to decode response: {0}")]
    Decode(String),
}

impl ApiError {
    pub fn from_status(status: StatusCode, body: &str) -> Self {
        match status.as_u16() {
            400 => ApiError::BadRequest(extract_message(body)),
            401 => ApiError::AuthExpired,
            403 => ApiError::Forbidden,
            404 => ApiError::NotFound,
            429 => ApiError::RateLimited,
            code @ 500..=599 => ApiError::ServerError { status: code },
            code => ApiError::Unknown { status: code },
        }
    }

    /// Text shown to the user for this failure.
    pub fn user_message(&self) -> &'static str {
        match self {
            ApiError::NetworkUnreachable(_) => {
                "Network error occurred. Please check your connection."
            }
            ApiError::AuthExpired | ApiError::AuthInvalid(_) => {
                "Authentication required. Please log in."
            }
            ApiError::BadRequest(_) => "Invalid request. Please check your input.",
            ApiError::Forbidden => "Access denied. You do not have permission.",
            ApiError::NotFound => "Resource not found.",
            ApiError::RateLimited => "Too many requests. Please try again later.",
            ApiError::ServerError { .. } => "Server error. Please try again later.",
            ApiError::Unknown { .. } | ApiError::Decode(_) => "An unexpected error occurred.",
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ApiError::Decode(err.to_string())
        } else if let Some(status) = err.status() {
            ApiError::from_status(status, "")
        } else {
            ApiError::NetworkUnreachable(err.to_string())
        }
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ApiError::BadRequest(err.to_string())
    }
}

// Backend error bodies are `{ "error": "..." }` or `{ "message": "..." }`.
fn extract_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|value| {
            value
                .get("error")
                .or_else(|| value.get("message"))
                .and_then(|m| m.as_str())
                .map(str::to_owned)
        })
        .unwrap_or_else(|| body.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_status_codes_to_taxonomy() {
        assert_eq!(
            ApiError::from_status(StatusCode::UNAUTHORIZED, ""),
            ApiError::AuthExpired
        );
        assert_eq!(
            ApiError::from_status(StatusCode::FORBIDDEN, ""),
            ApiError::Forbidden
        );
        assert_eq!(
            ApiError::from_status(StatusCode::NOT_FOUND, ""),
            ApiError::NotFound
        );
        assert_eq!(
            ApiError::from_status(StatusCode::TOO_MANY_REQUESTS, ""),
            ApiError::RateLimited
        );
        assert_eq!(
            ApiError::from_status(StatusCode::BAD_GATEWAY, ""),
            ApiError::ServerError { status: 502 }
        );
        assert_eq!(
            ApiError::from_status(StatusCode::IM_A_TEAPOT, ""),
            ApiError::Unknown { status: 418 }
        );
    }

    #[test]
    fn bad_request_carries_backend_message() {
        let err = ApiError::from_status(
            StatusCode::BAD_REQUEST,
            r#"{"success":false,"error":"amount is required"}"#,
        );
        assert_eq!(err, ApiError::BadRequest("amount is required".to_string()));

        let err = ApiError::from_status(StatusCode::BAD_REQUEST, "plain text ");
        assert_eq!(err, ApiError::BadRequest("plain text".to_string()));
    }
}
