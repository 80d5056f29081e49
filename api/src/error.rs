use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use pdfchat_rag::RagError;
use serde::Serialize;

pub const MISSING_CREDENTIAL_WARNING: &str = "Please enter your OpenAI API key to proceed.";

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
    pub message: String,
}

/// An error returned to the page as `{"error": code, "message": text}`.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub error: &'static str,
    pub message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, error: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            error,
            message: message.into(),
        }
    }

    pub fn missing_credential() -> Self {
        Self::new(StatusCode::UNAUTHORIZED, "missing_credential", MISSING_CREDENTIAL_WARNING)
    }

    pub fn invalid_credential(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "invalid_credential", message)
    }

    pub fn no_document() -> Self {
        Self::new(
            StatusCode::CONFLICT,
            "no_document",
            "Upload a PDF file before asking questions.",
        )
    }

    pub fn processing() -> Self {
        Self::new(
            StatusCode::CONFLICT,
            "processing",
            "A PDF is still being processed for this session.",
        )
    }

    pub fn credential_changed() -> Self {
        Self::new(
            StatusCode::CONFLICT,
            "credential_changed",
            "The API key changed while the PDF was processing. Upload it again.",
        )
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "bad_request", message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "internal_error", message)
    }
}

impl From<RagError> for ApiError {
    fn from(err: RagError) -> Self {
        let message = err.to_string();
        match err {
            RagError::Io(_) | RagError::Pdf(_) => {
                Self::new(StatusCode::UNPROCESSABLE_ENTITY, "document_load_failed", message)
            }
            RagError::Authentication(_) => {
                Self::new(StatusCode::UNAUTHORIZED, "provider_auth_failed", message)
            }
            RagError::RateLimited(_) => {
                Self::new(StatusCode::TOO_MANY_REQUESTS, "provider_rate_limited", message)
            }
            RagError::Http(_) | RagError::Remote { .. } | RagError::InvalidResponse(_) => {
                Self::new(StatusCode::BAD_GATEWAY, "provider_error", message)
            }
            RagError::DimensionMismatch { .. } => {
                Self::new(StatusCode::BAD_GATEWAY, "provider_error", message)
            }
            RagError::EmbeddingMismatch { .. }
            | RagError::InvalidSplitter { .. }
            | RagError::Task(_) => {
                Self::internal(message)
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: self.error.to_string(),
            message: self.message,
        };
        (self.status, Json(body)).into_response()
    }
}
