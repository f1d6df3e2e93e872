// src/errors.rs
// DOCUMENTATION: Custom error types and HTTP responses
// PURPOSE: Centralized error handling for entire application

use actix_web::{error::ResponseError, http::StatusCode, HttpResponse};
use serde_json::json;
use thiserror::Error;

/// Application-specific error types
/// DOCUMENTATION: Comprehensive error enum for all possible failures
/// Each variant maps to appropriate HTTP status code and error response
#[derive(Error, Debug)]
pub enum EdumapError {
    /// A required configuration value is absent. Raised at startup,
    /// before any outbound network call is made.
    #[error("Missing configuration: {0}")]
    MissingConfig(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("External API error: {0}")]
    ExternalApiError(String),

    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    #[error("Internal server error")]
    #[allow(dead_code)]
    InternalError,
}

/// Convert EdumapError to HTTP response
/// DOCUMENTATION: Maps error types to HTTP status codes and JSON responses
impl ResponseError for EdumapError {
    fn error_response(&self) -> HttpResponse {
        let (status, error_code) = match self {
            EdumapError::MissingConfig(_) => (StatusCode::SERVICE_UNAVAILABLE, "MISSING_CONFIG"),
            EdumapError::InvalidInput(_) => (StatusCode::BAD_REQUEST, "INVALID_INPUT"),
            EdumapError::ValidationError(_) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
            EdumapError::ExternalApiError(_) => (StatusCode::BAD_GATEWAY, "EXTERNAL_API_ERROR"),
            EdumapError::RateLimitExceeded => {
                (StatusCode::TOO_MANY_REQUESTS, "RATE_LIMIT_EXCEEDED")
            }
            EdumapError::InternalError => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        };

        let body = json!({
            "error": {
                "code": error_code,
                "message": self.to_string(),
                "timestamp": chrono::Utc::now().to_rfc3339()
            }
        });

        HttpResponse::build(status).json(body)
    }

    fn status_code(&self) -> StatusCode {
        match self {
            EdumapError::MissingConfig(_) => StatusCode::SERVICE_UNAVAILABLE,
            EdumapError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            EdumapError::ValidationError(_) => StatusCode::BAD_REQUEST,
            EdumapError::ExternalApiError(_) => StatusCode::BAD_GATEWAY,
            EdumapError::RateLimitExceeded => StatusCode::TOO_MANY_REQUESTS,
            EdumapError::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}
