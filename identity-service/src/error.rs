use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Error taxonomy for the identity core. Every failure is scoped to a single
/// request; none of these are fatal to the process.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Email already registered")]
    DuplicateEmail,

    #[error("Challenge expired")]
    ChallengeExpired,

    #[error("Invalid code")]
    InvalidCode,

    #[error("Unauthenticated")]
    Unauthenticated,

    #[error("Forbidden")]
    Forbidden,

    #[error("OTP channel error: {0}")]
    Channel(String),

    #[error("Configuration error: {0}")]
    Config(anyhow::Error),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<validator::ValidationErrors> for ServiceError {
    fn from(err: validator::ValidationErrors) -> Self {
        ServiceError::Validation(err.to_string())
    }
}

impl From<std::io::Error> for ServiceError {
    fn from(err: std::io::Error) -> Self {
        ServiceError::Internal(anyhow::Error::new(err))
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        #[derive(Serialize)]
        struct ErrorResponse {
            error: String,
            #[serde(skip_serializing_if = "Option::is_none")]
            details: Option<String>,
        }

        let (status, error_message, details) = match self {
            ServiceError::Validation(msg) => {
                (StatusCode::UNPROCESSABLE_ENTITY, "Validation error".to_string(), Some(msg))
            }
            ServiceError::NotFound(msg) => (StatusCode::NOT_FOUND, msg, None),
            ServiceError::DuplicateEmail => (
                StatusCode::CONFLICT,
                "Email already registered".to_string(),
                None,
            ),
            ServiceError::ChallengeExpired => (
                StatusCode::BAD_REQUEST,
                "Challenge expired or superseded".to_string(),
                None,
            ),
            ServiceError::InvalidCode => {
                (StatusCode::BAD_REQUEST, "Invalid code".to_string(), None)
            }
            ServiceError::Unauthenticated => (
                StatusCode::UNAUTHORIZED,
                "Missing or invalid session token".to_string(),
                None,
            ),
            ServiceError::Forbidden => (
                StatusCode::FORBIDDEN,
                "Insufficient role for this operation".to_string(),
                None,
            ),
            ServiceError::Channel(msg) => (
                StatusCode::BAD_GATEWAY,
                "Failed to dispatch one-time code".to_string(),
                Some(msg),
            ),
            ServiceError::Config(err) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Configuration error".to_string(),
                Some(err.to_string()),
            ),
            ServiceError::Internal(err) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
                Some(err.to_string()),
            ),
        };

        (
            status,
            Json(ErrorResponse {
                error: error_message,
                details,
            }),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unauthenticated_and_forbidden_map_to_distinct_statuses() {
        let unauth = ServiceError::Unauthenticated.into_response();
        let forbidden = ServiceError::Forbidden.into_response();
        assert_eq!(unauth.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(forbidden.status(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn validation_maps_to_unprocessable_entity() {
        let resp = ServiceError::Validation("full_name too short".to_string()).into_response();
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }
}
