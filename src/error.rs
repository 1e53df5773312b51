use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

/// Every failure a request can surface, mapped onto one JSON error shape.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    NotFound(String),
    #[error("incorrect password")]
    InvalidCredentials,
    #[error("incorrect verification code")]
    InvalidCode,
    #[error("verification code expired")]
    ExpiredCode,
    #[error("this account signs in with Google")]
    ProviderOnly,
    #[error("failed to authenticate with identity provider")]
    ProviderAuth(#[source] crate::oauth::ProviderError),
    #[error("invalid or expired token")]
    InvalidToken,
    #[error("database error")]
    Store(#[from] sqlx::Error),
    #[error("failed to send verification email")]
    Notifier(#[source] anyhow::Error),
    #[error("internal server error")]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_)
            | Self::Conflict(_)
            | Self::InvalidCredentials
            | Self::InvalidCode
            | Self::ExpiredCode
            | Self::ProviderOnly => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::InvalidToken => StatusCode::UNAUTHORIZED,
            Self::ProviderAuth(_) | Self::Store(_) | Self::Notifier(_) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        // Infrastructure failures are logged with their cause but never leak it.
        let message = match &self {
            Self::Store(e) => {
                error!(error = %e, "store error");
                "internal server error".to_string()
            }
            Self::Internal(e) => {
                error!(error = %e, "internal error");
                "internal server error".to_string()
            }
            Self::Notifier(e) => {
                error!(error = %e, "notifier error");
                self.to_string()
            }
            Self::ProviderAuth(e) => {
                error!(error = %e, "identity provider error");
                self.to_string()
            }
            other => other.to_string(),
        };
        (self.status(), Json(json!({ "error": message }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn business_errors_are_bad_request() {
        assert_eq!(
            ApiError::Validation("missing field".into()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::Conflict("email already registered".into()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(ApiError::InvalidCredentials.status(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::InvalidCode.status(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::ExpiredCode.status(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::ProviderOnly.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn not_found_and_token_errors_keep_their_statuses() {
        assert_eq!(
            ApiError::NotFound("no account".into()).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(ApiError::InvalidToken.status(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn infrastructure_errors_are_internal() {
        assert_eq!(
            ApiError::Notifier(anyhow::anyhow!("smtp down")).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            ApiError::Internal(anyhow::anyhow!("boom")).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            ApiError::Store(sqlx::Error::PoolTimedOut).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn store_error_response_does_not_leak_internals() {
        let response = ApiError::Store(sqlx::Error::PoolTimedOut).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
