use std::borrow::Cow;
use std::fmt;

use actix_web::{
    error::ResponseError,
    http::{header::ContentType, StatusCode},
    HttpResponse
};
use derive_more::Display;

#[derive(Debug)]
pub enum AppError {
    InvalidInput(String),
    NotFound(String),
    Conflict(String),
    Unauthorized(String),
    RateLimited(String),
    UpstreamFailure(String),
    InternalError(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::InvalidInput(msg) => write!(f, "{}", msg),
            AppError::NotFound(msg) => write!(f, "{}", msg),
            AppError::Conflict(msg) => write!(f, "{}", msg),
            AppError::Unauthorized(msg) => write!(f, "{}", msg),
            AppError::RateLimited(msg) => write!(f, "{}", msg),
            AppError::UpstreamFailure(msg) => write!(f, "{}", msg),
            AppError::InternalError(msg) => write!(f, "{}", msg),
        }
    }
}

impl ResponseError for AppError {
    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code())
            .insert_header(ContentType::json())
            .json(serde_json::json!({"error": self.to_string()}))
    }

    fn status_code(&self) -> StatusCode {
        match self {
            AppError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::RateLimited(_) => StatusCode::TOO_MANY_REQUESTS,
            AppError::UpstreamFailure(_) => StatusCode::BAD_GATEWAY,
            AppError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl AppError {
    pub fn not_authenticated() -> Self {
        AppError::Unauthorized("Not authenticated".to_string())
    }

    pub fn image_not_found() -> Self {
        AppError::NotFound("Image not found".to_string())
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Database(e) if e.code() == Some(Cow::Borrowed("23505")) => {
                AppError::Conflict("Database conflict occurred".into())
            }
            sqlx::Error::Database(e) if e.code() == Some(Cow::Borrowed("23503")) => {
                AppError::Conflict("Foreign key violation".into())
            }
            _ => {
                tracing::error!("Database error: {}", err);
                AppError::InternalError("Database error".into())
            }
        }
    }
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::MissingSessionId => AppError::InvalidInput(err.to_string()),
            AuthError::InvalidSession | AuthError::NotAuthenticated => AppError::Unauthorized(err.to_string()),
            AuthError::ProviderUnavailable(_) => {
                AppError::InternalError("Authentication service error".into())
            }
        }
    }
}

#[derive(Debug, Display)]
pub enum AuthError {
    #[display("session_id required")]
    MissingSessionId,

    #[display("Invalid session_id")]
    InvalidSession,

    #[display("Not authenticated")]
    NotAuthenticated,

    #[display("Authentication service error: {_0}")]
    ProviderUnavailable(String),
}

impl From<reqwest::Error> for AuthError {
    fn from(err: reqwest::Error) -> Self {
        AuthError::ProviderUnavailable(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pipeline_errors_map_to_distinct_statuses() {
        assert_eq!(AppError::RateLimited("x".into()).status_code(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(AppError::UpstreamFailure("x".into()).status_code(), StatusCode::BAD_GATEWAY);
        assert_eq!(AppError::InternalError("x".into()).status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(AppError::Conflict("x".into()).status_code(), StatusCode::CONFLICT);
    }

    #[test]
    fn provider_failures_hide_transport_details() {
        let err: AppError = AuthError::ProviderUnavailable("connection refused to 10.0.0.1".into()).into();
        assert_eq!(err.to_string(), "Authentication service error");
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn invalid_sessions_become_unauthorized() {
        let err: AppError = AuthError::InvalidSession.into();
        assert_eq!(err.status_code(), StatusCode::UNAUTHORIZED);
    }
}
