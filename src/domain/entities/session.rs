use serde::{Deserialize, Serialize};
use chrono::{DateTime, Duration, Utc};
use validator::Validate;

use crate::entities::user::User;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Session {
    pub user_id: String,
    pub session_token: String,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl Session {
    pub fn issue(user_id: &str, session_token: String, ttl: Duration) -> Self {
        let now = Utc::now();
        Session {
            user_id: user_id.to_string(),
            session_token,
            expires_at: now + ttl,
            created_at: now,
        }
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

/// Identity returned by the external provider for a one-time session id.
#[derive(Debug, Clone, Deserialize)]
pub struct ProviderIdentity {
    pub email: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub picture: Option<String>,
    #[serde(default)]
    pub session_token: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct SessionExchangeRequest {
    #[serde(default)]
    #[validate(length(min = 1, message = "session_id required"))]
    pub session_id: String,
}

#[derive(Debug, Serialize)]
pub struct SessionExchangeResponse {
    pub success: bool,
    pub user: User,
}

/// Outcome of a successful exchange, before the token is bound to a cookie.
#[derive(Debug)]
pub struct IssuedSession {
    pub user: User,
    pub session: Session,
}

#[derive(Debug, Serialize)]
pub struct SuccessResponse {
    pub success: bool,
    pub message: String,
}

impl SuccessResponse {
    pub fn new(message: impl Into<String>) -> Self {
        SuccessResponse {
            success: true,
            message: message.into(),
        }
    }
}
