use std::sync::Arc;

use chrono::{Duration, Utc};
use validator::Validate;

use crate::entities::session::{IssuedSession, Session, SessionExchangeRequest};
use crate::entities::user::{User, UserInsert};
use crate::errors::{AppError, AuthError};
use crate::repositories::identity::IdentityProvider;
use crate::repositories::session::SessionRepository;
use crate::repositories::user::UserRepository;
use crate::utils::ids::mint_session_token;

pub struct AuthHandler {
    pub user_repo: Arc<dyn UserRepository>,
    pub session_repo: Arc<dyn SessionRepository>,
    pub identity_provider: Arc<dyn IdentityProvider>,
    session_ttl: Duration,
}

impl AuthHandler {
    pub fn new(
        user_repo: Arc<dyn UserRepository>,
        session_repo: Arc<dyn SessionRepository>,
        identity_provider: Arc<dyn IdentityProvider>,
        session_ttl: Duration,
    ) -> Self {
        AuthHandler {
            user_repo,
            session_repo,
            identity_provider,
            session_ttl,
        }
    }

    pub fn session_ttl(&self) -> Duration {
        self.session_ttl
    }

    /// Trades a one-time session id for a local user and a fresh session.
    /// Any earlier session of the user stops working.
    pub async fn exchange(&self, request: SessionExchangeRequest) -> Result<IssuedSession, AppError> {
        request.validate().map_err(|_| AuthError::MissingSessionId)?;
        let session_id = request.session_id.trim();
        if session_id.is_empty() {
            return Err(AuthError::MissingSessionId.into());
        }

        let identity = self.identity_provider.fetch_identity(session_id).await?;
        let user = self.find_or_create_user(&UserInsert::from_identity(&identity)).await?;

        let token = identity.session_token.unwrap_or_else(mint_session_token);
        let session = Session::issue(&user.user_id, token, self.session_ttl);
        self.session_repo.replace_for_user(&session).await?;

        tracing::info!(user_id = %user.user_id, "Session issued");
        Ok(IssuedSession { user, session })
    }

    async fn find_or_create_user(&self, candidate: &UserInsert) -> Result<User, AppError> {
        if let Some(existing) = self.user_repo.get_user_by_email(&candidate.email).await? {
            return Ok(existing);
        }

        match self.user_repo.create_user(candidate).await {
            Ok(user) => {
                tracing::info!(user_id = %user.user_id, "New user created");
                Ok(user)
            }
            // Lost a creation race on the same email
            Err(AppError::Conflict(_)) => self
                .user_repo
                .get_user_by_email(&candidate.email)
                .await?
                .ok_or_else(|| AppError::InternalError("User lookup failed".into())),
            Err(e) => Err(e),
        }
    }

    /// Resolves a session token to its user. Unknown, expired and orphaned
    /// sessions are all reported as not authenticated.
    pub async fn authenticate(&self, token: &str) -> Result<User, AppError> {
        let session = match self.session_repo.find_by_token(token).await? {
            Some(session) => session,
            None => {
                tracing::debug!("Unknown session token");
                return Err(AuthError::NotAuthenticated.into());
            }
        };

        if session.is_expired_at(Utc::now()) {
            tracing::debug!(user_id = %session.user_id, "Expired session token");
            return Err(AuthError::NotAuthenticated.into());
        }

        self.user_repo
            .get_user_by_id(&session.user_id)
            .await?
            .ok_or_else(|| {
                tracing::warn!(user_id = %session.user_id, "Session points at a missing user");
                AuthError::NotAuthenticated.into()
            })
    }

    /// Forgets the session if a token was presented. Never fails.
    pub async fn logout(&self, token: Option<&str>) {
        let Some(token) = token else {
            return;
        };

        match self.session_repo.delete_by_token(token).await {
            Ok(removed) => tracing::debug!(removed, "Session removed"),
            Err(e) => tracing::warn!("Failed to remove session on logout: {}", e),
        }
    }
}
