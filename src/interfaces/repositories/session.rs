use async_trait::async_trait;

use crate::{
    entities::session::Session,
    errors::AppError,
    repositories::sqlx_repo::SqlxSessionRepo,
};

#[async_trait]
pub trait SessionRepository: Send + Sync {
    async fn find_by_token(&self, session_token: &str) -> Result<Option<Session>, AppError>;
    /// Drops every session of `session.user_id` and stores `session`, atomically.
    async fn replace_for_user(&self, session: &Session) -> Result<(), AppError>;
    /// Returns how many rows were removed.
    async fn delete_by_token(&self, session_token: &str) -> Result<u64, AppError>;
}

impl SqlxSessionRepo {
    pub fn new(pool: sqlx::PgPool) -> Self {
        SqlxSessionRepo { pool }
    }
}

#[async_trait]
impl SessionRepository for SqlxSessionRepo {
    async fn find_by_token(&self, session_token: &str) -> Result<Option<Session>, AppError> {
        let session = sqlx::query_as::<_, Session>(
            r#"SELECT user_id, session_token, expires_at, created_at
            FROM user_sessions
            WHERE session_token = $1
            "#,
        )
        .bind(session_token)
        .fetch_optional(&self.pool)
        .await?;

        Ok(session)
    }

    async fn replace_for_user(&self, session: &Session) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;

        let removed = sqlx::query("DELETE FROM user_sessions WHERE user_id = $1")
            .bind(&session.user_id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        // A provider can hand back a token that is still stored for this user.
        sqlx::query(
            r#"INSERT INTO user_sessions (session_token, user_id, expires_at, created_at)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (session_token) DO UPDATE
            SET user_id = EXCLUDED.user_id,
                expires_at = EXCLUDED.expires_at,
                created_at = EXCLUDED.created_at
            "#,
        )
        .bind(&session.session_token)
        .bind(&session.user_id)
        .bind(session.expires_at)
        .bind(session.created_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::debug!(user_id = %session.user_id, removed, "Session replaced");
        Ok(())
    }

    async fn delete_by_token(&self, session_token: &str) -> Result<u64, AppError> {
        let result = sqlx::query("DELETE FROM user_sessions WHERE session_token = $1")
            .bind(session_token)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}
