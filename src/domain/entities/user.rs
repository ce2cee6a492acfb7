use serde::Serialize;
use chrono::{DateTime, Utc};

use crate::entities::session::ProviderIdentity;
use crate::utils::ids::new_user_id;

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct User {
    pub user_id: String,
    pub email: String,
    pub name: String,
    pub picture: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct UserInsert {
    pub user_id: String,
    pub email: String,
    pub name: String,
    pub picture: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl UserInsert {
    /// Builds the local record for an identity seen for the first time.
    pub fn from_identity(identity: &ProviderIdentity) -> Self {
        UserInsert {
            user_id: new_user_id(),
            email: identity.email.clone(),
            name: identity.name.clone(),
            picture: identity.picture.clone(),
            created_at: Utc::now(),
        }
    }
}

impl From<UserInsert> for User {
    fn from(insert: UserInsert) -> Self {
        User {
            user_id: insert.user_id,
            email: insert.email,
            name: insert.name,
            picture: insert.picture,
            created_at: insert.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub user_id: String,
    pub email: String,
    pub name: String,
    pub picture: Option<String>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        UserResponse {
            user_id: user.user_id,
            email: user.email,
            name: user.name,
            picture: user.picture,
        }
    }
}
