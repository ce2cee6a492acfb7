use async_trait::async_trait;

use crate::{entities::session::ProviderIdentity, errors::AuthError};

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Resolves a one-time session id into a verified identity.
    ///
    /// A rejection by the provider is `AuthError::InvalidSession`; transport
    /// or decoding trouble is `AuthError::ProviderUnavailable`.
    async fn fetch_identity(&self, session_id: &str) -> Result<ProviderIdentity, AuthError>;
}
