use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;

use crate::{
    entities::session::ProviderIdentity,
    errors::AuthError,
    repositories::identity::IdentityProvider,
    settings::AppConfig,
};

const SESSION_ID_HEADER: &str = "X-Session-ID";

/// Identity provider reached over HTTP; one GET per exchange, never retried.
#[derive(Clone)]
pub struct HttpIdentityProvider {
    client: Client,
    url: String,
}

/// Wire shape of the provider payload. Only `email` is mandatory for us.
#[derive(Debug, Deserialize)]
struct SessionData {
    email: Option<String>,
    name: Option<String>,
    picture: Option<String>,
    session_token: Option<String>,
}

impl SessionData {
    fn into_identity(self) -> Option<ProviderIdentity> {
        let email = self.email.map(|e| e.trim().to_string()).filter(|e| !e.is_empty())?;
        Some(ProviderIdentity {
            email,
            name: self.name.unwrap_or_default(),
            picture: self.picture.filter(|p| !p.is_empty()),
            session_token: self.session_token.filter(|t| !t.is_empty()),
        })
    }
}

impl HttpIdentityProvider {
    pub fn new(config: &AppConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(config.auth_provider_timeout())
            .build()?;

        Ok(HttpIdentityProvider {
            client,
            url: config.auth_provider_url.clone(),
        })
    }
}

#[async_trait]
impl IdentityProvider for HttpIdentityProvider {
    #[tracing::instrument(skip_all)]
    async fn fetch_identity(&self, session_id: &str) -> Result<ProviderIdentity, AuthError> {
        let response = self
            .client
            .get(&self.url)
            .header(SESSION_ID_HEADER, session_id)
            .send()
            .await
            .map_err(|e| {
                tracing::error!("Auth provider unreachable: {}", e);
                AuthError::from(e)
            })?;

        if response.status() != StatusCode::OK {
            tracing::warn!(status = %response.status(), "Auth provider rejected session id");
            return Err(AuthError::InvalidSession);
        }

        let data: SessionData = response.json().await.map_err(|e| {
            tracing::error!("Auth provider returned an unreadable body: {}", e);
            AuthError::from(e)
        })?;

        data.into_identity().ok_or_else(|| {
            tracing::warn!("Auth provider response carried no email");
            AuthError::InvalidSession
        })
    }
}
