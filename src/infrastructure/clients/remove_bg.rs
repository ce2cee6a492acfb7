use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use zeroize::Zeroizing;

use crate::{
    repositories::background_removal::{BackgroundRemovalError, BackgroundRemover},
    settings::AppConfig,
};

const API_KEY_HEADER: &str = "X-Api-Key";

/// remove.bg client. Built even without a key so the missing key surfaces
/// per request rather than at startup.
pub struct RemoveBgClient {
    client: Client,
    url: String,
    api_key: Option<Zeroizing<String>>,
}

impl RemoveBgClient {
    pub fn new(config: &AppConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(config.removebg_timeout())
            .build()?;

        let api_key = config
            .removebg_api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
            .map(|key| Zeroizing::new(key.to_string()));
        if api_key.is_none() {
            tracing::warn!("REMOVEBG_API_KEY is not set; processing requests will fail");
        }

        Ok(RemoveBgClient {
            client,
            url: config.removebg_api_url.clone(),
            api_key,
        })
    }
}

#[async_trait]
impl BackgroundRemover for RemoveBgClient {
    #[tracing::instrument(skip(self))]
    async fn remove_background(&self, source_url: &str) -> Result<Vec<u8>, BackgroundRemovalError> {
        let api_key = self
            .api_key
            .as_ref()
            .ok_or(BackgroundRemovalError::NotConfigured)?;

        let form = [("image_url", source_url), ("size", "auto"), ("format", "png")];

        let response = self
            .client
            .post(&self.url)
            .header(API_KEY_HEADER, api_key.as_str())
            .form(&form)
            .send()
            .await
            .map_err(|e| {
                tracing::error!("remove.bg request failed: {}", e);
                BackgroundRemovalError::Upstream(e.to_string())
            })?;

        match response.status() {
            StatusCode::OK => {
                let bytes = response
                    .bytes()
                    .await
                    .map_err(|e| BackgroundRemovalError::Upstream(e.to_string()))?;
                tracing::debug!(size = bytes.len(), "Background removed");
                Ok(bytes.to_vec())
            }
            StatusCode::TOO_MANY_REQUESTS => {
                tracing::warn!("remove.bg rate limit hit");
                Err(BackgroundRemovalError::RateLimited)
            }
            status => {
                let body = response.text().await.unwrap_or_default();
                tracing::warn!(%status, "remove.bg returned an error");
                Err(BackgroundRemovalError::Upstream(body))
            }
        }
    }
}
