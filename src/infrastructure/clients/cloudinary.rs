use async_trait::async_trait;
use chrono::Utc;
use reqwest::{multipart, Client};
use serde::Deserialize;
use sha1::{Digest, Sha1};
use zeroize::Zeroizing;

use crate::{
    entities::image::StoredAsset,
    repositories::asset_store::{AssetStore, AssetStoreError},
    settings::{AppConfig, CloudinaryCredentials},
};

/// Cloudinary upload/destroy over the signed REST API.
pub struct CloudinaryClient {
    client: Client,
    api_base: String,
    credentials: Option<CloudinaryCredentials>,
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    secure_url: Option<String>,
    public_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DestroyResponse {
    result: String,
}

/// SHA-1 over the parameters sorted by name, joined as `k=v&k=v`, then the secret.
fn sign(params: &[(&str, &str)], api_secret: &str) -> String {
    let mut sorted = params.to_vec();
    sorted.sort_by(|a, b| a.0.cmp(b.0));

    let joined = sorted
        .iter()
        .map(|(key, value)| format!("{key}={value}"))
        .collect::<Vec<_>>()
        .join("&");

    let payload = Zeroizing::new(format!("{joined}{api_secret}"));
    let mut hasher = Sha1::new();
    hasher.update(payload.as_bytes());
    hex::encode(hasher.finalize())
}

impl CloudinaryClient {
    pub fn new(config: &AppConfig) -> Result<Self, reqwest::Error> {
        let credentials = config.cloudinary_credentials();
        if credentials.is_none() {
            tracing::warn!("Cloudinary credentials missing; uploads will fail");
        }

        Ok(CloudinaryClient {
            client: Client::builder().build()?,
            api_base: config.cloudinary_api_base.trim_end_matches('/').to_string(),
            credentials,
        })
    }

    fn credentials(&self) -> Result<&CloudinaryCredentials, AssetStoreError> {
        self.credentials.as_ref().ok_or(AssetStoreError::NotConfigured)
    }

    fn endpoint(&self, cloud_name: &str, action: &str) -> String {
        format!("{}/{}/image/{}", self.api_base, cloud_name, action)
    }
}

#[async_trait]
impl AssetStore for CloudinaryClient {
    #[tracing::instrument(skip(self, bytes), fields(size = bytes.len()))]
    async fn store(
        &self,
        bytes: Vec<u8>,
        folder: &str,
        format: Option<&str>,
    ) -> Result<StoredAsset, AssetStoreError> {
        let creds = self.credentials()?;
        let timestamp = Utc::now().timestamp().to_string();

        let mut params = vec![("folder", folder), ("timestamp", timestamp.as_str())];
        if let Some(format) = format {
            params.push(("format", format));
        }
        let signature = sign(&params, &creds.api_secret);

        let mut form = multipart::Form::new()
            .part("file", multipart::Part::bytes(bytes).file_name("upload"))
            .text("api_key", creds.api_key.clone())
            .text("signature", signature);
        for (key, value) in params {
            form = form.text(key.to_string(), value.to_string());
        }

        let response = self
            .client
            .post(self.endpoint(&creds.cloud_name, "upload"))
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(%status, "Cloudinary upload rejected");
            return Err(AssetStoreError::Rejected { status: status.as_u16(), body });
        }

        let uploaded: UploadResponse = response
            .json()
            .await
            .map_err(|e| AssetStoreError::InvalidResponse(e.to_string()))?;

        match (uploaded.secure_url, uploaded.public_id) {
            (Some(url), Some(public_id)) => Ok(StoredAsset { url, public_id }),
            _ => Err(AssetStoreError::InvalidResponse(
                "missing secure_url or public_id".into(),
            )),
        }
    }

    #[tracing::instrument(skip(self))]
    async fn remove(&self, public_id: &str) -> Result<(), AssetStoreError> {
        let creds = self.credentials()?;
        let timestamp = Utc::now().timestamp().to_string();

        let params = [
            ("invalidate", "true"),
            ("public_id", public_id),
            ("timestamp", timestamp.as_str()),
        ];
        let signature = sign(&params, &creds.api_secret);

        let mut form = params.to_vec();
        form.push(("api_key", creds.api_key.as_str()));
        form.push(("signature", signature.as_str()));

        let response = self
            .client
            .post(self.endpoint(&creds.cloud_name, "destroy"))
            .form(&form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AssetStoreError::Rejected { status: status.as_u16(), body });
        }

        let destroyed: DestroyResponse = response
            .json()
            .await
            .map_err(|e| AssetStoreError::InvalidResponse(e.to_string()))?;

        match destroyed.result.as_str() {
            "ok" => Ok(()),
            "not found" => {
                tracing::debug!("Asset already gone from storage");
                Ok(())
            }
            other => Err(AssetStoreError::InvalidResponse(other.to_string())),
        }
    }
}
