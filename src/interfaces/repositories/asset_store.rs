use async_trait::async_trait;
use derive_more::Display;

use crate::entities::image::StoredAsset;

#[derive(Debug, Display)]
pub enum AssetStoreError {
    #[display("Media storage is not configured")]
    NotConfigured,

    #[display("Media storage request failed: {_0}")]
    Transport(String),

    #[display("Media storage rejected the request ({status}): {body}")]
    Rejected { status: u16, body: String },

    #[display("Unexpected media storage response: {_0}")]
    InvalidResponse(String),
}

impl From<reqwest::Error> for AssetStoreError {
    fn from(err: reqwest::Error) -> Self {
        AssetStoreError::Transport(err.to_string())
    }
}

#[async_trait]
pub trait AssetStore: Send + Sync {
    /// Uploads `bytes` under `folder`. `format` asks the store to convert on ingest.
    async fn store(
        &self,
        bytes: Vec<u8>,
        folder: &str,
        format: Option<&str>,
    ) -> Result<StoredAsset, AssetStoreError>;

    /// Removes a stored binary and invalidates cached copies.
    async fn remove(&self, public_id: &str) -> Result<(), AssetStoreError>;
}
