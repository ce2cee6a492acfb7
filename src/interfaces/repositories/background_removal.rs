use async_trait::async_trait;
use derive_more::Display;

#[derive(Debug, Display)]
pub enum BackgroundRemovalError {
    #[display("Rate limit exceeded")]
    RateLimited,

    /// Carries the upstream response text, or the transport error.
    #[display("{_0}")]
    Upstream(String),

    #[display("Background removal service not configured")]
    NotConfigured,
}

#[async_trait]
pub trait BackgroundRemover: Send + Sync {
    /// Fetches `source_url` through the removal service and returns the cut-out image bytes.
    async fn remove_background(&self, source_url: &str) -> Result<Vec<u8>, BackgroundRemovalError>;
}
