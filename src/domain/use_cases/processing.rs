use std::sync::Arc;

use derive_more::Display;
use tracing::Instrument;

use crate::constants::RATE_LIMIT_MESSAGE;
use crate::entities::image::{
    AssetFolder, ImageAsset, ImageProcessResponse, ImageStatus, ImageUpdate, ProcessDecision,
    StoredAsset,
};
use crate::entities::user::User;
use crate::errors::AppError;
use crate::imaging::transform::{flip_horizontal, TransformError};
use crate::repositories::asset_store::{AssetStore, AssetStoreError};
use crate::repositories::background_removal::{BackgroundRemovalError, BackgroundRemover};
use crate::repositories::image::ImageRepository;

const IN_FLIGHT_MESSAGE: &str = "Image is currently being processed";

/// How a pipeline run failed. Decides both the persisted message and the
/// HTTP status.
#[derive(Debug, Display)]
enum PipelineError {
    #[display("Rate limit exceeded")]
    RateLimited,

    #[display("Background removal failed: {_0}")]
    Upstream(String),

    #[display("{_0}")]
    Internal(String),
}

impl PipelineError {
    fn persisted_message(&self) -> String {
        match self {
            PipelineError::RateLimited => RATE_LIMIT_MESSAGE.to_string(),
            other => other.to_string(),
        }
    }
}

impl From<BackgroundRemovalError> for PipelineError {
    fn from(err: BackgroundRemovalError) -> Self {
        match err {
            BackgroundRemovalError::RateLimited => PipelineError::RateLimited,
            BackgroundRemovalError::Upstream(text) => PipelineError::Upstream(text),
            BackgroundRemovalError::NotConfigured => PipelineError::Internal(err.to_string()),
        }
    }
}

impl From<TransformError> for PipelineError {
    fn from(err: TransformError) -> Self {
        tracing::error!("Image transform failed: {}", err);
        let reason = match err {
            TransformError::Decode(_) => "Could not decode the background-removed image",
            TransformError::Encode(_) => "Could not encode the processed image",
        };
        PipelineError::Internal(reason.into())
    }
}

impl From<AssetStoreError> for PipelineError {
    fn from(err: AssetStoreError) -> Self {
        tracing::error!("Processed image upload failed: {}", err);
        PipelineError::Internal("Failed to store processed image".into())
    }
}

impl From<PipelineError> for AppError {
    fn from(err: PipelineError) -> Self {
        match err {
            PipelineError::RateLimited => AppError::RateLimited(err.to_string()),
            PipelineError::Upstream(_) => AppError::UpstreamFailure(err.to_string()),
            PipelineError::Internal(reason) => AppError::InternalError(format!("Processing failed: {reason}")),
        }
    }
}

/// Runs background removal, flip and upload for one image, recording every
/// outcome on the image record.
pub struct ImageProcessor {
    pipeline: Pipeline,
}

impl ImageProcessor {
    pub fn new(
        image_repo: Arc<dyn ImageRepository>,
        remover: Arc<dyn BackgroundRemover>,
        asset_store: Arc<dyn AssetStore>,
        folder_root: impl Into<String>,
    ) -> Self {
        ImageProcessor {
            pipeline: Pipeline {
                image_repo,
                remover,
                asset_store,
                folder_root: Arc::from(folder_root.into()),
            },
        }
    }

    #[tracing::instrument(skip(self, user), fields(user_id = %user.user_id))]
    pub async fn process(&self, user: &User, image_id: &str) -> Result<ImageProcessResponse, AppError> {
        let image = self
            .pipeline
            .image_repo
            .get_image(image_id, &user.user_id)
            .await?
            .ok_or_else(AppError::image_not_found)?;

        match image.status.process_decision() {
            ProcessDecision::ReturnCached => {
                tracing::debug!("Already processed, returning stored result");
                return Ok(process_response(image, "Image already processed"));
            }
            ProcessDecision::RejectInFlight => return Err(AppError::Conflict(IN_FLIGHT_MESSAGE.into())),
            ProcessDecision::Gone => return Err(AppError::image_not_found()),
            ProcessDecision::Start => {}
        }

        // Someone else may have claimed it since the read above.
        let claimed = self
            .pipeline
            .image_repo
            .begin_processing(image_id, &user.user_id)
            .await?
            .ok_or_else(|| AppError::Conflict(IN_FLIGHT_MESSAGE.into()))?;

        // A claimed record must leave PROCESSING even if the caller goes away.
        let pipeline = self.pipeline.clone();
        tokio::spawn(async move { pipeline.complete(claimed).await }.in_current_span())
            .await
            .map_err(|e| {
                tracing::error!("Processing task aborted: {}", e);
                AppError::InternalError("Processing failed".into())
            })?
    }
}

/// Owned handles for one pipeline run.
#[derive(Clone)]
struct Pipeline {
    image_repo: Arc<dyn ImageRepository>,
    remover: Arc<dyn BackgroundRemover>,
    asset_store: Arc<dyn AssetStore>,
    folder_root: Arc<str>,
}

impl Pipeline {
    async fn complete(self, claimed: ImageAsset) -> Result<ImageProcessResponse, AppError> {
        let ImageAsset { image_id, user_id, .. } = &claimed;

        match self.run(&claimed).await {
            Ok(stored) => {
                let public_id = stored.public_id.clone();
                let finished = self
                    .image_repo
                    .update_image(image_id, user_id, ImageStatus::Processing, ImageUpdate::processed(stored))
                    .await?;

                match finished {
                    Some(updated) => {
                        tracing::info!("Image processed");
                        Ok(process_response(updated, "Image processed successfully"))
                    }
                    None => {
                        tracing::info!("Image deleted while processing, discarding result");
                        if let Err(e) = self.asset_store.remove(&public_id).await {
                            tracing::warn!("Failed to delete orphaned processed asset: {}", e);
                        }
                        Err(AppError::image_not_found())
                    }
                }
            }
            Err(err) => {
                tracing::warn!("Processing failed: {}", err);
                let update = ImageUpdate::failed(err.persisted_message());
                match self.image_repo.update_image(image_id, user_id, ImageStatus::Processing, update).await {
                    Ok(Some(_)) => {}
                    Ok(None) => tracing::info!("Image deleted while processing, failure not recorded"),
                    Err(e) => tracing::error!("Failed to record processing failure: {}", e),
                }
                Err(err.into())
            }
        }
    }

    async fn run(&self, image: &ImageAsset) -> Result<StoredAsset, PipelineError> {
        let source_url = image
            .original_url
            .as_deref()
            .ok_or_else(|| PipelineError::Internal("Original image is missing".into()))?;

        let cutout = self.remover.remove_background(source_url).await?;

        let flipped = tokio::task::spawn_blocking(move || flip_horizontal(&cutout))
            .await
            .map_err(|e| {
                tracing::error!("Image transform task failed: {}", e);
                PipelineError::Internal("Image transform task failed".into())
            })??;

        let folder = AssetFolder::Processed.path(&self.folder_root, &image.user_id);
        let stored = self.asset_store.store(flipped, &folder, Some("png")).await?;

        Ok(stored)
    }
}

fn process_response(image: ImageAsset, message: &str) -> ImageProcessResponse {
    ImageProcessResponse {
        image_id: image.image_id,
        status: image.status,
        processed_url: image.processed_url,
        message: message.to_string(),
    }
}
