use std::sync::Arc;

use crate::constants::MAX_LISTED_IMAGES;
use crate::entities::image::{
    AssetFolder, ImageInsert, ImageListResponse, ImageResponse, ImageUploadResponse, UploadedImage,
};
use crate::entities::session::SuccessResponse;
use crate::entities::user::User;
use crate::errors::AppError;
use crate::imaging::transform::probe_dimensions;
use crate::repositories::asset_store::AssetStore;
use crate::repositories::image::ImageRepository;

/// Registry operations on a user's images.
pub struct ImageHandler {
    pub image_repo: Arc<dyn ImageRepository>,
    pub asset_store: Arc<dyn AssetStore>,
    folder_root: String,
}

impl ImageHandler {
    pub fn new(
        image_repo: Arc<dyn ImageRepository>,
        asset_store: Arc<dyn AssetStore>,
        folder_root: impl Into<String>,
    ) -> Self {
        ImageHandler {
            image_repo,
            asset_store,
            folder_root: folder_root.into(),
        }
    }

    pub async fn upload(&self, user: &User, upload: UploadedImage) -> Result<ImageUploadResponse, AppError> {
        let dimensions = probe_dimensions(&upload.bytes);
        let folder = AssetFolder::Originals.path(&self.folder_root, &user.user_id);

        let original = self
            .asset_store
            .store(upload.bytes.clone(), &folder, None)
            .await
            .map_err(|e| {
                tracing::error!(user_id = %user.user_id, "Original upload failed: {}", e);
                AppError::InternalError("Failed to upload image".into())
            })?;

        let insert = ImageInsert::uploaded(&user.user_id, &upload, dimensions, original);
        let created = self.image_repo.create_image(&insert).await?;

        tracing::info!(image_id = %created.image_id, size = created.original_size_bytes, "Image uploaded");
        Ok(ImageUploadResponse {
            image_id: created.image_id,
            status: created.status,
            message: "Image uploaded successfully. Ready for processing.".to_string(),
        })
    }

    pub async fn list(&self, user: &User) -> Result<ImageListResponse, AppError> {
        let images = self
            .image_repo
            .list_images(&user.user_id, MAX_LISTED_IMAGES)
            .await?;

        Ok(ImageListResponse {
            items: images.into_iter().map(ImageResponse::from).collect(),
        })
    }

    pub async fn get(&self, user: &User, image_id: &str) -> Result<ImageResponse, AppError> {
        self.image_repo
            .get_image(image_id, &user.user_id)
            .await?
            .map(ImageResponse::from)
            .ok_or_else(AppError::image_not_found)
    }

    /// Tombstones the record. The stored binary is removed best-effort.
    pub async fn delete(&self, user: &User, image_id: &str) -> Result<SuccessResponse, AppError> {
        let image = self
            .image_repo
            .get_image(image_id, &user.user_id)
            .await?
            .ok_or_else(AppError::image_not_found)?;

        if !self.image_repo.soft_delete(image_id, &user.user_id).await? {
            return Err(AppError::image_not_found());
        }

        // Only after the tombstone is written; a live record never points at a removed binary.
        if let Some(public_id) = image.cloudinary_public_id.as_deref() {
            if let Err(e) = self.asset_store.remove(public_id).await {
                tracing::warn!(image_id, "Failed to delete stored asset: {}", e);
            }
        }

        tracing::info!(image_id, "Image deleted");
        Ok(SuccessResponse::new("Image deleted successfully"))
    }
}
