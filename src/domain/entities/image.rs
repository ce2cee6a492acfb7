use std::fmt;

use actix_multipart::form::{tempfile::TempFile, MultipartForm};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::constants::REMOVEBG_PROVIDER;
use crate::entities::option_fields::PatchString;
use crate::utils::ids::new_image_id;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "image_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ImageStatus {
    Uploaded,
    Processing,
    Processed,
    Failed,
    Deleted,
}

/// What a process request may do with an asset in a given status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessDecision {
    /// Already processed; hand back the stored result.
    ReturnCached,
    /// Another request owns the pipeline right now.
    RejectInFlight,
    /// Eligible to be claimed for processing.
    Start,
    /// Tombstoned; behaves as if it never existed.
    Gone,
}

impl ImageStatus {
    pub fn process_decision(self) -> ProcessDecision {
        match self {
            ImageStatus::Processed => ProcessDecision::ReturnCached,
            ImageStatus::Processing => ProcessDecision::RejectInFlight,
            ImageStatus::Uploaded | ImageStatus::Failed => ProcessDecision::Start,
            ImageStatus::Deleted => ProcessDecision::Gone,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ImageStatus::Uploaded => "UPLOADED",
            ImageStatus::Processing => "PROCESSING",
            ImageStatus::Processed => "PROCESSED",
            ImageStatus::Failed => "FAILED",
            ImageStatus::Deleted => "DELETED",
        }
    }
}

impl fmt::Display for ImageStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ImageAsset {
    pub image_id: String,
    pub user_id: String, // Owner
    pub original_filename: String,
    pub original_mime_type: String,
    pub original_size_bytes: i64,
    pub original_width: Option<i32>,
    pub original_height: Option<i32>,
    pub status: ImageStatus,
    pub provider: String,
    pub original_url: Option<String>,
    pub bg_removed_url: Option<String>, // reserved
    pub processed_url: Option<String>,
    pub cloudinary_public_id: Option<String>, // storage handle for deletion
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Per-user namespaces in the asset store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetFolder {
    Originals,
    Processed,
}

impl AssetFolder {
    /// `<root>/<user_id>/originals` or `<root>/<user_id>/processed`.
    pub fn path(self, root: &str, user_id: &str) -> String {
        let leaf = match self {
            AssetFolder::Originals => "originals",
            AssetFolder::Processed => "processed",
        };
        format!("{}/{}/{}", root.trim_end_matches('/'), user_id, leaf)
    }
}

/// A validated upload, ready to be stored.
#[derive(Debug, Clone)]
pub struct UploadedImage {
    pub filename: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

/// Location of a binary held by the asset store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredAsset {
    pub url: String,
    pub public_id: String,
}

#[derive(Debug, Clone)]
pub struct ImageInsert {
    pub image_id: String,
    pub user_id: String,
    pub original_filename: String,
    pub original_mime_type: String,
    pub original_size_bytes: i64,
    pub original_width: Option<i32>,
    pub original_height: Option<i32>,
    pub status: ImageStatus,
    pub provider: String,
    pub original_url: Option<String>,
    pub cloudinary_public_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ImageInsert {
    /// New records always start out `UPLOADED`.
    pub fn uploaded(
        user_id: &str,
        upload: &UploadedImage,
        dimensions: Option<(u32, u32)>,
        original: StoredAsset,
    ) -> Self {
        let now = Utc::now();
        let (width, height) = match dimensions {
            Some((w, h)) => (i32::try_from(w).ok(), i32::try_from(h).ok()),
            None => (None, None),
        };

        ImageInsert {
            image_id: new_image_id(),
            user_id: user_id.to_string(),
            original_filename: upload.filename.clone(),
            original_mime_type: upload.mime_type.clone(),
            original_size_bytes: upload.bytes.len() as i64,
            original_width: width,
            original_height: height,
            status: ImageStatus::Uploaded,
            provider: REMOVEBG_PROVIDER.to_string(),
            original_url: Some(original.url),
            cloudinary_public_id: Some(original.public_id),
            created_at: now,
            updated_at: now,
        }
    }
}

impl From<ImageInsert> for ImageAsset {
    fn from(insert: ImageInsert) -> Self {
        ImageAsset {
            image_id: insert.image_id,
            user_id: insert.user_id,
            original_filename: insert.original_filename,
            original_mime_type: insert.original_mime_type,
            original_size_bytes: insert.original_size_bytes,
            original_width: insert.original_width,
            original_height: insert.original_height,
            status: insert.status,
            provider: insert.provider,
            original_url: insert.original_url,
            bg_removed_url: None,
            processed_url: None,
            cloudinary_public_id: insert.cloudinary_public_id,
            error_message: None,
            created_at: insert.created_at,
            updated_at: insert.updated_at,
        }
    }
}

/// Partial update of an image record. `updated_at` is always refreshed.
#[derive(Debug, Clone, Default)]
pub struct ImageUpdate {
    pub status: Option<ImageStatus>,
    pub processed_url: PatchString,
    pub cloudinary_public_id: PatchString,
    pub error_message: PatchString,
}

impl ImageUpdate {
    pub fn processed(stored: StoredAsset) -> Self {
        ImageUpdate {
            status: Some(ImageStatus::Processed),
            processed_url: PatchString::SetToValue(stored.url),
            cloudinary_public_id: PatchString::SetToValue(stored.public_id),
            error_message: PatchString::SetToNull,
            ..Default::default()
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        ImageUpdate {
            status: Some(ImageStatus::Failed),
            processed_url: PatchString::SetToNull,
            error_message: PatchString::SetToValue(message.into()),
            ..Default::default()
        }
    }
}

// ───── API Request/Response Models ──────────────────────────────────

/// The part limit sits above the accepted size so oversized files reach the
/// size check and get its message.
#[derive(Debug, MultipartForm)]
pub struct ImageUploadForm {
    #[multipart(rename = "file", limit = "16MiB")]
    pub file: TempFile,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ImageResponse {
    pub image_id: String,
    pub original_filename: String,
    pub original_mime_type: String,
    pub original_size_bytes: i64,
    pub original_width: Option<i32>,
    pub original_height: Option<i32>,
    pub status: ImageStatus,
    pub provider: String,
    pub original_url: Option<String>,
    pub bg_removed_url: Option<String>,
    pub processed_url: Option<String>,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<ImageAsset> for ImageResponse {
    fn from(asset: ImageAsset) -> Self {
        ImageResponse {
            image_id: asset.image_id,
            original_filename: asset.original_filename,
            original_mime_type: asset.original_mime_type,
            original_size_bytes: asset.original_size_bytes,
            original_width: asset.original_width,
            original_height: asset.original_height,
            status: asset.status,
            provider: asset.provider,
            original_url: asset.original_url,
            bg_removed_url: asset.bg_removed_url,
            processed_url: asset.processed_url,
            error_message: asset.error_message,
            created_at: asset.created_at,
            updated_at: asset.updated_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ImageUploadResponse {
    pub image_id: String,
    pub status: ImageStatus,
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ImageProcessResponse {
    pub image_id: String,
    pub status: ImageStatus,
    pub processed_url: Option<String>,
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ImageListResponse {
    pub items: Vec<ImageResponse>,
}
