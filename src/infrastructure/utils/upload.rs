use std::{io, path::Path};
use tokio::fs;

use derive_more::Display;
use infer::Infer;

use crate::constants::ALLOWED_MIME_TYPES;
use crate::entities::image::UploadedImage;
use crate::errors::AppError;

const DEFAULT_FILENAME: &str = "uploaded_image";
const GENERIC_MIME: &str = "application/octet-stream";

/// Validates and reads an uploaded image from its temporary file.
///
/// - `original_filename`: the client supplied name, if any
/// - `declared_mime`: the part's `Content-Type`, if any
/// - `file_path`: where the multipart layer spooled the bytes
/// - `max_size`: inclusive upper bound in bytes
pub async fn read_image_upload(
    original_filename: Option<&str>,
    declared_mime: Option<&str>,
    file_path: &Path,
    max_size: usize,
) -> Result<UploadedImage, UploadError> {
    // 1. Size check before reading anything into memory
    let metadata = fs::metadata(file_path)
        .await
        .map_err(UploadError::IoError)?;
    if metadata.len() > max_size as u64 {
        return Err(UploadError::FileTooLarge(max_size / (1024 * 1024)));
    }

    // 2. Read file content
    let bytes = fs::read(file_path)
        .await
        .map_err(UploadError::IoError)?;
    if bytes.is_empty() {
        return Err(UploadError::EmptyFile);
    }

    // 3. MIME check, sniffing only when the client did not say
    let mime_type = resolve_mime(declared_mime, &bytes)?;

    let filename = original_filename
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .unwrap_or(DEFAULT_FILENAME)
        .to_string();

    Ok(UploadedImage { filename, mime_type, bytes })
}

/// Picks the effective MIME type for an upload and checks it is allowed.
pub fn resolve_mime(declared_mime: Option<&str>, bytes: &[u8]) -> Result<String, UploadError> {
    let declared = declared_mime
        .map(|m| m.split(';').next().unwrap_or(m).trim().to_lowercase())
        .filter(|m| !m.is_empty() && m != GENERIC_MIME);

    let mime = match declared {
        Some(mime) => mime,
        None => Infer::new()
            .get(bytes)
            .map(|kind| kind.mime_type().to_string())
            .ok_or(UploadError::UnknownType)?,
    };

    if ALLOWED_MIME_TYPES.contains(&mime.as_str()) {
        Ok(mime)
    } else {
        Err(UploadError::InvalidType(mime))
    }
}

/// All errors related to image upload handling.
#[derive(Debug, Display)]
pub enum UploadError {
    #[display("Invalid file type: {_0}. Allowed: image/png, image/jpeg, image/webp")]
    InvalidType(String),

    #[display("Could not determine the file type. Allowed: image/png, image/jpeg, image/webp")]
    UnknownType,

    #[display("File is empty.")]
    EmptyFile,

    #[display("File too large. Maximum size: {_0}MB")]
    FileTooLarge(usize),

    #[display("Failed to read file: {_0}")]
    IoError(io::Error),
}

impl From<UploadError> for AppError {
    fn from(err: UploadError) -> Self {
        match err {
            UploadError::IoError(e) => {
                tracing::error!("Failed to read uploaded file: {}", e);
                AppError::InternalError("Failed to read uploaded file".into())
            }
            other => AppError::InvalidInput(other.to_string()),
        }
    }
}
