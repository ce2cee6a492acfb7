use actix_multipart::MultipartError;
use actix_web::{error::JsonPayloadError, HttpRequest};

use crate::errors::AppError;

/// Rejections produced by the JSON body extractor.
pub fn json_payload_error(err: JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
    tracing::debug!("Rejected JSON payload: {}", err);
    let message = match err {
        JsonPayloadError::ContentType => "Content type must be application/json".to_string(),
        JsonPayloadError::Deserialize(e) => format!("Invalid JSON body: {e}"),
        other => format!("Invalid request body: {other}"),
    };
    AppError::InvalidInput(message).into()
}

/// Rejections produced by the multipart form extractor.
pub fn multipart_error(err: MultipartError, _req: &HttpRequest) -> actix_web::Error {
    tracing::debug!("Rejected multipart payload: {}", err);
    let message = match err {
        MultipartError::MissingField(field) => format!("Missing form field: {field}"),
        MultipartError::ContentTypeMissing | MultipartError::ContentTypeIncompatible => {
            "Request must be multipart/form-data".to_string()
        }
        other => format!("Invalid upload: {other}"),
    };
    AppError::InvalidInput(message).into()
}
