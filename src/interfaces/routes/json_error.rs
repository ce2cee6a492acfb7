use actix_multipart::form::MultipartFormConfig;
use actix_web::web;

use crate::constants::MAX_UPLOAD_BYTES;
use crate::handlers::json_error::{json_payload_error, multipart_error};

/// Extractor configs so malformed bodies get the usual `{"error"}` shape.
pub fn config_routes(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(json_payload_error));
    cfg.app_data(
        MultipartFormConfig::default()
            .total_limit(2 * MAX_UPLOAD_BYTES)
            .memory_limit(2 * MAX_UPLOAD_BYTES)
            .error_handler(multipart_error),
    );
}
