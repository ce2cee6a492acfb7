use actix_web::web;

use crate::handlers::images;

pub fn config_routes(cfg: &mut web::ServiceConfig) {
    // `/upload` must be registered before `/{image_id}`
    cfg.service(
        web::scope("/images")
            .service(images::upload_image)
            .service(images::list_images)
            .service(images::process_image)
            .service(images::get_image)
            .service(images::delete_image)
    );
}
