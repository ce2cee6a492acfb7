use actix_web::web;

use crate::handlers::{home::home, system::health_check};

mod auth;
mod images;
mod json_error;

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.configure(json_error::config_routes);

    cfg.service(
        web::scope("/api")
            .service(home)
            .service(health_check)
            .configure(auth::config_routes)
            .configure(images::config_routes)
    );
}
