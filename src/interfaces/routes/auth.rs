use actix_web::web;

use crate::handlers::auth;

pub fn config_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/auth")
            .service(auth::exchange_session)
            .service(auth::me)
            .service(auth::logout)
    );
}
