use actix_web::{
    body::BoxBody,
    dev::{Service, ServiceRequest, ServiceResponse, Transform},
    web, Error, HttpMessage, ResponseError,
};
use futures_util::future::{ok, Ready, LocalBoxFuture};
use std::{rc::Rc, task::{Context, Poll}};

use crate::{errors::AppError, use_cases::extractors::extract_session_token, AppState};

/// Resolves the session on every protected route and stores the `User` in
/// the request extensions. Rejections never reach the handler.
pub struct AuthMiddleware;

impl<S> Transform<S, ServiceRequest> for AuthMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<BoxBody>, Error = Error> + 'static,
{
    type Response = ServiceResponse<BoxBody>;
    type Error = Error;
    type InitError = ();
    type Transform = AuthMiddlewareService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ok(AuthMiddlewareService {
            service: Rc::new(service),
        })
    }
}

pub struct AuthMiddlewareService<S> {
    service: Rc<S>,
}

impl<S> Service<ServiceRequest> for AuthMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<BoxBody>, Error = Error> + 'static,
{
    type Response = ServiceResponse<BoxBody>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&self, ctx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.service.poll_ready(ctx)
    }

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);

        Box::pin(async move {
            if is_public_route(req.path(), req.method().as_str()) {
                return service.call(req).await;
            }

            let Some(state) = req.app_data::<web::Data<AppState>>().cloned() else {
                tracing::error!("AppState missing in middleware");
                return Ok(error_response(req, AppError::InternalError("Internal server error".into())));
            };

            let Some(token) = extract_session_token(req.request()) else {
                tracing::debug!(path = req.path(), "Request without session token");
                return Ok(error_response(req, AppError::not_authenticated()));
            };

            match state.auth_handler.authenticate(&token).await {
                Ok(user) => {
                    req.extensions_mut().insert(user);
                    service.call(req).await
                }
                Err(e) => Ok(error_response(req, e)),
            }
        })
    }
}

fn is_public_route(path: &str, method: &str) -> bool {
    if method == "OPTIONS" {
        return true;
    }

    let path = match path.trim_end_matches('/') {
        "" => "/",
        trimmed => trimmed,
    };

    // Outside the API there is nothing to protect; the router answers 404.
    if path != "/api" && !path.starts_with("/api/") {
        return true;
    }

    matches!(
        (path, method),
        ("/api", "GET") |
        ("/api/health", "GET") |
        ("/api/auth/session", "POST") |
        ("/api/auth/logout", "POST")
    )
}

fn error_response(req: ServiceRequest, err: AppError) -> ServiceResponse<BoxBody> {
    req.into_response(err.error_response())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn public_routes_are_matched_with_or_without_trailing_slash() {
        assert!(is_public_route("/api", "GET"));
        assert!(is_public_route("/api/", "GET"));
        assert!(is_public_route("/api/health/", "GET"));
        assert!(is_public_route("/api/auth/session", "POST"));
        assert!(is_public_route("/api/auth/logout", "POST"));
        assert!(is_public_route("/api/images", "OPTIONS"));
    }

    #[test]
    fn image_and_profile_routes_are_protected() {
        assert!(!is_public_route("/api/auth/me", "GET"));
        assert!(!is_public_route("/api/images", "GET"));
        assert!(!is_public_route("/api/images/img_1/process", "POST"));
        assert!(!is_public_route("/api/auth/session", "GET"));
    }
}
