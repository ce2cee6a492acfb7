use actix_web::{FromRequest, HttpMessage, HttpRequest};
use futures_util::future::{ready, Ready};

use crate::{constants::SESSION_COOKIE_NAME, entities::user::User, errors::AppError};

/// Extractor for the user the auth middleware resolved.
/// Returns 401 if the request was not authenticated.
/// Usage: Add `user: AuthUser` as a parameter to your handler function.
#[derive(Debug)]
pub struct AuthUser(pub User);

impl FromRequest for AuthUser {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut actix_web::dev::Payload) -> Self::Future {
        match req.extensions().get::<User>() {
            Some(user) => ready(Ok(AuthUser(user.clone()))),
            None => ready(Err(AppError::not_authenticated().into())),
        }
    }
}

/// Session token from the `session_token` cookie, else from an
/// `Authorization: Bearer` header.
pub fn extract_session_token(req: &HttpRequest) -> Option<String> {
    if let Some(cookie) = req.cookie(SESSION_COOKIE_NAME) {
        let value = cookie.value().trim();
        if !value.is_empty() {
            return Some(value.to_string());
        }
    }

    req.headers()
        .get("Authorization")
        .and_then(|header| header.to_str().ok())
        .and_then(|header| {
            let parts: Vec<&str> = header.split_whitespace().collect();
            if parts.len() == 2 && parts[0].eq_ignore_ascii_case("bearer") {
                Some(parts[1].to_string())
            } else {
                None
            }
        })
}
