use actix_web::{
    cookie::{time::Duration as CookieDuration, Cookie, SameSite},
    get, post, web, HttpRequest, HttpResponse, Responder,
};
use tracing::instrument;

use crate::constants::SESSION_COOKIE_NAME;
use crate::entities::session::{SessionExchangeRequest, SessionExchangeResponse, SuccessResponse};
use crate::entities::user::UserResponse;
use crate::errors::AppError;
use crate::use_cases::extractors::{extract_session_token, AuthUser};
use crate::AppState;

fn session_cookie(token: String, max_age_secs: i64) -> Cookie<'static> {
    Cookie::build(SESSION_COOKIE_NAME, token)
        .path("/")
        .http_only(true)
        .secure(true)
        .same_site(SameSite::None)
        .max_age(CookieDuration::seconds(max_age_secs))
        .finish()
}

#[post("/session")]
#[instrument(skip(state, body))]
pub async fn exchange_session(
    state: web::Data<AppState>,
    body: web::Json<SessionExchangeRequest>,
) -> Result<impl Responder, AppError> {
    let issued = state.auth_handler.exchange(body.into_inner()).await?;

    let max_age = state.auth_handler.session_ttl().num_seconds();
    let cookie = session_cookie(issued.session.session_token, max_age);

    Ok(HttpResponse::Ok().cookie(cookie).json(SessionExchangeResponse {
        success: true,
        user: issued.user,
    }))
}

#[get("/me")]
#[instrument(skip_all, fields(user_id = %user.0.user_id))]
pub async fn me(user: AuthUser) -> impl Responder {
    HttpResponse::Ok().json(UserResponse::from(user.0))
}

#[post("/logout")]
#[instrument(skip_all)]
pub async fn logout(request: HttpRequest, state: web::Data<AppState>) -> impl Responder {
    let token = extract_session_token(&request);
    state.auth_handler.logout(token.as_deref()).await;

    let mut removal = session_cookie(String::new(), 0);
    removal.make_removal();

    HttpResponse::Ok()
        .cookie(removal)
        .json(SuccessResponse::new("Logged out"))
}
