use actix_multipart::form::MultipartForm;
use actix_web::{delete, get, post, web, HttpResponse, Responder};
use tracing::instrument;

use crate::constants::MAX_UPLOAD_BYTES;
use crate::entities::image::ImageUploadForm;
use crate::errors::AppError;
use crate::use_cases::extractors::AuthUser;
use crate::utils::upload::read_image_upload;
use crate::AppState;

#[post("/upload")]
#[instrument(skip_all, fields(user_id = %user.0.user_id))]
pub async fn upload_image(
    user: AuthUser,
    state: web::Data<AppState>,
    MultipartForm(form): MultipartForm<ImageUploadForm>,
) -> Result<impl Responder, AppError> {
    let declared_mime = form.file.content_type.as_ref().map(|mime| mime.essence_str());

    let upload = read_image_upload(
        form.file.file_name.as_deref(),
        declared_mime,
        form.file.file.path(),
        MAX_UPLOAD_BYTES,
    )
    .await?;

    let response = state.image_handler.upload(&user.0, upload).await?;
    Ok(HttpResponse::Ok().json(response))
}

#[get("")]
#[instrument(skip_all, fields(user_id = %user.0.user_id))]
pub async fn list_images(
    user: AuthUser,
    state: web::Data<AppState>,
) -> Result<impl Responder, AppError> {
    let images = state.image_handler.list(&user.0).await?;
    Ok(HttpResponse::Ok().json(images))
}

#[get("/{image_id}")]
#[instrument(skip(user, state), fields(user_id = %user.0.user_id))]
pub async fn get_image(
    user: AuthUser,
    state: web::Data<AppState>,
    image_id: web::Path<String>,
) -> Result<impl Responder, AppError> {
    let image = state.image_handler.get(&user.0, &image_id).await?;
    Ok(HttpResponse::Ok().json(image))
}

#[post("/{image_id}/process")]
#[instrument(skip(user, state), fields(user_id = %user.0.user_id))]
pub async fn process_image(
    user: AuthUser,
    state: web::Data<AppState>,
    image_id: web::Path<String>,
) -> Result<impl Responder, AppError> {
    let response = state.image_processor.process(&user.0, &image_id).await?;
    Ok(HttpResponse::Ok().json(response))
}

#[delete("/{image_id}")]
#[instrument(skip(user, state), fields(user_id = %user.0.user_id))]
pub async fn delete_image(
    user: AuthUser,
    state: web::Data<AppState>,
    image_id: web::Path<String>,
) -> Result<impl Responder, AppError> {
    let response = state.image_handler.delete(&user.0, &image_id).await?;
    Ok(HttpResponse::Ok().json(response))
}
