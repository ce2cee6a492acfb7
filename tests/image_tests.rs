
use std::sync::atomic::Ordering;

use actix_web::{cookie::Cookie, http::StatusCode, test, ResponseError};
use serde_json::Value;
use test_utils::*;

use flipcut_backend::{constants::MAX_UPLOAD_BYTES, entities::image::ImageStatus};

fn upload_request(token: &str, field: &str, filename: &str, content_type: &str, bytes: &[u8]) -> actix_http::Request {
    let (header, body) = multipart_file(field, filename, content_type, bytes);
    test::TestRequest::post()
        .uri("/api/images/upload")
        .cookie(Cookie::new("session_token", token.to_string()))
        .insert_header(("Content-Type", header))
        .set_payload(body)
        .to_request()
}

#[actix_rt::test]
async fn png_upload_is_stored_and_registered() {
    let ctx = TestContext::new();
    let (user, token) = ctx.sign_in("ada@example.com");
    let app = init_app(ctx.state()).await;

    let png = asymmetric_png(100, 80);
    let resp = test::call_service(&app, upload_request(&token, "file", "cat.png", "image/png", &png)).await;

    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["status"], "UPLOADED");
    assert_eq!(body["message"], "Image uploaded successfully. Ready for processing.");
    let image_id = body["image_id"].as_str().unwrap();
    assert!(image_id.starts_with("img_"));

    let stored = ctx.store.stored();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].folder, format!("flipcut/{}/originals", user.user_id));
    assert_eq!(stored[0].bytes, png);

    let record = ctx.images.snapshot(image_id).unwrap();
    assert_eq!(record.original_filename, "cat.png");
    assert_eq!(record.original_mime_type, "image/png");
    assert_eq!(record.original_size_bytes, png.len() as i64);
    assert_eq!((record.original_width, record.original_height), (Some(100), Some(80)));
    assert_eq!(record.provider, "REMOVEBG");
    assert_eq!(record.original_url.as_deref(), Some(stored[0].asset.url.as_str()));
}

#[actix_rt::test]
async fn unsupported_types_are_rejected() {
    let ctx = TestContext::new();
    let (_, token) = ctx.sign_in("ada@example.com");
    let app = init_app(ctx.state()).await;

    let resp = test::call_service(&app, upload_request(&token, "file", "anim.gif", "image/gif", b"GIF89a....")).await;

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert!(body["error"].as_str().unwrap().starts_with("Invalid file type"));
    assert!(ctx.store.stored().is_empty());
}

#[actix_rt::test]
async fn size_limit_is_inclusive() {
    let ctx = TestContext::new();
    let (_, token) = ctx.sign_in("ada@example.com");
    let app = init_app(ctx.state()).await;

    let exact = vec![0u8; MAX_UPLOAD_BYTES];
    let resp = test::call_service(&app, upload_request(&token, "file", "big.png", "image/png", &exact)).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let over = vec![0u8; 9 * 1024 * 1024];
    let resp = test::call_service(&app, upload_request(&token, "file", "huge.png", "image/png", &over)).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "File too large. Maximum size: 8MB");

    assert_eq!(ctx.store.stored().len(), 1);
}

#[actix_rt::test]
async fn empty_file_and_missing_field_are_bad_requests() {
    let ctx = TestContext::new();
    let (_, token) = ctx.sign_in("ada@example.com");
    let app = init_app(ctx.state()).await;

    let resp = test::call_service(&app, upload_request(&token, "file", "empty.png", "image/png", b"")).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let resp = test::call_service(&app, upload_request(&token, "picture", "cat.png", "image/png", b"x")).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert!(body["error"].is_string());
}

#[actix_rt::test]
async fn storage_failure_on_upload_is_internal_error() {
    let ctx = TestContext::new();
    let (_, token) = ctx.sign_in("ada@example.com");
    ctx.store.fail_uploads.store(true, Ordering::SeqCst);
    let app = init_app(ctx.state()).await;

    let resp = test::call_service(&app, upload_request(&token, "file", "cat.png", "image/png", &asymmetric_png(4, 4))).await;

    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "Failed to upload image");
}

#[actix_rt::test]
async fn unauthenticated_upload_never_reaches_storage() {
    let ctx = TestContext::new();
    let app = init_app(ctx.state()).await;

    let (header, body) = multipart_file("file", "cat.png", "image/png", &asymmetric_png(4, 4));
    let req = test::TestRequest::post()
        .uri("/api/images/upload")
        .insert_header(("Content-Type", header))
        .set_payload(body)
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert!(ctx.store.stored().is_empty());
}

#[actix_rt::test]
async fn listing_is_newest_first_and_scoped_to_owner() {
    let ctx = TestContext::new();
    let (ada, token) = ctx.sign_in("ada@example.com");
    let (bob, _) = ctx.sign_in("bob@example.com");

    let oldest = ctx.seed_image(&ada, 300);
    let newest = ctx.seed_image(&ada, 10);
    let middle = ctx.seed_image(&ada, 100);
    ctx.seed_image(&bob, 5);
    let app = init_app(ctx.state()).await;

    let req = test::TestRequest::get()
        .uri("/api/images")
        .cookie(Cookie::new("session_token", token))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let body: Value = test::read_body_json(resp).await;
    let ids: Vec<&str> = body["items"]
        .as_array()
        .unwrap()
        .iter()
        .map(|item| item["image_id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, vec![newest.image_id.as_str(), middle.image_id.as_str(), oldest.image_id.as_str()]);
    assert!(body["items"][0].get("cloudinary_public_id").is_none());
}

#[actix_rt::test]
async fn foreign_images_look_missing() {
    let ctx = TestContext::new();
    let (ada, _) = ctx.sign_in("ada@example.com");
    let (_, bob_token) = ctx.sign_in("bob@example.com");
    let image = ctx.seed_image(&ada, 1);
    let app = init_app(ctx.state()).await;

    let req = test::TestRequest::get()
        .uri(&format!("/api/images/{}", image.image_id))
        .cookie(Cookie::new("session_token", bob_token.clone()))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "Image not found");

    let req = test::TestRequest::delete()
        .uri(&format!("/api/images/{}", image.image_id))
        .cookie(Cookie::new("session_token", bob_token))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    assert_eq!(ctx.images.snapshot(&image.image_id).unwrap().status, ImageStatus::Uploaded);
    assert!(ctx.store.removed().is_empty());
}

#[actix_rt::test]
async fn deleted_images_vanish_but_record_remains() {
    let ctx = TestContext::new();
    let (ada, token) = ctx.sign_in("ada@example.com");
    let image = ctx.seed_image(&ada, 1);
    let app = init_app(ctx.state()).await;

    let req = test::TestRequest::delete()
        .uri(&format!("/api/images/{}", image.image_id))
        .cookie(Cookie::new("session_token", token.clone()))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["message"], "Image deleted successfully");

    assert_eq!(ctx.store.removed(), vec![image.cloudinary_public_id.clone().unwrap()]);
    let record = ctx.images.snapshot(&image.image_id).unwrap();
    assert_eq!(record.status, ImageStatus::Deleted);

    let req = test::TestRequest::get()
        .uri(&format!("/api/images/{}", image.image_id))
        .cookie(Cookie::new("session_token", token.clone()))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);

    let req = test::TestRequest::get()
        .uri("/api/images")
        .cookie(Cookie::new("session_token", token.clone()))
        .to_request();
    let body: Value = test::read_body_json(test::call_service(&app, req).await).await;
    assert!(body["items"].as_array().unwrap().is_empty());

    let req = test::TestRequest::delete()
        .uri(&format!("/api/images/{}", image.image_id))
        .cookie(Cookie::new("session_token", token))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);
}

#[actix_rt::test]
async fn remote_delete_failure_does_not_block_soft_delete() {
    let ctx = TestContext::new();
    let (ada, _) = ctx.sign_in("ada@example.com");
    let image = ctx.seed_image(&ada, 1);
    ctx.store.fail_removals.store(true, Ordering::SeqCst);
    let state = ctx.state();

    let response = state.image_handler.delete(&ada, &image.image_id).await.unwrap();

    assert!(response.success);
    assert_eq!(ctx.images.snapshot(&image.image_id).unwrap().status, ImageStatus::Deleted);
}

#[actix_rt::test]
async fn failed_tombstone_keeps_the_stored_binary() {
    let ctx = TestContext::new();
    let (ada, _) = ctx.sign_in("ada@example.com");
    let image = ctx.seed_image(&ada, 1);
    ctx.images.fail_deletes.store(true, Ordering::SeqCst);
    let state = ctx.state();

    let err = state.image_handler.delete(&ada, &image.image_id).await.unwrap_err();

    assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(ctx.store.removed().is_empty());
    assert_eq!(ctx.images.snapshot(&image.image_id).unwrap().status, ImageStatus::Uploaded);
}
