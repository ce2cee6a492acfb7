
use chrono::{Duration, Utc};
use sqlx::PgPool;
use test_utils::*;

use flipcut_backend::{
    entities::{
        image::{ImageAsset, ImageInsert, ImageStatus, ImageUpdate, StoredAsset, UploadedImage},
        session::Session,
        user::{User, UserInsert},
    },
    errors::AppError,
    repositories::{
        image::ImageRepository,
        session::SessionRepository,
        sqlx_repo::{SqlxImageRepo, SqlxSessionRepo, SqlxUserRepo},
        user::UserRepository,
    },
    utils::ids::{mint_session_token, new_user_id},
};

const CHECK_VIOLATION: &str = "23514";

async fn create_user(pool: &PgPool) -> User {
    let user_id = new_user_id();
    let insert = UserInsert {
        email: format!("{user_id}@example.com"),
        user_id,
        name: "Test User".into(),
        picture: None,
        created_at: Utc::now(),
    };
    SqlxUserRepo::new(pool.clone())
        .create_user(&insert)
        .await
        .expect("Failed to create user")
}

async fn create_image(repo: &SqlxImageRepo, user: &User, age_secs: i64) -> ImageAsset {
    let upload = UploadedImage {
        filename: format!("photo_{age_secs}.png"),
        mime_type: "image/png".into(),
        bytes: vec![1, 2, 3],
    };
    let original = StoredAsset {
        url: format!("https://cdn.test/flipcut/{}/originals/photo_{age_secs}.png", user.user_id),
        public_id: format!("flipcut/{}/originals/photo_{age_secs}", user.user_id),
    };
    let mut insert = ImageInsert::uploaded(&user.user_id, &upload, Some((4, 3)), original);
    insert.created_at = Utc::now() - Duration::seconds(age_secs);
    insert.updated_at = insert.created_at;
    repo.create_image(&insert).await.expect("Failed to create image")
}

fn processed_asset(user: &User) -> StoredAsset {
    StoredAsset {
        url: format!("https://cdn.test/flipcut/{}/processed/out.png", user.user_id),
        public_id: format!("flipcut/{}/processed/out", user.user_id),
    }
}

async fn raw_status(pool: &PgPool, image_id: &str) -> (ImageStatus, Option<String>, Option<String>) {
    sqlx::query_as("SELECT status, processed_url, error_message FROM images WHERE image_id = $1")
        .bind(image_id)
        .fetch_one(pool)
        .await
        .expect("Image row missing")
}

fn violation_code(err: sqlx::Error) -> Option<String> {
    err.as_database_error()
        .and_then(|db| db.code())
        .map(|code| code.into_owned())
}

#[actix_rt::test]
async fn claim_is_won_once_and_allowed_again_after_failure() {
    let Some(pool) = test_pool().await else { return };
    let repo = SqlxImageRepo::new(pool.clone());
    let user = create_user(&pool).await;
    let image = create_image(&repo, &user, 1).await;
    assert_eq!(image.status, ImageStatus::Uploaded);

    let claimed = repo.begin_processing(&image.image_id, &user.user_id).await.unwrap();
    assert_eq!(claimed.unwrap().status, ImageStatus::Processing);
    assert!(repo.begin_processing(&image.image_id, &user.user_id).await.unwrap().is_none());

    let failed = repo
        .update_image(&image.image_id, &user.user_id, ImageStatus::Processing, ImageUpdate::failed("boom"))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(failed.status, ImageStatus::Failed);
    assert_eq!(failed.error_message.as_deref(), Some("boom"));

    let reclaimed = repo
        .begin_processing(&image.image_id, &user.user_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(reclaimed.status, ImageStatus::Processing);
    assert!(reclaimed.error_message.is_none());

    let done = repo
        .update_image(
            &image.image_id,
            &user.user_id,
            ImageStatus::Processing,
            ImageUpdate::processed(processed_asset(&user)),
        )
        .await
        .unwrap()
        .unwrap();
    assert_eq!(done.status, ImageStatus::Processed);
    assert!(done.processed_url.is_some());
    assert!(done.error_message.is_none());
    assert!(done.updated_at >= reclaimed.updated_at);

    assert!(repo.begin_processing(&image.image_id, &user.user_id).await.unwrap().is_none());
}

#[actix_rt::test]
async fn claims_are_scoped_to_the_owner() {
    let Some(pool) = test_pool().await else { return };
    let repo = SqlxImageRepo::new(pool.clone());
    let owner = create_user(&pool).await;
    let other = create_user(&pool).await;
    let image = create_image(&repo, &owner, 1).await;

    assert!(repo.begin_processing(&image.image_id, &other.user_id).await.unwrap().is_none());
    assert!(repo.get_image(&image.image_id, &other.user_id).await.unwrap().is_none());
    assert!(!repo.soft_delete(&image.image_id, &other.user_id).await.unwrap());
    assert_eq!(raw_status(&pool, &image.image_id).await.0, ImageStatus::Uploaded);
}

#[actix_rt::test]
async fn tombstone_is_terminal() {
    let Some(pool) = test_pool().await else { return };
    let repo = SqlxImageRepo::new(pool.clone());
    let user = create_user(&pool).await;
    let image = create_image(&repo, &user, 1).await;

    repo.begin_processing(&image.image_id, &user.user_id).await.unwrap().unwrap();
    assert!(repo.soft_delete(&image.image_id, &user.user_id).await.unwrap());
    assert!(!repo.soft_delete(&image.image_id, &user.user_id).await.unwrap());

    let late_success = repo
        .update_image(
            &image.image_id,
            &user.user_id,
            ImageStatus::Processing,
            ImageUpdate::processed(processed_asset(&user)),
        )
        .await
        .unwrap();
    assert!(late_success.is_none());

    let late_failure = repo
        .update_image(&image.image_id, &user.user_id, ImageStatus::Processing, ImageUpdate::failed("late"))
        .await
        .unwrap();
    assert!(late_failure.is_none());

    assert!(repo.begin_processing(&image.image_id, &user.user_id).await.unwrap().is_none());
    assert!(repo.get_image(&image.image_id, &user.user_id).await.unwrap().is_none());
    assert!(repo.list_images(&user.user_id, 10).await.unwrap().is_empty());
    assert_eq!(raw_status(&pool, &image.image_id).await, (ImageStatus::Deleted, None, None));
}

#[actix_rt::test]
async fn soft_delete_clears_processed_result() {
    let Some(pool) = test_pool().await else { return };
    let repo = SqlxImageRepo::new(pool.clone());
    let user = create_user(&pool).await;
    let image = create_image(&repo, &user, 1).await;

    repo.begin_processing(&image.image_id, &user.user_id).await.unwrap().unwrap();
    repo.update_image(
        &image.image_id,
        &user.user_id,
        ImageStatus::Processing,
        ImageUpdate::processed(processed_asset(&user)),
    )
    .await
    .unwrap()
    .unwrap();

    assert!(repo.soft_delete(&image.image_id, &user.user_id).await.unwrap());
    assert_eq!(raw_status(&pool, &image.image_id).await, (ImageStatus::Deleted, None, None));
}

#[actix_rt::test]
async fn schema_rejects_inconsistent_result_fields() {
    let Some(pool) = test_pool().await else { return };
    let repo = SqlxImageRepo::new(pool.clone());
    let user = create_user(&pool).await;
    let image = create_image(&repo, &user, 1).await;

    let url_without_status = sqlx::query("UPDATE images SET processed_url = 'https://cdn.test/x.png' WHERE image_id = $1")
        .bind(&image.image_id)
        .execute(&pool)
        .await
        .unwrap_err();
    assert_eq!(violation_code(url_without_status).as_deref(), Some(CHECK_VIOLATION));

    let status_without_url = sqlx::query("UPDATE images SET status = 'PROCESSED' WHERE image_id = $1")
        .bind(&image.image_id)
        .execute(&pool)
        .await
        .unwrap_err();
    assert_eq!(violation_code(status_without_url).as_deref(), Some(CHECK_VIOLATION));

    let stray_error = sqlx::query("UPDATE images SET error_message = 'boom' WHERE image_id = $1")
        .bind(&image.image_id)
        .execute(&pool)
        .await
        .unwrap_err();
    assert_eq!(violation_code(stray_error).as_deref(), Some(CHECK_VIOLATION));
}

#[actix_rt::test]
async fn listing_is_newest_first_and_capped() {
    let Some(pool) = test_pool().await else { return };
    let repo = SqlxImageRepo::new(pool.clone());
    let user = create_user(&pool).await;
    let oldest = create_image(&repo, &user, 30).await;
    let middle = create_image(&repo, &user, 20).await;
    let newest = create_image(&repo, &user, 10).await;

    let all: Vec<String> = repo
        .list_images(&user.user_id, 10)
        .await
        .unwrap()
        .into_iter()
        .map(|i| i.image_id)
        .collect();
    assert_eq!(all, vec![newest.image_id.clone(), middle.image_id.clone(), oldest.image_id]);

    let capped = repo.list_images(&user.user_id, 2).await.unwrap();
    assert_eq!(capped.len(), 2);
    assert_eq!(capped[0].image_id, newest.image_id);
}

#[actix_rt::test]
async fn new_session_replaces_previous_ones() {
    let Some(pool) = test_pool().await else { return };
    let sessions = SqlxSessionRepo::new(pool.clone());
    let user = create_user(&pool).await;

    let first = Session::issue(&user.user_id, mint_session_token(), Duration::days(7));
    sessions.replace_for_user(&first).await.unwrap();
    let second = Session::issue(&user.user_id, mint_session_token(), Duration::days(7));
    sessions.replace_for_user(&second).await.unwrap();

    assert!(sessions.find_by_token(&first.session_token).await.unwrap().is_none());
    let stored = sessions.find_by_token(&second.session_token).await.unwrap().unwrap();
    assert_eq!(stored.user_id, user.user_id);

    assert_eq!(sessions.delete_by_token(&second.session_token).await.unwrap(), 1);
    assert_eq!(sessions.delete_by_token(&second.session_token).await.unwrap(), 0);
}

#[actix_rt::test]
async fn reissuing_the_same_token_refreshes_it() {
    let Some(pool) = test_pool().await else { return };
    let sessions = SqlxSessionRepo::new(pool.clone());
    let user = create_user(&pool).await;
    let token = mint_session_token();

    let short = Session::issue(&user.user_id, token.clone(), Duration::hours(1));
    sessions.replace_for_user(&short).await.unwrap();
    let long = Session::issue(&user.user_id, token.clone(), Duration::days(7));
    sessions.replace_for_user(&long).await.unwrap();

    let stored = sessions.find_by_token(&token).await.unwrap().unwrap();
    assert!(stored.expires_at > short.expires_at);
}

#[actix_rt::test]
async fn duplicate_email_is_a_conflict() {
    let Some(pool) = test_pool().await else { return };
    let users = SqlxUserRepo::new(pool.clone());
    let existing = create_user(&pool).await;

    let duplicate = UserInsert {
        user_id: new_user_id(),
        email: existing.email.clone(),
        name: "Someone Else".into(),
        picture: None,
        created_at: Utc::now(),
    };
    let err = users.create_user(&duplicate).await.unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));

    let found = users.get_user_by_email(&existing.email).await.unwrap().unwrap();
    assert_eq!(found.user_id, existing.user_id);
}
