use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Postgres, QueryBuilder};

use crate::{
    entities::{
        image::{ImageAsset, ImageInsert, ImageStatus, ImageUpdate},
        option_fields::PatchString,
    },
    errors::AppError,
    repositories::sqlx_repo::SqlxImageRepo,
};

/// Image records, always scoped to their owner. Tombstoned rows are invisible
/// to every read here.
#[async_trait]
pub trait ImageRepository: Send + Sync {
    async fn create_image(&self, image: &ImageInsert) -> Result<ImageAsset, AppError>;
    async fn get_image(&self, image_id: &str, user_id: &str) -> Result<Option<ImageAsset>, AppError>;
    /// Newest first.
    async fn list_images(&self, user_id: &str, limit: i64) -> Result<Vec<ImageAsset>, AppError>;
    /// Applies `update` only while the record is still in `expected`, so a
    /// tombstone or a competing transition is never overwritten.
    /// `None` means no row matched.
    async fn update_image(
        &self,
        image_id: &str,
        user_id: &str,
        expected: ImageStatus,
        update: ImageUpdate,
    ) -> Result<Option<ImageAsset>, AppError>;
    /// Moves `UPLOADED | FAILED` to `PROCESSING` in one statement.
    /// `None` means nothing was claimed.
    async fn begin_processing(&self, image_id: &str, user_id: &str) -> Result<Option<ImageAsset>, AppError>;
    /// Returns `false` when there was no live record to tombstone.
    async fn soft_delete(&self, image_id: &str, user_id: &str) -> Result<bool, AppError>;
}

impl SqlxImageRepo {
    pub fn new(pool: sqlx::PgPool) -> Self {
        SqlxImageRepo { pool }
    }
}

fn push_patch(builder: &mut QueryBuilder<'_, Postgres>, column: &str, patch: PatchString) {
    if let Some(value) = patch.into_option() {
        builder.push(", ").push(column).push(" = ").push_bind(value);
    }
}

#[async_trait]
impl ImageRepository for SqlxImageRepo {
    async fn create_image(&self, image: &ImageInsert) -> Result<ImageAsset, AppError> {
        let created = sqlx::query_as::<_, ImageAsset>(
            r#"INSERT INTO images (
                image_id,
                user_id,
                original_filename,
                original_mime_type,
                original_size_bytes,
                original_width,
                original_height,
                status,
                provider,
                original_url,
                cloudinary_public_id,
                created_at,
                updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, 'UPLOADED', $8, $9, $10, $11, $12)
            RETURNING *
            "#,
        )
        .bind(&image.image_id)
        .bind(&image.user_id)
        .bind(&image.original_filename)
        .bind(&image.original_mime_type)
        .bind(image.original_size_bytes)
        .bind(image.original_width)
        .bind(image.original_height)
        .bind(&image.provider)
        .bind(&image.original_url)
        .bind(&image.cloudinary_public_id)
        .bind(image.created_at)
        .bind(image.updated_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(created)
    }

    async fn get_image(&self, image_id: &str, user_id: &str) -> Result<Option<ImageAsset>, AppError> {
        let image = sqlx::query_as::<_, ImageAsset>(
            r#"SELECT * FROM images
            WHERE image_id = $1 AND user_id = $2 AND status <> 'DELETED'
            "#,
        )
        .bind(image_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(image)
    }

    async fn list_images(&self, user_id: &str, limit: i64) -> Result<Vec<ImageAsset>, AppError> {
        let images = sqlx::query_as::<_, ImageAsset>(
            r#"SELECT * FROM images
            WHERE user_id = $1 AND status <> 'DELETED'
            ORDER BY created_at DESC
            LIMIT $2
            "#,
        )
        .bind(user_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(images)
    }

    async fn update_image(
        &self,
        image_id: &str,
        user_id: &str,
        expected: ImageStatus,
        update: ImageUpdate,
    ) -> Result<Option<ImageAsset>, AppError> {
        let mut builder = QueryBuilder::<Postgres>::new("UPDATE images SET updated_at = ");
        builder.push_bind(Utc::now());

        if let Some(status) = update.status {
            builder.push(", status = ").push_bind(status);
        }
        push_patch(&mut builder, "processed_url", update.processed_url);
        push_patch(&mut builder, "cloudinary_public_id", update.cloudinary_public_id);
        push_patch(&mut builder, "error_message", update.error_message);

        builder.push(" WHERE image_id = ").push_bind(image_id);
        builder.push(" AND user_id = ").push_bind(user_id);
        builder.push(" AND status = ").push_bind(expected);
        builder.push(" RETURNING *");

        let updated = builder
            .build_query_as::<ImageAsset>()
            .fetch_optional(&self.pool)
            .await?;

        Ok(updated)
    }

    async fn begin_processing(&self, image_id: &str, user_id: &str) -> Result<Option<ImageAsset>, AppError> {
        let claimed = sqlx::query_as::<_, ImageAsset>(
            r#"UPDATE images
            SET status = 'PROCESSING', error_message = NULL, updated_at = $3
            WHERE image_id = $1 AND user_id = $2 AND status IN ('UPLOADED', 'FAILED')
            RETURNING *
            "#,
        )
        .bind(image_id)
        .bind(user_id)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await?;

        Ok(claimed)
    }

    async fn soft_delete(&self, image_id: &str, user_id: &str) -> Result<bool, AppError> {
        let result = sqlx::query(
            r#"UPDATE images
            SET status = 'DELETED', processed_url = NULL, error_message = NULL, updated_at = $3
            WHERE image_id = $1 AND user_id = $2 AND status <> 'DELETED'
            "#,
        )
        .bind(image_id)
        .bind(user_id)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
