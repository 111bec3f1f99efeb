use anyhow::{Result, anyhow};
use async_trait::async_trait;
use time::OffsetDateTime;
use uuid::Uuid;

use super::model::{NewVideo, VideoRecord};
use crate::infrastructure::db::pool::DbPool;

/// Video metadata store.
///
/// The `set_*` writers touch one column plus `updated_at` in a single
/// statement and hand back the row as it is afterwards, so concurrent
/// writers of other columns are never overwritten.
#[async_trait]
pub trait VideoRepository: Send + Sync {
    async fn create(&self, video: NewVideo) -> Result<VideoRecord>;
    async fn get(&self, id: Uuid) -> Result<Option<VideoRecord>>;
    async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<VideoRecord>>;
    async fn set_video_url(&self, id: Uuid, url: &str, updated_at: OffsetDateTime) -> Result<VideoRecord>;
    async fn set_thumbnail_url(&self, id: Uuid, url: &str, updated_at: OffsetDateTime) -> Result<VideoRecord>;
}

#[derive(Clone)]
pub struct PgVideoRepository {
    pool: DbPool,
}

impl PgVideoRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl VideoRepository for PgVideoRepository {
    async fn create(&self, video: NewVideo) -> Result<VideoRecord> {
        let record = sqlx::query_as::<_, VideoRecord>(
            r#"
            INSERT INTO videos (user_id, title, description)
            VALUES ($1, $2, $3)
            RETURNING id, user_id, title, description, thumbnail_url, video_url, created_at, updated_at
            "#,
        )
        .bind(video.user_id)
        .bind(&video.title)
        .bind(&video.description)
        .fetch_one(&self.pool)
        .await?;

        Ok(record)
    }

    async fn get(&self, id: Uuid) -> Result<Option<VideoRecord>> {
        let record = sqlx::query_as::<_, VideoRecord>(
            r#"
            SELECT id, user_id, title, description, thumbnail_url, video_url, created_at, updated_at
            FROM videos
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }

    async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<VideoRecord>> {
        let records = sqlx::query_as::<_, VideoRecord>(
            r#"
            SELECT id, user_id, title, description, thumbnail_url, video_url, created_at, updated_at
            FROM videos
            WHERE user_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(records)
    }

    async fn set_video_url(&self, id: Uuid, url: &str, updated_at: OffsetDateTime) -> Result<VideoRecord> {
        sqlx::query_as::<_, VideoRecord>(
            r#"
            UPDATE videos
            SET video_url = $1, updated_at = $2
            WHERE id = $3
            RETURNING id, user_id, title, description, thumbnail_url, video_url, created_at, updated_at
            "#,
        )
        .bind(url)
        .bind(updated_at)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| anyhow!("Video {} no longer exists", id))
    }

    async fn set_thumbnail_url(&self, id: Uuid, url: &str, updated_at: OffsetDateTime) -> Result<VideoRecord> {
        sqlx::query_as::<_, VideoRecord>(
            r#"
            UPDATE videos
            SET thumbnail_url = $1, updated_at = $2
            WHERE id = $3
            RETURNING id, user_id, title, description, thumbnail_url, video_url, created_at, updated_at
            "#,
        )
        .bind(url)
        .bind(updated_at)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| anyhow!("Video {} no longer exists", id))
    }
}
