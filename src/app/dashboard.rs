use anyhow::Result;
use sqlx::postgres::PgRow;
use sqlx::Row;
use uuid::Uuid;

use crate::domain::channel::ChannelStats;
use crate::domain::video::Video;
use crate::infra::db::Db;

#[derive(Clone)]
pub struct DashboardService {
    db: Db,
}

impl DashboardService {
    pub fn new(db: Db) -> Self {
        Self { db }
    }

    /// Channel counters from four independent reads. They may observe
    /// different database states under concurrent writes.
    pub async fn channel_stats(&self, user_id: Uuid) -> Result<ChannelStats> {
        let pool = self.db.pool();

        let total_views = sqlx::query_scalar::<_, i64>(
            "SELECT COALESCE(SUM(views), 0)::BIGINT FROM videos WHERE owner = $1",
        )
        .bind(user_id)
        .fetch_one(pool);
        let total_likes =
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM likes WHERE liked_by = $1")
                .bind(user_id)
                .fetch_one(pool);
        let total_videos =
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM videos WHERE owner = $1")
                .bind(user_id)
                .fetch_one(pool);
        let total_subscribers =
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM subscriptions WHERE channel = $1")
                .bind(user_id)
                .fetch_one(pool);

        let (total_video_views, total_likes, total_videos, total_subscribers) =
            futures::try_join!(total_views, total_likes, total_videos, total_subscribers)?;

        Ok(ChannelStats {
            total_video_views,
            total_likes,
            total_subscribers,
            total_videos,
        })
    }

    pub async fn channel_videos(&self, user_id: Uuid) -> Result<Vec<Video>> {
        let rows = sqlx::query(
            "SELECT id, owner, title, description, video_file, thumbnail, \
                    duration, views, is_published, created_at, updated_at \
             FROM videos \
             WHERE owner = $1 \
             ORDER BY created_at DESC, id DESC",
        )
        .bind(user_id)
        .fetch_all(self.db.pool())
        .await?;

        Ok(rows.iter().map(video_from_row).collect())
    }
}

pub(crate) fn video_from_row(row: &PgRow) -> Video {
    Video {
        id: row.get("id"),
        owner: row.get("owner"),
        title: row.get("title"),
        description: row.get("description"),
        video_file: row.get("video_file"),
        thumbnail: row.get("thumbnail"),
        duration: row.get("duration"),
        views: row.get("views"),
        is_published: row.get("is_published"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}
