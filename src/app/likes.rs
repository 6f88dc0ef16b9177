use anyhow::{anyhow, Result};
use sqlx::postgres::PgRow;
use sqlx::Row;
use uuid::Uuid;

use crate::app::dashboard::video_from_row;
use crate::domain::engagement::{Comment, Like, LikeTarget, LikeTargetKind};
use crate::domain::video::Video;
use crate::infra::db::Db;

#[derive(Debug, Clone)]
pub enum ToggleOutcome {
    Added(Like),
    Removed,
}

#[derive(Clone)]
pub struct LikeService {
    db: Db,
}

impl LikeService {
    pub fn new(db: Db) -> Self {
        Self { db }
    }

    pub async fn target_exists(&self, target: LikeTarget) -> Result<bool> {
        let sql = match target.kind() {
            LikeTargetKind::Video => "SELECT EXISTS(SELECT 1 FROM videos WHERE id = $1)",
            LikeTargetKind::Comment => "SELECT EXISTS(SELECT 1 FROM comments WHERE id = $1)",
            LikeTargetKind::Tweet => "SELECT EXISTS(SELECT 1 FROM tweets WHERE id = $1)",
        };
        let exists: bool = sqlx::query_scalar(sql)
            .bind(target.id())
            .fetch_one(self.db.pool())
            .await?;
        Ok(exists)
    }

    /// Removes the user's like on `target` if there is one, otherwise adds it.
    ///
    /// The unique index on (liked_by, target_kind, target_id) keeps a racing
    /// pair of toggles from leaving two likes behind.
    pub async fn toggle(&self, user_id: Uuid, target: LikeTarget) -> Result<ToggleOutcome> {
        let removed = sqlx::query(
            "DELETE FROM likes \
             WHERE liked_by = $1 AND target_kind = $2::like_target AND target_id = $3",
        )
        .bind(user_id)
        .bind(target.kind().as_db())
        .bind(target.id())
        .execute(self.db.pool())
        .await?;

        if removed.rows_affected() > 0 {
            return Ok(ToggleOutcome::Removed);
        }

        let inserted = sqlx::query(
            "INSERT INTO likes (liked_by, target_kind, target_id) \
             VALUES ($1, $2::like_target, $3) \
             ON CONFLICT DO NOTHING \
             RETURNING id, liked_by, target_kind::text AS target_kind, target_id, created_at",
        )
        .bind(user_id)
        .bind(target.kind().as_db())
        .bind(target.id())
        .fetch_optional(self.db.pool())
        .await?;

        let row = match inserted {
            Some(row) => row,
            // Another request inserted the same like in between.
            None => {
                sqlx::query(
                    "SELECT id, liked_by, target_kind::text AS target_kind, target_id, created_at \
                     FROM likes \
                     WHERE liked_by = $1 AND target_kind = $2::like_target AND target_id = $3",
                )
                .bind(user_id)
                .bind(target.kind().as_db())
                .bind(target.id())
                .fetch_one(self.db.pool())
                .await?
            }
        };

        Ok(ToggleOutcome::Added(like_from_row(row)?))
    }

    /// Videos the user liked, newest like first. A like whose video has since
    /// been deleted yields `None`.
    pub async fn liked_videos(&self, user_id: Uuid) -> Result<Vec<Option<Video>>> {
        let rows = sqlx::query(
            "SELECT v.id, v.owner, v.title, v.description, v.video_file, v.thumbnail, \
                    v.duration, v.views, v.is_published, v.created_at, v.updated_at \
             FROM likes l \
             LEFT JOIN videos v ON v.id = l.target_id \
             WHERE l.liked_by = $1 AND l.target_kind = 'video' \
             ORDER BY l.created_at DESC, l.id DESC",
        )
        .bind(user_id)
        .fetch_all(self.db.pool())
        .await?;

        let mut videos = Vec::with_capacity(rows.len());
        for row in rows {
            let id: Option<Uuid> = row.get("id");
            videos.push(id.map(|_| video_from_row(&row)));
        }

        Ok(videos)
    }

    /// Comments the user liked, newest like first. A like whose comment has
    /// since been deleted yields `None`.
    pub async fn liked_comments(&self, user_id: Uuid) -> Result<Vec<Option<Comment>>> {
        let rows = sqlx::query(
            "SELECT c.id, c.content, c.owner, c.video, c.created_at, c.updated_at \
             FROM likes l \
             LEFT JOIN comments c ON c.id = l.target_id \
             WHERE l.liked_by = $1 AND l.target_kind = 'comment' \
             ORDER BY l.created_at DESC, l.id DESC",
        )
        .bind(user_id)
        .fetch_all(self.db.pool())
        .await?;

        let mut comments = Vec::with_capacity(rows.len());
        for row in rows {
            let id: Option<Uuid> = row.get("id");
            comments.push(id.map(|id| Comment {
                id,
                content: row.get("content"),
                owner: row.get("owner"),
                video: row.get("video"),
                created_at: row.get("created_at"),
                updated_at: row.get("updated_at"),
            }));
        }

        Ok(comments)
    }
}

fn like_from_row(row: PgRow) -> Result<Like> {
    let kind: String = row.get("target_kind");
    let kind = LikeTargetKind::from_db(&kind)
        .ok_or_else(|| anyhow!("unknown like target: {}", kind))?;

    Ok(Like {
        id: row.get("id"),
        liked_by: row.get("liked_by"),
        target: LikeTarget::new(kind, row.get("target_id")),
        created_at: row.get("created_at"),
    })
}
