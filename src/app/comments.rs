use anyhow::Result;
use sqlx::postgres::PgRow;
use sqlx::Row;
use uuid::Uuid;

use crate::domain::engagement::{Comment, CommentView};
use crate::domain::page::{Page, Pagination};
use crate::infra::db::Db;

#[derive(Clone)]
pub struct CommentService {
    db: Db,
}

impl CommentService {
    pub fn new(db: Db) -> Self {
        Self { db }
    }

    /// One page of a video's comments, newest first, with author name, like
    /// count and the viewer's own like flag. `None` when the video does not
    /// exist.
    pub async fn list_for_video(
        &self,
        video_id: Uuid,
        viewer_id: Option<Uuid>,
        pagination: Pagination,
    ) -> Result<Option<Page<CommentView>>> {
        let video_exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM videos WHERE id = $1)")
                .bind(video_id)
                .fetch_one(self.db.pool())
                .await?;
        if !video_exists {
            return Ok(None);
        }

        // liked_by = NULL never matches, so anonymous viewers get false.
        let rows = sqlx::query(
            "SELECT c.id, u.username, c.content, c.created_at, \
                    COUNT(l.id) AS likes, \
                    COALESCE(BOOL_OR(l.liked_by = $2), false) AS is_liked \
             FROM comments c \
             LEFT JOIN likes l ON l.target_kind = 'comment' AND l.target_id = c.id \
             LEFT JOIN users u ON u.id = c.owner \
             WHERE c.video = $1 \
             GROUP BY c.id, u.username \
             ORDER BY c.created_at DESC, c.id DESC \
             LIMIT $3 OFFSET $4",
        )
        .bind(video_id)
        .bind(viewer_id)
        .bind(pagination.limit)
        .bind(pagination.offset())
        .fetch_all(self.db.pool())
        .await?;

        let total_docs: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM comments WHERE video = $1")
            .bind(video_id)
            .fetch_one(self.db.pool())
            .await?;

        let mut docs = Vec::with_capacity(rows.len());
        for row in rows {
            docs.push(CommentView {
                id: row.get("id"),
                username: row.get("username"),
                content: row.get("content"),
                likes: row.get("likes"),
                is_liked: row.get("is_liked"),
                created_at: row.get("created_at"),
            });
        }

        Ok(Some(Page::new(docs, total_docs, pagination)))
    }

    /// Inserts a comment on an existing video. `None` when the video does not
    /// exist.
    pub async fn create(
        &self,
        owner_id: Uuid,
        video_id: Uuid,
        content: String,
    ) -> Result<Option<Comment>> {
        let row = sqlx::query(
            "INSERT INTO comments (content, owner, video) \
             SELECT $1, $2, v.id FROM videos v WHERE v.id = $3 \
             RETURNING id, content, owner, video, created_at, updated_at",
        )
        .bind(content)
        .bind(owner_id)
        .bind(video_id)
        .fetch_optional(self.db.pool())
        .await?;

        Ok(row.map(comment_from_row))
    }

    pub async fn find(&self, comment_id: Uuid) -> Result<Option<Comment>> {
        let row = sqlx::query(
            "SELECT id, content, owner, video, created_at, updated_at \
             FROM comments WHERE id = $1",
        )
        .bind(comment_id)
        .fetch_optional(self.db.pool())
        .await?;

        Ok(row.map(comment_from_row))
    }

    pub async fn update_content(&self, comment_id: Uuid, content: String) -> Result<Option<Comment>> {
        let row = sqlx::query(
            "UPDATE comments \
             SET content = $2, updated_at = now() \
             WHERE id = $1 \
             RETURNING id, content, owner, video, created_at, updated_at",
        )
        .bind(comment_id)
        .bind(content)
        .fetch_optional(self.db.pool())
        .await?;

        Ok(row.map(comment_from_row))
    }

    pub async fn delete(&self, comment_id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM comments WHERE id = $1")
            .bind(comment_id)
            .execute(self.db.pool())
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

fn comment_from_row(row: PgRow) -> Comment {
    Comment {
        id: row.get("id"),
        content: row.get("content"),
        owner: row.get("owner"),
        video: row.get("video"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}
