use color_eyre::Result;
use libsql::params;
use ulid::Ulid;

use super::helpers::{query_all, query_optional};
use super::models::Comment;
use super::{now, Db};

impl Db {
    pub async fn comments_for_video(&self, video_id: &str) -> Result<Vec<Comment>> {
        let conn = self.connect()?;
        query_all(
            &conn,
            r#"SELECT c.id, c.video_id, c.user_id, u.username, c.text, c.created_at
               FROM comments c JOIN users u ON u.id = c.user_id
               WHERE c.video_id = ?
               ORDER BY c.created_at ASC, c.id ASC"#,
            params![video_id],
            Comment::from_row,
        )
        .await
    }

    pub async fn create_comment(&self, video_id: &str, user_id: &str, text: &str) -> Result<Comment> {
        let comment_id = Ulid::new().to_string();
        let conn = self.connect()?;

        conn.execute(
            "INSERT INTO comments (id, video_id, user_id, text, created_at) VALUES (?, ?, ?, ?, ?)",
            params![comment_id.as_str(), video_id, user_id, text, now()],
        )
        .await?;

        let comment = self
            .comment_by_id(&comment_id)
            .await?
            .ok_or_else(|| color_eyre::eyre::eyre!("comment {comment_id} vanished after insert"))?;

        tracing::debug!("comment created: id={comment_id}, video={video_id}");
        Ok(comment)
    }

    pub async fn comment_by_id(&self, comment_id: &str) -> Result<Option<Comment>> {
        let conn = self.connect()?;
        query_optional(
            &conn,
            r#"SELECT c.id, c.video_id, c.user_id, u.username, c.text, c.created_at
               FROM comments c JOIN users u ON u.id = c.user_id
               WHERE c.id = ?"#,
            params![comment_id],
            Comment::from_row,
        )
        .await
    }

    /// Deletes the comment only if `user_id` wrote it. Returns whether a row went away.
    pub async fn delete_comment(&self, comment_id: &str, user_id: &str) -> Result<bool> {
        let conn = self.connect()?;
        let removed = conn
            .execute(
                "DELETE FROM comments WHERE id = ? AND user_id = ?",
                params![comment_id, user_id],
            )
            .await?;
        Ok(removed > 0)
    }
}
