use color_eyre::{eyre::OptionExt, Result};
use libsql::params;
use ulid::Ulid;

use super::helpers::{query_all, query_optional};
use super::models::{Bookmark, VideoPost};
use super::video::VIDEO_COLUMNS;
use super::{now, Db};

impl Db {
    pub async fn bookmarks_for_user(&self, user_id: &str) -> Result<Vec<Bookmark>> {
        let conn = self.connect()?;
        query_all(
            &conn,
            r#"SELECT id, user_id, video_id, created_at
               FROM bookmarks WHERE user_id = ?
               ORDER BY created_at DESC, id DESC"#,
            params![user_id],
            Bookmark::from_row,
        )
        .await
    }

    pub async fn bookmark_for(&self, user_id: &str, video_id: &str) -> Result<Option<Bookmark>> {
        let conn = self.connect()?;
        query_optional(
            &conn,
            "SELECT id, user_id, video_id, created_at FROM bookmarks WHERE user_id = ? AND video_id = ?",
            params![user_id, video_id],
            Bookmark::from_row,
        )
        .await
    }

    /// Creates the bookmark, or returns the one that already exists for the pair.
    pub async fn create_bookmark(&self, user_id: &str, video_id: &str) -> Result<Bookmark> {
        let conn = self.connect()?;

        let inserted = conn
            .execute(
                r#"INSERT INTO bookmarks (id, user_id, video_id, created_at) VALUES (?, ?, ?, ?)
                   ON CONFLICT(user_id, video_id) DO NOTHING"#,
                params![Ulid::new().to_string(), user_id, video_id, now()],
            )
            .await?;

        if inserted > 0 {
            tracing::debug!("bookmark created: user={user_id}, video={video_id}");
        }

        self.bookmark_for(user_id, video_id)
            .await?
            .ok_or_eyre("bookmark missing after insert")
    }

    pub async fn delete_bookmark(&self, bookmark_id: &str) -> Result<()> {
        let conn = self.connect()?;
        conn.execute("DELETE FROM bookmarks WHERE id = ?", params![bookmark_id])
            .await?;
        tracing::debug!("bookmark deleted: id={bookmark_id}");
        Ok(())
    }

    pub async fn bookmarked_videos(&self, user_id: &str) -> Result<Vec<VideoPost>> {
        let conn = self.connect()?;
        query_all(
            &conn,
            &format!(
                r#"SELECT {VIDEO_COLUMNS}
                   FROM bookmarks b
                   JOIN videos v ON v.id = b.video_id
                   JOIN users u ON u.id = v.creator_id
                   WHERE b.user_id = ?
                   ORDER BY b.created_at DESC, b.id DESC"#
            ),
            params![user_id],
            VideoPost::from_row,
        )
        .await
    }
}
