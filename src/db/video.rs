use color_eyre::Result;
use libsql::params;
use ulid::Ulid;

use super::helpers::{query_all, query_optional};
use super::models::{NewVideo, VideoPost};
use super::{now, Db};

/// Select list shared by every post query; `v` is videos, `u` the creator.
pub(super) const VIDEO_COLUMNS: &str = r#"
    v.id, v.title, v.prompt, v.video_url, v.thumbnail_url, v.transcript,
    v.created_at, u.id, u.username, u.avatar
"#;

impl Db {
    pub async fn create_video(&self, video: &NewVideo) -> Result<String> {
        let video_id = Ulid::new().to_string();
        let conn = self.connect()?;

        conn.execute(
            r#"INSERT INTO videos (id, title, prompt, video_url, thumbnail_url, transcript, creator_id, created_at)
               VALUES (?, ?, ?, ?, ?, ?, ?, ?)"#,
            params![
                video_id.as_str(),
                video.title.as_str(),
                video.prompt.as_str(),
                video.video_url.as_str(),
                video.thumbnail_url.as_str(),
                video.transcript.as_str(),
                video.creator_id.as_str(),
                now()
            ],
        )
        .await?;

        tracing::info!(
            "video post created: id={video_id}, creator={}",
            video.creator_id
        );
        Ok(video_id)
    }

    /// All posts, newest first.
    pub async fn all_videos(&self) -> Result<Vec<VideoPost>> {
        let conn = self.connect()?;
        query_all(
            &conn,
            &format!(
                r#"SELECT {VIDEO_COLUMNS}
                   FROM videos v JOIN users u ON u.id = v.creator_id
                   ORDER BY v.created_at DESC, v.id DESC"#
            ),
            (),
            VideoPost::from_row,
        )
        .await
    }

    pub async fn latest_videos(&self, limit: i64) -> Result<Vec<VideoPost>> {
        let conn = self.connect()?;
        query_all(
            &conn,
            &format!(
                r#"SELECT {VIDEO_COLUMNS}
                   FROM videos v JOIN users u ON u.id = v.creator_id
                   ORDER BY v.created_at DESC, v.id DESC
                   LIMIT ?"#
            ),
            params![limit],
            VideoPost::from_row,
        )
        .await
    }

    /// Case-insensitive title search.
    pub async fn search_videos(&self, query: &str) -> Result<Vec<VideoPost>> {
        let pattern = format!("%{}%", escape_like(query));
        let conn = self.connect()?;
        query_all(
            &conn,
            &format!(
                r#"SELECT {VIDEO_COLUMNS}
                   FROM videos v JOIN users u ON u.id = v.creator_id
                   WHERE v.title LIKE ? ESCAPE '\'
                   ORDER BY v.created_at DESC, v.id DESC"#
            ),
            params![pattern],
            VideoPost::from_row,
        )
        .await
    }

    pub async fn video_by_id(&self, video_id: &str) -> Result<Option<VideoPost>> {
        let conn = self.connect()?;
        query_optional(
            &conn,
            &format!(
                r#"SELECT {VIDEO_COLUMNS}
                   FROM videos v JOIN users u ON u.id = v.creator_id
                   WHERE v.id = ?"#
            ),
            params![video_id],
            VideoPost::from_row,
        )
        .await
    }

    pub async fn videos_by_creator(&self, creator_id: &str) -> Result<Vec<VideoPost>> {
        let conn = self.connect()?;
        query_all(
            &conn,
            &format!(
                r#"SELECT {VIDEO_COLUMNS}
                   FROM videos v JOIN users u ON u.id = v.creator_id
                   WHERE v.creator_id = ?
                   ORDER BY v.created_at DESC, v.id DESC"#
            ),
            params![creator_id],
            VideoPost::from_row,
        )
        .await
    }
}

fn escape_like(query: &str) -> String {
    let mut escaped = String::with_capacity(query.len());
    for c in query.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::escape_like;

    #[test]
    fn like_wildcards_are_escaped() {
        assert_eq!(escape_like("50%_off"), r"50\%\_off");
        assert_eq!(escape_like("plain"), "plain");
    }
}
