// Database module - the document store behind users, posts, comments,
// bookmarks, quizzes and results

use std::sync::Arc;
use color_eyre::{eyre::OptionExt, Result};

pub mod models;
pub use models::*;

mod helpers;
mod schema;
mod bookmark;
mod comment;
mod quiz;
mod user;
mod video;

// Main database handle
#[derive(Clone)]
pub struct Db {
    db: Arc<libsql::Database>,
}

impl Db {
    pub async fn new(url: String, auth_token: String) -> Result<Self> {
        let db = if url.starts_with("file:") {
            // Local SQLite file
            let path = url.strip_prefix("file:").unwrap_or(&url);
            libsql::Builder::new_local(path).build().await?
        } else {
            // Remote Turso database
            libsql::Builder::new_remote(url.to_owned(), auth_token)
                .build()
                .await?
        };

        let conn = db.connect()?;

        // Verify connection
        let one = conn
            .query("SELECT 1", ())
            .await?
            .next()
            .await?
            .ok_or_eyre("connection check failed")?
            .get::<i64>(0)?;
        color_eyre::eyre::ensure!(one == 1, "connection check returned {one}");

        schema::create_schema(&conn).await?;

        tracing::info!("database connection has been verified");

        Ok(Self { db: Arc::new(db) })
    }

    fn connect(&self) -> Result<libsql::Connection> {
        Ok(self.db.connect()?)
    }
}

/// Current time in the fixed-width form every `created_at` column uses.
pub(crate) fn now() -> String {
    timestamp(chrono::Utc::now())
}

pub(crate) fn timestamp(at: chrono::DateTime<chrono::Utc>) -> String {
    at.to_rfc3339_opts(chrono::SecondsFormat::Micros, true)
}
