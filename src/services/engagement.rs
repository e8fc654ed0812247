use color_eyre::Result;

use crate::cache::RecordCache;
use crate::db::{Bookmark, Comment, Db, VideoPost};

// ---------------------------------------------------------------------------
// EngagementRepository trait
// ---------------------------------------------------------------------------

#[cfg_attr(test, mockall::automock)]
pub trait EngagementRepository: Send + Sync {
    fn video_exists(&self, video_id: &str) -> impl std::future::Future<Output = Result<bool>> + Send;

    fn bookmarks_for_user(
        &self,
        user_id: &str,
    ) -> impl std::future::Future<Output = Result<Vec<Bookmark>>> + Send;

    fn create_bookmark(
        &self,
        user_id: &str,
        video_id: &str,
    ) -> impl std::future::Future<Output = Result<Bookmark>> + Send;

    fn delete_bookmark(
        &self,
        bookmark_id: &str,
    ) -> impl std::future::Future<Output = Result<()>> + Send;

    fn bookmarked_videos(
        &self,
        user_id: &str,
    ) -> impl std::future::Future<Output = Result<Vec<VideoPost>>> + Send;

    fn comments_for_video(
        &self,
        video_id: &str,
    ) -> impl std::future::Future<Output = Result<Vec<Comment>>> + Send;

    fn create_comment(
        &self,
        video_id: &str,
        user_id: &str,
        text: &str,
    ) -> impl std::future::Future<Output = Result<Comment>> + Send;

    fn comment_by_id(
        &self,
        comment_id: &str,
    ) -> impl std::future::Future<Output = Result<Option<Comment>>> + Send;

    fn delete_comment(
        &self,
        comment_id: &str,
        user_id: &str,
    ) -> impl std::future::Future<Output = Result<bool>> + Send;
}

impl EngagementRepository for Db {
    async fn video_exists(&self, video_id: &str) -> Result<bool> {
        Ok(self.video_by_id(video_id).await?.is_some())
    }

    fn bookmarks_for_user(
        &self,
        user_id: &str,
    ) -> impl std::future::Future<Output = Result<Vec<Bookmark>>> + Send {
        Db::bookmarks_for_user(self, user_id)
    }

    fn create_bookmark(
        &self,
        user_id: &str,
        video_id: &str,
    ) -> impl std::future::Future<Output = Result<Bookmark>> + Send {
        Db::create_bookmark(self, user_id, video_id)
    }

    fn delete_bookmark(
        &self,
        bookmark_id: &str,
    ) -> impl std::future::Future<Output = Result<()>> + Send {
        Db::delete_bookmark(self, bookmark_id)
    }

    fn bookmarked_videos(
        &self,
        user_id: &str,
    ) -> impl std::future::Future<Output = Result<Vec<VideoPost>>> + Send {
        Db::bookmarked_videos(self, user_id)
    }

    fn comments_for_video(
        &self,
        video_id: &str,
    ) -> impl std::future::Future<Output = Result<Vec<Comment>>> + Send {
        Db::comments_for_video(self, video_id)
    }

    fn create_comment(
        &self,
        video_id: &str,
        user_id: &str,
        text: &str,
    ) -> impl std::future::Future<Output = Result<Comment>> + Send {
        Db::create_comment(self, video_id, user_id, text)
    }

    fn comment_by_id(
        &self,
        comment_id: &str,
    ) -> impl std::future::Future<Output = Result<Option<Comment>>> + Send {
        Db::comment_by_id(self, comment_id)
    }

    fn delete_comment(
        &self,
        comment_id: &str,
        user_id: &str,
    ) -> impl std::future::Future<Output = Result<bool>> + Send {
        Db::delete_comment(self, comment_id, user_id)
    }
}

// ---------------------------------------------------------------------------
// Outcome enums
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub enum BookmarkOutcome {
    Added(Bookmark),
    /// Carries the id of the deleted record.
    Removed(String),
    VideoNotFound,
}

#[derive(Debug)]
pub enum CommentOutcome {
    Created(Comment),
    EmptyText,
    VideoNotFound,
}

#[derive(Debug)]
pub enum DeleteCommentOutcome {
    Deleted(Comment),
    NotFound,
    NotOwner,
}

// ---------------------------------------------------------------------------
// EngagementService
// ---------------------------------------------------------------------------

/// Bookmarks and comments. Callers own the caches; every write lands in the
/// store first and is then mirrored into the cache. A refetch replaces the
/// cache wholesale.
pub struct EngagementService<R: EngagementRepository = Db> {
    repo: R,
}

impl<R: EngagementRepository + Clone> Clone for EngagementService<R> {
    fn clone(&self) -> Self {
        Self {
            repo: self.repo.clone(),
        }
    }
}

impl<R: EngagementRepository> EngagementService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    async fn sync_bookmarks(&self, user_id: &str, cache: &mut RecordCache<Bookmark>) -> Result<()> {
        if !cache.is_synced() {
            cache.replace_all(self.repo.bookmarks_for_user(user_id).await?);
        }
        Ok(())
    }

    pub async fn is_bookmarked(
        &self,
        user_id: &str,
        video_id: &str,
        cache: &mut RecordCache<Bookmark>,
    ) -> Result<bool> {
        self.sync_bookmarks(user_id, cache).await?;
        Ok(cache.find(|b| b.video_id == video_id).is_some())
    }

    /// Bookmarks the video, or removes the existing bookmark.
    pub async fn toggle_bookmark(
        &self,
        user_id: &str,
        video_id: &str,
        cache: &mut RecordCache<Bookmark>,
    ) -> Result<BookmarkOutcome> {
        self.sync_bookmarks(user_id, cache).await?;

        if let Some(existing) = cache.find(|b| b.video_id == video_id).cloned() {
            self.repo.delete_bookmark(&existing.id).await?;
            cache.remove(&existing.id);
            tracing::debug!("bookmark removed: user={user_id}, video={video_id}");
            return Ok(BookmarkOutcome::Removed(existing.id));
        }

        if !self.repo.video_exists(video_id).await? {
            return Ok(BookmarkOutcome::VideoNotFound);
        }

        let bookmark = self.repo.create_bookmark(user_id, video_id).await?;
        cache.upsert(bookmark.clone());
        tracing::debug!("bookmark added: user={user_id}, video={video_id}");
        Ok(BookmarkOutcome::Added(bookmark))
    }

    /// Lists bookmarked posts. Opening the list is a refetch point, so the
    /// bookmark cache is replaced with what the store holds.
    pub async fn bookmarked_videos(
        &self,
        user_id: &str,
        cache: &mut RecordCache<Bookmark>,
    ) -> Result<Vec<VideoPost>> {
        cache.replace_all(self.repo.bookmarks_for_user(user_id).await?);
        self.repo.bookmarked_videos(user_id).await
    }

    /// Comments of a video as cached. The store is read when the cache has
    /// never been filled or when `refresh` is set.
    pub async fn comments(
        &self,
        video_id: &str,
        cache: &mut RecordCache<Comment>,
        refresh: bool,
    ) -> Result<Vec<Comment>> {
        if refresh || !cache.is_synced() {
            cache.replace_all(self.repo.comments_for_video(video_id).await?);
        }
        Ok(cache.records().to_vec())
    }

    pub async fn add_comment(
        &self,
        video_id: &str,
        user_id: &str,
        text: &str,
        cache: &mut RecordCache<Comment>,
    ) -> Result<CommentOutcome> {
        let text = text.trim();
        if text.is_empty() {
            return Ok(CommentOutcome::EmptyText);
        }

        if !self.repo.video_exists(video_id).await? {
            return Ok(CommentOutcome::VideoNotFound);
        }

        let comment = self.repo.create_comment(video_id, user_id, text).await?;
        cache.upsert(comment.clone());
        Ok(CommentOutcome::Created(comment))
    }

    /// Deletes a comment its author owns. The caller drops it from the
    /// cache of `comment.video_id`.
    pub async fn delete_comment(&self, comment_id: &str, user_id: &str) -> Result<DeleteCommentOutcome> {
        let Some(comment) = self.repo.comment_by_id(comment_id).await? else {
            return Ok(DeleteCommentOutcome::NotFound);
        };

        if comment.user_id != user_id {
            return Ok(DeleteCommentOutcome::NotOwner);
        }

        if !self.repo.delete_comment(comment_id, user_id).await? {
            return Ok(DeleteCommentOutcome::NotFound);
        }

        tracing::debug!("comment deleted: id={comment_id}, video={}", comment.video_id);
        Ok(DeleteCommentOutcome::Deleted(comment))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
