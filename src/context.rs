//! Per-login application context: who is signed in, which video is playing,
//! and the local record caches. A context is created when a session token is
//! first resolved and removed on sign-out.

use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
};

use dashmap::{mapref::entry::Entry, DashMap};

use crate::cache::RecordCache;
use crate::db::{AuthUser, Bookmark, Comment};

#[derive(Clone, Debug)]
pub struct UserContext {
    pub user: AuthUser,
    pub playing: Option<String>,
    pub bookmarks: RecordCache<Bookmark>,
    /// Comment caches keyed by video id.
    pub comments: HashMap<String, RecordCache<Comment>>,
}

impl UserContext {
    fn new(user: AuthUser) -> Self {
        Self {
            user,
            playing: None,
            bookmarks: RecordCache::new(),
            comments: HashMap::new(),
        }
    }
}

/// Registry of live contexts keyed by session token.
///
/// Every accessor finishes with the map entry before returning, so no guard
/// outlives a call. Writes against a token that was torn down meanwhile are
/// dropped.
///
/// Tearing down a user stamps it with a new epoch. A context restored from a
/// store read that started before that stamp is refused.
#[derive(Clone, Default)]
pub struct Contexts {
    inner: Arc<DashMap<String, UserContext>>,
    revoked: Arc<DashMap<String, u64>>,
    clock: Arc<AtomicU64>,
}

impl Contexts {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a fresh context for `token`, replacing any previous one.
    pub fn init(&self, token: &str, user: AuthUser) {
        tracing::debug!("context initialised for user={}", user.id);
        self.inner.insert(token.to_string(), UserContext::new(user));
    }

    /// Current teardown epoch. Read it before looking a token up in the store.
    pub fn epoch(&self) -> u64 {
        self.clock.load(Ordering::SeqCst)
    }

    /// Starts a context for a token the store vouched for at epoch `seen`.
    /// Returns `false`, leaving nothing behind, when the user was torn down
    /// after `seen`.
    pub fn init_restored(&self, token: &str, user: AuthUser, seen: u64) -> bool {
        // the entry lock orders this against `teardown_user`
        match self.revoked.entry(user.id.clone()) {
            Entry::Occupied(stamp) if *stamp.get() > seen => {
                tracing::debug!("refused stale session for user={}", user.id);
                false
            }
            _ => {
                self.init(token, user);
                true
            }
        }
    }

    pub fn user(&self, token: &str) -> Option<AuthUser> {
        self.inner.get(token).map(|ctx| ctx.user.clone())
    }

    pub fn contains(&self, token: &str) -> bool {
        self.inner.contains_key(token)
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Drops every context that belongs to `user_id` and refuses restores
    /// that began before this call. Returns how many contexts went away.
    pub fn teardown_user(&self, user_id: &str) -> usize {
        let epoch = self.clock.fetch_add(1, Ordering::SeqCst) + 1;
        self.revoked.insert(user_id.to_string(), epoch);

        let before = self.inner.len();
        self.inner.retain(|_, ctx| ctx.user.id != user_id);
        let dropped = before.saturating_sub(self.inner.len());
        tracing::debug!("{dropped} context(s) torn down for user={user_id}");
        dropped
    }

    pub fn playing(&self, token: &str) -> Option<String> {
        self.inner.get(token).and_then(|ctx| ctx.playing.clone())
    }

    /// Plays `video_id`, or stops it when it is already playing. Returns the
    /// video now playing, or `None` for an unknown token.
    pub fn toggle_playing(&self, token: &str, video_id: &str) -> Option<Option<String>> {
        let mut ctx = self.inner.get_mut(token)?;
        if ctx.playing.as_deref() == Some(video_id) {
            ctx.playing = None;
        } else {
            ctx.playing = Some(video_id.to_string());
        }
        Some(ctx.playing.clone())
    }

    pub fn stop_playing(&self, token: &str) {
        if let Some(mut ctx) = self.inner.get_mut(token) {
            ctx.playing = None;
        }
    }

    pub fn bookmarks(&self, token: &str) -> RecordCache<Bookmark> {
        self.inner
            .get(token)
            .map(|ctx| ctx.bookmarks.clone())
            .unwrap_or_default()
    }

    pub fn store_bookmarks(&self, token: &str, cache: RecordCache<Bookmark>) {
        if let Some(mut ctx) = self.inner.get_mut(token) {
            ctx.bookmarks = cache;
        }
    }

    pub fn comments(&self, token: &str, video_id: &str) -> RecordCache<Comment> {
        self.inner
            .get(token)
            .and_then(|ctx| ctx.comments.get(video_id).cloned())
            .unwrap_or_default()
    }

    pub fn store_comments(&self, token: &str, video_id: &str, cache: RecordCache<Comment>) {
        if let Some(mut ctx) = self.inner.get_mut(token) {
            ctx.comments.insert(video_id.to_string(), cache);
        }
    }

    /// Drops a deleted comment from the cache of its video, if that cache exists.
    pub fn forget_comment(&self, token: &str, video_id: &str, comment_id: &str) {
        if let Some(mut ctx) = self.inner.get_mut(token) {
            if let Some(cache) = ctx.comments.get_mut(video_id) {
                cache.remove(comment_id);
            }
        }
    }
}
