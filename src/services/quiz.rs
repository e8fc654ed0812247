use std::sync::Arc;

use color_eyre::Result;
use dashmap::DashMap;
use serde::Serialize;
use ulid::Ulid;

use crate::db::Db;
use crate::quiz::{
    AnswerState, Phase, Question, QuizSession, ResultSink, Score, SessionError, Submission,
};

// ---------------------------------------------------------------------------
// QuizRepository trait
// ---------------------------------------------------------------------------

#[cfg_attr(test, mockall::automock)]
pub trait QuizRepository: Send + Sync {
    fn quiz_for_video(
        &self,
        video_id: &str,
    ) -> impl std::future::Future<Output = Result<Option<String>>> + Send;

    fn questions_for_quiz(
        &self,
        quiz_id: &str,
    ) -> impl std::future::Future<Output = Result<Vec<Question>>> + Send;
}

impl QuizRepository for Db {
    fn quiz_for_video(
        &self,
        video_id: &str,
    ) -> impl std::future::Future<Output = Result<Option<String>>> + Send {
        Db::quiz_for_video(self, video_id)
    }

    fn questions_for_quiz(
        &self,
        quiz_id: &str,
    ) -> impl std::future::Future<Output = Result<Vec<Question>>> + Send {
        Db::questions_for_quiz(self, quiz_id)
    }
}

// ---------------------------------------------------------------------------
// Views and outcomes
// ---------------------------------------------------------------------------

/// What a client sees of a session. Canonical answers never leave the server.
#[derive(Clone, Debug, Serialize)]
pub struct SessionView {
    pub id: String,
    pub video_id: String,
    pub quiz_id: Option<String>,
    pub phase: Phase,
    pub questions: Vec<Question>,
    #[serde(flatten)]
    pub answers: AnswerState,
    pub answered: usize,
    pub total: usize,
    pub complete: bool,
    pub score: Option<Score>,
}

impl SessionView {
    fn new(id: Ulid, session: &QuizSession) -> Self {
        Self {
            id: id.to_string(),
            video_id: session.video_id().to_string(),
            quiz_id: session.quiz_id().map(str::to_string),
            phase: session.phase(),
            questions: session.questions().to_vec(),
            answers: session.answers().clone(),
            answered: session.answers().answered(),
            total: session.questions().len(),
            complete: session.is_complete(),
            score: session.score(),
        }
    }
}

#[derive(Debug)]
pub enum OpenOutcome {
    Started(SessionView),
    /// The video has no quiz, or its quiz has no questions.
    NoQuiz,
    /// The session was cancelled or its owner signed out while questions
    /// were loading; the late result was dropped.
    Discarded,
}

#[derive(Debug)]
pub enum AnswerOutcome {
    Recorded(SessionView),
    Rejected(SessionError),
    NotFound,
}

#[derive(Debug)]
pub enum SubmitOutcome {
    /// Graded. The session is finished and no longer held.
    Submitted {
        submission: Submission,
        view: SessionView,
    },
    Rejected(SessionError),
    NotFound,
}

enum Loaded {
    Started(SessionView),
    Empty,
    Failed(color_eyre::Report),
    Discarded,
}

// ---------------------------------------------------------------------------
// QuizService
// ---------------------------------------------------------------------------

/// Hosts in-memory quiz sessions and bridges them to the store and the result sink.
pub struct QuizService<R: QuizRepository = Db, S: ResultSink = Db> {
    repo: R,
    sink: S,
    sessions: Arc<DashMap<Ulid, QuizSession>>,
}

impl<R: QuizRepository + Clone, S: ResultSink + Clone> Clone for QuizService<R, S> {
    fn clone(&self) -> Self {
        Self {
            repo: self.repo.clone(),
            sink: self.sink.clone(),
            sessions: Arc::clone(&self.sessions),
        }
    }
}

impl<R: QuizRepository, S: ResultSink> QuizService<R, S> {
    pub fn new(repo: R, sink: S) -> Self {
        Self {
            repo,
            sink,
            sessions: Arc::new(DashMap::new()),
        }
    }

    pub fn active_sessions(&self) -> usize {
        self.sessions.len()
    }

    async fn fetch(&self, video_id: &str) -> Result<Option<(String, Vec<Question>)>> {
        let Some(quiz_id) = self.repo.quiz_for_video(video_id).await? else {
            return Ok(None);
        };
        let questions = self.repo.questions_for_quiz(&quiz_id).await?;
        Ok(Some((quiz_id, questions)))
    }

    /// Opens a new attempt at the quiz of `video_id`. A user holds at most one
    /// attempt: any earlier one, finished loading or not, is dropped first.
    pub async fn open(&self, user_id: &str, video_id: &str) -> Result<OpenOutcome> {
        let replaced = self.discard_all(user_id);
        if replaced > 0 {
            tracing::debug!("new attempt for user={user_id} replaces {replaced} earlier one(s)");
        }

        let id = Ulid::new();
        let mut session = QuizSession::new(user_id, video_id);
        session.begin_loading()?;
        self.sessions.insert(id, session);

        let fetched = self.fetch(video_id).await;

        let loaded = match self.sessions.get_mut(&id) {
            None => Loaded::Discarded,
            Some(session) if session.phase() != Phase::Loading => Loaded::Discarded,
            Some(mut session) => match fetched {
                Ok(Some((quiz_id, questions))) => match session.load(&quiz_id, &questions) {
                    Ok(_) => Loaded::Started(SessionView::new(id, &session)),
                    Err(SessionError::EmptyQuiz) => Loaded::Empty,
                    Err(e) => Loaded::Failed(e.into()),
                },
                Ok(None) => {
                    session.fail_loading()?;
                    Loaded::Empty
                }
                Err(e) => {
                    session.fail_loading()?;
                    Loaded::Failed(e)
                }
            },
        };

        match loaded {
            Loaded::Started(view) => {
                tracing::debug!(
                    "quiz session {id} started for user={user_id} video={video_id} with {} questions",
                    view.total
                );
                Ok(OpenOutcome::Started(view))
            }
            Loaded::Empty => {
                self.sessions.remove(&id);
                Ok(OpenOutcome::NoQuiz)
            }
            Loaded::Failed(e) => {
                self.sessions.remove(&id);
                tracing::warn!("could not load quiz for video={video_id}: {e}");
                Err(e)
            }
            Loaded::Discarded => {
                tracing::debug!("quiz session {id} was discarded while loading");
                Ok(OpenOutcome::Discarded)
            }
        }
    }

    pub fn view(&self, user_id: &str, session_id: Ulid) -> Option<SessionView> {
        self.sessions
            .get(&session_id)
            .filter(|s| s.owner() == user_id)
            .map(|s| SessionView::new(session_id, &s))
    }

    pub fn answer(
        &self,
        user_id: &str,
        session_id: Ulid,
        index: usize,
        option: &str,
    ) -> AnswerOutcome {
        let Some(mut session) = self.sessions.get_mut(&session_id) else {
            return AnswerOutcome::NotFound;
        };
        if session.owner() != user_id {
            return AnswerOutcome::NotFound;
        }

        match session.record_answer(index, option) {
            Ok(()) => AnswerOutcome::Recorded(SessionView::new(session_id, &session)),
            Err(e) => AnswerOutcome::Rejected(e),
        }
    }

    /// Grades the attempt and hands the result to the sink. The session leaves
    /// the registry before the sink is called.
    pub async fn submit(&self, user_id: &str, session_id: Ulid) -> SubmitOutcome {
        let taken = self.sessions.remove_if(&session_id, |_, s| {
            s.owner() == user_id && s.check_submittable().is_ok()
        });

        let Some((_, mut session)) = taken else {
            return match self.sessions.get(&session_id) {
                Some(s) if s.owner() == user_id => match s.check_submittable() {
                    Err(e) => SubmitOutcome::Rejected(e),
                    Ok(()) => SubmitOutcome::NotFound,
                },
                _ => SubmitOutcome::NotFound,
            };
        };

        match session.submit(&self.sink).await {
            Ok(submission) => SubmitOutcome::Submitted {
                submission,
                view: SessionView::new(session_id, &session),
            },
            Err(e) => SubmitOutcome::Rejected(e),
        }
    }

    /// Cancels a loading or in-progress attempt. Nothing is persisted.
    pub fn cancel(&self, user_id: &str, session_id: Ulid) -> bool {
        let Some((_, mut session)) = self
            .sessions
            .remove_if(&session_id, |_, s| s.owner() == user_id)
        else {
            return false;
        };

        if let Err(e) = session.cancel() {
            tracing::debug!("quiz session {session_id} dropped without cancel: {e}");
        }
        true
    }

    /// Drops every session owned by `user_id`, including ones still loading.
    pub fn discard_all(&self, user_id: &str) -> usize {
        let before = self.sessions.len();
        self.sessions.retain(|_, s| s.owner() != user_id);
        let dropped = before.saturating_sub(self.sessions.len());
        if dropped > 0 {
            tracing::debug!("discarded {dropped} quiz session(s) for user={user_id}");
        }
        dropped
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
