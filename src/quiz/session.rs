use std::fmt;

use chrono::{DateTime, Utc};
use color_eyre::Result;
use rand::Rng;
use serde::Serialize;

use super::{sampler, AnswerState, DecodeError, Question, Score};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Idle,
    Loading,
    InProgress,
    Submitted,
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    InvalidTransition { from: Phase, action: &'static str },
    EmptyQuiz,
    IndexOutOfRange { index: usize, count: usize },
    InvalidOption { index: usize, option: String },
    Incomplete { answered: usize, total: usize },
    Decode(DecodeError),
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidTransition { from, action } => {
                write!(f, "cannot {action} a quiz session that is {from:?}")
            }
            Self::EmptyQuiz => fmt::Display::fmt(&sampler::EmptyQuiz, f),
            Self::IndexOutOfRange { index, count } => {
                write!(f, "question {index} does not exist; this quiz has {count} questions")
            }
            Self::InvalidOption { index, option } => {
                write!(f, "'{option}' is not a choice for question {index}")
            }
            Self::Incomplete { answered, total } => {
                write!(f, "please answer all questions ({answered} of {total} answered)")
            }
            Self::Decode(e) => write!(f, "question could not be graded: {e}"),
        }
    }
}

impl std::error::Error for SessionError {}

impl From<DecodeError> for SessionError {
    fn from(e: DecodeError) -> Self {
        Self::Decode(e)
    }
}

/// The record handed to the result sink once a session is graded.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QuizResultDraft {
    pub user_id: String,
    pub video_id: String,
    pub quiz_id: String,
    pub score: usize,
    pub total_questions: usize,
    pub timestamp: DateTime<Utc>,
}

#[cfg_attr(test, mockall::automock)]
pub trait ResultSink: Send + Sync {
    fn save_result(
        &self,
        result: &QuizResultDraft,
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Submission {
    pub score: Score,
    pub persisted: bool,
    /// Set when the score could not be saved.
    pub warning: Option<String>,
}

/// One attempt at a video's quiz, from opening the quiz until submit or cancel.
#[derive(Clone, Debug)]
pub struct QuizSession {
    owner: String,
    video_id: String,
    quiz_id: Option<String>,
    phase: Phase,
    questions: Vec<Question>,
    answers: AnswerState,
    score: Option<Score>,
}

impl QuizSession {
    pub fn new(owner: impl Into<String>, video_id: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            video_id: video_id.into(),
            quiz_id: None,
            phase: Phase::Idle,
            questions: Vec::new(),
            answers: AnswerState::default(),
            score: None,
        }
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn video_id(&self) -> &str {
        &self.video_id
    }

    pub fn quiz_id(&self) -> Option<&str> {
        self.quiz_id.as_deref()
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    pub fn answers(&self) -> &AnswerState {
        &self.answers
    }

    pub fn score(&self) -> Option<Score> {
        self.score
    }

    pub fn is_complete(&self) -> bool {
        !self.questions.is_empty() && self.answers.is_complete()
    }

    fn expect_phase(&self, expected: Phase, action: &'static str) -> Result<(), SessionError> {
        if self.phase == expected {
            Ok(())
        } else {
            Err(SessionError::InvalidTransition {
                from: self.phase,
                action,
            })
        }
    }

    pub fn begin_loading(&mut self) -> Result<(), SessionError> {
        self.expect_phase(Phase::Idle, "load")?;
        self.phase = Phase::Loading;
        Ok(())
    }

    /// Samples the fetched questions and starts the attempt. Returns the number of questions asked.
    pub fn load(&mut self, quiz_id: &str, available: &[Question]) -> Result<usize, SessionError> {
        self.load_with(quiz_id, available, &mut rand::thread_rng())
    }

    pub fn load_with<R: Rng + ?Sized>(
        &mut self,
        quiz_id: &str,
        available: &[Question],
        rng: &mut R,
    ) -> Result<usize, SessionError> {
        self.expect_phase(Phase::Loading, "start")?;

        let questions = match sampler::sample_with(available, sampler::MAX_SESSION_QUESTIONS, rng)
        {
            Ok(questions) => questions,
            Err(sampler::EmptyQuiz) => {
                self.phase = Phase::Idle;
                return Err(SessionError::EmptyQuiz);
            }
        };

        self.quiz_id = Some(quiz_id.to_string());
        self.answers = AnswerState::new(questions.len());
        self.questions = questions;
        self.phase = Phase::InProgress;
        Ok(self.questions.len())
    }

    /// The question fetch failed; the session returns to idle.
    pub fn fail_loading(&mut self) -> Result<(), SessionError> {
        self.expect_phase(Phase::Loading, "fail")?;
        self.phase = Phase::Idle;
        Ok(())
    }

    pub fn record_answer(
        &mut self,
        index: usize,
        option: impl Into<String>,
    ) -> Result<(), SessionError> {
        self.expect_phase(Phase::InProgress, "answer")?;

        let question = self
            .questions
            .get(index)
            .ok_or(SessionError::IndexOutOfRange {
                index,
                count: self.questions.len(),
            })?;

        let option = option.into();
        if !question.accepts(&option) {
            return Err(SessionError::InvalidOption { index, option });
        }

        self.answers.record(index, option);
        Ok(())
    }

    /// Discards every piece of session state. Nothing is persisted.
    pub fn cancel(&mut self) -> Result<(), SessionError> {
        if !matches!(self.phase, Phase::Loading | Phase::InProgress) {
            return Err(SessionError::InvalidTransition {
                from: self.phase,
                action: "cancel",
            });
        }

        self.phase = Phase::Cancelled;
        self.quiz_id = None;
        self.questions.clear();
        self.answers.clear();
        Ok(())
    }

    /// Whether `grade` would accept this attempt right now.
    pub fn check_submittable(&self) -> Result<(), SessionError> {
        self.expect_phase(Phase::InProgress, "submit")?;

        if !self.is_complete() {
            return Err(SessionError::Incomplete {
                answered: self.answers.answered(),
                total: self.questions.len(),
            });
        }
        Ok(())
    }

    /// Scores a complete attempt and moves it to `Submitted`.
    pub fn grade(&mut self) -> Result<QuizResultDraft, SessionError> {
        self.check_submittable()?;

        let score = super::score(&self.questions, &self.answers)?;
        self.score = Some(score);
        self.phase = Phase::Submitted;

        Ok(QuizResultDraft {
            user_id: self.owner.clone(),
            video_id: self.video_id.clone(),
            quiz_id: self.quiz_id.clone().unwrap_or_default(),
            score: score.correct,
            total_questions: score.total,
            timestamp: Utc::now(),
        })
    }

    /// Grades the attempt and hands the result to `sink`. A sink failure is
    /// reported as a warning; the score and the submitted phase are kept.
    pub async fn submit<S: ResultSink>(&mut self, sink: &S) -> Result<Submission, SessionError> {
        let draft = self.grade()?;
        let score = Score {
            correct: draft.score,
            total: draft.total_questions,
        };

        match sink.save_result(&draft).await {
            Ok(()) => {
                tracing::info!(
                    "quiz result saved for user={} video={}: {}/{}",
                    draft.user_id,
                    draft.video_id,
                    draft.score,
                    draft.total_questions
                );
                Ok(Submission {
                    score,
                    persisted: true,
                    warning: None,
                })
            }
            Err(e) => {
                tracing::warn!(
                    "could not save quiz result for user={} video={}: {e}",
                    draft.user_id,
                    draft.video_id
                );
                Ok(Submission {
                    score,
                    persisted: false,
                    warning: Some(format!("your score could not be saved: {e}")),
                })
            }
        }
    }
}
