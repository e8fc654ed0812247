// Database model structs and their row decoders

use std::{fmt, str::FromStr};

use color_eyre::{eyre::eyre, Result};
use serde::{Deserialize, Serialize};

use crate::cache::Record;
use crate::quiz::{EncodedAnswer, QuestionKind};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Student,
    Educator,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Student => "student",
            Self::Educator => "educator",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = color_eyre::Report;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "student" => Ok(Self::Student),
            "educator" => Ok(Self::Educator),
            other => Err(eyre!("unknown role '{other}'")),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct AuthUser {
    pub id: String,
    pub email: String,
    pub username: String,
    pub role: Role,
    pub avatar: String,
}

impl AuthUser {
    /// Columns: id, email, username, role, avatar
    pub(crate) fn from_row(row: &libsql::Row) -> Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            email: row.get(1)?,
            username: row.get(2)?,
            role: row.get::<String>(3)?.parse()?,
            avatar: row.get(4)?,
        })
    }

    pub fn is_educator(&self) -> bool {
        self.role == Role::Educator
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Creator {
    pub id: String,
    pub username: String,
    pub avatar: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct VideoPost {
    pub id: String,
    pub title: String,
    pub prompt: String,
    pub video_url: String,
    pub thumbnail_url: String,
    pub transcript: String,
    pub creator: Creator,
    pub created_at: String,
}

impl VideoPost {
    /// Columns: id, title, prompt, video_url, thumbnail_url, transcript,
    /// created_at, creator id, creator username, creator avatar
    pub(crate) fn from_row(row: &libsql::Row) -> Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            title: row.get(1)?,
            prompt: row.get(2)?,
            video_url: row.get(3)?,
            thumbnail_url: row.get(4)?,
            transcript: row.get(5)?,
            created_at: row.get(6)?,
            creator: Creator {
                id: row.get(7)?,
                username: row.get(8)?,
                avatar: row.get(9)?,
            },
        })
    }
}

impl Record for VideoPost {
    fn record_id(&self) -> &str {
        &self.id
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewVideo {
    pub title: String,
    pub prompt: String,
    pub video_url: String,
    pub thumbnail_url: String,
    pub transcript: String,
    pub creator_id: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Comment {
    pub id: String,
    pub video_id: String,
    pub user_id: String,
    pub username: String,
    pub text: String,
    pub created_at: String,
}

impl Comment {
    /// Columns: id, video_id, user_id, username, text, created_at
    pub(crate) fn from_row(row: &libsql::Row) -> Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            video_id: row.get(1)?,
            user_id: row.get(2)?,
            username: row.get(3)?,
            text: row.get(4)?,
            created_at: row.get(5)?,
        })
    }
}

impl Record for Comment {
    fn record_id(&self) -> &str {
        &self.id
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Bookmark {
    pub id: String,
    pub user_id: String,
    pub video_id: String,
    pub created_at: String,
}

impl Bookmark {
    /// Columns: id, user_id, video_id, created_at
    pub(crate) fn from_row(row: &libsql::Row) -> Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            user_id: row.get(1)?,
            video_id: row.get(2)?,
            created_at: row.get(3)?,
        })
    }
}

impl Record for Bookmark {
    fn record_id(&self) -> &str {
        &self.id
    }
}

/// A generated question ready to be written under a quiz.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewQuestion {
    pub kind: QuestionKind,
    pub prompt: String,
    pub options: Vec<String>,
    pub answer: EncodedAnswer,
    pub order: i64,
    pub correct_statement: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct QuizResultRecord {
    pub id: String,
    pub user_id: String,
    pub quiz_id: String,
    pub video_id: String,
    pub score: i64,
    pub total_questions: i64,
    pub created_at: String,
}

impl QuizResultRecord {
    /// Columns: id, user_id, quiz_id, video_id, score, total_questions, created_at
    pub(crate) fn from_row(row: &libsql::Row) -> Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            user_id: row.get(1)?,
            quiz_id: row.get(2)?,
            video_id: row.get(3)?,
            score: row.get(4)?,
            total_questions: row.get(5)?,
            created_at: row.get(6)?,
        })
    }

    pub fn percentage(&self) -> f64 {
        if self.total_questions == 0 {
            return 0.0;
        }
        self.score as f64 / self.total_questions as f64 * 100.0
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct QuizStats {
    pub total_attempts: usize,
    /// Mean attempt percentage, one decimal place.
    pub average_score: f64,
}

impl QuizStats {
    pub fn from_results(results: &[QuizResultRecord]) -> Self {
        if results.is_empty() {
            return Self {
                total_attempts: 0,
                average_score: 0.0,
            };
        }

        let sum: f64 = results.iter().map(QuizResultRecord::percentage).sum();
        let mean = sum / results.len() as f64;

        Self {
            total_attempts: results.len(),
            average_score: (mean * 10.0).round() / 10.0,
        }
    }
}
