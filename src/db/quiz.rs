use color_eyre::{eyre::WrapErr, Result};
use libsql::params;
use ulid::Ulid;

use super::helpers::{query_all, query_optional};
use super::models::{NewQuestion, QuizResultRecord};
use super::{now, timestamp, Db};
use crate::quiz::{Question, QuizResultDraft, ResultSink};

impl Db {
    pub async fn create_quiz(&self, video_id: &str) -> Result<String> {
        let quiz_id = Ulid::new().to_string();
        let conn = self.connect()?;

        conn.execute(
            "INSERT INTO quizzes (id, video_id, created_at) VALUES (?, ?, ?)",
            params![quiz_id.as_str(), video_id, now()],
        )
        .await?;

        tracing::info!("quiz created: id={quiz_id}, video={video_id}");
        Ok(quiz_id)
    }

    pub async fn create_question(&self, quiz_id: &str, question: &NewQuestion) -> Result<String> {
        let question_id = Ulid::new().to_string();
        let options = serde_json::to_string(&question.options)?;
        let conn = self.connect()?;

        conn.execute(
            r#"INSERT INTO quiz_questions
               (id, quiz_id, kind, question, options, answer, correct_statement, display_order)
               VALUES (?, ?, ?, ?, ?, ?, ?, ?)"#,
            params![
                question_id.as_str(),
                quiz_id,
                question.kind.as_str(),
                question.prompt.as_str(),
                options,
                question.answer.as_raw(),
                question.correct_statement.as_str(),
                question.order
            ],
        )
        .await?;

        Ok(question_id)
    }

    pub async fn quiz_for_video(&self, video_id: &str) -> Result<Option<String>> {
        let conn = self.connect()?;
        query_optional(
            &conn,
            "SELECT id FROM quizzes WHERE video_id = ?",
            params![video_id],
            |row| Ok(row.get::<String>(0)?),
        )
        .await
    }

    /// Every question of a quiz in display order. A malformed stored document
    /// fails the whole fetch.
    pub async fn questions_for_quiz(&self, quiz_id: &str) -> Result<Vec<Question>> {
        let conn = self.connect()?;
        query_all(
            &conn,
            r#"SELECT id, quiz_id, kind, question, options, answer, display_order
               FROM quiz_questions
               WHERE quiz_id = ?
               ORDER BY display_order ASC, id ASC"#,
            params![quiz_id],
            |row| {
                let id: String = row.get(0)?;
                Question::decode(
                    id.clone(),
                    row.get(1)?,
                    &row.get::<String>(2)?,
                    row.get(3)?,
                    &row.get::<String>(4)?,
                    row.get(5)?,
                    row.get(6)?,
                )
                .wrap_err_with(|| format!("malformed quiz question {id}"))
            },
        )
        .await
    }

    pub async fn save_quiz_result(&self, result: &QuizResultDraft) -> Result<String> {
        let result_id = Ulid::new().to_string();
        let conn = self.connect()?;

        conn.execute(
            r#"INSERT INTO quiz_results
               (id, user_id, quiz_id, video_id, score, total_questions, created_at)
               VALUES (?, ?, ?, ?, ?, ?, ?)"#,
            params![
                result_id.as_str(),
                result.user_id.as_str(),
                result.quiz_id.as_str(),
                result.video_id.as_str(),
                result.score as i64,
                result.total_questions as i64,
                timestamp(result.timestamp)
            ],
        )
        .await?;

        Ok(result_id)
    }

    /// A user's attempts, newest first.
    pub async fn results_for_user(&self, user_id: &str) -> Result<Vec<QuizResultRecord>> {
        let conn = self.connect()?;
        query_all(
            &conn,
            r#"SELECT id, user_id, quiz_id, video_id, score, total_questions, created_at
               FROM quiz_results
               WHERE user_id = ?
               ORDER BY created_at DESC, id DESC"#,
            params![user_id],
            QuizResultRecord::from_row,
        )
        .await
    }
}

impl ResultSink for Db {
    async fn save_result(&self, result: &QuizResultDraft) -> Result<()> {
        self.save_quiz_result(result).await.map(|_| ())
    }
}
