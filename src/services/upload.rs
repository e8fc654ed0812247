use std::fmt;

use axum::body::Bytes;
use color_eyre::Result;

use crate::db::{Db, NewQuestion, NewVideo};
use crate::models::Generation;

/// A file received from the create-video form.
#[derive(Clone, Debug)]
pub struct UploadFile {
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Bytes,
}

#[derive(Clone, Debug, Default)]
pub struct UploadForm {
    pub title: String,
    pub prompt: String,
    pub video: Option<UploadFile>,
    pub thumbnail: Option<UploadFile>,
}

impl UploadForm {
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.title.trim().is_empty() {
            missing.push("title");
        }
        if self.prompt.trim().is_empty() {
            missing.push("prompt");
        }
        if self.video.as_ref().map_or(true, |f| f.bytes.is_empty()) {
            missing.push("video");
        }
        if self.thumbnail.as_ref().map_or(true, |f| f.bytes.is_empty()) {
            missing.push("thumbnail");
        }
        missing
    }
}

// ---------------------------------------------------------------------------
// Collaborator traits
// ---------------------------------------------------------------------------

#[cfg_attr(test, mockall::automock)]
pub trait QuizGenerator: Send + Sync {
    /// Sends the video off for transcription and question generation.
    fn generate(
        &self,
        video: &UploadFile,
    ) -> impl std::future::Future<Output = Result<Generation>> + Send;
}

#[cfg_attr(test, mockall::automock)]
pub trait ObjectStore: Send + Sync {
    /// Stores the file and returns the URL it can be fetched from.
    fn put(&self, file: &UploadFile) -> impl std::future::Future<Output = Result<String>> + Send;
}

#[cfg_attr(test, mockall::automock)]
pub trait PublishRepository: Send + Sync {
    fn create_video(
        &self,
        video: &NewVideo,
    ) -> impl std::future::Future<Output = Result<String>> + Send;

    fn create_quiz(
        &self,
        video_id: &str,
    ) -> impl std::future::Future<Output = Result<String>> + Send;

    fn create_question(
        &self,
        quiz_id: &str,
        question: &NewQuestion,
    ) -> impl std::future::Future<Output = Result<String>> + Send;
}

impl PublishRepository for Db {
    fn create_video(
        &self,
        video: &NewVideo,
    ) -> impl std::future::Future<Output = Result<String>> + Send {
        Db::create_video(self, video)
    }

    fn create_quiz(
        &self,
        video_id: &str,
    ) -> impl std::future::Future<Output = Result<String>> + Send {
        Db::create_quiz(self, video_id)
    }

    fn create_question(
        &self,
        quiz_id: &str,
        question: &NewQuestion,
    ) -> impl std::future::Future<Output = Result<String>> + Send {
        Db::create_question(self, quiz_id, question)
    }
}

// ---------------------------------------------------------------------------
// Outcomes
// ---------------------------------------------------------------------------

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UploadStep {
    Generate,
    UploadVideo,
    UploadThumbnail,
    CreatePost,
    CreateQuiz,
    CreateQuestion(usize),
}

impl fmt::Display for UploadStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Generate => f.write_str("generating transcript and quiz questions"),
            Self::UploadVideo => f.write_str("uploading video"),
            Self::UploadThumbnail => f.write_str("uploading thumbnail"),
            Self::CreatePost => f.write_str("creating video post"),
            Self::CreateQuiz => f.write_str("creating quiz"),
            Self::CreateQuestion(i) => write!(f, "creating quiz question {}", i + 1),
        }
    }
}

#[derive(Debug)]
pub enum UploadOutcome {
    Published {
        video_id: String,
        quiz_id: String,
        questions: usize,
    },
    /// Rejected before any call went out.
    MissingFields(Vec<&'static str>),
    /// A step failed before the post existed.
    Failed { step: UploadStep, message: String },
    /// The post exists but a later step failed. Nothing is rolled back.
    Partial {
        step: UploadStep,
        video_id: String,
        quiz_id: Option<String>,
        questions_created: usize,
        message: String,
    },
}

// ---------------------------------------------------------------------------
// UploadService
// ---------------------------------------------------------------------------

/// validate, generate, upload both files, create the post, the quiz, then each question.
pub struct UploadService<G: QuizGenerator, O: ObjectStore, R: PublishRepository = Db> {
    generator: G,
    store: O,
    repo: R,
}

impl<G, O, R> Clone for UploadService<G, O, R>
where
    G: QuizGenerator + Clone,
    O: ObjectStore + Clone,
    R: PublishRepository + Clone,
{
    fn clone(&self) -> Self {
        Self {
            generator: self.generator.clone(),
            store: self.store.clone(),
            repo: self.repo.clone(),
        }
    }
}

impl<G: QuizGenerator, O: ObjectStore, R: PublishRepository> UploadService<G, O, R> {
    pub fn new(generator: G, store: O, repo: R) -> Self {
        Self {
            generator,
            store,
            repo,
        }
    }

    pub async fn publish(&self, creator_id: &str, form: UploadForm) -> UploadOutcome {
        let missing = form.missing_fields();
        let (Some(video), Some(thumbnail)) = (&form.video, &form.thumbnail) else {
            return UploadOutcome::MissingFields(missing);
        };
        if !missing.is_empty() {
            return UploadOutcome::MissingFields(missing);
        }

        let failed = |step: UploadStep, message: String| {
            tracing::warn!("upload by user={creator_id} failed while {step}: {message}");
            UploadOutcome::Failed { step, message }
        };

        let generation = match self.generator.generate(video).await {
            Ok(generation) => generation,
            Err(e) => return failed(UploadStep::Generate, e.to_string()),
        };

        let mut questions = Vec::with_capacity(generation.quiz_questions.len());
        for (i, generated) in generation.quiz_questions.into_iter().enumerate() {
            match NewQuestion::try_from(generated) {
                Ok(q) => questions.push(q),
                Err(e) => {
                    return failed(
                        UploadStep::Generate,
                        format!("generated question {} is malformed: {e}", i + 1),
                    )
                }
            }
        }

        let video_url = match self.store.put(video).await {
            Ok(url) => url,
            Err(e) => return failed(UploadStep::UploadVideo, e.to_string()),
        };
        let thumbnail_url = match self.store.put(thumbnail).await {
            Ok(url) => url,
            Err(e) => return failed(UploadStep::UploadThumbnail, e.to_string()),
        };

        let post = NewVideo {
            title: form.title.trim().to_string(),
            prompt: form.prompt.trim().to_string(),
            video_url,
            thumbnail_url,
            transcript: generation.transcript,
            creator_id: creator_id.to_string(),
        };
        let video_id = match self.repo.create_video(&post).await {
            Ok(id) => id,
            Err(e) => return failed(UploadStep::CreatePost, e.to_string()),
        };

        let partial = |step: UploadStep,
                       quiz_id: Option<String>,
                       questions_created: usize,
                       message: String| {
            tracing::warn!(
                "upload of video={video_id} left incomplete after {questions_created} question(s) while {step}: {message}"
            );
            UploadOutcome::Partial {
                step,
                video_id: video_id.clone(),
                quiz_id,
                questions_created,
                message,
            }
        };

        let quiz_id = match self.repo.create_quiz(&video_id).await {
            Ok(id) => id,
            Err(e) => return partial(UploadStep::CreateQuiz, None, 0, e.to_string()),
        };

        for (i, question) in questions.iter().enumerate() {
            if let Err(e) = self.repo.create_question(&quiz_id, question).await {
                return partial(
                    UploadStep::CreateQuestion(i),
                    Some(quiz_id.clone()),
                    i,
                    e.to_string(),
                );
            }
        }

        tracing::info!(
            "video={video_id} published by user={creator_id} with {} quiz question(s)",
            questions.len()
        );
        UploadOutcome::Published {
            video_id,
            quiz_id,
            questions: questions.len(),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
