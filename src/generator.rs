use color_eyre::Result;
use reqwest::multipart::{Form, Part};

use crate::models::{Generation, GenerationFailure};
use crate::services::upload::{QuizGenerator, UploadFile};

/// Client for the external transcript and quiz generation service.
#[derive(Clone)]
pub struct HttpQuizGenerator {
    client: reqwest::Client,
    base_url: String,
}

impl HttpQuizGenerator {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/generate-transcript", self.base_url.trim_end_matches('/'))
    }
}

impl QuizGenerator for HttpQuizGenerator {
    async fn generate(&self, video: &UploadFile) -> Result<Generation> {
        let part = Part::bytes(video.bytes.to_vec())
            .file_name(video.file_name.clone())
            .mime_str(video.content_type.as_deref().unwrap_or("video/mp4"))?;
        let form = Form::new().part("video", part);

        let resp = self
            .client
            .post(self.endpoint())
            .multipart(form)
            .send()
            .await?;

        let status = resp.status();
        let text = resp.text().await?;

        if !status.is_success() {
            tracing::error!("generation service error: {status} - {text}");
            let failure: GenerationFailure = serde_json::from_str(&text).unwrap_or_default();
            color_eyre::eyre::bail!("{}", failure.message());
        }

        let generation: Generation = serde_json::from_str(&text)?;
        tracing::info!(
            "generation service returned {} question(s), transcript of {} characters",
            generation.quiz_questions.len(),
            generation.transcript.len()
        );
        Ok(generation)
    }
}
