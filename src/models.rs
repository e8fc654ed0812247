use serde::Deserialize;
use serde_json::Value;

use crate::db::NewQuestion;
use crate::quiz::{decode_options, DecodeError, EncodedAnswer, QuestionKind, TRUE_FALSE_OPTIONS};

/// Success body of the transcript and quiz generation service.
#[derive(Debug, Deserialize)]
pub struct Generation {
    #[serde(default)]
    pub transcript: String,
    #[serde(default)]
    pub quiz_questions: Vec<GeneratedQuestion>,
    #[serde(default)]
    pub quiz_id: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

/// Error body of the generation service.
#[derive(Debug, Default, Deserialize)]
pub struct GenerationFailure {
    pub error: Option<String>,
    pub details: Option<String>,
}

impl GenerationFailure {
    pub fn message(&self) -> String {
        self.details
            .as_deref()
            .or(self.error.as_deref())
            .filter(|m| !m.is_empty())
            .unwrap_or("Transcript generation failed")
            .to_string()
    }
}

/// One generated question. `options` and `answer` usually arrive as JSON
/// documents encoded into strings; bare JSON values are accepted too.
#[derive(Debug, Clone, Deserialize)]
pub struct GeneratedQuestion {
    #[serde(rename = "type")]
    pub kind: String,
    pub question: String,
    #[serde(default)]
    pub options: Value,
    pub answer: Value,
    #[serde(default)]
    pub order: i64,
    #[serde(default)]
    pub correct_statement: String,
}

fn encoded(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

impl TryFrom<GeneratedQuestion> for NewQuestion {
    type Error = DecodeError;

    fn try_from(q: GeneratedQuestion) -> Result<Self, Self::Error> {
        let kind: QuestionKind = q.kind.parse()?;

        let options = match kind {
            QuestionKind::TrueFalse => TRUE_FALSE_OPTIONS.iter().map(|o| o.to_string()).collect(),
            QuestionKind::MultipleChoice => {
                let options = decode_options(&encoded(&q.options))?;
                if options.is_empty() {
                    return Err(DecodeError::MissingOptions);
                }
                options
            }
        };

        let answer = EncodedAnswer::new(encoded(&q.answer));
        answer.decode()?;

        Ok(NewQuestion {
            kind,
            prompt: q.question,
            options,
            answer,
            order: q.order,
            correct_statement: q.correct_statement,
        })
    }
}
