use std::{fmt, str::FromStr};

use serde::Serialize;
use serde_json::Value;

/// Options every true-false question is answered with.
pub const TRUE_FALSE_OPTIONS: [&str; 2] = ["True", "False"];

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum QuestionKind {
    MultipleChoice,
    TrueFalse,
}

impl QuestionKind {
    /// Value stored in the `kind` column.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MultipleChoice => "mcq",
            Self::TrueFalse => "true-false",
        }
    }
}

impl FromStr for QuestionKind {
    type Err = DecodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "mcq" | "multiple-choice" => Ok(Self::MultipleChoice),
            "true-false" => Ok(Self::TrueFalse),
            other => Err(DecodeError::UnknownKind(other.to_string())),
        }
    }
}

/// Shape mismatch in a stored or generated question document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    UnknownKind(String),
    Options(String),
    Answer(String),
    MissingOptions,
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownKind(kind) => write!(f, "unknown question type '{kind}'"),
            Self::Options(e) => write!(f, "options are not a JSON array of strings: {e}"),
            Self::Answer(e) => write!(f, "canonical answer is not a JSON scalar: {e}"),
            Self::MissingOptions => f.write_str("multiple-choice question has no options"),
        }
    }
}

impl std::error::Error for DecodeError {}

/// A canonical answer as stored: a JSON-encoded scalar such as `"\"True\""` or `"42"`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EncodedAnswer(String);

impl EncodedAnswer {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Encodes a plain answer string the way the store expects it.
    pub fn encode(answer: &str) -> Self {
        Self(Value::String(answer.to_string()).to_string())
    }

    pub fn as_raw(&self) -> &str {
        &self.0
    }

    /// Decodes the stored scalar into the string a user's selection is compared with.
    /// Strings come back as-is and booleans as `true`/`false`. Numbers come back
    /// as their shortest text, with integral values written without a fraction.
    pub fn decode(&self) -> Result<String, DecodeError> {
        let value: Value =
            serde_json::from_str(&self.0).map_err(|e| DecodeError::Answer(e.to_string()))?;
        match value {
            Value::String(s) => Ok(s),
            // `42.0` reads as `42`, the same text the option list would hold
            Value::Number(n) => Ok(match n.as_f64() {
                Some(f) if n.is_f64() && f.fract() == 0.0 => f.to_string(),
                _ => n.to_string(),
            }),
            Value::Bool(b) => Ok(b.to_string()),
            other => Err(DecodeError::Answer(format!("found {other}"))),
        }
    }
}

/// Decodes the JSON-encoded option list of a question document.
pub fn decode_options(raw: &str) -> Result<Vec<String>, DecodeError> {
    serde_json::from_str::<Vec<String>>(raw).map_err(|e| DecodeError::Options(e.to_string()))
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Question {
    pub id: String,
    pub quiz_id: String,
    pub kind: QuestionKind,
    pub prompt: String,
    pub options: Vec<String>,
    #[serde(skip)]
    pub answer: EncodedAnswer,
    pub order: i64,
}

impl Question {
    /// Builds a question from its raw document fields, failing on any shape mismatch.
    pub fn decode(
        id: String,
        quiz_id: String,
        kind: &str,
        prompt: String,
        options: &str,
        answer: String,
        order: i64,
    ) -> Result<Self, DecodeError> {
        let kind: QuestionKind = kind.parse()?;
        let options = match kind {
            QuestionKind::TrueFalse => TRUE_FALSE_OPTIONS.iter().map(|o| o.to_string()).collect(),
            QuestionKind::MultipleChoice => {
                let options = decode_options(options)?;
                if options.is_empty() {
                    return Err(DecodeError::MissingOptions);
                }
                options
            }
        };

        let answer = EncodedAnswer::new(answer);
        answer.decode()?;

        Ok(Self {
            id,
            quiz_id,
            kind,
            prompt,
            options,
            answer,
            order,
        })
    }

    /// Whether `option` is one of the choices offered for this question.
    pub fn accepts(&self, option: &str) -> bool {
        self.options.iter().any(|o| o == option)
    }
}
