use serde::Serialize;

use super::{AnswerState, DecodeError, Question};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct Score {
    pub correct: usize,
    pub total: usize,
}

impl Score {
    pub fn percentage(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        self.correct as f64 * 100.0 / self.total as f64
    }
}

/// Counts the questions whose decoded canonical answer equals the selected option.
pub fn score(questions: &[Question], answers: &AnswerState) -> Result<Score, DecodeError> {
    let mut correct = 0;
    for (index, question) in questions.iter().enumerate() {
        let expected = question.answer.decode()?;
        if answers.get(index) == Some(expected.as_str()) {
            correct += 1;
        }
    }

    Ok(Score {
        correct,
        total: questions.len(),
    })
}
