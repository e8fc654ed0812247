use std::fmt;

use rand::{seq::SliceRandom, Rng};

use super::Question;

/// Upper bound on the number of questions asked in one session.
pub const MAX_SESSION_QUESTIONS: usize = 10;

/// The video has no quiz questions to sample from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EmptyQuiz;

impl fmt::Display for EmptyQuiz {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("no quiz available for this video")
    }
}

impl std::error::Error for EmptyQuiz {}

/// Draws `min(MAX_SESSION_QUESTIONS, questions.len())` questions without replacement, in random order.
pub fn sample(questions: &[Question]) -> Result<Vec<Question>, EmptyQuiz> {
    sample_with(questions, MAX_SESSION_QUESTIONS, &mut rand::thread_rng())
}

pub fn sample_with<R: Rng + ?Sized>(
    questions: &[Question],
    limit: usize,
    rng: &mut R,
) -> Result<Vec<Question>, EmptyQuiz> {
    if questions.is_empty() {
        return Err(EmptyQuiz);
    }

    let mut picked = questions.to_vec();
    picked.shuffle(rng);
    picked.truncate(limit);
    Ok(picked)
}
