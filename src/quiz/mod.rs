//! The quiz session engine: sampling, answer state, scoring and the
//! lifecycle of one attempt. Nothing in here touches the network or the
//! database; the result sink is the only outward seam.

mod answers;
mod question;
pub mod sampler;
mod scorer;
mod session;

pub use answers::AnswerState;
pub use question::{decode_options, DecodeError, EncodedAnswer, Question, QuestionKind, TRUE_FALSE_OPTIONS};
pub use sampler::{sample, EmptyQuiz, MAX_SESSION_QUESTIONS};
pub use scorer::{score, Score};
pub use session::{Phase, QuizResultDraft, QuizSession, ResultSink, SessionError, Submission};

#[cfg(test)]
pub use session::MockResultSink;
