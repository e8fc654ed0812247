use std::collections::BTreeMap;

use serde::Serialize;

/// Selected option per sampled question index.
///
/// This type does not check that an option belongs to its question; the
/// session layer does.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct AnswerState {
    answers: BTreeMap<usize, String>,
    #[serde(skip)]
    expected: usize,
}

impl AnswerState {
    pub fn new(expected: usize) -> Self {
        Self {
            answers: BTreeMap::new(),
            expected,
        }
    }

    /// Records `option` for `index`, returning the answer it replaced.
    pub fn record(&mut self, index: usize, option: impl Into<String>) -> Option<String> {
        self.answers.insert(index, option.into())
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.answers.get(&index).map(String::as_str)
    }

    pub fn answered(&self) -> usize {
        self.answers.len()
    }

    pub fn expected(&self) -> usize {
        self.expected
    }

    /// True iff every index in `0..expected` has an answer.
    pub fn is_complete(&self) -> bool {
        (0..self.expected).all(|i| self.answers.contains_key(&i))
    }

    pub fn clear(&mut self) {
        self.answers.clear();
        self.expected = 0;
    }
}
