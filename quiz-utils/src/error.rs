#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum Error {
    #[error("{0}")]
    InvalidAttempt(String),
    #[error("{0}")]
    InvalidQuestion(String),
    #[error("question text must not be empty")]
    EmptyQuestionText,
}
