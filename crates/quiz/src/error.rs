use thiserror::Error;

pub type QuizResult<T> = Result<T, QuizError>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QuizError {
    #[error("Invalid question catalog: {0}")]
    InvalidCatalog(String),

    #[error("Unknown quiz flow: {0}")]
    UnknownFlow(String),

    #[error("Quiz session is {state}, expected in_progress")]
    NotInProgress { state: String },

    #[error("Unknown answer key: {0}")]
    UnknownAnswerKey(String),

    #[error("Invalid state transition from {from} to {to}")]
    InvalidTransition { from: String, to: String },

    #[error("Quiz session not found: {0}")]
    SessionNotFound(String),

    #[error("Session store is full ({0} sessions)")]
    StoreFull(usize),

    #[error("Catalog document error: {0}")]
    Document(String),
}
