//! Sizing quiz engine: question catalog with named flows, per-visitor quiz
//! session state machine, and an in-memory session store.

pub mod catalog;
pub mod error;
pub mod session;
pub mod sizing;
pub mod state_machine;
pub mod store;

pub use catalog::{CatalogDocument, HelpText, Question, QuestionCatalog, QuestionKind, QuestionOption, QuizFlow};
pub use error::{QuizError, QuizResult};
pub use session::{Advance, QuizSession, QuizState, SessionSnapshot};
pub use state_machine::{QuizStateMachine, QuizStatus};
pub use store::SessionStore;
