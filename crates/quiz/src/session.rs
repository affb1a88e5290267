//! Per-visitor quiz session: collected answers plus a cursor into the
//! active flow. Purely in-memory; callers decide where (and whether) a
//! session outlives a page load.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::catalog::{Question, QuestionCatalog, QuizFlow};
use crate::error::{QuizError, QuizResult};
use crate::state_machine::{QuizStateMachine, QuizStatus};

/// Session state. `cursor` always indexes the active flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "status")]
pub enum QuizState {
    NotStarted,
    InProgress { cursor: usize },
    Completed,
}

impl QuizState {
    pub fn status(&self) -> QuizStatus {
        match self {
            QuizState::NotStarted => QuizStatus::NotStarted,
            QuizState::InProgress { .. } => QuizStatus::InProgress,
            QuizState::Completed => QuizStatus::Completed,
        }
    }
}

/// Outcome of `go_to_next`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "outcome")]
pub enum Advance {
    Next {
        question_id: String,
        /// 1-based position in the active flow.
        step: usize,
        total_steps: usize,
    },
    Finished,
}

/// Serializable view of a session, for routing collaborators and storage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub session_id: Uuid,
    pub status: QuizStatus,
    pub flow: String,
    pub cursor: Option<usize>,
    pub current_question_id: Option<String>,
    pub step: Option<usize>,
    pub total_steps: usize,
    pub answers: BTreeMap<String, String>,
    pub started_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone)]
pub struct QuizSession {
    id: Uuid,
    catalog: Arc<QuestionCatalog>,
    machine: QuizStateMachine,
    state: QuizState,
    flow_id: String,
    answers: BTreeMap<String, String>,
    started_at: Option<DateTime<Utc>>,
    updated_at: DateTime<Utc>,
    completed_at: Option<DateTime<Utc>>,
}

impl QuizSession {
    pub fn new(catalog: Arc<QuestionCatalog>) -> Self {
        let flow_id = catalog.default_flow().id.clone();
        Self {
            id: Uuid::new_v4(),
            catalog,
            machine: QuizStateMachine::new(),
            state: QuizState::NotStarted,
            flow_id,
            answers: BTreeMap::new(),
            started_at: None,
            updated_at: Utc::now(),
            completed_at: None,
        }
    }

    /// Rebuild a session from a snapshot taken against the same catalog.
    pub fn restore(catalog: Arc<QuestionCatalog>, snapshot: SessionSnapshot) -> QuizResult<Self> {
        let flow = catalog
            .flow(&snapshot.flow)
            .ok_or_else(|| QuizError::UnknownFlow(snapshot.flow.clone()))?;

        let state = match (snapshot.status, snapshot.cursor) {
            (QuizStatus::NotStarted, _) => QuizState::NotStarted,
            (QuizStatus::Completed, _) => QuizState::Completed,
            (QuizStatus::InProgress, Some(cursor)) if cursor < flow.len() => {
                QuizState::InProgress { cursor }
            }
            (QuizStatus::InProgress, cursor) => {
                return Err(QuizError::Document(format!(
                    "cursor {:?} is outside flow '{}' ({} questions)",
                    cursor,
                    flow.id,
                    flow.len()
                )))
            }
        };

        let mut machine = QuizStateMachine::new();
        machine.status = state.status();

        Ok(Self {
            id: snapshot.session_id,
            catalog,
            machine,
            state,
            flow_id: snapshot.flow,
            answers: snapshot.answers,
            started_at: snapshot.started_at,
            updated_at: snapshot.updated_at,
            completed_at: snapshot.completed_at,
        })
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn catalog(&self) -> &QuestionCatalog {
        &self.catalog
    }

    pub fn state(&self) -> QuizState {
        self.state
    }

    pub fn status(&self) -> QuizStatus {
        self.state.status()
    }

    pub fn is_complete(&self) -> bool {
        self.state == QuizState::Completed
    }

    pub fn flow_id(&self) -> &str {
        &self.flow_id
    }

    pub fn active_flow(&self) -> &QuizFlow {
        self.catalog
            .flow(&self.flow_id)
            .unwrap_or_else(|| self.catalog.default_flow())
    }

    /// Number of screens in the flow actually in use.
    pub fn flow_total_steps(&self) -> usize {
        self.active_flow().len()
    }

    pub fn cursor(&self) -> Option<usize> {
        match self.state {
            QuizState::InProgress { cursor } => Some(cursor),
            _ => None,
        }
    }

    pub fn current_step(&self) -> Option<usize> {
        self.cursor().map(|c| c + 1)
    }

    pub fn current_question_id(&self) -> Option<&str> {
        self.cursor().and_then(|c| self.active_flow().question_at(c))
    }

    pub fn current_question(&self) -> Option<&Question> {
        self.current_question_id()
            .and_then(|id| self.catalog.get_question(id))
    }

    pub fn answers(&self) -> &BTreeMap<String, String> {
        &self.answers
    }

    pub fn answer(&self, key: &str) -> Option<&str> {
        self.answers.get(key).map(String::as_str)
    }

    /// Enter the quiz on `flow`, or the default flow when `None`.
    pub fn start(&mut self, flow: Option<&str>) -> QuizResult<()> {
        if self.state != QuizState::NotStarted {
            return Err(QuizError::InvalidTransition {
                from: self.status().to_string(),
                to: QuizStatus::InProgress.to_string(),
            });
        }
        let flow_id = match flow {
            Some(id) => self
                .catalog
                .flow(id)
                .ok_or_else(|| QuizError::UnknownFlow(id.to_string()))?
                .id
                .clone(),
            None => self.catalog.default_flow().id.clone(),
        };

        self.machine.transition(QuizStatus::InProgress)?;
        let now = Utc::now();
        self.flow_id = flow_id;
        self.state = QuizState::InProgress { cursor: 0 };
        self.answers.clear();
        self.started_at = Some(now);
        self.updated_at = now;
        self.completed_at = None;

        debug!(session_id = %self.id, flow = %self.flow_id, "Quiz session started");
        Ok(())
    }

    /// Store an answer without moving. Used by screens that capture more
    /// than one field before advancing.
    pub fn set_answer(&mut self, key: impl Into<String>, value: impl Into<String>) -> QuizResult<()> {
        self.require_in_progress()?;
        let key = self.accepted_key(key.into())?;
        self.answers.insert(key, value.into());
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Store the answer and move to the next question of the active flow.
    ///
    /// When the answered option of the current question carries a branch,
    /// the session switches to that flow first, keeping its place on the
    /// current question.
    pub fn go_to_next(&mut self, key: impl Into<String>, value: impl Into<String>) -> QuizResult<Advance> {
        let mut cursor = self.require_in_progress()?;
        let key = self.accepted_key(key.into())?;
        let value = value.into();

        let catalog = Arc::clone(&self.catalog);
        let current_id = self.active_flow().question_at(cursor).map(str::to_string);

        if let Some(current_id) = current_id.as_deref() {
            let branch = catalog
                .get_question(current_id)
                .and_then(|q| q.branch_for(&value));
            if let Some(target) = branch.filter(|target| *target != self.flow_id) {
                if let Some(position) = catalog.flow(target).and_then(|f| f.position(current_id)) {
                    debug!(
                        session_id = %self.id,
                        from = %self.flow_id,
                        to = target,
                        question_id = current_id,
                        "Quiz flow branched"
                    );
                    self.flow_id = target.to_string();
                    cursor = position;
                }
            }
        }

        self.answers.insert(key, value);
        let now = Utc::now();
        self.updated_at = now;

        let next = cursor + 1;
        let total_steps = self.flow_total_steps();
        match self.active_flow().question_at(next).map(str::to_string) {
            Some(question_id) => {
                self.machine.transition(QuizStatus::InProgress)?;
                self.state = QuizState::InProgress { cursor: next };
                Ok(Advance::Next {
                    question_id,
                    step: next + 1,
                    total_steps,
                })
            }
            None => {
                self.machine.transition(QuizStatus::Completed)?;
                self.state = QuizState::Completed;
                self.completed_at = Some(now);
                debug!(
                    session_id = %self.id,
                    flow = %self.flow_id,
                    answers = self.answers.len(),
                    "Quiz session completed"
                );
                Ok(Advance::Finished)
            }
        }
    }

    /// Drop all answers and go back to `NotStarted`.
    pub fn restart(&mut self) -> QuizResult<()> {
        if self.state != QuizState::NotStarted {
            self.machine.transition(QuizStatus::NotStarted)?;
        }
        self.state = QuizState::NotStarted;
        self.flow_id = self.catalog.default_flow().id.clone();
        self.answers.clear();
        self.started_at = None;
        self.completed_at = None;
        self.updated_at = Utc::now();
        Ok(())
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            session_id: self.id,
            status: self.status(),
            flow: self.flow_id.clone(),
            cursor: self.cursor(),
            current_question_id: self.current_question_id().map(str::to_string),
            step: self.current_step(),
            total_steps: self.flow_total_steps(),
            answers: self.answers.clone(),
            started_at: self.started_at,
            updated_at: self.updated_at,
            completed_at: self.completed_at,
        }
    }

    fn accepted_key(&self, key: String) -> QuizResult<String> {
        if self.catalog.accepts_answer_key(&key) {
            Ok(key)
        } else {
            Err(QuizError::UnknownAnswerKey(key))
        }
    }

    fn require_in_progress(&self) -> QuizResult<usize> {
        match self.state {
            QuizState::InProgress { cursor } => Ok(cursor),
            other => Err(QuizError::NotInProgress {
                state: other.status().to_string(),
            }),
        }
    }
}
