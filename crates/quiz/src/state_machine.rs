use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{QuizError, QuizResult};

/// Lifecycle phase of a quiz session, without positional data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuizStatus {
    NotStarted,
    InProgress,
    Completed,
}

impl QuizStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            QuizStatus::NotStarted => "not_started",
            QuizStatus::InProgress => "in_progress",
            QuizStatus::Completed => "completed",
        }
    }
}

impl fmt::Display for QuizStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Describes a single valid state transition for a quiz session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateTransition {
    pub from: QuizStatus,
    pub to: QuizStatus,
    pub trigger: String,
}

/// Guards quiz-session lifecycle by enforcing a finite set of valid
/// state transitions.
#[derive(Debug, Clone)]
pub struct QuizStateMachine {
    pub status: QuizStatus,
    pub transitions: Vec<StateTransition>,
}

impl QuizStateMachine {
    /// Creates a new state machine starting in `NotStarted` with all valid
    /// transitions pre-configured.
    pub fn new() -> Self {
        let transitions = vec![
            // NotStarted ->
            StateTransition {
                from: QuizStatus::NotStarted,
                to: QuizStatus::InProgress,
                trigger: "start".to_string(),
            },
            // InProgress ->
            StateTransition {
                from: QuizStatus::InProgress,
                to: QuizStatus::InProgress,
                trigger: "advance".to_string(),
            },
            StateTransition {
                from: QuizStatus::InProgress,
                to: QuizStatus::Completed,
                trigger: "finish".to_string(),
            },
            StateTransition {
                from: QuizStatus::InProgress,
                to: QuizStatus::NotStarted,
                trigger: "restart".to_string(),
            },
            // Completed ->
            StateTransition {
                from: QuizStatus::Completed,
                to: QuizStatus::NotStarted,
                trigger: "restart".to_string(),
            },
        ];

        Self {
            status: QuizStatus::NotStarted,
            transitions,
        }
    }

    /// Returns `true` if the given transition is allowed.
    pub fn can_transition(&self, from: QuizStatus, to: QuizStatus) -> bool {
        self.transitions.iter().any(|t| t.from == from && t.to == to)
    }

    /// Trigger name of the transition from the current status to `to`.
    pub fn trigger_for(&self, to: QuizStatus) -> Option<&str> {
        self.transitions
            .iter()
            .find(|t| t.from == self.status && t.to == to)
            .map(|t| t.trigger.as_str())
    }

    /// Attempts to move the state machine to `to`. Returns an error if the
    /// transition is not permitted.
    pub fn transition(&mut self, to: QuizStatus) -> QuizResult<()> {
        if self.can_transition(self.status, to) {
            self.status = to;
            Ok(())
        } else {
            Err(QuizError::InvalidTransition {
                from: self.status.to_string(),
                to: to.to_string(),
            })
        }
    }
}

impl Default for QuizStateMachine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starts_not_started() {
        let machine = QuizStateMachine::new();
        assert_eq!(machine.status, QuizStatus::NotStarted);
        assert_eq!(machine.trigger_for(QuizStatus::InProgress), Some("start"));
    }

    #[test]
    fn test_full_lifecycle() {
        let mut machine = QuizStateMachine::new();
        machine.transition(QuizStatus::InProgress).unwrap();
        machine.transition(QuizStatus::InProgress).unwrap();
        machine.transition(QuizStatus::Completed).unwrap();
        machine.transition(QuizStatus::NotStarted).unwrap();
        assert_eq!(machine.status, QuizStatus::NotStarted);
    }

    #[test]
    fn test_completed_is_terminal_for_progress() {
        let mut machine = QuizStateMachine::new();
        machine.transition(QuizStatus::InProgress).unwrap();
        machine.transition(QuizStatus::Completed).unwrap();

        let err = machine.transition(QuizStatus::InProgress).unwrap_err();
        assert_eq!(
            err,
            QuizError::InvalidTransition {
                from: "completed".into(),
                to: "in_progress".into()
            }
        );
        assert_eq!(machine.status, QuizStatus::Completed);
    }

    #[test]
    fn test_cannot_finish_without_starting() {
        let mut machine = QuizStateMachine::new();
        assert!(machine.transition(QuizStatus::Completed).is_err());
        assert!(!machine.can_transition(QuizStatus::NotStarted, QuizStatus::Completed));
    }
}
