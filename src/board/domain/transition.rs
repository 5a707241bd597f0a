//! Lifecycle of a single cross-column move.

use super::{TaskId, TaskStatus};
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// State of an optimistic status change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransitionState {
    /// No move has been attempted.
    Idle,
    /// The move is applied locally and awaiting the server.
    Pending,
    /// The server accepted the move.
    Committed,
    /// The server rejected the move and the local change was reverted.
    RolledBack,
}

impl TransitionState {
    /// Returns the canonical representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Pending => "pending",
            Self::Committed => "committed",
            Self::RolledBack => "rolled_back",
        }
    }

    /// Returns `true` when `target` is reachable from this state in one step.
    #[must_use]
    pub const fn can_transition_to(self, target: Self) -> bool {
        matches!(
            (self, target),
            (Self::Idle, Self::Pending)
                | (Self::Pending, Self::Committed | Self::RolledBack)
        )
    }

    /// Returns `true` for states that accept no further transitions.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Committed | Self::RolledBack)
    }
}

/// Error returned when a move is driven along an edge the machine lacks.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
#[error("invalid transition for task {task_id}: {} -> {}", .from.as_str(), .to.as_str())]
pub struct InvalidTransition {
    /// Task whose move was being driven.
    pub task_id: TaskId,
    /// State the move was in.
    pub from: TransitionState,
    /// State that was requested.
    pub to: TransitionState,
}

/// Record of one cross-column move.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusTransition {
    task_id: TaskId,
    from: TaskStatus,
    to: TaskStatus,
    state: TransitionState,
    started_at: Option<DateTime<Utc>>,
    resolved_at: Option<DateTime<Utc>>,
}

impl StatusTransition {
    /// Creates an idle move of `task_id` from one status to another.
    #[must_use]
    pub const fn new(task_id: TaskId, from: TaskStatus, to: TaskStatus) -> Self {
        Self {
            task_id,
            from,
            to,
            state: TransitionState::Idle,
            started_at: None,
            resolved_at: None,
        }
    }

    /// Returns the task being moved.
    #[must_use]
    pub const fn task_id(&self) -> TaskId {
        self.task_id
    }

    /// Returns the status the task is leaving.
    #[must_use]
    pub const fn from(&self) -> TaskStatus {
        self.from
    }

    /// Returns the status the task is moving to.
    #[must_use]
    pub const fn to(&self) -> TaskStatus {
        self.to
    }

    /// Returns the current state.
    #[must_use]
    pub const fn state(&self) -> TransitionState {
        self.state
    }

    /// Returns when the move went pending.
    #[must_use]
    pub const fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    /// Returns when the move was committed or rolled back.
    #[must_use]
    pub const fn resolved_at(&self) -> Option<DateTime<Utc>> {
        self.resolved_at
    }

    /// Marks the move as applied locally and in flight.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidTransition`] unless the move is idle.
    pub fn begin(&mut self, clock: &impl Clock) -> Result<(), InvalidTransition> {
        self.advance(TransitionState::Pending)?;
        self.started_at = Some(clock.utc());
        Ok(())
    }

    /// Marks the move as accepted by the server.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidTransition`] unless the move is pending.
    pub fn commit(&mut self, clock: &impl Clock) -> Result<(), InvalidTransition> {
        self.advance(TransitionState::Committed)?;
        self.resolved_at = Some(clock.utc());
        Ok(())
    }

    /// Marks the move as rejected and reverted.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidTransition`] unless the move is pending.
    pub fn roll_back(&mut self, clock: &impl Clock) -> Result<(), InvalidTransition> {
        self.advance(TransitionState::RolledBack)?;
        self.resolved_at = Some(clock.utc());
        Ok(())
    }

    fn advance(&mut self, target: TransitionState) -> Result<(), InvalidTransition> {
        if !self.state.can_transition_to(target) {
            return Err(InvalidTransition {
                task_id: self.task_id,
                from: self.state,
                to: target,
            });
        }
        self.state = target;
        Ok(())
    }
}
