//! Service-level error taxonomy surfaced to board callers.

use crate::board::{
    domain::{BoardDomainError, InvalidTransition, ProjectId, TaskId},
    ports::SyncChannelError,
};
use super::TaskStoreError;
use thiserror::Error;

/// Result type for board service operations.
pub type BoardResult<T> = Result<T, BoardError>;

/// Errors returned by board services.
#[derive(Debug, Clone, Error)]
pub enum BoardError {
    /// The referenced task does not exist.
    #[error("task not found: {0}")]
    TaskNotFound(TaskId),

    /// The referenced project does not exist.
    #[error("project not found: {0}")]
    ProjectNotFound(ProjectId),

    /// The caller lacks access to the project.
    #[error("access denied: {0}")]
    Forbidden(String),

    /// The channel failed in a way that may succeed on retry.
    #[error("synchronization channel unavailable: {0}")]
    TransientChannel(SyncChannelError),

    /// Malformed status, indices or drag event.
    #[error(transparent)]
    Validation(#[from] BoardDomainError),

    /// The authority refused the request as malformed.
    #[error("request rejected by server: {0}")]
    Rejected(String),

    /// The task already has a status change awaiting the server.
    #[error("task {0} already has a status change in flight")]
    TransitionPending(TaskId),

    /// The move state machine was driven along an invalid edge.
    #[error(transparent)]
    Transition(#[from] InvalidTransition),

    /// The board has not been loaded successfully.
    #[error("board is not loaded")]
    NotLoaded,

    /// Another task is already waiting on the session's push stream.
    #[error("another listener is already waiting for remote events")]
    ListenerBusy,

    /// Shared board state is unusable after a panic.
    #[error("board state unavailable: {0}")]
    StoreUnavailable(String),
}

impl BoardError {
    /// Returns `true` when retrying the same operation may succeed.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::TransientChannel(_))
    }
}

impl From<SyncChannelError> for BoardError {
    fn from(err: SyncChannelError) -> Self {
        match err {
            SyncChannelError::TaskNotFound(task_id) => Self::TaskNotFound(task_id),
            SyncChannelError::ProjectNotFound(project_id) => Self::ProjectNotFound(project_id),
            SyncChannelError::Forbidden(reason) => Self::Forbidden(reason),
            SyncChannelError::Rejected(reason) => Self::Rejected(reason),
            transient @ (SyncChannelError::Timeout(_) | SyncChannelError::Transport(_)) => {
                Self::TransientChannel(transient)
            }
        }
    }
}

impl From<TaskStoreError> for BoardError {
    fn from(err: TaskStoreError) -> Self {
        match err {
            TaskStoreError::TaskNotFound(task_id) => Self::TaskNotFound(task_id),
            TaskStoreError::Validation(domain) => Self::Validation(domain),
            TaskStoreError::Poisoned(reason) => Self::StoreUnavailable(reason),
        }
    }
}
