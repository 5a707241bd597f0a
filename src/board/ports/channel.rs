//! Synchronization channel port: the link between a board session and the
//! remote authority.
//!
//! The channel covers three boundaries: the initial fetch, the authoritative
//! status-change write, and the push stream of changes made by other sessions.
//! Permission checks happen behind this port; callers only see their outcome.

use crate::board::domain::{ProjectId, Task, TaskId, TaskStatus};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::broadcast;

/// Result type for synchronization channel operations.
pub type SyncResult<T> = Result<T, SyncChannelError>;

/// Authoritative status-change request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusChangeRequest {
    /// Task to move.
    pub task_id: TaskId,
    /// Status the task should take.
    pub new_status: TaskStatus,
}

impl StatusChangeRequest {
    /// Creates a request.
    #[must_use]
    pub const fn new(task_id: TaskId, new_status: TaskStatus) -> Self {
        Self {
            task_id,
            new_status,
        }
    }
}

/// Change pushed by the authority outside any request this session issued.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum RemoteEvent {
    /// A task was created or changed.
    Upserted(Task),
    /// A task was deleted.
    Removed(TaskId),
}

impl RemoteEvent {
    /// Returns the identifier of the task the event concerns.
    #[must_use]
    pub const fn task_id(&self) -> TaskId {
        match self {
            Self::Upserted(task) => task.id(),
            Self::Removed(task_id) => *task_id,
        }
    }
}

/// One item read from a [`RemoteEvents`] stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delivery {
    /// The next event.
    Event(RemoteEvent),
    /// The subscriber fell behind and this many events were dropped.
    Lagged(u64),
}

/// Subscription to the authority's push stream.
#[derive(Debug)]
pub struct RemoteEvents {
    receiver: broadcast::Receiver<RemoteEvent>,
}

impl RemoteEvents {
    /// Wraps a broadcast receiver.
    #[must_use]
    pub const fn new(receiver: broadcast::Receiver<RemoteEvent>) -> Self {
        Self { receiver }
    }

    /// Waits for the next delivery.
    ///
    /// Returns `None` once the authority has closed the stream.
    pub async fn recv(&mut self) -> Option<Delivery> {
        match self.receiver.recv().await {
            Ok(event) => Some(Delivery::Event(event)),
            Err(broadcast::error::RecvError::Lagged(missed)) => Some(Delivery::Lagged(missed)),
            Err(broadcast::error::RecvError::Closed) => None,
        }
    }

    /// Returns the next delivery if one is already queued.
    pub fn try_recv(&mut self) -> Option<Delivery> {
        match self.receiver.try_recv() {
            Ok(event) => Some(Delivery::Event(event)),
            Err(broadcast::error::TryRecvError::Lagged(missed)) => Some(Delivery::Lagged(missed)),
            Err(broadcast::error::TryRecvError::Empty | broadcast::error::TryRecvError::Closed) => {
                None
            }
        }
    }
}

/// Bidirectional link to the remote authority.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SyncChannel: Send + Sync {
    /// Fetches every task of a project in the authority's order.
    ///
    /// # Errors
    ///
    /// Returns [`SyncChannelError::ProjectNotFound`] for an unknown project,
    /// [`SyncChannelError::Forbidden`] when the caller is not a member, or a
    /// transport error.
    async fn fetch_tasks(&self, project_id: ProjectId) -> SyncResult<Vec<Task>>;

    /// Asks the authority to change a task's status.
    ///
    /// # Errors
    ///
    /// Returns [`SyncChannelError::TaskNotFound`],
    /// [`SyncChannelError::Forbidden`], [`SyncChannelError::Rejected`] or a
    /// transport error when the change is not applied.
    async fn change_status(&self, request: StatusChangeRequest) -> SyncResult<()>;

    /// Opens a subscription to changes made by any session.
    fn subscribe(&self) -> RemoteEvents;
}

/// Errors returned by synchronization channel implementations.
#[derive(Debug, Clone, Error)]
pub enum SyncChannelError {
    /// The referenced task does not exist.
    #[error("task not found: {0}")]
    TaskNotFound(TaskId),

    /// The referenced project does not exist.
    #[error("project not found: {0}")]
    ProjectNotFound(ProjectId),

    /// The caller lacks access to the task's project.
    #[error("access denied: {0}")]
    Forbidden(String),

    /// The authority refused a malformed request.
    #[error("request rejected: {0}")]
    Rejected(String),

    /// No response arrived in time.
    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    /// Transport-layer failure.
    #[error("transport error: {0}")]
    Transport(Arc<dyn std::error::Error + Send + Sync>),
}

impl SyncChannelError {
    /// Wraps a transport error.
    pub fn transport(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Transport(Arc::new(err))
    }

    /// Returns `true` for failures worth retrying.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::Timeout(_) | Self::Transport(_))
    }
}
