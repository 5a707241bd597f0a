//! Error types for board domain validation and parsing.

use super::{TaskId, TaskStatus};
use thiserror::Error;

/// Errors returned while constructing or rearranging board values.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BoardDomainError {
    /// The task title is empty after trimming.
    #[error("task title must not be empty")]
    EmptyTitle,

    /// A drag supplied an index outside the column.
    #[error("index {index} is out of range for a column of {len} tasks")]
    IndexOutOfRange {
        /// The offending index.
        index: usize,
        /// Length of the column the index was applied to.
        len: usize,
    },

    /// A drag named a source column the task is not in.
    #[error("task {task_id} is in {actual} but the drag started in {claimed}")]
    SourceColumnMismatch {
        /// Task being dragged.
        task_id: TaskId,
        /// Column the drag event claims the task came from.
        claimed: TaskStatus,
        /// Column the task actually occupies.
        actual: TaskStatus,
    },

    /// A drag named a source index the task no longer occupies.
    #[error("task {task_id} is at index {actual} but the drag started at {claimed}")]
    StaleSourceIndex {
        /// Task being dragged.
        task_id: TaskId,
        /// Index the drag event claims.
        claimed: usize,
        /// Index the task actually occupies.
        actual: usize,
    },

    /// A status change was requested to the status the task already has.
    #[error("task {task_id} already has status {status}")]
    UnchangedStatus {
        /// Task being moved.
        task_id: TaskId,
        /// Status the task already carries.
        status: TaskStatus,
    },
}

/// Error returned while parsing task statuses from the wire.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown task status: {0}")]
pub struct ParseTaskStatusError(pub String);

/// Error returned while parsing task priorities from the wire.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown task priority: {0}")]
pub struct ParsePriorityError(pub String);
