//! Drag-and-drop gesture contract.

use super::{TaskId, TaskStatus};
use serde::{Deserialize, Serialize};

/// A slot on the board: a column and an index within it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DragLocation {
    /// Column of the slot.
    pub column: TaskStatus,
    /// Index within the column.
    pub index: usize,
}

impl DragLocation {
    /// Creates a location.
    #[must_use]
    pub const fn new(column: TaskStatus, index: usize) -> Self {
        Self { column, index }
    }
}

/// The end of a drag gesture as reported by the drag-and-drop layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DragEvent {
    /// Task that was dragged.
    pub task_id: TaskId,
    /// Where the drag started.
    pub source: DragLocation,
    /// Where the task was dropped; `None` when dropped outside any column.
    pub destination: Option<DragLocation>,
}

impl DragEvent {
    /// Creates a drag that ended on the board.
    #[must_use]
    pub const fn new(task_id: TaskId, source: DragLocation, destination: DragLocation) -> Self {
        Self {
            task_id,
            source,
            destination: Some(destination),
        }
    }

    /// Creates a drag that was released outside every column.
    #[must_use]
    pub const fn cancelled(task_id: TaskId, source: DragLocation) -> Self {
        Self {
            task_id,
            source,
            destination: None,
        }
    }

    /// Returns `true` when the drop landed in a different column.
    #[must_use]
    pub fn crosses_columns(&self) -> bool {
        self.destination
            .is_some_and(|destination| destination.column != self.source.column)
    }
}
