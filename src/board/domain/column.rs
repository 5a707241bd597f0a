//! Four-column projection of a board's tasks.
//!
//! Columns are derived data. They are recomputed from the task sequence and
//! never stored on their own.

use super::{Task, TaskId, TaskStatus};
use serde::Serialize;

/// Tasks sharing one status, in board order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Column {
    id: TaskStatus,
    title: &'static str,
    tasks: Vec<Task>,
}

impl Column {
    /// Creates an empty column for `status`.
    #[must_use]
    pub const fn empty(status: TaskStatus) -> Self {
        Self {
            id: status,
            title: status.title(),
            tasks: Vec::new(),
        }
    }

    /// Returns the status this column groups.
    #[must_use]
    pub const fn id(&self) -> TaskStatus {
        self.id
    }

    /// Returns the column heading.
    #[must_use]
    pub const fn title(&self) -> &'static str {
        self.title
    }

    /// Returns the column's tasks in display order.
    #[must_use]
    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    /// Returns the number of tasks in the column.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.tasks.len()
    }

    /// Returns `true` when the column holds no tasks.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Returns the task identifiers in display order.
    #[must_use]
    pub fn task_ids(&self) -> Vec<TaskId> {
        self.tasks.iter().map(Task::id).collect()
    }

    /// Returns the index of `task_id` within the column.
    #[must_use]
    pub fn position(&self, task_id: TaskId) -> Option<usize> {
        self.tasks.iter().position(|task| task.id() == task_id)
    }
}

/// The complete four-column grouping of a board.
///
/// Every status always has a column, even when it is empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Board {
    columns: [Column; 4],
}

impl Board {
    /// Returns the column for `status`.
    #[must_use]
    pub fn column(&self, status: TaskStatus) -> &Column {
        let [todo, in_progress, review, done] = &self.columns;
        match status {
            TaskStatus::Todo => todo,
            TaskStatus::InProgress => in_progress,
            TaskStatus::Review => review,
            TaskStatus::Done => done,
        }
    }

    /// Returns all columns in display order.
    #[must_use]
    pub const fn columns(&self) -> &[Column; 4] {
        &self.columns
    }

    /// Returns the number of tasks across every column.
    #[must_use]
    pub fn total_tasks(&self) -> usize {
        self.columns.iter().map(Column::len).sum()
    }

    /// Locates a task, returning its column and index within it.
    #[must_use]
    pub fn find(&self, task_id: TaskId) -> Option<(TaskStatus, usize)> {
        self.columns
            .iter()
            .find_map(|column| column.position(task_id).map(|index| (column.id(), index)))
    }
}

/// Groups `tasks` by status, preserving the order they are given in.
#[must_use]
pub fn project<'a>(tasks: impl IntoIterator<Item = &'a Task>) -> Board {
    let mut columns = TaskStatus::ALL.map(Column::empty);
    for task in tasks {
        for column in &mut columns {
            if column.id == task.status() {
                column.tasks.push(task.clone());
            }
        }
    }
    Board { columns }
}
