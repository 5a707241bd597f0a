//! Unit tests for the task board.

mod projection_tests;

use crate::board::domain::{NewTask, ProjectId, Task, TaskId, TaskStatus, UserId};
use mockable::DefaultClock;

/// Builds a task in `status` for the given project.
pub(super) fn task_in(project_id: ProjectId, title: &str, status: TaskStatus) -> Task {
    Task::new(
        NewTask::new(project_id, UserId::new(), title).with_status(status),
        &DefaultClock,
    )
    .expect("test task titles are non-empty")
}

/// Returns the identifiers of `tasks` in order.
pub(super) fn ids(tasks: &[Task]) -> Vec<TaskId> {
    tasks.iter().map(Task::id).collect()
}
