//! Unit tests for the four-column projection.

use super::{ids, task_in};
use crate::board::domain::{ProjectId, Task, TaskStatus, project};
use rstest::{fixture, rstest};
use std::collections::HashSet;

#[fixture]
fn project_id() -> ProjectId {
    ProjectId::new()
}

#[rstest]
fn empty_input_still_yields_all_four_columns() {
    let tasks: Vec<Task> = Vec::new();
    let board = project(&tasks);

    let statuses: Vec<TaskStatus> = board.columns().iter().map(|column| column.id()).collect();
    assert_eq!(statuses, TaskStatus::ALL.to_vec());
    assert!(board.columns().iter().all(|column| column.is_empty()));
    assert_eq!(board.total_tasks(), 0);
}

#[rstest]
fn columns_carry_display_titles() {
    let board = project(std::iter::empty());
    let titles: Vec<&str> = board.columns().iter().map(|column| column.title()).collect();
    assert_eq!(titles, vec!["To Do", "In Progress", "Review", "Done"]);
}

#[rstest]
#[case(&[])]
#[case(&[TaskStatus::Todo])]
#[case(&[TaskStatus::Done, TaskStatus::Done, TaskStatus::Done])]
#[case(&[TaskStatus::Todo, TaskStatus::Review, TaskStatus::InProgress, TaskStatus::Todo, TaskStatus::Done])]
fn projection_partitions_tasks_exactly(
    project_id: ProjectId,
    #[case] statuses: &[TaskStatus],
) -> eyre::Result<()> {
    let tasks: Vec<Task> = statuses
        .iter()
        .enumerate()
        .map(|(n, status)| task_in(project_id, &format!("task {n}"), *status))
        .collect();

    let board = project(&tasks);

    eyre::ensure!(board.total_tasks() == tasks.len(), "task count changed");
    let mut seen = HashSet::new();
    for column in board.columns() {
        for task in column.tasks() {
            eyre::ensure!(task.status() == column.id(), "task in wrong column");
            eyre::ensure!(seen.insert(task.id()), "task {} appears twice", task.id());
        }
    }
    Ok(())
}

#[rstest]
fn projection_keeps_input_order_within_each_column(project_id: ProjectId) {
    let first = task_in(project_id, "first", TaskStatus::Review);
    let other = task_in(project_id, "other", TaskStatus::Todo);
    let second = task_in(project_id, "second", TaskStatus::Review);
    let tasks = vec![first.clone(), other, second.clone()];

    let board = project(&tasks);

    assert_eq!(
        board.column(TaskStatus::Review).task_ids(),
        ids(&[first, second])
    );
}

#[rstest]
fn projection_is_idempotent(project_id: ProjectId) {
    let tasks = vec![
        task_in(project_id, "a", TaskStatus::Todo),
        task_in(project_id, "b", TaskStatus::Done),
    ];
    assert_eq!(project(&tasks), project(&tasks));
}

#[rstest]
fn find_locates_task_by_column_and_index(project_id: ProjectId) {
    let a = task_in(project_id, "a", TaskStatus::InProgress);
    let b = task_in(project_id, "b", TaskStatus::InProgress);
    let board = project(&[a, b.clone()]);

    assert_eq!(board.find(b.id()), Some((TaskStatus::InProgress, 1)));
}
