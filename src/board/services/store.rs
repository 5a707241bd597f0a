//! Authoritative in-memory task set for one board session.
//!
//! The store owns every task and the board order: a single sequence of task
//! identifiers from which each column's order is read by filtering on status.
//! All producers of change (local reorders, optimistic status changes, remote
//! events) go through the same lock, so the four-column partition always
//! holds. The column projection is memoized and discarded on every mutation.

use crate::board::domain::{
    Board, BoardDomainError, Task, TaskId, TaskStatus, project, reorder_in_place,
};
use chrono::{DateTime, Utc};
use mockable::Clock;
use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use thiserror::Error;
use tracing::debug;

/// Result type for task store operations.
pub type TaskStoreResult<T> = Result<T, TaskStoreError>;

/// Errors returned by [`TaskStore`] operations.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TaskStoreError {
    /// The task is not in the store.
    #[error("task not found: {0}")]
    TaskNotFound(TaskId),

    /// A reorder or status change was malformed.
    #[error(transparent)]
    Validation(#[from] BoardDomainError),

    /// A writer panicked while holding the store lock.
    #[error("task store lock poisoned: {0}")]
    Poisoned(String),
}

/// Receipt for an optimistic status change, used to undo it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusChange {
    task_id: TaskId,
    previous_status: TaskStatus,
    previous_updated_at: DateTime<Utc>,
    previous_position: usize,
    previous_index: usize,
    previous_neighbours: (Option<TaskId>, Option<TaskId>),
    applied_status: TaskStatus,
}

impl StatusChange {
    /// Returns the task that changed.
    #[must_use]
    pub const fn task_id(&self) -> TaskId {
        self.task_id
    }

    /// Returns the status the task had before the change.
    #[must_use]
    pub const fn previous_status(&self) -> TaskStatus {
        self.previous_status
    }

    /// Returns the status the change applied.
    #[must_use]
    pub const fn applied_status(&self) -> TaskStatus {
        self.applied_status
    }

    /// Returns the task's board-order position before the change.
    #[must_use]
    pub const fn previous_position(&self) -> usize {
        self.previous_position
    }

    /// Returns the task's index within its previous column.
    #[must_use]
    pub const fn previous_index(&self) -> usize {
        self.previous_index
    }

    /// Returns the tasks directly above and below it in its previous column.
    #[must_use]
    pub const fn previous_neighbours(&self) -> (Option<TaskId>, Option<TaskId>) {
        self.previous_neighbours
    }
}

/// What [`TaskStore::revert_status_change`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevertOutcome {
    /// The task is back in its previous column and position.
    Reverted,
    /// A later write changed the task's status, so it was left alone.
    Superseded,
    /// The task was removed in the meantime.
    Missing,
}

/// What [`TaskStore::upsert_from_remote`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    /// The task was new and was appended to the board order.
    Inserted,
    /// An existing task's fields were replaced in place.
    Replaced,
}

/// Shared handle to a board's task set.
///
/// Cloning the handle shares the underlying state.
#[derive(Debug, Clone, Default)]
pub struct TaskStore {
    state: Arc<RwLock<StoreState>>,
}

#[derive(Debug, Default)]
struct StoreState {
    tasks: HashMap<TaskId, Task>,
    order: Vec<TaskId>,
    revision: u64,
    projection: Option<Arc<Board>>,
}

impl StoreState {
    fn touch(&mut self) {
        self.revision += 1;
        self.projection = None;
    }

    fn position(&self, task_id: TaskId) -> Option<usize> {
        self.order.iter().position(|id| *id == task_id)
    }

    fn ordered_tasks(&self) -> impl Iterator<Item = &Task> {
        self.order.iter().filter_map(|id| self.tasks.get(id))
    }

    fn in_column(&self, task_id: TaskId, status: TaskStatus) -> bool {
        self.tasks
            .get(&task_id)
            .is_some_and(|task| task.status() == status)
    }

    fn column_ids(&self, status: TaskStatus) -> Vec<TaskId> {
        self.ordered_tasks()
            .filter(|task| task.status() == status)
            .map(Task::id)
            .collect()
    }

    /// Board-order slot that puts a reverted task back among its old
    /// neighbours. The task must already be out of `order`.
    ///
    /// Surviving neighbours win over the recorded indices, which only hold
    /// while nothing else touched the column.
    fn restore_slot(&self, change: &StatusChange) -> usize {
        let status = change.previous_status;
        let (above, below) = change.previous_neighbours;
        above
            .filter(|id| self.in_column(*id, status))
            .and_then(|id| self.position(id))
            .map(|slot| slot + 1)
            .or_else(|| {
                below
                    .filter(|id| self.in_column(*id, status))
                    .and_then(|id| self.position(id))
            })
            .unwrap_or_else(|| self.column_slot(change))
    }

    fn column_slot(&self, change: &StatusChange) -> usize {
        let slots: Vec<usize> = self
            .order
            .iter()
            .enumerate()
            .filter(|(_, id)| self.in_column(**id, change.previous_status))
            .map(|(slot, _)| slot)
            .collect();
        slots
            .get(change.previous_index)
            .copied()
            .or_else(|| slots.last().map(|last| last + 1))
            .unwrap_or_else(|| change.previous_position.min(self.order.len()))
    }
}

impl TaskStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> TaskStoreResult<RwLockReadGuard<'_, StoreState>> {
        self.state
            .read()
            .map_err(|err| TaskStoreError::Poisoned(err.to_string()))
    }

    fn write(&self) -> TaskStoreResult<RwLockWriteGuard<'_, StoreState>> {
        self.state
            .write()
            .map_err(|err| TaskStoreError::Poisoned(err.to_string()))
    }

    /// Replaces the whole task set. The given order becomes the board order.
    ///
    /// A task identifier repeated in `tasks` keeps its first position and the
    /// last value.
    ///
    /// # Errors
    ///
    /// Returns [`TaskStoreError::Poisoned`] when the lock is poisoned.
    pub fn load(&self, tasks: impl IntoIterator<Item = Task>) -> TaskStoreResult<()> {
        let mut state = self.write()?;
        state.tasks.clear();
        state.order.clear();
        for task in tasks {
            let task_id = task.id();
            if state.tasks.insert(task_id, task).is_none() {
                state.order.push(task_id);
            }
        }
        state.touch();
        debug!(tasks = state.order.len(), "task store loaded");
        Ok(())
    }

    /// Changes a task's status and moves it to the bottom of its new column.
    ///
    /// # Errors
    ///
    /// Returns [`TaskStoreError::TaskNotFound`] for an unknown task and
    /// [`BoardDomainError::UnchangedStatus`] when the task already has
    /// `new_status`.
    pub fn apply_status_change(
        &self,
        task_id: TaskId,
        new_status: TaskStatus,
        clock: &impl Clock,
    ) -> TaskStoreResult<StatusChange> {
        let mut state = self.write()?;
        let previous_position = state
            .position(task_id)
            .ok_or(TaskStoreError::TaskNotFound(task_id))?;
        let previous_status = state
            .tasks
            .get(&task_id)
            .map(Task::status)
            .ok_or(TaskStoreError::TaskNotFound(task_id))?;
        if previous_status == new_status {
            return Err(BoardDomainError::UnchangedStatus {
                task_id,
                status: new_status,
            }
            .into());
        }
        let column = state.column_ids(previous_status);
        let previous_index = column
            .iter()
            .position(|id| *id == task_id)
            .ok_or(TaskStoreError::TaskNotFound(task_id))?;
        let above = previous_index
            .checked_sub(1)
            .and_then(|index| column.get(index))
            .copied();
        let below = column.get(previous_index + 1).copied();

        let task = state
            .tasks
            .get_mut(&task_id)
            .ok_or(TaskStoreError::TaskNotFound(task_id))?;
        let previous_updated_at = task.updated_at();
        task.set_status(new_status, clock);

        state.order.remove(previous_position);
        state.order.push(task_id);
        state.touch();
        debug!(%task_id, from = %previous_status, to = %new_status, "status applied");

        Ok(StatusChange {
            task_id,
            previous_status,
            previous_updated_at,
            previous_position,
            previous_index,
            previous_neighbours: (above, below),
            applied_status: new_status,
        })
    }

    /// Undoes an optimistic status change.
    ///
    /// The task regains its previous status and timestamp unless something
    /// else has changed its status since, in which case the later write wins.
    /// It goes back next to whichever of its old column neighbours is still
    /// there, so remote inserts, removals and reorders that landed while the
    /// move was pending do not shift it within the column.
    ///
    /// # Errors
    ///
    /// Returns [`TaskStoreError::Poisoned`] when the lock is poisoned.
    pub fn revert_status_change(&self, change: &StatusChange) -> TaskStoreResult<RevertOutcome> {
        let mut state = self.write()?;
        let Some(task) = state.tasks.get_mut(&change.task_id) else {
            return Ok(RevertOutcome::Missing);
        };
        if task.status() != change.applied_status {
            return Ok(RevertOutcome::Superseded);
        }
        task.restore_status(change.previous_status, change.previous_updated_at);

        if let Some(current) = state.position(change.task_id) {
            state.order.remove(current);
        }
        let position = state.restore_slot(change);
        state.order.insert(position, change.task_id);
        state.touch();
        debug!(task_id = %change.task_id, status = %change.previous_status, "status reverted");
        Ok(RevertOutcome::Reverted)
    }

    /// Inserts or replaces a task pushed by the authority.
    ///
    /// Replacement keeps the task's board position; insertion appends.
    ///
    /// # Errors
    ///
    /// Returns [`TaskStoreError::Poisoned`] when the lock is poisoned.
    pub fn upsert_from_remote(&self, task: Task) -> TaskStoreResult<UpsertOutcome> {
        let mut state = self.write()?;
        let task_id = task.id();
        let outcome = if state.tasks.insert(task_id, task).is_some() {
            UpsertOutcome::Replaced
        } else {
            state.order.push(task_id);
            UpsertOutcome::Inserted
        };
        state.touch();
        debug!(%task_id, ?outcome, "remote upsert applied");
        Ok(outcome)
    }

    /// Removes a task deleted by the authority.
    ///
    /// Returns the removed task, or `None` when it was not present.
    ///
    /// # Errors
    ///
    /// Returns [`TaskStoreError::Poisoned`] when the lock is poisoned.
    pub fn remove_from_remote(&self, task_id: TaskId) -> TaskStoreResult<Option<Task>> {
        let mut state = self.write()?;
        let removed = state.tasks.remove(&task_id);
        if removed.is_some() {
            state.order.retain(|id| *id != task_id);
            state.touch();
            debug!(%task_id, "remote removal applied");
        }
        Ok(removed)
    }

    /// Moves the task at `from` to `to` within one column.
    ///
    /// Only the board-order slots the column already occupies are rewritten,
    /// so every other column keeps its order.
    ///
    /// # Errors
    ///
    /// Returns [`BoardDomainError::IndexOutOfRange`] when an index falls
    /// outside the column.
    pub fn reorder_column(&self, status: TaskStatus, from: usize, to: usize) -> TaskStoreResult<()> {
        let mut state = self.write()?;
        let (slots, mut column): (Vec<usize>, Vec<TaskId>) = state
            .order
            .iter()
            .enumerate()
            .filter(|(_, id)| {
                state
                    .tasks
                    .get(*id)
                    .is_some_and(|task| task.status() == status)
            })
            .map(|(slot, id)| (slot, *id))
            .unzip();
        reorder_in_place(&mut column, from, to)?;
        if from == to {
            return Ok(());
        }
        for (slot, task_id) in slots.into_iter().zip(column) {
            if let Some(entry) = state.order.get_mut(slot) {
                *entry = task_id;
            }
        }
        state.touch();
        debug!(%status, from, to, "column reordered");
        Ok(())
    }

    /// Returns a copy of a task.
    ///
    /// # Errors
    ///
    /// Returns [`TaskStoreError::Poisoned`] when the lock is poisoned.
    pub fn get(&self, task_id: TaskId) -> TaskStoreResult<Option<Task>> {
        Ok(self.read()?.tasks.get(&task_id).cloned())
    }

    /// Returns every task in board order.
    ///
    /// # Errors
    ///
    /// Returns [`TaskStoreError::Poisoned`] when the lock is poisoned.
    pub fn tasks(&self) -> TaskStoreResult<Vec<Task>> {
        Ok(self.read()?.ordered_tasks().cloned().collect())
    }

    /// Returns the number of tasks.
    ///
    /// # Errors
    ///
    /// Returns [`TaskStoreError::Poisoned`] when the lock is poisoned.
    pub fn len(&self) -> TaskStoreResult<usize> {
        Ok(self.read()?.order.len())
    }

    /// Returns `true` when the store holds no tasks.
    ///
    /// # Errors
    ///
    /// Returns [`TaskStoreError::Poisoned`] when the lock is poisoned.
    pub fn is_empty(&self) -> TaskStoreResult<bool> {
        Ok(self.read()?.order.is_empty())
    }

    /// Returns the mutation counter. Every successful mutation bumps it.
    ///
    /// # Errors
    ///
    /// Returns [`TaskStoreError::Poisoned`] when the lock is poisoned.
    pub fn revision(&self) -> TaskStoreResult<u64> {
        Ok(self.read()?.revision)
    }

    /// Returns the task's column and index within it.
    ///
    /// # Errors
    ///
    /// Returns [`TaskStoreError::Poisoned`] when the lock is poisoned.
    pub fn position_in_column(&self, task_id: TaskId) -> TaskStoreResult<Option<(TaskStatus, usize)>> {
        let state = self.read()?;
        let Some(status) = state.tasks.get(&task_id).map(Task::status) else {
            return Ok(None);
        };
        let index = state
            .ordered_tasks()
            .filter(|task| task.status() == status)
            .position(|task| task.id() == task_id);
        Ok(index.map(|found| (status, found)))
    }

    /// Returns the current four-column projection.
    ///
    /// The projection is computed on first read after a mutation and shared
    /// until the next one.
    ///
    /// # Errors
    ///
    /// Returns [`TaskStoreError::Poisoned`] when the lock is poisoned.
    pub fn columns(&self) -> TaskStoreResult<Arc<Board>> {
        if let Some(board) = self.read()?.projection.clone() {
            return Ok(board);
        }
        let mut state = self.write()?;
        if let Some(board) = state.projection.clone() {
            return Ok(board);
        }
        let board = Arc::new(project(state.ordered_tasks()));
        state.projection = Some(Arc::clone(&board));
        Ok(board)
    }
}
