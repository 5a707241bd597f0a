//! Cross-column moves: optimistic apply, authoritative request, then commit
//! or roll back.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use mockable::Clock;
use tracing::{info, instrument, warn};

use super::{
    BoardConfig, BoardError, BoardResult, RevertOutcome, StatusChange, TaskStore, TaskStoreResult,
};
use crate::board::{
    domain::{BoardDomainError, StatusTransition, TaskId, TaskStatus},
    ports::{StatusChangeRequest, SyncChannel, SyncChannelError},
};

/// A request to move a task into another column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MoveRequest {
    task_id: TaskId,
    from: TaskStatus,
    to: TaskStatus,
    destination_index: Option<usize>,
}

impl MoveRequest {
    /// Creates a move that lands at the bottom of the target column.
    #[must_use]
    pub const fn new(task_id: TaskId, from: TaskStatus, to: TaskStatus) -> Self {
        Self {
            task_id,
            from,
            to,
            destination_index: None,
        }
    }

    /// Places the task at `index` within the target column.
    ///
    /// Indices past the end of the column place it last.
    #[must_use]
    pub const fn at_index(mut self, index: usize) -> Self {
        self.destination_index = Some(index);
        self
    }

    /// Returns the task being moved.
    #[must_use]
    pub const fn task_id(&self) -> TaskId {
        self.task_id
    }
}

/// How a move ended.
#[derive(Debug, Clone)]
pub enum MoveResolution {
    /// The server accepted the move; the optimistic state is final.
    Committed(StatusTransition),
    /// The server refused the move and the store was reverted.
    RolledBack {
        /// The terminal transition record.
        transition: StatusTransition,
        /// Why the server refused.
        error: BoardError,
        /// What the revert did to the store.
        revert: RevertOutcome,
    },
}

impl MoveResolution {
    /// Returns the transition record.
    #[must_use]
    pub const fn transition(&self) -> &StatusTransition {
        match self {
            Self::Committed(transition) | Self::RolledBack { transition, .. } => transition,
        }
    }

    /// Returns `true` when the move was committed.
    #[must_use]
    pub const fn is_committed(&self) -> bool {
        matches!(self, Self::Committed(_))
    }
}

/// Drives cross-column moves against the task store and the channel.
///
/// At most one move per task is in flight at a time. A second move on the
/// same task is rejected with [`BoardError::TransitionPending`] until the
/// first resolves.
pub struct TransitionCoordinator<S, C>
where
    S: SyncChannel,
    C: Clock + Send + Sync,
{
    store: TaskStore,
    channel: Arc<S>,
    clock: Arc<C>,
    in_flight: Arc<Mutex<HashSet<TaskId>>>,
    request_timeout: Duration,
}

impl<S, C> Clone for TransitionCoordinator<S, C>
where
    S: SyncChannel,
    C: Clock + Send + Sync,
{
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            channel: Arc::clone(&self.channel),
            clock: Arc::clone(&self.clock),
            in_flight: Arc::clone(&self.in_flight),
            request_timeout: self.request_timeout,
        }
    }
}

impl<S, C> TransitionCoordinator<S, C>
where
    S: SyncChannel,
    C: Clock + Send + Sync,
{
    /// Creates a coordinator over a store and channel.
    #[must_use]
    pub fn new(store: TaskStore, channel: Arc<S>, clock: Arc<C>, config: &BoardConfig) -> Self {
        Self {
            store,
            channel,
            clock,
            in_flight: Arc::default(),
            request_timeout: config.request_timeout,
        }
    }

    /// Returns `true` while a move of `task_id` awaits the server.
    #[must_use]
    pub fn is_pending(&self, task_id: TaskId) -> bool {
        self.in_flight
            .lock()
            .is_ok_and(|in_flight| in_flight.contains(&task_id))
    }

    /// Moves a task to another column.
    ///
    /// The store changes immediately. Channel failures are recovered by
    /// rolling the store back and come back as
    /// [`MoveResolution::RolledBack`], not as `Err`.
    ///
    /// # Errors
    ///
    /// Returns [`BoardError::TransitionPending`] when the task already has a
    /// move in flight, [`BoardError::TaskNotFound`] for an unknown task, and
    /// [`BoardError::Validation`] when the task is not in `from` or `from`
    /// equals `to`. The store is untouched in all of these cases.
    #[instrument(skip(self), fields(task_id = %request.task_id))]
    pub async fn move_task(&self, request: MoveRequest) -> BoardResult<MoveResolution> {
        let task_id = request.task_id;
        let mut guard = PendingGuard::acquire(self.store.clone(), &self.in_flight, task_id)?;

        let task = self
            .store
            .get(task_id)?
            .ok_or(BoardError::TaskNotFound(task_id))?;
        if task.status() != request.from {
            return Err(BoardDomainError::SourceColumnMismatch {
                task_id,
                claimed: request.from,
                actual: task.status(),
            }
            .into());
        }
        if request.from == request.to {
            return Err(BoardDomainError::UnchangedStatus {
                task_id,
                status: request.to,
            }
            .into());
        }

        let mut transition = StatusTransition::new(task_id, request.from, request.to);
        transition.begin(self.clock.as_ref())?;
        guard.hold(
            self.store
                .apply_status_change(task_id, request.to, self.clock.as_ref())?,
        );
        if let Some(index) = request.destination_index {
            self.place(task_id, request.to, index)?;
        }

        match self.send(StatusChangeRequest::new(task_id, request.to)).await {
            Ok(()) => {
                guard.commit();
                transition.commit(self.clock.as_ref())?;
                info!(from = %request.from, to = %request.to, "status change committed");
                Ok(MoveResolution::Committed(transition))
            }
            Err(err) => {
                let revert = guard.roll_back()?;
                transition.roll_back(self.clock.as_ref())?;
                warn!(
                    from = %request.from,
                    to = %request.to,
                    error = %err,
                    ?revert,
                    "status change rejected; rolled back"
                );
                Ok(MoveResolution::RolledBack {
                    transition,
                    error: err.into(),
                    revert,
                })
            }
        }
    }

    async fn send(&self, request: StatusChangeRequest) -> Result<(), SyncChannelError> {
        tokio::time::timeout(self.request_timeout, self.channel.change_status(request))
            .await
            .map_err(|_| SyncChannelError::Timeout(self.request_timeout))?
    }

    /// Moves a freshly changed task from the bottom of its column to `index`.
    fn place(&self, task_id: TaskId, status: TaskStatus, index: usize) -> BoardResult<()> {
        let Some((_, current)) = self.store.position_in_column(task_id)? else {
            return Ok(());
        };
        let target = index.min(current);
        self.store.reorder_column(status, current, target)?;
        Ok(())
    }
}

/// Marks a task as in flight and reverts its optimistic change unless the
/// move is explicitly resolved.
struct PendingGuard {
    store: TaskStore,
    in_flight: Arc<Mutex<HashSet<TaskId>>>,
    task_id: TaskId,
    change: Option<StatusChange>,
}

impl PendingGuard {
    fn acquire(
        store: TaskStore,
        in_flight: &Arc<Mutex<HashSet<TaskId>>>,
        task_id: TaskId,
    ) -> BoardResult<Self> {
        let mut pending = in_flight
            .lock()
            .map_err(|err| BoardError::StoreUnavailable(err.to_string()))?;
        if !pending.insert(task_id) {
            return Err(BoardError::TransitionPending(task_id));
        }
        Ok(Self {
            store,
            in_flight: Arc::clone(in_flight),
            task_id,
            change: None,
        })
    }

    fn hold(&mut self, change: StatusChange) {
        self.change = Some(change);
    }

    fn commit(&mut self) {
        self.change = None;
    }

    fn roll_back(&mut self) -> TaskStoreResult<RevertOutcome> {
        match self.change.take() {
            Some(change) => self.store.revert_status_change(&change),
            None => Ok(RevertOutcome::Missing),
        }
    }
}

impl Drop for PendingGuard {
    fn drop(&mut self) {
        if self.change.is_some() {
            match self.roll_back() {
                Ok(revert) => warn!(task_id = %self.task_id, ?revert, "unresolved move rolled back"),
                Err(err) => warn!(task_id = %self.task_id, error = %err, "unresolved move left applied"),
            }
        }
        if let Ok(mut pending) = self.in_flight.lock() {
            pending.remove(&self.task_id);
        }
    }
}
