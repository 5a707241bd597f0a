//! One client's view of a project board.
//!
//! A session owns the task store for a project, routes drag gestures to the
//! reorder engine or the transition coordinator, applies pushed remote
//! events, and keeps a bounded queue of non-blocking failure notices.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, RwLock};

use chrono::{DateTime, Utc};
use mockable::Clock;
use tracing::{debug, info, instrument, warn};

use super::{
    BoardConfig, BoardError, BoardResult, MoveRequest, MoveResolution, TaskStore,
    TransitionCoordinator,
};
use crate::board::{
    domain::{Board, BoardDomainError, DragEvent, ProjectId, StatusTransition, TaskId},
    ports::{Delivery, RemoteEvent, RemoteEvents, SyncChannel},
};

/// Whether the board can be rendered.
#[derive(Debug, Clone)]
pub enum LoadState {
    /// No fetch has been attempted.
    NotLoaded,
    /// The initial fetch is in flight.
    Loading,
    /// The board holds a complete task set.
    Ready,
    /// The last fetch failed; call [`BoardSession::retry_load`].
    Failed(BoardError),
}

impl LoadState {
    /// Returns `true` when the board can be rendered.
    #[must_use]
    pub const fn is_ready(&self) -> bool {
        matches!(self, Self::Ready)
    }
}

/// Non-blocking report of a move the server refused.
#[derive(Debug, Clone)]
pub struct BoardNotice {
    /// Task whose move was reverted.
    pub task_id: TaskId,
    /// Why the server refused.
    pub error: BoardError,
    /// When the rollback happened.
    pub raised_at: DateTime<Utc>,
}

/// Result of handling a drag gesture.
#[derive(Debug, Clone)]
pub enum DragOutcome {
    /// The drop landed outside the board or on its own slot.
    Ignored,
    /// The task moved within its column.
    Reordered,
    /// The task moved column and the server agreed.
    Committed(StatusTransition),
    /// The task moved column, the server refused, and the move was undone.
    RolledBack {
        /// The terminal transition record.
        transition: StatusTransition,
        /// Why the server refused.
        error: BoardError,
    },
}

/// Summary of a batch of applied remote events.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RemoteSync {
    /// Events applied to the store.
    pub applied: usize,
    /// Whether the session fell behind and reloaded the board.
    pub reloaded: bool,
}

/// The session's push subscription.
///
/// `generation` changes on every load, so a listener still holding the
/// receiver from an earlier load drops it instead of handing it back.
#[derive(Debug, Default)]
struct EventSlot {
    generation: u64,
    stream: Option<RemoteEvents>,
}

/// Receiver taken out of the session while a listener waits on it.
///
/// Dropping it, including when the listener's future is cancelled, returns
/// the receiver unless a reload installed a newer one in the meantime.
struct CheckedOut<'a> {
    slot: &'a Mutex<EventSlot>,
    generation: u64,
    stream: Option<RemoteEvents>,
}

impl CheckedOut<'_> {
    async fn recv(&mut self) -> Option<Delivery> {
        let stream = self.stream.as_mut()?;
        stream.recv().await
    }
}

impl Drop for CheckedOut<'_> {
    fn drop(&mut self) {
        let Ok(mut slot) = self.slot.lock() else {
            return;
        };
        if slot.generation == self.generation && slot.stream.is_none() {
            slot.stream = self.stream.take();
        }
    }
}

/// A single client's board for one project.
pub struct BoardSession<S, C>
where
    S: SyncChannel,
    C: Clock + Send + Sync,
{
    project_id: ProjectId,
    store: TaskStore,
    channel: Arc<S>,
    clock: Arc<C>,
    coordinator: TransitionCoordinator<S, C>,
    config: BoardConfig,
    load_state: RwLock<LoadState>,
    events: Mutex<EventSlot>,
    notices: Mutex<VecDeque<BoardNotice>>,
}

impl<S, C> BoardSession<S, C>
where
    S: SyncChannel,
    C: Clock + Send + Sync,
{
    /// Creates an unloaded session for `project_id`.
    #[must_use]
    pub fn new(project_id: ProjectId, channel: Arc<S>, clock: Arc<C>, config: BoardConfig) -> Self {
        let store = TaskStore::new();
        let coordinator = TransitionCoordinator::new(
            store.clone(),
            Arc::clone(&channel),
            Arc::clone(&clock),
            &config,
        );
        Self {
            project_id,
            store,
            channel,
            clock,
            coordinator,
            config,
            load_state: RwLock::new(LoadState::NotLoaded),
            events: Mutex::default(),
            notices: Mutex::new(VecDeque::new()),
        }
    }

    /// Returns the project this session shows.
    #[must_use]
    pub const fn project_id(&self) -> ProjectId {
        self.project_id
    }

    /// Returns a handle to the session's task store.
    #[must_use]
    pub const fn store(&self) -> &TaskStore {
        &self.store
    }

    /// Returns the session's transition coordinator.
    #[must_use]
    pub const fn coordinator(&self) -> &TransitionCoordinator<S, C> {
        &self.coordinator
    }

    /// Returns the current load state.
    ///
    /// # Errors
    ///
    /// Returns [`BoardError::StoreUnavailable`] when the state lock is
    /// poisoned.
    pub fn load_state(&self) -> BoardResult<LoadState> {
        self.load_state
            .read()
            .map(|state| state.clone())
            .map_err(|err| BoardError::StoreUnavailable(err.to_string()))
    }

    fn set_load_state(&self, next: LoadState) -> BoardResult<()> {
        let mut state = self
            .load_state
            .write()
            .map_err(|err| BoardError::StoreUnavailable(err.to_string()))?;
        *state = next;
        Ok(())
    }

    fn lock_events(&self) -> BoardResult<MutexGuard<'_, EventSlot>> {
        self.events
            .lock()
            .map_err(|err| BoardError::StoreUnavailable(err.to_string()))
    }

    fn ensure_ready(&self) -> BoardResult<()> {
        if self.load_state()?.is_ready() {
            Ok(())
        } else {
            Err(BoardError::NotLoaded)
        }
    }

    /// Subscribes to remote events and fetches the full task list.
    ///
    /// The subscription is opened first so nothing pushed during the fetch is
    /// lost. It replaces any earlier one, even while a listener is waiting on
    /// that. On failure the board stays unrendered in [`LoadState::Failed`].
    ///
    /// # Errors
    ///
    /// Returns the fetch failure mapped to [`BoardError`].
    #[instrument(skip(self), fields(project_id = %self.project_id))]
    pub async fn load(&self) -> BoardResult<()> {
        self.set_load_state(LoadState::Loading)?;
        {
            let mut events = self.lock_events()?;
            events.generation += 1;
            events.stream = Some(self.channel.subscribe());
        }

        match self.channel.fetch_tasks(self.project_id).await {
            Ok(tasks) => {
                let count = tasks.len();
                self.store.load(tasks)?;
                self.set_load_state(LoadState::Ready)?;
                info!(tasks = count, "board loaded");
                Ok(())
            }
            Err(err) => {
                let error = BoardError::from(err);
                warn!(error = %error, "board load failed");
                self.set_load_state(LoadState::Failed(error.clone()))?;
                Err(error)
            }
        }
    }

    /// Re-issues the initial fetch after a failure.
    ///
    /// # Errors
    ///
    /// Returns the fetch failure mapped to [`BoardError`].
    pub async fn retry_load(&self) -> BoardResult<()> {
        debug!(project_id = %self.project_id, "retrying board load");
        self.load().await
    }

    /// Returns the current four-column projection.
    ///
    /// # Errors
    ///
    /// Returns [`BoardError::NotLoaded`] unless the board loaded
    /// successfully.
    pub fn columns(&self) -> BoardResult<Arc<Board>> {
        self.ensure_ready()?;
        Ok(self.store.columns()?)
    }

    /// Handles the end of a drag gesture.
    ///
    /// Drops inside one column reorder locally. Drops across columns go
    /// through the transition coordinator; a refused move is undone and
    /// queued as a [`BoardNotice`].
    ///
    /// # Errors
    ///
    /// Returns [`BoardError::NotLoaded`] before a successful load,
    /// [`BoardError::Validation`] when the event does not match the board,
    /// and the coordinator's errors for rejected moves.
    pub async fn handle_drag(&self, event: DragEvent) -> BoardResult<DragOutcome> {
        self.ensure_ready()?;
        let Some(destination) = event.destination else {
            debug!(task_id = %event.task_id, "drop outside the board ignored");
            return Ok(DragOutcome::Ignored);
        };
        self.check_source(&event)?;

        if !event.crosses_columns() {
            if destination.index == event.source.index {
                return Ok(DragOutcome::Ignored);
            }
            self.store
                .reorder_column(event.source.column, event.source.index, destination.index)?;
            debug!(
                task_id = %event.task_id,
                column = %destination.column,
                from = event.source.index,
                to = destination.index,
                "task reordered"
            );
            return Ok(DragOutcome::Reordered);
        }

        let request = MoveRequest::new(event.task_id, event.source.column, destination.column)
            .at_index(destination.index);
        match self.coordinator.move_task(request).await? {
            MoveResolution::Committed(transition) => Ok(DragOutcome::Committed(transition)),
            MoveResolution::RolledBack {
                transition, error, ..
            } => {
                self.push_notice(event.task_id, error.clone())?;
                Ok(DragOutcome::RolledBack { transition, error })
            }
        }
    }

    /// Verifies the drag started where the store says the task is.
    fn check_source(&self, event: &DragEvent) -> BoardResult<()> {
        let (column, index) = self
            .store
            .position_in_column(event.task_id)?
            .ok_or(BoardError::TaskNotFound(event.task_id))?;
        if column != event.source.column {
            return Err(BoardDomainError::SourceColumnMismatch {
                task_id: event.task_id,
                claimed: event.source.column,
                actual: column,
            }
            .into());
        }
        if index != event.source.index {
            return Err(BoardDomainError::StaleSourceIndex {
                task_id: event.task_id,
                claimed: event.source.index,
                actual: index,
            }
            .into());
        }
        Ok(())
    }

    fn push_notice(&self, task_id: TaskId, error: BoardError) -> BoardResult<()> {
        if self.config.max_notices == 0 {
            debug!(%task_id, "failure notices disabled");
            return Ok(());
        }
        let mut notices = self
            .notices
            .lock()
            .map_err(|err| BoardError::StoreUnavailable(err.to_string()))?;
        while notices.len() >= self.config.max_notices {
            notices.pop_front();
        }
        notices.push_back(BoardNotice {
            task_id,
            error,
            raised_at: self.clock.utc(),
        });
        Ok(())
    }

    /// Removes and returns every queued failure notice, oldest first.
    ///
    /// # Errors
    ///
    /// Returns [`BoardError::StoreUnavailable`] when the notice lock is
    /// poisoned.
    pub fn take_notices(&self) -> BoardResult<Vec<BoardNotice>> {
        let mut notices = self
            .notices
            .lock()
            .map_err(|err| BoardError::StoreUnavailable(err.to_string()))?;
        Ok(notices.drain(..).collect())
    }

    /// Applies one remote event to the store.
    ///
    /// Events for other projects are ignored, except that a task this board
    /// holds which now belongs elsewhere is dropped from it. Returns `true`
    /// when the store changed.
    ///
    /// # Errors
    ///
    /// Returns [`BoardError::StoreUnavailable`] when the store lock is
    /// poisoned.
    pub fn apply_remote_event(&self, event: RemoteEvent) -> BoardResult<bool> {
        match event {
            RemoteEvent::Upserted(task) => {
                if task.project_id() != self.project_id {
                    let task_id = task.id();
                    let removed = self.store.remove_from_remote(task_id)?;
                    if removed.is_some() {
                        debug!(%task_id, project_id = %task.project_id(), "task left the project");
                    }
                    return Ok(removed.is_some());
                }
                let task_id = task.id();
                let outcome = self.store.upsert_from_remote(task)?;
                debug!(%task_id, ?outcome, "remote upsert");
                Ok(true)
            }
            RemoteEvent::Removed(task_id) => {
                let removed = self.store.remove_from_remote(task_id)?;
                debug!(%task_id, removed = removed.is_some(), "remote removal");
                Ok(removed.is_some())
            }
        }
    }

    /// Applies every remote event already delivered, without waiting.
    ///
    /// A session that fell behind the push stream reloads the board instead
    /// of applying a partial history. While [`Self::next_remote_event`] is
    /// waiting, that listener owns the stream and this returns an empty sync.
    ///
    /// # Errors
    ///
    /// Returns [`BoardError::NotLoaded`] before a load, or the reload failure.
    pub async fn drain_remote_events(&self) -> BoardResult<RemoteSync> {
        let mut sync = RemoteSync::default();
        let mut lagged = None;
        {
            let mut events = self.lock_events()?;
            let Some(stream) = events.stream.as_mut() else {
                self.ensure_ready()?;
                debug!("remote events are being consumed by a listener");
                return Ok(sync);
            };
            while let Some(delivery) = stream.try_recv() {
                match delivery {
                    Delivery::Event(event) => {
                        if self.apply_remote_event(event)? {
                            sync.applied += 1;
                        }
                    }
                    Delivery::Lagged(missed) => {
                        lagged = Some(missed);
                        break;
                    }
                }
            }
        }
        if let Some(missed) = lagged {
            warn!(missed, "remote event stream lagged; reloading board");
            self.load().await?;
            sync.reloaded = true;
        }
        Ok(sync)
    }

    /// Waits for the next remote event and applies it.
    ///
    /// Returns `None` once the authority closes the stream, and also after a
    /// lag forced a full reload. The receiver is taken out of the session for
    /// the wait, so loads and drains proceed while a listener is parked here.
    ///
    /// # Errors
    ///
    /// Returns [`BoardError::NotLoaded`] before a load,
    /// [`BoardError::ListenerBusy`] while another call is already waiting, or
    /// the reload failure after a lag.
    pub async fn next_remote_event(&self) -> BoardResult<Option<RemoteEvent>> {
        let mut checked_out = self.check_out_events()?;
        let delivery = checked_out.recv().await;
        drop(checked_out);
        match delivery {
            Some(Delivery::Event(event)) => {
                self.apply_remote_event(event.clone())?;
                Ok(Some(event))
            }
            Some(Delivery::Lagged(missed)) => {
                warn!(missed, "remote event stream lagged; reloading board");
                self.load().await?;
                Ok(None)
            }
            None => Ok(None),
        }
    }

    fn check_out_events(&self) -> BoardResult<CheckedOut<'_>> {
        let mut events = self.lock_events()?;
        let Some(stream) = events.stream.take() else {
            return Err(if self.load_state()?.is_ready() {
                BoardError::ListenerBusy
            } else {
                BoardError::NotLoaded
            });
        };
        Ok(CheckedOut {
            slot: &self.events,
            generation: events.generation,
            stream: Some(stream),
        })
    }
}
