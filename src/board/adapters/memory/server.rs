//! In-memory stand-in for the remote board authority.
//!
//! One [`InMemoryBoardServer`] plays the server every session talks to.
//! Each session connects through its own [`InMemoryChannel`], which carries
//! the caller's identity for membership checks. Accepted changes are pushed
//! to every subscriber, including the session that made them.

use async_trait::async_trait;
use mockable::DefaultClock;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::{Arc, Mutex, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tokio::sync::broadcast;
use tracing::debug;

use crate::board::{
    domain::{NewTask, ProjectId, Task, TaskId, UserId},
    ports::{
        RemoteEvent, RemoteEvents, StatusChangeRequest, SyncChannel, SyncChannelError, SyncResult,
    },
    services::BoardConfig,
};

/// Thread-safe in-memory board authority.
#[derive(Debug, Clone)]
pub struct InMemoryBoardServer {
    state: Arc<RwLock<ServerState>>,
    events: broadcast::Sender<RemoteEvent>,
    injected_failures: Arc<Mutex<VecDeque<SyncChannelError>>>,
}

#[derive(Debug, Default)]
struct ServerState {
    tasks: HashMap<TaskId, Task>,
    order: Vec<TaskId>,
    members: HashMap<ProjectId, HashSet<UserId>>,
}

impl ServerState {
    fn require_member(&self, project_id: ProjectId, user_id: UserId) -> SyncResult<()> {
        let members = self
            .members
            .get(&project_id)
            .ok_or(SyncChannelError::ProjectNotFound(project_id))?;
        if members.contains(&user_id) {
            Ok(())
        } else {
            Err(SyncChannelError::Forbidden(format!(
                "user {user_id} is not a member of project {project_id}"
            )))
        }
    }
}

impl Default for InMemoryBoardServer {
    fn default() -> Self {
        Self::new(&BoardConfig::default())
    }
}

impl InMemoryBoardServer {
    /// Creates an empty authority.
    #[must_use]
    pub fn new(config: &BoardConfig) -> Self {
        let (events, _) = broadcast::channel(config.event_buffer.max(1));
        Self {
            state: Arc::default(),
            events,
            injected_failures: Arc::default(),
        }
    }

    fn read(&self) -> SyncResult<RwLockReadGuard<'_, ServerState>> {
        self.state
            .read()
            .map_err(|err| SyncChannelError::transport(std::io::Error::other(err.to_string())))
    }

    fn write(&self) -> SyncResult<RwLockWriteGuard<'_, ServerState>> {
        self.state
            .write()
            .map_err(|err| SyncChannelError::transport(std::io::Error::other(err.to_string())))
    }

    fn publish(&self, event: RemoteEvent) {
        let task_id = event.task_id();
        match self.events.send(event) {
            Ok(receivers) => debug!(%task_id, receivers, "remote event published"),
            Err(_) => debug!(%task_id, "remote event published with no subscribers"),
        }
    }

    /// Registers a project, or adds a member to an existing one.
    ///
    /// # Errors
    ///
    /// Returns a transport error when the server lock is poisoned.
    pub fn add_member(&self, project_id: ProjectId, user_id: UserId) -> SyncResult<()> {
        self.write()?
            .members
            .entry(project_id)
            .or_default()
            .insert(user_id);
        Ok(())
    }

    /// Revokes a member's access to a project.
    ///
    /// Returns `true` when the user was a member.
    ///
    /// # Errors
    ///
    /// Returns a transport error when the server lock is poisoned.
    pub fn remove_member(&self, project_id: ProjectId, user_id: UserId) -> SyncResult<bool> {
        Ok(self
            .write()?
            .members
            .get_mut(&project_id)
            .is_some_and(|members| members.remove(&user_id)))
    }

    /// Creates a task and pushes it to every session.
    ///
    /// # Errors
    ///
    /// Returns [`SyncChannelError::ProjectNotFound`] or
    /// [`SyncChannelError::Forbidden`] when the creator cannot write to the
    /// project, and [`SyncChannelError::Rejected`] for a blank title.
    pub fn create_task(&self, request: NewTask) -> SyncResult<Task> {
        let task = Task::new(request, &DefaultClock)
            .map_err(|err| SyncChannelError::Rejected(err.to_string()))?;
        {
            let mut state = self.write()?;
            state.require_member(task.project_id(), task.created_by_id())?;
            state.order.push(task.id());
            state.tasks.insert(task.id(), task.clone());
        }
        self.publish(RemoteEvent::Upserted(task.clone()));
        Ok(task)
    }

    /// Replaces a task's fields as another client's edit would, and pushes
    /// the result.
    ///
    /// # Errors
    ///
    /// Returns [`SyncChannelError::TaskNotFound`] when the task is unknown.
    pub fn update_task(&self, task: Task) -> SyncResult<()> {
        {
            let mut state = self.write()?;
            let stored = state
                .tasks
                .get_mut(&task.id())
                .ok_or(SyncChannelError::TaskNotFound(task.id()))?;
            *stored = task.clone();
        }
        self.publish(RemoteEvent::Upserted(task));
        Ok(())
    }

    /// Deletes a task and pushes the removal.
    ///
    /// # Errors
    ///
    /// Returns [`SyncChannelError::TaskNotFound`] when the task is unknown.
    pub fn delete_task(&self, task_id: TaskId) -> SyncResult<Task> {
        let removed = {
            let mut state = self.write()?;
            let removed = state
                .tasks
                .remove(&task_id)
                .ok_or(SyncChannelError::TaskNotFound(task_id))?;
            state.order.retain(|id| *id != task_id);
            removed
        };
        self.publish(RemoteEvent::Removed(task_id));
        Ok(removed)
    }

    /// Returns the authority's copy of a task.
    ///
    /// # Errors
    ///
    /// Returns a transport error when the server lock is poisoned.
    pub fn task(&self, task_id: TaskId) -> SyncResult<Option<Task>> {
        Ok(self.read()?.tasks.get(&task_id).cloned())
    }

    /// Makes the next status-change request fail with `error`.
    ///
    /// Several injected failures are consumed in order.
    ///
    /// # Errors
    ///
    /// Returns a transport error when the failure queue lock is poisoned.
    pub fn fail_next_status_change(&self, error: SyncChannelError) -> SyncResult<()> {
        self.injected_failures
            .lock()
            .map_err(|err| SyncChannelError::transport(std::io::Error::other(err.to_string())))?
            .push_back(error);
        Ok(())
    }

    fn take_injected_failure(&self) -> SyncResult<Option<SyncChannelError>> {
        Ok(self
            .injected_failures
            .lock()
            .map_err(|err| SyncChannelError::transport(std::io::Error::other(err.to_string())))?
            .pop_front())
    }

    /// Opens a channel acting on behalf of `user_id`.
    #[must_use]
    pub fn connect(&self, user_id: UserId) -> InMemoryChannel {
        InMemoryChannel {
            server: self.clone(),
            user_id,
        }
    }
}

/// One session's connection to an [`InMemoryBoardServer`].
#[derive(Debug, Clone)]
pub struct InMemoryChannel {
    server: InMemoryBoardServer,
    user_id: UserId,
}

impl InMemoryChannel {
    /// Returns the user this channel acts for.
    #[must_use]
    pub const fn user_id(&self) -> UserId {
        self.user_id
    }
}

#[async_trait]
impl SyncChannel for InMemoryChannel {
    async fn fetch_tasks(&self, project_id: ProjectId) -> SyncResult<Vec<Task>> {
        let state = self.server.read()?;
        state.require_member(project_id, self.user_id)?;
        Ok(state
            .order
            .iter()
            .filter_map(|id| state.tasks.get(id))
            .filter(|task| task.project_id() == project_id)
            .cloned()
            .collect())
    }

    async fn change_status(&self, request: StatusChangeRequest) -> SyncResult<()> {
        if let Some(error) = self.server.take_injected_failure()? {
            return Err(error);
        }
        let updated = {
            let mut state = self.server.write()?;
            let project_id = state
                .tasks
                .get(&request.task_id)
                .map(Task::project_id)
                .ok_or(SyncChannelError::TaskNotFound(request.task_id))?;
            state.require_member(project_id, self.user_id)?;
            let task = state
                .tasks
                .get_mut(&request.task_id)
                .ok_or(SyncChannelError::TaskNotFound(request.task_id))?;
            if task.status() == request.new_status {
                return Ok(());
            }
            task.set_status(request.new_status, &DefaultClock);
            task.clone()
        };
        self.server.publish(RemoteEvent::Upserted(updated));
        Ok(())
    }

    fn subscribe(&self) -> RemoteEvents {
        RemoteEvents::new(self.server.events.subscribe())
    }
}
