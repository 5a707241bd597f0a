//! Shared fixtures for multi-session board tests.

use std::sync::Arc;

use mockable::DefaultClock;
use rstest::fixture;
use taskboard::board::{
    adapters::memory::{InMemoryBoardServer, InMemoryChannel},
    domain::{DragEvent, DragLocation, NewTask, ProjectId, Task, TaskStatus, UserId},
    services::{BoardConfig, BoardSession},
};

/// Session type used across the integration tests.
pub type Session = BoardSession<InMemoryChannel, DefaultClock>;

/// One project with two members and the tasks `[T1{TODO}, T2{TODO},
/// T3{IN_PROGRESS}]`.
pub struct Team {
    pub server: InMemoryBoardServer,
    pub project_id: ProjectId,
    pub alice: UserId,
    pub bob: UserId,
    pub t1: Task,
    pub t2: Task,
    pub t3: Task,
}

impl Team {
    /// Opens an unloaded session for `user_id`.
    #[must_use]
    pub fn session(&self, user_id: UserId) -> Session {
        BoardSession::new(
            self.project_id,
            Arc::new(self.server.connect(user_id)),
            Arc::new(DefaultClock),
            BoardConfig::impatient(),
        )
    }

    /// Opens and loads a session for `user_id`.
    ///
    /// # Errors
    ///
    /// Returns the load failure.
    pub async fn loaded_session(&self, user_id: UserId) -> eyre::Result<Session> {
        let session = self.session(user_id);
        session.load().await?;
        Ok(session)
    }
}

/// Provides a seeded team board.
///
/// # Panics
///
/// Panics if the seed tasks cannot be created.
#[fixture]
pub fn team() -> Team {
    let server = InMemoryBoardServer::new(&BoardConfig::impatient());
    let project_id = ProjectId::new();
    let alice = UserId::new();
    let bob = UserId::new();
    for member in [alice, bob] {
        server
            .add_member(project_id, member)
            .expect("register project member");
    }
    let seed = |title: &str, status: TaskStatus| {
        server
            .create_task(NewTask::new(project_id, alice, title).with_status(status))
            .expect("seed task")
    };
    let t1 = seed("T1", TaskStatus::Todo);
    let t2 = seed("T2", TaskStatus::Todo);
    let t3 = seed("T3", TaskStatus::InProgress);
    Team {
        server,
        project_id,
        alice,
        bob,
        t1,
        t2,
        t3,
    }
}

/// Builds a drag from `(column, index)` to `(column, index)`.
#[must_use]
pub const fn drag(
    task: &Task,
    from: (TaskStatus, usize),
    to: (TaskStatus, usize),
) -> DragEvent {
    DragEvent::new(
        task.id(),
        DragLocation::new(from.0, from.1),
        DragLocation::new(to.0, to.1),
    )
}
