//! Shared world state for board move BDD scenarios.

use std::collections::HashMap;
use std::sync::Arc;

use mockable::DefaultClock;
use rstest::fixture;
use taskboard::board::{
    adapters::memory::{InMemoryBoardServer, InMemoryChannel},
    domain::{ProjectId, Task, TaskStatus, UserId},
    services::{BoardConfig, BoardResult, BoardSession, DragOutcome},
};

/// Session type used by the BDD world.
pub type TestSession = BoardSession<InMemoryChannel, DefaultClock>;

/// Scenario world for board move behaviour tests.
pub struct BoardWorld {
    pub server: InMemoryBoardServer,
    pub project_id: ProjectId,
    pub user_id: UserId,
    pub session: Option<TestSession>,
    pub tasks: HashMap<String, Task>,
    pub last_outcome: Option<BoardResult<DragOutcome>>,
}

impl BoardWorld {
    /// Creates a world with one project and one member.
    ///
    /// # Panics
    ///
    /// Panics if the member cannot be registered.
    #[must_use]
    pub fn new() -> Self {
        let server = InMemoryBoardServer::new(&BoardConfig::impatient());
        let project_id = ProjectId::new();
        let user_id = UserId::new();
        server
            .add_member(project_id, user_id)
            .expect("register scenario member");
        Self {
            server,
            project_id,
            user_id,
            session: None,
            tasks: HashMap::new(),
            last_outcome: None,
        }
    }

    /// Returns the loaded session.
    ///
    /// # Errors
    ///
    /// Returns an error when no board has been loaded yet.
    pub fn session(&self) -> eyre::Result<&TestSession> {
        self.session
            .as_ref()
            .ok_or_else(|| eyre::eyre!("board has not been loaded in this scenario"))
    }

    /// Returns a task created earlier in the scenario.
    ///
    /// # Errors
    ///
    /// Returns an error for an unknown title.
    pub fn task(&self, title: &str) -> eyre::Result<&Task> {
        self.tasks
            .get(title)
            .ok_or_else(|| eyre::eyre!("no task titled {title} in scenario world"))
    }

    /// Opens a session for the scenario member.
    #[must_use]
    pub fn open_session(&self) -> TestSession {
        BoardSession::new(
            self.project_id,
            Arc::new(self.server.connect(self.user_id)),
            Arc::new(DefaultClock),
            BoardConfig::impatient(),
        )
    }
}

impl Default for BoardWorld {
    fn default() -> Self {
        Self::new()
    }
}

/// Fixture that creates a new scenario world.
#[fixture]
pub fn world() -> BoardWorld {
    BoardWorld::default()
}

/// Parses a status name used in scenario text.
///
/// # Errors
///
/// Returns an error for an unknown status.
pub fn status(name: &str) -> eyre::Result<TaskStatus> {
    TaskStatus::try_from(name).map_err(|err| eyre::eyre!("invalid status in scenario: {err}"))
}

/// Splits a comma-separated title list.
#[must_use]
pub fn titles(list: &str) -> Vec<String> {
    list.split(',')
        .map(str::trim)
        .filter(|title| !title.is_empty())
        .map(str::to_owned)
        .collect()
}

/// Runs an async operation within sync step definitions.
pub fn run_async<T>(future: impl std::future::Future<Output = T>) -> T {
    tokio::task::block_in_place(|| tokio::runtime::Handle::current().block_on(future))
}
