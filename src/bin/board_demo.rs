//! Runs two board sessions against the in-memory authority and logs what
//! each one sees.
//!
//! Usage:
//!
//! ```text
//! RUST_LOG=taskboard=debug board_demo
//! ```
//!
//! The walkthrough reorders a column locally, commits a cross-column move
//! that propagates to the second session, and finally has the server refuse
//! a move so the rollback and the resulting notice show up in the log.

use std::error::Error;
use std::sync::Arc;

use mockable::DefaultClock;
use taskboard::board::{
    adapters::memory::{InMemoryBoardServer, InMemoryChannel},
    domain::{DragEvent, DragLocation, NewTask, ProjectId, Task, TaskStatus, UserId},
    ports::SyncChannelError,
    services::{BoardConfig, BoardSession, DragOutcome},
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

type DemoResult<T> = Result<T, Box<dyn Error + Send + Sync>>;
type Session = BoardSession<InMemoryChannel, DefaultClock>;

#[tokio::main]
async fn main() -> DemoResult<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = BoardConfig::default();
    let server = InMemoryBoardServer::new(&config);
    let project_id = ProjectId::new();
    let alice = UserId::new();
    let bob = UserId::new();
    server.add_member(project_id, alice)?;
    server.add_member(project_id, bob)?;

    let seeded = [
        ("Write release notes", TaskStatus::Todo),
        ("Fix login redirect", TaskStatus::Todo),
        ("Migrate billing tables", TaskStatus::InProgress),
    ]
    .into_iter()
    .map(|(title, status)| {
        server.create_task(NewTask::new(project_id, alice, title).with_status(status))
    })
    .collect::<Result<Vec<Task>, _>>()?;
    let [notes, login, billing] = seeded.as_slice() else {
        return Err("seeding produced an unexpected number of tasks".into());
    };

    let alice_board = open(&server, project_id, alice, config).await?;
    let bob_board = open(&server, project_id, bob, config).await?;
    log_board("alice", &alice_board)?;

    info!("alice moves the login fix to the top of TODO");
    let reordered = alice_board
        .handle_drag(DragEvent::new(
            login.id(),
            DragLocation::new(TaskStatus::Todo, 1),
            DragLocation::new(TaskStatus::Todo, 0),
        ))
        .await?;
    report("alice", &reordered);

    info!("alice starts work on the release notes");
    let started = alice_board
        .handle_drag(DragEvent::new(
            notes.id(),
            DragLocation::new(TaskStatus::Todo, 1),
            DragLocation::new(TaskStatus::InProgress, 1),
        ))
        .await?;
    report("alice", &started);
    let sync = bob_board.drain_remote_events().await?;
    info!(applied = sync.applied, "bob received remote changes");
    log_board("bob", &bob_board)?;

    info!("the server will refuse bob's next move");
    server.fail_next_status_change(SyncChannelError::Forbidden(
        "bob may not close billing work".to_owned(),
    ))?;
    let Some((column, index)) = bob_board.store().position_in_column(billing.id())? else {
        return Err("billing task missing from bob's board".into());
    };
    let refused = bob_board
        .handle_drag(DragEvent::new(
            billing.id(),
            DragLocation::new(column, index),
            DragLocation::new(TaskStatus::Done, 0),
        ))
        .await?;
    report("bob", &refused);
    for notice in bob_board.take_notices()? {
        warn!(task_id = %notice.task_id, error = %notice.error, "notice shown to bob");
    }
    log_board("bob", &bob_board)?;
    Ok(())
}

async fn open(
    server: &InMemoryBoardServer,
    project_id: ProjectId,
    user_id: UserId,
    config: BoardConfig,
) -> DemoResult<Session> {
    let session = BoardSession::new(
        project_id,
        Arc::new(server.connect(user_id)),
        Arc::new(DefaultClock),
        config,
    );
    session.load().await?;
    Ok(session)
}

fn report(who: &str, outcome: &DragOutcome) {
    match outcome {
        DragOutcome::Ignored => info!(who, "drop ignored"),
        DragOutcome::Reordered => info!(who, "column reordered"),
        DragOutcome::Committed(transition) => {
            info!(who, task_id = %transition.task_id(), to = %transition.to(), "move committed");
        }
        DragOutcome::RolledBack { transition, error } => {
            warn!(who, task_id = %transition.task_id(), %error, "move rolled back");
        }
    }
}

fn log_board(who: &str, session: &Session) -> DemoResult<()> {
    let board = session.columns()?;
    for column in board.columns() {
        let titles: Vec<&str> = column.tasks().iter().map(Task::title).collect();
        info!(who, column = column.title(), ?titles, "board column");
    }
    Ok(())
}
