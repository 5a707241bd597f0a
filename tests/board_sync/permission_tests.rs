//! Refused moves roll back locally and never reach other sessions.

use super::helpers::{Team, drag, team};
use eyre::{bail, ensure};
use rstest::rstest;
use taskboard::board::{
    domain::{TaskStatus, UserId},
    services::{BoardError, DragOutcome},
};

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn outsider_cannot_open_the_board(team: Team) -> eyre::Result<()> {
    let outsider = team.session(UserId::new());

    ensure!(matches!(outsider.load().await, Err(BoardError::Forbidden(_))));
    ensure!(matches!(outsider.columns(), Err(BoardError::NotLoaded)));
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn revoked_member_move_is_rolled_back(team: Team) -> eyre::Result<()> {
    let alice = team.loaded_session(team.alice).await?;
    let bob = team.loaded_session(team.bob).await?;
    let before = alice.columns()?;
    ensure!(team.server.remove_member(team.project_id, team.alice)?);

    let outcome = alice
        .handle_drag(drag(&team.t1, (TaskStatus::Todo, 0), (TaskStatus::InProgress, 0)))
        .await?;

    let DragOutcome::RolledBack { error, .. } = outcome else {
        bail!("expected the move to roll back");
    };
    ensure!(matches!(error, BoardError::Forbidden(_)));
    ensure!(!error.is_retryable());
    ensure!(alice.columns()? == before);
    ensure!(alice.take_notices()?.len() == 1);

    ensure!(bob.drain_remote_events().await?.applied == 0);
    let on_server = team.server.task(team.t1.id())?;
    ensure!(on_server.map(|task| task.status()) == Some(TaskStatus::Todo));
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn failed_move_can_be_retried(team: Team) -> eyre::Result<()> {
    let alice = team.loaded_session(team.alice).await?;
    team.server
        .fail_next_status_change(taskboard::board::ports::SyncChannelError::transport(
            std::io::Error::other("connection reset"),
        ))?;
    let gesture = drag(&team.t3, (TaskStatus::InProgress, 0), (TaskStatus::Done, 0));

    let first = alice.handle_drag(gesture).await?;
    let DragOutcome::RolledBack { error, .. } = first else {
        bail!("expected the first attempt to roll back");
    };
    ensure!(error.is_retryable());

    let second = alice.handle_drag(gesture).await?;
    ensure!(matches!(second, DragOutcome::Committed(_)));
    ensure!(alice.columns()?.column(TaskStatus::Done).task_ids() == vec![team.t3.id()]);
    Ok(())
}
