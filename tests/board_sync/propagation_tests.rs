//! Changes made through one session reach every other session.

use super::helpers::{Team, drag, team};
use eyre::{OptionExt, ensure};
use rstest::rstest;
use taskboard::board::{
    domain::{NewTask, Task, TaskStatus},
    services::DragOutcome,
};

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn committed_move_reaches_the_other_session(team: Team) -> eyre::Result<()> {
    let alice = team.loaded_session(team.alice).await?;
    let bob = team.loaded_session(team.bob).await?;

    let outcome = alice
        .handle_drag(drag(&team.t1, (TaskStatus::Todo, 0), (TaskStatus::Review, 0)))
        .await?;
    ensure!(matches!(outcome, DragOutcome::Committed(_)));

    let sync = bob.drain_remote_events().await?;
    ensure!(sync.applied == 1);
    ensure!(
        bob.columns()?.column(TaskStatus::Review).task_ids() == vec![team.t1.id()],
        "bob does not see the move"
    );
    // Alice picks up the authority's copy of her own change.
    alice.drain_remote_events().await?;
    ensure!(bob.columns()? == alice.columns()?);
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn within_column_reorder_stays_local(team: Team) -> eyre::Result<()> {
    let alice = team.loaded_session(team.alice).await?;
    let bob = team.loaded_session(team.bob).await?;

    alice
        .handle_drag(drag(&team.t2, (TaskStatus::Todo, 1), (TaskStatus::Todo, 0)))
        .await?;

    ensure!(bob.drain_remote_events().await?.applied == 0);
    ensure!(
        alice.columns()?.column(TaskStatus::Todo).task_ids() == vec![team.t2.id(), team.t1.id()]
    );
    ensure!(
        bob.columns()?.column(TaskStatus::Todo).task_ids() == vec![team.t1.id(), team.t2.id()]
    );
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn remote_create_edit_and_delete_are_applied(team: Team) -> eyre::Result<()> {
    let bob = team.loaded_session(team.bob).await?;

    let created = team
        .server
        .create_task(NewTask::new(team.project_id, team.alice, "T4"))?;
    let mut renamed = team.t2.to_persisted();
    renamed.title = "T2 (renamed)".to_owned();
    team.server.update_task(Task::from_persisted(renamed))?;
    team.server.delete_task(team.t3.id())?;

    let sync = bob.drain_remote_events().await?;

    ensure!(sync.applied == 3 && !sync.reloaded);
    let columns = bob.columns()?;
    ensure!(
        columns.column(TaskStatus::Todo).task_ids()
            == vec![team.t1.id(), team.t2.id(), created.id()]
    );
    ensure!(columns.column(TaskStatus::InProgress).is_empty());
    let t2 = bob.store().get(team.t2.id())?.ok_or_eyre("T2 vanished")?;
    ensure!(t2.title() == "T2 (renamed)");
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn sessions_converge_on_the_last_accepted_write(team: Team) -> eyre::Result<()> {
    let alice = team.loaded_session(team.alice).await?;
    let bob = team.loaded_session(team.bob).await?;

    bob.handle_drag(drag(&team.t1, (TaskStatus::Todo, 0), (TaskStatus::Done, 0)))
        .await?;
    // Alice has not seen bob's move yet; her board still shows T1 in TODO.
    alice
        .handle_drag(drag(&team.t1, (TaskStatus::Todo, 0), (TaskStatus::Review, 0)))
        .await?;

    alice.drain_remote_events().await?;
    bob.drain_remote_events().await?;

    for session in [&alice, &bob] {
        let t1 = session.store().get(team.t1.id())?.ok_or_eyre("T1 vanished")?;
        ensure!(t1.status() == TaskStatus::Review);
    }
    ensure!(alice.columns()? == bob.columns()?);
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn drag_of_a_task_deleted_elsewhere_is_rejected(team: Team) -> eyre::Result<()> {
    let alice = team.loaded_session(team.alice).await?;
    team.server.delete_task(team.t3.id())?;
    alice.drain_remote_events().await?;

    let result = alice
        .handle_drag(drag(&team.t3, (TaskStatus::InProgress, 0), (TaskStatus::Done, 0)))
        .await;

    ensure!(result.is_err(), "drag of a deleted task was accepted");
    ensure!(alice.store().len()? == 2);
    Ok(())
}
