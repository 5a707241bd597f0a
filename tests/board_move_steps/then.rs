//! Then steps for board move BDD scenarios.

use super::world::{BoardWorld, status, titles};
use rstest_bdd_macros::then;
use taskboard::board::services::{BoardResult, DragOutcome};

fn last_outcome(world: &BoardWorld) -> Result<&BoardResult<DragOutcome>, eyre::Report> {
    world
        .last_outcome
        .as_ref()
        .ok_or_else(|| eyre::eyre!("no drag has been handled in this scenario"))
}

#[then("the move is committed")]
fn move_is_committed(world: &BoardWorld) -> Result<(), eyre::Report> {
    let outcome = last_outcome(world)?;
    if !matches!(outcome, Ok(DragOutcome::Committed(_))) {
        return Err(eyre::eyre!("expected a committed move, got {outcome:?}"));
    }
    Ok(())
}

#[then("the move is rolled back")]
fn move_is_rolled_back(world: &BoardWorld) -> Result<(), eyre::Report> {
    let outcome = last_outcome(world)?;
    if !matches!(outcome, Ok(DragOutcome::RolledBack { .. })) {
        return Err(eyre::eyre!("expected a rolled back move, got {outcome:?}"));
    }
    Ok(())
}

#[then("the board is reordered")]
fn board_is_reordered(world: &BoardWorld) -> Result<(), eyre::Report> {
    let outcome = last_outcome(world)?;
    if !matches!(outcome, Ok(DragOutcome::Reordered)) {
        return Err(eyre::eyre!("expected a reorder, got {outcome:?}"));
    }
    Ok(())
}

#[then("the drop is ignored")]
fn drop_is_ignored(world: &BoardWorld) -> Result<(), eyre::Report> {
    let outcome = last_outcome(world)?;
    if !matches!(outcome, Ok(DragOutcome::Ignored)) {
        return Err(eyre::eyre!("expected the drop to be ignored, got {outcome:?}"));
    }
    Ok(())
}

#[then(r#"the "{column}" column lists "{list}""#)]
fn column_lists(world: &BoardWorld, column: String, list: String) -> Result<(), eyre::Report> {
    let board = world.session()?.columns()?;
    let shown: Vec<String> = board
        .column(status(&column)?)
        .tasks()
        .iter()
        .map(|task| task.title().to_owned())
        .collect();
    let expected = titles(&list);
    eyre::ensure!(shown == expected, "{column} shows {shown:?}, expected {expected:?}");
    Ok(())
}

#[then("{count:usize} failure notice is queued")]
fn notices_queued(world: &BoardWorld, count: usize) -> Result<(), eyre::Report> {
    let notices = world.session()?.take_notices()?;
    eyre::ensure!(
        notices.len() == count,
        "expected {count} notices, found {}",
        notices.len()
    );
    Ok(())
}

#[then(r#"the server still has "{title}" in "{column}""#)]
fn server_still_has(
    world: &BoardWorld,
    title: String,
    column: String,
) -> Result<(), eyre::Report> {
    let task_id = world.task(&title)?.id();
    let on_server = world
        .server
        .task(task_id)?
        .ok_or_else(|| eyre::eyre!("{title} is missing on the server"))?;
    eyre::ensure!(on_server.status() == status(&column)?, "server moved {title}");
    Ok(())
}
