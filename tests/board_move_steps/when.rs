//! When steps for board move BDD scenarios.

use super::world::{BoardWorld, run_async, status};
use rstest_bdd_macros::when;
use taskboard::board::domain::{DragEvent, DragLocation};

/// Locates a task on the session's board.
fn source_of(world: &BoardWorld, title: &str) -> Result<DragLocation, eyre::Report> {
    let task_id = world.task(title)?.id();
    let (column, index) = world
        .session()?
        .store()
        .position_in_column(task_id)?
        .ok_or_else(|| eyre::eyre!("{title} is not on the board"))?;
    Ok(DragLocation::new(column, index))
}

#[when(r#""{title}" is dragged from "{from}" to "{to}""#)]
fn dragged_across(
    world: &mut BoardWorld,
    title: String,
    from: String,
    to: String,
) -> Result<(), eyre::Report> {
    let source = source_of(world, &title)?;
    eyre::ensure!(source.column == status(&from)?, "{title} is not in {from}");
    let target = status(&to)?;
    let end = world.session()?.columns()?.column(target).len();
    let event = DragEvent::new(world.task(&title)?.id(), source, DragLocation::new(target, end));

    let outcome = run_async(world.session()?.handle_drag(event));
    world.last_outcome = Some(outcome);
    Ok(())
}

#[when(r#""{title}" is dragged within "{column}" to position {index:usize}"#)]
fn dragged_within(
    world: &mut BoardWorld,
    title: String,
    column: String,
    index: usize,
) -> Result<(), eyre::Report> {
    let source = source_of(world, &title)?;
    let target = status(&column)?;
    let event = DragEvent::new(
        world.task(&title)?.id(),
        source,
        DragLocation::new(target, index),
    );

    let outcome = run_async(world.session()?.handle_drag(event));
    world.last_outcome = Some(outcome);
    Ok(())
}

#[when(r#""{title}" is dropped outside the board"#)]
fn dropped_outside(world: &mut BoardWorld, title: String) -> Result<(), eyre::Report> {
    let source = source_of(world, &title)?;
    let event = DragEvent::cancelled(world.task(&title)?.id(), source);

    let outcome = run_async(world.session()?.handle_drag(event));
    world.last_outcome = Some(outcome);
    Ok(())
}
