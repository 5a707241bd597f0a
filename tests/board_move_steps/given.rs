//! Given steps for board move BDD scenarios.

use super::world::{BoardWorld, run_async, status, titles};
use eyre::WrapErr;
use rstest_bdd_macros::given;
use taskboard::board::{domain::NewTask, ports::SyncChannelError};

#[given(r#"the "{column}" column holds "{list}""#)]
fn column_holds(
    world: &mut BoardWorld,
    column: String,
    list: String,
) -> Result<(), eyre::Report> {
    let target = status(&column)?;
    for title in titles(&list) {
        let request =
            NewTask::new(world.project_id, world.user_id, title.as_str()).with_status(target);
        let task = world
            .server
            .create_task(request)
            .wrap_err("seed scenario task")?;
        world.tasks.insert(title, task);
    }
    Ok(())
}

#[given("the board is loaded")]
fn board_is_loaded(world: &mut BoardWorld) -> Result<(), eyre::Report> {
    let session = world.open_session();
    run_async(session.load()).wrap_err("load scenario board")?;
    world.session = Some(session);
    Ok(())
}

#[given("the server refuses the next status change")]
fn server_refuses_next_change(world: &mut BoardWorld) -> Result<(), eyre::Report> {
    world
        .server
        .fail_next_status_change(SyncChannelError::Forbidden(
            "member may not move tasks".to_owned(),
        ))
        .wrap_err("inject status change failure")?;
    Ok(())
}
