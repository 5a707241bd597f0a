//! Application services for the task board.

mod config;
mod coordinator;
mod error;
mod session;
mod store;

pub use config::BoardConfig;
pub use coordinator::{MoveRequest, MoveResolution, TransitionCoordinator};
pub use error::{BoardError, BoardResult};
pub use session::{BoardNotice, BoardSession, DragOutcome, LoadState, RemoteSync};
pub use store::{
    RevertOutcome, StatusChange, TaskStore, TaskStoreError, TaskStoreResult, UpsertOutcome,
};
