//! Domain model for the task board.
//!
//! Tasks, their four-column projection, the drag gesture contract, the
//! within-column reorder splice and the cross-column move state machine. No
//! type here knows about locks, channels or runtimes.

mod column;
mod drag;
mod error;
mod ids;
mod reorder;
mod task;
mod transition;

pub use column::{Board, Column, project};
pub use drag::{DragEvent, DragLocation};
pub use error::{BoardDomainError, ParsePriorityError, ParseTaskStatusError};
pub use ids::{ProjectId, TaskId, UserId};
pub use reorder::{reorder, reorder_in_place};
pub use task::{NewTask, PersistedTaskData, Priority, Task, TaskStatus};
pub use transition::{InvalidTransition, StatusTransition, TransitionState};
