//! Taskboard: collaborative task-board state sync and reordering.
//!
//! This crate keeps a client-side replica of a project's tasks, presents it
//! as four status columns, and lets drag gestures reorder tasks within a
//! column or move them between columns. Cross-column moves are applied
//! optimistically and confirmed or rolled back by a remote authority, while
//! changes made by other sessions arrive as pushed events.
//!
//! # Architecture
//!
//! Taskboard follows hexagonal architecture principles:
//!
//! - **Domain**: Tasks, columns, the reorder splice and the move state machine
//! - **Ports**: The synchronization channel to the remote authority
//! - **Adapters**: An in-memory authority for tests and demos
//! - **Services**: The task store, transition coordinator and board session
//!
//! # Modules
//!
//! - [`board`]: Board state, drag handling and synchronization

pub mod board;
