//! Collaborative task board: state synchronization and reordering.
//!
//! Tasks live in a per-session [`services::TaskStore`] and are shown as four
//! status columns. Dragging a task within a column reorders it locally;
//! dragging it into another column applies the new status at once, asks the
//! authority to confirm it, and undoes it if the authority refuses. Changes
//! made by other sessions arrive over the same [`ports::SyncChannel`] and are
//! applied to the store like local ones. The module follows hexagonal
//! architecture:
//!
//! - Domain types in [`domain`]
//! - Port contracts in [`ports`]
//! - Adapter implementations in [`adapters`]
//! - Orchestration services in [`services`]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod services;

#[cfg(test)]
mod tests;
