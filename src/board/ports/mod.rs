//! Port contracts for the task board.
//!
//! Ports define infrastructure-agnostic interfaces used by board services.

pub mod channel;

pub use channel::{
    Delivery, RemoteEvent, RemoteEvents, StatusChangeRequest, SyncChannel, SyncChannelError,
    SyncResult,
};

#[cfg(test)]
pub use channel::MockSyncChannel;
