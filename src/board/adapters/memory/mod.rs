//! In-memory adapters used by tests, the demo binary and local development.

mod server;

pub use server::{InMemoryBoardServer, InMemoryChannel};
