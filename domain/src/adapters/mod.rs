//! Adapters that live inside the domain crate for convenience.
//!
//! The in-memory repository backs unit tests, the demo CLI and ephemeral
//! server runs. The SQLite adapter lives in its own crate.

pub mod memory_repo;
