//! Storage backends for the decision engines.
//!
//! The in-memory store lives in `verdict-engine` (it doubles as the test
//! backend); this module provides the durable SQLite implementation used
//! when a database URL is configured.
pub mod sqlite;

pub use sqlite::SqliteStore;
