//! SQLite backend for the Rollcall attendance store.
//!
//! Runs synchronously on the engine's dedicated thread; the daemon is the
//! single writer, so no connection pooling or async wrapper is needed.

mod encode;
mod schema;
mod store;

pub use store::SqliteStore;

#[cfg(test)]
mod tests;
