//! SQLite backend for the Cadence habit tracker.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated thread
//! without blocking the async runtime. Every multi-step operation (ensure a
//! week, write a day, rebind a scheme, recompute) runs inside one SQLite
//! transaction on that thread.

mod encode;
mod schema;
mod store;
mod tx;

pub mod error;

pub use error::{Error, Result};
pub use store::SqliteStore;
