//! Core types and trait definitions for the Cadence habit tracker.
//!
//! This crate is deliberately free of HTTP and database dependencies. It holds
//! the weekly scoring engine, the week arithmetic it relies on, the validation
//! layer, and the [`store::TrackerStore`] abstraction that backends implement.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod error;
pub mod habit;
pub mod record;
pub mod scheme;
pub mod scoring;
pub mod store;
pub mod validate;
pub mod week;

pub use error::{Coded, Error, ErrorCode, Result};
