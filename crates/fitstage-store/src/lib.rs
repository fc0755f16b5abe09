//! # fitstage-store
//!
//! SQLite persistence for the FitStage voting and engagement core.
//!
//! The crate exposes a synchronous [`Database`] handle that wraps a
//! `rusqlite::Connection` and provides typed operations for every domain
//! model: categories, competitors, votes (with per-category quotas), posts,
//! and engagement counters. Vote tallies and ranks are never stored; they
//! are recomputed from the `votes` relation on every read.

pub mod categories;
pub mod competitors;
pub mod database;
pub mod engagement;
pub mod migrations;
pub mod models;
pub mod posts;
pub mod users;
pub mod votes;

mod error;

pub use database::Database;
pub use error::StoreError;
pub use models::*;
