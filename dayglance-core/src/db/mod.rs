//! Database layer for dayglance
//!
//! This module provides the storage layer using SQLite with:
//! - Schema migrations
//! - Repository operations for tasks, events and habits
//! - The [`crate::RecordStore`] implementation the analytics layer reads from

pub mod repo;
pub mod schema;

pub use repo::Database;
