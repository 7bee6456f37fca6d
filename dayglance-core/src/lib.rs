//! # dayglance-core
//!
//! Core library for dayglance - analytics over a local task, event and
//! habit store.
//!
//! This library provides:
//! - Record types for tasks, events and habits
//! - A SQLite-backed record store
//! - Period resolution (daily, weekly, monthly) and per-period filtering
//! - Summary statistics, trend series, breakdowns and period-over-period change
//! - Configuration management
//! - Logging infrastructure
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use dayglance_core::analytics::SyncSummaryService;
//! use dayglance_core::{Config, Database, Period};
//!
//! let db = Database::open(&Config::database_path()).expect("failed to open database");
//! db.migrate().expect("failed to run migrations");
//!
//! let service = SyncSummaryService::new(Arc::new(db)).expect("failed to start runtime");
//! let stats = service.summary_stats(Period::Weekly);
//! println!("{} of {} tasks done", stats.completed_tasks, stats.total_tasks);
//! ```

// Re-export commonly used items at the crate root
pub use cache::StatsCache;
pub use config::Config;
pub use db::Database;
pub use error::{Error, Result};
pub use store::{RecordSnapshot, RecordStore};
pub use types::*;

// Public modules
pub mod analytics;
pub mod cache;
pub mod config;
pub mod db;
pub mod error;
pub mod logging;
pub mod store;
pub mod types;
