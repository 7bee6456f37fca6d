//! Analytics module for dayglance
//!
//! Provides:
//! - Period resolution ([`period`])
//! - Period membership for tasks and events ([`filter`])
//! - Habit overlap, activity and streaks ([`habits`])
//! - Productivity scoring ([`scoring`])
//! - Summary stats, trend series and breakdowns ([`summary`])
//! - Period-over-period change ([`change`])
//! - The async/sync services front-ends call ([`service`])
//!
//! Everything except [`service`] is pure and works on a
//! [`crate::RecordSnapshot`].

pub mod change;
pub mod filter;
pub mod habits;
pub mod period;
pub mod scoring;
pub mod service;
pub mod summary;

pub use change::{activity_count, change_percent, format_change};
pub use filter::{events_in_range, filter_by_period, tasks_in_range};
pub use habits::{HabitStreak, HabitStreakReport};
pub use period::{PeriodRange, MAX_SERIES_LENGTH};
pub use scoring::{productivity_score, series_score};
pub use service::{SummaryService, SyncSummaryService};
pub use summary::{
    compute_series_point, compute_summary, ActivityBreakdown, SummaryStats, TimeSeriesPoint,
};
