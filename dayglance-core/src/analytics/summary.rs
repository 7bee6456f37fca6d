//! Per-period aggregation
//!
//! Result types handed to callers plus the pure functions that compute them
//! from a [`RecordSnapshot`]. Fetching and error handling live in
//! [`super::service`].

use super::filter::{events_in_range, tasks_in_range};
use super::period::PeriodRange;
use super::scoring::{percent, productivity_score, series_score};
use crate::store::RecordSnapshot;
use serde::Serialize;

/// Counts, rates and score for one period.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SummaryStats {
    /// Tasks due in the period
    pub total_tasks: usize,
    /// Of those, completed
    pub completed_tasks: usize,
    /// Habits scheduled during the period
    pub total_habits: usize,
    /// Habits completed at least once in the period
    pub active_habits: usize,
    /// Events starting in the period
    pub total_events: usize,
    /// Of those, not yet attended
    pub upcoming_events: usize,
    /// Completed tasks as a rounded percentage
    pub completion_rate: u32,
    /// Active habits as a percentage of scheduled habits
    pub habit_completion_rate: f64,
    /// Attended events as a rounded percentage
    pub event_attendance_rate: u32,
    /// Weighted blend of the three rates (0-100)
    pub productivity_score: u32,
}

/// One point of a trend series.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TimeSeriesPoint {
    /// Start date of the sub-period (`YYYY-MM-DD`)
    pub date: String,
    /// Weighted score (0-100)
    pub completed: u32,
    /// Scale of `completed`; always 100
    pub total: u32,
}

impl TimeSeriesPoint {
    /// Point used when a sub-period could not be computed.
    pub fn zeroed(range: &PeriodRange) -> Self {
        Self {
            date: range.label(),
            completed: 0,
            total: 100,
        }
    }
}

/// Unfiltered record totals.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ActivityBreakdown {
    pub tasks: usize,
    pub events: usize,
    pub habits: usize,
}

impl ActivityBreakdown {
    pub fn from_snapshot(snapshot: &RecordSnapshot) -> Self {
        Self {
            tasks: snapshot.tasks.len(),
            events: snapshot.events.len(),
            habits: snapshot.habits.len(),
        }
    }

    pub fn total(&self) -> usize {
        self.tasks + self.events + self.habits
    }
}

/// Raw per-range counts shared by the summary and the series.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct RangeCounts {
    tasks: usize,
    completed_tasks: usize,
    events: usize,
    completed_events: usize,
    habits: usize,
    active_habits: usize,
}

impl RangeCounts {
    fn collect(snapshot: &RecordSnapshot, range: &PeriodRange) -> Self {
        let tasks = tasks_in_range(&snapshot.tasks, range);
        let events = events_in_range(&snapshot.events, range);

        Self {
            tasks: tasks.len(),
            completed_tasks: tasks.iter().filter(|t| t.completed).count(),
            events: events.len(),
            completed_events: events.iter().filter(|e| e.completed).count(),
            habits: snapshot.habits.iter().filter(|h| h.overlaps(range)).count(),
            active_habits: snapshot
                .habits
                .iter()
                .filter(|h| h.is_active_in(range))
                .count(),
        }
    }

    fn activities(&self) -> usize {
        self.tasks + self.events + self.habits
    }
}

/// Summary statistics for `range`.
pub fn compute_summary(snapshot: &RecordSnapshot, range: &PeriodRange) -> SummaryStats {
    let counts = RangeCounts::collect(snapshot, range);

    let completion_rate = percent(counts.completed_tasks, counts.tasks);
    let event_attendance_rate = percent(counts.completed_events, counts.events);
    let habit_completion_rate = if counts.habits > 0 {
        counts.active_habits as f64 / counts.habits as f64 * 100.0
    } else {
        0.0
    };

    let productivity_score = productivity_score(
        completion_rate as f64,
        habit_completion_rate,
        event_attendance_rate as f64,
        counts.tasks,
        counts.events,
        counts.habits,
    );

    SummaryStats {
        total_tasks: counts.tasks,
        completed_tasks: counts.completed_tasks,
        total_habits: counts.habits,
        active_habits: counts.active_habits,
        total_events: counts.events,
        upcoming_events: counts.events - counts.completed_events,
        completion_rate,
        habit_completion_rate,
        event_attendance_rate,
        productivity_score,
    }
}

/// Trend point for one sub-period.
pub fn compute_series_point(snapshot: &RecordSnapshot, range: &PeriodRange) -> TimeSeriesPoint {
    let counts = RangeCounts::collect(snapshot, range);
    TimeSeriesPoint {
        date: range.label(),
        completed: series_score(
            counts.completed_tasks,
            counts.active_habits,
            counts.completed_events,
            counts.activities(),
        ),
        total: 100,
    }
}
