//! Period-over-period change

use super::filter::{events_in_range, tasks_in_range};
use super::period::PeriodRange;
use crate::store::RecordSnapshot;
use crate::types::ActivityKind;

/// Number of `kind` activities counted for `range`.
///
/// Tasks count when completed, events count regardless of attendance, habits
/// count when active. Productivity has no count and is always 0.
pub fn activity_count(snapshot: &RecordSnapshot, range: &PeriodRange, kind: ActivityKind) -> usize {
    match kind {
        ActivityKind::Tasks => tasks_in_range(&snapshot.tasks, range)
            .into_iter()
            .filter(|t| t.completed)
            .count(),
        ActivityKind::Events => events_in_range(&snapshot.events, range).len(),
        ActivityKind::Habits => snapshot
            .habits
            .iter()
            .filter(|h| h.is_active_in(range))
            .count(),
        ActivityKind::Productivity => 0,
    }
}

/// Signed, rounded percentage change from `previous` to `current`.
///
/// A zero baseline reports 100 when anything happened and 0 otherwise.
pub fn change_percent(current: usize, previous: usize) -> i64 {
    if previous == 0 {
        return if current > 0 { 100 } else { 0 };
    }
    ((current as f64 - previous as f64) / previous as f64 * 100.0).round() as i64
}

/// Format a change for display (e.g., "+23%" or "-15%").
pub fn format_change(change: i64) -> String {
    if change >= 0 {
        format!("+{}%", change)
    } else {
        format!("{}%", change)
    }
}
