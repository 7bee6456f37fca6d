//! Productivity scoring
//!
//! Pure functions blending task, habit and event rates into a single 0-100
//! score. Nothing here touches the record store.

/// Base weight of the task completion rate.
pub const TASK_WEIGHT: f64 = 0.5;
/// Base weight of the habit activity rate.
pub const HABIT_WEIGHT: f64 = 0.3;
/// Base weight of the event attendance rate.
pub const EVENT_WEIGHT: f64 = 0.2;

/// Below this many activities the score is scaled by [`LOW_ACTIVITY_PENALTY`].
pub const LOW_ACTIVITY_THRESHOLD: usize = 3;
/// Multiplier applied to low-activity periods.
pub const LOW_ACTIVITY_PENALTY: f64 = 0.8;

/// Normalised (task, habit, event) weights for the given activity volumes.
///
/// When a period has both tasks and events, the task and event weights grow
/// with their share of all activities; the habit weight stays fixed.
pub fn score_weights(total_tasks: usize, total_events: usize, total_habits: usize) -> (f64, f64, f64) {
    let (task, habit, event) = if total_tasks > 0 && total_events > 0 {
        let total = (total_tasks + total_events + total_habits) as f64;
        let task_ratio = total_tasks as f64 / total;
        let event_ratio = total_events as f64 / total;
        (0.4 + task_ratio * 0.2, 0.3, 0.3 + event_ratio * 0.1)
    } else {
        (TASK_WEIGHT, HABIT_WEIGHT, EVENT_WEIGHT)
    };

    let sum = task + habit + event;
    (task / sum, habit / sum, event / sum)
}

/// Weighted productivity score in `0..=100`.
///
/// Rates are percentages (0-100). Non-finite inputs score 0.
pub fn productivity_score(
    task_rate: f64,
    habit_rate: f64,
    event_rate: f64,
    total_tasks: usize,
    total_events: usize,
    total_habits: usize,
) -> u32 {
    let (task_weight, habit_weight, event_weight) =
        score_weights(total_tasks, total_events, total_habits);

    let total_activities = total_tasks + total_events + total_habits;
    let penalty = if total_activities < LOW_ACTIVITY_THRESHOLD {
        LOW_ACTIVITY_PENALTY
    } else {
        1.0
    };

    let score =
        (task_rate * task_weight + habit_rate * habit_weight + event_rate * event_weight) * penalty;

    clamp_percent(score)
}

/// Per-sub-period score used by trend series.
///
/// Completed tasks, active habits and attended events are weighted 0.5 /
/// 0.3 / 0.2 and divided by the number of activities in the sub-period.
pub fn series_score(
    completed_tasks: usize,
    active_habits: usize,
    completed_events: usize,
    total_activities: usize,
) -> u32 {
    if total_activities == 0 {
        return 0;
    }
    let weighted = completed_tasks as f64 * TASK_WEIGHT
        + active_habits as f64 * HABIT_WEIGHT
        + completed_events as f64 * EVENT_WEIGHT;

    clamp_percent(weighted / total_activities as f64 * 100.0)
}

/// Rounded share of `part` in `total` as a percentage; 0 when `total` is 0.
pub fn percent(part: usize, total: usize) -> u32 {
    if total == 0 {
        return 0;
    }
    (part as f64 / total as f64 * 100.0).round() as u32
}

fn clamp_percent(value: f64) -> u32 {
    if !value.is_finite() {
        return 0;
    }
    value.clamp(0.0, 100.0).round() as u32
}
