//! Period membership for point-in-time records.

use super::period::PeriodRange;
use crate::types::{Event, Task};
use chrono::NaiveDateTime;

/// Records whose date (as extracted by `date_of`) falls within `range`.
///
/// Records without a date are never included.
pub fn filter_by_period<'a, T, F>(records: &'a [T], range: &PeriodRange, date_of: F) -> Vec<&'a T>
where
    F: Fn(&T) -> Option<NaiveDateTime>,
{
    records
        .iter()
        .filter(|record| date_of(*record).is_some_and(|dt| range.contains(dt)))
        .collect()
}

/// Tasks whose deadline falls within `range`.
pub fn tasks_in_range<'a>(tasks: &'a [Task], range: &PeriodRange) -> Vec<&'a Task> {
    filter_by_period(tasks, range, |t| t.deadline)
}

/// Events whose start time falls within `range`.
pub fn events_in_range<'a>(events: &'a [Event], range: &PeriodRange) -> Vec<&'a Event> {
    filter_by_period(events, range, |e| e.start_time)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Period;
    use chrono::NaiveDate;

    fn at(y: i32, m: u32, d: u32, h: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, 0, 0)
            .unwrap()
    }

    fn task(id: i64, deadline: Option<NaiveDateTime>) -> Task {
        Task {
            id,
            title: format!("task {}", id),
            deadline,
            completed: false,
        }
    }

    #[test]
    fn test_tasks_in_range_excludes_missing_and_outside() {
        let range = Period::Weekly.resolve(at(2024, 3, 13, 12));
        let tasks = vec![
            task(1, Some(at(2024, 3, 10, 0))),
            task(2, Some(at(2024, 3, 16, 23))),
            task(3, Some(at(2024, 3, 17, 0))),
            task(4, None),
            task(5, Some(at(2024, 3, 9, 23))),
        ];

        let ids: Vec<_> = tasks_in_range(&tasks, &range).iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![1, 2]);
    }

    #[test]
    fn test_events_in_range() {
        let range = Period::Daily.resolve(at(2024, 3, 13, 12));
        let events = vec![
            Event {
                id: 1,
                title: "standup".to_string(),
                start_time: Some(at(2024, 3, 13, 9)),
                completed: true,
            },
            Event {
                id: 2,
                title: "retro".to_string(),
                start_time: Some(at(2024, 3, 14, 9)),
                completed: false,
            },
        ];
        let matched = events_in_range(&events, &range);
        assert_eq!(matched.len(), 1);
        assert_eq!(matched[0].id, 1);
    }
}
