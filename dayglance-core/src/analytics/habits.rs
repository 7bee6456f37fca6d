//! Habit completion tracking
//!
//! Two separate questions are asked of a habit for a given range:
//! - does it *overlap* the range (its start/end dates intersect it), which
//!   decides whether it counts toward the period's habit total;
//! - is it *active* in the range (it was completed on a day inside it).
//!
//! Streaks are derived from the same completion set.

use super::period::{end_of_day, start_of_day, PeriodRange};
use crate::types::Habit;
use chrono::{Duration, NaiveDate};
use serde::Serialize;
use std::collections::BTreeSet;

impl Habit {
    /// Whether the habit was completed on at least one day inside `range`.
    pub fn is_active_in(&self, range: &PeriodRange) -> bool {
        self.completed_dates
            .range(range.start.date()..=range.end.date())
            .any(|d| range.contains_date(*d))
    }

    /// Whether the habit's scheduled days intersect `range`.
    ///
    /// A habit without a start date never overlaps; a missing end date means
    /// the habit runs indefinitely.
    pub fn overlaps(&self, range: &PeriodRange) -> bool {
        let Some(start) = self.start_date else {
            return false;
        };
        if start_of_day(start) > range.end {
            return false;
        }
        match self.end_date {
            Some(end) => end_of_day(end) >= range.start,
            None => true,
        }
    }

    /// Current and longest completion streaks as of `today`.
    pub fn streak(&self, today: NaiveDate) -> HabitStreak {
        HabitStreak::from_dates(&self.completed_dates, today)
    }
}

/// Consecutive-day completion streaks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct HabitStreak {
    /// Consecutive days ending today, or yesterday if today is not done yet
    pub current: u32,
    /// Longest run of consecutive days up to today
    pub longest: u32,
}

impl HabitStreak {
    /// Calculate streaks from a completion set, ignoring dates after `today`.
    pub fn from_dates(dates: &BTreeSet<NaiveDate>, today: NaiveDate) -> Self {
        let mut longest = 0u32;
        let mut run = 0u32;
        let mut prev: Option<NaiveDate> = None;

        for &date in dates.range(..=today) {
            run = match prev {
                Some(p) if p + Duration::days(1) == date => run + 1,
                _ => 1,
            };
            longest = longest.max(run);
            prev = Some(date);
        }

        let yesterday = today - Duration::days(1);
        let mut cursor = if dates.contains(&today) {
            today
        } else if dates.contains(&yesterday) {
            yesterday
        } else {
            return Self {
                current: 0,
                longest,
            };
        };

        let mut current = 0u32;
        while dates.contains(&cursor) {
            current += 1;
            cursor = cursor - Duration::days(1);
        }

        Self { current, longest }
    }
}

/// A habit's streaks, for listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HabitStreakReport {
    pub habit_id: i64,
    pub name: String,
    pub current_streak: u32,
    pub longest_streak: u32,
}

impl HabitStreakReport {
    pub fn new(habit: &Habit, today: NaiveDate) -> Self {
        let streak = habit.streak(today);
        Self {
            habit_id: habit.id,
            name: habit.name.clone(),
            current_streak: streak.current,
            longest_streak: streak.longest,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Period;
    use crate::store::parse_completed_dates;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn habit(start: Option<NaiveDate>, end: Option<NaiveDate>, completed: &str) -> Habit {
        Habit {
            id: 1,
            name: "Meditate".to_string(),
            start_date: start,
            end_date: end,
            completed_dates: parse_completed_dates(Some(completed)),
        }
    }

    fn week_of(y: i32, m: u32, d: u32) -> PeriodRange {
        Period::Weekly.resolve(date(y, m, d).and_hms_opt(12, 0, 0).unwrap())
    }

    #[test]
    fn test_active_in_week_containing_completion() {
        let h = habit(Some(date(2024, 3, 1)), None, r#"["2024-03-10"]"#);

        assert!(h.is_active_in(&week_of(2024, 3, 10)));
        assert!(!h.is_active_in(&week_of(2024, 3, 3)));
        assert!(!h.is_active_in(&week_of(2024, 3, 17)));
    }

    #[test]
    fn test_malformed_completions_are_never_active() {
        let h = habit(Some(date(2024, 3, 1)), None, "garbage");
        assert!(!h.is_active_in(&week_of(2024, 3, 10)));
    }

    #[test]
    fn test_overlap_rules() {
        let march = Period::Monthly.resolve(date(2024, 3, 15).and_hms_opt(0, 0, 0).unwrap());

        // open ended, started before
        assert!(habit(Some(date(2024, 1, 1)), None, "[]").overlaps(&march));
        // starts on the last day
        assert!(habit(Some(date(2024, 3, 31)), None, "[]").overlaps(&march));
        // starts after
        assert!(!habit(Some(date(2024, 4, 1)), None, "[]").overlaps(&march));
        // ends on the first day
        assert!(habit(Some(date(2024, 1, 1)), Some(date(2024, 3, 1)), "[]").overlaps(&march));
        // ended before
        assert!(!habit(Some(date(2024, 1, 1)), Some(date(2024, 2, 29)), "[]").overlaps(&march));
        // no start date
        assert!(!habit(None, None, "[]").overlaps(&march));
    }

    #[test]
    fn test_streaks() {
        let h = habit(
            Some(date(2024, 3, 1)),
            None,
            r#"["2024-03-01","2024-03-02","2024-03-03","2024-03-04","2024-03-08","2024-03-09"]"#,
        );

        let streak = h.streak(date(2024, 3, 9));
        assert_eq!(streak.current, 2);
        assert_eq!(streak.longest, 4);

        // today not done yet keeps yesterday's streak alive
        assert_eq!(h.streak(date(2024, 3, 10)).current, 2);
        // two missed days breaks it
        assert_eq!(h.streak(date(2024, 3, 11)).current, 0);
        // future completions are ignored
        assert_eq!(h.streak(date(2024, 3, 3)), HabitStreak { current: 3, longest: 3 });
    }

    #[test]
    fn test_streak_empty() {
        let h = habit(Some(date(2024, 3, 1)), None, "[]");
        assert_eq!(h.streak(date(2024, 3, 9)), HabitStreak::default());
    }
}
