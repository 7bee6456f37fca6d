//! Period resolution
//!
//! Turns a reference instant and a [`Period`] into closed local ranges
//! (`start <= t <= end`). Days run 00:00:00.000 to 23:59:59.999, weeks start
//! on Sunday, months are calendar months.

use crate::types::Period;
use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime};
use serde::Serialize;

/// Closed local time range covered by one period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PeriodRange {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl PeriodRange {
    /// Range covering whole days `first..=last`.
    pub fn days(first: NaiveDate, last: NaiveDate) -> Self {
        Self {
            start: start_of_day(first),
            end: end_of_day(last),
        }
    }

    /// Whether `instant` lies within the range (both ends inclusive).
    pub fn contains(&self, instant: NaiveDateTime) -> bool {
        self.start <= instant && instant <= self.end
    }

    /// Whether the start of `date` lies within the range.
    pub fn contains_date(&self, date: NaiveDate) -> bool {
        self.contains(start_of_day(date))
    }

    /// Canonical label for the range: its start date as `YYYY-MM-DD`.
    pub fn label(&self) -> String {
        self.start.format("%Y-%m-%d").to_string()
    }
}

/// Upper bound on the number of ranges in one series.
pub const MAX_SERIES_LENGTH: usize = 366;

impl Period {
    /// The range of this period that contains `reference`.
    ///
    /// At the very edges of the representable calendar, where the full
    /// period cannot be expressed, this degrades to the single instant.
    pub fn resolve(&self, reference: NaiveDateTime) -> PeriodRange {
        self.checked_resolve(reference).unwrap_or(PeriodRange {
            start: reference,
            end: reference,
        })
    }

    fn checked_resolve(&self, reference: NaiveDateTime) -> Option<PeriodRange> {
        let day = reference.date();
        let (first, last) = match self {
            Period::Daily => (day, day),
            Period::Weekly => {
                let offset = day.weekday().num_days_from_sunday() as i64;
                let start = day.checked_sub_signed(Duration::days(offset))?;
                (start, start.checked_add_signed(Duration::days(6))?)
            }
            Period::Monthly => {
                let first = first_of_month(day);
                let next = first_of_month(first.checked_add_signed(Duration::days(31))?);
                (first, next.pred_opt()?)
            }
        };
        Some(PeriodRange::days(first, last))
    }

    /// The range immediately before the one containing `reference`, if the
    /// calendar reaches back that far.
    pub fn previous(&self, reference: NaiveDateTime) -> Option<PeriodRange> {
        self.before(&self.resolve(reference))
    }

    fn before(&self, range: &PeriodRange) -> Option<PeriodRange> {
        let instant = range.start.checked_sub_signed(Duration::milliseconds(1))?;
        self.checked_resolve(instant)
    }

    /// Up to `count` contiguous ranges ending with the one containing
    /// `reference`, oldest first.
    ///
    /// At most [`MAX_SERIES_LENGTH`] ranges are returned, fewer if the
    /// calendar runs out first.
    pub fn previous_periods(&self, reference: NaiveDateTime, count: usize) -> Vec<PeriodRange> {
        let count = count.min(MAX_SERIES_LENGTH);
        let mut ranges = Vec::with_capacity(count);
        if count == 0 {
            return ranges;
        }

        let mut range = self.resolve(reference);
        ranges.push(range);
        while ranges.len() < count {
            match self.before(&range) {
                Some(prev) => range = prev,
                None => break,
            }
            ranges.push(range);
        }

        ranges.reverse();
        ranges
    }
}

/// Local midnight at the start of `date`.
pub fn start_of_day(date: NaiveDate) -> NaiveDateTime {
    date.and_time(NaiveTime::MIN)
}

/// Last millisecond of `date` (23:59:59.999).
pub fn end_of_day(date: NaiveDate) -> NaiveDateTime {
    date.succ_opt().map_or(NaiveDateTime::MAX, |next| {
        start_of_day(next) - Duration::milliseconds(1)
    })
}

fn first_of_month(date: NaiveDate) -> NaiveDate {
    date - Duration::days(date.day0() as i64)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
        date(y, m, d).and_hms_opt(h, min, 0).unwrap()
    }

    fn ms(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32, milli: u32) -> NaiveDateTime {
        date(y, m, d).and_hms_milli_opt(h, min, s, milli).unwrap()
    }

    #[test]
    fn test_daily_range() {
        let range = Period::Daily.resolve(at(2024, 3, 10, 15, 45));
        assert_eq!(range.start, ms(2024, 3, 10, 0, 0, 0, 0));
        assert_eq!(range.end, ms(2024, 3, 10, 23, 59, 59, 999));
    }

    #[test]
    fn test_weekly_range_starts_on_sunday() {
        // 2024-03-13 is a Wednesday
        let range = Period::Weekly.resolve(at(2024, 3, 13, 8, 0));
        assert_eq!(range.start, ms(2024, 3, 10, 0, 0, 0, 0));
        assert_eq!(range.end, ms(2024, 3, 16, 23, 59, 59, 999));

        // A Sunday is the start of its own week
        let range = Period::Weekly.resolve(at(2024, 3, 10, 0, 0));
        assert_eq!(range.start.date(), date(2024, 3, 10));

        // A Saturday is the last day of the week
        let range = Period::Weekly.resolve(at(2024, 3, 16, 23, 59));
        assert_eq!(range.start.date(), date(2024, 3, 10));
    }

    #[test]
    fn test_monthly_range_leap_year() {
        let range = Period::Monthly.resolve(at(2024, 2, 15, 12, 0));
        assert_eq!(range.start, ms(2024, 2, 1, 0, 0, 0, 0));
        assert_eq!(range.end, ms(2024, 2, 29, 23, 59, 59, 999));

        let range = Period::Monthly.resolve(at(2023, 2, 15, 12, 0));
        assert_eq!(range.end.date(), date(2023, 2, 28));

        let range = Period::Monthly.resolve(at(2024, 12, 31, 23, 0));
        assert_eq!(range.start.date(), date(2024, 12, 1));
        assert_eq!(range.end.date(), date(2024, 12, 31));
    }

    #[test]
    fn test_previous_month_rolls_over_year() {
        let range = Period::Monthly.previous(at(2024, 1, 20, 9, 0)).unwrap();
        assert_eq!(range.start, ms(2023, 12, 1, 0, 0, 0, 0));
        assert_eq!(range.end, ms(2023, 12, 31, 23, 59, 59, 999));
    }

    #[test]
    fn test_previous_week_and_day() {
        let range = Period::Weekly.previous(at(2024, 3, 13, 8, 0)).unwrap();
        assert_eq!(range.start.date(), date(2024, 3, 3));
        assert_eq!(range.end.date(), date(2024, 3, 9));

        let range = Period::Daily.previous(at(2024, 3, 1, 8, 0)).unwrap();
        assert_eq!(range.start.date(), date(2024, 2, 29));
    }

    #[test]
    fn test_previous_periods_are_contiguous_oldest_first() {
        let reference = at(2024, 3, 13, 8, 0);
        for period in [Period::Daily, Period::Weekly, Period::Monthly] {
            let ranges = period.previous_periods(reference, 5);
            assert_eq!(ranges.len(), 5);
            assert_eq!(ranges[4], period.resolve(reference));
            for pair in ranges.windows(2) {
                assert_eq!(pair[0].end + Duration::milliseconds(1), pair[1].start);
            }
        }
    }

    #[test]
    fn test_previous_periods_monthly_across_year() {
        let ranges = Period::Monthly.previous_periods(at(2024, 2, 10, 0, 0), 4);
        let starts: Vec<_> = ranges.iter().map(|r| r.start.date()).collect();
        assert_eq!(
            starts,
            vec![
                date(2023, 11, 1),
                date(2023, 12, 1),
                date(2024, 1, 1),
                date(2024, 2, 1)
            ]
        );
    }

    #[test]
    fn test_previous_periods_weekly_and_daily_offsets() {
        let ranges = Period::Weekly.previous_periods(at(2024, 3, 13, 8, 0), 3);
        assert_eq!(ranges[0].start.date(), date(2024, 2, 25));
        assert_eq!(ranges[2].start.date(), date(2024, 3, 10));

        let ranges = Period::Daily.previous_periods(at(2024, 3, 2, 8, 0), 3);
        let labels: Vec<_> = ranges.iter().map(|r| r.label()).collect();
        assert_eq!(labels, vec!["2024-02-29", "2024-03-01", "2024-03-02"]);
    }

    #[test]
    fn test_zero_periods() {
        assert!(Period::Weekly
            .previous_periods(at(2024, 3, 13, 8, 0), 0)
            .is_empty());
    }

    #[test]
    fn test_series_length_is_capped() {
        let reference = at(2024, 3, 13, 8, 0);
        let ranges = Period::Monthly.previous_periods(reference, usize::MAX);
        assert_eq!(ranges.len(), MAX_SERIES_LENGTH);
        assert_eq!(ranges[MAX_SERIES_LENGTH - 1], Period::Monthly.resolve(reference));

        assert_eq!(
            Period::Daily.previous_periods(reference, 4_000_000).len(),
            MAX_SERIES_LENGTH
        );
    }

    #[test]
    fn test_calendar_edges_do_not_panic() {
        let earliest = start_of_day(NaiveDate::MIN);
        assert!(Period::Daily.previous(earliest).is_none());
        assert!(Period::Monthly.previous(earliest).is_none());
        assert_eq!(Period::Daily.previous_periods(earliest, 10).len(), 1);
        assert_eq!(Period::Monthly.previous_periods(earliest, 10).len(), 1);
        assert!(Period::Weekly.previous_periods(earliest, 10).len() <= 10);

        let latest = end_of_day(NaiveDate::MAX);
        assert_eq!(latest, NaiveDateTime::MAX);
        for period in [Period::Daily, Period::Weekly, Period::Monthly] {
            let range = period.resolve(latest);
            assert!(range.contains(latest));
            let ranges = period.previous_periods(latest, 3);
            assert!(!ranges.is_empty() && ranges.len() <= 3);
        }
        assert_eq!(Period::Daily.previous_periods(latest, 3).len(), 3);
    }

    #[test]
    fn test_contains_is_inclusive() {
        let range = Period::Daily.resolve(at(2024, 3, 10, 12, 0));
        assert!(range.contains(range.start));
        assert!(range.contains(range.end));
        assert!(!range.contains(range.end + Duration::milliseconds(1)));
        assert!(range.contains_date(date(2024, 3, 10)));
        assert!(!range.contains_date(date(2024, 3, 11)));
    }
}
