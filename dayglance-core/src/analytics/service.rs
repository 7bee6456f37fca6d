//! Summary service
//!
//! Async entry points used by front-ends. Each call reads the record store
//! (tasks, events and habits fetched concurrently on the blocking pool),
//! computes a fresh result and hands it back. Failures never reach the
//! caller: they are logged and the affected result is zeroed.
//!
//! [`SyncSummaryService`] wraps the service for synchronous callers.

use super::change::{activity_count, change_percent};
use super::habits::HabitStreakReport;
use super::period::MAX_SERIES_LENGTH;
use super::summary::{
    compute_series_point, compute_summary, ActivityBreakdown, SummaryStats, TimeSeriesPoint,
};
use crate::cache::StatsCache;
use crate::error::{Error, Result};
use crate::store::{RecordSnapshot, RecordStore};
use crate::types::{ActivityKind, Period};
use chrono::{Local, NaiveDate, NaiveDateTime};
use std::sync::Arc;
use tokio::task::{JoinError, JoinHandle};

/// Current local wall-clock time.
fn now() -> NaiveDateTime {
    Local::now().naive_local()
}

/// Async analytics over a [`RecordStore`].
pub struct SummaryService {
    store: Arc<dyn RecordStore>,
    cache: Option<StatsCache<SummaryStats>>,
}

impl SummaryService {
    /// Create a service reading from `store`, without caching.
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store, cache: None }
    }

    /// Cache summary stats in `cache`.
    pub fn with_cache(mut self, cache: StatsCache<SummaryStats>) -> Self {
        tracing::debug!(ttl_secs = cache.ttl().as_secs(), "Summary cache enabled");
        self.cache = Some(cache);
        self
    }

    /// Drop every cached summary (call after writing to the store).
    pub fn invalidate_cache(&self) {
        if let Some(cache) = &self.cache {
            cache.clear();
        }
    }

    /// Read every record type concurrently.
    pub async fn fetch_snapshot(&self) -> Result<RecordSnapshot> {
        let tasks = spawn_fetch(&self.store, |store| store.tasks());
        let events = spawn_fetch(&self.store, |store| store.events());
        let habits = spawn_fetch(&self.store, |store| store.habits());

        let (tasks, events, habits) = tokio::join!(tasks, events, habits);

        Ok(RecordSnapshot {
            tasks: joined(tasks)?,
            events: joined(events)?,
            habits: joined(habits)?,
        })
    }

    /// Summary stats for the current `period`.
    pub async fn summary_stats(&self, period: Period) -> SummaryStats {
        self.summary_stats_at(period, now()).await
    }

    /// Summary stats for the `period` containing `reference`.
    pub async fn summary_stats_at(&self, period: Period, reference: NaiveDateTime) -> SummaryStats {
        let range = period.resolve(reference);
        let key = format!("summary:{}:{}", period, range.label());

        if let Some(stats) = self.cache.as_ref().and_then(|c| c.get(&key)) {
            tracing::debug!(%period, key = %key, "Summary served from cache");
            return stats;
        }

        match self.fetch_snapshot().await {
            Ok(snapshot) => {
                let stats = compute_summary(&snapshot, &range);
                tracing::debug!(
                    %period,
                    start = %range.start,
                    total_tasks = stats.total_tasks,
                    productivity_score = stats.productivity_score,
                    "Computed summary stats"
                );
                if let Some(cache) = &self.cache {
                    cache.set(key, stats.clone());
                }
                stats
            }
            Err(e) => {
                tracing::warn!(%period, error = %e, "Failed to compute summary stats");
                SummaryStats::default()
            }
        }
    }

    /// Trend series of `count` sub-periods ending with the current one.
    pub async fn time_series(&self, period: Period, count: usize) -> Vec<TimeSeriesPoint> {
        self.time_series_at(period, count, now()).await
    }

    /// Trend series of `count` sub-periods ending with the one containing
    /// `reference`, oldest first.
    ///
    /// Each sub-period is fetched on its own; a failure zeroes only that point.
    /// `count` is capped at [`MAX_SERIES_LENGTH`].
    pub async fn time_series_at(
        &self,
        period: Period,
        count: usize,
        reference: NaiveDateTime,
    ) -> Vec<TimeSeriesPoint> {
        if count > MAX_SERIES_LENGTH {
            tracing::warn!(
                %period,
                count,
                max = MAX_SERIES_LENGTH,
                "Series length capped"
            );
        }

        let ranges = period.previous_periods(reference, count);
        let mut points = Vec::with_capacity(ranges.len());
        for range in ranges {
            let point = match self.fetch_snapshot().await {
                Ok(snapshot) => compute_series_point(&snapshot, &range),
                Err(e) => {
                    tracing::warn!(
                        %period,
                        start = %range.start,
                        error = %e,
                        "Failed to compute series point"
                    );
                    TimeSeriesPoint::zeroed(&range)
                }
            };
            points.push(point);
        }
        points
    }

    /// Unfiltered totals of every record type.
    pub async fn activity_breakdown(&self) -> ActivityBreakdown {
        match self.fetch_snapshot().await {
            Ok(snapshot) => ActivityBreakdown::from_snapshot(&snapshot),
            Err(e) => {
                tracing::warn!(error = %e, "Failed to compute activity breakdown");
                ActivityBreakdown::default()
            }
        }
    }

    /// Percentage change of `kind` between the current and previous `period`.
    pub async fn percentage_change(&self, period: Period, kind: ActivityKind) -> i64 {
        self.percentage_change_at(period, kind, now()).await
    }

    /// Percentage change of `kind` between the `period` containing
    /// `reference` and the one before it.
    pub async fn percentage_change_at(
        &self,
        period: Period,
        kind: ActivityKind,
        reference: NaiveDateTime,
    ) -> i64 {
        if kind == ActivityKind::Productivity {
            return 0;
        }

        let current_range = period.resolve(reference);
        let previous_range = period.previous(reference);

        match self.fetch_snapshot().await {
            Ok(snapshot) => {
                let current = activity_count(&snapshot, &current_range, kind);
                let previous = previous_range
                    .map_or(0, |range| activity_count(&snapshot, &range, kind));
                let change = change_percent(current, previous);
                tracing::debug!(%period, %kind, current, previous, change, "Computed change");
                change
            }
            Err(e) => {
                tracing::warn!(%period, %kind, error = %e, "Failed to compute percentage change");
                0
            }
        }
    }

    /// Streaks for every habit as of `today`.
    pub async fn habit_streaks(&self, today: NaiveDate) -> Vec<HabitStreakReport> {
        let habits = joined(spawn_fetch(&self.store, |store| store.habits()).await);
        match habits {
            Ok(habits) => habits
                .iter()
                .map(|habit| HabitStreakReport::new(habit, today))
                .collect(),
            Err(e) => {
                tracing::warn!(error = %e, "Failed to compute habit streaks");
                Vec::new()
            }
        }
    }
}

fn spawn_fetch<T, F>(store: &Arc<dyn RecordStore>, fetch: F) -> JoinHandle<Result<T>>
where
    T: Send + 'static,
    F: FnOnce(&dyn RecordStore) -> Result<T> + Send + 'static,
{
    let store = Arc::clone(store);
    tokio::task::spawn_blocking(move || fetch(store.as_ref()))
}

fn joined<T>(result: std::result::Result<Result<T>, JoinError>) -> Result<T> {
    result.map_err(|e| Error::Runtime(format!("record fetch task failed: {}", e)))?
}

/// Synchronous wrapper for [`SummaryService`]
///
/// Provides blocking methods for use in synchronous code.
pub struct SyncSummaryService {
    inner: SummaryService,
    runtime: tokio::runtime::Runtime,
}

impl SyncSummaryService {
    /// Create a blocking service reading from `store`.
    pub fn new(store: Arc<dyn RecordStore>) -> Result<Self> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| Error::Runtime(format!("failed to create runtime: {}", e)))?;

        Ok(Self {
            inner: SummaryService::new(store),
            runtime,
        })
    }

    /// Cache summary stats in `cache`.
    pub fn with_cache(mut self, cache: StatsCache<SummaryStats>) -> Self {
        self.inner = self.inner.with_cache(cache);
        self
    }

    pub fn summary_stats(&self, period: Period) -> SummaryStats {
        self.runtime.block_on(self.inner.summary_stats(period))
    }

    pub fn summary_stats_at(&self, period: Period, reference: NaiveDateTime) -> SummaryStats {
        self.runtime
            .block_on(self.inner.summary_stats_at(period, reference))
    }

    pub fn time_series(&self, period: Period, count: usize) -> Vec<TimeSeriesPoint> {
        self.runtime.block_on(self.inner.time_series(period, count))
    }

    pub fn time_series_at(
        &self,
        period: Period,
        count: usize,
        reference: NaiveDateTime,
    ) -> Vec<TimeSeriesPoint> {
        self.runtime
            .block_on(self.inner.time_series_at(period, count, reference))
    }

    pub fn activity_breakdown(&self) -> ActivityBreakdown {
        self.runtime.block_on(self.inner.activity_breakdown())
    }

    pub fn percentage_change(&self, period: Period, kind: ActivityKind) -> i64 {
        self.runtime
            .block_on(self.inner.percentage_change(period, kind))
    }

    pub fn percentage_change_at(
        &self,
        period: Period,
        kind: ActivityKind,
        reference: NaiveDateTime,
    ) -> i64 {
        self.runtime
            .block_on(self.inner.percentage_change_at(period, kind, reference))
    }

    pub fn habit_streaks(&self, today: NaiveDate) -> Vec<HabitStreakReport> {
        self.runtime.block_on(self.inner.habit_streaks(today))
    }

    pub fn invalidate_cache(&self) {
        self.inner.invalidate_cache();
    }
}
