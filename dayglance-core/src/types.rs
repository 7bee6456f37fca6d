//! Core domain types for dayglance
//!
//! Records are parsed once at the store boundary: date strings become
//! local wall-clock values, the stored `completed_dates` JSON array becomes
//! an ordered set, and 0/1 completion flags become booleans. Everything past
//! the boundary works with these types only.
//!
//! ## Terminology
//!
//! | Term | Definition |
//! |------|------------|
//! | **Period** | A named granularity (daily, weekly, monthly) used to bucket records |
//! | **Sub-period** | One bucket within a trend series (e.g. one of the last 8 weeks) |
//! | **Active habit** | A habit with at least one completion date inside a range |
//! | **Overlapping habit** | A habit whose start/end dates intersect a range |

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

// ============================================
// Records
// ============================================

/// A to-do item with an optional deadline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: i64,
    pub title: String,
    /// Local deadline; `None` when missing or unparseable
    pub deadline: Option<NaiveDateTime>,
    pub completed: bool,
}

/// A calendar event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub id: i64,
    pub title: String,
    /// Local start time; `None` when missing or unparseable
    pub start_time: Option<NaiveDateTime>,
    /// Whether the event was attended
    pub completed: bool,
}

/// A recurring habit and the days it was checked off.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Habit {
    pub id: i64,
    pub name: String,
    /// First day the habit runs; `None` when missing or unparseable
    pub start_date: Option<NaiveDate>,
    /// Last day the habit runs; `None` means open ended
    pub end_date: Option<NaiveDate>,
    /// Days the habit was completed
    pub completed_dates: BTreeSet<NaiveDate>,
}

/// New task to insert (id assigned by the store).
#[derive(Debug, Clone)]
pub struct NewTask {
    pub title: String,
    pub deadline: Option<NaiveDateTime>,
    pub completed: bool,
}

/// New event to insert (id assigned by the store).
#[derive(Debug, Clone)]
pub struct NewEvent {
    pub title: String,
    pub start_time: Option<NaiveDateTime>,
    pub completed: bool,
}

/// New habit to insert (id assigned by the store).
#[derive(Debug, Clone)]
pub struct NewHabit {
    pub name: String,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
}

// ============================================
// Period
// ============================================

/// Aggregation granularity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Period {
    Daily,
    Weekly,
    Monthly,
}

impl Period {
    /// Returns the identifier used in config files and on the command line
    pub fn as_str(&self) -> &'static str {
        match self {
            Period::Daily => "daily",
            Period::Weekly => "weekly",
            Period::Monthly => "monthly",
        }
    }
}

impl std::fmt::Display for Period {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Period {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "daily" | "day" => Ok(Period::Daily),
            "weekly" | "week" => Ok(Period::Weekly),
            "monthly" | "month" => Ok(Period::Monthly),
            _ => Err(format!("unknown period: {}", s)),
        }
    }
}

// ============================================
// Activity kinds
// ============================================

/// Which activity a percentage change is computed for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivityKind {
    /// Completed tasks
    Tasks,
    /// All events
    Events,
    /// Habits with a completion in range
    Habits,
    /// Productivity score (not computed by the change calculator)
    Productivity,
}

impl ActivityKind {
    /// Returns the identifier used on the command line
    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityKind::Tasks => "tasks",
            ActivityKind::Events => "events",
            ActivityKind::Habits => "habits",
            ActivityKind::Productivity => "productivity",
        }
    }
}

impl std::fmt::Display for ActivityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for ActivityKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "tasks" | "task" => Ok(ActivityKind::Tasks),
            "events" | "event" => Ok(ActivityKind::Events),
            "habits" | "habit" => Ok(ActivityKind::Habits),
            "productivity" => Ok(ActivityKind::Productivity),
            _ => Err(format!("unknown activity kind: {}", s)),
        }
    }
}
