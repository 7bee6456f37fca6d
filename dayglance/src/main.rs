//! dayglance - task, event and habit analytics CLI
//!
//! Records tasks, events and habit check-ins in a local SQLite store and
//! summarises them per day, week or month.

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate, NaiveDateTime};
use clap::{Parser, Subcommand};
use dayglance_core::analytics::{
    format_change, ActivityBreakdown, HabitStreakReport, PeriodRange, SummaryStats,
    SyncSummaryService, TimeSeriesPoint, MAX_SERIES_LENGTH,
};
use dayglance_core::config::AnalyticsConfig;
use dayglance_core::store::{parse_date, parse_instant};
use dayglance_core::{
    ActivityKind, Config, Database, NewEvent, NewHabit, NewTask, Period, StatsCache,
};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(name = "dayglance")]
#[command(about = "Summaries of your tasks, events and habits")]
#[command(version)]
struct Args {
    /// Database file (default: $XDG_DATA_HOME/dayglance/data.db)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Print JSON instead of text
    #[arg(long, global = true)]
    json: bool,

    /// Evaluate periods as of this local time instead of now
    #[arg(long, global = true, value_parser = parse_when)]
    at: Option<NaiveDateTime>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Summary statistics for the current period
    Summary {
        /// daily, weekly or monthly (default from config)
        #[arg(short, long)]
        period: Option<Period>,
    },
    /// Productivity trend over recent periods
    Trend {
        #[arg(short, long)]
        period: Option<Period>,

        /// Number of periods, oldest first (default from config, at most 366)
        #[arg(short, long, value_parser = parse_count)]
        count: Option<usize>,
    },
    /// Total number of tasks, events and habits
    Breakdown,
    /// Change against the previous period
    Change {
        /// tasks, events, habits or productivity
        #[arg(short, long)]
        kind: ActivityKind,

        #[arg(short, long)]
        period: Option<Period>,
    },
    /// Current and longest streak of every habit
    Streaks,
    /// Manage tasks
    #[command(subcommand)]
    Task(TaskCommand),
    /// Manage events
    #[command(subcommand)]
    Event(EventCommand),
    /// Manage habits
    #[command(subcommand)]
    Habit(HabitCommand),
}

#[derive(Subcommand, Debug)]
enum TaskCommand {
    /// Add a task
    Add {
        title: String,

        /// Due date or date-time (e.g. 2024-03-15 or 2024-03-15T17:00)
        #[arg(long, value_parser = parse_when)]
        deadline: Option<NaiveDateTime>,

        /// Mark the task completed right away
        #[arg(long)]
        done: bool,
    },
    /// Mark a task completed
    Complete { id: i64 },
}

#[derive(Subcommand, Debug)]
enum EventCommand {
    /// Add an event
    Add {
        title: String,

        /// Start date or date-time
        #[arg(long, value_parser = parse_when)]
        start: Option<NaiveDateTime>,

        /// Mark the event attended right away
        #[arg(long)]
        done: bool,
    },
    /// Mark an event attended
    Complete { id: i64 },
}

#[derive(Subcommand, Debug)]
enum HabitCommand {
    /// Add a habit
    Add {
        name: String,

        #[arg(long, value_parser = parse_day)]
        start: NaiveDate,

        #[arg(long, value_parser = parse_day)]
        end: Option<NaiveDate>,
    },
    /// Record a completion (default: today)
    CheckIn {
        id: i64,

        #[arg(long, value_parser = parse_day)]
        date: Option<NaiveDate>,
    },
}

fn parse_when(raw: &str) -> std::result::Result<NaiveDateTime, String> {
    parse_instant(raw).ok_or_else(|| format!("invalid date or date-time: {}", raw))
}

fn parse_count(raw: &str) -> std::result::Result<usize, String> {
    let count: usize = raw
        .parse()
        .map_err(|_| format!("invalid count: {}", raw))?;
    if !(1..=MAX_SERIES_LENGTH).contains(&count) {
        return Err(format!("count must be between 1 and {}", MAX_SERIES_LENGTH));
    }
    Ok(count)
}

fn parse_day(raw: &str) -> std::result::Result<NaiveDate, String> {
    parse_date(raw).ok_or_else(|| format!("invalid date: {}", raw))
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Load configuration
    let config = Config::load().context("failed to load configuration")?;
    let _log_guard = dayglance_core::logging::init(&config.logging).ok();

    // Open database
    let db_path = args.db.clone().unwrap_or_else(Config::database_path);
    let db = Database::open(&db_path)
        .with_context(|| format!("failed to open database at {}", db_path.display()))?;
    db.migrate().context("failed to run database migrations")?;

    let reference = args.at.unwrap_or_else(|| Local::now().naive_local());
    let analytics = &config.analytics;

    match args.command {
        Command::Task(command) => run_task(&db, command, args.json),
        Command::Event(command) => run_event(&db, command, args.json),
        Command::Habit(command) => run_habit(&db, command, reference.date(), args.json),
        Command::Summary { period } => {
            let period = period.unwrap_or(analytics.default_period);
            let stats = open_service(db, analytics)?.summary_stats_at(period, reference);
            let range = period.resolve(reference);
            if args.json {
                print_json(&SummaryOutput {
                    period,
                    start: range.start.date(),
                    end: range.end.date(),
                    stats,
                })
            } else {
                print_summary(period, &range, &stats);
                Ok(())
            }
        }
        Command::Trend { period, count } => {
            let period = period.unwrap_or(analytics.default_period);
            let count = count.unwrap_or(analytics.series_length);
            let series = open_service(db, analytics)?.time_series_at(period, count, reference);
            if args.json {
                print_json(&series)
            } else {
                print_trend(period, &series);
                Ok(())
            }
        }
        Command::Breakdown => {
            let breakdown = open_service(db, analytics)?.activity_breakdown();
            if args.json {
                print_json(&breakdown)
            } else {
                print_breakdown(&breakdown);
                Ok(())
            }
        }
        Command::Change { kind, period } => {
            let period = period.unwrap_or(analytics.default_period);
            let change = open_service(db, analytics)?.percentage_change_at(period, kind, reference);
            if args.json {
                print_json(&ChangeOutput {
                    period,
                    kind,
                    change,
                })
            } else {
                println!("{} ({}): {}", kind, period, format_change(change));
                Ok(())
            }
        }
        Command::Streaks => {
            let streaks = open_service(db, analytics)?.habit_streaks(reference.date());
            if args.json {
                print_json(&streaks)
            } else {
                print_streaks(&streaks);
                Ok(())
            }
        }
    }
}

fn open_service(db: Database, analytics: &AnalyticsConfig) -> Result<SyncSummaryService> {
    let service =
        SyncSummaryService::new(Arc::new(db)).context("failed to start analytics runtime")?;
    Ok(match analytics.cache_ttl() {
        Some(ttl) => service.with_cache(StatsCache::new(ttl)),
        None => service,
    })
}

// ============================================
// Record commands
// ============================================

#[derive(Serialize)]
struct Created {
    id: i64,
}

fn run_task(db: &Database, command: TaskCommand, json: bool) -> Result<()> {
    match command {
        TaskCommand::Add {
            title,
            deadline,
            done,
        } => {
            let id = db
                .insert_task(&NewTask {
                    title,
                    deadline,
                    completed: done,
                })
                .context("failed to add task")?;
            tracing::info!(task_id = id, "Added task");
            report_created("task", id, json)
        }
        TaskCommand::Complete { id } => {
            db.set_task_completed(id, true)
                .with_context(|| format!("failed to complete task {}", id))?;
            tracing::info!(task_id = id, "Completed task");
            if !json {
                println!("Completed task {}", id);
            }
            Ok(())
        }
    }
}

fn run_event(db: &Database, command: EventCommand, json: bool) -> Result<()> {
    match command {
        EventCommand::Add { title, start, done } => {
            let id = db
                .insert_event(&NewEvent {
                    title,
                    start_time: start,
                    completed: done,
                })
                .context("failed to add event")?;
            tracing::info!(event_id = id, "Added event");
            report_created("event", id, json)
        }
        EventCommand::Complete { id } => {
            db.set_event_completed(id, true)
                .with_context(|| format!("failed to complete event {}", id))?;
            tracing::info!(event_id = id, "Completed event");
            if !json {
                println!("Completed event {}", id);
            }
            Ok(())
        }
    }
}

fn run_habit(db: &Database, command: HabitCommand, today: NaiveDate, json: bool) -> Result<()> {
    match command {
        HabitCommand::Add { name, start, end } => {
            if end.is_some_and(|end| end < start) {
                anyhow::bail!("Habit end date must not be before its start date");
            }
            let id = db
                .insert_habit(&NewHabit {
                    name,
                    start_date: start,
                    end_date: end,
                })
                .context("failed to add habit")?;
            tracing::info!(habit_id = id, "Added habit");
            report_created("habit", id, json)
        }
        HabitCommand::CheckIn { id, date } => {
            let date = date.unwrap_or(today);
            let recorded = db
                .record_habit_completion(id, date)
                .with_context(|| format!("failed to check in habit {}", id))?;
            tracing::info!(habit_id = id, %date, recorded, "Habit check-in");

            let habit = db
                .get_habit(id)
                .with_context(|| format!("failed to load habit {}", id))?
                .with_context(|| format!("habit {} disappeared after check-in", id))?;
            let streak = HabitStreakReport::new(&habit, today);

            if json {
                return print_json(&CheckIn {
                    date,
                    recorded,
                    streak,
                });
            }
            if recorded {
                println!("Checked in {} on {}", habit.name, date);
            } else {
                println!("{} was already checked in on {}", habit.name, date);
            }
            println!(
                "   Current streak: {} day{}",
                streak.current_streak,
                if streak.current_streak == 1 { "" } else { "s" }
            );
            Ok(())
        }
    }
}

#[derive(Serialize)]
struct CheckIn {
    date: NaiveDate,
    recorded: bool,
    #[serde(flatten)]
    streak: HabitStreakReport,
}

fn report_created(kind: &str, id: i64, json: bool) -> Result<()> {
    if json {
        print_json(&Created { id })
    } else {
        println!("Added {} {}", kind, id);
        Ok(())
    }
}

// ============================================
// Output
// ============================================

#[derive(Serialize)]
struct SummaryOutput {
    period: Period,
    start: NaiveDate,
    end: NaiveDate,
    #[serde(flatten)]
    stats: SummaryStats,
}

#[derive(Serialize)]
struct ChangeOutput {
    period: Period,
    kind: ActivityKind,
    change: i64,
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("failed to serialize output")?;
    println!("{}", json);
    Ok(())
}

fn capitalized(period: Period) -> &'static str {
    match period {
        Period::Daily => "Daily",
        Period::Weekly => "Weekly",
        Period::Monthly => "Monthly",
    }
}

fn print_summary(period: Period, range: &PeriodRange, stats: &SummaryStats) {
    println!(
        "{} summary ({} to {})",
        capitalized(period),
        range.start.date(),
        range.end.date()
    );
    println!();
    println!(
        "   Tasks:   {}/{} completed ({}%)",
        stats.completed_tasks, stats.total_tasks, stats.completion_rate
    );
    println!(
        "   Events:  {} total, {} upcoming ({}% attended)",
        stats.total_events, stats.upcoming_events, stats.event_attendance_rate
    );
    println!(
        "   Habits:  {}/{} active ({:.1}%)",
        stats.active_habits, stats.total_habits, stats.habit_completion_rate
    );
    println!();
    println!("   Productivity score: {}", stats.productivity_score);
}

fn print_trend(period: Period, series: &[TimeSeriesPoint]) {
    println!("{} productivity trend", capitalized(period));
    println!();
    for point in series {
        let bar = "#".repeat((point.completed / 5) as usize);
        println!("   {}  {:>3}  {}", point.date, point.completed, bar);
    }
}

fn print_breakdown(breakdown: &ActivityBreakdown) {
    println!("   Tasks:   {}", breakdown.tasks);
    println!("   Events:  {}", breakdown.events);
    println!("   Habits:  {}", breakdown.habits);
    println!("   Total:   {}", breakdown.total());
}

fn print_streaks(streaks: &[HabitStreakReport]) {
    if streaks.is_empty() {
        println!("No habits yet. Add one with 'dayglance habit add'.");
        return;
    }

    let width = streaks.iter().map(|s| s.name.len()).max().unwrap_or(0);
    for streak in streaks {
        println!(
            "   {:<width$}  current {:>3} day{}  longest {:>3} day{}",
            streak.name,
            streak.current_streak,
            if streak.current_streak == 1 { "" } else { "s" },
            streak.longest_streak,
            if streak.longest_streak == 1 { "" } else { "s" },
            width = width
        );
    }
}
