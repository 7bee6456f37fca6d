//! Database repository layer
//!
//! Provides query and insert operations for tasks, events and habits.

use crate::error::{Error, Result};
use crate::store::{
    parse_completed_dates, parse_completed_dates_strict, parse_date, parse_instant,
    serialize_completed_dates,
};
use crate::store::RecordStore;
use crate::types::*;
use chrono::{NaiveDate, NaiveDateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

const STORED_DATETIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";
const STORED_DATE_FORMAT: &str = "%Y-%m-%d";

/// Database handle (single connection)
pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    /// Open or create a database at the given path
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            ",
        )?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Open an in-memory database (for testing)
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Run migrations on this database
    pub fn migrate(&self) -> Result<()> {
        let conn = self.conn()?;
        super::schema::run_migrations(&conn)
    }

    /// Lock the underlying connection
    pub fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| Error::Store("database connection lock poisoned".to_string()))
    }

    // ============================================
    // Task operations
    // ============================================

    /// Insert a task, returning its id
    pub fn insert_task(&self, task: &NewTask) -> Result<i64> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO tasks (title, deadline, completed, created_at) VALUES (?1, ?2, ?3, ?4)",
            params![
                task.title,
                task.deadline.map(format_datetime),
                task.completed as i64,
                Utc::now().to_rfc3339(),
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// Mark a task done or not done
    pub fn set_task_completed(&self, id: i64, completed: bool) -> Result<()> {
        let conn = self.conn()?;
        let updated = conn.execute(
            "UPDATE tasks SET completed = ?1 WHERE id = ?2",
            params![completed as i64, id],
        )?;
        if updated == 0 {
            return Err(Error::NotFound { kind: "task", id });
        }
        Ok(())
    }

    /// List all tasks ordered by id
    pub fn list_tasks(&self) -> Result<Vec<Task>> {
        let conn = self.conn()?;
        let mut stmt =
            conn.prepare("SELECT id, title, deadline, completed FROM tasks ORDER BY id")?;
        let tasks = stmt
            .query_map([], Self::row_to_task)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(tasks)
    }

    fn row_to_task(row: &Row) -> rusqlite::Result<Task> {
        let deadline: Option<String> = row.get("deadline")?;
        let completed: i64 = row.get("completed")?;

        Ok(Task {
            id: row.get("id")?,
            title: row.get("title")?,
            deadline: deadline.as_deref().and_then(parse_instant),
            completed: completed == 1,
        })
    }

    // ============================================
    // Event operations
    // ============================================

    /// Insert an event, returning its id
    pub fn insert_event(&self, event: &NewEvent) -> Result<i64> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO events (title, start_time, completed, created_at) VALUES (?1, ?2, ?3, ?4)",
            params![
                event.title,
                event.start_time.map(format_datetime),
                event.completed as i64,
                Utc::now().to_rfc3339(),
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// Mark an event attended or not attended
    pub fn set_event_completed(&self, id: i64, completed: bool) -> Result<()> {
        let conn = self.conn()?;
        let updated = conn.execute(
            "UPDATE events SET completed = ?1 WHERE id = ?2",
            params![completed as i64, id],
        )?;
        if updated == 0 {
            return Err(Error::NotFound { kind: "event", id });
        }
        Ok(())
    }

    /// List all events ordered by id
    pub fn list_events(&self) -> Result<Vec<Event>> {
        let conn = self.conn()?;
        let mut stmt =
            conn.prepare("SELECT id, title, start_time, completed FROM events ORDER BY id")?;
        let events = stmt
            .query_map([], Self::row_to_event)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(events)
    }

    fn row_to_event(row: &Row) -> rusqlite::Result<Event> {
        let start_time: Option<String> = row.get("start_time")?;
        let completed: i64 = row.get("completed")?;

        Ok(Event {
            id: row.get("id")?,
            title: row.get("title")?,
            start_time: start_time.as_deref().and_then(parse_instant),
            completed: completed == 1,
        })
    }

    // ============================================
    // Habit operations
    // ============================================

    /// Insert a habit with no completions, returning its id
    pub fn insert_habit(&self, habit: &NewHabit) -> Result<i64> {
        let conn = self.conn()?;
        conn.execute(
            r#"
            INSERT INTO habits (name, start_date, end_date, completed_dates, created_at)
            VALUES (?1, ?2, ?3, '[]', ?4)
            "#,
            params![
                habit.name,
                format_date(habit.start_date),
                habit.end_date.map(format_date),
                Utc::now().to_rfc3339(),
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// Get a habit by id
    pub fn get_habit(&self, id: i64) -> Result<Option<Habit>> {
        let conn = self.conn()?;
        conn.query_row(
            "SELECT id, name, start_date, end_date, completed_dates FROM habits WHERE id = ?",
            [id],
            Self::row_to_habit,
        )
        .optional()
        .map_err(Error::from)
    }

    /// List all habits ordered by id
    pub fn list_habits(&self) -> Result<Vec<Habit>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT id, name, start_date, end_date, completed_dates FROM habits ORDER BY id",
        )?;
        let habits = stmt
            .query_map([], Self::row_to_habit)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(habits)
    }

    /// Record a completion of `id` on `date`.
    ///
    /// Returns false if the habit was already completed that day. Fails without
    /// writing if the stored completion dates are malformed.
    pub fn record_habit_completion(&self, id: i64, date: NaiveDate) -> Result<bool> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;

        let raw: Option<Option<String>> = tx
            .query_row(
                "SELECT completed_dates FROM habits WHERE id = ?",
                [id],
                |row| row.get(0),
            )
            .optional()?;
        let raw = raw.ok_or(Error::NotFound { kind: "habit", id })?;

        let mut dates = parse_completed_dates_strict(raw.as_deref())?;
        if !dates.insert(date) {
            return Ok(false);
        }

        tx.execute(
            "UPDATE habits SET completed_dates = ?1 WHERE id = ?2",
            params![serialize_completed_dates(&dates)?, id],
        )?;
        tx.commit()?;

        tracing::debug!(habit_id = id, %date, "Recorded habit completion");
        Ok(true)
    }

    fn row_to_habit(row: &Row) -> rusqlite::Result<Habit> {
        let start_date: Option<String> = row.get("start_date")?;
        let end_date: Option<String> = row.get("end_date")?;
        let completed_dates: Option<String> = row.get("completed_dates")?;

        Ok(Habit {
            id: row.get("id")?,
            name: row.get("name")?,
            start_date: start_date.as_deref().and_then(parse_date),
            end_date: end_date.as_deref().and_then(parse_date),
            completed_dates: parse_completed_dates(completed_dates.as_deref()),
        })
    }
}

impl RecordStore for Database {
    fn tasks(&self) -> Result<Vec<Task>> {
        self.list_tasks()
    }

    fn events(&self) -> Result<Vec<Event>> {
        self.list_events()
    }

    fn habits(&self) -> Result<Vec<Habit>> {
        self.list_habits()
    }
}

fn format_datetime(dt: NaiveDateTime) -> String {
    dt.format(STORED_DATETIME_FORMAT).to_string()
}

fn format_date(date: NaiveDate) -> String {
    date.format(STORED_DATE_FORMAT).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_db() -> Database {
        let db = Database::open_in_memory().unwrap();
        db.migrate().unwrap();
        db
    }

    fn at(y: i32, m: u32, d: u32, h: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, 0, 0)
            .unwrap()
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_task_crud() {
        let db = test_db();

        let id = db
            .insert_task(&NewTask {
                title: "Write report".to_string(),
                deadline: Some(at(2024, 3, 12, 17)),
                completed: false,
            })
            .unwrap();

        db.set_task_completed(id, true).unwrap();

        let tasks = db.list_tasks().unwrap();
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].title, "Write report");
        assert_eq!(tasks[0].deadline, Some(at(2024, 3, 12, 17)));
        assert!(tasks[0].completed);
    }

    #[test]
    fn test_set_completed_unknown_id() {
        let db = test_db();
        let err = db.set_task_completed(99, true).unwrap_err();
        assert!(matches!(err, Error::NotFound { kind: "task", id: 99 }));
        let err = db.set_event_completed(7, true).unwrap_err();
        assert!(matches!(err, Error::NotFound { kind: "event", id: 7 }));
    }

    #[test]
    fn test_event_crud() {
        let db = test_db();
        let id = db
            .insert_event(&NewEvent {
                title: "Standup".to_string(),
                start_time: Some(at(2024, 3, 11, 9)),
                completed: false,
            })
            .unwrap();
        db.set_event_completed(id, true).unwrap();

        let events = db.list_events().unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].start_time, Some(at(2024, 3, 11, 9)));
        assert!(events[0].completed);
    }

    #[test]
    fn test_habit_completion_is_recorded_once() {
        let db = test_db();
        let id = db
            .insert_habit(&NewHabit {
                name: "Stretch".to_string(),
                start_date: date(2024, 3, 1),
                end_date: None,
            })
            .unwrap();

        assert!(db.record_habit_completion(id, date(2024, 3, 10)).unwrap());
        assert!(!db.record_habit_completion(id, date(2024, 3, 10)).unwrap());
        assert!(db.record_habit_completion(id, date(2024, 3, 9)).unwrap());

        let habit = db.get_habit(id).unwrap().unwrap();
        assert_eq!(habit.start_date, Some(date(2024, 3, 1)));
        assert_eq!(habit.end_date, None);
        assert_eq!(
            habit.completed_dates.into_iter().collect::<Vec<_>>(),
            vec![date(2024, 3, 9), date(2024, 3, 10)]
        );

        let raw: String = db
            .conn()
            .unwrap()
            .query_row("SELECT completed_dates FROM habits WHERE id = ?", [id], |r| {
                r.get(0)
            })
            .unwrap();
        assert_eq!(raw, r#"["2024-03-09","2024-03-10"]"#);
    }

    #[test]
    fn test_habit_completion_unknown_habit() {
        let db = test_db();
        let err = db.record_habit_completion(5, date(2024, 3, 10)).unwrap_err();
        assert!(matches!(err, Error::NotFound { kind: "habit", id: 5 }));
    }

    #[test]
    fn test_malformed_rows_degrade_to_missing_values() {
        let db = test_db();
        {
            let conn = db.conn().unwrap();
            conn.execute(
                "INSERT INTO tasks (title, deadline, completed, created_at) VALUES ('x', 'next week', 1, 'now')",
                [],
            )
            .unwrap();
            conn.execute(
                "INSERT INTO habits (name, start_date, completed_dates, created_at) VALUES ('y', '2024-03-01', '[oops', 'now')",
                [],
            )
            .unwrap();
        }

        let tasks = db.tasks().unwrap();
        assert_eq!(tasks[0].deadline, None);
        assert!(tasks[0].completed);

        let habits = db.habits().unwrap();
        assert!(habits[0].completed_dates.is_empty());
    }

    fn corrupt_completions(db: &Database, id: i64, raw: &str) {
        db.conn()
            .unwrap()
            .execute(
                "UPDATE habits SET completed_dates = ?1 WHERE id = ?2",
                params![raw, id],
            )
            .unwrap();
    }

    fn stored_completions(db: &Database, id: i64) -> String {
        db.conn()
            .unwrap()
            .query_row("SELECT completed_dates FROM habits WHERE id = ?", [id], |r| {
                r.get(0)
            })
            .unwrap()
    }

    #[test]
    fn test_completion_refuses_to_overwrite_malformed_history() {
        let db = test_db();
        let id = db
            .insert_habit(&NewHabit {
                name: "Run".to_string(),
                start_date: date(2024, 3, 1),
                end_date: None,
            })
            .unwrap();

        let truncated = r#"["2024-03-01","2024-03-02""#;
        corrupt_completions(&db, id, truncated);
        let err = db.record_habit_completion(id, date(2024, 3, 10)).unwrap_err();
        assert!(matches!(err, Error::Json(_)));
        assert_eq!(stored_completions(&db, id), truncated);

        let bad_entry = r#"["2024-03-01","someday"]"#;
        corrupt_completions(&db, id, bad_entry);
        let err = db.record_habit_completion(id, date(2024, 3, 10)).unwrap_err();
        assert!(matches!(err, Error::Store(_)));
        assert_eq!(stored_completions(&db, id), bad_entry);

        // reads still degrade gracefully
        let habit = db.get_habit(id).unwrap().unwrap();
        assert_eq!(habit.completed_dates.len(), 1);
    }
}
