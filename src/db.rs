//src/db.rs
use chrono::{DateTime, Utc};
use rusqlite::{named_params, params, Connection, OptionalExtension, Row};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::model::SetType;
use crate::stats::WorkoutTotals;

#[derive(Debug, Clone, PartialEq)]
pub struct Workout {
    pub id: String,
    pub performed_at: DateTime<Utc>,
    pub duration_sec: Option<i64>, // NULL only inside an uncommitted transaction
    pub notes: Option<String>,
    pub total_sets: i64,
    pub total_exercises: i64,
    pub total_volume_g: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WorkoutExerciseRow {
    pub id: String,
    pub workout_id: String,
    pub exercise_id: String,
    pub notes: Option<String>,
    pub rest_time: Option<i64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WorkoutSetRow {
    pub id: String,
    pub workout_exercise_id: String,
    pub set_index: i64,
    pub set_type: Option<SetType>,
    pub reps_x10: Option<i64>,
    pub weight_g: Option<i64>,
}

// Custom Error type for DB operations
#[derive(Error, Debug)]
pub enum DbError {
    #[error("Database connection failed: {0}")]
    Connection(#[from] rusqlite::Error),
    #[error("Failed to get application data directory")]
    DataDir,
    #[error("I/O error accessing database file")]
    Io(#[from] std::io::Error),
    #[error("Workout not found: ID {0}")]
    WorkoutNotFound(String),
    #[error("Database query failed: {0}")]
    QueryFailed(rusqlite::Error),
    #[error("Database update failed: {0}")]
    UpdateFailed(rusqlite::Error),
    #[error("Database insert failed: {0}")]
    InsertFailed(rusqlite::Error),
    #[error("Database delete failed: {0}")]
    DeleteFailed(rusqlite::Error),
}

const DB_FILE_NAME: &str = "workouts.sqlite";
const APP_DATA_DIR: &str = "liftlog";

/// Gets the path to the SQLite database file within the app's data directory.
pub fn get_db_path() -> Result<PathBuf, DbError> {
    let data_dir = dirs::data_dir().ok_or(DbError::DataDir)?;
    let app_dir = data_dir.join(APP_DATA_DIR);
    if !app_dir.exists() {
        std::fs::create_dir_all(&app_dir)?;
    }
    Ok(app_dir.join(DB_FILE_NAME))
}

/// Opens a connection with foreign keys enforced (cascade delete depends on it).
pub fn open_db<P: AsRef<Path>>(path: P) -> Result<Connection, DbError> {
    let conn = Connection::open(path).map_err(DbError::Connection)?;
    enable_foreign_keys(&conn)?;
    Ok(conn)
}

/// SQLite leaves foreign keys off per connection unless asked.
pub fn enable_foreign_keys(conn: &Connection) -> Result<(), DbError> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")
        .map_err(DbError::Connection)
}

/// Initializes the database tables if they don't exist.
pub fn init_db(conn: &Connection) -> Result<(), DbError> {
    enable_foreign_keys(conn)?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS workout (
            id TEXT PRIMARY KEY,
            performed_at TEXT NOT NULL, -- RFC3339, the draft's start time
            duration_sec INTEGER,
            notes TEXT,
            total_sets INTEGER NOT NULL DEFAULT 0,
            total_exercises INTEGER NOT NULL DEFAULT 0,
            total_volume_g INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            deleted_at TEXT
        )",
        [],
    )
    .map_err(DbError::Connection)?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS workout_exercise (
            id TEXT PRIMARY KEY,
            workout_id TEXT NOT NULL,
            exercise_id TEXT NOT NULL, -- catalog id, the catalog lives elsewhere
            notes TEXT,
            rest_time INTEGER,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            deleted_at TEXT,
            FOREIGN KEY(workout_id) REFERENCES workout(id) ON DELETE CASCADE
        )",
        [],
    )
    .map_err(DbError::Connection)?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS workout_set (
            id TEXT PRIMARY KEY,
            workout_exercise_id TEXT NOT NULL,
            set_index INTEGER NOT NULL, -- 1..N within the workout_exercise
            set_type TEXT CHECK(set_type IN ('warmup', 'normal', 'failure', 'dropset')),
            reps_x10 INTEGER, -- 85 => 8.5 reps
            weight_g INTEGER, -- grams, 0 for bodyweight
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            deleted_at TEXT,
            FOREIGN KEY(workout_exercise_id) REFERENCES workout_exercise(id) ON DELETE CASCADE,
            UNIQUE(workout_exercise_id, set_index)
        )",
        [],
    )
    .map_err(DbError::Connection)?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_workout_performed_at ON workout(performed_at)",
        [],
    )
    .map_err(DbError::Connection)?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_workout_exercise_workout_id ON workout_exercise(workout_id)",
        [],
    )
    .map_err(DbError::Connection)?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_workout_set_we_id ON workout_set(workout_exercise_id, set_index)",
        [],
    )
    .map_err(DbError::Connection)?;

    Ok(())
}

/// Inserts the workout header with placeholder totals and a NULL duration.
pub fn insert_workout(
    conn: &Connection,
    id: &str,
    performed_at: DateTime<Utc>,
    notes: Option<&str>,
    now: DateTime<Utc>,
) -> Result<(), DbError> {
    let now_str = now.to_rfc3339();
    conn.execute(
        "INSERT INTO workout (id, performed_at, duration_sec, notes, total_sets, total_exercises, total_volume_g, created_at, updated_at)
         VALUES (:id, :performed_at, NULL, :notes, 0, 0, 0, :now, :now)",
        named_params! {
            ":id": id,
            ":performed_at": performed_at.to_rfc3339(),
            ":notes": notes,
            ":now": now_str,
        },
    )
    .map_err(DbError::InsertFailed)?;
    Ok(())
}

pub fn insert_workout_exercise(
    conn: &Connection,
    id: &str,
    workout_id: &str,
    exercise_id: &str,
    notes: Option<&str>,
    rest_time: Option<i64>,
    now: DateTime<Utc>,
) -> Result<(), DbError> {
    let now_str = now.to_rfc3339();
    conn.execute(
        "INSERT INTO workout_exercise (id, workout_id, exercise_id, notes, rest_time, created_at, updated_at)
         VALUES (:id, :workout_id, :exercise_id, :notes, :rest_time, :now, :now)",
        named_params! {
            ":id": id,
            ":workout_id": workout_id,
            ":exercise_id": exercise_id,
            ":notes": notes,
            ":rest_time": rest_time,
            ":now": now_str,
        },
    )
    .map_err(DbError::InsertFailed)?;
    Ok(())
}

pub fn insert_workout_set(
    conn: &Connection,
    id: &str,
    workout_exercise_id: &str,
    set_index: i64,
    set_type: SetType,
    reps_x10: i64,
    weight_g: i64,
    now: DateTime<Utc>,
) -> Result<(), DbError> {
    let now_str = now.to_rfc3339();
    conn.execute(
        "INSERT INTO workout_set (id, workout_exercise_id, set_index, set_type, reps_x10, weight_g, created_at, updated_at)
         VALUES (:id, :we_id, :set_index, :set_type, :reps_x10, :weight_g, :now, :now)",
        named_params! {
            ":id": id,
            ":we_id": workout_exercise_id,
            ":set_index": set_index,
            ":set_type": set_type.to_string(),
            ":reps_x10": reps_x10,
            ":weight_g": weight_g,
            ":now": now_str,
        },
    )
    .map_err(DbError::InsertFailed)?;
    Ok(())
}

/// Writes the final duration and totals onto an existing workout row.
pub fn finalize_workout(
    conn: &Connection,
    id: &str,
    duration_sec: i64,
    totals: &WorkoutTotals,
    now: DateTime<Utc>,
) -> Result<(), DbError> {
    let rows_affected = conn
        .execute(
            "UPDATE workout
             SET duration_sec = :duration, total_sets = :sets, total_exercises = :exercises,
                 total_volume_g = :volume, updated_at = :now
             WHERE id = :id",
            named_params! {
                ":duration": duration_sec,
                ":sets": totals.total_sets,
                ":exercises": totals.total_exercises,
                ":volume": totals.total_volume_g,
                ":now": now.to_rfc3339(),
                ":id": id,
            },
        )
        .map_err(DbError::UpdateFailed)?;

    if rows_affected == 0 {
        Err(DbError::WorkoutNotFound(id.to_string()))
    } else {
        Ok(())
    }
}

fn parse_timestamp(idx: usize, value: &str) -> Result<DateTime<Utc>, rusqlite::Error> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
        })
}

// Helper function to map a database row to a Workout struct
fn map_row_to_workout(row: &Row) -> Result<Workout, rusqlite::Error> {
    let performed_at_str: String = row.get(1)?;
    let created_at_str: String = row.get(7)?;
    let updated_at_str: String = row.get(8)?;

    Ok(Workout {
        id: row.get(0)?,
        performed_at: parse_timestamp(1, &performed_at_str)?,
        duration_sec: row.get(2)?,
        notes: row.get(3)?,
        total_sets: row.get(4)?,
        total_exercises: row.get(5)?,
        total_volume_g: row.get(6)?,
        created_at: parse_timestamp(7, &created_at_str)?,
        updated_at: parse_timestamp(8, &updated_at_str)?,
    })
}

const WORKOUT_COLUMNS: &str = "id, performed_at, duration_sec, notes, total_sets, total_exercises, total_volume_g, created_at, updated_at";

/// Retrieves a workout header by id. Soft-deleted workouts are not returned.
pub fn get_workout(conn: &Connection, id: &str) -> Result<Option<Workout>, DbError> {
    let sql = format!("SELECT {WORKOUT_COLUMNS} FROM workout WHERE id = ?1 AND deleted_at IS NULL");
    let mut stmt = conn.prepare(&sql).map_err(DbError::QueryFailed)?;
    stmt.query_row(params![id], map_row_to_workout)
        .optional()
        .map_err(DbError::QueryFailed)
}

/// Lists committed workouts, most recent first.
pub fn list_workouts(conn: &Connection, limit: u32) -> Result<Vec<Workout>, DbError> {
    let sql = format!(
        "SELECT {WORKOUT_COLUMNS} FROM workout
         WHERE deleted_at IS NULL
         ORDER BY performed_at DESC
         LIMIT ?1"
    );
    let mut stmt = conn.prepare(&sql).map_err(DbError::QueryFailed)?;
    let workout_iter = stmt
        .query_map(params![limit], map_row_to_workout)
        .map_err(DbError::QueryFailed)?;

    workout_iter
        .collect::<Result<Vec<_>, _>>()
        .map_err(DbError::QueryFailed)
}

/// Exercises of a workout in insertion order.
pub fn list_workout_exercises(
    conn: &Connection,
    workout_id: &str,
) -> Result<Vec<WorkoutExerciseRow>, DbError> {
    let mut stmt = conn
        .prepare(
            "SELECT id, workout_id, exercise_id, notes, rest_time
             FROM workout_exercise
             WHERE workout_id = ?1 AND deleted_at IS NULL
             ORDER BY rowid ASC",
        )
        .map_err(DbError::QueryFailed)?;
    let iter = stmt
        .query_map(params![workout_id], |row| {
            Ok(WorkoutExerciseRow {
                id: row.get(0)?,
                workout_id: row.get(1)?,
                exercise_id: row.get(2)?,
                notes: row.get(3)?,
                rest_time: row.get(4)?,
            })
        })
        .map_err(DbError::QueryFailed)?;

    iter.collect::<Result<Vec<_>, _>>()
        .map_err(DbError::QueryFailed)
}

fn map_row_to_set(row: &Row) -> Result<WorkoutSetRow, rusqlite::Error> {
    let set_type_str: Option<String> = row.get(3)?;
    let set_type = match set_type_str {
        Some(s) => match SetType::try_from(s.as_str()) {
            Ok(t) => Some(t),
            Err(e) => {
                tracing::warn!("Invalid set type '{}' in DB: {}. Mapping as None.", s, e);
                None
            }
        },
        None => None,
    };

    Ok(WorkoutSetRow {
        id: row.get(0)?,
        workout_exercise_id: row.get(1)?,
        set_index: row.get(2)?,
        set_type,
        reps_x10: row.get(4)?,
        weight_g: row.get(5)?,
    })
}

/// Sets of one workout exercise ordered by `set_index`.
pub fn list_sets_for_workout_exercise(
    conn: &Connection,
    workout_exercise_id: &str,
) -> Result<Vec<WorkoutSetRow>, DbError> {
    let mut stmt = conn
        .prepare(
            "SELECT id, workout_exercise_id, set_index, set_type, reps_x10, weight_g
             FROM workout_set
             WHERE workout_exercise_id = ?1 AND deleted_at IS NULL
             ORDER BY set_index ASC",
        )
        .map_err(DbError::QueryFailed)?;
    let iter = stmt
        .query_map(params![workout_exercise_id], map_row_to_set)
        .map_err(DbError::QueryFailed)?;

    iter.collect::<Result<Vec<_>, _>>()
        .map_err(DbError::QueryFailed)
}

/// Deletes a workout; its exercises and sets go with it via ON DELETE CASCADE.
pub fn delete_workout(conn: &Connection, id: &str) -> Result<usize, DbError> {
    let rows_affected = conn
        .execute("DELETE FROM workout WHERE id = ?1", params![id])
        .map_err(DbError::DeleteFailed)?;

    if rows_affected == 0 {
        Err(DbError::WorkoutNotFound(id.to_string()))
    } else {
        Ok(rows_affected)
    }
}
