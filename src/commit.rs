//src/commit.rs
//! Turns a finished draft into durable rows inside one transaction.
use chrono::{DateTime, Utc};
use rusqlite::{Connection, TransactionBehavior};
use thiserror::Error;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::db::{self, DbError};
use crate::model::ActiveWorkoutDraft;
use crate::stats::{elapsed_secs, WorkoutTotals};
use crate::units::{self, UnitError};

#[derive(Error, Debug)]
pub enum CommitError {
    #[error(transparent)]
    Db(#[from] DbError),
    #[error("Draft contains an invalid set: {0}")]
    InvalidSet(#[from] UnitError),
}

impl From<rusqlite::Error> for CommitError {
    fn from(e: rusqlite::Error) -> Self {
        Self::Db(DbError::Connection(e))
    }
}

/// What a successful commit wrote.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitReceipt {
    pub workout_id: String,
    pub duration_sec: i64,
    pub totals: WorkoutTotals,
}

fn non_empty(s: &str) -> Option<&str> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed)
    }
}

/// Writes `draft` as one `workout`, one `workout_exercise` per exercise and one
/// `workout_set` per set, then fills in duration and totals.
///
/// Everything happens inside a single IMMEDIATE transaction. Any error drops
/// the transaction, which rolls it back, so a failed commit leaves no rows.
/// `now` is used both as the row timestamp and as the end of the session.
///
/// # Errors
/// - `CommitError::InvalidSet` if a set carries a negative, non-finite or
///   oversized value, or the volume total overflows.
/// - `CommitError::Db` for any SQLite failure.
pub fn commit_draft(
    conn: &mut Connection,
    draft: &ActiveWorkoutDraft,
    now: DateTime<Utc>,
) -> Result<CommitReceipt, CommitError> {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    let workout_id = Uuid::new_v4().to_string();
    debug!(draft_id = %draft.id, %workout_id, "beginning commit");

    db::insert_workout(&tx, &workout_id, draft.started_at, non_empty(&draft.notes), now)?;

    let mut totals = WorkoutTotals {
        total_exercises: draft.exercises.len() as i64,
        ..Default::default()
    };

    for exercise in &draft.exercises {
        let workout_exercise_id = Uuid::new_v4().to_string();
        db::insert_workout_exercise(
            &tx,
            &workout_exercise_id,
            &workout_id,
            &exercise.id,
            non_empty(&exercise.notes),
            Some(i64::from(exercise.rest_time)),
            now,
        )?;

        for (set_index, set) in (1i64..).zip(&exercise.sets) {
            let weight_g = units::to_grams(set.unit, set.weight)?;
            let reps_x10 = units::reps_to_fixed_point(set.reps)?;
            db::insert_workout_set(
                &tx,
                &Uuid::new_v4().to_string(),
                &workout_exercise_id,
                set_index,
                set.set_type,
                reps_x10,
                weight_g,
                now,
            )?;
            totals.add_set(weight_g, reps_x10)?;
        }
    }

    let duration_sec = elapsed_secs(draft.started_at, now);
    db::finalize_workout(&tx, &workout_id, duration_sec, &totals, now)?;

    tx.commit().map_err(|e| {
        warn!(draft_id = %draft.id, error = %e, "commit failed, transaction rolled back");
        DbError::Connection(e)
    })?;

    info!(
        %workout_id,
        total_sets = totals.total_sets,
        total_exercises = totals.total_exercises,
        total_volume_g = totals.total_volume_g,
        duration_sec,
        "workout committed"
    );

    Ok(CommitReceipt {
        workout_id,
        duration_sec,
        totals,
    })
}
