//src/session.rs
//! The draft session: at most one in-progress workout. Every change is written
//! to the cache before it takes effect in memory, so the two never disagree
//! and a killed process can pick the draft back up.
//!
//! States are `NoDraft` (`draft == None`) and `ActiveDraft`. `finish` and
//! `cancel` both leave the session in `NoDraft`; whichever runs first wins,
//! the other then fails with `NoActiveDraft`.
use chrono::{DateTime, Utc};
use rusqlite::Connection;
use thiserror::Error;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::cache::{decode_snapshot, encode_snapshot, CacheError, DraftCache, SESSION_KEY};
use crate::commit::{commit_draft, CommitError, CommitReceipt};
use crate::model::{
    ActiveWorkoutDraft, CatalogExercise, DraftExercise, DraftSet, ExerciseUpdate, NewSet,
    SetUpdate,
};
use crate::numbering::{numbered_sets, NumberedSet};
use crate::stats::{compute_stats, elapsed_secs, LiveStats};
use crate::units::{validate_reps, validate_weight, UnitError};

pub const DEFAULT_REST_TIME_SEC: u32 = 180;

#[derive(Error, Debug)]
pub enum DraftError {
    #[error("No workout in progress. Start one first.")]
    NoActiveDraft,
    #[error("Exercise '{0}' is not part of the current workout")]
    UnknownExercise(String),
    #[error("Set '{set}' not found in exercise '{exercise}'")]
    UnknownSet { exercise: String, set: String },
    #[error("Invalid input: {0}")]
    InvalidInput(#[from] UnitError),
    #[error("Workout has no exercises. Cancel it instead, or enable allow_empty_commit.")]
    EmptyDraft,
    #[error("Failed to save workout: {0}")]
    CommitFailed(#[source] CommitError),
    #[error("Draft cache error: {0}")]
    Cache(#[from] CacheError),
}

/// Owns the active draft and its cache. One session per caller; nothing global.
#[derive(Debug)]
pub struct DraftSession<C: DraftCache> {
    draft: Option<ActiveWorkoutDraft>,
    cache: C,
    default_rest_time_sec: u32,
}

impl<C: DraftCache> DraftSession<C> {
    /// A session with no draft. Any snapshot already in `cache` is ignored.
    pub const fn new(cache: C) -> Self {
        Self {
            draft: None,
            cache,
            default_rest_time_sec: DEFAULT_REST_TIME_SEC,
        }
    }

    /// Restores the snapshot left in `cache` by an earlier process, if any.
    /// # Errors
    /// Returns `DraftError::Cache` if the cache cannot be read or holds an
    /// unreadable snapshot.
    pub fn resume(cache: C) -> Result<Self, DraftError> {
        let draft = match cache.get(SESSION_KEY)? {
            Some(raw) => Some(decode_snapshot(SESSION_KEY, &raw)?),
            None => None,
        };
        if let Some(d) = &draft {
            info!(draft_id = %d.id, started_at = %d.started_at, "resumed draft from cache");
        }
        Ok(Self {
            draft,
            cache,
            default_rest_time_sec: DEFAULT_REST_TIME_SEC,
        })
    }

    #[must_use]
    pub fn with_default_rest_time(mut self, seconds: u32) -> Self {
        self.default_rest_time_sec = seconds;
        self
    }

    pub const fn draft(&self) -> Option<&ActiveWorkoutDraft> {
        self.draft.as_ref()
    }

    pub const fn is_active(&self) -> bool {
        self.draft.is_some()
    }

    pub const fn cache(&self) -> &C {
        &self.cache
    }

    fn active(&self) -> Result<&ActiveWorkoutDraft, DraftError> {
        self.draft.as_ref().ok_or(DraftError::NoActiveDraft)
    }

    /// Writes `next` to the cache, then makes it the current draft. If the
    /// write fails the current draft is left untouched.
    fn install(&mut self, next: ActiveWorkoutDraft) -> Result<(), DraftError> {
        let snapshot = encode_snapshot(&next)?;
        self.cache.set(SESSION_KEY, &snapshot)?;
        self.draft = Some(next);
        Ok(())
    }

    /// Starts a draft now. Returns the draft id; idempotent while active.
    /// # Errors
    /// Returns `DraftError::Cache` if the snapshot cannot be written.
    pub fn start(&mut self) -> Result<String, DraftError> {
        self.start_at(Utc::now())
    }

    /// Same as [`Self::start`] with an explicit start time.
    /// # Errors
    /// Returns `DraftError::Cache` if the snapshot cannot be written.
    pub fn start_at(&mut self, started_at: DateTime<Utc>) -> Result<String, DraftError> {
        if let Some(existing) = &self.draft {
            return Ok(existing.id.clone());
        }
        let draft = ActiveWorkoutDraft::new(started_at);
        let id = draft.id.clone();
        self.install(draft)?;
        info!(draft_id = %id, "started draft");
        Ok(id)
    }

    /// Replaces the workout-level notes.
    /// # Errors
    /// `NoActiveDraft`, or `Cache` if the snapshot cannot be written.
    pub fn set_notes(&mut self, notes: &str) -> Result<(), DraftError> {
        let mut next = self.active()?.clone();
        next.notes = notes.to_string();
        self.install(next)
    }

    /// Appends `exercise` unless the draft already has one with that id.
    /// Returns whether anything was added.
    /// # Errors
    /// `NoActiveDraft`, or `Cache` if the snapshot cannot be written.
    pub fn add_exercise(&mut self, exercise: &CatalogExercise) -> Result<bool, DraftError> {
        let current = self.active()?;
        if current.exercise(&exercise.id).is_some() {
            debug!(exercise_id = %exercise.id, "exercise already in draft");
            return Ok(false);
        }
        let mut next = current.clone();
        next.exercises.push(DraftExercise {
            id: exercise.id.clone(),
            name: exercise.name.clone(),
            unit: exercise.unit,
            notes: String::new(),
            rest_time: self.default_rest_time_sec,
            sets: Vec::new(),
        });
        self.install(next)?;
        Ok(true)
    }

    /// Removes an exercise and all its sets. Unknown ids are ignored.
    /// # Errors
    /// `NoActiveDraft`, or `Cache` if the snapshot cannot be written.
    pub fn remove_exercise(&mut self, exercise_id: &str) -> Result<bool, DraftError> {
        let current = self.active()?;
        if current.exercise(exercise_id).is_none() {
            return Ok(false);
        }
        let mut next = current.clone();
        next.exercises.retain(|e| e.id != exercise_id);
        self.install(next)?;
        Ok(true)
    }

    /// Applies field updates to an exercise. Unknown ids are ignored.
    /// # Errors
    /// `NoActiveDraft`, or `Cache` if the snapshot cannot be written.
    pub fn update_exercise<I>(&mut self, exercise_id: &str, updates: I) -> Result<bool, DraftError>
    where
        I: IntoIterator<Item = ExerciseUpdate>,
    {
        let mut next = self.active()?.clone();
        let Some(exercise) = next.exercise_mut(exercise_id) else {
            return Ok(false);
        };
        for update in updates {
            update.apply(exercise);
        }
        self.install(next)?;
        Ok(true)
    }

    /// Appends a set and returns its new id.
    /// # Errors
    /// - `InvalidInput` for a negative, non-finite or oversized weight or reps.
    /// - `UnknownExercise` if the exercise is not in the draft.
    /// - `NoActiveDraft`, or `Cache` if the snapshot cannot be written.
    pub fn add_set(&mut self, exercise_id: &str, init: NewSet) -> Result<String, DraftError> {
        validate_weight(init.weight)?;
        validate_reps(init.reps)?;
        let mut next = self.active()?.clone();
        let exercise = next
            .exercise_mut(exercise_id)
            .ok_or_else(|| DraftError::UnknownExercise(exercise_id.to_string()))?;

        let id = Uuid::new_v4().to_string();
        exercise.sets.push(DraftSet {
            id: id.clone(),
            set_type: init.set_type,
            weight: init.weight,
            reps: init.reps,
            unit: init.unit.unwrap_or(exercise.unit),
            completed: init.completed,
        });
        self.install(next)?;
        Ok(id)
    }

    /// Applies field updates to a set. Stale ids are ignored and return `false`.
    /// # Errors
    /// - `InvalidInput` if an update carries a negative, non-finite or oversized value.
    /// - `NoActiveDraft`, or `Cache` if the snapshot cannot be written.
    pub fn update_set<I>(
        &mut self,
        exercise_id: &str,
        set_id: &str,
        updates: I,
    ) -> Result<bool, DraftError>
    where
        I: IntoIterator<Item = SetUpdate>,
    {
        let updates: Vec<SetUpdate> = updates.into_iter().collect();
        for update in &updates {
            match *update {
                SetUpdate::Weight(w) => {
                    validate_weight(w)?;
                }
                SetUpdate::Reps(r) => {
                    validate_reps(r)?;
                }
                _ => {}
            }
        }

        let mut next = self.active()?.clone();
        let Some(set) = next
            .exercise_mut(exercise_id)
            .and_then(|e| e.set_mut(set_id))
        else {
            debug!(exercise_id, set_id, "update for unknown set ignored");
            return Ok(false);
        };
        for update in updates {
            update.apply(set);
        }
        self.install(next)?;
        Ok(true)
    }

    /// Removes a set. Stale ids are ignored and return `false`.
    /// # Errors
    /// `NoActiveDraft`, or `Cache` if the snapshot cannot be written.
    pub fn remove_set(&mut self, exercise_id: &str, set_id: &str) -> Result<bool, DraftError> {
        let current = self.active()?;
        let known = current
            .exercise(exercise_id)
            .and_then(|e| e.find_set(set_id))
            .is_some();
        if !known {
            return Ok(false);
        }
        let mut next = current.clone();
        if let Some(exercise) = next.exercise_mut(exercise_id) {
            exercise.sets.retain(|s| s.id != set_id);
        }
        self.install(next)?;
        Ok(true)
    }

    /// Sets of an exercise with their positional index and display number.
    /// # Errors
    /// `NoActiveDraft` or `UnknownExercise`.
    pub fn numbered_sets(&self, exercise_id: &str) -> Result<Vec<NumberedSet<'_>>, DraftError> {
        let exercise = self
            .active()?
            .exercise(exercise_id)
            .ok_or_else(|| DraftError::UnknownExercise(exercise_id.to_string()))?;
        Ok(numbered_sets(exercise))
    }

    /// Live statistics; zeros when no draft is active.
    pub fn stats(&self) -> LiveStats {
        compute_stats(self.draft.as_ref())
    }

    /// Seconds since the draft started, or 0 with no draft.
    pub fn elapsed_secs(&self, now: DateTime<Utc>) -> i64 {
        self.draft
            .as_ref()
            .map_or(0, |d| elapsed_secs(d.started_at, now))
    }

    /// Discards the draft without touching the database. The snapshot goes
    /// first; if it cannot be deleted the draft stays active.
    /// # Errors
    /// `NoActiveDraft`, or `Cache` if the snapshot cannot be deleted.
    pub fn cancel(&mut self) -> Result<(), DraftError> {
        let draft_id = self.active()?.id.clone();
        self.cache.delete(SESSION_KEY)?;
        self.draft = None;
        info!(%draft_id, "cancelled draft");
        Ok(())
    }

    /// Commits the draft with the current time. See [`Self::finish_at`].
    /// # Errors
    /// See [`Self::finish_at`].
    pub fn finish(
        &mut self,
        conn: &mut Connection,
        allow_empty: bool,
    ) -> Result<CommitReceipt, DraftError> {
        self.finish_at(conn, allow_empty, Utc::now())
    }

    /// Commits the draft, then clears it and its snapshot.
    ///
    /// On failure nothing is written and the draft and snapshot stay as they
    /// were, so calling again is safe.
    /// # Errors
    /// - `NoActiveDraft` with no draft.
    /// - `EmptyDraft` when there are no exercises and `allow_empty` is false.
    /// - `CommitFailed` when the transaction fails.
    pub fn finish_at(
        &mut self,
        conn: &mut Connection,
        allow_empty: bool,
        now: DateTime<Utc>,
    ) -> Result<CommitReceipt, DraftError> {
        let draft = self.draft.as_ref().ok_or(DraftError::NoActiveDraft)?;
        if draft.exercises.is_empty() && !allow_empty {
            return Err(DraftError::EmptyDraft);
        }

        let receipt = commit_draft(conn, draft, now).map_err(|e| {
            warn!(draft_id = %draft.id, error = %e, "commit failed, draft kept");
            DraftError::CommitFailed(e)
        })?;

        self.draft = None;
        if let Err(e) = self.cache.delete(SESSION_KEY) {
            // Rows are durable at this point; a stale snapshot only risks a
            // resumed duplicate, which the user can cancel.
            warn!(error = %e, workout_id = %receipt.workout_id, "failed to clear draft snapshot after commit");
        }
        Ok(receipt)
    }
}
