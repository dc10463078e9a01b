use anyhow::{Context, Result};
use chrono::Utc;
use rusqlite::Connection;
use std::path::{Path, PathBuf};

// --- Declare modules ---
pub mod cache;
pub mod commit;
mod config;
pub mod db;
pub mod model;
pub mod numbering;
pub mod session;
pub mod stats;
pub mod units;

// --- Expose public types ---
pub use cache::{CacheError, DraftCache, FileCache, MemoryCache, SESSION_KEY};
pub use commit::{commit_draft, CommitError, CommitReceipt};
pub use config::{
    get_config_path as get_config_path_util, load_config as load_config_util, parse_color,
    save_config as save_config_util, Config, Error as ConfigError, StandardColor, Theme,
};
pub use db::{DbError, Workout, WorkoutExerciseRow, WorkoutSetRow};
pub use model::{
    ActiveWorkoutDraft, CatalogExercise, DraftExercise, DraftSet, ExerciseUpdate, NewSet, SetType,
    SetUpdate,
};
pub use numbering::{calculate_set_numbers, display_label, NumberedSet};
pub use session::{DraftError, DraftSession};
pub use stats::{compute_stats, totals_from_rows, LiveStats, WorkoutTotals};
pub use units::{grams_to_unit, reps_to_fixed_point, to_grams, UnitError, WeightUnit};

/// A committed workout with its exercises and their sets, in insertion order.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkoutDetail {
    pub workout: Workout,
    pub exercises: Vec<(WorkoutExerciseRow, Vec<WorkoutSetRow>)>,
}

pub struct AppService<C: DraftCache = FileCache> {
    pub config: Config,
    pub conn: Connection,
    pub db_path: PathBuf,
    pub config_path: PathBuf,
    pub session: DraftSession<C>,
}

impl AppService<FileCache> {
    /// Loads config, opens the database and resumes any cached draft.
    /// # Errors
    /// Returns `anyhow::Error` if config/db path determination, loading, or initialization fails.
    pub fn initialize() -> Result<Self> {
        let config_path =
            config::get_config_path().context("Failed to determine configuration file path")?;
        let config = config::load_config(&config_path)
            .with_context(|| format!("Failed to load config from {config_path:?}"))?;

        let db_path = db::get_db_path().context("Failed to determine database path")?;
        let conn = db::open_db(&db_path)
            .with_context(|| format!("Failed to open database at {db_path:?}"))?;
        db::init_db(&conn).context("Failed to initialize database schema")?;

        let cache = FileCache::open_default().context("Failed to open draft cache")?;
        let session = DraftSession::resume(cache)
            .context("Failed to restore the in-progress workout")?
            .with_default_rest_time(config.default_rest_time_sec);

        Ok(Self {
            config,
            conn,
            db_path,
            config_path,
            session,
        })
    }
}

impl<C: DraftCache> AppService<C> {
    pub fn get_config_path(&self) -> &Path {
        &self.config_path
    }

    pub fn get_db_path(&self) -> &Path {
        &self.db_path
    }

    /// Saves the current configuration state.
    /// # Errors
    /// Returns `ConfigError` if saving fails.
    pub fn save_config(&self) -> Result<(), ConfigError> {
        config::save_config(&self.config_path, &self.config)
    }

    /// Sets the unit used for exercises added without one.
    /// # Errors
    /// Returns `ConfigError` variants if saving fails.
    pub fn set_default_unit(&mut self, unit: WeightUnit) -> Result<(), ConfigError> {
        self.config.default_unit = unit;
        self.save_config()
    }

    /// Sets the rest time given to newly added exercises.
    /// # Errors
    /// - `ConfigError::InvalidRestTime` if `seconds` is 0.
    /// - `ConfigError` variants if saving fails.
    pub fn set_default_rest_time(&mut self, seconds: u32) -> Result<(), ConfigError> {
        if seconds == 0 {
            return Err(ConfigError::InvalidRestTime);
        }
        self.config.default_rest_time_sec = seconds;
        self.save_config()
    }

    // --- Draft operations ---

    pub const fn active_draft(&self) -> Option<&ActiveWorkoutDraft> {
        self.session.draft()
    }

    /// Starts a workout, or returns the id of the one already in progress.
    /// # Errors
    /// Returns `DraftError::Cache` if the snapshot cannot be written.
    pub fn start_workout(&mut self) -> Result<String, DraftError> {
        self.session.start()
    }

    /// Adds an exercise to the draft; `unit: None` uses the configured default.
    /// Returns `false` if the exercise was already present.
    /// # Errors
    /// `DraftError::NoActiveDraft` or `DraftError::Cache`.
    pub fn add_exercise(
        &mut self,
        exercise_id: &str,
        name: &str,
        unit: Option<WeightUnit>,
    ) -> Result<bool, DraftError> {
        let catalog = CatalogExercise {
            id: exercise_id.trim().to_string(),
            name: name.trim().to_string(),
            unit: unit.unwrap_or(self.config.default_unit),
        };
        self.session.add_exercise(&catalog)
    }

    /// [`Self::add_exercise`], then applies `rest_time` to the new exercise.
    /// # Errors
    /// `DraftError::NoActiveDraft` or `DraftError::Cache`.
    pub fn add_exercise_with_rest(
        &mut self,
        exercise_id: &str,
        name: &str,
        unit: Option<WeightUnit>,
        rest_time: Option<u32>,
    ) -> Result<bool, DraftError> {
        let added = self.add_exercise(exercise_id, name, unit)?;
        if let (true, Some(seconds)) = (added, rest_time) {
            self.update_exercise(exercise_id.trim(), vec![ExerciseUpdate::RestTime(seconds)])?;
        }
        Ok(added)
    }

    /// # Errors
    /// `DraftError::NoActiveDraft` or `DraftError::Cache`.
    pub fn remove_exercise(&mut self, exercise_id: &str) -> Result<bool, DraftError> {
        self.session.remove_exercise(exercise_id)
    }

    /// # Errors
    /// `DraftError::NoActiveDraft` or `DraftError::Cache`.
    pub fn update_exercise(
        &mut self,
        exercise_id: &str,
        updates: Vec<ExerciseUpdate>,
    ) -> Result<bool, DraftError> {
        self.session.update_exercise(exercise_id, updates)
    }

    /// # Errors
    /// `DraftError::NoActiveDraft` or `DraftError::Cache`.
    pub fn set_workout_notes(&mut self, notes: &str) -> Result<(), DraftError> {
        self.session.set_notes(notes)
    }

    /// # Errors
    /// `DraftError::InvalidInput`, `UnknownExercise`, `NoActiveDraft` or `Cache`.
    pub fn add_set(&mut self, exercise_id: &str, init: NewSet) -> Result<String, DraftError> {
        self.session.add_set(exercise_id, init)
    }

    /// Resolves a set identifier given either as its id or as its 1-based position.
    /// # Errors
    /// `DraftError::NoActiveDraft`, `UnknownExercise` or `UnknownSet`.
    pub fn resolve_set_id(&self, exercise_id: &str, identifier: &str) -> Result<String, DraftError> {
        let draft = self.session.draft().ok_or(DraftError::NoActiveDraft)?;
        let exercise = draft
            .exercise(exercise_id)
            .ok_or_else(|| DraftError::UnknownExercise(exercise_id.to_string()))?;
        let trimmed = identifier.trim();

        let by_position = trimmed
            .parse::<usize>()
            .ok()
            .and_then(|pos| pos.checked_sub(1))
            .and_then(|idx| exercise.sets.get(idx));
        by_position
            .or_else(|| exercise.find_set(trimmed))
            .map(|s| s.id.clone())
            .ok_or_else(|| DraftError::UnknownSet {
                exercise: exercise_id.to_string(),
                set: trimmed.to_string(),
            })
    }

    /// # Errors
    /// `DraftError::InvalidInput`, `NoActiveDraft` or `Cache`.
    pub fn update_set(
        &mut self,
        exercise_id: &str,
        set_id: &str,
        updates: Vec<SetUpdate>,
    ) -> Result<bool, DraftError> {
        self.session.update_set(exercise_id, set_id, updates)
    }

    /// # Errors
    /// `DraftError::NoActiveDraft` or `DraftError::Cache`.
    pub fn remove_set(&mut self, exercise_id: &str, set_id: &str) -> Result<bool, DraftError> {
        self.session.remove_set(exercise_id, set_id)
    }

    /// # Errors
    /// `DraftError::NoActiveDraft` or `DraftError::UnknownExercise`.
    pub fn numbered_sets(&self, exercise_id: &str) -> Result<Vec<NumberedSet<'_>>, DraftError> {
        self.session.numbered_sets(exercise_id)
    }

    pub fn live_stats(&self) -> LiveStats {
        self.session.stats()
    }

    pub fn elapsed_secs(&self) -> i64 {
        self.session.elapsed_secs(Utc::now())
    }

    /// Commits the draft and clears it.
    /// # Errors
    /// `DraftError::NoActiveDraft`, `EmptyDraft` or `CommitFailed`.
    pub fn finish_workout(&mut self) -> Result<CommitReceipt, DraftError> {
        let allow_empty = self.config.allow_empty_commit;
        self.session.finish(&mut self.conn, allow_empty)
    }

    /// Discards the draft; never touches the database.
    /// # Errors
    /// `DraftError::NoActiveDraft` or `DraftError::Cache`.
    pub fn cancel_workout(&mut self) -> Result<(), DraftError> {
        self.session.cancel()
    }

    // --- Committed workouts ---

    /// Lists committed workouts, most recent first.
    /// # Errors
    /// Returns `anyhow::Error` wrapping `DbError` variants.
    pub fn list_workouts(&self, limit: u32) -> Result<Vec<Workout>> {
        db::list_workouts(&self.conn, limit).context("Failed to list workouts")
    }

    /// Loads a committed workout with all of its rows.
    /// # Errors
    /// - `DbError::WorkoutNotFound` if no such workout exists.
    /// - `anyhow::Error` wrapping other `DbError` variants.
    pub fn get_workout_detail(&self, workout_id: &str) -> Result<WorkoutDetail> {
        let workout = db::get_workout(&self.conn, workout_id)
            .with_context(|| format!("Failed to load workout '{workout_id}'"))?
            .ok_or_else(|| DbError::WorkoutNotFound(workout_id.to_string()))?;

        let exercises = db::list_workout_exercises(&self.conn, workout_id)
            .with_context(|| format!("Failed to load exercises for workout '{workout_id}'"))?
            .into_iter()
            .map(|we| {
                let sets = db::list_sets_for_workout_exercise(&self.conn, &we.id)?;
                Ok((we, sets))
            })
            .collect::<Result<Vec<_>, DbError>>()
            .with_context(|| format!("Failed to load sets for workout '{workout_id}'"))?;

        Ok(WorkoutDetail { workout, exercises })
    }

    /// Deletes a committed workout and, by cascade, its exercises and sets.
    /// # Errors
    /// Returns `DbError` variants if deletion fails.
    pub fn delete_workout(&mut self, workout_id: &str) -> Result<usize, DbError> {
        db::delete_workout(&self.conn, workout_id)
    }
}

impl WorkoutDetail {
    /// Totals recomputed from the stored set rows.
    /// # Errors
    /// Returns `UnitError::VolumeOverflow` if the stored values overflow.
    pub fn recomputed_totals(&self) -> Result<WorkoutTotals, UnitError> {
        let sets: Vec<WorkoutSetRow> = self
            .exercises
            .iter()
            .flat_map(|(_, sets)| sets.iter().cloned())
            .collect();
        totals_from_rows(&sets, self.exercises.len())
    }
}
