//src/stats.rs
//! Aggregate statistics for a draft (live display) and for committed rows.
//!
//! The live figure is floating-point kilograms rounded to three decimals.
//! The persisted figure is integer grams built from fixed-point reps. The two
//! may differ by a few grams on large sessions; each is deterministic.
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::db::WorkoutSetRow;
use crate::model::ActiveWorkoutDraft;
use crate::units::{self, set_volume_g, UnitError};

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct LiveStats {
    pub total_exercises: usize,
    pub total_sets: usize,
    pub total_volume_kg: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct WorkoutTotals {
    pub total_sets: i64,
    pub total_exercises: i64,
    pub total_volume_g: i64,
}

impl WorkoutTotals {
    /// Adds one set to the running totals. On error the totals are unchanged.
    /// # Errors
    /// Returns `UnitError::VolumeOverflow` if the set volume or the running
    /// total does not fit in an i64.
    pub fn add_set(&mut self, weight_g: i64, reps_x10: i64) -> Result<(), UnitError> {
        let volume = set_volume_g(weight_g, reps_x10)?;
        self.total_volume_g = self
            .total_volume_g
            .checked_add(volume)
            .ok_or(UnitError::VolumeOverflow)?;
        self.total_sets += 1;
        Ok(())
    }
}

/// Live statistics for the draft screen. `None` yields all zeros.
#[must_use]
pub fn compute_stats(draft: Option<&ActiveWorkoutDraft>) -> LiveStats {
    let Some(draft) = draft else {
        return LiveStats::default();
    };

    let mut total_sets = 0;
    let mut total_volume_kg = 0.0;
    for exercise in &draft.exercises {
        total_sets += exercise.sets.len();
        for set in &exercise.sets {
            total_volume_kg += units::to_kg(set.unit, set.weight) * set.reps;
        }
    }

    LiveStats {
        total_exercises: draft.exercises.len(),
        total_sets,
        total_volume_kg: (total_volume_kg * 1000.0).round() / 1000.0,
    }
}

/// Recomputes totals from committed set rows with the commit arithmetic.
/// NULL weight or reps count as zero.
/// # Errors
/// Returns `UnitError::VolumeOverflow` if the stored values overflow the total.
pub fn totals_from_rows(
    sets: &[WorkoutSetRow],
    total_exercises: usize,
) -> Result<WorkoutTotals, UnitError> {
    let mut totals = WorkoutTotals {
        total_exercises: total_exercises as i64,
        ..Default::default()
    };
    for set in sets {
        totals.add_set(set.weight_g.unwrap_or(0), set.reps_x10.unwrap_or(0))?;
    }
    Ok(totals)
}

/// Whole seconds since `started_at`, never negative.
#[must_use]
pub fn elapsed_secs(started_at: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    (now - started_at).num_seconds().max(0)
}
