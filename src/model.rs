//src/model.rs
//! In-memory draft types. These are what the snapshot cache serializes.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use strum_macros::EnumIter;
use uuid::Uuid;

use crate::units::WeightUnit;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default, EnumIter)]
#[serde(rename_all = "lowercase")]
pub enum SetType {
    Warmup,
    #[default]
    Normal,
    Failure,
    Dropset,
}

impl SetType {
    /// Warmups and drop sets are shown without a number.
    #[must_use]
    pub const fn is_numbered(self) -> bool {
        matches!(self, Self::Normal | Self::Failure)
    }
}

// Convert string from DB to SetType
impl TryFrom<&str> for SetType {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.to_lowercase().as_str() {
            "warmup" => Ok(Self::Warmup),
            "normal" => Ok(Self::Normal),
            "failure" => Ok(Self::Failure),
            "dropset" | "drop-set" => Ok(Self::Dropset),
            _ => anyhow::bail!("Invalid set type string: {}", value),
        }
    }
}

// Stored form in workout_set.set_type
impl fmt::Display for SetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Warmup => write!(f, "warmup"),
            Self::Normal => write!(f, "normal"),
            Self::Failure => write!(f, "failure"),
            Self::Dropset => write!(f, "dropset"),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DraftSet {
    pub id: String,
    #[serde(rename = "type")]
    pub set_type: SetType,
    pub weight: f64, // in `unit`
    pub reps: f64,   // fractional reps allowed
    pub unit: WeightUnit,
    pub completed: bool,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DraftExercise {
    pub id: String,   // catalog exercise id
    pub name: String, // display copy
    pub unit: WeightUnit,
    pub notes: String,
    pub rest_time: u32, // seconds
    pub sets: Vec<DraftSet>,
}

impl DraftExercise {
    pub fn find_set(&self, set_id: &str) -> Option<&DraftSet> {
        self.sets.iter().find(|s| s.id == set_id)
    }

    pub(crate) fn set_mut(&mut self, set_id: &str) -> Option<&mut DraftSet> {
        self.sets.iter_mut().find(|s| s.id == set_id)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ActiveWorkoutDraft {
    pub id: String, // session token, never reused as a storage id
    pub started_at: DateTime<Utc>,
    pub notes: String,
    pub exercises: Vec<DraftExercise>,
}

impl ActiveWorkoutDraft {
    #[must_use]
    pub fn new(started_at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            started_at,
            notes: String::new(),
            exercises: Vec::new(),
        }
    }

    pub fn exercise(&self, exercise_id: &str) -> Option<&DraftExercise> {
        self.exercises.iter().find(|e| e.id == exercise_id)
    }

    pub(crate) fn exercise_mut(&mut self, exercise_id: &str) -> Option<&mut DraftExercise> {
        self.exercises.iter_mut().find(|e| e.id == exercise_id)
    }
}

/// The slice of a catalog entry the draft needs.
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogExercise {
    pub id: String,
    pub name: String,
    pub unit: WeightUnit,
}

/// Initial values for a new set. `unit: None` inherits the exercise's unit.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewSet {
    pub set_type: SetType,
    pub weight: f64,
    pub reps: f64,
    pub unit: Option<WeightUnit>,
    pub completed: bool,
}

impl NewSet {
    #[must_use]
    pub fn new(weight: f64, reps: f64) -> Self {
        Self {
            weight,
            reps,
            ..Default::default()
        }
    }

    #[must_use]
    pub const fn set_type(mut self, set_type: SetType) -> Self {
        self.set_type = set_type;
        self
    }

    #[must_use]
    pub const fn unit(mut self, unit: WeightUnit) -> Self {
        self.unit = Some(unit);
        self
    }

    #[must_use]
    pub const fn completed(mut self, completed: bool) -> Self {
        self.completed = completed;
        self
    }
}

/// One field change on a draft set.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SetUpdate {
    Type(SetType),
    Weight(f64),
    Reps(f64),
    Unit(WeightUnit),
    Completed(bool),
}

impl SetUpdate {
    pub(crate) fn apply(self, set: &mut DraftSet) {
        match self {
            Self::Type(t) => set.set_type = t,
            Self::Weight(w) => set.weight = w,
            Self::Reps(r) => set.reps = r,
            Self::Unit(u) => set.unit = u,
            Self::Completed(c) => set.completed = c,
        }
    }
}

/// One field change on a draft exercise.
#[derive(Debug, Clone, PartialEq)]
pub enum ExerciseUpdate {
    Notes(String),
    RestTime(u32),
    Unit(WeightUnit),
}

impl ExerciseUpdate {
    pub(crate) fn apply(self, exercise: &mut DraftExercise) {
        match self {
            Self::Notes(n) => exercise.notes = n,
            Self::RestTime(r) => exercise.rest_time = r,
            Self::Unit(u) => exercise.unit = u,
        }
    }
}
