//src/units.rs
//! Weight and rep normalization.
//!
//! Weights are entered in kilograms or pounds and stored as whole grams;
//! reps are entered as decimals (half reps allowed) and stored as reps x 10.
//! Rounding is round-half-up throughout: for the non-negative values accepted
//! here, `x.5` always goes to the next integer.
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Exact international avoirdupois pound.
pub const KG_PER_LB: f64 = 0.453_592_37;
pub const GRAMS_PER_KG: f64 = 1000.0;
/// Largest weight accepted, in whichever unit it is entered.
pub const MAX_WEIGHT: f64 = 100_000.0;
pub const MAX_REPS: f64 = 100_000.0;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum UnitError {
    #[error("Weight must be a number between 0 and {max}, got {0}", max = MAX_WEIGHT)]
    InvalidWeight(f64),
    #[error("Reps must be a number between 0 and {max}, got {0}", max = MAX_REPS)]
    InvalidReps(f64),
    #[error("Volume total is out of range")]
    VolumeOverflow,
    #[error("Invalid weight unit: {0}")]
    InvalidUnit(String),
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum WeightUnit {
    #[default]
    Kg,
    Lb,
}

impl TryFrom<&str> for WeightUnit {
    type Error = UnitError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_lowercase().as_str() {
            "kg" | "kgs" => Ok(Self::Kg),
            "lb" | "lbs" => Ok(Self::Lb),
            _ => Err(UnitError::InvalidUnit(value.to_string())),
        }
    }
}

impl fmt::Display for WeightUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Kg => write!(f, "kg"),
            Self::Lb => write!(f, "lb"),
        }
    }
}

// `None` when the result does not fit in an i64. Callers pass non-negative values.
fn round_half_up(value: f64) -> Option<i64> {
    let rounded = (value + 0.5).floor();
    if rounded < i64::MAX as f64 {
        Some(rounded as i64)
    } else {
        None
    }
}

/// Rejects NaN, infinities, negatives and anything above [`MAX_WEIGHT`].
pub fn validate_weight(weight: f64) -> Result<f64, UnitError> {
    if weight.is_finite() && (0.0..=MAX_WEIGHT).contains(&weight) {
        Ok(weight)
    } else {
        Err(UnitError::InvalidWeight(weight))
    }
}

pub fn validate_reps(reps: f64) -> Result<f64, UnitError> {
    if reps.is_finite() && (0.0..=MAX_REPS).contains(&reps) {
        Ok(reps)
    } else {
        Err(UnitError::InvalidReps(reps))
    }
}

/// Converts a weight in `unit` to kilograms without rounding.
#[must_use]
pub fn to_kg(unit: WeightUnit, weight: f64) -> f64 {
    match unit {
        WeightUnit::Kg => weight,
        WeightUnit::Lb => weight * KG_PER_LB,
    }
}

/// Converts a human-entered weight to whole grams.
///
/// `25 kg -> 25000`, `55 lb -> 24948`.
/// # Errors
/// Returns `UnitError::InvalidWeight` for negative, non-finite or oversized weights.
pub fn to_grams(unit: WeightUnit, weight: f64) -> Result<i64, UnitError> {
    let weight = validate_weight(weight)?;
    round_half_up(to_kg(unit, weight) * GRAMS_PER_KG).ok_or(UnitError::InvalidWeight(weight))
}

/// Inverse of [`to_grams`]. Accurate to within the one gram lost to rounding.
#[must_use]
pub fn grams_to_unit(unit: WeightUnit, grams: i64) -> f64 {
    let kg = grams as f64 / GRAMS_PER_KG;
    match unit {
        WeightUnit::Kg => kg,
        WeightUnit::Lb => kg / KG_PER_LB,
    }
}

/// Stores reps as a fixed-point integer with one decimal: `8.5 -> 85`.
/// # Errors
/// Returns `UnitError::InvalidReps` for negative, non-finite or oversized reps.
pub fn reps_to_fixed_point(reps: f64) -> Result<i64, UnitError> {
    let reps = validate_reps(reps)?;
    round_half_up(reps * 10.0).ok_or(UnitError::InvalidReps(reps))
}

#[must_use]
pub fn fixed_point_to_reps(reps_x10: i64) -> f64 {
    reps_x10 as f64 / 10.0
}

/// Volume of one set in grams: `round(weight_g * reps_x10 / 10)`, in integers.
/// # Errors
/// Returns `UnitError::VolumeOverflow` if the product does not fit in an i64.
pub fn set_volume_g(weight_g: i64, reps_x10: i64) -> Result<i64, UnitError> {
    // Round half up on the division by 10; both factors are non-negative.
    weight_g
        .checked_mul(reps_x10)
        .and_then(|scaled| scaled.checked_add(5))
        .map(|scaled| scaled.div_euclid(10))
        .ok_or(UnitError::VolumeOverflow)
}
