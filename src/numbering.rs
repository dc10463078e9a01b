//src/numbering.rs
//! Display numbering for sets.
//!
//! Two numbers exist per set and they are never the same thing:
//! - `set_index` is positional (1..N, no gaps) and is what gets persisted;
//! - `set_number` is for display: warmups and drop sets get 0, every other
//!   set counts up from 1 among numbered sets only.
//!
//! Neither is stored on the draft. Both are recomputed from the current
//! sequence whenever they are needed.
use crate::model::{DraftExercise, DraftSet, SetType};

/// Assigns display numbers in sequence order.
pub fn calculate_set_numbers<I>(types: I) -> Vec<u32>
where
    I: IntoIterator<Item = SetType>,
{
    let mut counter = 0;
    types
        .into_iter()
        .map(|t| {
            if t.is_numbered() {
                counter += 1;
                counter
            } else {
                0
            }
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NumberedSet<'a> {
    pub set: &'a DraftSet,
    pub set_index: u32,
    pub set_number: u32,
}

/// Pairs each set of `exercise` with its positional index and display number.
pub fn numbered_sets(exercise: &DraftExercise) -> Vec<NumberedSet<'_>> {
    let numbers = calculate_set_numbers(exercise.sets.iter().map(|s| s.set_type));
    exercise
        .sets
        .iter()
        .zip(numbers)
        .zip(1u32..)
        .map(|((set, set_number), set_index)| NumberedSet {
            set,
            set_index,
            set_number,
        })
        .collect()
}

/// Short label used in tables: `W`, `D`, or the set number.
#[must_use]
pub fn display_label(set_type: SetType, set_number: u32) -> String {
    match set_type {
        SetType::Warmup => "W".to_string(),
        SetType::Dropset => "D".to_string(),
        SetType::Normal => set_number.to_string(),
        SetType::Failure => format!("{set_number}F"),
    }
}
