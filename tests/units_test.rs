use anyhow::Result;
use chrono::{Duration, Utc};
use liftlog_draft::units::{fixed_point_to_reps, set_volume_g, MAX_REPS, MAX_WEIGHT};
use liftlog_draft::{
    calculate_set_numbers, compute_stats, display_label, grams_to_unit, reps_to_fixed_point,
    to_grams, ActiveWorkoutDraft, DraftExercise, DraftSet, SetType, UnitError, WeightUnit,
    WorkoutTotals,
};
use strum::IntoEnumIterator;

fn draft_set(set_type: SetType, weight: f64, reps: f64, unit: WeightUnit) -> DraftSet {
    DraftSet {
        id: format!("set-{weight}-{reps}"),
        set_type,
        weight,
        reps,
        unit,
        completed: false,
    }
}

#[test]
fn test_to_grams_kg_and_lb() -> Result<()> {
    assert_eq!(to_grams(WeightUnit::Kg, 25.0)?, 25_000);
    assert_eq!(to_grams(WeightUnit::Kg, 0.0)?, 0);
    assert_eq!(to_grams(WeightUnit::Kg, 102.5)?, 102_500);
    // 55 * 0.45359237 * 1000 = 24947.58...
    assert_eq!(to_grams(WeightUnit::Lb, 55.0)?, 24_948);
    assert_eq!(to_grams(WeightUnit::Lb, 45.0)?, 20_412);
    Ok(())
}

#[test]
fn test_to_grams_rejects_bad_weights() {
    assert_eq!(
        to_grams(WeightUnit::Kg, -1.0),
        Err(UnitError::InvalidWeight(-1.0))
    );
    assert!(to_grams(WeightUnit::Lb, f64::NAN).is_err());
    assert!(to_grams(WeightUnit::Kg, f64::INFINITY).is_err());
}

#[test]
fn test_grams_round_trip_within_one_gram() -> Result<()> {
    let weights = [0.0, 1.25, 2.5, 17.3, 20.0, 55.0, 61.75, 100.0, 142.5, 315.0];
    for unit in [WeightUnit::Kg, WeightUnit::Lb] {
        for w in weights {
            let back = grams_to_unit(unit, to_grams(unit, w)?);
            assert!(
                (back - w).abs() <= 0.001 / 0.453_592_37,
                "{w} {unit} came back as {back}"
            );
            if unit == WeightUnit::Kg {
                assert!((back - w).abs() <= 0.001);
            }
        }
    }
    Ok(())
}

#[test]
fn test_reps_fixed_point() -> Result<()> {
    assert_eq!(reps_to_fixed_point(8.0)?, 80);
    assert_eq!(reps_to_fixed_point(8.5)?, 85);
    assert_eq!(reps_to_fixed_point(0.0)?, 0);
    // Round half up, not half to even.
    assert_eq!(reps_to_fixed_point(2.25)?, 23);
    assert_eq!(reps_to_fixed_point(-1.0), Err(UnitError::InvalidReps(-1.0)));
    assert_eq!(fixed_point_to_reps(85), 8.5);
    Ok(())
}

#[test]
fn test_set_volume_integer_rounding() -> Result<()> {
    assert_eq!(set_volume_g(25_000, 80)?, 200_000);
    assert_eq!(set_volume_g(24_948, 50)?, 124_740);
    // 25 g * 0.5 reps = 12.5 g, rounds up
    assert_eq!(set_volume_g(25, 5)?, 13);
    assert_eq!(set_volume_g(0, 100)?, 0);
    Ok(())
}

#[test]
fn test_oversized_values_are_rejected() -> Result<()> {
    assert_eq!(
        to_grams(WeightUnit::Kg, 1.0e20),
        Err(UnitError::InvalidWeight(1.0e20))
    );
    assert!(to_grams(WeightUnit::Lb, MAX_WEIGHT + 1.0).is_err());
    assert!(to_grams(WeightUnit::Lb, MAX_WEIGHT).is_ok());
    assert_eq!(
        reps_to_fixed_point(1.0e19),
        Err(UnitError::InvalidReps(1.0e19))
    );
    assert!(reps_to_fixed_point(MAX_REPS).is_ok());

    // Largest accepted set still fits comfortably
    let weight_g = to_grams(WeightUnit::Kg, MAX_WEIGHT)?;
    let reps_x10 = reps_to_fixed_point(MAX_REPS)?;
    assert!(set_volume_g(weight_g, reps_x10).is_ok());
    Ok(())
}

#[test]
fn test_volume_overflow_is_an_error() {
    assert_eq!(set_volume_g(i64::MAX, 20), Err(UnitError::VolumeOverflow));
    assert_eq!(set_volume_g(i64::MAX, 1), Err(UnitError::VolumeOverflow));

    let mut totals = WorkoutTotals {
        total_volume_g: i64::MAX - 10,
        ..Default::default()
    };
    assert_eq!(totals.add_set(1_000, 10), Err(UnitError::VolumeOverflow));
    // A rejected set leaves the totals alone
    assert_eq!(totals.total_sets, 0);
    assert_eq!(totals.total_volume_g, i64::MAX - 10);
}

#[test]
fn test_weight_unit_parse_and_display() -> Result<()> {
    assert_eq!(WeightUnit::try_from("KG")?, WeightUnit::Kg);
    assert_eq!(WeightUnit::try_from("lbs")?, WeightUnit::Lb);
    assert!(WeightUnit::try_from("stone").is_err());
    assert_eq!(WeightUnit::Lb.to_string(), "lb");
    Ok(())
}

#[test]
fn test_set_numbers_skip_warmups_and_dropsets() {
    let types = [
        SetType::Warmup,
        SetType::Warmup,
        SetType::Normal,
        SetType::Dropset,
        SetType::Failure,
        SetType::Normal,
    ];
    assert_eq!(calculate_set_numbers(types), vec![0, 0, 1, 0, 2, 3]);
    assert!(calculate_set_numbers([]).is_empty());
}

#[test]
fn test_set_numbers_every_type() {
    for set_type in SetType::iter() {
        let numbers = calculate_set_numbers([set_type, set_type, set_type]);
        if set_type.is_numbered() {
            assert_eq!(numbers, vec![1, 2, 3], "{set_type}");
        } else {
            assert_eq!(numbers, vec![0, 0, 0], "{set_type}");
        }
    }
}

#[test]
fn test_display_labels() {
    assert_eq!(display_label(SetType::Warmup, 0), "W");
    assert_eq!(display_label(SetType::Dropset, 0), "D");
    assert_eq!(display_label(SetType::Normal, 3), "3");
    assert_eq!(display_label(SetType::Failure, 2), "2F");
}

#[test]
fn test_set_type_storage_strings() -> Result<()> {
    for set_type in SetType::iter() {
        assert_eq!(SetType::try_from(set_type.to_string().as_str())?, set_type);
    }
    assert!(SetType::try_from("superset").is_err());
    Ok(())
}

#[test]
fn test_compute_stats_mixed_units() {
    let mut draft = ActiveWorkoutDraft::new(Utc::now() - Duration::minutes(5));
    draft.exercises.push(DraftExercise {
        id: "bench-press".into(),
        name: "Bench Press".into(),
        unit: WeightUnit::Kg,
        notes: String::new(),
        rest_time: 180,
        sets: vec![draft_set(SetType::Normal, 25.0, 8.0, WeightUnit::Kg)],
    });
    draft.exercises.push(DraftExercise {
        id: "curl".into(),
        name: "Curl".into(),
        unit: WeightUnit::Lb,
        notes: String::new(),
        rest_time: 90,
        sets: vec![
            draft_set(SetType::Warmup, 55.0, 5.0, WeightUnit::Lb),
            draft_set(SetType::Normal, 0.0, 12.0, WeightUnit::Lb),
        ],
    });

    let stats = compute_stats(Some(&draft));
    assert_eq!(stats.total_exercises, 2);
    assert_eq!(stats.total_sets, 3);
    // 200 + 55 * 0.45359237 * 5 = 324.73790175
    assert!((stats.total_volume_kg - 324.738).abs() < 1e-9);

    let empty = compute_stats(None);
    assert_eq!(empty.total_exercises, 0);
    assert_eq!(empty.total_sets, 0);
    assert_eq!(empty.total_volume_kg, 0.0);
}
