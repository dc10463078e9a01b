//src/main.rs
mod cli;

use anyhow::{bail, Context, Result};
use comfy_table::{presets::UTF8_FULL, Cell, Color, ContentArrangement, Table};
use std::io::{self, stdout};
use tracing_subscriber::EnvFilter;

use liftlog_draft::{
    display_label, grams_to_unit, numbering, parse_color, units, AppService, DbError, DraftError,
    ExerciseUpdate, NewSet, SetType, SetUpdate, WeightUnit, Workout, WorkoutDetail,
};

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(io::stderr)
        .init();

    let cli_args = cli::parse_args();
    let export_csv = cli_args.export_csv;

    if let cli::Commands::GenerateCompletion { shell } = cli_args.command {
        let mut cmd = cli::build_cli_command();
        let bin_name = cmd.get_name().to_string();
        eprintln!("Generating completion script for {shell}...");
        clap_complete::generate(shell, &mut cmd, bin_name, &mut stdout());
        return Ok(());
    }

    let mut service =
        AppService::initialize().context("Failed to initialize application service")?;
    let header_color = parse_color(&service.config.theme.header_color)
        .map(Color::from)
        .unwrap_or(Color::Green);

    match cli_args.command {
        cli::Commands::GenerateCompletion { .. } => {
            unreachable!("Completion generation should have exited already");
        }
        // --- Draft Commands ---
        cli::Commands::Start => {
            let already_active = service.active_draft().is_some();
            let id = service.start_workout()?;
            if already_active {
                println!("Workout already in progress (session {id}).");
            } else {
                println!("Started workout (session {id}).");
            }
        }
        cli::Commands::AddExercise {
            id,
            name,
            unit,
            rest,
        } => {
            let display_name = name.unwrap_or_else(|| id.clone());
            if service.add_exercise_with_rest(&id, &display_name, unit.map(cli_unit), rest)? {
                println!("Added '{}' to the workout.", display_name.trim());
            } else {
                println!("'{}' is already in the workout.", id.trim());
            }
        }
        cli::Commands::RemoveExercise { id } => {
            if service.remove_exercise(&id)? {
                println!("Removed '{id}' from the workout.");
            } else {
                println!("'{id}' is not in the workout. Nothing removed.");
            }
        }
        cli::Commands::AddSet {
            exercise,
            weight,
            reps,
            unit,
            set_type,
            done,
        } => {
            let mut init = NewSet::new(weight, reps)
                .set_type(cli_set_type(set_type))
                .completed(done);
            if let Some(u) = unit {
                init = init.unit(cli_unit(u));
            }
            match service.add_set(&exercise, init) {
                Ok(set_id) => println!("Logged set {set_id} for '{exercise}'."),
                Err(DraftError::UnknownExercise(ex)) => {
                    bail!("'{ex}' is not in the workout. Add it first with 'add-exercise {ex}'.")
                }
                Err(e) => bail!("Error adding set: {e}"),
            }
        }
        cli::Commands::EditSet {
            exercise,
            set,
            weight,
            reps,
            unit,
            set_type,
            done,
        } => {
            let set_id = service.resolve_set_id(&exercise, &set)?;
            let mut updates = Vec::new();
            if let Some(w) = weight {
                updates.push(SetUpdate::Weight(w));
            }
            if let Some(r) = reps {
                updates.push(SetUpdate::Reps(r));
            }
            if let Some(u) = unit {
                updates.push(SetUpdate::Unit(cli_unit(u)));
            }
            if let Some(t) = set_type {
                updates.push(SetUpdate::Type(cli_set_type(t)));
            }
            if let Some(d) = done {
                updates.push(SetUpdate::Completed(d));
            }
            if updates.is_empty() {
                bail!("No fields provided to update for set '{set}'.");
            }
            service.update_set(&exercise, &set_id, updates)?;
            println!("Updated set {set_id}.");
        }
        cli::Commands::RemoveSet { exercise, set } => {
            let set_id = service.resolve_set_id(&exercise, &set)?;
            service.remove_set(&exercise, &set_id)?;
            println!("Removed set {set_id}.");
        }
        cli::Commands::Notes { text, exercise } => match exercise {
            Some(ex) => {
                if !service.update_exercise(&ex, vec![ExerciseUpdate::Notes(text)])? {
                    bail!(DraftError::UnknownExercise(ex));
                }
                println!("Updated notes for '{ex}'.");
            }
            None => {
                service.set_workout_notes(&text)?;
                println!("Updated workout notes.");
            }
        },
        cli::Commands::Status => print_status(&service, header_color)?,
        cli::Commands::Finish => match service.finish_workout() {
            Ok(receipt) => {
                println!(
                    "Saved workout {}: {} exercise(s), {} set(s), {:.1} kg volume, {}.",
                    receipt.workout_id,
                    receipt.totals.total_exercises,
                    receipt.totals.total_sets,
                    grams_to_unit(WeightUnit::Kg, receipt.totals.total_volume_g),
                    format_duration(receipt.duration_sec)
                );
            }
            Err(e @ DraftError::CommitFailed(_)) => {
                bail!("{e}\nYour workout is still in progress; run 'finish' again to retry.")
            }
            Err(e) => bail!(e),
        },
        cli::Commands::Cancel => {
            service.cancel_workout()?;
            println!("Workout discarded.");
        }
        // --- Saved Workout Commands ---
        cli::Commands::List { limit } => {
            let workouts = service.list_workouts(limit)?;
            if workouts.is_empty() && !export_csv {
                println!("No saved workouts.");
            } else if export_csv {
                print_workout_csv(&workouts)?;
            } else {
                print_workout_table(&workouts, header_color);
            }
        }
        cli::Commands::Show { id, unit } => {
            let display_unit = unit.map_or(service.config.default_unit, cli_unit);
            match service.get_workout_detail(&id) {
                Ok(detail) => {
                    if export_csv {
                        print_detail_csv(&detail, display_unit)?;
                    } else {
                        print_detail_table(&detail, display_unit, header_color);
                    }
                }
                Err(e) => {
                    if let Some(DbError::WorkoutNotFound(wid)) = e.downcast_ref::<DbError>() {
                        println!("Workout '{wid}' not found.");
                        return Ok(());
                    }
                    bail!("Error loading workout '{id}': {e}");
                }
            }
        }
        cli::Commands::DeleteWorkout { id } => match service.delete_workout(&id) {
            Ok(_) => println!("Deleted workout '{id}' and all its sets."),
            Err(e) => bail!("Error deleting workout '{id}': {e}"),
        },
        // --- Config/Path Commands ---
        cli::Commands::SetUnit { unit } => {
            let unit = cli_unit(unit);
            service.set_default_unit(unit)?;
            println!("Default unit set to {unit}.");
            println!("Config file updated: {:?}", service.get_config_path());
        }
        cli::Commands::SetRestTime { seconds } => {
            service.set_default_rest_time(seconds)?;
            println!("Default rest time set to {seconds}s.");
            println!("Config file updated: {:?}", service.get_config_path());
        }
        cli::Commands::DbPath => {
            println!("Database file is located at: {:?}", service.get_db_path());
        }
        cli::Commands::ConfigPath => {
            println!("Config file is located at: {:?}", service.get_config_path());
        }
    }

    Ok(())
}

// --- CLI Specific Helper Functions ---

const fn cli_unit(unit: cli::UnitCli) -> WeightUnit {
    match unit {
        cli::UnitCli::Kg => WeightUnit::Kg,
        cli::UnitCli::Lb => WeightUnit::Lb,
    }
}

const fn cli_set_type(set_type: cli::SetTypeCli) -> SetType {
    match set_type {
        cli::SetTypeCli::Warmup => SetType::Warmup,
        cli::SetTypeCli::Normal => SetType::Normal,
        cli::SetTypeCli::Failure => SetType::Failure,
        cli::SetTypeCli::Dropset => SetType::Dropset,
    }
}

fn format_duration(total_secs: i64) -> String {
    let hours = total_secs / 3600;
    let minutes = (total_secs % 3600) / 60;
    let seconds = total_secs % 60;
    if hours > 0 {
        format!("{hours}h {minutes:02}m {seconds:02}s")
    } else {
        format!("{minutes}m {seconds:02}s")
    }
}

fn print_status<C: liftlog_draft::DraftCache>(
    service: &AppService<C>,
    header_color: Color,
) -> Result<()> {
    let Some(draft) = service.active_draft() else {
        println!("No workout in progress. Run 'start' to begin one.");
        return Ok(());
    };

    let stats = service.live_stats();
    println!(
        "Workout in progress since {} ({})",
        draft.started_at.format("%Y-%m-%d %H:%M"),
        format_duration(service.elapsed_secs())
    );
    println!(
        "Exercises: {}  Sets: {}  Volume: {:.3} kg",
        stats.total_exercises, stats.total_sets, stats.total_volume_kg
    );
    if !draft.notes.is_empty() {
        println!("Notes: {}", draft.notes);
    }

    for exercise in &draft.exercises {
        println!();
        println!(
            "{} [{}] rest {}s{}",
            exercise.name,
            exercise.id,
            exercise.rest_time,
            if exercise.notes.is_empty() {
                String::new()
            } else {
                format!(" - {}", exercise.notes)
            }
        );
        if exercise.sets.is_empty() {
            println!("  (no sets yet)");
            continue;
        }

        let mut table = Table::new();
        table
            .load_preset(UTF8_FULL)
            .set_content_arrangement(ContentArrangement::Dynamic)
            .set_header(vec![
                Cell::new("#").fg(header_color),
                Cell::new("Set").fg(header_color),
                Cell::new("Type").fg(header_color),
                Cell::new("Weight").fg(header_color),
                Cell::new("Reps").fg(header_color),
                Cell::new("Done").fg(header_color),
                Cell::new("ID").fg(header_color),
            ]);
        for numbered in numbering::numbered_sets(exercise) {
            let set = numbered.set;
            table.add_row(vec![
                Cell::new(numbered.set_index.to_string()),
                Cell::new(display_label(set.set_type, numbered.set_number)),
                Cell::new(set.set_type.to_string()),
                Cell::new(format!("{} {}", set.weight, set.unit)),
                Cell::new(set.reps.to_string()),
                Cell::new(if set.completed { "yes" } else { "-" }),
                Cell::new(&set.id),
            ]);
        }
        println!("{table}");
    }
    Ok(())
}

fn print_workout_table(workouts: &[Workout], header_color: Color) {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            Cell::new("ID").fg(header_color),
            Cell::new("Performed (UTC)").fg(header_color),
            Cell::new("Duration").fg(header_color),
            Cell::new("Exercises").fg(header_color),
            Cell::new("Sets").fg(header_color),
            Cell::new("Volume (kg)").fg(header_color),
            Cell::new("Notes").fg(header_color),
        ]);

    for workout in workouts {
        table.add_row(vec![
            Cell::new(&workout.id),
            Cell::new(workout.performed_at.format("%Y-%m-%d %H:%M").to_string()),
            Cell::new(workout.duration_sec.map_or("-".to_string(), format_duration)),
            Cell::new(workout.total_exercises.to_string()),
            Cell::new(workout.total_sets.to_string()),
            Cell::new(format!(
                "{:.1}",
                grams_to_unit(WeightUnit::Kg, workout.total_volume_g)
            )),
            Cell::new(workout.notes.as_deref().unwrap_or("-")),
        ]);
    }
    println!("{table}");
}

fn print_workout_csv(workouts: &[Workout]) -> Result<()> {
    let mut writer = csv::Writer::from_writer(io::stdout());
    writer.write_record([
        "ID",
        "Performed_UTC",
        "Duration_sec",
        "Total_Exercises",
        "Total_Sets",
        "Total_Volume_g",
        "Notes",
    ])?;

    for workout in workouts {
        writer.write_record([
            workout.id.clone(),
            workout.performed_at.to_rfc3339(),
            workout.duration_sec.map_or(String::new(), |v| v.to_string()),
            workout.total_exercises.to_string(),
            workout.total_sets.to_string(),
            workout.total_volume_g.to_string(),
            workout.notes.clone().unwrap_or_default(),
        ])?;
    }

    writer.flush()?;
    Ok(())
}

fn format_weight(weight_g: Option<i64>, unit: WeightUnit) -> String {
    weight_g.map_or("-".to_string(), |g| {
        format!("{:.2} {}", grams_to_unit(unit, g), unit)
    })
}

fn format_reps(reps_x10: Option<i64>) -> String {
    reps_x10.map_or("-".to_string(), |r| units::fixed_point_to_reps(r).to_string())
}

fn print_detail_table(detail: &WorkoutDetail, unit: WeightUnit, header_color: Color) {
    let workout = &detail.workout;
    println!(
        "Workout {} performed {} ({})",
        workout.id,
        workout.performed_at.format("%Y-%m-%d %H:%M"),
        workout.duration_sec.map_or("-".to_string(), format_duration)
    );
    println!(
        "Exercises: {}  Sets: {}  Volume: {:.3} {}",
        workout.total_exercises,
        workout.total_sets,
        grams_to_unit(unit, workout.total_volume_g),
        unit
    );
    if let Some(notes) = &workout.notes {
        println!("Notes: {notes}");
    }

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            Cell::new("Exercise").fg(header_color),
            Cell::new("Set").fg(header_color),
            Cell::new("Type").fg(header_color),
            Cell::new("Weight").fg(header_color),
            Cell::new("Reps").fg(header_color),
        ]);

    for (exercise, sets) in &detail.exercises {
        let types = sets.iter().map(|s| s.set_type.unwrap_or_default());
        let numbers = liftlog_draft::calculate_set_numbers(types);
        for (set, number) in sets.iter().zip(numbers) {
            let set_type = set.set_type.unwrap_or_default();
            table.add_row(vec![
                Cell::new(&exercise.exercise_id),
                Cell::new(display_label(set_type, number)),
                Cell::new(set_type.to_string()),
                Cell::new(format_weight(set.weight_g, unit)),
                Cell::new(format_reps(set.reps_x10)),
            ]);
        }
    }
    println!("{table}");
}

fn print_detail_csv(detail: &WorkoutDetail, unit: WeightUnit) -> Result<()> {
    let mut writer = csv::Writer::from_writer(io::stdout());
    writer.write_record([
        "Workout_ID".to_string(),
        "Exercise".to_string(),
        "Set_Index".to_string(),
        "Set_Type".to_string(),
        format!("Weight_{unit}"),
        "Weight_g".to_string(),
        "Reps".to_string(),
    ])?;

    for (exercise, sets) in &detail.exercises {
        for set in sets {
            writer.write_record([
                detail.workout.id.clone(),
                exercise.exercise_id.clone(),
                set.set_index.to_string(),
                set.set_type.map_or(String::new(), |t| t.to_string()),
                set.weight_g
                    .map_or(String::new(), |g| format!("{:.2}", grams_to_unit(unit, g))),
                set.weight_g.map_or(String::new(), |g| g.to_string()),
                set.reps_x10
                    .map_or(String::new(), |r| units::fixed_point_to_reps(r).to_string()),
            ])?;
        }
    }

    writer.flush()?;
    Ok(())
}
