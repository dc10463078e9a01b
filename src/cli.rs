// src/cli.rs
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;

#[derive(Parser, Debug)]
#[command(author, version, about = "Log a workout as you go and save it when you finish", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Print `list` and `show` output as CSV instead of a table
    #[arg(long, global = true)]
    pub export_csv: bool,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum UnitCli {
    Kg,
    Lb,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum SetTypeCli {
    Warmup,
    Normal,
    Failure,
    Dropset,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start a workout (does nothing if one is already in progress)
    Start,
    /// Add an exercise to the workout in progress
    AddExercise {
        /// Catalog id of the exercise (e.g., "bench-press")
        id: String,
        /// Display name (defaults to the id)
        #[arg(short, long)]
        name: Option<String>,
        /// Default unit for this exercise's sets
        #[arg(short, long, value_enum)]
        unit: Option<UnitCli>,
        /// Rest time between sets, in seconds
        #[arg(long)]
        rest: Option<u32>,
    },
    /// Remove an exercise and all its sets from the workout in progress
    RemoveExercise { id: String },
    /// Log a set for an exercise
    AddSet {
        /// Exercise id
        exercise: String,
        /// Weight lifted (0 for bodyweight)
        #[arg(short, long, default_value_t = 0.0)]
        weight: f64,
        /// Reps performed (half reps allowed, e.g., 8.5)
        #[arg(short, long)]
        reps: f64,
        /// Unit of the weight (defaults to the exercise's unit)
        #[arg(short, long, value_enum)]
        unit: Option<UnitCli>,
        #[arg(short = 't', long = "type", value_enum, default_value = "normal")]
        set_type: SetTypeCli,
        /// Mark the set as completed
        #[arg(short, long)]
        done: bool,
    },
    /// Change a logged set
    EditSet {
        exercise: String,
        /// Set id, or its position in the exercise (1-based)
        set: String,
        #[arg(short, long)]
        weight: Option<f64>,
        #[arg(short, long)]
        reps: Option<f64>,
        #[arg(short, long, value_enum)]
        unit: Option<UnitCli>,
        #[arg(short = 't', long = "type", value_enum)]
        set_type: Option<SetTypeCli>,
        #[arg(short, long)]
        done: Option<bool>,
    },
    /// Remove a logged set
    RemoveSet {
        exercise: String,
        /// Set id, or its position in the exercise (1-based)
        set: String,
    },
    /// Set notes on the workout, or on one exercise with --exercise
    Notes {
        text: String,
        #[arg(short, long)]
        exercise: Option<String>,
    },
    /// Show the workout in progress
    Status,
    /// Save the workout in progress
    Finish,
    /// Discard the workout in progress
    Cancel,
    /// List saved workouts
    List {
        /// Show only the last N workouts
        #[arg(short, long, default_value_t = 20)]
        limit: u32,
    },
    /// Show a saved workout with all its sets
    Show {
        id: String,
        /// Display weights in this unit
        #[arg(short, long, value_enum)]
        unit: Option<UnitCli>,
    },
    /// Delete a saved workout
    DeleteWorkout { id: String },
    /// Set the default unit for new exercises
    SetUnit {
        #[arg(value_enum)]
        unit: UnitCli,
    },
    /// Set the default rest time for new exercises, in seconds
    SetRestTime { seconds: u32 },
    /// Show the path to the database file
    DbPath,
    /// Show the path to the config file
    ConfigPath,
    /// Generate shell completion scripts
    GenerateCompletion {
        #[arg(value_enum)]
        shell: Shell,
    },
}

// Function to parse CLI arguments
pub fn parse_args() -> Cli {
    Cli::parse()
}

pub fn build_cli_command() -> clap::Command {
    Cli::command()
}
