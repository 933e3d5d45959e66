//! Command-line front end for the garden planner.
//!
//! # Responsibility
//! - Map subcommands onto planner actions and read-only views.
//! - Keep output plain text so it can be diffed and piped.
//!
//! # Invariants
//! - A rejected action prints its reason to stderr and exits with status 1.
//! - Storage and logging failures exit with status 2.

#![forbid(unsafe_code)]

use clap::{Parser, Subcommand, ValueEnum};
use garden_core::db::open_db;
use garden_core::{
    format_display, init_logging, to_canonical, Action, ActionError, Bed, Calendar, FrostDates,
    KeyValueRepository, PlannerError, PlannerService, PlantTrait, PlantUpdate, StartMethod,
    SuccessionEntry,
};
use log::info;
use std::path::{Path, PathBuf};
use std::process::ExitCode as ProcessExitCode;

const DEFAULT_DB_FILE_NAME: &str = "garden_planner.sqlite3";
const EMPTY_CELL: &str = ".";

#[derive(Parser)]
#[command(name = "garden-planner")]
#[command(about = "Plan raised beds, planting dates and successions")]
#[command(version)]
#[command(
    after_help = "Environment:\n  GARDEN_PLANNER_DB   Planner database path\n  GARDEN_PLANNER_LOG_DIR   Directory for rolling log files"
)]
struct Cli {
    /// SQLite database holding the planner snapshots.
    #[arg(long, global = true, env = "GARDEN_PLANNER_DB")]
    db: Option<PathBuf>,
    /// Last spring frost date (YYYY-MM-DD). Defaults to April 30 this year.
    #[arg(long, global = true)]
    spring_frost: Option<String>,
    /// First fall frost date (YYYY-MM-DD). Defaults to October 15 this year.
    #[arg(long, global = true)]
    fall_frost: Option<String>,
    /// Enables file logging into this directory.
    #[arg(long, global = true, env = "GARDEN_PLANNER_LOG_DIR")]
    log_dir: Option<PathBuf>,
    #[arg(long, global = true, default_value = "info")]
    log_level: String,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Bed management.
    Beds {
        #[command(subcommand)]
        command: BedsCommand,
    },
    /// Plants one square. Without --date the spring offset decides the date.
    Assign {
        bed: String,
        row: usize,
        col: usize,
        plant: String,
        #[arg(long)]
        date: Option<String>,
    },
    /// Empties one square.
    Clear { bed: String, row: usize, col: usize },
    /// Sets the free-text note on a planted square.
    Note {
        bed: String,
        row: usize,
        col: usize,
        note: String,
    },
    /// Plant library.
    Plants {
        #[command(subcommand)]
        command: PlantsCommand,
    },
    /// Planting and indoor-start calendar.
    Calendar {
        /// Includes succession sowings before the fall frost date.
        #[arg(long, default_value_t = false)]
        successions: bool,
    },
    /// Succession sowing dates per planted square.
    Successions,
}

#[derive(Subcommand)]
enum BedsCommand {
    List,
    Show {
        bed: String,
    },
    Add {
        name: Option<String>,
        #[arg(long)]
        rows: Option<usize>,
        #[arg(long)]
        cols: Option<usize>,
    },
    Rename {
        from: String,
        to: String,
    },
    Delete {
        bed: String,
    },
    /// Grows or shrinks a bed by the given row/column deltas.
    Resize {
        bed: String,
        #[arg(long, default_value_t = 0, allow_hyphen_values = true)]
        rows: i64,
        #[arg(long, default_value_t = 0, allow_hyphen_values = true)]
        cols: i64,
    },
}

#[derive(Subcommand)]
enum PlantsCommand {
    List,
    Add {
        name: Option<String>,
    },
    /// Edits one trait; omitted options stay unchanged.
    Set {
        name: String,
        #[arg(long)]
        rename: Option<String>,
        #[arg(long)]
        days: Option<i32>,
        #[arg(long, allow_hyphen_values = true)]
        spring_offset: Option<i32>,
        #[arg(long, allow_hyphen_values = true, conflicts_with = "direct_sow")]
        indoor_offset: Option<i32>,
        /// Clears the indoor offset.
        #[arg(long, default_value_t = false)]
        direct_sow: bool,
        #[arg(long, value_enum)]
        start: Option<StartMethodCli>,
        #[arg(long)]
        succession: Option<bool>,
        #[arg(long)]
        replant_delay: Option<i32>,
        #[arg(long)]
        notes: Option<String>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum StartMethodCli {
    Indoor,
    Outdoor,
}

impl From<StartMethodCli> for StartMethod {
    fn from(value: StartMethodCli) -> Self {
        match value {
            StartMethodCli::Indoor => Self::Indoor,
            StartMethodCli::Outdoor => Self::Outdoor,
        }
    }
}

fn main() -> ProcessExitCode {
    let cli = Cli::parse();

    if let Some(log_dir) = &cli.log_dir {
        let log_dir = absolute(log_dir);
        if let Err(err) = init_logging(&cli.log_level, &log_dir.to_string_lossy()) {
            eprintln!("error: {err}");
            return ProcessExitCode::from(2);
        }
    }

    match run(cli) {
        Ok(()) => ProcessExitCode::SUCCESS,
        Err(PlannerError::Rejected(err)) => {
            eprintln!("error: {err}");
            ProcessExitCode::from(1)
        }
        Err(err) => {
            eprintln!("error: {err}");
            ProcessExitCode::from(2)
        }
    }
}

fn run(cli: Cli) -> Result<(), PlannerError> {
    let db_path = cli
        .db
        .clone()
        .unwrap_or_else(|| PathBuf::from(DEFAULT_DB_FILE_NAME));
    let conn = open_db(&db_path)?;
    let mut planner = PlannerService::open(&conn, FrostDates::current_year())?;
    if cli.spring_frost.is_some() || cli.fall_frost.is_some() {
        planner.dispatch(Action::SetFrostDates {
            spring: cli.spring_frost.clone(),
            fall: cli.fall_frost.clone(),
        })?;
    }
    info!(
        "event=cli_command module=cli status=start command={}",
        command_name(&cli.command)
    );

    match cli.command {
        Commands::Beds { command } => run_beds(&mut planner, command),
        Commands::Assign {
            bed,
            row,
            col,
            plant,
            date,
        } => {
            let state = planner.dispatch(Action::AssignPlant {
                bed: bed.clone(),
                row,
                col,
                plant,
                date,
            })?;
            if let Some(record) = state.bed(&bed).and_then(|bed| bed.get(row, col)) {
                println!(
                    "{} planted in {bed} [{row},{col}] on {}",
                    record.plant, record.date
                );
            }
            Ok(())
        }
        Commands::Clear { bed, row, col } => {
            planner.dispatch(Action::ClearSquare {
                bed: bed.clone(),
                row,
                col,
            })?;
            println!("Cleared {bed} [{row},{col}]");
            Ok(())
        }
        Commands::Note {
            bed,
            row,
            col,
            note,
        } => {
            planner.dispatch(Action::SetSquareNote {
                bed: bed.clone(),
                row,
                col,
                note,
            })?;
            println!("Note saved for {bed} [{row},{col}]");
            Ok(())
        }
        Commands::Plants { command } => run_plants(&mut planner, command),
        Commands::Calendar { successions } => {
            let calendar = if successions {
                planner.calendar_with_successions()
            } else {
                planner.calendar()
            };
            print_calendar(&calendar);
            Ok(())
        }
        Commands::Successions => {
            print_successions(&planner.successions(), planner.state().frost());
            Ok(())
        }
    }
}

fn run_beds<R: KeyValueRepository>(
    planner: &mut PlannerService<R>,
    command: BedsCommand,
) -> Result<(), PlannerError> {
    match command {
        BedsCommand::List => {
            for bed in planner.state().beds() {
                println!(
                    "{}\t{}x{}\t{} planted",
                    bed.name(),
                    bed.rows(),
                    bed.cols(),
                    bed.planted_count()
                );
            }
        }
        BedsCommand::Show { bed } => match planner.bed(&bed) {
            Some(found) => print_bed(found),
            None => return Err(ActionError::UnknownBed(bed).into()),
        },
        BedsCommand::Add { name, rows, cols } => {
            let state = planner.dispatch(Action::AddBed { name, rows, cols })?;
            if let Some(bed) = state.beds().last() {
                println!("Added {} ({}x{})", bed.name(), bed.rows(), bed.cols());
            }
        }
        BedsCommand::Rename { from, to } => {
            planner.dispatch(Action::RenameBed {
                from: from.clone(),
                to: to.clone(),
            })?;
            println!("Renamed {from} to {}", to.trim());
        }
        BedsCommand::Delete { bed } => {
            planner.dispatch(Action::DeleteBed { bed: bed.clone() })?;
            println!("Deleted {bed}");
        }
        BedsCommand::Resize { bed, rows, cols } => {
            let state = planner.dispatch(Action::ResizeBed {
                bed: bed.clone(),
                row_delta: rows,
                col_delta: cols,
            })?;
            if let Some(found) = state.bed(&bed) {
                println!("{} is now {}x{}", found.name(), found.rows(), found.cols());
            }
        }
    }
    Ok(())
}

fn run_plants<R: KeyValueRepository>(
    planner: &mut PlannerService<R>,
    command: PlantsCommand,
) -> Result<(), PlannerError> {
    match command {
        PlantsCommand::List => {
            for plant in planner.state().plants().iter() {
                println!("{}", describe_plant(plant));
            }
        }
        PlantsCommand::Add { name } => {
            let state = planner.dispatch(Action::AddPlant { name })?;
            if let Some(plant) = state.plants().as_slice().last() {
                println!("Added {}", plant.name);
            }
        }
        PlantsCommand::Set {
            name,
            rename,
            days,
            spring_offset,
            indoor_offset,
            direct_sow,
            start,
            succession,
            replant_delay,
            notes,
        } => {
            let indoor_offset = if direct_sow {
                Some(None)
            } else {
                indoor_offset.map(Some)
            };
            let update = PlantUpdate {
                name: rename.clone(),
                days_to_maturity: days,
                spring_offset,
                indoor_offset,
                start_method: start.map(StartMethod::from),
                succession,
                replant_delay,
                notes,
            };
            let state = planner.dispatch(Action::UpdatePlant {
                name: name.clone(),
                update,
            })?;
            let key = rename.unwrap_or(name);
            if let Some(plant) = state.plants().get(&key) {
                println!("{}", describe_plant(plant));
            }
        }
    }
    Ok(())
}

fn print_bed(bed: &Bed) {
    println!("{} ({}x{})", bed.name(), bed.rows(), bed.cols());
    for row in 0..bed.rows() {
        let cells = (0..bed.cols())
            .map(|col| match bed.get(row, col) {
                Some(record) => format!("{} {}", record.plant, format_display(&record.date)),
                None => EMPTY_CELL.to_string(),
            })
            .collect::<Vec<_>>();
        println!("  {row}: {}", cells.join(" | "));
    }
    for (row, col, record) in bed.planted_cells() {
        if !record.note.is_empty() {
            println!("  [{row},{col}] note: {}", record.note);
        }
    }
}

fn print_calendar(calendar: &Calendar) {
    if calendar.is_empty() {
        println!("No planting events.");
        return;
    }
    for (date, events) in calendar.iter() {
        println!("{}", calendar_heading(&to_canonical(date)));
        for event in events {
            println!("  {event} in {}", event.bed);
        }
    }
}

/// `2024-03-05 (Mar 5)`: sortable key plus the short display form.
fn calendar_heading(canonical: &str) -> String {
    format!("{canonical} ({})", format_display(canonical))
}

fn print_successions(entries: &[SuccessionEntry], frost: FrostDates) {
    if entries.is_empty() {
        println!("No succession plantings before {}.", frost.fall_iso());
        return;
    }
    for entry in entries {
        let dates = entry
            .dates
            .iter()
            .map(|date| to_canonical(*date))
            .collect::<Vec<_>>();
        println!(
            "{} [{},{}] {} from {}: {}",
            entry.bed,
            entry.row,
            entry.col,
            entry.plant,
            to_canonical(entry.planted),
            dates.join(", ")
        );
    }
}

fn describe_plant(plant: &PlantTrait) -> String {
    let indoor = plant
        .indoor_offset
        .map_or_else(|| "-".to_string(), |offset| offset.to_string());
    let mut line = format!(
        "{}\tdays={}\tspring_offset={}\tindoor_offset={}\tstart={}",
        plant.name,
        plant.days_to_maturity,
        plant.spring_offset,
        indoor,
        plant.start_method.as_str()
    );
    if plant.succession {
        line.push_str(&format!("\tsuccession every {}d", plant.cycle_days()));
    }
    if !plant.notes.is_empty() {
        line.push_str(&format!("\tnotes={}", plant.notes));
    }
    line
}

fn command_name(command: &Commands) -> &'static str {
    match command {
        Commands::Beds { .. } => "beds",
        Commands::Assign { .. } => "assign",
        Commands::Clear { .. } => "clear",
        Commands::Note { .. } => "note",
        Commands::Plants { .. } => "plants",
        Commands::Calendar { .. } => "calendar",
        Commands::Successions => "successions",
    }
}

fn absolute(path: &Path) -> PathBuf {
    if path.is_absolute() {
        return path.to_path_buf();
    }
    std::env::current_dir()
        .map(|cwd| cwd.join(path))
        .unwrap_or_else(|_| path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::{calendar_heading, describe_plant, Cli, Commands};
    use clap::{CommandFactory, Parser};
    use garden_core::PlantTrait;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn resize_accepts_negative_deltas() {
        let cli = Cli::try_parse_from([
            "garden-planner",
            "beds",
            "resize",
            "Main Bed",
            "--rows",
            "-1",
            "--cols",
            "2",
        ])
        .unwrap();
        match cli.command {
            Commands::Beds {
                command: super::BedsCommand::Resize { bed, rows, cols },
            } => {
                assert_eq!(bed, "Main Bed");
                assert_eq!((rows, cols), (-1, 2));
            }
            _ => panic!("expected beds resize"),
        }
    }

    #[test]
    fn global_frost_flags_parse_after_subcommand() {
        let cli = Cli::try_parse_from([
            "garden-planner",
            "calendar",
            "--successions",
            "--spring-frost",
            "2024-05-01",
        ])
        .unwrap();
        assert_eq!(cli.spring_frost.as_deref(), Some("2024-05-01"));
        assert!(matches!(cli.command, Commands::Calendar { successions: true }));
    }

    #[test]
    fn calendar_heading_shows_key_and_display_date() {
        assert_eq!(calendar_heading("2024-03-05"), "2024-03-05 (Mar 5)");
        assert_eq!(calendar_heading("2024-11-20"), "2024-11-20 (Nov 20)");
    }

    #[test]
    fn describe_plant_mentions_succession_cycle() {
        let mut lettuce = PlantTrait::with_defaults("Lettuce");
        lettuce.days_to_maturity = 45;
        lettuce.succession = true;
        lettuce.replant_delay = 7;
        let line = describe_plant(&lettuce);
        assert!(line.starts_with("Lettuce\tdays=45"));
        assert!(line.contains("succession every 52d"));
        assert!(line.contains("indoor_offset=-"));
    }
}
