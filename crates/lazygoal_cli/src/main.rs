//! LazyGoal command-line entry point.
//!
//! # Responsibility
//! - Drive the goal service from a terminal for scripting and local checks.
//! - Keep output line-oriented and stable.

use chrono::{DateTime, Local, NaiveDate, TimeZone};
use clap::{Parser, Subcommand};
use lazygoal_core::db::{open_db, resolve_db_path};
use lazygoal_core::{
    advance_period, default_log_level, init_logging, Goal, GoalId, GoalService, HistoryWindow,
    PeriodKind, SqliteKeyValueStore, StepDirection,
};
use log::info;
use std::error::Error;
use std::process::ExitCode;

type CliResult<T> = Result<T, Box<dyn Error>>;

#[derive(Parser)]
#[command(name = "lazygoal")]
#[command(about = "Track day, month and year goals")]
#[command(version)]
struct Cli {
    /// SQLite database file
    #[arg(long, env = "LAZYGOAL_DB_PATH")]
    db: Option<String>,

    /// Absolute directory for rolling log files; logging is off when unset
    #[arg(long, env = "LAZYGOAL_LOG_DIR")]
    log_dir: Option<String>,

    /// trace|debug|info|warn|error
    #[arg(long, env = "LAZYGOAL_LOG_LEVEL")]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Show goals of one day, month or year
    List {
        #[arg(value_parser = parse_kind)]
        kind: PeriodKind,
        /// Any date inside the period (YYYY-MM-DD); defaults to today
        #[arg(long, value_parser = parse_date)]
        date: Option<NaiveDate>,
        /// Step the period back (negative) or forward (positive)
        #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
        offset: i32,
    },
    /// Add a goal to a period
    Add {
        #[arg(value_parser = parse_kind)]
        kind: PeriodKind,
        title: String,
        #[arg(long)]
        description: Option<String>,
        #[arg(long, value_parser = parse_date)]
        date: Option<NaiveDate>,
    },
    /// Advance a goal todo -> in-progress -> done -> todo
    Advance { id: String },
    /// Delete a goal
    Delete { id: String },
    /// Move an unfinished goal into the current period
    Rollover { id: String },
    /// Show grouped history for 30days, 12months or 5years
    History {
        #[arg(value_parser = parse_window, default_value = "30days")]
        window: HistoryWindow,
    },
    /// Check core linkage
    Ping,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> CliResult<()> {
    if let Some(log_dir) = cli.log_dir.as_deref() {
        let level = cli.log_level.as_deref().unwrap_or(default_log_level());
        init_logging(level, log_dir)?;
    }

    if let Command::Ping = cli.command {
        println!("lazygoal_core ping={}", lazygoal_core::ping());
        println!("lazygoal_core version={}", lazygoal_core::core_version());
        return Ok(());
    }

    let db_path = resolve_db_path(cli.db.as_deref());
    let conn = open_db(&db_path)?;
    let service = GoalService::with_storage(SqliteKeyValueStore::try_new(&conn)?);
    let now = Local::now();
    info!("event=cli_run module=cli status=start db_path={}", db_path.display());

    match cli.command {
        Command::List { kind, date, offset } => {
            let mut reference = reference_for(date, &now)?;
            let direction = if offset < 0 {
                StepDirection::Previous
            } else {
                StepDirection::Next
            };
            for _ in 0..offset.unsigned_abs() {
                reference = advance_period(kind, &reference, direction);
            }
            let view = service.period_view(kind, &reference, &now)?;
            let marker = if view.is_current { "" } else { "  (not current)" };
            println!("{}{marker}", view.title);
            if view.goals.is_empty() {
                println!("No goals set for this {kind}.");
            }
            for row in &view.goals {
                let rollover = if row.can_rollover { "  [rollover]" } else { "" };
                println!("{}{rollover}", format_goal(&row.goal));
            }
        }
        Command::Add {
            kind,
            title,
            description,
            date,
        } => {
            let reference = reference_for(date, &now)?;
            let goal = service.add_goal(kind, &reference, &title, description.as_deref())?;
            println!("{}", format_goal(&goal));
        }
        Command::Advance { id } => {
            let goal = service.advance_status(&GoalId::from(id))?;
            println!("{}", format_goal(&goal));
        }
        Command::Delete { id } => {
            let remaining = service.delete_goal(&GoalId::from(id))?;
            println!("{} goal(s) remaining", remaining.len());
        }
        Command::Rollover { id } => {
            let goal = service.rollover_to_current(&GoalId::from(id), &now)?;
            println!("{}", format_goal(&goal));
        }
        Command::History { window } => {
            let groups = service.history(window, &now)?;
            if groups.is_empty() {
                println!("No goals found in this period.");
            }
            for group in groups {
                println!("{}", group.label);
                for goal in &group.goals {
                    println!("  {}", format_goal(goal));
                }
            }
        }
        Command::Ping => {}
    }
    Ok(())
}

fn reference_for(date: Option<NaiveDate>, now: &DateTime<Local>) -> CliResult<DateTime<Local>> {
    match date {
        None => Ok(*now),
        Some(day) => Local
            .from_local_datetime(&day.and_time(now.time()))
            .earliest()
            .ok_or_else(|| format!("date {day} has no valid local time").into()),
    }
}

fn format_goal(goal: &Goal) -> String {
    let local_date = goal.date.with_timezone(&Local).format("%Y-%m-%d");
    match goal.description.as_deref() {
        Some(description) => format!(
            "{} [{}] {} {} - {}",
            goal.id, goal.status, local_date, goal.title, description
        ),
        None => format!("{} [{}] {} {}", goal.id, goal.status, local_date, goal.title),
    }
}

fn parse_kind(value: &str) -> Result<PeriodKind, String> {
    PeriodKind::parse(value).ok_or_else(|| format!("expected day|month|year, got `{value}`"))
}

fn parse_window(value: &str) -> Result<HistoryWindow, String> {
    HistoryWindow::parse(value)
        .ok_or_else(|| format!("expected 30days|12months|5years, got `{value}`"))
}

fn parse_date(value: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .map_err(|err| format!("expected YYYY-MM-DD, got `{value}`: {err}"))
}
