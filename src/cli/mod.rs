pub mod heatmap;
pub mod history;
pub mod log;
pub mod projects;
pub mod settings;
pub mod stats;
pub mod timer;

use std::{fmt::Display, path::PathBuf};

use anyhow::Result;
use chrono::{Local, NaiveDate};
use chrono_english::parse_date_string;
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use history::HistoryCommand;
use log::LogCommand;
use projects::ProjectsCommand;
use settings::SettingsCommand;
use timer::TimerCommand;
use tracing::level_filters::LevelFilter;

use crate::{
    store::local::LocalStore,
    utils::{clock::SystemClock, dir::create_application_default_path, logging::enable_logging},
};

#[derive(Parser, Debug)]
#[command(name = "Workbeam", version, long_about = None)]
#[command(about = "Tracker for deep and shallow work sessions", long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Commands,
    #[arg(long, help = "Enable logging")]
    log: bool,
    #[arg(
        long,
        help = "Application directory. By default tries to save into $XDG_STATE_HOME or $HOME/.local/state"
    )]
    dir: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
#[command(version, about, long_about = None)]
enum Commands {
    #[command(about = "Time a work session interactively")]
    Timer {
        #[command(flatten)]
        command: TimerCommand,
    },
    #[command(about = "Log a finished session by hand")]
    Log {
        #[command(flatten)]
        command: LogCommand,
    },
    #[command(about = "Show today's deep and shallow hours")]
    Today,
    #[command(about = "Show totals and daily averages for the current month")]
    Month,
    #[command(about = "Show an activity heatmap of the last 300 days")]
    Heatmap,
    #[command(about = "Show the current season's XP, level and rank")]
    Season,
    #[command(about = "Browse or delete recorded sessions")]
    History {
        #[command(flatten)]
        command: HistoryCommand,
    },
    #[command(about = "Track projects and their subtasks")]
    Projects {
        #[command(subcommand)]
        command: ProjectsCommand,
    },
    #[command(about = "Show or change user settings")]
    Settings {
        #[command(subcommand)]
        command: SettingsCommand,
    },
}

pub async fn run_cli() -> Result<()> {
    let args = Args::parse();

    let logging_level = if args.log {
        Some(LevelFilter::TRACE)
    } else {
        None
    };
    let data_dir = args.dir.map_or_else(create_application_default_path, Ok)?;
    enable_logging(&data_dir, logging_level, args.log)?;

    let store = LocalStore::new(&data_dir, Box::new(SystemClock))?;

    match args.command {
        Commands::Timer { command } => timer::run(command, store, SystemClock).await,
        Commands::Log { command } => log::run(command, store).await,
        Commands::Today => stats::today(store).await,
        Commands::Month => stats::month(store).await,
        Commands::Heatmap => heatmap::run(store).await,
        Commands::Season => stats::season(store).await,
        Commands::History { command } => history::run(command, store).await,
        Commands::Projects { command } => projects::run(command, store).await,
        Commands::Settings { command } => settings::run(command, store).await,
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum DateStyle {
    Uk,
    Us,
}

impl From<DateStyle> for chrono_english::Dialect {
    fn from(value: DateStyle) -> Self {
        match value {
            DateStyle::Uk => Self::Uk,
            DateStyle::Us => Self::Us,
        }
    }
}

impl Display for DateStyle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DateStyle::Uk => write!(f, "uk"),
            DateStyle::Us => write!(f, "us"),
        }
    }
}

/// Parses a human day input like "yesterday" or "15/03/2025". Absent input
/// means today.
pub(crate) fn parse_day(value: Option<String>, date_style: DateStyle) -> Result<NaiveDate> {
    let Some(value) = value else {
        return Ok(Local::now().date_naive());
    };
    match parse_date_string(&value, Local::now(), date_style.into()) {
        Ok(v) => Ok(v.date_naive()),
        Err(e) => Err(Args::command()
            .error(
                clap::error::ErrorKind::ValueValidation,
                format!("Failed to validate date {value}: {e}"),
            )
            .into()),
    }
}
