pub mod dashboard;
pub mod data;
pub mod grid;
pub mod habits;
pub mod matrix;

use std::{fmt::Display, path::PathBuf};

use ansi_term::Colour;
use anyhow::Result;
use chrono::{Datelike, Local, NaiveDate};
use chrono_english::parse_date_string;
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use tracing::level_filters::LevelFilter;

use crate::{
    store::{FileBackend, HabitStore},
    utils::{dir::application_dir, logging::enable_logging, time::today},
};

#[derive(Parser, Debug)]
#[command(name = "Habitline", version, long_about = None)]
#[command(about = "Command-line habit tracker", long_about = None)]
struct Args {
    #[command(subcommand)]
    commands: Commands,
    #[arg(long, global = true, help = "Enable logging")]
    log: bool,
    #[arg(
        long,
        global = true,
        help = "Application directory. By default tries to save into $XDG_STATE_HOME or $HOME/.local/state"
    )]
    dir: Option<PathBuf>,
    #[arg(
        long,
        global = true,
        default_value_t = DateStyle::Uk,
        help = "Style of dates used during parsing. For Uk it's day/month/year. For Us it's month/day/year"
    )]
    date_style: DateStyle,
}

#[derive(Subcommand, Debug)]
#[command(version, about, long_about = None)]
enum Commands {
    #[command(about = "Create a new habit")]
    Add {
        name: String,
        #[arg(long, short = 'm', help = "Longer description of the habit")]
        description: Option<String>,
        #[arg(long, help = "Display color as #rrggbb. Defaults to the configured default color")]
        color: Option<String>,
        #[arg(long, help = "First day the habit counts. Defaults to the creation day")]
        start: Option<String>,
    },
    #[command(about = "List habits")]
    List {
        #[arg(long, help = "Include paused habits")]
        all: bool,
    },
    #[command(about = "Change fields of an existing habit")]
    Edit {
        id: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long, short = 'm')]
        description: Option<String>,
        #[arg(long)]
        color: Option<String>,
        #[arg(long)]
        start: Option<String>,
        #[arg(long, help = "Activate (true) or pause (false) the habit")]
        active: Option<bool>,
    },
    #[command(about = "Delete a habit and all its completion records")]
    Remove { id: String },
    #[command(about = "Toggle completion of a habit for a day")]
    Check {
        id: String,
        #[arg(long, help = "Day to toggle. Examples are \"yesterday\", \"15/03/2025\". Defaults to today")]
        date: Option<String>,
        #[arg(long, help = "Note to attach to the record")]
        notes: Option<String>,
    },
    #[command(about = "Show today's habits with their completion state")]
    Today {},
    #[command(about = "Habit/day completion table for the recent past")]
    Matrix {
        #[arg(long, default_value_t = MatrixPeriod::Week)]
        period: MatrixPeriod,
    },
    #[command(about = "Summary statistics: streaks, completion rates, distributions")]
    Dashboard {
        #[arg(long, default_value_t = Period::Month)]
        period: Period,
    },
    #[command(about = "Calendar activity grid for a year")]
    Grid {
        #[arg(long, help = "Year to render. Defaults to the current year")]
        year: Option<i32>,
    },
    #[command(about = "Write all data to a snapshot file")]
    Export {
        #[arg(long, short, help = "Output path. Defaults to habit-tracker-backup-<date>.json")]
        output: Option<PathBuf>,
    },
    #[command(about = "Replace all data with a snapshot file")]
    Import { file: PathBuf },
    #[command(about = "Erase everything and start over")]
    Clear {
        #[arg(long, help = "Required. Clearing is not reversible")]
        yes: bool,
    },
    #[command(about = "Switch sample data in and out without losing real data")]
    Demo {
        #[command(subcommand)]
        command: DemoCommand,
    },
}

#[derive(Subcommand, Debug)]
pub enum DemoCommand {
    #[command(about = "Back up current data and load generated sample data")]
    Enter {},
    #[command(about = "Restore the data backed up when entering demo mode")]
    Exit {},
    #[command(about = "Replace the sample records with freshly generated ones")]
    Regenerate {},
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum DateStyle {
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

/// Reporting window for the dashboard view.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum Period {
    Week,
    Month,
    Year,
}

impl Period {
    pub fn days(self) -> u32 {
        match self {
            Period::Week => 7,
            Period::Month => 30,
            Period::Year => 365,
        }
    }
}

impl Display for Period {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Period::Week => write!(f, "week"),
            Period::Month => write!(f, "month"),
            Period::Year => write!(f, "year"),
        }
    }
}

/// Reporting window for the matrix view. A year of columns does not fit a
/// terminal, so the matrix stops at a month.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum MatrixPeriod {
    Week,
    Month,
}

impl MatrixPeriod {
    pub fn days(self) -> u32 {
        match self {
            MatrixPeriod::Week => 7,
            MatrixPeriod::Month => 30,
        }
    }
}

impl Display for MatrixPeriod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MatrixPeriod::Week => write!(f, "week"),
            MatrixPeriod::Month => write!(f, "month"),
        }
    }
}

pub fn run_cli() -> Result<()> {
    let args = Args::parse();

    let app_dir = application_dir(args.dir.clone())?;

    let logging_level = if args.log {
        Some(LevelFilter::TRACE)
    } else {
        None
    };
    enable_logging(&app_dir, logging_level, args.log)?;

    let store = HabitStore::new(FileBackend::new(app_dir.join("data"))?);
    let today = today();
    let date_style = args.date_style;

    match args.commands {
        Commands::Add {
            name,
            description,
            color,
            start,
        } => {
            let start = start.map(|s| parse_date_arg(&s, date_style)).transpose()?;
            habits::add_habit(&store, name, description, color, start)
        }
        Commands::List { all } => habits::list_habits(&store, all),
        Commands::Edit {
            id,
            name,
            description,
            color,
            start,
            active,
        } => {
            let start = start.map(|s| parse_date_arg(&s, date_style)).transpose()?;
            habits::edit_habit(&store, &id, name, description, color, start, active)
        }
        Commands::Remove { id } => habits::remove_habit(&store, &id),
        Commands::Check { id, date, notes } => {
            let date = match date {
                Some(s) => parse_date_arg(&s, date_style)?,
                None => today,
            };
            habits::check_habit(&store, &id, date, notes, today)
        }
        Commands::Today {} => habits::today_view(&store, today),
        Commands::Matrix { period } => matrix::print_matrix(&store, period, today),
        Commands::Dashboard { period } => dashboard::print_dashboard(&store, period, today),
        Commands::Grid { year } => grid::print_grid(&store, year.unwrap_or(today.year()), today),
        Commands::Export { output } => data::export(&store, output, today),
        Commands::Import { file } => data::import(&store, &file),
        Commands::Clear { yes } => data::clear(&store, yes),
        Commands::Demo { command } => data::demo(&store, command, today),
    }
}

/// Parses a free-form date argument ("yesterday", "15/03/2025", ...) in local
/// time and truncates it to a day.
fn parse_date_arg(value: &str, style: DateStyle) -> Result<NaiveDate> {
    match parse_date_string(value, Local::now(), style.into()) {
        Ok(parsed) => Ok(parsed.with_timezone(&Local).date_naive()),
        Err(e) => Err(Args::command()
            .error(
                clap::error::ErrorKind::ValueValidation,
                format!("Failed to parse date \"{value}\" {e}"),
            )
            .into()),
    }
}

/// "#rrggbb" to a terminal color. Anything unparsable renders uncolored.
pub(crate) fn colour_from_hex(hex: &str) -> Option<Colour> {
    let hex = hex.strip_prefix('#')?;
    if hex.len() != 6 {
        return None;
    }
    let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
    let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
    let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
    Some(Colour::RGB(r, g, b))
}

#[cfg(test)]
mod tests {
    use ansi_term::Colour;
    use clap::Parser;

    use super::{colour_from_hex, Args};

    #[test]
    fn parses_hex_colors() {
        assert_eq!(colour_from_hex("#3fb950"), Some(Colour::RGB(0x3f, 0xb9, 0x50)));
        assert_eq!(colour_from_hex("#FFFFFF"), Some(Colour::RGB(255, 255, 255)));
    }

    #[test]
    fn rejects_malformed_hex() {
        assert_eq!(colour_from_hex("3fb950"), None);
        assert_eq!(colour_from_hex("#3fb9"), None);
        assert_eq!(colour_from_hex("#gggggg"), None);
    }

    #[test]
    fn matrix_period_is_capped_at_a_month() {
        assert!(Args::try_parse_from(["habitline", "matrix", "--period", "week"]).is_ok());
        assert!(Args::try_parse_from(["habitline", "matrix", "--period", "month"]).is_ok());
        assert!(Args::try_parse_from(["habitline", "matrix", "--period", "year"]).is_err());
        // the dashboard still takes the full year
        assert!(Args::try_parse_from(["habitline", "dashboard", "--period", "year"]).is_ok());
    }
}
