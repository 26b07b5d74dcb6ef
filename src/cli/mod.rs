pub mod journal;
pub mod log;
pub mod report;

use std::{fmt::Display, path::PathBuf};

use anyhow::Result;
use chrono::{Local, NaiveDate};
use chrono_english::parse_date_string;
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use journal::{process_journal_command, JournalCommand};
use log::{process_delete_command, process_log_command, DeleteCommand, LogCommand};
use report::{
    process_activities_command, process_cloud_command, process_summary_command, CloudCommand,
    SummaryCommand,
};
use tracing::level_filters::LevelFilter;

use crate::{
    store::{kv::FileKvStore, state::AppState},
    utils::{dir::create_application_default_path, logging::enable_logging},
};

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

#[derive(Parser, Debug)]
#[command(name = "Daycloud", version, long_about = None)]
#[command(about = "Personal activity log with word-cloud reports", long_about = None)]
struct Args {
    #[command(subcommand)]
    commands: Commands,
    #[arg(long, help = "Enable logging")]
    log: bool,
    #[arg(
        long,
        help = "Application directory. By default tries to save into $XDG_STATE_HOME or $HOME/.local/state"
    )]
    dir: Option<PathBuf>,
    #[arg(long, default_value_t = DateStyle::Uk, help = "Style of dates used during parsing. For Uk it's day/month/year. For Us it's month/day/year")]
    date_style: DateStyle,
}

#[derive(Subcommand, Debug)]
#[command(version, about, long_about = None)]
enum Commands {
    #[command(about = "Log an activity with a duration for a day")]
    Log {
        #[command(flatten)]
        command: LogCommand,
    },
    #[command(about = "Render the word cloud for an aggregation window")]
    Cloud {
        #[command(flatten)]
        command: CloudCommand,
    },
    #[command(about = "Print aggregated minute totals for an aggregation window")]
    Summary {
        #[command(flatten)]
        command: SummaryCommand,
    },
    #[command(about = "List known activities, most recently used first")]
    Activities,
    #[command(about = "Remove an activity and its journal entries from one date")]
    Delete {
        #[command(flatten)]
        command: DeleteCommand,
    },
    #[command(subcommand, about = "Attach, edit, or list journal entries")]
    Journal(JournalCommand),
}

pub async fn run_cli() -> Result<()> {
    let args = Args::parse();

    let logging_level = if args.log {
        Some(LevelFilter::TRACE)
    } else {
        None
    };
    let app_dir = match args.dir.clone() {
        Some(dir) => dir,
        None => create_application_default_path()?,
    };
    enable_logging(&app_dir, logging_level, args.log)?;

    let store = FileKvStore::new(app_dir.join("slots"))?;
    let mut state = AppState::load(store).await;

    match args.commands {
        Commands::Log { command } => process_log_command(&mut state, command, args.date_style).await,
        Commands::Cloud { command } => {
            process_cloud_command(&state, command, args.date_style)
        }
        Commands::Summary { command } => {
            process_summary_command(&state, command, args.date_style)
        }
        Commands::Activities => {
            process_activities_command(&state);
            Ok(())
        }
        Commands::Delete { command } => {
            process_delete_command(&mut state, command, args.date_style).await
        }
        Commands::Journal(command) => {
            process_journal_command(&mut state, command, args.date_style).await
        }
    }
}

/// Parses a user-supplied date. Accepts the phrasing the `chrono-english`
/// grammar allows: "yesterday", "last friday", "15/03/2025".
fn parse_user_date(raw: &str, style: DateStyle) -> Result<NaiveDate> {
    match parse_date_string(raw, Local::now(), style.into()) {
        Ok(v) => Ok(v.date_naive()),
        Err(e) => Err(Args::command()
            .error(
                clap::error::ErrorKind::ValueValidation,
                format!("Failed to validate date \"{raw}\": {e}"),
            )
            .into()),
    }
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}
