use anyhow::Result;
use chrono::Utc;
use clap::Parser;
use tracing::info;

use crate::store::{kv::KvStore, state::AppState};

use super::{parse_user_date, today, DateStyle};

#[derive(Debug, Parser)]
pub struct LogCommand {
    #[arg(help = "Activity name as it should be displayed")]
    activity: String,
    #[arg(help = "Duration in minutes")]
    minutes: u32,
    #[arg(
        long,
        short,
        help = "Day to log for. Examples are \"yesterday\", \"last monday\", \"15/03/2025\". Defaults to today"
    )]
    date: Option<String>,
}

#[derive(Debug, Parser)]
pub struct DeleteCommand {
    #[arg(help = "Activity name, any casing. Omit to clear the whole day")]
    activity: Option<String>,
    #[arg(
        long,
        short,
        help = "Day to remove the activity from. Defaults to today"
    )]
    date: Option<String>,
}

pub async fn process_log_command(
    state: &mut AppState<impl KvStore + Sync>,
    LogCommand {
        activity,
        minutes,
        date,
    }: LogCommand,
    style: DateStyle,
) -> Result<()> {
    let date = match date {
        Some(raw) => parse_user_date(&raw, style)?,
        None => today(),
    };

    let session = state
        .add_session(&activity, minutes, date, today(), Utc::now())
        .await?;
    info!("Logged session {}", session.id);
    println!(
        "Logged {} for {} minutes on {}",
        session.activity, session.minutes, session.date
    );
    Ok(())
}

/// Removes the session for one activity+date together with its journal
/// entries. Sessions on other dates are untouched.
pub async fn process_delete_command(
    state: &mut AppState<impl KvStore + Sync>,
    DeleteCommand { activity, date }: DeleteCommand,
    style: DateStyle,
) -> Result<()> {
    let date = match date {
        Some(raw) => parse_user_date(&raw, style)?,
        None => today(),
    };

    let (sessions, entries) = match &activity {
        Some(activity) => state.delete_activity_on(activity, date).await,
        None => state.delete_date(date).await,
    };
    if sessions == 0 && entries == 0 {
        println!("Nothing to remove on {date}");
    } else {
        println!("Removed {sessions} session(s) and {entries} journal entries for {date}");
    }
    Ok(())
}
