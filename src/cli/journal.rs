use anyhow::Result;
use chrono::Utc;
use clap::{Parser, Subcommand};

use crate::{
    core::timerange::{in_range, RangeUnit},
    store::{kv::KvStore, state::AppState},
};

use super::{parse_user_date, today, DateStyle};

#[derive(Subcommand, Debug)]
pub enum JournalCommand {
    #[command(about = "Attach a note to an activity on a day")]
    Add {
        #[command(flatten)]
        command: JournalAddCommand,
    },
    #[command(about = "Replace the text of an existing note")]
    Edit {
        #[arg(help = "Id printed when the note was added or listed")]
        id: String,
        text: String,
    },
    #[command(about = "Delete a single note")]
    Remove {
        id: String,
    },
    #[command(about = "List notes for an activity inside an aggregation window")]
    List {
        #[command(flatten)]
        command: JournalListCommand,
    },
}

#[derive(Debug, Parser)]
pub struct JournalAddCommand {
    activity: String,
    text: String,
    #[arg(long, short, help = "Day the note belongs to. Defaults to today")]
    date: Option<String>,
}

#[derive(Debug, Parser)]
pub struct JournalListCommand {
    activity: String,
    #[arg(long, short, value_enum, default_value_t = RangeUnit::Day)]
    unit: RangeUnit,
    #[arg(
        long,
        short,
        help = "Reference date anchoring the window. Defaults to today"
    )]
    date: Option<String>,
}

pub async fn process_journal_command(
    state: &mut AppState<impl KvStore + Sync>,
    command: JournalCommand,
    style: DateStyle,
) -> Result<()> {
    match command {
        JournalCommand::Add {
            command: JournalAddCommand {
                activity,
                text,
                date,
            },
        } => {
            let date = match date {
                Some(raw) => parse_user_date(&raw, style)?,
                None => today(),
            };
            let entry = state.add_journal(&activity, &text, date, Utc::now()).await?;
            println!("Added note {} to {} on {}", entry.id, entry.word, entry.date);
        }
        JournalCommand::Edit { id, text } => {
            if state.update_journal(&id, &text, Utc::now()).await {
                println!("Updated note {id}");
            } else {
                println!("No note with id {id}");
            }
        }
        JournalCommand::Remove { id } => {
            if state.delete_journal(&id).await {
                println!("Removed note {id}");
            } else {
                println!("No note with id {id}");
            }
        }
        JournalCommand::List {
            command: JournalListCommand {
                activity,
                unit,
                date,
            },
        } => {
            let reference = match date {
                Some(raw) => parse_user_date(&raw, style)?,
                None => today(),
            };
            let entries = state.journal_for(&activity, |d| in_range(d, reference, unit));
            if entries.is_empty() {
                println!("No notes for {activity} in this {unit}");
            }
            for entry in entries {
                println!(
                    "{}\t{}\t{}\t{}",
                    entry.date,
                    entry.timestamp.format("%H:%M"),
                    entry.id,
                    entry.text
                );
            }
        }
    }
    Ok(())
}
