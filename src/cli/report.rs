use ansi_term::{Colour, Style};
use anyhow::Result;
use chrono::NaiveDate;
use clap::Parser;

use crate::{
    cloud::{
        layout::{layout, Canvas, PlacedWord},
        Word,
    },
    core::{
        aggregate::{aggregate, rank_activities},
        normalize::normalize,
        timerange::{in_range, range_end, range_start, RangeUnit},
    },
    store::{kv::KvStore, state::AppState},
};

use super::{parse_user_date, today, DateStyle};

/// Character cell footprint used to project the layout canvas onto the
/// terminal. Boxes are laid out in these pseudo-pixels and rendered at one
/// glyph per cell, so the rendered text is always narrower than its box.
const CELL_WIDTH: f32 = 8.0;
const CELL_HEIGHT: f32 = 18.0;

#[derive(Debug, Parser)]
pub struct CloudCommand {
    #[arg(long, short, value_enum, default_value_t = RangeUnit::Week)]
    unit: RangeUnit,
    #[arg(
        long,
        short,
        help = "Reference date anchoring the window. Defaults to the last logged date"
    )]
    date: Option<String>,
    #[arg(long, default_value_t = 100, help = "Cloud width in terminal columns")]
    columns: u16,
    #[arg(long, default_value_t = 28, help = "Cloud height in terminal rows")]
    rows: u16,
    #[arg(long, help = "Highlight this activity, any casing")]
    select: Option<String>,
}

#[derive(Debug, Parser)]
pub struct SummaryCommand {
    #[arg(long, short, value_enum, default_value_t = RangeUnit::Week)]
    unit: RangeUnit,
    #[arg(
        long,
        short,
        help = "Reference date anchoring the window. Defaults to the last logged date"
    )]
    date: Option<String>,
}

/// Read commands anchor on the last logged date when none is given, so a user
/// reviewing yesterday evening's log does not get an empty window after
/// midnight.
fn resolve_reference(
    state: &AppState<impl KvStore + Sync>,
    date: Option<String>,
    style: DateStyle,
) -> Result<NaiveDate> {
    match date {
        Some(raw) => parse_user_date(&raw, style),
        None => Ok(state.last_date().unwrap_or_else(today)),
    }
}

pub fn process_summary_command(
    state: &AppState<impl KvStore + Sync>,
    SummaryCommand { unit, date }: SummaryCommand,
    style: DateStyle,
) -> Result<()> {
    let reference = resolve_reference(state, date, style)?;
    let mut totals = aggregate(
        state.sessions(),
        |d| in_range(d, reference, unit),
        state.names(),
    );
    if totals.is_empty() {
        println!("Nothing logged in this {unit}");
        return Ok(());
    }
    totals.sort_by(|a, b| b.minutes.cmp(&a.minutes).then_with(|| a.text.cmp(&b.text)));

    let whole: u32 = totals.iter().map(|t| t.minutes).sum();
    print_window_header(reference, unit, whole);
    for entry in totals {
        println!(
            "{}%\t{}\t{}",
            entry.minutes * 100 / whole.max(1),
            format_minutes(entry.minutes),
            entry.text
        );
    }
    Ok(())
}

pub fn process_activities_command(state: &AppState<impl KvStore + Sync>) {
    let ranked = rank_activities(state.sessions(), state.usage(), state.names());
    if ranked.is_empty() {
        println!("No activities logged yet");
    }
    for name in ranked {
        println!("{name}");
    }
}

pub fn process_cloud_command(
    state: &AppState<impl KvStore + Sync>,
    CloudCommand {
        unit,
        date,
        columns,
        rows,
        select,
    }: CloudCommand,
    style: DateStyle,
) -> Result<()> {
    let reference = resolve_reference(state, date, style)?;
    let totals = aggregate(
        state.sessions(),
        |d| in_range(d, reference, unit),
        state.names(),
    );
    let words: Vec<Word> = totals
        .iter()
        .map(|t| Word::new(t.text.clone(), t.minutes))
        .collect();

    let canvas = Canvas::new(columns as f32 * CELL_WIDTH, rows as f32 * CELL_HEIGHT);
    let placed = layout(&words, canvas);
    if placed.is_empty() {
        println!("Nothing logged in this {unit}");
        return Ok(());
    }

    let whole: u32 = totals.iter().map(|t| t.minutes).sum();
    print_window_header(reference, unit, whole);
    print!(
        "{}",
        render_cloud(&placed, columns as usize, rows as usize, select.as_deref())
    );
    Ok(())
}

fn print_window_header(reference: NaiveDate, unit: RangeUnit, whole: u32) {
    println!(
        "{} .. {}\t{}",
        range_start(reference, unit),
        range_end(reference, unit),
        format_minutes(whole)
    );
}

/// Projects placed boxes onto a character grid. Each word is drawn centered in
/// its own box; boxes never overlap and rendered text is narrower than its
/// box, so cells never collide. Highlighting is a color override only, the
/// geometry comes straight from the layout.
fn render_cloud(placed: &[PlacedWord], columns: usize, rows: usize, select: Option<&str>) -> String {
    let selected_key = select.map(normalize);
    let max_size = placed.iter().map(|w| w.size).fold(f32::MIN, f32::max);

    let mut grid: Vec<Vec<Option<(usize, char)>>> = vec![vec![None; columns]; rows];
    for (index, word) in placed.iter().enumerate() {
        let row = (((word.y + word.height / 2.0) / CELL_HEIGHT) as usize).min(rows - 1);
        let center_col = ((word.x + word.width / 2.0) / CELL_WIDTH) as usize;
        let len = word.text.chars().count();
        let start_col = center_col.saturating_sub(len / 2);
        for (offset, ch) in word.text.chars().enumerate() {
            let col = start_col + offset;
            if col < columns && grid[row][col].is_none() {
                grid[row][col] = Some((index, ch));
            }
        }
    }

    let mut out = String::new();
    for row in &grid {
        for cell in row {
            match cell {
                Some((index, ch)) => {
                    let word = &placed[*index];
                    let style = word_style(word, max_size, selected_key.as_deref());
                    out.push_str(&style.paint(ch.to_string()).to_string());
                }
                None => out.push(' '),
            }
        }
        out.push('\n');
    }
    out
}

fn word_style(word: &PlacedWord, max_size: f32, selected_key: Option<&str>) -> Style {
    if selected_key.is_some_and(|key| normalize(&word.text) == key) {
        return Colour::Green.bold();
    }
    if word.size >= max_size * 2.0 / 3.0 {
        Colour::Yellow.bold()
    } else if word.size >= max_size / 3.0 {
        Colour::Cyan.normal()
    } else {
        Style::new().dimmed()
    }
}

fn format_minutes(minutes: u32) -> String {
    if minutes >= 60 {
        format!("{}h{}m", minutes / 60, minutes % 60)
    } else {
        format!("{minutes}m")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn placed(text: &str, size: f32, x: f32, y: f32) -> PlacedWord {
        PlacedWord {
            text: text.to_string(),
            value: 10,
            size,
            x,
            y,
            width: text.chars().count() as f32 * size * 0.58,
            height: size * 1.15,
        }
    }

    fn strip_ansi(s: &str) -> String {
        let mut out = String::new();
        let mut in_escape = false;
        for c in s.chars() {
            match c {
                '\u{1b}' => in_escape = true,
                'm' if in_escape => in_escape = false,
                c if !in_escape => out.push(c),
                _ => {}
            }
        }
        out
    }

    #[test]
    fn rendered_words_appear_in_the_grid() {
        let words = vec![
            placed("running", 40.0, 100.0, 50.0),
            placed("chess", 12.0, 500.0, 300.0),
        ];

        let plain = strip_ansi(&render_cloud(&words, 100, 28, None));

        assert!(plain.contains("running"));
        assert!(plain.contains("chess"));
    }

    #[test]
    fn selection_does_not_change_geometry() {
        let words = vec![placed("running", 40.0, 100.0, 50.0)];

        let with = render_cloud(&words, 100, 28, Some("RUNNING"));
        let without = render_cloud(&words, 100, 28, None);

        assert_eq!(strip_ansi(&with), strip_ansi(&without));
    }

    #[test]
    fn minutes_format_rolls_into_hours() {
        assert_eq!(format_minutes(45), "45m");
        assert_eq!(format_minutes(60), "1h0m");
        assert_eq!(format_minutes(135), "2h15m");
    }
}
