use ansi_term::Colour;
use anyhow::Result;
use chrono::{Datelike, Duration, NaiveDate};

use crate::{
    store::{Habit, HabitStore, KeyValueBackend},
    utils::time::date_range,
};

use super::{colour_from_hex, MatrixPeriod};

/// Prints a habit/day completion table for the last `period.days()` days, one
/// habit per row, newest day rightmost. Days before a habit's start render as
/// blanks rather than misses.
pub fn print_matrix(
    store: &HabitStore<impl KeyValueBackend>,
    period: MatrixPeriod,
    today: NaiveDate,
) -> Result<()> {
    let start = today - Duration::days(period.days() as i64 - 1);
    let days: Vec<NaiveDate> = date_range(start, today).collect();

    let habits: Vec<Habit> = store
        .habits()
        .into_iter()
        .filter(|h| h.is_active)
        .collect();
    if habits.is_empty() {
        println!("No active habits.");
        return Ok(());
    }

    let name_width = habits.iter().map(|h| h.name.chars().count()).max().unwrap_or(0);

    print!("{:name_width$}", "");
    for day in &days {
        print!(" {:>2}", day.day());
    }
    println!();

    for habit in &habits {
        let colour = colour_from_hex(&habit.color);
        let name = match colour {
            Some(c) => format!("{}", c.paint(format!("{:name_width$}", habit.name))),
            None => format!("{:name_width$}", habit.name),
        };
        print!("{name}");
        for day in &days {
            print!("  {}", cell(store, habit, *day));
        }
        println!();
    }
    Ok(())
}

fn cell(store: &HabitStore<impl KeyValueBackend>, habit: &Habit, day: NaiveDate) -> String {
    if day < habit.effective_start_date() {
        return " ".to_string();
    }
    match store.entry(&habit.id, day) {
        Some(entry) if entry.completed => Colour::Green.paint("✓").to_string(),
        Some(_) => Colour::Red.paint("✗").to_string(),
        None => "·".to_string(),
    }
}
