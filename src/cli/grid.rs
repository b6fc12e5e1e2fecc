use ansi_term::Colour;
use anyhow::Result;
use chrono::NaiveDate;

use crate::{
    analytics::activity_grid,
    store::{HabitStore, KeyValueBackend},
};

const WEEKDAY_LABELS: [&str; 7] = ["   ", "Mon", "   ", "Wed", "   ", "Fri", "   "];

// GitHub's dark-theme contribution scale.
const LEVEL_COLORS: [(u8, u8, u8); 5] = [
    (0x16, 0x1b, 0x22),
    (0x0e, 0x44, 0x29),
    (0x00, 0x6d, 0x32),
    (0x26, 0xa6, 0x41),
    (0x39, 0xd3, 0x53),
];

/// Prints the year as a contribution-style grid: one row per weekday (Sunday
/// first), one column per week. Days after `today` stay blank.
pub fn print_grid(
    store: &HabitStore<impl KeyValueBackend>,
    year: i32,
    today: NaiveDate,
) -> Result<()> {
    let weeks = activity_grid(store, year);

    println!("{year}");
    for (weekday, label) in WEEKDAY_LABELS.iter().enumerate() {
        print!("{label} ");
        for week in &weeks {
            match &week[weekday] {
                Some(day) if day.date <= today => {
                    let (r, g, b) = LEVEL_COLORS[day.level as usize];
                    print!("{}", Colour::RGB(r, g, b).paint("■ "));
                }
                _ => print!("  "),
            }
        }
        println!();
    }

    print!("\n    Less ");
    for (r, g, b) in LEVEL_COLORS {
        print!("{}", Colour::RGB(r, g, b).paint("■ "));
    }
    println!("More");
    Ok(())
}
