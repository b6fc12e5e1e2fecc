use ansi_term::Colour;
use anyhow::Result;
use chrono::{Duration, NaiveDate};

use crate::{
    analytics::{
        active_habits_on_date, best_streak, completion_rate_for_date, overall_completion_rate,
        rate_distribution, streak, weekly_distribution,
    },
    store::{HabitStore, KeyValueBackend},
    utils::time::{date_range, format_date},
};

use super::{colour_from_hex, Period};

const WEEKDAYS: [&str; 7] = ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"];
const RATE_BANDS: [&str; 5] = ["90-100%", " 70-89%", " 50-69%", " 30-49%", "  0-29%"];
const BAR_WIDTH: u32 = 30;
const SPARK_LEVELS: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];

/// Prints the summary view: headline numbers for the period, then per-habit
/// streaks, the per-weekday completion distribution, and how the period's
/// days spread across completion bands.
pub fn print_dashboard(
    store: &HabitStore<impl KeyValueBackend>,
    period: Period,
    today: NaiveDate,
) -> Result<()> {
    let start = today - Duration::days(period.days() as i64 - 1);
    let active = active_habits_on_date(store, today);

    println!("{} - {}", format_date(start), format_date(today));
    println!();
    println!("Active habits      {}", active.len());
    println!(
        "Completion rate    {}%",
        overall_completion_rate(store, start, today)
    );

    let mut streak_sum = 0;
    let mut best = 0;
    for habit in &active {
        streak_sum += streak(store, &habit.id, today);
        best = best.max(best_streak(store, &habit.id));
    }
    println!("Current streaks    {streak_sum} days total");
    println!("Best streak        {best} days");

    if !active.is_empty() {
        println!();
        for habit in &active {
            let current = streak(store, &habit.id, today);
            let swatch = colour_from_hex(&habit.color)
                .map(|c| c.paint("●").to_string())
                .unwrap_or_else(|| "●".to_string());
            println!(
                "{swatch} {}\t{current} day streak, best {}",
                habit.name,
                best_streak(store, &habit.id)
            );
        }
    }

    println!();
    println!("Daily trend");
    let trend = trend_points(store, start, today);
    println!("{}", Colour::Green.paint(sparkline(&trend)));

    println!();
    println!("By weekday");
    let weekdays = weekly_distribution(store, start, today);
    for (name, rate) in WEEKDAYS.iter().zip(weekdays) {
        println!("{name}  {} {rate}%", bar(rate, 100));
    }

    println!();
    println!("Days by completion");
    let bands = rate_distribution(store, start, today);
    let most = bands.iter().copied().max().unwrap_or(0).max(1);
    for (name, count) in RATE_BANDS.iter().zip(bands) {
        println!("{name}  {} {count}", bar(count, most));
    }

    Ok(())
}

fn bar(value: u32, max: u32) -> String {
    let filled = (value * BAR_WIDTH / max) as usize;
    let bar = format!(
        "{}{}",
        "█".repeat(filled),
        "░".repeat(BAR_WIDTH as usize - filled)
    );
    Colour::Green.paint(bar).to_string()
}

/// One completion-rate point per day of the inclusive range.
fn trend_points(
    store: &HabitStore<impl KeyValueBackend>,
    start: NaiveDate,
    end: NaiveDate,
) -> Vec<u32> {
    date_range(start, end)
        .map(|day| completion_rate_for_date(store, day))
        .collect()
}

fn sparkline(points: &[u32]) -> String {
    points
        .iter()
        .map(|rate| SPARK_LEVELS[(rate * 7 / 100) as usize])
        .collect()
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, TimeZone, Utc};

    use crate::store::{Entry, Habit, HabitStore, MemoryBackend};

    use super::{sparkline, trend_points};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn trend_has_one_point_per_day() {
        let store = HabitStore::new(MemoryBackend::new());
        for id in ["a", "b"] {
            store.add_habit(Habit {
                id: id.into(),
                name: id.into(),
                description: None,
                color: "#3fb950".into(),
                created_at: Utc.with_ymd_and_hms(2024, 1, 1, 8, 0, 0).unwrap(),
                start_date: Some(date(2024, 1, 1)),
                is_active: true,
            });
        }
        store.add_entry(Entry {
            habit_id: "a".into(),
            date: date(2024, 3, 1),
            completed: true,
            notes: None,
        });
        store.add_entry(Entry {
            habit_id: "a".into(),
            date: date(2024, 3, 3),
            completed: true,
            notes: None,
        });
        store.add_entry(Entry {
            habit_id: "b".into(),
            date: date(2024, 3, 3),
            completed: true,
            notes: None,
        });

        let trend = trend_points(&store, date(2024, 3, 1), date(2024, 3, 3));
        assert_eq!(trend, vec![50, 0, 100]);
    }

    #[test]
    fn sparkline_maps_rates_to_block_heights() {
        assert_eq!(sparkline(&[0, 50, 100]), "▁▄█");
        assert_eq!(sparkline(&[]), "");
    }
}
