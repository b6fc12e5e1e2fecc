use std::{fs, path::PathBuf};

use anyhow::{bail, Context, Result};
use chrono::{Datelike, Duration, NaiveDate, TimeZone, Utc, Weekday};
use rand::Rng;
use tracing::info;

use crate::{
    store::{Entry, Habit, HabitStore, KeyValueBackend},
    utils::{id::generate_id, time::{date_range, format_date}},
};

use super::DemoCommand;

pub fn export(
    store: &HabitStore<impl KeyValueBackend>,
    output: Option<PathBuf>,
    today: NaiveDate,
) -> Result<()> {
    let path = output
        .unwrap_or_else(|| PathBuf::from(format!("habit-tracker-backup-{}.json", format_date(today))));
    let snapshot = store.export_data();
    let raw = serde_json::to_string_pretty(&snapshot)?;
    fs::write(&path, raw).with_context(|| format!("Failed to write {path:?}"))?;
    println!(
        "Exported {} habits and {} records to {}",
        snapshot.habits.len(),
        snapshot.entries.len(),
        path.display()
    );
    Ok(())
}

pub fn import(store: &HabitStore<impl KeyValueBackend>, file: &PathBuf) -> Result<()> {
    let raw = fs::read_to_string(file).with_context(|| format!("Failed to read {file:?}"))?;
    if !store.import_data(&raw) {
        bail!(
            "{} is not a valid snapshot. It must contain habits, entries and settings",
            file.display()
        );
    }
    println!(
        "Imported {} habits and {} records",
        store.habits().len(),
        store.entries().len()
    );
    Ok(())
}

pub fn clear(store: &HabitStore<impl KeyValueBackend>, yes: bool) -> Result<()> {
    if !yes {
        bail!("This erases all habits and records. Re-run with --yes to confirm");
    }
    if !store.clear_all_data() {
        bail!("Failed to clear all data");
    }
    println!("All data cleared");
    Ok(())
}

/// Demo mode swaps the real data out for generated sample data, keeping a
/// snapshot of the real data in a backup slot until `demo exit`.
pub fn demo(
    store: &HabitStore<impl KeyValueBackend>,
    command: DemoCommand,
    today: NaiveDate,
) -> Result<()> {
    match command {
        DemoCommand::Enter {} => {
            if store.settings().demo_mode == Some(true) {
                bail!("Already in demo mode. Use `demo regenerate` for fresh sample data");
            }
            let backup = store.export_data();
            if !store.save_demo_backup(&backup) {
                bail!("Failed to back up current data, demo mode not entered");
            }
            info!("Backed up {} habits before entering demo mode", backup.habits.len());

            load_sample_data(store, today)?;

            let mut settings = store.settings();
            settings.demo_mode = Some(true);
            settings.is_demo_data = Some(true);
            store.save_settings(&settings);
            println!("Demo mode on. Your data is backed up; `demo exit` restores it");
            Ok(())
        }
        DemoCommand::Exit {} => {
            let Some(backup) = store.take_demo_backup() else {
                bail!("Not in demo mode");
            };
            store.save_habits(&backup.habits);
            store.save_entries(&backup.entries);
            store.save_settings(&backup.settings);
            println!(
                "Demo mode off. Restored {} habits and {} records",
                backup.habits.len(),
                backup.entries.len()
            );
            Ok(())
        }
        DemoCommand::Regenerate {} => {
            if store.settings().demo_mode != Some(true) {
                bail!("Not in demo mode. Use `demo enter` first");
            }
            load_sample_data(store, today)?;
            println!("Regenerated sample data");
            Ok(())
        }
    }
}

fn load_sample_data(store: &HabitStore<impl KeyValueBackend>, today: NaiveDate) -> Result<()> {
    let (habits, entries) = generate_sample_data(today);
    if !store.save_habits(&habits) || !store.save_entries(&entries) {
        bail!("Failed to write sample data");
    }
    Ok(())
}

struct SampleHabit {
    name: &'static str,
    description: &'static str,
    color: &'static str,
    age_days: i64,
    completion_rate: f64,
    // Habits people drop on weekends get their rate dampened on Sat/Sun.
    weekend_slump: bool,
}

const SAMPLE_HABITS: [SampleHabit; 6] = [
    SampleHabit {
        name: "Morning Exercise",
        description: "30 minutes of movement before breakfast",
        color: "#ff6b6b",
        age_days: 365,
        completion_rate: 0.75,
        weekend_slump: true,
    },
    SampleHabit {
        name: "Read Books",
        description: "Read at least 20 pages",
        color: "#4ecdc4",
        age_days: 300,
        completion_rate: 0.80,
        weekend_slump: false,
    },
    SampleHabit {
        name: "Meditation",
        description: "10 minutes of mindfulness",
        color: "#45b7d1",
        age_days: 240,
        completion_rate: 0.85,
        weekend_slump: false,
    },
    SampleHabit {
        name: "Drink Water",
        description: "8 glasses throughout the day",
        color: "#3fb950",
        age_days: 180,
        completion_rate: 0.90,
        weekend_slump: false,
    },
    SampleHabit {
        name: "Journal",
        description: "Write down three thoughts",
        color: "#a371f7",
        age_days: 120,
        completion_rate: 0.60,
        weekend_slump: false,
    },
    SampleHabit {
        name: "Learn Programming",
        description: "One exercise or chapter a day",
        color: "#d29922",
        age_days: 90,
        completion_rate: 0.70,
        weekend_slump: true,
    },
];

const WEEKEND_FACTOR: f64 = 0.6;

/// Generates the sample habits with randomized completion histories. Only
/// completed records are written, a day the dice skipped simply has none.
fn generate_sample_data(today: NaiveDate) -> (Vec<Habit>, Vec<Entry>) {
    let mut rng = rand::thread_rng();
    let mut habits = Vec::with_capacity(SAMPLE_HABITS.len());
    let mut entries = Vec::new();

    for sample in &SAMPLE_HABITS {
        let start = today - Duration::days(sample.age_days);
        let id = generate_id();

        for day in date_range(start, today) {
            let weekend = matches!(day.weekday(), Weekday::Sat | Weekday::Sun);
            let rate = if weekend && sample.weekend_slump {
                sample.completion_rate * WEEKEND_FACTOR
            } else {
                sample.completion_rate
            };
            if rng.gen::<f64>() < rate {
                entries.push(Entry {
                    habit_id: id.clone(),
                    date: day,
                    completed: true,
                    notes: None,
                });
            }
        }

        habits.push(Habit {
            id,
            name: sample.name.to_string(),
            description: Some(sample.description.to_string()),
            color: sample.color.to_string(),
            created_at: Utc
                .from_utc_datetime(&start.and_hms_opt(9, 0, 0).unwrap_or_default()),
            start_date: Some(start),
            is_active: true,
        });
    }

    (habits, entries)
}
