use ansi_term::Colour;
use anyhow::{bail, Result};
use chrono::{NaiveDate, Utc};

use crate::{
    analytics::{active_habits_on_date, streak},
    store::{Entry, EntryPatch, Habit, HabitPatch, HabitStore, KeyValueBackend},
    utils::{id::generate_id, time::format_date},
};

use super::colour_from_hex;

const FALLBACK_COLOR: &str = "#58a6ff";

pub fn add_habit(
    store: &HabitStore<impl KeyValueBackend>,
    name: String,
    description: Option<String>,
    color: Option<String>,
    start_date: Option<NaiveDate>,
) -> Result<()> {
    let color = color
        .or_else(|| store.settings().default_color)
        .unwrap_or_else(|| FALLBACK_COLOR.to_string());

    let habit = Habit {
        id: generate_id(),
        name,
        description,
        color,
        created_at: Utc::now(),
        start_date,
        is_active: true,
    };
    let id = habit.id.clone();
    let painted = colour_from_hex(&habit.color)
        .map(|c| c.paint(habit.name.as_str()).to_string())
        .unwrap_or_else(|| habit.name.clone());
    if !store.add_habit(habit) {
        bail!("Failed to save habit");
    }
    println!("Added {painted} ({id})");
    Ok(())
}

pub fn list_habits(store: &HabitStore<impl KeyValueBackend>, all: bool) -> Result<()> {
    let habits = store.habits();
    let mut shown = 0;
    for habit in &habits {
        if !habit.is_active && !all {
            continue;
        }
        shown += 1;
        let swatch = colour_from_hex(&habit.color)
            .map(|c| c.paint("●").to_string())
            .unwrap_or_else(|| "●".to_string());
        let state = if habit.is_active { "" } else { "  (paused)" };
        println!(
            "{swatch} {}\t{}\tsince {}{state}",
            habit.name,
            habit.id,
            format_date(habit.effective_start_date()),
        );
        if let Some(description) = &habit.description {
            println!("    {description}");
        }
    }
    if shown == 0 {
        println!(
            "No habits{}. Create one with `habitline add`.",
            if all { "" } else { " active" }
        );
    }
    Ok(())
}

#[allow(clippy::too_many_arguments)]
pub fn edit_habit(
    store: &HabitStore<impl KeyValueBackend>,
    id: &str,
    name: Option<String>,
    description: Option<String>,
    color: Option<String>,
    start_date: Option<NaiveDate>,
    is_active: Option<bool>,
) -> Result<()> {
    let patch = HabitPatch {
        name,
        description,
        color,
        start_date,
        is_active,
    };
    if patch.is_empty() {
        bail!("Nothing to change. Pass at least one of --name, --description, --color, --start, --active");
    }
    if !store.update_habit(id, &patch) {
        bail!("No habit with id {id}");
    }
    println!("Updated {id}");
    Ok(())
}

pub fn remove_habit(store: &HabitStore<impl KeyValueBackend>, id: &str) -> Result<()> {
    let Some(habit) = store.habit_by_id(id) else {
        bail!("No habit with id {id}");
    };
    if !store.delete_habit(id) {
        bail!("Failed to remove habit {id}");
    }
    println!("Removed {} and all its records", habit.name);
    Ok(())
}

/// Flips the day's record for the habit: an existing record toggles its
/// completed flag, a missing one is created as completed.
pub fn check_habit(
    store: &HabitStore<impl KeyValueBackend>,
    id: &str,
    date: NaiveDate,
    notes: Option<String>,
    today: NaiveDate,
) -> Result<()> {
    let Some(habit) = store.habit_by_id(id) else {
        bail!("No habit with id {id}");
    };

    let completed = match store.entry(id, date) {
        Some(existing) => {
            let toggled = !existing.completed;
            let patch = EntryPatch {
                completed: Some(toggled),
                notes,
            };
            if !store.update_entry(id, date, &patch) {
                bail!("Failed to save record for {id}");
            }
            toggled
        }
        None => {
            let entry = Entry {
                habit_id: id.to_string(),
                date,
                completed: true,
                notes,
            };
            if !store.add_entry(entry) {
                bail!("Failed to save record for {id}");
            }
            true
        }
    };

    let state = if completed {
        Colour::Green.paint("completed").to_string()
    } else {
        "not completed".to_string()
    };
    println!(
        "{} on {}: {state}. Current streak: {}",
        habit.name,
        format_date(date),
        streak(store, id, today)
    );
    Ok(())
}

pub fn today_view(store: &HabitStore<impl KeyValueBackend>, today: NaiveDate) -> Result<()> {
    let active = active_habits_on_date(store, today);
    if active.is_empty() {
        println!("No habits active today.");
        return Ok(());
    }

    println!("{}", format_date(today));
    let mut done = 0;
    for habit in &active {
        let completed = store
            .entry(&habit.id, today)
            .is_some_and(|e| e.completed);
        let mark = if completed {
            done += 1;
            Colour::Green.paint("✓").to_string()
        } else {
            "○".to_string()
        };
        let current = streak(store, &habit.id, today);
        let streak_note = if current > 0 {
            format!("\t{current} day streak")
        } else {
            String::new()
        };
        println!("{mark} {}\t{}{streak_note}", habit.name, habit.id);
    }
    println!("{done}/{} completed", active.len());
    Ok(())
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, TimeZone, Utc};

    use crate::store::{Habit, HabitStore, MemoryBackend};

    use super::{add_habit, check_habit, edit_habit, remove_habit};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn store() -> HabitStore<MemoryBackend> {
        HabitStore::new(MemoryBackend::new())
    }

    fn seed_habit(store: &HabitStore<MemoryBackend>, id: &str) {
        store.add_habit(Habit {
            id: id.into(),
            name: "Stretch".into(),
            description: None,
            color: "#58a6ff".into(),
            created_at: Utc.with_ymd_and_hms(2024, 1, 1, 8, 0, 0).unwrap(),
            start_date: Some(date(2024, 1, 1)),
            is_active: true,
        });
    }

    #[test]
    fn add_uses_configured_default_color() {
        let store = store();
        add_habit(&store, "Stretch".into(), None, None, None).unwrap();

        let habits = store.habits();
        assert_eq!(habits.len(), 1);
        assert_eq!(habits[0].color, "#58a6ff");
        assert!(habits[0].is_active);
        assert!(!habits[0].id.is_empty());
    }

    #[test]
    fn edit_rejects_empty_patch_and_unknown_id() {
        let store = store();
        seed_habit(&store, "a");

        assert!(edit_habit(&store, "a", None, None, None, None, None).is_err());
        assert!(
            edit_habit(&store, "ghost", Some("x".into()), None, None, None, None).is_err()
        );

        edit_habit(&store, "a", None, None, None, None, Some(false)).unwrap();
        assert!(!store.habit_by_id("a").unwrap().is_active);
    }

    #[test]
    fn remove_unknown_habit_fails() {
        let store = store();
        assert!(remove_habit(&store, "ghost").is_err());
    }

    #[test]
    fn check_creates_then_toggles() {
        let store = store();
        seed_habit(&store, "a");
        let day = date(2024, 2, 1);

        check_habit(&store, "a", day, None, day).unwrap();
        assert!(store.entry("a", day).unwrap().completed);

        check_habit(&store, "a", day, Some("skipped".into()), day).unwrap();
        let entry = store.entry("a", day).unwrap();
        assert!(!entry.completed);
        assert_eq!(entry.notes.as_deref(), Some("skipped"));

        check_habit(&store, "a", day, None, day).unwrap();
        assert!(store.entry("a", day).unwrap().completed);
    }
}
