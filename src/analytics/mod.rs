//! Derived statistics over store data: streaks, completion rates, weekday
//! distribution, and the calendar activity grid. Everything here is read-only
//! with respect to the store.

use chrono::{Datelike, Duration, NaiveDate};

use crate::{
    store::{HabitStore, Habit, KeyValueBackend},
    utils::time::{date_range, format_date},
};

/// Discrete 0-4 summary of one day's completion across active habits.
///
/// `level == 0` is ambiguous on its own: it covers both "nothing completed"
/// and "no active habits". `total` disambiguates, callers that care must
/// check it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DayActivity {
    pub date: NaiveDate,
    pub level: u8,
    pub count: u32,
    pub total: u32,
    pub tooltip: String,
}

/// Habits marked active whose effective start date is on or before `date`.
pub fn active_habits_on_date(
    store: &HabitStore<impl KeyValueBackend>,
    date: NaiveDate,
) -> Vec<Habit> {
    store
        .habits()
        .into_iter()
        .filter(|h| h.active_on(date))
        .collect()
}

/// Percentage of habits active on `date` with a completed entry that day.
/// 0 when no habits are active; [activity_level_for_date] tells the two
/// apart.
pub fn completion_rate_for_date(
    store: &HabitStore<impl KeyValueBackend>,
    date: NaiveDate,
) -> u32 {
    let active = active_habits_on_date(store, date);
    if active.is_empty() {
        return 0;
    }
    let completed = completed_count(store, &active, date);
    rounded_percent(completed, active.len() as u32)
}

/// Buckets the day's completion fraction into five levels:
/// 0 -> 0, (0, 0.25] -> 1, (0.25, 0.5] -> 2, (0.5, 0.75] -> 3, else 4.
pub fn activity_level_for_date(
    store: &HabitStore<impl KeyValueBackend>,
    date: NaiveDate,
) -> DayActivity {
    let active = active_habits_on_date(store, date);
    if active.is_empty() {
        return DayActivity {
            date,
            level: 0,
            count: 0,
            total: 0,
            tooltip: "No active habits".to_string(),
        };
    }

    let total = active.len() as u32;
    let count = completed_count(store, &active, date);
    let rate = count as f64 / total as f64;

    let level = if rate == 0.0 {
        0
    } else if rate <= 0.25 {
        1
    } else if rate <= 0.5 {
        2
    } else if rate <= 0.75 {
        3
    } else {
        4
    };

    let tooltip = format!(
        "{}: {count}/{total} habits completed ({}%)",
        format_date(date),
        (rate * 100.0).round() as u32
    );

    DayActivity {
        date,
        level,
        count,
        total,
        tooltip,
    }
}

/// Completed entries divided by active-habit slots summed over every day in
/// the inclusive range. Days weigh in proportionally to how many habits were
/// active on them, which is not the same as averaging per-habit rates.
pub fn overall_completion_rate(
    store: &HabitStore<impl KeyValueBackend>,
    start: NaiveDate,
    end: NaiveDate,
) -> u32 {
    let mut total_completed = 0u32;
    let mut total_possible = 0u32;

    for date in date_range(start, end) {
        let active = active_habits_on_date(store, date);
        if active.is_empty() {
            continue;
        }
        total_possible += active.len() as u32;
        total_completed += completed_count(store, &active, date);
    }

    if total_possible == 0 {
        0
    } else {
        rounded_percent(total_completed, total_possible)
    }
}

/// Completed entries divided by recorded entries for one habit in the
/// inclusive range. 0 when nothing was recorded.
pub fn habit_completion_rate(
    store: &HabitStore<impl KeyValueBackend>,
    habit_id: &str,
    start: NaiveDate,
    end: NaiveDate,
) -> u32 {
    let entries = store.entries_by_habit_and_range(habit_id, start, end);
    if entries.is_empty() {
        return 0;
    }
    let completed = entries.iter().filter(|e| e.completed).count() as u32;
    rounded_percent(completed, entries.len() as u32)
}

/// Count of consecutive most-recent days with completed entries, anchored at
/// `today`. The newest counted entry may be dated today or yesterday (a day
/// not yet checked off does not break a running streak), every further one
/// must sit exactly one day earlier. A skipped or uncompleted day ends the
/// streak.
pub fn streak(
    store: &HabitStore<impl KeyValueBackend>,
    habit_id: &str,
    today: NaiveDate,
) -> u32 {
    let mut entries = store.entries_by_habit(habit_id);
    entries.sort_by(|a, b| b.date.cmp(&a.date));

    let mut streak = 0u32;
    let mut cursor = today;
    for entry in entries {
        let gap = (cursor - entry.date).num_days();
        let in_reach = if streak == 0 { gap == 0 || gap == 1 } else { gap == 1 };
        if in_reach && entry.completed {
            streak += 1;
            cursor = entry.date;
        } else {
            break;
        }
    }
    streak
}

/// Longest run of completed entries in ascending date order. An uncompleted
/// entry resets the run; a plain gap in recorded dates does not. Two
/// completed entries months apart therefore still count as a run of 2 — kept
/// as-is because the app has always reported it that way.
pub fn best_streak(store: &HabitStore<impl KeyValueBackend>, habit_id: &str) -> u32 {
    let mut entries = store.entries_by_habit(habit_id);
    entries.sort_by(|a, b| a.date.cmp(&b.date));

    let mut best = 0u32;
    let mut current = 0u32;
    for entry in entries {
        if entry.completed {
            current += 1;
            best = best.max(current);
        } else {
            current = 0;
        }
    }
    best
}

/// Per-weekday completion rate over the inclusive range, Sunday first.
pub fn weekly_distribution(
    store: &HabitStore<impl KeyValueBackend>,
    start: NaiveDate,
    end: NaiveDate,
) -> [u32; 7] {
    let mut completed = [0u32; 7];
    let mut possible = [0u32; 7];

    for date in date_range(start, end) {
        let weekday = date.weekday().num_days_from_sunday() as usize;
        let active = active_habits_on_date(store, date);
        if active.is_empty() {
            continue;
        }
        possible[weekday] += active.len() as u32;
        completed[weekday] += completed_count(store, &active, date);
    }

    std::array::from_fn(|i| {
        if possible[i] > 0 {
            rounded_percent(completed[i], possible[i])
        } else {
            0
        }
    })
}

/// Day counts per completion band over the inclusive range, highest band
/// first: 90-100, 70-89, 50-69, 30-49, 0-29. Days without active habits land
/// in the lowest band.
pub fn rate_distribution(
    store: &HabitStore<impl KeyValueBackend>,
    start: NaiveDate,
    end: NaiveDate,
) -> [u32; 5] {
    let mut bands = [0u32; 5];
    for date in date_range(start, end) {
        let rate = completion_rate_for_date(store, date);
        let band = match rate {
            90..=100 => 0,
            70..=89 => 1,
            50..=69 => 2,
            30..=49 => 3,
            _ => 4,
        };
        bands[band] += 1;
    }
    bands
}

/// Activity levels for every day of `year`, organized into Sunday-first weeks
/// for display. Cells outside the year are `None` placeholders.
pub fn activity_grid(
    store: &HabitStore<impl KeyValueBackend>,
    year: i32,
) -> Vec<[Option<DayActivity>; 7]> {
    let (Some(start), Some(end)) = (
        NaiveDate::from_ymd_opt(year, 1, 1),
        NaiveDate::from_ymd_opt(year, 12, 31),
    ) else {
        return vec![];
    };

    let mut week_start = start - Duration::days(start.weekday().num_days_from_sunday() as i64);
    let mut weeks = Vec::new();
    while week_start <= end {
        let mut week: [Option<DayActivity>; 7] = Default::default();
        for (offset, cell) in week.iter_mut().enumerate() {
            let date = week_start + Duration::days(offset as i64);
            if date >= start && date <= end {
                *cell = Some(activity_level_for_date(store, date));
            }
        }
        weeks.push(week);
        week_start += Duration::days(7);
    }
    weeks
}

fn completed_count(
    store: &HabitStore<impl KeyValueBackend>,
    active: &[Habit],
    date: NaiveDate,
) -> u32 {
    active
        .iter()
        .filter(|habit| {
            store
                .entry(&habit.id, date)
                .is_some_and(|e| e.completed)
        })
        .count() as u32
}

fn rounded_percent(part: u32, whole: u32) -> u32 {
    (part as f64 / whole as f64 * 100.0).round() as u32
}
