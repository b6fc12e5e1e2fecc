use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A trackable recurring activity definition. Field names serialize as
/// camelCase so exported snapshots stay compatible with the documented
/// snapshot format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Habit {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub color: String,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDate>,
    pub is_active: bool,
}

impl Habit {
    /// Day from which the habit counts as trackable. Habits created before
    /// start dates existed fall back to the date portion of `created_at`.
    pub fn effective_start_date(&self) -> NaiveDate {
        self.start_date.unwrap_or_else(|| self.created_at.date_naive())
    }

    pub fn active_on(&self, date: NaiveDate) -> bool {
        self.is_active && self.effective_start_date() <= date
    }
}

/// Partial update for a habit. Unset fields keep their current value.
#[derive(Debug, Clone, Default)]
pub struct HabitPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub color: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub is_active: Option<bool>,
}

impl HabitPatch {
    pub fn apply(&self, habit: &mut Habit) {
        if let Some(name) = &self.name {
            habit.name = name.clone();
        }
        if let Some(description) = &self.description {
            habit.description = Some(description.clone());
        }
        if let Some(color) = &self.color {
            habit.color = color.clone();
        }
        if let Some(start_date) = self.start_date {
            habit.start_date = Some(start_date);
        }
        if let Some(is_active) = self.is_active {
            habit.is_active = is_active;
        }
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.description.is_none()
            && self.color.is_none()
            && self.start_date.is_none()
            && self.is_active.is_none()
    }
}

/// A per-day completion record for one habit. At most one entry may exist
/// per (habitId, date) pair; callers look up before inserting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entry {
    pub habit_id: String,
    pub date: NaiveDate,
    pub completed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// Partial update for an entry. Unset fields keep their current value.
#[derive(Debug, Clone, Default)]
pub struct EntryPatch {
    pub completed: Option<bool>,
    pub notes: Option<String>,
}

impl EntryPatch {
    pub fn apply(&self, entry: &mut Entry) {
        if let Some(completed) = self.completed {
            entry.completed = completed;
        }
        if let Some(notes) = &self.notes {
            entry.notes = Some(notes.clone());
        }
    }
}

/// Application settings. The known fields are typed, anything else round-trips
/// through `extra` untouched.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub theme: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notifications: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub demo_mode: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_demo_data: Option<bool>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl Settings {
    /// Defaults written on first run.
    pub fn initial() -> Self {
        Settings {
            theme: Some("dark".to_string()),
            default_color: Some("#58a6ff".to_string()),
            notifications: Some(true),
            ..Settings::default()
        }
    }
}

/// Full snapshot of the persisted state, used for export/import and the demo
/// mode backup. `habits`, `entries` and `settings` are mandatory on import;
/// a snapshot missing any of the three is rejected wholesale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub export_date: Option<DateTime<Utc>>,
    pub habits: Vec<Habit>,
    pub entries: Vec<Entry>,
    pub settings: Settings,
}
