use chrono::{NaiveDate, Utc};
use serde::{de::DeserializeOwned, Serialize};
use tracing::{error, warn};

use super::{
    entities::{Entry, EntryPatch, Habit, HabitPatch, Settings, Snapshot},
    kv::KeyValueBackend,
};

pub const STORAGE_VERSION: &str = "1.0.0";

mod keys {
    pub const HABITS: &str = "habits";
    pub const ENTRIES: &str = "entries";
    pub const SETTINGS: &str = "settings";
    pub const VERSION: &str = "version";
    pub const DEMO_BACKUP: &str = "demo_backup";
}

/// Owns the three persisted collections (habits, entries, settings) and the
/// version stamp. Constructed once per session and passed by reference;
/// tests supply a [super::MemoryBackend] for isolation.
///
/// Mutations read the whole collection, modify it, and write it back. That is
/// only safe because all access is single-threaded; a second process writing
/// the same directory can lose updates.
///
/// Failures never escape this type: writes report success as a bool and log
/// the cause, reads fall back to empty defaults.
pub struct HabitStore<B> {
    backend: B,
}

impl<B: KeyValueBackend> HabitStore<B> {
    pub fn new(backend: B) -> Self {
        let store = Self { backend };
        store.initialize();
        store
    }

    /// First run (no version stamp) seeds empty collections and default
    /// settings. Subsequent constructions leave existing data untouched.
    fn initialize(&self) {
        if self.get::<String>(keys::VERSION).is_none() {
            self.set(keys::VERSION, &STORAGE_VERSION);
            self.set(keys::HABITS, &Vec::<Habit>::new());
            self.set(keys::ENTRIES, &Vec::<Entry>::new());
            self.set(keys::SETTINGS, &Settings::initial());
        }
    }

    fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        match self.backend.read(key) {
            Ok(Some(raw)) => match serde_json::from_str(&raw) {
                Ok(value) => Some(value),
                Err(e) => {
                    warn!("Discarding malformed value for {key}: {e}");
                    None
                }
            },
            Ok(None) => None,
            Err(e) => {
                warn!("Failed to read {key}: {e}");
                None
            }
        }
    }

    fn set<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> bool {
        let raw = match serde_json::to_string(value) {
            Ok(raw) => raw,
            Err(e) => {
                error!("Failed to serialize {key}: {e}");
                return false;
            }
        };
        match self.backend.write(key, &raw) {
            Ok(()) => true,
            Err(e) => {
                error!("Failed to write {key}: {e}");
                false
            }
        }
    }

    // Habits

    pub fn habits(&self) -> Vec<Habit> {
        self.get(keys::HABITS).unwrap_or_default()
    }

    pub fn save_habits(&self, habits: &[Habit]) -> bool {
        self.set(keys::HABITS, habits)
    }

    pub fn add_habit(&self, habit: Habit) -> bool {
        let mut habits = self.habits();
        habits.push(habit);
        self.save_habits(&habits)
    }

    /// Merges the patch into the habit with the given id. Returns false
    /// without side effects when the id is unknown.
    pub fn update_habit(&self, id: &str, patch: &HabitPatch) -> bool {
        let mut habits = self.habits();
        match habits.iter_mut().find(|h| h.id == id) {
            Some(habit) => {
                patch.apply(habit);
                self.save_habits(&habits)
            }
            None => false,
        }
    }

    /// Removes the habit and every entry referencing it. No entry may outlive
    /// its habit. Returns false when the habit was absent; the cascade is
    /// skipped in that case.
    pub fn delete_habit(&self, id: &str) -> bool {
        let mut habits = self.habits();
        let before = habits.len();
        habits.retain(|h| h.id != id);
        if habits.len() == before {
            return false;
        }
        let saved = self.save_habits(&habits);
        if saved {
            self.delete_entries_by_habit(id);
        }
        saved
    }

    pub fn habit_by_id(&self, id: &str) -> Option<Habit> {
        self.habits().into_iter().find(|h| h.id == id)
    }

    // Entries

    pub fn entries(&self) -> Vec<Entry> {
        self.get(keys::ENTRIES).unwrap_or_default()
    }

    pub fn save_entries(&self, entries: &[Entry]) -> bool {
        self.set(keys::ENTRIES, entries)
    }

    /// Appends an entry. Callers must check [Self::entry] first to keep the
    /// one-entry-per-habit-per-day convention.
    pub fn add_entry(&self, entry: Entry) -> bool {
        let mut entries = self.entries();
        entries.push(entry);
        self.save_entries(&entries)
    }

    pub fn update_entry(&self, habit_id: &str, date: NaiveDate, patch: &EntryPatch) -> bool {
        let mut entries = self.entries();
        match entries
            .iter_mut()
            .find(|e| e.habit_id == habit_id && e.date == date)
        {
            Some(entry) => {
                patch.apply(entry);
                self.save_entries(&entries)
            }
            None => false,
        }
    }

    pub fn delete_entry(&self, habit_id: &str, date: NaiveDate) -> bool {
        let mut entries = self.entries();
        entries.retain(|e| !(e.habit_id == habit_id && e.date == date));
        self.save_entries(&entries)
    }

    pub fn delete_entries_by_habit(&self, habit_id: &str) -> bool {
        let mut entries = self.entries();
        entries.retain(|e| e.habit_id != habit_id);
        self.save_entries(&entries)
    }

    pub fn entry(&self, habit_id: &str, date: NaiveDate) -> Option<Entry> {
        self.entries()
            .into_iter()
            .find(|e| e.habit_id == habit_id && e.date == date)
    }

    pub fn entries_by_habit(&self, habit_id: &str) -> Vec<Entry> {
        self.entries()
            .into_iter()
            .filter(|e| e.habit_id == habit_id)
            .collect()
    }

    /// Entries between the two dates, inclusive on both bounds.
    pub fn entries_by_date_range(&self, start: NaiveDate, end: NaiveDate) -> Vec<Entry> {
        self.entries()
            .into_iter()
            .filter(|e| e.date >= start && e.date <= end)
            .collect()
    }

    pub fn entries_by_habit_and_range(
        &self,
        habit_id: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Vec<Entry> {
        self.entries()
            .into_iter()
            .filter(|e| e.habit_id == habit_id && e.date >= start && e.date <= end)
            .collect()
    }

    // Settings

    pub fn settings(&self) -> Settings {
        self.get(keys::SETTINGS).unwrap_or_default()
    }

    pub fn save_settings(&self, settings: &Settings) -> bool {
        self.set(keys::SETTINGS, settings)
    }

    // Export / import

    pub fn export_data(&self) -> Snapshot {
        Snapshot {
            version: STORAGE_VERSION.to_string(),
            export_date: Some(Utc::now()),
            habits: self.habits(),
            entries: self.entries(),
            settings: self.settings(),
        }
    }

    /// Replaces all three collections with the snapshot's. No merge, no
    /// partial import: a snapshot missing habits, entries or settings is
    /// rejected and nothing changes.
    pub fn import_data(&self, raw: &str) -> bool {
        let snapshot: Snapshot = match serde_json::from_str(raw) {
            Ok(snapshot) => snapshot,
            Err(e) => {
                error!("Rejecting import: {e}");
                return false;
            }
        };
        self.set(keys::HABITS, &snapshot.habits)
            && self.set(keys::ENTRIES, &snapshot.entries)
            && self.set(keys::SETTINGS, &snapshot.settings)
    }

    /// Removes everything and immediately reseeds version + defaults, so the
    /// store never stays unversioned. Returns false when any removal failed.
    pub fn clear_all_data(&self) -> bool {
        let mut removed = true;
        for key in [keys::HABITS, keys::ENTRIES, keys::SETTINGS, keys::VERSION] {
            if let Err(e) = self.backend.remove(key) {
                error!("Failed to remove {key}: {e}");
                removed = false;
            }
        }
        self.initialize();
        removed
    }

    // Demo mode backup slot. Just an ordinary snapshot under its own key.

    pub fn save_demo_backup(&self, snapshot: &Snapshot) -> bool {
        self.set(keys::DEMO_BACKUP, snapshot)
    }

    pub fn has_demo_backup(&self) -> bool {
        matches!(self.backend.read(keys::DEMO_BACKUP), Ok(Some(_)))
    }

    /// Reads and clears the backup slot in one step.
    pub fn take_demo_backup(&self) -> Option<Snapshot> {
        let snapshot = self.get::<Snapshot>(keys::DEMO_BACKUP)?;
        if let Err(e) = self.backend.remove(keys::DEMO_BACKUP) {
            error!("Failed to remove demo backup: {e}");
        }
        Some(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, TimeZone, Utc};

    use anyhow::{bail, Result};

    use crate::store::{
        entities::{Entry, EntryPatch, Habit, HabitPatch, Settings},
        kv::{KeyValueBackend, MemoryBackend},
        store::{HabitStore, STORAGE_VERSION},
    };

    /// Backend where removal always fails, as on a read-only filesystem.
    struct UnremovableBackend(MemoryBackend);

    impl KeyValueBackend for UnremovableBackend {
        fn read(&self, key: &str) -> Result<Option<String>> {
            self.0.read(key)
        }

        fn write(&self, key: &str, value: &str) -> Result<()> {
            self.0.write(key, value)
        }

        fn remove(&self, key: &str) -> Result<()> {
            bail!("cannot remove {key}")
        }
    }

    fn store() -> HabitStore<MemoryBackend> {
        HabitStore::new(MemoryBackend::new())
    }

    fn habit(id: &str, name: &str) -> Habit {
        Habit {
            id: id.into(),
            name: name.into(),
            description: None,
            color: "#58a6ff".into(),
            created_at: Utc.with_ymd_and_hms(2024, 1, 15, 9, 0, 0).unwrap(),
            start_date: NaiveDate::from_ymd_opt(2024, 1, 15),
            is_active: true,
        }
    }

    fn entry(habit_id: &str, date: (i32, u32, u32), completed: bool) -> Entry {
        Entry {
            habit_id: habit_id.into(),
            date: NaiveDate::from_ymd_opt(date.0, date.1, date.2).unwrap(),
            completed,
            notes: None,
        }
    }

    #[test]
    fn first_run_seeds_version_and_defaults() {
        let store = store();
        assert!(store.habits().is_empty());
        assert!(store.entries().is_empty());
        let settings = store.settings();
        assert_eq!(settings.theme.as_deref(), Some("dark"));
        assert_eq!(settings.default_color.as_deref(), Some("#58a6ff"));
        assert_eq!(settings.notifications, Some(true));
    }

    #[test]
    fn add_update_delete_habit() {
        let store = store();
        assert!(store.add_habit(habit("a", "Run")));
        assert!(store.add_habit(habit("b", "Read")));

        assert!(store.update_habit(
            "a",
            &HabitPatch {
                name: Some("Run 5k".into()),
                ..HabitPatch::default()
            }
        ));
        assert_eq!(store.habit_by_id("a").unwrap().name, "Run 5k");

        assert!(store.delete_habit("a"));
        assert_eq!(store.habits().len(), 1);
        assert!(store.habit_by_id("a").is_none());
    }

    #[test]
    fn update_missing_habit_leaves_collection_unchanged() {
        let store = store();
        store.add_habit(habit("a", "Run"));
        let before = store.habits();

        assert!(!store.update_habit(
            "nope",
            &HabitPatch {
                name: Some("x".into()),
                ..HabitPatch::default()
            }
        ));
        assert_eq!(store.habits(), before);
    }

    #[test]
    fn delete_habit_cascades_to_entries() {
        let store = store();
        store.add_habit(habit("a", "Run"));
        store.add_habit(habit("b", "Read"));
        store.add_entry(entry("a", (2024, 2, 1), true));
        store.add_entry(entry("a", (2024, 2, 2), false));
        store.add_entry(entry("b", (2024, 2, 1), true));

        assert!(store.delete_habit("a"));
        assert!(store.entries_by_habit("a").is_empty());
        assert_eq!(store.entries_by_habit("b").len(), 1);
    }

    #[test]
    fn delete_missing_habit_returns_false_and_skips_cascade() {
        let store = store();
        store.add_habit(habit("a", "Run"));
        store.add_entry(entry("a", (2024, 2, 1), true));

        assert!(!store.delete_habit("ghost"));
        assert_eq!(store.entries().len(), 1);
    }

    #[test]
    fn entry_lookup_and_patch() {
        let store = store();
        store.add_entry(entry("a", (2024, 2, 1), false));

        let date = NaiveDate::from_ymd_opt(2024, 2, 1).unwrap();
        assert!(store.update_entry(
            "a",
            date,
            &EntryPatch {
                completed: Some(true),
                notes: Some("felt good".into()),
            }
        ));
        let updated = store.entry("a", date).unwrap();
        assert!(updated.completed);
        assert_eq!(updated.notes.as_deref(), Some("felt good"));

        let missing = NaiveDate::from_ymd_opt(2024, 2, 2).unwrap();
        let before = store.entries();
        assert!(!store.update_entry("a", missing, &EntryPatch::default()));
        assert_eq!(store.entries(), before);
    }

    #[test]
    fn date_range_is_inclusive() {
        let store = store();
        store.add_entry(entry("a", (2024, 2, 1), true));
        store.add_entry(entry("a", (2024, 2, 5), true));
        store.add_entry(entry("a", (2024, 2, 9), true));

        let start = NaiveDate::from_ymd_opt(2024, 2, 1).unwrap();
        let end = NaiveDate::from_ymd_opt(2024, 2, 5).unwrap();
        let in_range = store.entries_by_date_range(start, end);
        assert_eq!(in_range.len(), 2);
        assert!(in_range.iter().any(|e| e.date == start));
        assert!(in_range.iter().any(|e| e.date == end));
    }

    #[test]
    fn export_import_round_trip() {
        let store = store();
        store.add_habit(habit("a", "Run"));
        store.add_entry(entry("a", (2024, 2, 1), true));
        let mut settings = store.settings();
        settings.theme = Some("light".into());
        store.save_settings(&settings);

        let exported = store.export_data();
        assert_eq!(exported.version, STORAGE_VERSION);
        let raw = serde_json::to_string(&exported).unwrap();

        let restored = HabitStore::new(MemoryBackend::new());
        assert!(restored.import_data(&raw));
        assert_eq!(restored.habits(), store.habits());
        assert_eq!(restored.entries(), store.entries());
        assert_eq!(restored.settings(), store.settings());
    }

    #[test]
    fn import_rejects_incomplete_snapshot() {
        let store = store();
        store.add_habit(habit("a", "Run"));

        assert!(!store.import_data(r#"{"habits":[],"entries":[]}"#));
        assert!(!store.import_data("not json"));
        // nothing was replaced
        assert_eq!(store.habits().len(), 1);
    }

    #[test]
    fn clear_reinitializes_defaults() {
        let store = store();
        store.add_habit(habit("a", "Run"));
        store.add_entry(entry("a", (2024, 2, 1), true));

        assert!(store.clear_all_data());
        assert!(store.habits().is_empty());
        assert!(store.entries().is_empty());
        assert_eq!(store.settings(), Settings::initial());
    }

    #[test]
    fn clear_reports_failed_removal() {
        let store = HabitStore::new(UnremovableBackend(MemoryBackend::new()));
        store.add_habit(habit("a", "Run"));

        assert!(!store.clear_all_data());
        // nothing was removed, so the data survives
        assert_eq!(store.habits().len(), 1);
    }

    #[test]
    fn demo_backup_round_trip() {
        let store = store();
        store.add_habit(habit("a", "Run"));

        assert!(!store.has_demo_backup());
        let snapshot = store.export_data();
        assert!(store.save_demo_backup(&snapshot));
        assert!(store.has_demo_backup());

        let taken = store.take_demo_backup().unwrap();
        assert_eq!(taken.habits, snapshot.habits);
        assert!(!store.has_demo_backup());
        assert!(store.take_demo_backup().is_none());
    }
}
