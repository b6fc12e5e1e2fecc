pub mod entities;
pub mod kv;
#[allow(clippy::module_inception)]
pub mod store;

pub use entities::{Entry, EntryPatch, Habit, HabitPatch, Settings, Snapshot};
pub use kv::{FileBackend, KeyValueBackend, MemoryBackend};
pub use store::{HabitStore, STORAGE_VERSION};
