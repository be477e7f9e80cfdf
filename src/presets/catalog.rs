//! Built-in modes and user-defined presets

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::config::{parse_minutes, TimerConfig, DEFAULT_BREAK_MINUTES, DEFAULT_WORK_MINUTES};
use crate::presets::PresetStore;

/// Name given to presets saved with a blank name field
const FALLBACK_PRESET_NAME: &str = "Custom Timer";

/// A fixed, always-available mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuiltinMode {
    pub name: &'static str,
    pub work_minutes: u64,
    pub break_minutes: u64,
}

impl BuiltinMode {
    pub fn timer_config(&self) -> TimerConfig {
        TimerConfig::from_minutes(self.work_minutes, self.break_minutes)
    }
}

/// The modes the UI renders as fixed buttons
pub const BUILTIN_MODES: &[BuiltinMode] = &[
    BuiltinMode {
        name: "Focus",
        work_minutes: 25,
        break_minutes: 5,
    },
    BuiltinMode {
        name: "Deep Work",
        work_minutes: 50,
        break_minutes: 10,
    },
    BuiltinMode {
        name: "Quick Task",
        work_minutes: 10,
        break_minutes: 2,
    },
];

/// A user-defined preset
///
/// Created once from form input, deleted explicitly, never mutated. The
/// JSON field names match the persisted format of the original preset
/// lists (`work`, `break`, `hasBreak`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Preset {
    /// Millisecond-timestamp identifier assigned at creation
    pub id: i64,
    pub name: String,
    #[serde(rename = "work")]
    pub work_minutes: u64,
    #[serde(rename = "break")]
    pub break_minutes: u64,
    #[serde(rename = "hasBreak")]
    pub has_break: bool,
}

impl Preset {
    /// Resolve this preset to timer durations
    pub fn timer_config(&self) -> TimerConfig {
        let break_minutes = if self.has_break { self.break_minutes } else { 0 };
        TimerConfig::from_minutes(self.work_minutes, break_minutes)
    }
}

/// Built-in modes plus the persisted custom preset list
///
/// Storage failures never surface to callers: a failed load starts with an
/// empty list and a failed save is logged, matching the policy that preset
/// handling must not break the timer.
#[derive(Debug)]
pub struct PresetCatalog {
    store: Option<PresetStore>,
    customs: Vec<Preset>,
}

impl PresetCatalog {
    /// Catalog without persistence; customs live for the process only
    pub fn in_memory() -> Self {
        Self {
            store: None,
            customs: Vec::new(),
        }
    }

    /// Catalog backed by a JSON file, loaded eagerly
    pub fn with_store(store: PresetStore) -> Self {
        let customs = match store.load() {
            Ok(customs) => customs,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Err(e) => {
                warn!("failed to load custom presets: {}", e);
                Vec::new()
            }
        };
        Self {
            store: Some(store),
            customs,
        }
    }

    /// The fixed mode table
    pub fn builtin_modes(&self) -> &'static [BuiltinMode] {
        BUILTIN_MODES
    }

    /// Custom presets in creation order
    pub fn customs(&self) -> &[Preset] {
        &self.customs
    }

    /// Look up a custom preset by id
    pub fn find(&self, id: i64) -> Option<&Preset> {
        self.customs.iter().find(|p| p.id == id)
    }

    /// Create a custom preset from raw form input and persist the list
    ///
    /// Blank names become "Custom Timer"; unparseable or zero work minutes
    /// become 25 and unparseable or zero break minutes become 5, before
    /// `has_break = false` forces the break to 0.
    pub fn add_custom(
        &mut self,
        name: &str,
        work_input: &str,
        break_input: &str,
        has_break: bool,
    ) -> &Preset {
        let name = name.trim();
        let name = if name.is_empty() {
            FALLBACK_PRESET_NAME.to_string()
        } else {
            name.to_string()
        };

        let work_minutes = parse_minutes(work_input)
            .filter(|&m| m > 0)
            .unwrap_or(DEFAULT_WORK_MINUTES);
        let mut break_minutes = parse_minutes(break_input)
            .filter(|&m| m > 0)
            .unwrap_or(DEFAULT_BREAK_MINUTES);
        if !has_break {
            break_minutes = 0;
        }

        let preset = Preset {
            id: self.next_id(),
            name,
            work_minutes,
            break_minutes,
            has_break,
        };

        info!(id = preset.id, name = %preset.name, "custom preset created");
        self.customs.push(preset);
        self.persist();
        &self.customs[self.customs.len() - 1]
    }

    /// Delete a custom preset; returns whether it existed
    pub fn delete_custom(&mut self, id: i64) -> bool {
        let before = self.customs.len();
        self.customs.retain(|p| p.id != id);
        let deleted = self.customs.len() != before;
        if deleted {
            info!(id, "custom preset deleted");
            self.persist();
        }
        deleted
    }

    /// Millisecond timestamp, bumped past any existing id
    fn next_id(&self) -> i64 {
        let mut id = Utc::now().timestamp_millis();
        while self.customs.iter().any(|p| p.id == id) {
            id += 1;
        }
        id
    }

    fn persist(&self) {
        if let Some(store) = &self.store {
            if let Err(e) = store.save(&self.customs) {
                warn!("failed to save custom presets: {}", e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_modes_resolve_to_configs() {
        let catalog = PresetCatalog::in_memory();
        let focus = catalog.builtin_modes()[0];
        assert_eq!(focus.timer_config(), TimerConfig::from_minutes(25, 5));
    }

    #[test]
    fn add_custom_normalizes_form_input() {
        let mut catalog = PresetCatalog::in_memory();
        let preset = catalog.add_custom("   ", "abc", "0", true);

        assert_eq!(preset.name, "Custom Timer");
        assert_eq!(preset.work_minutes, 25);
        assert_eq!(preset.break_minutes, 5);
    }

    #[test]
    fn no_break_forces_zero_break() {
        let mut catalog = PresetCatalog::in_memory();
        let preset = catalog.add_custom("Sprint", "90", "15", false);

        assert_eq!(preset.break_minutes, 0);
        assert!(!preset.has_break);
        assert_eq!(preset.timer_config().break_seconds, 0);
    }

    #[test]
    fn ids_are_unique_even_when_created_quickly() {
        let mut catalog = PresetCatalog::in_memory();
        let a = catalog.add_custom("A", "25", "5", true).id;
        let b = catalog.add_custom("B", "25", "5", true).id;
        let c = catalog.add_custom("C", "25", "5", true).id;
        assert_ne!(a, b);
        assert_ne!(b, c);
    }

    #[test]
    fn delete_custom_removes_only_the_target() {
        let mut catalog = PresetCatalog::in_memory();
        let keep = catalog.add_custom("Keep", "25", "5", true).id;
        let drop = catalog.add_custom("Drop", "25", "5", true).id;

        assert!(catalog.delete_custom(drop));
        assert!(!catalog.delete_custom(drop));
        assert!(catalog.find(keep).is_some());
        assert!(catalog.find(drop).is_none());
    }

    #[test]
    fn catalog_persists_across_instances() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("presets.json");

        let id = {
            let mut catalog = PresetCatalog::with_store(PresetStore::new(&path));
            catalog.add_custom("Writing", "45", "15", true).id
        };

        let reloaded = PresetCatalog::with_store(PresetStore::new(&path));
        let preset = reloaded.find(id).expect("preset should persist");
        assert_eq!(preset.name, "Writing");
        assert_eq!(preset.work_minutes, 45);
    }

    #[test]
    fn missing_store_file_yields_empty_catalog() {
        let dir = tempfile::tempdir().expect("tempdir");
        let catalog = PresetCatalog::with_store(PresetStore::new(dir.path().join("none.json")));
        assert!(catalog.customs().is_empty());
    }
}
