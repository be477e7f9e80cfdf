//! JSON file persistence for custom presets

use std::{fs, io, path::PathBuf};

use crate::presets::Preset;

/// Flat-file store for the custom preset list
///
/// Writes go to a temp file first and are renamed into place, so a crash
/// mid-save never leaves a truncated list behind.
#[derive(Debug, Clone)]
pub struct PresetStore {
    path: PathBuf,
}

impl PresetStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &std::path::Path {
        &self.path
    }

    /// Load the persisted preset list
    pub fn load(&self) -> io::Result<Vec<Preset>> {
        let text = fs::read_to_string(&self.path)?;
        let presets: Vec<Preset> = serde_json::from_str(&text)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        Ok(presets)
    }

    /// Write the preset list back, atomically
    pub fn save(&self, presets: &[Preset]) -> io::Result<()> {
        let text = serde_json::to_string_pretty(presets)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let tmp_path = self.path.with_extension("json.tmp");
        fs::write(&tmp_path, text)?;
        fs::rename(&tmp_path, &self.path)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip_preserves_presets() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = PresetStore::new(dir.path().join("presets.json"));

        let presets = vec![
            Preset {
                id: 1700000000000,
                name: "Writing".into(),
                work_minutes: 45,
                break_minutes: 15,
                has_break: true,
            },
            Preset {
                id: 1700000000001,
                name: "Sprint".into(),
                work_minutes: 90,
                break_minutes: 0,
                has_break: false,
            },
        ];

        store.save(&presets).expect("save");
        assert_eq!(store.load().expect("load"), presets);
    }

    #[test]
    fn load_missing_file_is_an_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = PresetStore::new(dir.path().join("absent.json"));
        assert!(store.load().is_err());
    }

    #[test]
    fn save_creates_parent_directories() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = PresetStore::new(dir.path().join("nested/dir/presets.json"));
        store.save(&[]).expect("save");
        assert_eq!(store.load().expect("load"), Vec::<Preset>::new());
    }

    #[test]
    fn json_uses_the_original_field_names() {
        let preset = Preset {
            id: 42,
            name: "Essay".into(),
            work_minutes: 30,
            break_minutes: 10,
            has_break: true,
        };
        let json = serde_json::to_value(&preset).expect("serialize");
        assert_eq!(json["work"], 30);
        assert_eq!(json["break"], 10);
        assert_eq!(json["hasBreak"], true);
    }
}
