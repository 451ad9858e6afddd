use crate::color::ParticleColor;
use crate::error::SnowError;
use crate::settings::SnowSettings;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// A named preset containing snow settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Preset {
    pub name: String,
    pub description: String,
    pub settings: SnowSettings,
}

impl Preset {
    pub fn new(name: impl Into<String>, description: impl Into<String>, settings: SnowSettings) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            settings,
        }
    }
}

/// Manager for loading and saving presets
pub struct PresetManager {
    /// Built-in presets that ship with the app
    pub builtin: Vec<Preset>,
    /// User-created presets loaded from disk
    pub user: Vec<Preset>,
    dir: Option<PathBuf>,
}

impl Default for PresetManager {
    fn default() -> Self {
        Self::new()
    }
}

impl PresetManager {
    pub fn new() -> Self {
        Self::with_dir(Self::default_dir())
    }

    /// Manager reading user presets from `dir`; `None` keeps built-ins only
    pub fn with_dir(dir: Option<PathBuf>) -> Self {
        let mut manager = Self {
            builtin: builtin_presets(),
            user: Vec::new(),
            dir,
        };
        manager.load_user_presets();
        manager
    }

    /// `<config_dir>/snowfall-tui/presets`
    fn default_dir() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("snowfall-tui").join("presets"))
    }

    fn presets_dir(&self) -> Result<&Path, SnowError> {
        self.dir.as_deref().ok_or(SnowError::NoConfigDir)
    }

    /// Load user presets from disk, skipping unreadable files
    fn load_user_presets(&mut self) {
        let Some(dir) = self.dir.as_ref().filter(|d| d.exists()) else {
            return;
        };
        let Ok(entries) = fs::read_dir(dir) else {
            return;
        };
        for entry in entries.flatten() {
            let path = entry.path();
            if !path.extension().is_some_and(|e| e == "json") {
                continue;
            }
            let parsed = fs::read_to_string(&path)
                .map_err(|e| e.to_string())
                .and_then(|content| serde_json::from_str::<Preset>(&content).map_err(|e| e.to_string()));
            match parsed {
                Ok(preset) => self.user.push(preset),
                Err(e) => warn!("skipping preset {}: {}", path.display(), e),
            }
        }
        self.user.sort_by(|a, b| a.name.cmp(&b.name));
    }

    /// Save a preset to disk, replacing any user preset of the same name
    pub fn save_preset(&mut self, preset: Preset) -> Result<(), SnowError> {
        let dir = self.presets_dir()?.to_path_buf();
        fs::create_dir_all(&dir).map_err(|source| SnowError::Write {
            path: dir.clone(),
            source,
        })?;

        let path = dir.join(format!("{}.json", file_stem(&preset.name)));
        let json = serde_json::to_string_pretty(&preset)?;
        fs::write(&path, json).map_err(|source| SnowError::Write {
            path: path.clone(),
            source,
        })?;
        info!("saved preset '{}' to {}", preset.name, path.display());

        match self.user.iter_mut().find(|p| p.name == preset.name) {
            Some(existing) => *existing = preset,
            None => self.user.push(preset),
        }
        Ok(())
    }

    /// Delete a user preset
    pub fn delete_preset(&mut self, name: &str) -> Result<(), SnowError> {
        let dir = self.presets_dir()?.to_path_buf();
        self.user.retain(|p| p.name != name);

        let path = dir.join(format!("{}.json", file_stem(name)));
        if path.exists() {
            fs::remove_file(&path).map_err(|source| SnowError::Write { path, source })?;
        }
        Ok(())
    }

    /// Get all presets (builtin + user)
    pub fn all_presets(&self) -> impl Iterator<Item = &Preset> {
        self.builtin.iter().chain(self.user.iter())
    }

    /// Find a preset by name
    pub fn find(&self, name: &str) -> Option<&Preset> {
        self.all_presets().find(|p| p.name.eq_ignore_ascii_case(name))
    }

    /// Get preset names for display
    pub fn preset_names(&self) -> Vec<&str> {
        self.all_presets().map(|p| p.name.as_str()).collect()
    }

    /// Preset following `current`, wrapping around; the first when unknown
    pub fn next_after(&self, current: Option<&str>) -> Option<&Preset> {
        let all: Vec<&Preset> = self.all_presets().collect();
        let next = current
            .and_then(|name| all.iter().position(|p| p.name.eq_ignore_ascii_case(name)))
            .map_or(0, |i| (i + 1) % all.len());
        all.get(next).copied()
    }
}

fn file_stem(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect()
}

fn builtin_presets() -> Vec<Preset> {
    vec![
        // Classic - default settings
        Preset::new("Classic", "A light fall of small white flakes", SnowSettings::default()),
        // Flurry - more, rounder flakes
        Preset::new(
            "Flurry",
            "Busy flurry of soft round flakes",
            SnowSettings {
                particle_count: 250,
                min_size: 1.0,
                max_size: 3.0,
                min_speed: 1.0,
                max_speed: 3.0,
                rounded: true,
                ..Default::default()
            },
        ),
        // Blizzard - dense and fast
        Preset::new(
            "Blizzard",
            "Dense, fast snow",
            SnowSettings {
                particle_count: 1200,
                min_size: 1.0,
                max_size: 2.0,
                min_speed: 4.0,
                max_speed: 9.0,
                ..Default::default()
            },
        ),
        // Drifts - collection on the scene boxes
        Preset::new(
            "Drifts",
            "Snow piles up on the banner and ledges",
            SnowSettings {
                particle_count: 400,
                min_size: 1.0,
                max_size: 3.0,
                min_speed: 1.0,
                max_speed: 4.0,
                rounded: true,
                accumulation_targets: "#banner, .ledge".parse().ok(),
                accumulation_band_height: 24,
                ..Default::default()
            },
        ),
        // Storefront - big shadowed flakes collecting everywhere
        Preset::new(
            "Storefront",
            "Large shadowed flakes settling on every box",
            SnowSettings {
                particle_count: 140,
                particle_color: ParticleColor::new(0xee, 0xf4, 0xff),
                min_size: 6.0,
                max_size: 15.0,
                min_speed: 2.0,
                max_speed: 5.0,
                rounded: true,
                shadowed: true,
                accumulation_targets: "#banner, .ledge".parse().ok(),
                accumulation_band_height: 40,
                ..Default::default()
            },
        ),
        // Tilt - drift follows the arrow keys
        Preset::new(
            "Tilt",
            "Flakes drift with the tilt signal",
            SnowSettings {
                particle_count: 300,
                max_size: 3.0,
                use_device_orientation: true,
                accumulation_targets: ".ledge".parse().ok(),
                accumulation_band_height: 16,
                ..Default::default()
            },
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtins_are_sane() {
        let manager = PresetManager::with_dir(None);
        assert!(manager.builtin.len() >= 5);
        for preset in &manager.builtin {
            assert_eq!(preset.settings.clone().sanitized(), preset.settings, "{}", preset.name);
        }
        assert!(manager.find("drifts").is_some_and(|p| p.settings.collects()));
    }

    #[test]
    fn test_storefront_uses_plain_flakes() {
        let manager = PresetManager::with_dir(None);
        let s = &manager.find("storefront").unwrap().settings;
        assert_eq!(s.particle_count, 140);
        assert_eq!((s.min_size, s.max_size), (6.0, 15.0));
        assert_eq!((s.min_speed, s.max_speed), (2.0, 5.0));
        assert!(s.rounded && s.shadowed);
        assert!(s.particle_image.is_none());
    }

    #[test]
    fn test_save_load_delete() {
        let dir = tempfile::tempdir().unwrap();
        let mut manager = PresetManager::with_dir(Some(dir.path().to_path_buf()));
        assert!(manager.user.is_empty());

        let preset = Preset::new(
            "My Snow/1",
            "test",
            SnowSettings {
                particle_count: 77,
                ..Default::default()
            },
        );
        manager.save_preset(preset.clone()).unwrap();
        assert!(dir.path().join("My_Snow_1.json").exists());

        let reloaded = PresetManager::with_dir(Some(dir.path().to_path_buf()));
        assert_eq!(reloaded.user, vec![preset]);
        assert_eq!(reloaded.find("my snow/1").unwrap().settings.particle_count, 77);

        manager.delete_preset("My Snow/1").unwrap();
        assert!(manager.user.is_empty());
        assert!(!dir.path().join("My_Snow_1.json").exists());
    }

    #[test]
    fn test_save_replaces_same_name() {
        let dir = tempfile::tempdir().unwrap();
        let mut manager = PresetManager::with_dir(Some(dir.path().to_path_buf()));
        let mut preset = Preset::new("Mine", "", SnowSettings::default());
        manager.save_preset(preset.clone()).unwrap();
        preset.settings.particle_count = 9;
        manager.save_preset(preset).unwrap();
        assert_eq!(manager.user.len(), 1);
        assert_eq!(manager.user[0].settings.particle_count, 9);
    }

    #[test]
    fn test_bad_files_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("broken.json"), "{").unwrap();
        fs::write(dir.path().join("notes.txt"), "hello").unwrap();
        let manager = PresetManager::with_dir(Some(dir.path().to_path_buf()));
        assert!(manager.user.is_empty());
    }

    #[test]
    fn test_save_without_dir_fails() {
        let mut manager = PresetManager::with_dir(None);
        let result = manager.save_preset(Preset::new("x", "", SnowSettings::default()));
        assert!(matches!(result, Err(SnowError::NoConfigDir)));
    }

    #[test]
    fn test_next_after_wraps() {
        let manager = PresetManager::with_dir(None);
        let names = manager.preset_names();
        assert_eq!(manager.next_after(None).unwrap().name, names[0]);
        assert_eq!(manager.next_after(Some(names[0])).unwrap().name, names[1]);
        let last = names[names.len() - 1];
        assert_eq!(manager.next_after(Some(last)).unwrap().name, names[0]);
        assert_eq!(manager.next_after(Some("unknown")).unwrap().name, names[0]);
    }
}
