use crate::color::ParticleColor;
use crate::selector::Selector;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub const MAX_PARTICLES: usize = 2000;

/// Everything the snow effect is configured with, read once at start
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SnowSettings {
    // === Flakes ===
    /// Number of flakes in the field (0-2000)
    pub particle_count: usize,
    pub particle_color: ParticleColor,
    /// Smallest flake size in dots
    pub min_size: f32,
    /// Largest flake size in dots
    pub max_size: f32,
    /// Slowest fall speed in dots per tick
    pub min_speed: f32,
    /// Fastest fall speed in dots per tick
    pub max_speed: f32,
    /// Draw flakes as discs rather than squares
    pub rounded: bool,
    /// Give flakes a drop shadow
    pub shadowed: bool,
    /// Sprite image drawn for each flake
    pub particle_image: Option<PathBuf>,

    // === Accumulation ===
    /// Scene boxes that collect snow; `None` disables collection
    pub accumulation_targets: Option<Selector>,
    /// Height of the collecting band above each box, in dots
    pub accumulation_band_height: i32,

    // === Tilt ===
    /// Let the tilt signal bias horizontal drift
    pub use_device_orientation: bool,
}

impl Default for SnowSettings {
    fn default() -> Self {
        Self {
            particle_count: 35,
            particle_color: ParticleColor::WHITE,
            min_size: 1.0,
            max_size: 2.0,
            min_speed: 1.0,
            max_speed: 5.0,
            rounded: false,
            shadowed: false,
            particle_image: None,
            accumulation_targets: None,
            accumulation_band_height: 40,
            use_device_orientation: false,
        }
    }
}

impl SnowSettings {
    /// Clamp every value into range and order the min/max pairs
    pub fn sanitized(mut self) -> Self {
        self.particle_count = self.particle_count.min(MAX_PARTICLES);
        self.min_size = self.min_size.clamp(0.1, 20.0);
        self.max_size = self.max_size.clamp(0.1, 20.0);
        if self.min_size > self.max_size {
            std::mem::swap(&mut self.min_size, &mut self.max_size);
        }
        self.min_speed = self.min_speed.clamp(0.0, 30.0);
        self.max_speed = self.max_speed.clamp(0.0, 30.0);
        if self.min_speed > self.max_speed {
            std::mem::swap(&mut self.min_speed, &mut self.max_speed);
        }
        self.accumulation_band_height = self.accumulation_band_height.clamp(1, 200);
        self
    }

    /// Collection is on and names at least one term
    pub fn collects(&self) -> bool {
        self.accumulation_targets
            .as_ref()
            .is_some_and(|sel| !sel.is_empty())
    }

    /// Adjust flake count within bounds
    pub fn adjust_particle_count(&mut self, delta: i32) {
        let new_val = (self.particle_count as i64 + delta as i64).clamp(0, MAX_PARTICLES as i64);
        self.particle_count = new_val as usize;
    }

    /// Adjust the fastest fall speed, never below the slowest
    pub fn adjust_max_speed(&mut self, delta: f32) {
        self.max_speed = (self.max_speed + delta).clamp(self.min_speed, 30.0);
    }

    /// Adjust the largest flake size, never below the smallest
    pub fn adjust_max_size(&mut self, delta: f32) {
        self.max_size = (self.max_size + delta).clamp(self.min_size, 20.0);
    }

    /// Adjust the collecting band height within bounds
    pub fn adjust_band_height(&mut self, delta: i32) {
        self.accumulation_band_height = (self.accumulation_band_height + delta).clamp(1, 200);
    }

    pub fn toggle_rounded(&mut self) {
        self.rounded = !self.rounded;
    }

    pub fn toggle_shadowed(&mut self) {
        self.shadowed = !self.shadowed;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_classic_plugin() {
        let s = SnowSettings::default();
        assert_eq!(s.particle_count, 35);
        assert_eq!(s.particle_color, ParticleColor::WHITE);
        assert_eq!((s.min_size, s.max_size), (1.0, 2.0));
        assert_eq!((s.min_speed, s.max_speed), (1.0, 5.0));
        assert_eq!(s.accumulation_band_height, 40);
        assert!(!s.collects());
        assert!(!s.use_device_orientation);
    }

    #[test]
    fn test_sanitized_orders_and_clamps() {
        let s = SnowSettings {
            particle_count: 99_999,
            min_size: 0.0,
            max_size: -3.0,
            min_speed: 8.0,
            max_speed: 2.0,
            accumulation_band_height: 0,
            ..Default::default()
        }
        .sanitized();
        assert_eq!(s.particle_count, MAX_PARTICLES);
        assert!(s.min_size > 0.0 && s.min_size <= s.max_size);
        assert_eq!((s.min_speed, s.max_speed), (2.0, 8.0));
        assert_eq!(s.accumulation_band_height, 1);
    }

    #[test]
    fn test_collects_needs_terms() {
        let mut s = SnowSettings {
            accumulation_targets: Some("".parse().unwrap()),
            ..Default::default()
        };
        assert!(!s.collects());
        s.accumulation_targets = Some("#banner".parse().unwrap());
        assert!(s.collects());
    }

    #[test]
    fn test_adjusters_respect_bounds() {
        let mut s = SnowSettings::default();
        s.adjust_particle_count(-100);
        assert_eq!(s.particle_count, 0);
        s.adjust_particle_count(5000);
        assert_eq!(s.particle_count, MAX_PARTICLES);

        s.adjust_max_speed(-10.0);
        assert_eq!(s.max_speed, s.min_speed);
        s.adjust_max_size(100.0);
        assert_eq!(s.max_size, 20.0);
        s.adjust_band_height(-500);
        assert_eq!(s.accumulation_band_height, 1);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let s: SnowSettings =
            serde_json::from_str(r##"{"particle_count": 140, "accumulation_targets": "#banner, .ledge"}"##)
                .unwrap();
        assert_eq!(s.particle_count, 140);
        assert_eq!(s.max_speed, 5.0);
        assert_eq!(s.accumulation_targets.unwrap().terms().len(), 2);
    }
}
