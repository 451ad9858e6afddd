use crate::drift::TiltDrift;
use crate::particle::{FieldBounds, Particle, TickContext, UpdateOutcome};
use crate::settings::SnowSettings;
use crate::surface::{DisplaySurface, Parent, StyleProps, VisualClass, VisualKind};
use crate::target::AccumulationTarget;
use image::RgbaImage;
use log::{debug, trace, warn};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Arc;

/// Side inset applied when the field spans the whole viewport
pub const VIEWPORT_INSET: f32 = 25.0;

/// Counts from one tick
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickStats {
    pub settled: usize,
    pub slid: usize,
    pub respawned: usize,
    /// Flakes whose state went non-finite and were respawned
    pub faulted: usize,
}

/// All flakes and collection bands for one surface
pub struct ParticleField {
    pub particles: Vec<Particle>,
    pub targets: Vec<AccumulationTarget>,
    pub bounds: FieldBounds,
    pub settings: SnowSettings,
    /// Settles since the last re-layout
    pub settled: usize,
    pub ticks: u64,
    drift: TiltDrift,
    rng: StdRng,
}

impl ParticleField {
    pub fn new(
        settings: SnowSettings,
        surface: &mut dyn DisplaySurface,
        drift: TiltDrift,
        sprite: Option<Arc<RgbaImage>>,
    ) -> Self {
        Self::with_rng(settings, surface, drift, sprite, StdRng::from_entropy())
    }

    /// Build the field: collection bands first, then flakes bound to them
    pub fn with_rng(
        settings: SnowSettings,
        surface: &mut dyn DisplaySurface,
        drift: TiltDrift,
        sprite: Option<Arc<RgbaImage>>,
        rng: StdRng,
    ) -> Self {
        let mut field = Self {
            particles: Vec::with_capacity(settings.particle_count),
            targets: Vec::new(),
            bounds: measure_bounds(surface),
            settings,
            settled: 0,
            ticks: 0,
            drift,
            rng,
        };

        if field.settings.collects() {
            if surface.supports_canvas() {
                field.build_targets(surface);
            } else {
                warn!("surface has no 2D canvas support, snow will not collect");
            }
        }
        field.spawn_particles(surface, sprite);

        debug!(
            "field {}x{} with {} flakes, {} collection bands",
            field.bounds.width,
            field.bounds.height,
            field.particles.len(),
            field.targets.len()
        );
        field
    }

    fn build_targets(&mut self, surface: &mut dyn DisplaySurface) {
        let Some(selector) = self.settings.accumulation_targets.clone() else {
            return;
        };
        let band = self.settings.accumulation_band_height;

        for element in surface.query(&selector) {
            let Some(bounds) = surface.measure(element) else {
                continue;
            };
            let mut target = AccumulationTarget::new(element, bounds, band);
            let visual = surface.create_visual(VisualKind::Canvas);
            surface.set_style(visual, &canvas_style(&target));
            // Bands are positioned in viewport coordinates
            surface.attach(visual, Parent::Viewport);
            target.visual = Some(visual);
            self.targets.push(target);
        }

        if self.targets.is_empty() {
            warn!("selector '{}' matched no scene elements", selector);
        }
    }

    fn spawn_particles(&mut self, surface: &mut dyn DisplaySurface, sprite: Option<Arc<RgbaImage>>) {
        let ctx = TickContext {
            bounds: self.bounds,
            drift: None,
            settings: &self.settings,
        };
        let parent = if surface.is_viewport() {
            Parent::Viewport
        } else {
            Parent::Field
        };

        for _ in 0..self.settings.particle_count {
            let target = if self.targets.is_empty() {
                None
            } else {
                Some(self.rng.gen_range(0..self.targets.len()))
            };
            let mut particle = Particle::spawn(&ctx, &mut self.rng, target);

            let kind = match &sprite {
                Some(image) => VisualKind::Image(Arc::clone(image)),
                None => VisualKind::Flake,
            };
            let visual = surface.create_visual(kind);
            surface.set_style(
                visual,
                &StyleProps {
                    color: Some(self.settings.particle_color),
                    rounded: Some(self.settings.rounded),
                    shadowed: Some(self.settings.shadowed),
                    ..flake_style(&particle)
                },
            );
            surface.attach(visual, parent);
            particle.visual = Some(visual);
            self.particles.push(particle);
        }
    }

    /// Advance every flake once, in field order
    pub fn tick(&mut self, surface: &mut dyn DisplaySurface) -> TickStats {
        let ctx = TickContext {
            bounds: self.bounds,
            drift: self.drift.snapshot(),
            settings: &self.settings,
        };
        let mut stats = TickStats::default();

        for (i, particle) in self.particles.iter_mut().enumerate() {
            match particle.update(&ctx, &mut self.targets, &mut self.rng) {
                UpdateOutcome::Falling => {}
                UpdateOutcome::Respawned => stats.respawned += 1,
                UpdateOutcome::Slid(direction) => {
                    trace!("flake {} slid {:?}", i, direction);
                    stats.slid += 1;
                }
                UpdateOutcome::Settled(s) => {
                    trace!(
                        "flake {} settled on band {} at ({}, {}) as {:?}, speed {}",
                        i,
                        s.target,
                        s.col,
                        s.row,
                        s.kind,
                        s.speed
                    );
                    stats.settled += 1;
                }
            }

            if !particle.is_finite() {
                warn!("flake {} went non-finite ({:?}), respawning", i, particle);
                particle.drift_phase = 0.0;
                particle.reset(&ctx, &mut self.rng);
                stats.faulted += 1;
            }

            if let Some(visual) = particle.visual {
                surface.set_style(visual, &flake_style(particle));
            }
        }

        if stats.faulted > 0 {
            debug!("tick {}: {} faulted flakes respawned", self.ticks, stats.faulted);
        }
        self.settled += stats.settled;
        self.ticks += 1;
        stats
    }

    /// Pick up new field dimensions. Flakes are left where they are and
    /// correct themselves on their next update.
    pub fn resize(&mut self, surface: &dyn DisplaySurface) {
        self.bounds = measure_bounds(surface);
    }

    /// Re-measure every band's element and start each band empty
    pub fn relayout_targets(&mut self, surface: &mut dyn DisplaySurface) {
        for target in &mut self.targets {
            let bounds = surface.measure(target.element).unwrap_or_default();
            target.relayout(bounds);
            if let Some(visual) = target.visual {
                surface.set_style(visual, &canvas_style(target));
            }
        }
        self.settled = 0;
        debug!("re-laid out {} collection bands", self.targets.len());
    }

    /// Remove every visual this field created
    pub fn clear(&mut self, surface: &mut dyn DisplaySurface) {
        let flakes = surface.remove_all(VisualClass::Flakes);
        let canvases = surface.remove_all(VisualClass::Canvas);
        self.particles.clear();
        self.targets.clear();
        debug!(
            "removed {} {} and {} {}",
            flakes,
            VisualClass::Flakes.name(),
            canvases,
            VisualClass::Canvas.name()
        );
    }

    /// Occupied cells across all bands
    pub fn marks(&self) -> usize {
        self.targets.iter().map(AccumulationTarget::settled).sum()
    }
}

fn measure_bounds(surface: &dyn DisplaySurface) -> FieldBounds {
    let (width, height) = surface.field_size();
    FieldBounds {
        width,
        height,
        left_offset: if surface.is_viewport() { VIEWPORT_INSET } else { 0.0 },
    }
}

fn flake_style(particle: &Particle) -> StyleProps {
    StyleProps::at(particle.x, particle.y).with_size(particle.size, particle.size)
}

fn canvas_style(target: &AccumulationTarget) -> StyleProps {
    StyleProps::at(target.x, target.y)
        .with_size(target.width.max(0) as f32, target.height as f32)
}
