//! Drives a [`ParticleField`] over time.
//!
//! Ticks, resize handling and tilt updates all run on the caller's thread, so
//! a re-layout can never interleave with a tick.

use crate::debounce::Debouncer;
use crate::drift::TiltDrift;
use crate::error::SnowError;
use crate::scheduler::{FrameScheduler, Scheduler, TickToken, TICK_DELAY};
use crate::settings::SnowSettings;
use crate::simulation::{ParticleField, TickStats};
use crate::surface::{DisplaySurface, VisualClass};
use image::RgbaImage;
use log::{debug, warn};
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Quiet period before collection bands follow a resize
pub const RESIZE_DEBOUNCE: Duration = Duration::from_millis(250);

/// Load a flake sprite
pub fn load_sprite(path: &Path) -> Result<RgbaImage, SnowError> {
    let image = image::open(path).map_err(|source| SnowError::Image {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(image.to_rgba8())
}

/// Start/stop lifecycle and tick scheduling for one surface
pub struct Snowfall<S: Scheduler = FrameScheduler> {
    field: Option<ParticleField>,
    scheduler: S,
    tick_token: Option<TickToken>,
    tick_delay: Duration,
    paused: bool,
    resize: Debouncer,
    drift: TiltDrift,
}

impl Snowfall<FrameScheduler> {
    pub fn new() -> Self {
        Self::with_scheduler(FrameScheduler::new(), TICK_DELAY)
    }
}

impl Default for Snowfall<FrameScheduler> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: Scheduler> Snowfall<S> {
    pub fn with_scheduler(scheduler: S, tick_delay: Duration) -> Self {
        Self {
            field: None,
            scheduler,
            tick_token: None,
            tick_delay,
            paused: false,
            resize: Debouncer::new(RESIZE_DEBOUNCE),
            drift: TiltDrift::new(),
        }
    }

    /// Begin snowing on a surface. A running effect is stopped first.
    pub fn start(&mut self, surface: &mut dyn DisplaySurface, settings: &SnowSettings, now: Instant) {
        if self.is_running() {
            self.stop(surface);
        }

        let settings = settings.clone().sanitized();
        if settings.use_device_orientation {
            self.drift.enable();
        } else {
            self.drift.disable();
        }

        let sprite = settings.particle_image.as_deref().and_then(|path| {
            load_sprite(path)
                .map(Arc::new)
                .map_err(|e| warn!("{}; falling back to plain flakes", e))
                .ok()
        });

        self.field = Some(ParticleField::new(settings, surface, self.drift.clone(), sprite));
        self.paused = false;
        // First tick on the next frame
        self.arm(now, Duration::ZERO);
        debug!("snowfall started");
    }

    /// Halt ticking and remove every visual. Safe to call when stopped.
    pub fn stop(&mut self, surface: &mut dyn DisplaySurface) {
        if let Some(token) = self.tick_token.take() {
            self.scheduler.cancel(token);
        }
        self.resize.cancel();
        match self.field.take() {
            Some(mut field) => {
                field.clear(surface);
                debug!("snowfall stopped after {} ticks", field.ticks);
            }
            None => {
                surface.remove_all(VisualClass::Flakes);
                surface.remove_all(VisualClass::Canvas);
            }
        }
        self.paused = false;
    }

    /// Run whatever is due: a pending re-layout, then the tick
    pub fn pump(&mut self, surface: &mut dyn DisplaySurface, now: Instant) -> Option<TickStats> {
        if self.resize.poll(now) {
            if let Some(field) = self.field.as_mut() {
                field.relayout_targets(surface);
            }
        }

        let mut stats = None;
        for token in self.scheduler.take_due(now) {
            if self.tick_token != Some(token) {
                continue;
            }
            self.tick_token = None;
            if let Some(field) = self.field.as_mut() {
                stats = Some(field.tick(surface));
                self.arm(now, self.tick_delay);
            }
        }
        stats
    }

    /// The surface changed size. Field bounds follow at once, collection
    /// bands after the debounce period.
    pub fn on_resize(&mut self, surface: &dyn DisplaySurface, now: Instant) {
        if let Some(field) = self.field.as_mut() {
            field.resize(surface);
            self.resize.signal(now);
        }
    }

    /// Tilt reading from the orientation source
    pub fn on_orientation(&self, gamma: f32) {
        self.drift.set_gamma(gamma);
    }

    pub fn set_paused(&mut self, paused: bool, now: Instant) {
        if paused == self.paused || !self.is_running() {
            return;
        }
        self.paused = paused;
        if paused {
            if let Some(token) = self.tick_token.take() {
                self.scheduler.cancel(token);
            }
        } else {
            self.arm(now, Duration::ZERO);
        }
    }

    fn arm(&mut self, now: Instant, delay: Duration) {
        if !self.paused {
            self.tick_token = Some(self.scheduler.schedule_tick(now, delay));
        }
    }

    pub fn is_running(&self) -> bool {
        self.field.is_some()
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn field(&self) -> Option<&ParticleField> {
        self.field.as_ref()
    }

    pub fn drift(&self) -> &TiltDrift {
        &self.drift
    }

    pub fn scheduler(&self) -> &S {
        &self.scheduler
    }

    #[cfg(test)]
    pub fn pending_ticks(&self) -> usize {
        self.scheduler.pending()
    }
}
