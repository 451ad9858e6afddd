use crate::grid::cell;
use crate::settings::SnowSettings;
use crate::surface::VisualHandle;
use crate::target::AccumulationTarget;
use rand::Rng;

/// Flakes reset this far (plus their size) above the field floor
const FLOOR_MARGIN: f32 = 6.0;

/// Integer-rounded uniform draw in `[min, max]`.
///
/// Matches the classic snowfall sampler: `round(min + r * (max - min))`, so
/// the end points are half as likely as interior values.
pub fn legacy_random<R: Rng + ?Sized>(rng: &mut R, min: f32, max: f32) -> f32 {
    (min + rng.gen::<f32>() * (max - min)).round()
}

/// Current field dimensions and side inset
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldBounds {
    pub width: f32,
    pub height: f32,
    pub left_offset: f32,
}

/// Per-tick inputs shared by every particle
pub struct TickContext<'a> {
    pub bounds: FieldBounds,
    /// Tilt bias snapshot, `None` when orientation drift is off
    pub drift: Option<f32>,
    pub settings: &'a SnowSettings,
}

/// How a settle was resolved
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettleKind {
    /// Landed on the band floor in the deeper cell
    Floor,
    /// Landed on the band floor, deeper cell taken
    FloorShallow,
    /// Blocked below and on both sides, stopped in place
    Stack,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Settlement {
    pub target: usize,
    pub col: i32,
    pub row: i32,
    /// Fall speed at the moment of settling
    pub speed: f32,
    pub kind: SettleKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlideDirection {
    Left,
    Right,
}

/// What happened to a particle during one update
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UpdateOutcome {
    Falling,
    /// Left the field and respawned at the top
    Respawned,
    Slid(SlideDirection),
    /// Left a permanent mark and respawned at the top
    Settled(Settlement),
}

/// A single snowflake
#[derive(Debug, Clone, PartialEq)]
pub struct Particle {
    pub x: f32,
    pub y: f32,
    pub size: f32,
    pub speed: f32,
    pub drift_phase: f32,
    pub drift_step: f32,
    /// Index of the accumulation target this flake collects on, fixed for life
    pub target: Option<usize>,
    pub visual: Option<VisualHandle>,
}

impl Particle {
    /// New flake scattered anywhere in the field
    pub fn spawn<R: Rng + ?Sized>(ctx: &TickContext, rng: &mut R, target: Option<usize>) -> Self {
        let FieldBounds {
            width,
            height,
            left_offset,
        } = ctx.bounds;
        let s = ctx.settings;
        Self {
            x: legacy_random(rng, left_offset, width - left_offset),
            y: legacy_random(rng, 0.0, height),
            size: random_size(rng, s),
            speed: legacy_random(rng, s.min_speed, s.max_speed),
            drift_phase: 0.0,
            drift_step: legacy_random(rng, 1.0, 10.0) / 100.0,
            target,
            visual: None,
        }
    }

    /// Respawn at the top with fresh size, speed and drift. Keeps the target.
    pub fn reset<R: Rng + ?Sized>(&mut self, ctx: &TickContext, rng: &mut R) {
        let bounds = ctx.bounds;
        self.y = 0.0;
        self.x = legacy_random(rng, bounds.left_offset, bounds.width - bounds.left_offset);
        self.drift_step = legacy_random(rng, 1.0, 10.0) / 100.0;
        self.size = random_size(rng, ctx.settings);
        self.speed = legacy_random(rng, ctx.settings.min_speed, ctx.settings.max_speed);
    }

    /// Advance one tick
    pub fn update<R: Rng + ?Sized>(
        &mut self,
        ctx: &TickContext,
        targets: &mut [AccumulationTarget],
        rng: &mut R,
    ) -> UpdateOutcome {
        let bounds = ctx.bounds;

        self.y += self.speed;
        if self.y > bounds.height - (self.size + FLOOR_MARGIN) {
            self.reset(ctx, rng);
            return UpdateOutcome::Respawned;
        }

        self.drift_phase += self.drift_step;
        self.x += match ctx.drift {
            Some(ratio) => ratio + self.drift_phase.cos(),
            None => self.drift_phase.cos(),
        };

        let mut outcome = UpdateOutcome::Falling;
        if let Some(index) = self.target {
            if let Some(target) = targets.get_mut(index) {
                if target.is_active() && target.contains(self.x, self.y) {
                    if let Some(resolved) = self.collide(index, target, ctx, rng) {
                        outcome = resolved;
                    }
                }
            }
        }

        // A settle already respawned the flake; the side check still applies
        if self.x + self.size > bounds.width - bounds.left_offset || self.x < bounds.left_offset {
            self.reset(ctx, rng);
            if !matches!(outcome, UpdateOutcome::Settled(_)) {
                return UpdateOutcome::Respawned;
            }
        }

        outcome
    }

    /// Resolve a flake inside its target band.
    ///
    /// Returns `None` when nothing blocks the fall.
    pub(crate) fn collide<R: Rng + ?Sized>(
        &mut self,
        index: usize,
        target: &mut AccumulationTarget,
        ctx: &TickContext,
        rng: &mut R,
    ) -> Option<UpdateOutcome> {
        let local_x = self.x - target.x;
        let local_y = self.y - target.y;
        let floor = target.height as f32;
        let col = cell(local_x);

        let landing = local_y + self.speed + self.size;
        let overflow = landing > floor;
        if !overflow && !target.grid.is_occupied(col, cell(landing)) {
            return None;
        }

        let color = ctx.settings.particle_color;
        let paint_x = local_x + self.size / 2.5;

        if overflow {
            // Slow down until the landing point fits; speed <= 0 settles as is
            while local_y + self.speed + self.size > floor && self.speed > 0.0 {
                self.speed *= 0.5;
            }

            let deep = cell(local_y + self.speed + self.size);
            let (row, kind, paint_y) = if !target.grid.is_occupied(col, deep) {
                (deep, SettleKind::Floor, local_y + self.speed + self.size * 1.25)
            } else {
                (
                    cell(local_y + self.speed),
                    SettleKind::FloorShallow,
                    local_y + self.speed + self.size * 1.75,
                )
            };
            target.grid.mark_occupied(col, row);
            target.paint(paint_x, paint_y, self.size, color);

            let settlement = Settlement {
                target: index,
                col,
                row,
                speed: self.speed,
                kind,
            };
            self.reset(ctx, rng);
            return Some(UpdateOutcome::Settled(settlement));
        }

        // Blocked below: try to slide off the pile
        self.speed = 1.0;
        self.drift_step = 0.0;
        let row = cell(local_y);

        if col + 1 < target.width && !target.grid.is_occupied(col + 1, row + 1) {
            self.x += 1.0;
            Some(UpdateOutcome::Slid(SlideDirection::Right))
        } else if col - 1 > 0 && !target.grid.is_occupied(col - 1, row + 1) {
            self.x -= 1.0;
            Some(UpdateOutcome::Slid(SlideDirection::Left))
        } else {
            target.grid.mark_occupied(col, row);
            target.paint(paint_x, local_y + self.size * 1.25, self.size, color);
            let settlement = Settlement {
                target: index,
                col,
                row,
                speed: self.speed,
                kind: SettleKind::Stack,
            };
            self.reset(ctx, rng);
            Some(UpdateOutcome::Settled(settlement))
        }
    }

    /// All numeric state is finite
    pub fn is_finite(&self) -> bool {
        [self.x, self.y, self.size, self.speed, self.drift_phase, self.drift_step]
            .iter()
            .all(|v| v.is_finite())
    }
}

fn random_size<R: Rng + ?Sized>(rng: &mut R, settings: &SnowSettings) -> f32 {
    legacy_random(rng, settings.min_size * 100.0, settings.max_size * 100.0) / 100.0
}
