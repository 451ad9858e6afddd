use crate::canvas::Canvas;
use crate::color::ParticleColor;
use crate::grid::OccupancyGrid;
use crate::surface::{Bounds, ElementId, VisualHandle};

/// Horizontal inset of a collection band from its element's edges
pub const COLLECTION_PADDING: f32 = 10.0;

/// Band above a scene element that collects settled snow
pub struct AccumulationTarget {
    /// Element the band sits on
    pub element: ElementId,
    /// Canvas visual on the display surface
    pub visual: Option<VisualHandle>,
    pub x: f32,
    pub y: f32,
    pub width: i32,
    pub height: i32,
    pub grid: OccupancyGrid,
    pub canvas: Canvas,
}

impl AccumulationTarget {
    pub fn new(element: ElementId, bounds: Bounds, band_height: i32) -> Self {
        let mut target = Self {
            element,
            visual: None,
            x: 0.0,
            y: 0.0,
            width: 0,
            height: band_height,
            grid: OccupancyGrid::new(0),
            canvas: Canvas::new(0, band_height.max(0) as u32),
        };
        target.relayout(bounds);
        target
    }

    /// Recompute the band from freshly measured element bounds.
    ///
    /// Height stays fixed. Occupancy and paint are discarded.
    pub fn relayout(&mut self, bounds: Bounds) {
        self.x = (bounds.x + COLLECTION_PADDING).round();
        self.y = (bounds.y - self.height as f32).round();
        self.width = (bounds.width - COLLECTION_PADDING * 2.0).round() as i32;

        let cols = self.width.max(0) as usize;
        self.grid = OccupancyGrid::new(cols);
        self.canvas.reset(cols as u32, self.height.max(0) as u32);
    }

    /// Zero or negative width bands collect nothing
    pub fn is_active(&self) -> bool {
        self.width > 0 && self.height > 0
    }

    /// Strictly inside the band on all four sides
    pub fn contains(&self, x: f32, y: f32) -> bool {
        x > self.x
            && x < self.x + self.width as f32
            && y > self.y
            && y < self.y + self.height as f32
    }

    /// Paint a settled flake as a flattened ellipse in band-local coordinates
    pub fn paint(&mut self, cx: f32, cy: f32, size: f32, color: ParticleColor) {
        self.canvas
            .fill_ellipse(cx, cy, size / 1.25, size / 2.75, color.to_rgba());
    }

    pub fn settled(&self) -> usize {
        self.grid.occupied_count()
    }
}
