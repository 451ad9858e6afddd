//! Display surface the snow is drawn on.
//!
//! The simulation never touches the terminal directly. It asks a
//! [`DisplaySurface`] to create visuals, position them and measure the scene
//! boxes that collect snow, and keeps only the returned handles.

use crate::color::ParticleColor;
use crate::selector::Selector;
use image::RgbaImage;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Measured geometry in surface coordinates (Braille dots)
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Bounds {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

/// Opaque handle for a visual created by the surface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VisualHandle(u64);

/// Index of a scene element on the surface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ElementId(pub usize);

/// What a visual draws
#[derive(Debug, Clone)]
pub enum VisualKind {
    /// Solid-colour flake
    Flake,
    /// Flake drawn from a sprite image
    Image(Arc<RgbaImage>),
    /// Accumulation canvas placeholder
    Canvas,
}

impl VisualKind {
    pub fn class(&self) -> VisualClass {
        match self {
            VisualKind::Flake | VisualKind::Image(_) => VisualClass::Flakes,
            VisualKind::Canvas => VisualClass::Canvas,
        }
    }
}

/// Group used for bulk removal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VisualClass {
    Flakes,
    Canvas,
}

impl VisualClass {
    pub fn name(&self) -> &str {
        match self {
            VisualClass::Flakes => "snowfall-flakes",
            VisualClass::Canvas => "snowfall-canvas",
        }
    }
}

/// Where a visual is attached
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Parent {
    /// Top level of the whole display
    Viewport,
    /// The snow field container
    Field,
}

/// Partial style update; `None` leaves a property untouched
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct StyleProps {
    pub position: Option<(f32, f32)>,
    pub size: Option<(f32, f32)>,
    pub color: Option<ParticleColor>,
    pub rounded: Option<bool>,
    pub shadowed: Option<bool>,
}

impl StyleProps {
    pub fn at(x: f32, y: f32) -> Self {
        Self {
            position: Some((x, y)),
            ..Default::default()
        }
    }

    pub fn with_size(mut self, width: f32, height: f32) -> Self {
        self.size = Some((width, height));
        self
    }
}

/// Resolved style of a visual
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VisualStyle {
    pub left: f32,
    pub top: f32,
    pub width: f32,
    pub height: f32,
    pub color: ParticleColor,
    pub rounded: bool,
    pub shadowed: bool,
}

impl Default for VisualStyle {
    fn default() -> Self {
        Self {
            left: 0.0,
            top: 0.0,
            width: 0.0,
            height: 0.0,
            color: ParticleColor::WHITE,
            rounded: false,
            shadowed: false,
        }
    }
}

impl VisualStyle {
    fn apply(&mut self, props: &StyleProps) {
        if let Some((x, y)) = props.position {
            self.left = x;
            self.top = y;
        }
        if let Some((w, h)) = props.size {
            self.width = w;
            self.height = h;
        }
        if let Some(color) = props.color {
            self.color = color;
        }
        if let Some(rounded) = props.rounded {
            self.rounded = rounded;
        }
        if let Some(shadowed) = props.shadowed {
            self.shadowed = shadowed;
        }
    }
}

#[derive(Debug, Clone)]
pub struct Visual {
    pub kind: VisualKind,
    pub parent: Option<Parent>,
    pub style: VisualStyle,
}

/// Everything the simulation needs from whatever displays it
pub trait DisplaySurface {
    /// Size of the snow field
    fn field_size(&self) -> (f32, f32);
    /// True when the field spans the whole viewport
    fn is_viewport(&self) -> bool;
    /// Can this surface provide 2D drawing canvases?
    fn supports_canvas(&self) -> bool;
    /// Elements matched by a selector, in scene order
    fn query(&self, selector: &Selector) -> Vec<ElementId>;
    fn measure(&self, element: ElementId) -> Option<Bounds>;
    fn create_visual(&mut self, kind: VisualKind) -> VisualHandle;
    fn attach(&mut self, handle: VisualHandle, parent: Parent);
    fn set_style(&mut self, handle: VisualHandle, props: &StyleProps);
    /// Remove every visual of a class; returns how many were removed
    fn remove_all(&mut self, class: VisualClass) -> usize;
}

/// A named box laid out on the terminal canvas.
///
/// Position and width are fractions of the canvas, height is in rows, so the
/// box moves and stretches when the terminal is resized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneElement {
    pub id: String,
    #[serde(default)]
    pub classes: Vec<String>,
    #[serde(default)]
    pub label: String,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: u16,
}

/// Cell rectangle (column, row, width, height) of a scene element
pub type CellRect = (u16, u16, u16, u16);

impl SceneElement {
    pub fn new(id: &str, label: &str, x: f32, y: f32, width: f32, height: u16) -> Self {
        Self {
            id: id.to_string(),
            classes: Vec::new(),
            label: label.to_string(),
            x,
            y,
            width,
            height,
        }
    }

    pub fn with_class(mut self, class: &str) -> Self {
        self.classes.push(class.to_string());
        self
    }

    /// Lay the element out on a canvas of `cols` x `rows` cells
    pub fn cell_rect(&self, cols: u16, rows: u16) -> CellRect {
        let col = ((self.x.clamp(0.0, 1.0) * cols as f32).round() as u16).min(cols);
        let row = ((self.y.clamp(0.0, 1.0) * rows as f32).round() as u16).min(rows);
        let width = ((self.width.clamp(0.0, 1.0) * cols as f32).round() as u16).min(cols - col);
        let height = self.height.min(rows - row);
        (col, row, width, height)
    }
}

/// Horizontal and vertical dots per terminal cell
pub const DOTS_PER_CELL: (f32, f32) = (2.0, 4.0);

/// In-memory surface backing the terminal canvas.
///
/// Coordinates are Braille dots, so one cell is 2 x 4 units. Visuals are kept
/// as records and rasterised by the renderer each frame.
pub struct TerminalSurface {
    cols: u16,
    rows: u16,
    viewport: bool,
    canvas_support: bool,
    scene: Vec<SceneElement>,
    visuals: BTreeMap<VisualHandle, Visual>,
    next_handle: u64,
}

impl TerminalSurface {
    pub fn new(cols: u16, rows: u16, scene: Vec<SceneElement>) -> Self {
        Self {
            cols,
            rows,
            viewport: false,
            canvas_support: true,
            scene,
            visuals: BTreeMap::new(),
            next_handle: 0,
        }
    }

    /// Treat the canvas as the whole viewport (flakes keep off the side edges)
    pub fn with_viewport(mut self, viewport: bool) -> Self {
        self.viewport = viewport;
        self
    }

    pub fn with_canvas_support(mut self, supported: bool) -> Self {
        self.canvas_support = supported;
        self
    }

    pub fn resize(&mut self, cols: u16, rows: u16) {
        self.cols = cols;
        self.rows = rows;
    }

    pub fn cell_size(&self) -> (u16, u16) {
        (self.cols, self.rows)
    }

    pub fn scene(&self) -> &[SceneElement] {
        &self.scene
    }

    /// Attached visuals in creation order
    pub fn attached(&self) -> impl Iterator<Item = &Visual> {
        self.visuals.values().filter(|v| v.parent.is_some())
    }

    #[cfg(test)]
    pub fn visual(&self, handle: VisualHandle) -> Option<&Visual> {
        self.visuals.get(&handle)
    }

    #[cfg(test)]
    pub fn visual_count(&self) -> usize {
        self.visuals.len()
    }
}

impl DisplaySurface for TerminalSurface {
    fn field_size(&self) -> (f32, f32) {
        (
            self.cols as f32 * DOTS_PER_CELL.0,
            self.rows as f32 * DOTS_PER_CELL.1,
        )
    }

    fn is_viewport(&self) -> bool {
        self.viewport
    }

    fn supports_canvas(&self) -> bool {
        self.canvas_support
    }

    fn query(&self, selector: &Selector) -> Vec<ElementId> {
        self.scene
            .iter()
            .enumerate()
            .filter(|(_, el)| selector.matches(&el.id, &el.classes))
            .map(|(i, _)| ElementId(i))
            .collect()
    }

    fn measure(&self, element: ElementId) -> Option<Bounds> {
        let el = self.scene.get(element.0)?;
        let (col, row, width, height) = el.cell_rect(self.cols, self.rows);
        Some(Bounds {
            x: col as f32 * DOTS_PER_CELL.0,
            y: row as f32 * DOTS_PER_CELL.1,
            width: width as f32 * DOTS_PER_CELL.0,
            height: height as f32 * DOTS_PER_CELL.1,
        })
    }

    fn create_visual(&mut self, kind: VisualKind) -> VisualHandle {
        let handle = VisualHandle(self.next_handle);
        self.next_handle += 1;
        self.visuals.insert(
            handle,
            Visual {
                kind,
                parent: None,
                style: VisualStyle::default(),
            },
        );
        handle
    }

    fn attach(&mut self, handle: VisualHandle, parent: Parent) {
        if let Some(visual) = self.visuals.get_mut(&handle) {
            visual.parent = Some(parent);
        }
    }

    fn set_style(&mut self, handle: VisualHandle, props: &StyleProps) {
        if let Some(visual) = self.visuals.get_mut(&handle) {
            visual.style.apply(props);
        }
    }

    fn remove_all(&mut self, class: VisualClass) -> usize {
        let before = self.visuals.len();
        self.visuals.retain(|_, v| v.kind.class() != class);
        before - self.visuals.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scene() -> Vec<SceneElement> {
        vec![
            SceneElement::new("banner", "Banner", 0.25, 0.5, 0.5, 3),
            SceneElement::new("left", "", 0.0, 0.9, 0.2, 2).with_class("ledge"),
            SceneElement::new("right", "", 0.8, 0.9, 0.2, 2).with_class("ledge"),
        ]
    }

    #[test]
    fn test_field_size_is_in_dots() {
        let surface = TerminalSurface::new(40, 10, Vec::new());
        assert_eq!(surface.field_size(), (80.0, 40.0));
    }

    #[test]
    fn test_measure_scales_cells_to_dots() {
        let surface = TerminalSurface::new(40, 20, scene());
        let b = surface.measure(ElementId(0)).unwrap();
        assert_eq!(b, Bounds { x: 20.0, y: 40.0, width: 40.0, height: 12.0 });
        assert!(surface.measure(ElementId(9)).is_none());
    }

    #[test]
    fn test_measure_follows_resize() {
        let mut surface = TerminalSurface::new(40, 20, scene());
        let before = surface.measure(ElementId(0)).unwrap();
        surface.resize(80, 20);
        let after = surface.measure(ElementId(0)).unwrap();
        assert_eq!(after.width, before.width * 2.0);
        assert_eq!(after.x, before.x * 2.0);
    }

    #[test]
    fn test_cell_rect_clamps_to_canvas() {
        let el = SceneElement::new("x", "", 0.9, 0.95, 0.5, 10);
        let (col, row, w, h) = el.cell_rect(10, 20);
        assert_eq!((col, row), (9, 19));
        assert_eq!(w, 1);
        assert_eq!(h, 1);
    }

    #[test]
    fn test_query_by_id_and_class() {
        let surface = TerminalSurface::new(40, 20, scene());
        let ids = surface.query(&".ledge".parse().unwrap());
        assert_eq!(ids, vec![ElementId(1), ElementId(2)]);
        let ids = surface.query(&"#banner, .ledge".parse().unwrap());
        assert_eq!(ids.len(), 3);
        assert!(surface.query(&"#nope".parse().unwrap()).is_empty());
    }

    #[test]
    fn test_visual_lifecycle() {
        let mut surface = TerminalSurface::new(40, 20, Vec::new());
        let flake = surface.create_visual(VisualKind::Flake);
        let canvas = surface.create_visual(VisualKind::Canvas);
        assert_eq!(surface.attached().count(), 0);

        surface.attach(flake, Parent::Field);
        surface.attach(canvas, Parent::Field);
        surface.set_style(flake, &StyleProps::at(3.0, 4.0).with_size(2.0, 2.0));
        let style = surface.visual(flake).unwrap().style;
        assert_eq!((style.left, style.top, style.width), (3.0, 4.0, 2.0));

        // Partial update keeps the size
        surface.set_style(flake, &StyleProps::at(5.0, 6.0));
        assert_eq!(surface.visual(flake).unwrap().style.width, 2.0);

        assert_eq!(surface.remove_all(VisualClass::Flakes), 1);
        assert_eq!(surface.remove_all(VisualClass::Flakes), 0);
        assert_eq!(surface.remove_all(VisualClass::Canvas), 1);
        assert_eq!(surface.visual_count(), 0);
    }

    #[test]
    fn test_class_names() {
        assert_eq!(VisualKind::Flake.class().name(), "snowfall-flakes");
        assert_eq!(VisualKind::Canvas.class().name(), "snowfall-canvas");
    }
}
