use crate::color::ParticleColor;
use crate::simulation::ParticleField;
use crate::surface::{TerminalSurface, VisualKind, VisualStyle};
use crate::target::AccumulationTarget;
use image::RgbaImage;
use ratatui::style::Color;

/// Braille character rendering for high-resolution terminal graphics.
/// Each Braille character represents a 2x4 grid of dots (8 dots total).
///
/// Dot positions and their bit values:
/// ```text
/// (0,0)=0x01  (1,0)=0x08
/// (0,1)=0x02  (1,1)=0x10
/// (0,2)=0x04  (1,2)=0x20
/// (0,3)=0x40  (1,3)=0x80
/// ```
///
/// Unicode Braille patterns: U+2800 to U+28FF (256 patterns)
const BRAILLE_BASE: u32 = 0x2800;

/// Dot position to bit mapping for Braille characters
const BRAILLE_DOTS: [[u8; 4]; 2] = [
    [0x01, 0x02, 0x04, 0x40], // Left column (x=0): rows 0,1,2,3
    [0x08, 0x10, 0x20, 0x80], // Right column (x=1): rows 0,1,2,3
];

/// Sprite pixels at or above this alpha become dots
const SPRITE_ALPHA_CUTOFF: u8 = 128;

/// A single rendered Braille cell with position and color
#[derive(Debug, Clone, Copy)]
pub struct BrailleCell {
    pub x: u16,
    pub y: u16,
    pub char: char,
    pub color: Color,
}

/// One colour per Braille dot; later plots win
struct DotBuffer {
    width: i32,
    height: i32,
    dots: Vec<Option<ParticleColor>>,
}

impl DotBuffer {
    fn new(cols: u16, rows: u16) -> Self {
        let width = cols as i32 * 2;
        let height = rows as i32 * 4;
        Self {
            width,
            height,
            dots: vec![None; (width * height) as usize],
        }
    }

    fn plot(&mut self, x: i32, y: i32, color: ParticleColor) {
        if x >= 0 && y >= 0 && x < self.width && y < self.height {
            self.dots[(y * self.width + x) as usize] = Some(color);
        }
    }

    fn get(&self, x: i32, y: i32) -> Option<ParticleColor> {
        self.dots[(y * self.width + x) as usize]
    }

    /// Dot span covering `[start, start + len)`, at least one dot, clipped
    fn span(start: f32, len: f32, limit: i32) -> (i32, i32) {
        let lo = start.floor() as i32;
        let hi = ((start + len).ceil() as i32).max(lo + 1);
        (lo.max(0), hi.min(limit))
    }

    fn draw_flake(&mut self, style: &VisualStyle, sprite: Option<&RgbaImage>) {
        if style.shadowed {
            let shadow = VisualStyle {
                left: style.left + 1.0,
                top: style.top + 1.0,
                color: ParticleColor::SHADOW,
                shadowed: false,
                ..*style
            };
            self.draw_shape(&shadow, None);
        }
        self.draw_shape(style, sprite);
    }

    fn draw_shape(&mut self, style: &VisualStyle, sprite: Option<&RgbaImage>) {
        let (x0, x1) = Self::span(style.left, style.width, self.width);
        let (y0, y1) = Self::span(style.top, style.height, self.height);
        let cx = style.left + style.width / 2.0;
        let cy = style.top + style.height / 2.0;
        let r2 = (style.width / 2.0).powi(2);
        let mut drawn = false;

        for y in y0..y1 {
            for x in x0..x1 {
                let (px, py) = (x as f32 + 0.5, y as f32 + 0.5);
                let color = match sprite {
                    Some(image) => sample_sprite(image, style, px, py),
                    None if style.rounded => {
                        ((px - cx).powi(2) + (py - cy).powi(2) <= r2).then_some(style.color)
                    }
                    None => Some(style.color),
                };
                if let Some(color) = color {
                    self.plot(x, y, color);
                    drawn = true;
                }
            }
        }

        // Tiny discs still show as one dot
        if !drawn && sprite.is_none() {
            self.plot(cx.floor() as i32, cy.floor() as i32, style.color);
        }
    }

    fn draw_target(&mut self, target: &AccumulationTarget) {
        let canvas = &target.canvas;
        for py in 0..canvas.height() {
            for px in 0..canvas.width() {
                if let Some(pixel) = canvas.painted(px, py) {
                    self.plot(
                        target.x.round() as i32 + px as i32,
                        target.y.round() as i32 + py as i32,
                        ParticleColor::from_rgba(pixel),
                    );
                }
            }
        }
    }
}

/// Sprite scaled onto the flake box, alpha-masked and tinted by the flake colour
fn sample_sprite(image: &RgbaImage, style: &VisualStyle, px: f32, py: f32) -> Option<ParticleColor> {
    if image.width() == 0 || image.height() == 0 || style.width <= 0.0 || style.height <= 0.0 {
        return None;
    }
    let u = ((px - style.left) / style.width * image.width() as f32) as u32;
    let v = ((py - style.top) / style.height * image.height() as f32) as u32;
    let pixel = image.get_pixel(u.min(image.width() - 1), v.min(image.height() - 1));
    if pixel[3] < SPRITE_ALPHA_CUTOFF {
        return None;
    }
    let tint = |c: u8, t: u8| ((c as u16 * t as u16) / 255) as u8;
    Some(ParticleColor::new(
        tint(pixel[0], style.color.r),
        tint(pixel[1], style.color.g),
        tint(pixel[2], style.color.b),
    ))
}

/// Rasterise settled snow and every attached flake into Braille cells.
/// Cell coordinates are relative to the canvas origin.
pub fn render_to_braille(
    surface: &TerminalSurface,
    field: Option<&ParticleField>,
    canvas_width: u16,
    canvas_height: u16,
) -> Vec<BrailleCell> {
    let mut buffer = DotBuffer::new(canvas_width, canvas_height);

    // Settled snow sits under the falling flakes
    if let Some(field) = field {
        for target in &field.targets {
            buffer.draw_target(target);
        }
    }
    for visual in surface.attached() {
        match &visual.kind {
            VisualKind::Flake => buffer.draw_flake(&visual.style, None),
            VisualKind::Image(sprite) => buffer.draw_flake(&visual.style, Some(sprite.as_ref())),
            VisualKind::Canvas => {}
        }
    }

    let mut cells = Vec::new();
    for cy in 0..canvas_height {
        for cx in 0..canvas_width {
            let mut pattern: u8 = 0;
            let (mut r, mut g, mut b, mut count) = (0u32, 0u32, 0u32, 0u32);

            // Sample the 2x4 dots for this Braille character
            let base_bx = cx as i32 * 2;
            let base_by = cy as i32 * 4;
            for dx in 0..2 {
                for dy in 0..4 {
                    if let Some(color) = buffer.get(base_bx + dx as i32, base_by + dy as i32) {
                        pattern |= BRAILLE_DOTS[dx][dy];
                        r += color.r as u32;
                        g += color.g as u32;
                        b += color.b as u32;
                        count += 1;
                    }
                }
            }

            // Only emit cells that have at least one dot
            if pattern != 0 {
                let braille_char = char::from_u32(BRAILLE_BASE + pattern as u32).unwrap_or(' ');
                cells.push(BrailleCell {
                    x: cx,
                    y: cy,
                    char: braille_char,
                    color: ParticleColor::new((r / count) as u8, (g / count) as u8, (b / count) as u8)
                        .to_terminal(),
                });
            }
        }
    }

    cells
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::{DisplaySurface, Parent, StyleProps};
    use std::sync::Arc;

    fn flake(surface: &mut TerminalSurface, kind: VisualKind, props: StyleProps) {
        let handle = surface.create_visual(kind);
        surface.set_style(handle, &props);
        surface.attach(handle, Parent::Field);
    }

    #[test]
    fn test_braille_pattern() {
        // Test that single dot patterns work correctly
        assert_eq!(BRAILLE_DOTS[0][0], 0x01); // Top-left
        assert_eq!(BRAILLE_DOTS[1][0], 0x08); // Top-right
        assert_eq!(BRAILLE_DOTS[0][3], 0x40); // Bottom-left
        assert_eq!(BRAILLE_DOTS[1][3], 0x80); // Bottom-right

        // All dots should give 0xFF
        let all_dots: u8 = BRAILLE_DOTS[0].iter().sum::<u8>() + BRAILLE_DOTS[1].iter().sum::<u8>();
        assert_eq!(all_dots, 0xFF);
    }

    #[test]
    fn test_braille_char_generation() {
        // Empty pattern
        let empty = char::from_u32(BRAILLE_BASE).unwrap();
        assert_eq!(empty, '\u{2800}');

        // Full pattern (all 8 dots)
        let full = char::from_u32(BRAILLE_BASE + 0xFF).unwrap();
        assert_eq!(full, '\u{28FF}');
    }

    #[test]
    fn test_square_flake_spans_cells() {
        let mut surface = TerminalSurface::new(10, 5, Vec::new());
        flake(&mut surface, VisualKind::Flake, StyleProps::at(3.0, 4.0).with_size(2.0, 2.0));
        let cells = render_to_braille(&surface, None, 10, 5);
        assert_eq!(cells.len(), 2);
        assert_eq!((cells[0].x, cells[0].y), (1, 1));
        assert_eq!(cells[0].char, char::from_u32(BRAILLE_BASE + 0x18).unwrap());
        assert_eq!((cells[1].x, cells[1].y), (2, 1));
        assert_eq!(cells[1].char, char::from_u32(BRAILLE_BASE + 0x03).unwrap());
        assert_eq!(cells[0].color, Color::Rgb(255, 255, 255));
    }

    #[test]
    fn test_rounded_flake_trims_corners() {
        let mut surface = TerminalSurface::new(10, 5, Vec::new());
        let mut props = StyleProps::at(0.0, 0.0).with_size(4.0, 4.0);
        props.rounded = Some(true);
        flake(&mut surface, VisualKind::Flake, props);
        let cells = render_to_braille(&surface, None, 10, 5);
        let dots: u32 = cells
            .iter()
            .map(|c| (c.char as u32 - BRAILLE_BASE).count_ones())
            .sum();
        assert_eq!(dots, 12);
    }

    #[test]
    fn test_shadow_adds_offset_dots() {
        let mut surface = TerminalSurface::new(10, 5, Vec::new());
        let mut props = StyleProps::at(0.0, 0.0).with_size(1.0, 1.0);
        props.shadowed = Some(true);
        flake(&mut surface, VisualKind::Flake, props);
        let cells = render_to_braille(&surface, None, 10, 5);
        assert_eq!(cells.len(), 1);
        // Flake at (0,0), shadow at (1,1)
        assert_eq!(cells[0].char, char::from_u32(BRAILLE_BASE + 0x01 + 0x10).unwrap());
    }

    #[test]
    fn test_sprite_is_masked_and_tinted() {
        let mut sprite = RgbaImage::new(2, 1);
        sprite.put_pixel(0, 0, image::Rgba([255, 255, 255, 255]));
        let mut surface = TerminalSurface::new(10, 5, Vec::new());
        let mut props = StyleProps::at(0.0, 0.0).with_size(2.0, 1.0);
        props.color = Some(ParticleColor::new(0, 128, 255));
        flake(&mut surface, VisualKind::Image(Arc::new(sprite)), props);

        let cells = render_to_braille(&surface, None, 10, 5);
        assert_eq!(cells.len(), 1);
        assert_eq!(cells[0].char, char::from_u32(BRAILLE_BASE + 0x01).unwrap());
        assert_eq!(cells[0].color, Color::Rgb(0, 128, 255));
    }

    #[test]
    fn test_offscreen_flakes_are_clipped() {
        let mut surface = TerminalSurface::new(10, 5, Vec::new());
        flake(&mut surface, VisualKind::Flake, StyleProps::at(-50.0, 300.0).with_size(3.0, 3.0));
        flake(&mut surface, VisualKind::Flake, StyleProps::at(19.0, 19.0).with_size(5.0, 5.0));
        let cells = render_to_braille(&surface, None, 10, 5);
        assert_eq!(cells.len(), 1);
        assert_eq!((cells[0].x, cells[0].y), (9, 4));
    }

    #[test]
    fn test_unattached_visuals_are_skipped() {
        let mut surface = TerminalSurface::new(10, 5, Vec::new());
        let handle = surface.create_visual(VisualKind::Flake);
        surface.set_style(handle, &StyleProps::at(0.0, 0.0).with_size(2.0, 2.0));
        assert!(render_to_braille(&surface, None, 10, 5).is_empty());
    }
}
