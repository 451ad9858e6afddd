use image::{Rgba, RgbaImage};

/// Drawing surface for settled snow on one accumulation target
pub struct Canvas {
    pixels: RgbaImage,
}

impl Canvas {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            pixels: RgbaImage::new(width, height),
        }
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    /// Wipe all paint and adopt new dimensions
    pub fn reset(&mut self, width: u32, height: u32) {
        if self.pixels.width() == width && self.pixels.height() == height {
            self.clear();
        } else {
            self.pixels = RgbaImage::new(width, height);
        }
    }

    pub fn clear(&mut self) {
        for px in self.pixels.pixels_mut() {
            *px = Rgba([0, 0, 0, 0]);
        }
    }

    /// Fill an axis-aligned ellipse, clipped to the canvas
    pub fn fill_ellipse(&mut self, cx: f32, cy: f32, rx: f32, ry: f32, color: Rgba<u8>) {
        if rx <= 0.0 || ry <= 0.0 || !cx.is_finite() || !cy.is_finite() {
            return;
        }
        let (w, h) = (self.width() as i64, self.height() as i64);
        let x0 = ((cx - rx).floor() as i64).max(0);
        let x1 = ((cx + rx).ceil() as i64).min(w - 1);
        let y0 = ((cy - ry).floor() as i64).max(0);
        let y1 = ((cy + ry).ceil() as i64).min(h - 1);

        for y in y0..=y1 {
            for x in x0..=x1 {
                // Sample at pixel centre
                let dx = (x as f32 + 0.5 - cx) / rx;
                let dy = (y as f32 + 0.5 - cy) / ry;
                if dx * dx + dy * dy <= 1.0 {
                    self.pixels.put_pixel(x as u32, y as u32, color);
                }
            }
        }
    }

    /// Painted pixel at (x, y), if any
    pub fn painted(&self, x: u32, y: u32) -> Option<Rgba<u8>> {
        self.pixels
            .get_pixel_checked(x, y)
            .filter(|px| px[3] > 0)
            .copied()
    }

    #[cfg(test)]
    pub fn painted_count(&self) -> usize {
        self.pixels.pixels().filter(|px| px[3] > 0).count()
    }
}
