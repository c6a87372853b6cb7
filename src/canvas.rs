use std::io::Cursor;
use std::path::Path;

use egui::Color32;
use image::{ImageBuffer, ImageOutputFormat, Rgba};
use thiserror::Error;

use crate::history::Snapshot;

/// Blank-canvas color. The eraser paints with it, so erasing and a cleared
/// canvas are indistinguishable in the exported image.
pub const BACKGROUND: Color32 = Color32::WHITE;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("failed to encode PNG: {0}")]
    Encode(#[from] image::ImageError),
    #[error("failed to write image file: {0}")]
    Write(#[from] std::io::Error),
}

/// Effective stroke settings for one pointer event: the tool's color (the
/// background color when erasing) and the brush radius in pixels.
#[derive(Clone, Copy, PartialEq)]
pub struct Brush {
    pub color: Color32,
    pub width: i32,
}

/// Raster drawing surface: a flat row-major RGBA buffer.
#[derive(Clone)]
pub struct Canvas {
    width: usize,
    height: usize,
    data: Vec<Color32>,
}

impl Canvas {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            data: vec![BACKGROUND; width * height],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize) -> Option<Color32> {
        if x < self.width && y < self.height {
            Some(self.data[y * self.width + x])
        } else {
            None
        }
    }

    #[inline]
    fn set(&mut self, x: usize, y: usize, color: Color32) {
        if x < self.width && y < self.height {
            self.data[y * self.width + x] = color;
        }
    }

    /// Stamp a filled circle of the brush radius, clipped to the surface.
    pub fn draw_point(&mut self, x: i32, y: i32, brush: Brush) {
        let width = self.width as i32;
        let height = self.height as i32;
        let size = brush.width;
        let size_squared = size * size;

        for dy in -size..=size {
            for dx in -size..=size {
                if dx * dx + dy * dy <= size_squared {
                    let nx = x + dx;
                    let ny = y + dy;
                    if nx >= 0 && nx < width && ny >= 0 && ny < height {
                        self.set(nx as usize, ny as usize, brush.color);
                    }
                }
            }
        }
    }

    /// Stamp the brush along the Bresenham line between two pointer positions,
    /// so fast drags still leave a continuous stroke.
    pub fn draw_line(&mut self, start: (i32, i32), end: (i32, i32), brush: Brush) {
        let (x0, y0) = start;
        let (x1, y1) = end;
        let dx = (x1 - x0).abs();
        let dy = -(y1 - y0).abs();
        let sx = if x0 < x1 { 1 } else { -1 };
        let sy = if y0 < y1 { 1 } else { -1 };
        let mut err = dx + dy;

        let mut x = x0;
        let mut y = y0;

        loop {
            self.draw_point(x, y, brush);
            if x == x1 && y == y1 {
                break;
            }
            let e2 = 2 * err;
            if e2 >= dy {
                err += dy;
                x += sx;
            }
            if e2 <= dx {
                err += dx;
                y += sy;
            }
        }
    }

    /// Fill the whole surface with the background color.
    pub fn clear(&mut self) {
        self.data.fill(BACKGROUND);
    }

    /// Reallocate the buffer at the new dimensions. The previous contents are
    /// lost; a committed frame can still come back through `restore`.
    pub fn resize(&mut self, width: usize, height: usize) {
        self.width = width;
        self.height = height;
        self.data = vec![BACKGROUND; width * height];
    }

    /// Capture the current frame as an immutable snapshot.
    pub fn capture(&self) -> Snapshot {
        Snapshot::new(self.width, self.height, self.data.clone())
    }

    /// Render a snapshot back onto the surface. When the dimensions differ
    /// (the surface was resized since the capture) the overlapping region is
    /// blitted onto a blank background.
    pub fn restore(&mut self, snapshot: &Snapshot) {
        if snapshot.width() == self.width && snapshot.height() == self.height {
            self.data.copy_from_slice(snapshot.pixels());
            return;
        }

        self.clear();
        let copy_width = snapshot.width().min(self.width);
        let copy_height = snapshot.height().min(self.height);
        for y in 0..copy_height {
            let src = y * snapshot.width();
            let dst = y * self.width;
            self.data[dst..dst + copy_width]
                .copy_from_slice(&snapshot.pixels()[src..src + copy_width]);
        }
    }

    /// Encode the current frame as PNG bytes, exactly as displayed.
    pub fn encode_png(&self) -> Result<Vec<u8>, ExportError> {
        let mut img = ImageBuffer::new(self.width as u32, self.height as u32);
        for y in 0..self.height {
            for x in 0..self.width {
                let color = self.data[y * self.width + x];
                img.put_pixel(
                    x as u32,
                    y as u32,
                    Rgba([color.r(), color.g(), color.b(), color.a()]),
                );
            }
        }

        let mut bytes = Vec::new();
        img.write_to(&mut Cursor::new(&mut bytes), ImageOutputFormat::Png)?;
        Ok(bytes)
    }

    pub fn save_png(&self, path: &Path) -> Result<(), ExportError> {
        let bytes = self.encode_png()?;
        std::fs::write(path, bytes)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const INK: Color32 = Color32::BLACK;

    fn brush(width: i32) -> Brush {
        Brush { color: INK, width }
    }

    #[test]
    fn point_stamps_a_clipped_circle() {
        let mut canvas = Canvas::new(8, 8);
        canvas.draw_point(0, 0, brush(2));

        assert_eq!(canvas.get(0, 0), Some(INK));
        assert_eq!(canvas.get(2, 0), Some(INK));
        // Outside the radius.
        assert_eq!(canvas.get(2, 2), Some(BACKGROUND));
        assert_eq!(canvas.get(3, 0), Some(BACKGROUND));
    }

    #[test]
    fn line_connects_its_endpoints() {
        let mut canvas = Canvas::new(16, 16);
        canvas.draw_line((1, 1), (12, 12), brush(1));

        for i in 1..=12 {
            assert_eq!(canvas.get(i, i), Some(INK), "gap at ({i}, {i})");
        }
    }

    #[test]
    fn erase_paints_background() {
        let mut canvas = Canvas::new(8, 8);
        canvas.draw_point(4, 4, brush(2));
        canvas.draw_point(
            4,
            4,
            Brush {
                color: BACKGROUND,
                width: 3,
            },
        );

        assert_eq!(canvas.get(4, 4), Some(BACKGROUND));
    }

    #[test]
    fn clear_and_resize_blank_the_surface() {
        let mut canvas = Canvas::new(8, 8);
        canvas.draw_point(4, 4, brush(2));
        canvas.clear();
        assert_eq!(canvas.get(4, 4), Some(BACKGROUND));

        canvas.draw_point(4, 4, brush(2));
        canvas.resize(10, 6);
        assert_eq!(canvas.width(), 10);
        assert_eq!(canvas.height(), 6);
        assert_eq!(canvas.get(4, 4), Some(BACKGROUND));
    }

    #[test]
    fn restore_into_smaller_surface_blits_overlap() {
        let mut canvas = Canvas::new(8, 8);
        canvas.draw_point(1, 1, brush(1));
        let snapshot = canvas.capture();

        canvas.resize(4, 4);
        canvas.restore(&snapshot);
        assert_eq!(canvas.get(1, 1), Some(INK));
        assert_eq!(canvas.get(3, 3), Some(BACKGROUND));
    }

    #[test]
    fn exported_png_decodes_to_displayed_pixels() {
        let mut canvas = Canvas::new(6, 4);
        canvas.draw_point(2, 2, brush(1));

        let bytes = canvas.encode_png().unwrap();
        let decoded = image::load_from_memory(&bytes).unwrap().to_rgba8();
        assert_eq!(decoded.width(), 6);
        assert_eq!(decoded.height(), 4);

        for y in 0..4u32 {
            for x in 0..6u32 {
                let expected = canvas.get(x as usize, y as usize).unwrap();
                let pixel = decoded.get_pixel(x, y);
                assert_eq!(
                    (pixel[0], pixel[1], pixel[2], pixel[3]),
                    (expected.r(), expected.g(), expected.b(), expected.a()),
                    "pixel mismatch at ({x}, {y})"
                );
            }
        }
    }
}
