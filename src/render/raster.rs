use super::{font, Anchor, Color, Scene, Shape, ShapeKind, TextItem, TextSize};
use crate::error::{GeneratorError, Result};
use image::{Rgb, RgbImage};
use std::io::Cursor;

fn scale(size: TextSize) -> u32 {
    match size {
        TextSize::Small => 2,
        TextSize::Medium => 2,
        TextSize::Large => 3,
    }
}

pub fn text_width(text: &str, size: TextSize) -> u32 {
    let chars = text.chars().count() as u32;
    if chars == 0 {
        return 0;
    }
    (chars * font::GLYPH_ADVANCE - 1) * scale(size)
}

struct Canvas {
    image: RgbImage,
}

impl Canvas {
    fn new(width: u32, height: u32, background: Color) -> Self {
        Self {
            image: RgbImage::from_pixel(width, height, Rgb(background)),
        }
    }

    // Silently clips anything outside the canvas.
    fn put(&mut self, x: i32, y: i32, color: Color) {
        if x < 0 || y < 0 {
            return;
        }
        let (x, y) = (x as u32, y as u32);
        if x < self.image.width() && y < self.image.height() {
            self.image.put_pixel(x, y, Rgb(color));
        }
    }

    fn rectangle(&mut self, shape: &Shape) {
        for y in shape.y0..=shape.y1 {
            for x in shape.x0..=shape.x1 {
                let edge = shape.stroke.filter(|stroke| {
                    let w = stroke.width as i32;
                    x < shape.x0 + w || x > shape.x1 - w || y < shape.y0 + w || y > shape.y1 - w
                });
                match (edge, shape.fill) {
                    (Some(stroke), _) => self.put(x, y, stroke.color),
                    (None, Some(fill)) => self.put(x, y, fill),
                    (None, None) => {}
                }
            }
        }
    }

    fn ellipse(&mut self, shape: &Shape) {
        let cx = (shape.x0 + shape.x1) as f32 / 2.0;
        let cy = (shape.y0 + shape.y1) as f32 / 2.0;
        let rx = (shape.x1 - shape.x0) as f32 / 2.0;
        let ry = (shape.y1 - shape.y0) as f32 / 2.0;
        if rx <= 0.0 || ry <= 0.0 {
            return;
        }
        let inside = |x: f32, y: f32, rx: f32, ry: f32| {
            rx > 0.0 && ry > 0.0 && ((x - cx) / rx).powi(2) + ((y - cy) / ry).powi(2) <= 1.0
        };

        for y in shape.y0..=shape.y1 {
            for x in shape.x0..=shape.x1 {
                let (fx, fy) = (x as f32, y as f32);
                if !inside(fx, fy, rx, ry) {
                    continue;
                }
                let on_ring = shape.stroke.filter(|stroke| {
                    let w = stroke.width as f32;
                    !inside(fx, fy, rx - w, ry - w)
                });
                match (on_ring, shape.fill) {
                    (Some(stroke), _) => self.put(x, y, stroke.color),
                    (None, Some(fill)) => self.put(x, y, fill),
                    (None, None) => {}
                }
            }
        }
    }

    fn text(&mut self, item: &TextItem) {
        let scale = scale(item.size) as i32;
        let width = text_width(&item.text, item.size) as i32;
        let height = font::GLYPH_HEIGHT as i32 * scale;
        let left = match item.anchor {
            Anchor::Start => item.x,
            Anchor::Middle => item.x - width / 2,
        };
        let top = item.y - height / 2;

        for (i, c) in item.text.chars().enumerate() {
            let origin = left + i as i32 * font::GLYPH_ADVANCE as i32 * scale;
            for column in 0..font::GLYPH_WIDTH {
                for row in 0..font::GLYPH_HEIGHT {
                    if !font::is_set(c, column, row) {
                        continue;
                    }
                    for dy in 0..scale {
                        for dx in 0..scale {
                            self.put(
                                origin + column as i32 * scale + dx,
                                top + row as i32 * scale + dy,
                                item.color,
                            );
                        }
                    }
                }
            }
        }
    }
}

pub fn rasterize(scene: &Scene) -> RgbImage {
    let mut canvas = Canvas::new(scene.width, scene.height, scene.background);
    for shape in &scene.shapes {
        match shape.kind {
            ShapeKind::Rectangle => canvas.rectangle(shape),
            ShapeKind::Ellipse => canvas.ellipse(shape),
        }
    }
    for item in &scene.texts {
        canvas.text(item);
    }
    canvas.image
}

pub fn encode_png(scene: &Scene) -> Result<Vec<u8>> {
    let pixels = rasterize(scene);
    let mut bytes = Vec::new();
    pixels
        .write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
        .map_err(|e| GeneratorError::RenderError(format!("PNG encoding failed: {}", e)))?;
    Ok(bytes)
}
