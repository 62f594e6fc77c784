//! Deterministic placeholder images for when no remote backend delivers.
//!
//! A `Scene` is laid out once per prompt and then handed to either the PNG rasterizer or the
//! SVG writer, so both encodings show the same picture.

pub mod font;
pub mod raster;
pub mod svg;

use crate::{
    config::{FallbackFormat, FallbackStyle},
    error::Result,
    language::LanguageTag,
    models::{ImageFormat, RenderedImage},
};

pub const CANVAS_SIZE: u32 = 512;
pub const WRAP_WIDTH: usize = 40;
pub const MAX_LINES: usize = 3;

pub type Color = [u8; 3];

pub const WHITE: Color = [255, 255, 255];
pub const BLACK: Color = [0, 0, 0];
pub const RED: Color = [255, 0, 0];
pub const BLUE: Color = [0, 0, 255];
pub const YELLOW: Color = [255, 255, 0];

/// First match wins, so "red" beats "blue" in "a red and blue kite".
pub const PALETTE: &[(&str, Color)] = &[
    ("red", RED),
    ("blue", BLUE),
    ("green", [0, 255, 0]),
    ("yellow", YELLOW),
    ("purple", [128, 0, 128]),
    ("orange", [255, 165, 0]),
];

const DARK_BACKGROUND: Color = [26, 26, 26];
const DARK_ACCENT: Color = [207, 139, 252];
const DARK_FOOTER: Color = [136, 136, 136];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextSize {
    Small,
    Medium,
    Large,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Anchor {
    Start,
    Middle,
}

/// `y` is the vertical centre of the line.
#[derive(Debug, Clone, PartialEq)]
pub struct TextItem {
    pub x: i32,
    pub y: i32,
    pub text: String,
    pub color: Color,
    pub size: TextSize,
    pub anchor: Anchor,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Stroke {
    pub color: Color,
    pub width: u32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ShapeKind {
    Rectangle,
    Ellipse,
}

/// Shape bounded by the inclusive box `(x0, y0)..=(x1, y1)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Shape {
    pub kind: ShapeKind,
    pub x0: i32,
    pub y0: i32,
    pub x1: i32,
    pub y1: i32,
    pub fill: Option<Color>,
    pub stroke: Option<Stroke>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Scene {
    pub width: u32,
    pub height: u32,
    pub background: Color,
    pub shapes: Vec<Shape>,
    pub texts: Vec<TextItem>,
}

pub fn pick_background(prompt: &str) -> Color {
    let lowered = prompt.to_lowercase();
    PALETTE
        .iter()
        .find(|(name, _)| lowered.contains(name))
        .map(|(_, color)| *color)
        .unwrap_or(BLUE)
}

fn split_long_word(word: &str, width: usize) -> Vec<&str> {
    let mut chunks = Vec::new();
    let mut start = 0;
    for (count, (idx, _)) in word.char_indices().enumerate() {
        if count > 0 && count % width == 0 {
            chunks.push(&word[start..idx]);
            start = idx;
        }
    }
    chunks.push(&word[start..]);
    chunks
}

/// Greedy word wrap. Lines never exceed `width` characters; words longer than that are cut.
/// Only the first `max_lines` lines are kept.
pub fn wrap_prompt(prompt: &str, width: usize, max_lines: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for word in prompt.split_whitespace() {
        for chunk in split_long_word(word, width) {
            let chunk_len = chunk.chars().count();
            if current_len > 0 && current_len + 1 + chunk_len > width {
                lines.push(std::mem::take(&mut current));
                current_len = 0;
                if lines.len() == max_lines {
                    return lines;
                }
            }
            if current_len > 0 {
                current.push(' ');
                current_len += 1;
            }
            current.push_str(chunk);
            current_len += chunk_len;
        }
    }

    if !current.is_empty() && lines.len() < max_lines {
        lines.push(current);
    }
    lines
}

fn text(x: i32, y: i32, text: impl Into<String>, color: Color, size: TextSize, anchor: Anchor) -> TextItem {
    TextItem {
        x,
        y,
        text: text.into(),
        color,
        size,
        anchor,
    }
}

fn shape(kind: ShapeKind, bounds: [i32; 4], fill: Option<Color>, stroke: Option<Stroke>) -> Shape {
    Shape {
        kind,
        x0: bounds[0],
        y0: bounds[1],
        x1: bounds[2],
        y1: bounds[3],
        fill,
        stroke,
    }
}

fn palette_scene(prompt: &str, language: LanguageTag) -> Scene {
    let outline = Some(Stroke {
        color: BLACK,
        width: 2,
    });

    let mut texts = vec![text(50, 50, "AI Generated", WHITE, TextSize::Large, Anchor::Start)];
    for (i, line) in wrap_prompt(prompt, WRAP_WIDTH, MAX_LINES).into_iter().enumerate() {
        texts.push(text(16, 95 + i as i32 * 22, line, WHITE, TextSize::Medium, Anchor::Start));
    }
    texts.push(text(
        50,
        170,
        format!("Language: {}", language),
        YELLOW,
        TextSize::Small,
        Anchor::Start,
    ));

    Scene {
        width: CANVAS_SIZE,
        height: CANVAS_SIZE,
        background: pick_background(prompt),
        shapes: vec![
            shape(ShapeKind::Rectangle, [100, 200, 300, 300], Some(WHITE), outline),
            shape(ShapeKind::Ellipse, [150, 350, 250, 450], Some(RED), outline),
        ],
        texts,
    }
}

fn dark_scene(prompt: &str, language: LanguageTag) -> Scene {
    let size = CANVAS_SIZE as i32;
    let center = size / 2;
    let ring = |width| {
        Some(Stroke {
            color: DARK_ACCENT,
            width,
        })
    };

    let mut texts = vec![text(
        center,
        150,
        "AI Generated Image",
        DARK_ACCENT,
        TextSize::Large,
        Anchor::Middle,
    )];
    for (i, line) in wrap_prompt(prompt, WRAP_WIDTH, MAX_LINES).into_iter().enumerate() {
        texts.push(text(center, 200 + i as i32 * 40, line, WHITE, TextSize::Medium, Anchor::Middle));
    }
    texts.push(text(
        center,
        330,
        format!("Language: {}", language),
        DARK_ACCENT,
        TextSize::Small,
        Anchor::Middle,
    ));
    texts.push(text(
        center,
        size - 80,
        "Generated with AI",
        DARK_FOOTER,
        TextSize::Small,
        Anchor::Middle,
    ));

    Scene {
        width: CANVAS_SIZE,
        height: CANVAS_SIZE,
        background: DARK_BACKGROUND,
        shapes: vec![
            shape(ShapeKind::Rectangle, [50, 100, size - 50, size - 100], None, ring(3)),
            shape(ShapeKind::Ellipse, [100, 350, 150, 400], None, ring(2)),
            shape(ShapeKind::Ellipse, [size - 150, 350, size - 100, 400], None, ring(2)),
        ],
        texts,
    }
}

pub fn layout(prompt: &str, language: LanguageTag, style: FallbackStyle) -> Scene {
    match style {
        FallbackStyle::Palette => palette_scene(prompt, language),
        FallbackStyle::Dark => dark_scene(prompt, language),
    }
}

#[derive(Debug, Clone, Copy)]
pub struct FallbackRenderer {
    format: FallbackFormat,
    style: FallbackStyle,
}

impl Default for FallbackRenderer {
    fn default() -> Self {
        Self::new(FallbackFormat::Png, FallbackStyle::Palette)
    }
}

impl FallbackRenderer {
    pub fn new(format: FallbackFormat, style: FallbackStyle) -> Self {
        Self { format, style }
    }

    pub fn format(&self) -> ImageFormat {
        match self.format {
            FallbackFormat::Png => ImageFormat::Png,
            FallbackFormat::Svg => ImageFormat::Svg,
        }
    }

    /// Draws the placeholder. Only PNG encoding can fail, and only on allocation trouble.
    pub fn render(&self, prompt: &str, language: LanguageTag) -> Result<RenderedImage> {
        let scene = layout(prompt, language, self.style);
        let bytes = match self.format {
            FallbackFormat::Png => raster::encode_png(&scene)?,
            FallbackFormat::Svg => svg::to_svg(&scene).into_bytes(),
        };
        log::debug!(
            "Rendered {} fallback image ({} bytes)",
            self.format().as_str(),
            bytes.len()
        );
        Ok(RenderedImage {
            bytes,
            format: self.format(),
        })
    }
}
