use super::{Anchor, Color, Scene, Shape, ShapeKind, TextItem, TextSize};
use std::fmt::Write;

const FONT_FAMILY: &str = "Arial, Helvetica, sans-serif";

fn hex(color: Color) -> String {
    format!("#{:02x}{:02x}{:02x}", color[0], color[1], color[2])
}

fn font_size(size: TextSize) -> u32 {
    match size {
        TextSize::Small => 14,
        TextSize::Medium => 18,
        TextSize::Large => 28,
    }
}

pub fn escape_xml(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            // not allowed in XML 1.0
            c if (c as u32) < 0x20 && !matches!(c, '\t' | '\n' | '\r') => {}
            c => escaped.push(c),
        }
    }
    escaped
}

fn paint(shape: &Shape) -> String {
    let fill = shape.fill.map(hex).unwrap_or_else(|| "none".to_string());
    match shape.stroke {
        Some(stroke) => format!(
            r#"fill="{}" stroke="{}" stroke-width="{}""#,
            fill,
            hex(stroke.color),
            stroke.width
        ),
        None => format!(r#"fill="{}""#, fill),
    }
}

fn write_shape(out: &mut String, shape: &Shape) {
    let width = shape.x1 - shape.x0;
    let height = shape.y1 - shape.y0;
    let _ = match shape.kind {
        ShapeKind::Rectangle => writeln!(
            out,
            r#"  <rect x="{}" y="{}" width="{}" height="{}" {}/>"#,
            shape.x0,
            shape.y0,
            width,
            height,
            paint(shape)
        ),
        ShapeKind::Ellipse => writeln!(
            out,
            r#"  <ellipse cx="{}" cy="{}" rx="{}" ry="{}" {}/>"#,
            shape.x0 as f32 + width as f32 / 2.0,
            shape.y0 as f32 + height as f32 / 2.0,
            width as f32 / 2.0,
            height as f32 / 2.0,
            paint(shape)
        ),
    };
}

fn write_text(out: &mut String, item: &TextItem) {
    let anchor = match item.anchor {
        Anchor::Start => "start",
        Anchor::Middle => "middle",
    };
    let weight = if item.size == TextSize::Large {
        r#" font-weight="bold""#
    } else {
        ""
    };
    let _ = writeln!(
        out,
        r#"  <text x="{}" y="{}" font-family="{}" font-size="{}" fill="{}" text-anchor="{}" dominant-baseline="middle"{}>{}</text>"#,
        item.x,
        item.y,
        FONT_FAMILY,
        font_size(item.size),
        hex(item.color),
        anchor,
        weight,
        escape_xml(&item.text)
    );
}

pub fn to_svg(scene: &Scene) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}">"#,
        w = scene.width,
        h = scene.height
    );
    let _ = writeln!(
        out,
        r#"  <rect width="100%" height="100%" fill="{}"/>"#,
        hex(scene.background)
    );
    for shape in &scene.shapes {
        write_shape(&mut out, shape);
    }
    for item in &scene.texts {
        write_text(&mut out, item);
    }
    out.push_str("</svg>\n");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FallbackStyle;
    use crate::language::LanguageTag;
    use crate::render::layout;

    #[test]
    fn escapes_markup_in_prompt() {
        assert_eq!(
            escape_xml(r#"<script>"a" & 'b'</script>"#),
            "&lt;script&gt;&quot;a&quot; &amp; &apos;b&apos;&lt;/script&gt;"
        );
        assert_eq!(escape_xml("bell\u{7}"), "bell");
    }

    #[test]
    fn document_shape() {
        let scene = layout("a <red> dragon", LanguageTag::English, FallbackStyle::Palette);
        let svg = to_svg(&scene);
        assert!(svg.starts_with("<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"512\""));
        assert!(svg.trim_end().ends_with("</svg>"));
        assert!(svg.contains(r##"fill="#ff0000""##));
        assert!(svg.contains("a &lt;red&gt; dragon"));
        assert!(!svg.contains("<red>"));
        assert!(svg.contains("<ellipse"));
    }

    #[test]
    fn arabic_text_is_kept_verbatim() {
        let scene = layout("هذا اختبار", LanguageTag::Arabic, FallbackStyle::Dark);
        let svg = to_svg(&scene);
        assert!(svg.contains("هذا اختبار"));
        assert!(svg.contains("Language: Arabic"));
    }
}
