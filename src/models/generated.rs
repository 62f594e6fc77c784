use crate::language::LanguageTag;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    Png,
    Jpeg,
    Webp,
    Gif,
    #[serde(rename = "svg+xml")]
    Svg,
}

impl ImageFormat {
    /// Value of the `format` field in `/generate` responses.
    pub fn as_str(&self) -> &'static str {
        match self {
            ImageFormat::Png => "png",
            ImageFormat::Jpeg => "jpeg",
            ImageFormat::Webp => "webp",
            ImageFormat::Gif => "gif",
            ImageFormat::Svg => "svg+xml",
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            ImageFormat::Png => "image/png",
            ImageFormat::Jpeg => "image/jpeg",
            ImageFormat::Webp => "image/webp",
            ImageFormat::Gif => "image/gif",
            ImageFormat::Svg => "image/svg+xml",
        }
    }

    /// Sniffs the format from the leading bytes. `None` means we can't vouch for the payload.
    pub fn detect(bytes: &[u8]) -> Option<Self> {
        if looks_like_svg(bytes) {
            return Some(ImageFormat::Svg);
        }
        match image::guess_format(bytes).ok()? {
            image::ImageFormat::Png => Some(ImageFormat::Png),
            image::ImageFormat::Jpeg => Some(ImageFormat::Jpeg),
            image::ImageFormat::WebP => Some(ImageFormat::Webp),
            image::ImageFormat::Gif => Some(ImageFormat::Gif),
            _ => None,
        }
    }
}

impl fmt::Display for ImageFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn looks_like_svg(bytes: &[u8]) -> bool {
    let head = &bytes[..bytes.len().min(256)];
    let head = String::from_utf8_lossy(head);
    let head = head.trim_start_matches('\u{feff}').trim_start();
    head.starts_with("<svg") || (head.starts_with("<?xml") && head.contains("<svg"))
}

/// Where the returned pixels came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageSource {
    Backend(String),
    Fallback,
}

impl ImageSource {
    pub fn label(&self) -> &str {
        match self {
            ImageSource::Backend(name) => name,
            ImageSource::Fallback => "fallback",
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, ImageSource::Fallback)
    }
}

/// Image bytes delivered by one remote backend.
#[derive(Debug, Clone)]
pub struct RemoteImage {
    pub bytes: Vec<u8>,
    pub format: ImageFormat,
    pub backend: String,
}

/// Output of the local placeholder renderer.
#[derive(Debug, Clone)]
pub struct RenderedImage {
    pub bytes: Vec<u8>,
    pub format: ImageFormat,
}

#[derive(Debug, Clone)]
pub struct GenerationResult {
    pub image_bytes: Vec<u8>,
    pub format: ImageFormat,
    pub prompt: String,
    pub language: LanguageTag,
    pub source: ImageSource,
    pub elapsed_seconds: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_png_and_jpeg_magic() {
        let png = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0];
        assert_eq!(ImageFormat::detect(&png), Some(ImageFormat::Png));
        let jpeg = [0xFF, 0xD8, 0xFF, 0xE0, 0, 0x10];
        assert_eq!(ImageFormat::detect(&jpeg), Some(ImageFormat::Jpeg));
    }

    #[test]
    fn detects_svg_documents() {
        assert_eq!(
            ImageFormat::detect(b"<svg xmlns=\"http://www.w3.org/2000/svg\"></svg>"),
            Some(ImageFormat::Svg)
        );
        assert_eq!(
            ImageFormat::detect(b"<?xml version=\"1.0\"?>\n<svg></svg>"),
            Some(ImageFormat::Svg)
        );
    }

    #[test]
    fn rejects_unknown_payloads() {
        assert_eq!(ImageFormat::detect(b"{\"error\":\"quota\"}"), None);
        assert_eq!(ImageFormat::detect(b""), None);
    }

    #[test]
    fn format_strings() {
        assert_eq!(ImageFormat::Svg.as_str(), "svg+xml");
        assert_eq!(ImageFormat::Svg.mime_type(), "image/svg+xml");
        assert_eq!(ImageSource::Fallback.label(), "fallback");
    }
}
