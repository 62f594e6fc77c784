use crate::language::LanguageTag;
use crate::models::generated::GenerationResult;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateResponse {
    pub success: bool,
    /// Base64 encoded image bytes
    pub image: String,
    pub prompt: String,
    pub format: String,
    pub mime_type: String,
    pub language: LanguageTag,
    pub source: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generation_time: Option<f64>,
}

impl From<GenerationResult> for GenerateResponse {
    fn from(result: GenerationResult) -> Self {
        let message = if result.source.is_fallback() {
            format!(
                "{} placeholder image generated",
                result.format.as_str().to_uppercase()
            )
        } else {
            format!("Image generated with {}", result.source.label())
        };

        Self {
            success: true,
            image: BASE64.encode(&result.image_bytes),
            prompt: result.prompt,
            format: result.format.as_str().to_string(),
            mime_type: result.format.mime_type().to_string(),
            language: result.language,
            source: result.source.label().to_string(),
            message,
            generation_time: Some(result.elapsed_seconds),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub detail: String,
    pub message: String,
}

impl ErrorResponse {
    pub fn new(detail: impl Into<String>) -> Self {
        let detail = detail.into();
        Self {
            success: false,
            message: detail.clone(),
            detail,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    pub version: String,
    pub uptime_seconds: u64,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceInfo {
    pub message: String,
    pub status: String,
    pub service: String,
    pub version: String,
    pub endpoints: Vec<String>,
    pub backends: Vec<String>,
    pub fallback_format: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::generated::{ImageFormat, ImageSource};

    fn result(source: ImageSource) -> GenerationResult {
        GenerationResult {
            image_bytes: vec![1, 2, 3],
            format: ImageFormat::Png,
            prompt: "a red dragon".into(),
            language: LanguageTag::English,
            source,
            elapsed_seconds: 0.25,
        }
    }

    #[test]
    fn fallback_envelope() {
        let response = GenerateResponse::from(result(ImageSource::Fallback));
        assert!(response.success);
        assert_eq!(response.image, "AQID");
        assert_eq!(response.format, "png");
        assert_eq!(response.source, "fallback");
        assert_eq!(response.message, "PNG placeholder image generated");
        assert_eq!(response.generation_time, Some(0.25));
    }

    #[test]
    fn backend_envelope_names_the_backend() {
        let response = GenerateResponse::from(result(ImageSource::Backend("prodia".into())));
        assert_eq!(response.source, "prodia");
        assert!(response.message.contains("prodia"));
    }

    #[test]
    fn error_envelope_mirrors_detail() {
        let json = serde_json::to_value(ErrorResponse::new("nope")).unwrap();
        assert_eq!(json["success"], false);
        assert_eq!(json["detail"], "nope");
        assert_eq!(json["message"], "nope");
    }
}
