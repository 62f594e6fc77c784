use crate::{
    backends::{sniff, traits::ImageBackend},
    config::GeminiConfig,
    error::{GeneratorError, Result},
    models::RemoteImage,
};
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;

pub const NAME: &str = "gemini";

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    #[serde(rename = "inlineData", alias = "inline_data")]
    inline_data: Option<InlineData>,
}

#[derive(Debug, Deserialize)]
struct InlineData {
    data: String,
}

pub struct GeminiBackend {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl GeminiBackend {
    pub fn new(client: Client, config: &GeminiConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .ok_or_else(|| GeneratorError::ConfigError("Gemini API key is required".into()))?;

        Ok(Self {
            client,
            api_key,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
        })
    }
}

fn first_inline_image(response: GenerateContentResponse) -> Option<String> {
    response
        .candidates
        .into_iter()
        .filter_map(|candidate| candidate.content)
        .flat_map(|content| content.parts)
        .filter_map(|part| part.inline_data)
        .map(|inline| inline.data)
        .find(|data| !data.is_empty())
}

#[async_trait]
impl ImageBackend for GeminiBackend {
    fn name(&self) -> &str {
        NAME
    }

    async fn generate(&self, prompt: &str) -> Result<RemoteImage> {
        let payload = json!({
            "contents": [
                {
                    "role": "user",
                    "parts": [ { "text": prompt } ]
                }
            ],
            "generationConfig": {
                "responseModalities": ["TEXT", "IMAGE"]
            }
        });

        log::info!("Generating image with model: {}", self.model);

        let response = self
            .client
            .post(format!(
                "{}/models/{}:generateContent",
                self.base_url, self.model
            ))
            .header("x-goog-api-key", &self.api_key)
            .json(&payload)
            .send()
            .await
            .map_err(|e| GeneratorError::RequestError(format!("Gemini request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GeneratorError::ResponseError(format!(
                "Gemini returned {}: {}",
                status, body
            )));
        }

        let body: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| GeneratorError::ResponseError(e.to_string()))?;

        let encoded = first_inline_image(body)
            .ok_or_else(|| GeneratorError::ResponseError("No images generated".into()))?;
        let bytes = BASE64
            .decode(encoded.as_bytes())
            .map_err(|e| GeneratorError::SerializationError(format!("Bad Gemini image data: {}", e)))?;

        sniff(bytes, NAME)
    }
}
