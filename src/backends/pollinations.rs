use crate::{
    backends::{fetch_image, traits::ImageBackend},
    config::PollinationsConfig,
    error::{GeneratorError, Result},
    models::RemoteImage,
};
use async_trait::async_trait;
use reqwest::{Client, Url};

pub const NAME: &str = "pollinations";

/// Keyless GET endpoint that answers with the image bytes directly.
pub struct PollinationsBackend {
    client: Client,
    base_url: Url,
}

impl PollinationsBackend {
    pub fn new(client: Client, config: &PollinationsConfig) -> Result<Self> {
        let base_url = Url::parse(&config.base_url).map_err(|e| {
            GeneratorError::ConfigError(format!(
                "Invalid Pollinations URL '{}': {}",
                config.base_url, e
            ))
        })?;
        if base_url.cannot_be_a_base() {
            return Err(GeneratorError::ConfigError(format!(
                "Pollinations URL '{}' cannot be used as a base",
                config.base_url
            )));
        }
        Ok(Self { client, base_url })
    }

    /// `{base}/prompt/{prompt}?width=512&height=512&nologo=true`, with the prompt percent-encoded
    /// as a single path segment.
    pub fn prompt_url(&self, prompt: &str) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push("prompt").push(prompt);
        }
        url.query_pairs_mut()
            .append_pair("width", "512")
            .append_pair("height", "512")
            .append_pair("nologo", "true");
        url
    }
}

#[async_trait]
impl ImageBackend for PollinationsBackend {
    fn name(&self) -> &str {
        NAME
    }

    async fn generate(&self, prompt: &str) -> Result<RemoteImage> {
        let url = self.prompt_url(prompt);
        log::debug!("Requesting Pollinations image: {}", url);
        fetch_image(&self.client, url.as_str(), NAME).await
    }
}
