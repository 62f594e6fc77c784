use crate::{
    backends::{fetch_image, sniff, traits::ImageBackend},
    config::{PollingConfig, ProdiaConfig},
    error::{GeneratorError, Result},
    models::RemoteImage,
};
use async_trait::async_trait;
use reqwest::{header::CONTENT_TYPE, Client};
use serde::Deserialize;
use serde_json::json;

pub const NAME: &str = "prodia";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobStatus {
    Pending,
    Succeeded,
    Failed,
}

impl JobStatus {
    /// Anything that isn't terminal keeps the poll loop going (`queued`, `generating`, ...).
    pub fn parse(status: &str) -> Self {
        match status.trim().to_ascii_lowercase().as_str() {
            "succeeded" => JobStatus::Succeeded,
            "failed" => JobStatus::Failed,
            _ => JobStatus::Pending,
        }
    }
}

#[derive(Debug, Clone)]
pub struct JobHandle {
    pub job_id: String,
    pub status: JobStatus,
}

#[derive(Debug, Deserialize)]
struct JobPayload {
    job: String,
    #[serde(default)]
    status: Option<String>,
    #[serde(rename = "imageUrl", default)]
    image_url: Option<String>,
}

/// What the submit call handed back.
enum Submission {
    Ready(RemoteImage),
    Queued(JobHandle),
}

pub struct ProdiaBackend {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
    polling: PollingConfig,
}

impl ProdiaBackend {
    pub fn new(client: Client, config: &ProdiaConfig, polling: PollingConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .ok_or_else(|| GeneratorError::ConfigError("Prodia API key is required".into()))?;

        Ok(Self {
            client,
            api_key,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            polling,
        })
    }

    async fn submit(&self, prompt: &str) -> Result<Submission> {
        let payload = json!({
            "prompt": prompt,
            "model": self.model,
            "negative_prompt": "",
            "steps": 25,
            "cfg_scale": 7,
            "seed": -1,
            "width": 512,
            "height": 512
        });

        let response = self
            .client
            .post(format!("{}/sd/generate", self.base_url))
            .header("X-Prodia-Key", &self.api_key)
            .json(&payload)
            .send()
            .await
            .map_err(|e| GeneratorError::RequestError(format!("Prodia request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GeneratorError::ResponseError(format!(
                "Prodia rejected the job ({}): {}",
                status, body
            )));
        }

        let is_image = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map_or(false, |value| value.starts_with("image/"));

        let bytes = response
            .bytes()
            .await
            .map_err(|e| GeneratorError::RequestError(format!("Prodia body read failed: {}", e)))?;

        if is_image {
            return sniff(bytes.to_vec(), NAME).map(Submission::Ready);
        }

        let job: JobPayload = serde_json::from_slice(&bytes)
            .map_err(|e| GeneratorError::ResponseError(format!("Invalid Prodia job: {}", e)))?;
        Ok(Submission::Queued(JobHandle {
            job_id: job.job,
            status: JobStatus::parse(job.status.as_deref().unwrap_or("queued")),
        }))
    }

    /// One status query. `Ok(None)` means the job is still running or the poll itself was
    /// not answered with 200; both keep the loop going.
    async fn poll_once(&self, handle: &mut JobHandle) -> Result<Option<String>> {
        let response = self
            .client
            .get(format!("{}/job/{}", self.base_url, handle.job_id))
            .header("X-Prodia-Key", &self.api_key)
            .send()
            .await
            .map_err(|e| GeneratorError::RequestError(format!("Prodia poll failed: {}", e)))?;

        if !response.status().is_success() {
            log::debug!("Prodia poll for {} returned {}", handle.job_id, response.status());
            return Ok(None);
        }

        let job: JobPayload = response
            .json()
            .await
            .map_err(|e| GeneratorError::ResponseError(format!("Invalid Prodia status: {}", e)))?;
        handle.status = JobStatus::parse(job.status.as_deref().unwrap_or_default());

        match handle.status {
            JobStatus::Succeeded => job.image_url.map(Some).ok_or_else(|| {
                GeneratorError::ResponseError("Prodia job succeeded without an imageUrl".into())
            }),
            JobStatus::Failed => Err(GeneratorError::ResponseError(format!(
                "Prodia job {} failed",
                handle.job_id
            ))),
            JobStatus::Pending => Ok(None),
        }
    }

    /// Polls until a terminal status or until the attempt budget runs out.
    pub async fn await_job(&self, mut handle: JobHandle) -> Result<String> {
        let attempts = self.polling.max_attempts;
        for attempt in 1..=attempts {
            if let Some(image_url) = self.poll_once(&mut handle).await? {
                log::info!("Prodia job {} finished after {} polls", handle.job_id, attempt);
                return Ok(image_url);
            }
            if attempt < attempts {
                tokio::time::sleep(self.polling.interval).await;
            }
        }

        Err(GeneratorError::ResponseError(format!(
            "Prodia job {} still {:?} after {} polls",
            handle.job_id, handle.status, attempts
        )))
    }
}

#[async_trait]
impl ImageBackend for ProdiaBackend {
    fn name(&self) -> &str {
        NAME
    }

    async fn generate(&self, prompt: &str) -> Result<RemoteImage> {
        match self.submit(prompt).await? {
            Submission::Ready(image) => Ok(image),
            Submission::Queued(handle) => {
                log::debug!("Prodia job {} queued", handle.job_id);
                let image_url = self.await_job(handle).await?;
                fetch_image(&self.client, &image_url, NAME).await
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_parsing() {
        assert_eq!(JobStatus::parse("succeeded"), JobStatus::Succeeded);
        assert_eq!(JobStatus::parse("FAILED"), JobStatus::Failed);
        assert_eq!(JobStatus::parse("queued"), JobStatus::Pending);
        assert_eq!(JobStatus::parse("generating"), JobStatus::Pending);
        assert_eq!(JobStatus::parse(""), JobStatus::Pending);
    }

    #[test]
    fn missing_key_is_a_config_error() {
        let result = ProdiaBackend::new(Client::new(), &ProdiaConfig::default(), PollingConfig::default());
        assert!(matches!(result, Err(GeneratorError::ConfigError(_))));
    }
}
