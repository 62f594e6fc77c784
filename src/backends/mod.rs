pub mod gemini;
pub mod pollinations;
pub mod prodia;
pub mod traits;

use crate::{
    config::{BackendKind, Config},
    error::{GeneratorError, Result},
    models::{ImageFormat, RemoteImage},
};
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;

pub use gemini::GeminiBackend;
pub use pollinations::PollinationsBackend;
pub use prodia::{JobHandle, JobStatus, ProdiaBackend};
pub use traits::ImageBackend;

pub fn build_http_client(timeout: Duration) -> Result<Client> {
    Client::builder()
        .timeout(timeout)
        .user_agent(concat!("promptcanvas/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| GeneratorError::ConfigError(format!("Failed to build HTTP client: {}", e)))
}

/// Wraps downloaded bytes, refusing anything we can't identify as an image.
pub(crate) fn sniff(bytes: Vec<u8>, backend: &str) -> Result<RemoteImage> {
    if bytes.is_empty() {
        return Err(GeneratorError::ResponseError(format!(
            "{} returned an empty body",
            backend
        )));
    }
    let format = ImageFormat::detect(&bytes).ok_or_else(|| {
        GeneratorError::ResponseError(format!("{} returned bytes that are not an image", backend))
    })?;
    Ok(RemoteImage {
        bytes,
        format,
        backend: backend.to_string(),
    })
}

pub(crate) async fn fetch_image(client: &Client, url: &str, backend: &str) -> Result<RemoteImage> {
    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| GeneratorError::RequestError(format!("{} download failed: {}", backend, e)))?;

    let status = response.status();
    if !status.is_success() {
        return Err(GeneratorError::ResponseError(format!(
            "{} download returned {}",
            backend, status
        )));
    }

    let bytes = response
        .bytes()
        .await
        .map_err(|e| GeneratorError::RequestError(format!("{} body read failed: {}", backend, e)))?;
    sniff(bytes.to_vec(), backend)
}

/// Ordered waterfall of remote backends.
#[derive(Clone, Default)]
pub struct BackendChain {
    backends: Vec<Arc<dyn ImageBackend>>,
}

impl BackendChain {
    pub fn new(backends: Vec<Arc<dyn ImageBackend>>) -> Self {
        Self { backends }
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        let client = build_http_client(config.request_timeout)?;
        let mut backends: Vec<Arc<dyn ImageBackend>> = Vec::with_capacity(config.backends.len());

        for kind in &config.backends {
            let backend: Arc<dyn ImageBackend> = match kind {
                BackendKind::Prodia => Arc::new(ProdiaBackend::new(
                    client.clone(),
                    &config.prodia,
                    config.polling.clone(),
                )?),
                BackendKind::Pollinations => {
                    Arc::new(PollinationsBackend::new(client.clone(), &config.pollinations)?)
                }
                BackendKind::Gemini => Arc::new(GeminiBackend::new(client.clone(), &config.gemini)?),
            };
            backends.push(backend);
        }

        Ok(Self::new(backends))
    }

    pub fn names(&self) -> Vec<String> {
        self.backends.iter().map(|b| b.name().to_string()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.backends.is_empty()
    }

    /// Tries each backend in order. Failures are logged and swallowed; `None` means every tier
    /// failed (or there were none) and the caller should fall back.
    pub async fn submit_and_await(&self, prompt: &str) -> Option<RemoteImage> {
        for backend in &self.backends {
            match backend.generate(prompt).await {
                Ok(image) => {
                    log::info!(
                        "{} delivered a {} image ({} bytes)",
                        backend.name(),
                        image.format,
                        image.bytes.len()
                    );
                    return Some(image);
                }
                Err(e) => {
                    log::warn!("Backend {} failed: {}", backend.name(), e);
                }
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Scripted {
        name: &'static str,
        succeed: bool,
        calls: AtomicUsize,
    }

    impl Scripted {
        fn new(name: &'static str, succeed: bool) -> Arc<Self> {
            Arc::new(Self {
                name,
                succeed,
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl ImageBackend for Scripted {
        fn name(&self) -> &str {
            self.name
        }

        async fn generate(&self, _prompt: &str) -> Result<RemoteImage> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.succeed {
                sniff(b"<svg></svg>".to_vec(), self.name)
            } else {
                Err(GeneratorError::RequestError("connection refused".into()))
            }
        }
    }

    #[tokio::test]
    async fn stops_at_first_success() {
        let first = Scripted::new("first", false);
        let second = Scripted::new("second", true);
        let third = Scripted::new("third", true);
        let chain = BackendChain::new(vec![first.clone(), second.clone(), third.clone()]);

        let image = chain.submit_and_await("a cat").await.unwrap();
        assert_eq!(image.backend, "second");
        assert_eq!(first.calls.load(Ordering::SeqCst), 1);
        assert_eq!(third.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn all_failures_yield_none() {
        let chain = BackendChain::new(vec![Scripted::new("a", false), Scripted::new("b", false)]);
        assert!(chain.submit_and_await("a cat").await.is_none());
        assert!(BackendChain::default().submit_and_await("a cat").await.is_none());
    }

    #[test]
    fn sniff_rejects_json_error_bodies() {
        assert!(sniff(br#"{"error":"rate limited"}"#.to_vec(), "x").is_err());
        assert!(sniff(Vec::new(), "x").is_err());
    }

    #[test]
    fn from_config_follows_backend_order() {
        let config = Config::new()
            .with_backends(vec![BackendKind::Pollinations, BackendKind::Prodia])
            .with_prodia(crate::config::ProdiaConfig::new().with_credentials("key"));
        let chain = BackendChain::from_config(&config).unwrap();
        assert_eq!(chain.names(), vec!["pollinations", "prodia"]);
    }
}
