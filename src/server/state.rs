use crate::{config::Config, error::Result, generator::ImageGenerator};
use std::sync::Arc;
use std::time::Instant;

/// Shared, read-only state handed to every handler through `web::Data`.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub generator: Arc<ImageGenerator>,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(config: Config) -> Result<Self> {
        let generator = ImageGenerator::from_config(&config)?;
        Ok(Self::with_generator(config, generator))
    }

    pub fn with_generator(config: Config, generator: ImageGenerator) -> Self {
        Self {
            config: Arc::new(config),
            generator: Arc::new(generator),
            started_at: Instant::now(),
        }
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }
}
