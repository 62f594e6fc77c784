use crate::{error::Result, models::RemoteImage};
use async_trait::async_trait;

/// One remote text-to-image service.
///
/// Implementations hold no per-request state; a failure here never affects the next tier.
#[async_trait]
pub trait ImageBackend: Send + Sync {
    fn name(&self) -> &str;

    async fn generate(&self, prompt: &str) -> Result<RemoteImage>;
}
