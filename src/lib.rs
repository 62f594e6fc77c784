pub mod backends;
pub mod config;
pub mod error;
pub mod generator;
pub mod language;
pub mod logger;
pub mod models;
pub mod render;
#[cfg(feature = "server")]
pub mod server;
pub mod validation;

pub use backends::{BackendChain, GeminiBackend, ImageBackend, PollinationsBackend, ProdiaBackend};
pub use config::{
    BackendKind, Config, FailurePolicy, FallbackFormat, FallbackStyle, GeminiConfig,
    PollinationsConfig, ProdiaConfig,
};
pub use error::{GeneratorError, Result};
pub use generator::ImageGenerator;
pub use language::{classify, LanguageTag};
pub use models::*;
pub use render::FallbackRenderer;
pub use validation::{validate_prompt, PromptRejection};
