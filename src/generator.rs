use crate::{
    backends::BackendChain,
    config::{Config, FailurePolicy},
    error::{GeneratorError, Result},
    logger::Timer,
    models::{GenerationResult, ImageFormat, ImageSource},
    render::FallbackRenderer,
    validation::validate_prompt,
};

/// Validate, try the remote chain, fall back to the local renderer.
pub struct ImageGenerator {
    chain: BackendChain,
    renderer: FallbackRenderer,
    policy: FailurePolicy,
}

impl ImageGenerator {
    pub fn new(chain: BackendChain, renderer: FallbackRenderer, policy: FailurePolicy) -> Self {
        Self {
            chain,
            renderer,
            policy,
        }
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self::new(
            BackendChain::from_config(config)?,
            FallbackRenderer::new(config.fallback_format, config.fallback_style),
            config.failure_policy,
        ))
    }

    pub fn backend_names(&self) -> Vec<String> {
        self.chain.names()
    }

    pub fn fallback_format(&self) -> ImageFormat {
        self.renderer.format()
    }

    pub async fn generate(&self, prompt: &str) -> Result<GenerationResult> {
        // Trimming only applies to the length check; the prompt travels on unchanged.
        let language = validate_prompt(prompt)?;
        let timer = Timer::new("generate");

        log::info!(
            "Generating image for {} prompt ({} chars)",
            language,
            prompt.trim().chars().count()
        );

        let (image_bytes, format, source) = match self.chain.submit_and_await(prompt).await {
            Some(image) => (image.bytes, image.format, ImageSource::Backend(image.backend)),
            None => match self.policy {
                FailurePolicy::Fallback => {
                    if !self.chain.is_empty() {
                        log::warn!("All image backends failed, rendering placeholder");
                    }
                    let rendered = self.renderer.render(prompt, language)?;
                    (rendered.bytes, rendered.format, ImageSource::Fallback)
                }
                FailurePolicy::Error => {
                    return Err(GeneratorError::BackendUnavailable(format!(
                        "no image backend produced an image (tried: {})",
                        self.describe_chain()
                    )));
                }
            },
        };

        Ok(GenerationResult {
            image_bytes,
            format,
            prompt: prompt.to_string(),
            language,
            source,
            elapsed_seconds: timer.elapsed_seconds(),
        })
    }

    fn describe_chain(&self) -> String {
        if self.chain.is_empty() {
            "none configured".to_string()
        } else {
            self.chain.names().join(", ")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        backends::ImageBackend,
        config::{FallbackFormat, FallbackStyle},
        language::LanguageTag,
        models::RemoteImage,
    };
    use async_trait::async_trait;
    use std::sync::Arc;

    struct Down;

    #[async_trait]
    impl ImageBackend for Down {
        fn name(&self) -> &str {
            "down"
        }

        async fn generate(&self, _prompt: &str) -> Result<RemoteImage> {
            Err(GeneratorError::RequestError("connection refused".into()))
        }
    }

    struct Echo;

    #[async_trait]
    impl ImageBackend for Echo {
        fn name(&self) -> &str {
            "echo"
        }

        async fn generate(&self, prompt: &str) -> Result<RemoteImage> {
            Ok(RemoteImage {
                bytes: format!("<svg><text>{}</text></svg>", prompt).into_bytes(),
                format: ImageFormat::Svg,
                backend: "echo".into(),
            })
        }
    }

    fn generator(backends: Vec<Arc<dyn ImageBackend>>, policy: FailurePolicy) -> ImageGenerator {
        ImageGenerator::new(BackendChain::new(backends), FallbackRenderer::default(), policy)
    }

    #[tokio::test]
    async fn rejects_before_touching_backends() {
        let generator = generator(vec![Arc::new(Echo)], FailurePolicy::Fallback);
        let err = generator.generate("  a ").await.unwrap_err();
        assert!(matches!(err, GeneratorError::InvalidPrompt(_)));
    }

    #[tokio::test]
    async fn remote_image_is_passed_through() {
        let generator = generator(vec![Arc::new(Down), Arc::new(Echo)], FailurePolicy::Fallback);
        let result = generator.generate("  a blue whale ").await.unwrap();
        assert_eq!(result.source, ImageSource::Backend("echo".into()));
        assert_eq!(result.format, ImageFormat::Svg);
        assert_eq!(result.prompt, "  a blue whale ");
        assert!(String::from_utf8(result.image_bytes).unwrap().contains("a blue whale"));
    }

    #[tokio::test]
    async fn falls_back_when_everything_is_down() {
        let generator = generator(vec![Arc::new(Down)], FailurePolicy::Fallback);
        let result = generator.generate("a red dragon").await.unwrap();
        assert!(result.source.is_fallback());
        assert_eq!(result.format, ImageFormat::Png);
        assert_eq!(ImageFormat::detect(&result.image_bytes), Some(ImageFormat::Png));
        assert!(result.elapsed_seconds >= 0.0);
    }

    #[tokio::test]
    async fn error_policy_surfaces_backend_failure() {
        let generator = generator(vec![Arc::new(Down)], FailurePolicy::Error);
        let err = generator.generate("a red dragon").await.unwrap_err();
        assert!(matches!(err, GeneratorError::BackendUnavailable(_)));
        assert!(err.public_detail().contains("down"));
    }

    #[tokio::test]
    async fn arabic_prompt_gets_svg_placeholder() {
        let generator = ImageGenerator::new(
            BackendChain::default(),
            FallbackRenderer::new(FallbackFormat::Svg, FallbackStyle::Dark),
            FailurePolicy::Fallback,
        );
        let result = generator.generate("هذا اختبار").await.unwrap();
        assert_eq!(result.language, LanguageTag::Arabic);
        assert_eq!(result.format, ImageFormat::Svg);
        assert!(String::from_utf8(result.image_bytes).unwrap().contains("هذا اختبار"));
    }
}
