use crate::error::{GeneratorError, Result};
use std::env;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_BACKENDS: &str = "prodia,pollinations";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
}

impl FromStr for Environment {
    type Err = GeneratorError;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" => Ok(Environment::Development),
            "production" | "prod" => Ok(Environment::Production),
            other => Err(GeneratorError::ConfigError(format!(
                "APP_ENV must be development or production, got '{}'",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    Prodia,
    Pollinations,
    Gemini,
}

impl BackendKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BackendKind::Prodia => "prodia",
            BackendKind::Pollinations => "pollinations",
            BackendKind::Gemini => "gemini",
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BackendKind {
    type Err = GeneratorError;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "prodia" => Ok(BackendKind::Prodia),
            "pollinations" => Ok(BackendKind::Pollinations),
            "gemini" => Ok(BackendKind::Gemini),
            other => Err(GeneratorError::ConfigError(format!(
                "Unknown image backend '{}'",
                other
            ))),
        }
    }
}

/// Encoding used by the placeholder renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FallbackFormat {
    Png,
    Svg,
}

impl FromStr for FallbackFormat {
    type Err = GeneratorError;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "png" => Ok(FallbackFormat::Png),
            "svg" | "svg+xml" => Ok(FallbackFormat::Svg),
            other => Err(GeneratorError::ConfigError(format!(
                "FALLBACK_FORMAT must be png or svg, got '{}'",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FallbackStyle {
    /// Background colour picked from colour names in the prompt
    Palette,
    /// Fixed dark background with accent frame and circles
    Dark,
}

impl FromStr for FallbackStyle {
    type Err = GeneratorError;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "palette" => Ok(FallbackStyle::Palette),
            "dark" => Ok(FallbackStyle::Dark),
            other => Err(GeneratorError::ConfigError(format!(
                "FALLBACK_STYLE must be palette or dark, got '{}'",
                other
            ))),
        }
    }
}

/// What `/generate` does when every remote backend failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Render the placeholder and answer 200.
    Fallback,
    /// Answer 500 with a descriptive detail.
    Error,
}

impl FromStr for FailurePolicy {
    type Err = GeneratorError;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "fallback" => Ok(FailurePolicy::Fallback),
            "error" => Ok(FailurePolicy::Error),
            other => Err(GeneratorError::ConfigError(format!(
                "BACKEND_FAILURE_POLICY must be fallback or error, got '{}'",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ProdiaConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
}

impl Default for ProdiaConfig {
    fn default() -> Self {
        ProdiaConfig {
            api_key: None,
            base_url: "https://api.prodia.com/v1".to_string(),
            model: "dreamshaper_8_93211.safetensors [b5c85b7cce]".to_string(),
        }
    }
}

impl ProdiaConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_credentials(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

#[derive(Debug, Clone)]
pub struct PollinationsConfig {
    pub base_url: String,
}

impl Default for PollinationsConfig {
    fn default() -> Self {
        PollinationsConfig {
            base_url: "https://image.pollinations.ai".to_string(),
        }
    }
}

impl PollinationsConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

#[derive(Debug, Clone)]
pub struct GeminiConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        GeminiConfig {
            api_key: None,
            base_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            model: "gemini-2.0-flash-preview-image-generation".to_string(),
        }
    }
}

impl GeminiConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_credentials(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

#[derive(Debug, Clone)]
pub struct PollingConfig {
    pub interval: Duration,
    pub max_attempts: u32,
}

impl Default for PollingConfig {
    fn default() -> Self {
        PollingConfig {
            interval: Duration::from_secs(1),
            max_attempts: 30,
        }
    }
}

/// Process-wide settings, loaded once at startup and read-only afterwards.
///
/// `Config::default()` enables no remote backend, so every request goes straight to the
/// placeholder renderer. `from_env` enables `DEFAULT_BACKENDS` unless told otherwise.
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub environment: Environment,
    pub backends: Vec<BackendKind>,
    pub prodia: ProdiaConfig,
    pub pollinations: PollinationsConfig,
    pub gemini: GeminiConfig,
    pub polling: PollingConfig,
    pub request_timeout: Duration,
    pub fallback_format: FallbackFormat,
    pub fallback_style: FallbackStyle,
    pub failure_policy: FailurePolicy,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            host: "0.0.0.0".to_string(),
            port: 8000,
            environment: Environment::Development,
            backends: Vec::new(),
            prodia: ProdiaConfig::default(),
            pollinations: PollinationsConfig::default(),
            gemini: GeminiConfig::default(),
            polling: PollingConfig::default(),
            request_timeout: Duration::from_secs(60),
            fallback_format: FallbackFormat::Png,
            fallback_style: FallbackStyle::Palette,
            failure_policy: FailurePolicy::Fallback,
        }
    }
}

fn parse_var<T: FromStr>(name: &str, value: Option<String>) -> Result<Option<T>> {
    match value {
        Some(raw) => raw.trim().parse::<T>().map(Some).map_err(|_| {
            GeneratorError::ConfigError(format!("{} has an invalid value: '{}'", name, raw))
        }),
        None => Ok(None),
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

pub fn parse_backend_list(raw: &str) -> Result<Vec<BackendKind>> {
    let raw = raw.trim();
    if raw.is_empty() || raw.eq_ignore_ascii_case("none") {
        return Ok(Vec::new());
    }

    let mut backends = Vec::new();
    for name in raw.split(',').filter(|name| !name.trim().is_empty()) {
        let kind: BackendKind = name.parse()?;
        if !backends.contains(&kind) {
            backends.push(kind);
        }
    }
    Ok(backends)
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads the process environment and validates the result.
    pub fn from_env() -> Result<Self> {
        Self::from_vars(|key| env::var(key).ok())
    }

    /// Builds a config from an arbitrary variable lookup.
    pub fn from_vars<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Config::default();

        let environment = lookup("APP_ENV")
            .map(|v| v.parse::<Environment>())
            .transpose()?
            .unwrap_or(defaults.environment);
        let backends =
            parse_backend_list(&lookup("IMAGE_BACKENDS").unwrap_or_else(|| DEFAULT_BACKENDS.into()))?;

        let prodia = ProdiaConfig {
            api_key: non_empty(lookup("PRODIA_API_KEY")),
            base_url: lookup("PRODIA_BASE_URL").unwrap_or(defaults.prodia.base_url),
            model: lookup("PRODIA_MODEL").unwrap_or(defaults.prodia.model),
        };
        let pollinations = PollinationsConfig {
            base_url: lookup("POLLINATIONS_BASE_URL").unwrap_or(defaults.pollinations.base_url),
        };
        let gemini = GeminiConfig {
            api_key: non_empty(lookup("GEMINI_API_KEY")),
            base_url: lookup("GEMINI_BASE_URL").unwrap_or(defaults.gemini.base_url),
            model: lookup("GEMINI_MODEL").unwrap_or(defaults.gemini.model),
        };

        let polling = PollingConfig {
            interval: parse_var::<u64>("POLL_INTERVAL_MS", lookup("POLL_INTERVAL_MS"))?
                .map(Duration::from_millis)
                .unwrap_or(defaults.polling.interval),
            max_attempts: parse_var("POLL_MAX_ATTEMPTS", lookup("POLL_MAX_ATTEMPTS"))?
                .unwrap_or(defaults.polling.max_attempts),
        };

        let config = Config {
            host: lookup("HOST").unwrap_or(defaults.host),
            port: parse_var("PORT", lookup("PORT"))?.unwrap_or(defaults.port),
            environment,
            backends,
            prodia,
            pollinations,
            gemini,
            polling,
            request_timeout: parse_var::<u64>("REQUEST_TIMEOUT_SECS", lookup("REQUEST_TIMEOUT_SECS"))?
                .map(Duration::from_secs)
                .unwrap_or(defaults.request_timeout),
            fallback_format: lookup("FALLBACK_FORMAT")
                .map(|v| v.parse::<FallbackFormat>())
                .transpose()?
                .unwrap_or(defaults.fallback_format),
            fallback_style: lookup("FALLBACK_STYLE")
                .map(|v| v.parse::<FallbackStyle>())
                .transpose()?
                .unwrap_or(defaults.fallback_style),
            failure_policy: lookup("BACKEND_FAILURE_POLICY")
                .map(|v| v.parse::<FailurePolicy>())
                .transpose()?
                .unwrap_or(defaults.failure_policy),
        };

        config.validate()?;
        Ok(config)
    }

    /// Fails when an enabled backend is missing its credentials. There is no shared default key.
    pub fn validate(&self) -> Result<()> {
        if self.backends.contains(&BackendKind::Prodia) && self.prodia.api_key.is_none() {
            return Err(GeneratorError::ConfigError(
                "PRODIA_API_KEY is required when the prodia backend is enabled".into(),
            ));
        }
        if self.backends.contains(&BackendKind::Gemini) && self.gemini.api_key.is_none() {
            return Err(GeneratorError::ConfigError(
                "GEMINI_API_KEY is required when the gemini backend is enabled".into(),
            ));
        }
        if self.polling.max_attempts == 0 {
            return Err(GeneratorError::ConfigError(
                "POLL_MAX_ATTEMPTS must be at least 1".into(),
            ));
        }
        Ok(())
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn with_backends(mut self, backends: Vec<BackendKind>) -> Self {
        self.backends = backends;
        self
    }

    pub fn with_prodia(mut self, config: ProdiaConfig) -> Self {
        self.prodia = config;
        self
    }

    pub fn with_pollinations(mut self, config: PollinationsConfig) -> Self {
        self.pollinations = config;
        self
    }

    pub fn with_gemini(mut self, config: GeminiConfig) -> Self {
        self.gemini = config;
        self
    }

    pub fn with_polling(mut self, interval: Duration, max_attempts: u32) -> Self {
        self.polling = PollingConfig {
            interval,
            max_attempts,
        };
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_fallback(mut self, format: FallbackFormat, style: FallbackStyle) -> Self {
        self.fallback_format = format;
        self.fallback_style = style;
        self
    }

    pub fn with_failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.failure_policy = policy;
        self
    }
}
