use crate::error::{CoverError, Result};
use std::env;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_OUTPUT_DIR: &str = "generated_covers";
pub const DEFAULT_SHARE_BASE_URL: &str = "http://localhost:8501";
pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_OPENAI_TEXT_MODEL: &str = "gpt-4o";
pub const DEFAULT_OPENAI_IMAGE_MODEL: &str = "gpt-image-1";
pub const DEFAULT_BEDROCK_REGION: &str = "us-east-1";
pub const DEFAULT_BEDROCK_TEXT_MODEL: &str = "anthropic.claude-3-haiku-20240307-v1:0";
pub const DEFAULT_BEDROCK_IMAGE_MODEL: &str = "amazon.titan-image-generator-v1";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProviderKind {
    #[default]
    OpenAi,
    Bedrock,
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderKind::OpenAi => write!(f, "openai"),
            ProviderKind::Bedrock => write!(f, "bedrock"),
        }
    }
}

impl FromStr for ProviderKind {
    type Err = CoverError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "openai" => Ok(ProviderKind::OpenAi),
            "bedrock" => Ok(ProviderKind::Bedrock),
            other => Err(CoverError::ConfigError(format!(
                "unknown provider '{}' (expected openai or bedrock)",
                other
            ))),
        }
    }
}

#[derive(Clone, Default)]
pub struct OpenAiConfig {
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub text_model: Option<String>,
    pub image_model: Option<String>,
}

impl fmt::Debug for OpenAiConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenAiConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("base_url", &self.base_url)
            .field("text_model", &self.text_model)
            .field("image_model", &self.image_model)
            .finish()
    }
}

impl OpenAiConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        OpenAiConfig {
            api_key: non_blank(lookup("OPENAI_API_KEY")),
            base_url: non_blank(lookup("OPENAI_BASE_URL")),
            text_model: non_blank(lookup("OPENAI_TEXT_MODEL")),
            image_model: non_blank(lookup("OPENAI_IMAGE_MODEL")),
        }
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn with_models(mut self, text_model: impl Into<String>, image_model: impl Into<String>) -> Self {
        self.text_model = Some(text_model.into());
        self.image_model = Some(image_model.into());
        self
    }

    pub fn base_url(&self) -> &str {
        self.base_url
            .as_deref()
            .unwrap_or(DEFAULT_OPENAI_BASE_URL)
            .trim_end_matches('/')
    }

    pub fn text_model(&self) -> &str {
        self.text_model.as_deref().unwrap_or(DEFAULT_OPENAI_TEXT_MODEL)
    }

    pub fn image_model(&self) -> &str {
        self.image_model.as_deref().unwrap_or(DEFAULT_OPENAI_IMAGE_MODEL)
    }
}

#[derive(Clone, Default)]
pub struct BedrockConfig {
    pub region: Option<String>,
    pub access_key: Option<String>,
    pub secret_key: Option<String>,
    pub profile: Option<String>,
    pub text_model: Option<String>,
    pub image_model: Option<String>,
}

impl fmt::Debug for BedrockConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BedrockConfig")
            .field("region", &self.region)
            .field("access_key", &self.access_key.as_ref().map(|_| "<redacted>"))
            .field("secret_key", &self.secret_key.as_ref().map(|_| "<redacted>"))
            .field("profile", &self.profile)
            .field("text_model", &self.text_model)
            .field("image_model", &self.image_model)
            .finish()
    }
}

impl BedrockConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        BedrockConfig {
            region: non_blank(lookup("AWS_REGION")).or_else(|| non_blank(lookup("AWS_DEFAULT_REGION"))),
            access_key: non_blank(lookup("AWS_ACCESS_KEY_ID")),
            secret_key: non_blank(lookup("AWS_SECRET_ACCESS_KEY")),
            profile: non_blank(lookup("AWS_PROFILE")),
            text_model: non_blank(lookup("BEDROCK_TEXT_MODEL")),
            image_model: non_blank(lookup("BEDROCK_IMAGE_MODEL")),
        }
    }

    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }

    pub fn with_credentials(
        mut self,
        access_key: impl Into<String>,
        secret_key: impl Into<String>,
    ) -> Self {
        self.access_key = Some(access_key.into());
        self.secret_key = Some(secret_key.into());
        self
    }

    pub fn with_profile(mut self, profile: impl Into<String>) -> Self {
        self.profile = Some(profile.into());
        self
    }

    pub fn region(&self) -> &str {
        self.region.as_deref().unwrap_or(DEFAULT_BEDROCK_REGION)
    }

    pub fn text_model(&self) -> &str {
        self.text_model.as_deref().unwrap_or(DEFAULT_BEDROCK_TEXT_MODEL)
    }

    pub fn image_model(&self) -> &str {
        self.image_model.as_deref().unwrap_or(DEFAULT_BEDROCK_IMAGE_MODEL)
    }

    pub fn has_credentials(&self) -> bool {
        (self.access_key.is_some() && self.secret_key.is_some()) || self.profile.is_some()
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub provider: ProviderKind,
    pub output_dir: Option<PathBuf>,
    pub share_base_url: Option<String>,
    pub text_delay_ms: Option<u64>,
    pub image_delay_ms: Option<u64>,
    pub openai: OpenAiConfig,
    pub bedrock: BedrockConfig,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            provider: ProviderKind::OpenAi,
            output_dir: None,
            share_base_url: None,
            text_delay_ms: None,
            image_delay_ms: None,
            openai: OpenAiConfig::default(),
            bedrock: BedrockConfig::default(),
        }
    }
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let provider = match non_blank(lookup("RCOVER_PROVIDER")) {
            Some(value) => value.parse()?,
            None => ProviderKind::default(),
        };

        Ok(Config {
            provider,
            output_dir: non_blank(lookup("RCOVER_OUTPUT_DIR")).map(PathBuf::from),
            share_base_url: non_blank(lookup("SHARE_BASE_URL")),
            text_delay_ms: parse_millis("RCOVER_TEXT_DELAY_MS", lookup("RCOVER_TEXT_DELAY_MS"))?,
            image_delay_ms: parse_millis("RCOVER_IMAGE_DELAY_MS", lookup("RCOVER_IMAGE_DELAY_MS"))?,
            openai: OpenAiConfig::from_lookup(&lookup),
            bedrock: BedrockConfig::from_lookup(&lookup),
        })
    }

    pub fn with_provider(mut self, provider: ProviderKind) -> Self {
        self.provider = provider;
        self
    }

    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = Some(dir.into());
        self
    }

    pub fn with_openai(mut self, config: OpenAiConfig) -> Self {
        self.openai = config;
        self
    }

    pub fn with_bedrock(mut self, config: BedrockConfig) -> Self {
        self.bedrock = config;
        self
    }

    pub fn with_delays(mut self, text: Duration, image: Duration) -> Self {
        self.text_delay_ms = Some(text.as_millis() as u64);
        self.image_delay_ms = Some(image.as_millis() as u64);
        self
    }

    pub fn output_dir(&self) -> PathBuf {
        self.output_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_DIR))
    }

    pub fn share_base_url(&self) -> &str {
        self.share_base_url.as_deref().unwrap_or(DEFAULT_SHARE_BASE_URL)
    }

    pub fn text_delay(&self) -> Duration {
        self.text_delay_ms
            .map(Duration::from_millis)
            .unwrap_or(crate::throttle::TEXT_REQUEST_DELAY)
    }

    pub fn image_delay(&self) -> Duration {
        self.image_delay_ms
            .map(Duration::from_millis)
            .unwrap_or(crate::throttle::IMAGE_REQUEST_DELAY)
    }

    /// Fails with [`CoverError::MissingCredential`] when the selected provider cannot authenticate.
    pub fn require_credentials(&self) -> Result<()> {
        match self.provider {
            ProviderKind::OpenAi if self.openai.api_key.is_none() => Err(
                CoverError::MissingCredential("an OpenAI API key is required (set OPENAI_API_KEY)".into()),
            ),
            ProviderKind::Bedrock if !self.bedrock.has_credentials() => {
                Err(CoverError::MissingCredential(
                    "AWS credentials are required (set AWS_ACCESS_KEY_ID and AWS_SECRET_ACCESS_KEY, or AWS_PROFILE)".into(),
                ))
            }
            _ => Ok(()),
        }
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn parse_millis(key: &str, value: Option<String>) -> Result<Option<u64>> {
    match non_blank(value) {
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| CoverError::ConfigError(format!("{} must be a number of milliseconds, got '{}'", key, raw))),
        None => Ok(None),
    }
}
