//! Text and image generation capabilities.
//!
//! The pipeline only sees the two traits below. Concrete providers live in
//! submodules and are picked at startup from [`Config::provider`].

pub mod bedrock;
pub mod openai;

use crate::{
    config::{Config, ProviderKind},
    error::Result,
    models::{ImageGenerationRequest, ImageGenerationResponse, TextGenerationRequest},
};
use async_trait::async_trait;
use std::sync::Arc;

pub use bedrock::BedrockClient;
pub use openai::OpenAiClient;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// One completion for one request.
    async fn complete(&self, request: TextGenerationRequest) -> Result<String>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ImageGenerator: Send + Sync {
    /// One image for one request, still base64-encoded.
    async fn render(&self, request: ImageGenerationRequest) -> Result<ImageGenerationResponse>;
}

/// Both halves of a provider.
#[derive(Clone)]
pub struct Providers {
    pub text: Arc<dyn TextGenerator>,
    pub image: Arc<dyn ImageGenerator>,
}

impl Providers {
    pub fn new(text: Arc<dyn TextGenerator>, image: Arc<dyn ImageGenerator>) -> Self {
        Self { text, image }
    }

    /// Build the configured provider. Credentials are checked before anything else.
    pub async fn connect(config: &Config) -> Result<Self> {
        config.require_credentials()?;

        match config.provider {
            ProviderKind::OpenAi => {
                let client = Arc::new(OpenAiClient::new(config.openai.clone())?);
                Ok(Self::new(client.clone(), client))
            }
            ProviderKind::Bedrock => {
                let client = BedrockClient::new(config.bedrock.clone()).await?;
                Ok(Self::new(
                    Arc::new(client.text().clone()),
                    Arc::new(client.image().clone()),
                ))
            }
        }
    }
}
