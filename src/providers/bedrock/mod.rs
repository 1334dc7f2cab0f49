pub mod image_client;
pub mod text_client;

use crate::{config::BedrockConfig, error::Result};
use aws_sdk_bedrockruntime::error::ProvideErrorMetadata;
use aws_sdk_bedrockruntime::Client;

pub use image_client::ImageClient;
pub use text_client::TextClient;

use crate::error::CoverError;

#[derive(Clone)]
pub struct BedrockClient {
    text_client: TextClient,
    image_client: ImageClient,
}

impl BedrockClient {
    pub async fn new(bedrock_config: BedrockConfig) -> Result<Self> {
        let region = aws_sdk_bedrockruntime::config::Region::new(bedrock_config.region().to_string());

        let aws_config = if let (Some(access_key), Some(secret_key)) =
            (&bedrock_config.access_key, &bedrock_config.secret_key)
        {
            aws_config::from_env()
                .credentials_provider(aws_sdk_bedrockruntime::config::Credentials::new(
                    access_key,
                    secret_key,
                    None,
                    None,
                    "rcover",
                ))
                .region(region)
                .load()
                .await
        } else {
            let mut loader = aws_config::from_env().region(region);
            if let Some(profile) = &bedrock_config.profile {
                loader = loader.profile_name(profile);
            }
            loader.load().await
        };

        let client = Client::new(&aws_config);
        log::info!("Bedrock client ready in {}", bedrock_config.region());

        Ok(Self {
            text_client: TextClient::new(client.clone(), bedrock_config.text_model()),
            image_client: ImageClient::new(client, bedrock_config.image_model()),
        })
    }

    pub fn text(&self) -> &TextClient {
        &self.text_client
    }

    pub fn image(&self) -> &ImageClient {
        &self.image_client
    }
}

/// Map an SDK error to ours, keeping the service code and message when there is one.
pub(crate) fn sdk_error<E, R>(e: aws_sdk_bedrockruntime::error::SdkError<E, R>) -> CoverError
where
    E: ProvideErrorMetadata + std::error::Error + 'static,
    R: std::fmt::Debug,
{
    if let Some(service_error) = e.as_service_error() {
        log::error!("Service error code: {:?}", service_error.code());
        log::error!("Service error message: {:?}", service_error.message());
        CoverError::AwsServiceError(format!(
            "Bedrock service error: {} - {}",
            service_error.code().unwrap_or("unknown"),
            service_error.message().unwrap_or("no message")
        ))
    } else {
        CoverError::AwsError(format!("AWS SDK error: {}", e))
    }
}
