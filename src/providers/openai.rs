use crate::{
    config::OpenAiConfig,
    error::{CoverError, Result},
    models::{
        ChatCompletionRequest, ChatCompletionResponse, ChatMessage, ImageGenerationRequest,
        ImageGenerationResponse, OpenAiImageRequest, OpenAiImageResponse, TextGenerationRequest,
    },
    providers::{ImageGenerator, TextGenerator},
};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(180);

/// Client for OpenAI-compatible `/chat/completions` and `/images/generations` endpoints.
#[derive(Clone)]
pub struct OpenAiClient {
    http: reqwest::Client,
    config: OpenAiConfig,
    api_key: String,
}

impl OpenAiClient {
    pub fn new(config: OpenAiConfig) -> Result<Self> {
        let api_key = config.api_key.clone().ok_or_else(|| {
            CoverError::MissingCredential("an OpenAI API key is required (set OPENAI_API_KEY)".into())
        })?;

        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| CoverError::ConfigError(format!("could not build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            config,
            api_key,
        })
    }

    async fn post<B, R>(&self, endpoint: &str, body: &B) -> Result<R>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let url = format!("{}/{}", self.config.base_url(), endpoint);
        log::debug!("POST {}", url);

        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = error_message(&body);
            log::error!("{} returned {}: {}", endpoint, status, message);
            return Err(CoverError::ProviderError {
                status: status.as_u16(),
                message,
            });
        }

        let bytes = response.bytes().await?;
        serde_json::from_slice(&bytes).map_err(|e| CoverError::ResponseError(e.to_string()))
    }
}

#[async_trait]
impl TextGenerator for OpenAiClient {
    async fn complete(&self, request: TextGenerationRequest) -> Result<String> {
        let model = request
            .model_id
            .as_deref()
            .unwrap_or_else(|| self.config.text_model());

        let body = ChatCompletionRequest {
            model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: &request.system_prompt,
                },
                ChatMessage {
                    role: "user",
                    content: &request.user_prompt,
                },
            ],
            temperature: request.temperature,
            max_tokens: request.max_tokens,
        };

        log::info!("Invoking model: {}", model);
        let response: ChatCompletionResponse = self.post("chat/completions", &body).await?;

        response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or_else(|| CoverError::ResponseError("completion contained no text".into()))
    }
}

#[async_trait]
impl ImageGenerator for OpenAiClient {
    async fn render(&self, request: ImageGenerationRequest) -> Result<ImageGenerationResponse> {
        let model = request
            .model_id
            .as_deref()
            .unwrap_or_else(|| self.config.image_model());

        let body = OpenAiImageRequest {
            model,
            prompt: &request.prompt,
            size: request.size.as_str(),
            quality: request.quality.as_str(),
            n: request.count,
        };

        log::info!("Generating image with model: {}", model);
        let response: OpenAiImageResponse = self.post("images/generations", &body).await?;

        let image_data = response
            .data
            .into_iter()
            .next()
            .and_then(|image| image.b64_json)
            .ok_or_else(|| CoverError::ResponseError("No images generated".into()))?;

        Ok(ImageGenerationResponse {
            image_data,
            model: model.to_string(),
        })
    }
}

/// Pull `error.message` out of an OpenAI error body, or fall back to the raw body.
fn error_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|value| value["error"]["message"].as_str().map(String::from))
        .unwrap_or_else(|| body.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ImageQuality, ImageSize};
    use serde_json::json;
    use wiremock::{
        matchers::{header, method, path},
        Mock, MockServer, ResponseTemplate,
    };

    async fn client(server: &MockServer) -> OpenAiClient {
        OpenAiClient::new(
            OpenAiConfig::new()
                .with_api_key("sk-test")
                .with_base_url(server.uri()),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_chat_completion() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(header("authorization", "Bearer sk-test"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{ "message": { "role": "assistant", "content": "A red fox on teal." } }]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let request = TextGenerationRequest::new("be brief", "cover for 'Fox'").with_temperature(0.9);
        let text = client(&server).await.complete(request).await.unwrap();
        assert_eq!(text, "A red fox on teal.");

        let received = server.received_requests().await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&received[0].body).unwrap();
        assert_eq!(body["model"], "gpt-4o");
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][0]["content"], "be brief");
        assert_eq!(body["messages"][1]["content"], "cover for 'Fox'");
        assert!((body["temperature"].as_f64().unwrap() - 0.9).abs() < 1e-6);
    }

    #[tokio::test]
    async fn test_image_generation() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/images/generations"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": [{ "b64_json": "iVBORw0KGgo=" }]
            })))
            .mount(&server)
            .await;

        let request = ImageGenerationRequest::new("a fox", ImageQuality::High, ImageSize::Portrait);
        let response = client(&server).await.render(request).await.unwrap();
        assert_eq!(response.image_data, "iVBORw0KGgo=");
        assert_eq!(response.model, "gpt-image-1");

        let received = server.received_requests().await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&received[0].body).unwrap();
        assert_eq!(body["size"], "1024x1536");
        assert_eq!(body["quality"], "high");
        assert_eq!(body["n"], 1);
    }

    #[tokio::test]
    async fn test_provider_error_detail_is_kept() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/images/generations"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "error": { "message": "Your request was rejected by the safety system." }
            })))
            .mount(&server)
            .await;

        let request = ImageGenerationRequest::new("a fox", ImageQuality::Low, ImageSize::Auto);
        let err = client(&server).await.render(request).await.unwrap_err();
        match err {
            CoverError::ProviderError { status, message } => {
                assert_eq!(status, 400);
                assert_eq!(message, "Your request was rejected by the safety system.");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_empty_completion_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "choices": [] })))
            .mount(&server)
            .await;

        let err = client(&server)
            .await
            .complete(TextGenerationRequest::new("s", "u"))
            .await
            .unwrap_err();
        assert!(matches!(err, CoverError::ResponseError(_)));
    }

    #[test]
    fn test_missing_key() {
        assert!(matches!(
            OpenAiClient::new(OpenAiConfig::new()),
            Err(CoverError::MissingCredential(_))
        ));
    }

    #[test]
    fn test_error_message_fallback() {
        assert_eq!(error_message("upstream timeout\n"), "upstream timeout");
    }
}
