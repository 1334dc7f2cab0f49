use super::sdk_error;
use crate::{
    error::{CoverError, Result},
    models::{ModelProvider, TextGenerationRequest},
    providers::TextGenerator,
};
use async_trait::async_trait;
use aws_sdk_bedrockruntime::{primitives::Blob, Client};
use serde_json::{json, Value};

const DEFAULT_MAX_TOKENS: i32 = 512;

#[derive(Clone)]
pub struct TextClient {
    client: Client,
    default_model: String,
}

impl TextClient {
    pub fn new(client: Client, default_model: impl Into<String>) -> Self {
        Self {
            client,
            default_model: default_model.into(),
        }
    }

    pub async fn generate(&self, request: TextGenerationRequest) -> Result<String> {
        let model_id = request
            .model_id
            .clone()
            .unwrap_or_else(|| self.default_model.clone());

        let request_payload = build_request_payload(&request, &model_id)?;
        let request_json = serde_json::to_string(&request_payload)
            .map_err(|e| CoverError::SerializationError(e.to_string()))?;

        log::info!("Invoking model: {}", model_id);
        log::debug!("Text generation request payload: {}", request_json);

        let response = self
            .client
            .invoke_model()
            .model_id(&model_id)
            .content_type("application/json")
            .accept("application/json")
            .body(Blob::new(request_json.into_bytes()))
            .send()
            .await
            .map_err(|e| {
                log::error!("Bedrock text generation failed: {:?}", e);
                sdk_error(e)
            })?;

        let body: Value = serde_json::from_slice(response.body.as_ref())
            .map_err(|e| CoverError::ResponseError(e.to_string()))?;
        parse_completion(&body, &model_id)
    }
}

#[async_trait]
impl TextGenerator for TextClient {
    async fn complete(&self, request: TextGenerationRequest) -> Result<String> {
        self.generate(request).await
    }
}

/// Request body per model family. Families without a system field get the
/// system prompt prepended to the user prompt.
pub(crate) fn build_request_payload(request: &TextGenerationRequest, model_id: &str) -> Result<Value> {
    let max_tokens = request.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS);
    let provider = ModelProvider::from_model_id(model_id).ok_or_else(|| {
        CoverError::RequestError(format!("Unsupported model ID: {}", model_id))
    })?;
    let inline_prompt = format!("{}\n\n{}", request.system_prompt, request.user_prompt);

    let payload = match provider {
        ModelProvider::Anthropic => json!({
            "system": request.system_prompt,
            "messages": [
                {
                    "role": "user",
                    "content": request.user_prompt
                }
            ],
            "max_tokens": max_tokens,
            "temperature": request.temperature,
            "anthropic_version": "bedrock-2023-05-31"
        }),
        ModelProvider::Amazon => json!({
            "inputText": inline_prompt,
            "textGenerationConfig": {
                "maxTokenCount": max_tokens,
                "temperature": request.temperature,
                "topP": 0.9
            }
        }),
        ModelProvider::Meta => json!({
            "prompt": inline_prompt,
            "max_gen_len": max_tokens,
            "temperature": request.temperature,
            "top_p": 0.9
        }),
        ModelProvider::Mistral => json!({
            "prompt": format!("<s>[INST] {} [/INST]", inline_prompt),
            "max_tokens": max_tokens,
            "temperature": request.temperature,
            "top_p": 0.9
        }),
    };

    Ok(payload)
}

pub(crate) fn parse_completion(body: &Value, model_id: &str) -> Result<String> {
    let text = match ModelProvider::from_model_id(model_id) {
        Some(ModelProvider::Anthropic) => body["content"]
            .as_array()
            .map(|blocks| {
                blocks
                    .iter()
                    .filter_map(|block| block["text"].as_str())
                    .collect::<Vec<_>>()
                    .join("")
            }),
        Some(ModelProvider::Amazon) => body["results"][0]["outputText"].as_str().map(String::from),
        Some(ModelProvider::Meta) => body["generation"].as_str().map(String::from),
        Some(ModelProvider::Mistral) => body["outputs"][0]["text"].as_str().map(String::from),
        None => None,
    };

    text.map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .ok_or_else(|| CoverError::ResponseError(format!("No completion text in {} response", model_id)))
}
