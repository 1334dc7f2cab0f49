use super::sdk_error;
use crate::{
    error::{CoverError, Result},
    models::{
        ImageGenerationRequest, ImageGenerationResponse, ImageQuality, ImageSize,
        TitanImageResponse,
    },
    providers::ImageGenerator,
};
use async_trait::async_trait;
use aws_sdk_bedrockruntime::{primitives::Blob, Client};
use serde_json::{json, Value};

#[derive(Clone)]
pub struct ImageClient {
    client: Client,
    default_model: String,
}

impl ImageClient {
    pub fn new(client: Client, default_model: impl Into<String>) -> Self {
        Self {
            client,
            default_model: default_model.into(),
        }
    }

    pub async fn generate(
        &self,
        request: ImageGenerationRequest,
    ) -> Result<ImageGenerationResponse> {
        let model_id = request
            .model_id
            .clone()
            .unwrap_or_else(|| self.default_model.clone());

        let request_payload = build_request_payload(&request, &model_id)?;
        let request_json = serde_json::to_string(&request_payload)
            .map_err(|e| CoverError::SerializationError(e.to_string()))?;

        log::info!("Generating image with model: {}", model_id);

        let response = self
            .client
            .invoke_model()
            .model_id(&model_id)
            .content_type("application/json")
            .accept("application/json")
            .body(Blob::new(request_json.into_bytes()))
            .send()
            .await
            .map_err(sdk_error)?;

        let titan_response: TitanImageResponse = serde_json::from_slice(response.body.as_ref())
            .map_err(|e| CoverError::ResponseError(e.to_string()))?;

        let image_data = titan_response
            .images
            .into_iter()
            .next()
            .ok_or_else(|| CoverError::ResponseError("No images generated".into()))?;

        Ok(ImageGenerationResponse {
            image_data,
            model: model_id,
        })
    }
}

#[async_trait]
impl ImageGenerator for ImageClient {
    async fn render(&self, request: ImageGenerationRequest) -> Result<ImageGenerationResponse> {
        self.generate(request).await
    }
}

pub(crate) fn build_request_payload(request: &ImageGenerationRequest, model_id: &str) -> Result<Value> {
    if !model_id.starts_with("amazon.titan-image-generator") {
        return Err(CoverError::RequestError(format!(
            "Unsupported image model: {}",
            model_id
        )));
    }

    let (width, height) = titan_dimensions(request.size);
    Ok(json!({
        "taskType": "TEXT_IMAGE",
        "textToImageParams": {
            "text": request.prompt
        },
        "imageGenerationConfig": {
            "numberOfImages": request.count,
            "quality": titan_quality(request.quality),
            "width": width,
            "height": height,
            "cfgScale": 8.0
        }
    }))
}

fn titan_quality(quality: ImageQuality) -> &'static str {
    match quality {
        ImageQuality::High => "premium",
        ImageQuality::Low | ImageQuality::Medium | ImageQuality::Auto => "standard",
    }
}

/// Titan only accepts a fixed list of sizes; pick the closest aspect ratio.
fn titan_dimensions(size: ImageSize) -> (u32, u32) {
    match size {
        ImageSize::Square | ImageSize::Auto => (1024, 1024),
        ImageSize::Portrait => (768, 1152),
        ImageSize::Landscape => (1152, 768),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_titan_payload() {
        let request = ImageGenerationRequest::new("a fox", ImageQuality::High, ImageSize::Portrait);
        let payload = build_request_payload(&request, "amazon.titan-image-generator-v1").unwrap();
        assert_eq!(payload["textToImageParams"]["text"], "a fox");
        assert_eq!(payload["imageGenerationConfig"]["quality"], "premium");
        assert_eq!(payload["imageGenerationConfig"]["width"], 768);
        assert_eq!(payload["imageGenerationConfig"]["height"], 1152);
        assert_eq!(payload["imageGenerationConfig"]["numberOfImages"], 1);
    }

    #[test]
    fn test_unsupported_image_model() {
        let request = ImageGenerationRequest::new("a fox", ImageQuality::Low, ImageSize::Auto);
        assert!(build_request_payload(&request, "stability.sd3-large-v1:0").is_err());
    }
}
