use super::{ImageQuality, ImageSize};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageGenerationRequest {
    pub prompt: String,
    pub quality: ImageQuality,
    pub size: ImageSize,
    pub count: u32,
    pub model_id: Option<String>,
}

impl ImageGenerationRequest {
    pub fn new(prompt: impl Into<String>, quality: ImageQuality, size: ImageSize) -> Self {
        Self {
            prompt: prompt.into(),
            quality,
            size,
            count: 1,
            model_id: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImageGenerationResponse {
    pub image_data: String, // Base64 encoded
    pub model: String,
}

// OpenAI-compatible images wire format.

#[derive(Debug, Serialize)]
pub struct OpenAiImageRequest<'a> {
    pub model: &'a str,
    pub prompt: &'a str,
    pub size: &'a str,
    pub quality: &'a str,
    pub n: u32,
}

#[derive(Debug, Deserialize)]
pub struct OpenAiImageResponse {
    pub data: Vec<OpenAiImageData>,
}

#[derive(Debug, Deserialize)]
pub struct OpenAiImageData {
    pub b64_json: Option<String>,
}

#[derive(Serialize, Deserialize)]
pub struct TitanImageResponse {
    pub images: Vec<String>,
}
