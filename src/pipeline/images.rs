use crate::{
    error::{CoverError, GenerationFailure, Result, Stage},
    models::{Batch, CoverImage, DescriptionSet, ImageGenerationRequest, ImageQuality, ImageSet, ImageSize},
    providers::ImageGenerator,
    throttle::Throttle,
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use std::sync::Arc;

/// Wrap a description in book-cover framing for the image model.
pub fn cover_prompt(title: &str, description: &str) -> String {
    format!(
        "Book cover design for the book titled \"{}\".\n\
         {}\n\
         The image should have the composition and style of a professional book cover \
         with space for title and author text.",
        title, description
    )
}

pub struct CoverImageGenerator {
    images: Arc<dyn ImageGenerator>,
    throttle: Arc<dyn Throttle>,
}

impl CoverImageGenerator {
    pub fn new(images: Arc<dyn ImageGenerator>, throttle: Arc<dyn Throttle>) -> Self {
        Self { images, throttle }
    }

    /// One image per (title, description) pair. Pairs that fail are left out
    /// and reported; the batch itself always completes.
    pub async fn generate(
        &self,
        descriptions: &DescriptionSet,
        quality: ImageQuality,
        size: ImageSize,
    ) -> Batch<CoverImage> {
        let mut images = ImageSet::new();
        let mut failures = Vec::new();
        let mut first_request = true;

        for (title, title_descriptions) in descriptions.iter() {
            let slot = images.insert_title(title);

            for (index, description) in title_descriptions.iter().enumerate() {
                if !first_request {
                    self.throttle.pace().await;
                }
                first_request = false;

                let variation = index + 1;
                log::info!("Generating image {} for '{}'", variation, title);

                match self.render_one(title, description, quality, size).await {
                    Ok(bytes) => slot.push(CoverImage {
                        bytes,
                        description: description.clone(),
                    }),
                    Err(e) => {
                        let failure = GenerationFailure::new(Stage::Image, title, variation, &e);
                        log::warn!("{}", failure);
                        failures.push(failure);
                    }
                }
            }
        }

        Batch {
            items: images,
            failures,
        }
    }

    async fn render_one(
        &self,
        title: &str,
        description: &str,
        quality: ImageQuality,
        size: ImageSize,
    ) -> Result<Vec<u8>> {
        let request = ImageGenerationRequest::new(cover_prompt(title, description), quality, size);
        let response = self.images.render(request).await?;

        STANDARD
            .decode(response.image_data.trim())
            .map_err(|e| CoverError::ResponseError(format!("image payload is not valid base64: {}", e)))
    }
}
