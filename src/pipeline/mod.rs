//! The generation pipeline: titles → descriptions → images → files.
//!
//! Stages run strictly one after another. All description requests finish
//! before the first image request is sent, and nothing runs in parallel.
//! Item-level failures are collected in [`RunReport::warnings`]; only the
//! pre-checks (empty input, missing credentials) reject a run.

pub mod descriptions;
pub mod images;
pub mod persist;

use crate::{
    config::Config,
    error::{CoverError, GenerationFailure, Result},
    logger,
    models::{parse_titles, DescriptionSet, GenerationConfig, ImageSet},
    providers::Providers,
    throttle::{FixedDelay, Throttle},
};
use chrono::{DateTime, Utc};
use std::path::PathBuf;
use std::sync::Arc;
use uuid::Uuid;

pub use descriptions::DescriptionGenerator;
pub use images::CoverImageGenerator;

/// Everything one completed run produced.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub config: GenerationConfig,
    pub descriptions: DescriptionSet,
    pub images: ImageSet,
    pub warnings: Vec<GenerationFailure>,
    pub output_dir: PathBuf,
}

impl RunReport {
    pub fn is_complete(&self) -> bool {
        self.warnings.is_empty()
    }
}

pub struct CoverPipeline {
    descriptions: DescriptionGenerator,
    images: CoverImageGenerator,
    output_dir: PathBuf,
}

impl CoverPipeline {
    pub fn with_throttles(
        providers: Providers,
        output_dir: impl Into<PathBuf>,
        text_throttle: Arc<dyn Throttle>,
        image_throttle: Arc<dyn Throttle>,
    ) -> Self {
        Self {
            descriptions: DescriptionGenerator::new(providers.text, text_throttle),
            images: CoverImageGenerator::new(providers.image, image_throttle),
            output_dir: output_dir.into(),
        }
    }

    /// Pipeline wired from settings: output directory and pacing intervals.
    pub fn from_config(providers: Providers, config: &Config) -> Self {
        Self::with_throttles(
            providers,
            config.output_dir(),
            Arc::new(FixedDelay::new(config.text_delay())),
            Arc::new(FixedDelay::new(config.image_delay())),
        )
    }

    pub fn output_dir(&self) -> &PathBuf {
        &self.output_dir
    }

    pub async fn run(&self, config: &GenerationConfig) -> Result<RunReport> {
        let titles = normalized_titles(&config.book_titles)?;
        let run_id = Uuid::new_v4();
        let started_at = Utc::now();
        logger::set_run_id(Some(run_id));

        log::info!(
            "Generating covers for {} book(s), {} variation(s) each",
            titles.len(),
            config.variation_count
        );
        if config.uses_custom_prompt() {
            log::info!("Using custom description generation prompt");
        }

        let result = self.execute(&titles, config).await;
        logger::set_run_id(None);
        let (descriptions, images, warnings) = result?;

        Ok(RunReport {
            run_id,
            started_at,
            config: GenerationConfig {
                book_titles: titles,
                ..config.clone()
            },
            descriptions,
            images,
            warnings,
            output_dir: self.output_dir.clone(),
        })
    }

    async fn execute(
        &self,
        titles: &[String],
        config: &GenerationConfig,
    ) -> Result<(DescriptionSet, ImageSet, Vec<GenerationFailure>)> {
        let description_batch = {
            let _timer = logger::timer("description generation");
            self.descriptions
                .generate(titles, config.variation_count, config.effective_system_prompt())
                .await
        };

        let image_batch = {
            let _timer = logger::timer("image generation");
            self.images
                .generate(&description_batch.items, config.image_quality, config.image_size)
                .await
        };

        let saved_to = persist::save(&image_batch.items, &self.output_dir)?;
        log::info!(
            "Saved {} cover(s) to '{}'",
            image_batch.items.item_count(),
            saved_to.display()
        );

        let mut warnings = description_batch.failures;
        warnings.extend(image_batch.failures);
        if !warnings.is_empty() {
            log::warn!("{} item(s) failed during this run", warnings.len());
        }

        Ok((description_batch.items, image_batch.items, warnings))
    }
}

/// Trim titles and drop blank ones; an empty result rejects the run.
pub fn normalized_titles(titles: &[String]) -> Result<Vec<String>> {
    let titles = parse_titles(&titles.join("\n"));
    if titles.is_empty() {
        return Err(CoverError::EmptyInput);
    }
    Ok(titles)
}
