use crate::{
    error::{GenerationFailure, Stage},
    models::{Batch, DescriptionSet, TextGenerationRequest},
    providers::TextGenerator,
    throttle::Throttle,
};
use std::sync::Arc;

/// Sampling temperature for every description request.
pub const DESCRIPTION_TEMPERATURE: f32 = 0.9;

pub fn user_prompt(title: &str) -> String {
    format!("create a description for a cover for a book titled '{}'", title)
}

pub struct DescriptionGenerator {
    text: Arc<dyn TextGenerator>,
    throttle: Arc<dyn Throttle>,
}

impl DescriptionGenerator {
    pub fn new(text: Arc<dyn TextGenerator>, throttle: Arc<dyn Throttle>) -> Self {
        Self { text, throttle }
    }

    /// `variation_count` independent requests per title, one after another.
    ///
    /// Every title gets an entry even when all of its requests fail; failed
    /// slots are left out and reported in [`Batch::failures`].
    pub async fn generate(
        &self,
        titles: &[String],
        variation_count: u8,
        system_prompt: &str,
    ) -> Batch<String> {
        let mut descriptions = DescriptionSet::new();
        let mut failures = Vec::new();
        let mut first_request = true;

        for title in titles {
            log::info!("Generating {} descriptions for '{}'", variation_count, title);
            let prompt = user_prompt(title);
            let slot = descriptions.insert_title(title.clone());

            for variation in 1..=variation_count as usize {
                if !first_request {
                    self.throttle.pace().await;
                }
                first_request = false;

                let request = TextGenerationRequest::new(system_prompt, prompt.as_str())
                    .with_temperature(DESCRIPTION_TEMPERATURE);

                match self.text.complete(request).await {
                    Ok(description) => slot.push(description),
                    Err(e) => {
                        let failure = GenerationFailure::new(Stage::Description, title, variation, &e);
                        log::warn!("{}", failure);
                        failures.push(failure);
                    }
                }
            }
        }

        Batch {
            items: descriptions,
            failures,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CoverError;
    use crate::providers::MockTextGenerator;
    use crate::throttle::FixedDelay;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingThrottle(AtomicUsize);

    #[async_trait]
    impl Throttle for CountingThrottle {
        async fn pace(&self) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn titles(names: &[&str]) -> Vec<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    fn generator(mock: MockTextGenerator) -> DescriptionGenerator {
        DescriptionGenerator::new(Arc::new(mock), Arc::new(FixedDelay::none()))
    }

    #[tokio::test]
    async fn test_every_title_gets_its_variations_in_order() {
        let mut mock = MockTextGenerator::new();
        let mut calls = 0;
        mock.expect_complete().times(4).returning(move |request| {
            calls += 1;
            Ok(format!("{} #{}", request.user_prompt, calls))
        });

        let batch = generator(mock)
            .generate(&titles(&["Dune", "Emma"]), 2, "system")
            .await;

        assert!(batch.is_complete());
        assert_eq!(batch.items.titles().collect::<Vec<_>>(), vec!["Dune", "Emma"]);
        assert_eq!(
            batch.items.get("Dune").unwrap(),
            &[
                "create a description for a cover for a book titled 'Dune' #1".to_string(),
                "create a description for a cover for a book titled 'Dune' #2".to_string(),
            ]
        );
        assert_eq!(batch.items.get("Emma").unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_requests_carry_prompt_and_temperature() {
        let mut mock = MockTextGenerator::new();
        mock.expect_complete()
            .withf(|request| {
                request.system_prompt == "Flat shapes only."
                    && request.user_prompt.ends_with("'The Great Escape'")
                    && (request.temperature - DESCRIPTION_TEMPERATURE).abs() < f32::EPSILON
            })
            .times(1)
            .returning(|_| Ok("A tunnel under a fence.".into()));

        let batch = generator(mock)
            .generate(&titles(&["The Great Escape"]), 1, "Flat shapes only.")
            .await;
        assert_eq!(batch.items.item_count(), 1);
    }

    #[tokio::test]
    async fn test_failed_variation_is_skipped_and_reported() {
        let mut mock = MockTextGenerator::new();
        let mut calls = 0;
        mock.expect_complete().times(6).returning(move |_| {
            calls += 1;
            if calls == 2 || calls == 4 {
                Err(CoverError::ProviderError {
                    status: 500,
                    message: "overloaded".into(),
                })
            } else {
                Ok(format!("description {}", calls))
            }
        });

        let batch = generator(mock)
            .generate(&titles(&["Dune", "Emma"]), 3, "system")
            .await;

        assert_eq!(
            batch.items.get("Dune").unwrap(),
            &["description 1".to_string(), "description 3".to_string()]
        );
        assert_eq!(
            batch.items.get("Emma").unwrap(),
            &["description 5".to_string(), "description 6".to_string()]
        );
        assert_eq!(batch.failures.len(), 2);
        assert_eq!(batch.failures[0].title, "Dune");
        assert_eq!(batch.failures[0].variation, 2);
        assert_eq!(batch.failures[1].title, "Emma");
        assert_eq!(batch.failures[1].variation, 1);
        assert!(batch.failures[1].detail.contains("overloaded"));
    }

    #[tokio::test]
    async fn test_title_with_no_survivors_keeps_empty_entry() {
        let mut mock = MockTextGenerator::new();
        mock.expect_complete()
            .returning(|_| Err(CoverError::ResponseError("nothing".into())));

        let batch = generator(mock).generate(&titles(&["Dune"]), 2, "system").await;
        assert_eq!(batch.items.get("Dune"), Some(&[][..]));
        assert_eq!(batch.failures.len(), 2);
    }

    #[tokio::test]
    async fn test_no_lengths_exceed_variation_count() {
        for variations in 1..=5u8 {
            let mut mock = MockTextGenerator::new();
            mock.expect_complete().returning(|_| Ok("d".into()));
            let batch = generator(mock)
                .generate(&titles(&["A", "B", "A"]), variations, "system")
                .await;
            assert_eq!(batch.items.len(), 3);
            assert!(batch.items.iter().all(|(_, items)| items.len() <= variations as usize));
        }
    }

    #[tokio::test]
    async fn test_pacing_between_requests_only() {
        let mut mock = MockTextGenerator::new();
        mock.expect_complete().times(6).returning(|_| Ok("d".into()));
        let throttle = Arc::new(CountingThrottle(AtomicUsize::new(0)));

        DescriptionGenerator::new(Arc::new(mock), throttle.clone())
            .generate(&titles(&["A", "B"]), 3, "system")
            .await;

        assert_eq!(throttle.0.load(Ordering::SeqCst), 5);
    }
}
