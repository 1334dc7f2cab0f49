use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use rcover::{
    CoverError, CoverPipeline, FixedDelay, GenerationConfig, ImageGenerationRequest,
    ImageGenerationResponse, ImageGenerator, ImageQuality, ImageSize, Providers, RunHandler,
    Stage, TextGenerationRequest, TextGenerator,
};
use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

/// Text provider that numbers its answers and fails on chosen call numbers.
#[derive(Default)]
struct FakeText {
    calls: AtomicUsize,
    fail_on: Vec<usize>,
}

#[async_trait]
impl TextGenerator for FakeText {
    async fn complete(&self, request: TextGenerationRequest) -> rcover::Result<String> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if self.fail_on.contains(&call) {
            return Err(CoverError::ProviderError {
                status: 503,
                message: format!("text call {} unavailable", call),
            });
        }
        Ok(format!("{} (take {})", request.user_prompt, call))
    }
}

/// Image provider that echoes a fixed PNG-ish payload and records prompts.
#[derive(Default)]
struct FakeImage {
    calls: AtomicUsize,
    fail_on: Vec<usize>,
    prompts: Mutex<Vec<String>>,
}

#[async_trait]
impl ImageGenerator for FakeImage {
    async fn render(&self, request: ImageGenerationRequest) -> rcover::Result<ImageGenerationResponse> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        self.prompts.lock().unwrap().push(request.prompt.clone());
        if self.fail_on.contains(&call) {
            return Err(CoverError::ResponseError("No images generated".into()));
        }
        Ok(ImageGenerationResponse {
            image_data: STANDARD.encode(format!("png-{}", call)),
            model: "fake-image".into(),
        })
    }
}

fn pipeline(text: Arc<FakeText>, image: Arc<FakeImage>, root: &Path) -> CoverPipeline {
    CoverPipeline::with_throttles(
        Providers::new(text, image),
        root,
        Arc::new(FixedDelay::none()),
        Arc::new(FixedDelay::none()),
    )
}

#[tokio::test]
async fn test_great_escape_end_to_end() {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().join("generated_covers");
    let text = Arc::new(FakeText::default());
    let image = Arc::new(FakeImage::default());

    let config = GenerationConfig::new()
        .with_titles(["The Great Escape"])
        .with_variations(2)
        .with_quality(ImageQuality::High)
        .with_size(ImageSize::Portrait);
    let report = pipeline(text.clone(), image.clone(), &root)
        .run(&config)
        .await
        .unwrap();

    assert!(report.is_complete());
    assert_eq!(report.descriptions.get("The Great Escape").unwrap().len(), 2);
    assert_eq!(report.images.get("The Great Escape").unwrap().len(), 2);
    assert_eq!(report.output_dir, root);

    let book_dir = root.join("The_Great_Escape");
    for name in ["cover_1.png", "cover_2.png", "description_1.txt", "description_2.txt"] {
        assert!(book_dir.join(name).is_file(), "missing {}", name);
    }
    assert_eq!(fs::read(book_dir.join("cover_2.png")).unwrap(), b"png-2");
    assert_eq!(
        fs::read_to_string(book_dir.join("description_1.txt")).unwrap(),
        "create a description for a cover for a book titled 'The Great Escape' (take 1)"
    );

    assert_eq!(text.calls.load(Ordering::SeqCst), 2);
    assert_eq!(image.calls.load(Ordering::SeqCst), 2);
    let prompts = image.prompts.lock().unwrap();
    assert!(prompts[0].starts_with("Book cover design for the book titled \"The Great Escape\"."));
    assert!(prompts[1].contains("(take 2)"));
}

#[tokio::test]
async fn test_empty_titles_are_rejected_before_any_request() {
    let tmp = TempDir::new().unwrap();
    let text = Arc::new(FakeText::default());
    let image = Arc::new(FakeImage::default());

    let config = GenerationConfig::new().with_titles(["", "   ", "\t"]);
    let result = pipeline(text.clone(), image.clone(), tmp.path()).run(&config).await;

    assert!(matches!(result, Err(CoverError::EmptyInput)));
    assert_eq!(text.calls.load(Ordering::SeqCst), 0);
    assert_eq!(image.calls.load(Ordering::SeqCst), 0);
    assert!(fs::read_dir(tmp.path()).unwrap().next().is_none());
}

#[tokio::test]
async fn test_partial_failures_still_complete_the_run() {
    let tmp = TempDir::new().unwrap();
    // 2 titles x 2 variations: description 2 fails, then image 1 of the survivors fails.
    let text = Arc::new(FakeText {
        fail_on: vec![2],
        ..Default::default()
    });
    let image = Arc::new(FakeImage {
        fail_on: vec![1],
        ..Default::default()
    });

    let config = GenerationConfig::new()
        .with_titles(["Dune", "Emma"])
        .with_variations(2);
    let report = pipeline(text.clone(), image.clone(), tmp.path())
        .run(&config)
        .await
        .unwrap();

    assert_eq!(report.descriptions.get("Dune").unwrap().len(), 1);
    assert_eq!(report.descriptions.get("Emma").unwrap().len(), 2);
    assert_eq!(report.images.get("Dune").unwrap().len(), 0);
    assert_eq!(report.images.get("Emma").unwrap().len(), 2);

    assert_eq!(report.warnings.len(), 2);
    assert_eq!(report.warnings[0].stage, Stage::Description);
    assert_eq!(report.warnings[0].title, "Dune");
    assert_eq!(report.warnings[1].stage, Stage::Image);
    assert_eq!(report.warnings[1].title, "Dune");

    assert_eq!(image.calls.load(Ordering::SeqCst), 3);
    assert!(tmp.path().join("Dune").is_dir());
    assert!(tmp.path().join("Emma").join("cover_2.png").is_file());
}

#[tokio::test]
async fn test_run_trims_titles_and_keeps_duplicates() {
    let tmp = TempDir::new().unwrap();
    let text = Arc::new(FakeText::default());
    let image = Arc::new(FakeImage::default());

    let config = GenerationConfig::new().with_titles(["  Dune  ", "", "Dune"]);
    let report = pipeline(text.clone(), image, tmp.path()).run(&config).await.unwrap();

    assert_eq!(report.config.book_titles, vec!["Dune", "Dune"]);
    assert_eq!(report.descriptions.len(), 2);
    assert_eq!(text.calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_handler_replaces_last_result_only_on_completion() {
    let tmp = TempDir::new().unwrap();
    let text = Arc::new(FakeText::default());
    let image = Arc::new(FakeImage::default());
    let mut handler = RunHandler::new(pipeline(text, image, tmp.path()));
    assert!(handler.session().last().is_none());

    let first_id = handler
        .submit(&GenerationConfig::new().with_titles(["Dune"]))
        .await
        .unwrap()
        .run_id;

    let rejected = handler.submit(&GenerationConfig::new()).await;
    assert!(matches!(rejected, Err(CoverError::EmptyInput)));
    assert_eq!(handler.session().last().unwrap().run_id, first_id);

    handler
        .submit(&GenerationConfig::new().with_titles(["Emma"]))
        .await
        .unwrap();
    let last = handler.session().last().unwrap();
    assert_ne!(last.run_id, first_id);
    assert!(last.images.get("Dune").is_none());
    assert_eq!(handler.session().completed_runs(), 2);
}

#[tokio::test]
async fn test_rerun_overwrites_same_files() {
    let tmp = TempDir::new().unwrap();
    let config = GenerationConfig::new().with_titles(["Dune"]).with_variations(2);

    for _ in 0..2 {
        pipeline(Arc::new(FakeText::default()), Arc::new(FakeImage::default()), tmp.path())
            .run(&config)
            .await
            .unwrap();
    }

    let mut names: Vec<String> = fs::read_dir(tmp.path().join("Dune"))
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    assert_eq!(
        names,
        vec!["cover_1.png", "cover_2.png", "description_1.txt", "description_2.txt"]
    );
}

#[tokio::test]
async fn test_clearing_the_session_keeps_files_and_run_count() {
    let tmp = TempDir::new().unwrap();
    let mut handler = RunHandler::new(pipeline(
        Arc::new(FakeText::default()),
        Arc::new(FakeImage::default()),
        tmp.path(),
    ));
    handler
        .submit(&GenerationConfig::new().with_titles(["Dune"]))
        .await
        .unwrap();

    handler.session_mut().clear();

    assert!(handler.session().last().is_none());
    assert_eq!(handler.session().completed_runs(), 1);
    assert!(tmp.path().join("Dune").join("cover_1.png").is_file());
}
